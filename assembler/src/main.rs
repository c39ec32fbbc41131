//! Hack Assembler - Main Entry Point
//!
//! A two-pass assembler for the Hack assembly language (`Nand2Tetris` Project 6).
//!
//! # Architecture
//! - **Pass 1**: Builds the symbol table by recording label positions
//! - **Pass 2**: Generates machine code, resolving all symbols
//!
//! # Usage
//! ```bash
//! assembler <input.asm> <output.hack>
//! ```

#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::missing_errors_doc, clippy::missing_panics_doc)]

use std::env;
use std::fs::{self, File};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::process;

use assembler::{code, CommandType, Diagnostic, ParserLines, SymbolTable};

/// Reads assembly file into memory
fn read_lines(path: &str) -> std::io::Result<Vec<String>> {
    let file = File::open(path)?;
    let reader = BufReader::new(file);
    reader.lines().collect::<std::io::Result<Vec<_>>>()
}

/// First pass: Build symbol table with label addresses
///
/// Scans through all lines and records the ROM address of each label.
/// Label definitions (L-commands) don't generate code, so they don't
/// increment the ROM address counter.
fn first_pass(lines: &[String], symbol_table: &mut SymbolTable) {
    let mut rom_address = 0u16;
    let mut parser = ParserLines::from_lines(lines);

    while parser.advance() {
        match parser.command_type().expect("advance() guarantees a command") {
            CommandType::LCommand => {
                let symbol = parser.symbol().expect("L-command always carries a symbol");
                symbol_table.add_entry(symbol, rom_address);
            }
            CommandType::ACommand | CommandType::CCommand => {
                rom_address += 1;
            }
        }
    }
}

/// Second pass: Generate machine code
///
/// Translates each instruction to binary:
/// - A-commands: Resolve symbols to addresses
/// - C-commands: Encode dest, comp, and jump fields
/// - L-commands: Skip (already processed in pass 1)
fn second_pass(
    lines: &[String],
    symbol_table: &mut SymbolTable,
    writer: &mut BufWriter<File>,
) -> Result<(), Diagnostic> {
    let mut parser = ParserLines::from_lines(lines);

    while parser.advance() {
        let line = parser.line_number();
        match parser.command_type().expect("advance() guarantees a command") {
            CommandType::ACommand => {
                let symbol = parser.symbol().expect("A-command always carries a symbol");

                let address = symbol
                    .parse::<u16>()
                    .unwrap_or_else(|_| symbol_table.get_or_insert(symbol));

                let instruction = code::encode_a_instruction(address);
                writeln!(writer, "{instruction}")
                    .map_err(|e| Diagnostic::syntactic(line, format!("write failed: {e}")))?;
            }
            CommandType::CCommand => {
                let dest = parser
                    .dest()
                    .expect("C-command")
                    .expect("dest is Some for C-command")
                    .to_string();
                let comp = parser
                    .comp()
                    .expect("C-command")
                    .expect("comp is Some for C-command")
                    .to_string();
                let jump = parser
                    .jump()
                    .expect("C-command")
                    .expect("jump is Some for C-command")
                    .to_string();

                let instruction = code::try_encode_c_instruction(&dest, &comp, &jump)
                    .map_err(|field| {
                        let (name, mnemonic) = match field {
                            code::InvalidField::Dest => ("dest", dest.as_str()),
                            code::InvalidField::Comp => ("comp", comp.as_str()),
                            code::InvalidField::Jump => ("jump", jump.as_str()),
                        };
                        Diagnostic::syntactic(line, format!("unknown {name} mnemonic '{mnemonic}'"))
                    })?;
                writeln!(writer, "{instruction}")
                    .map_err(|e| Diagnostic::syntactic(line, format!("write failed: {e}")))?;
            }
            CommandType::LCommand => unreachable!("labels were consumed in pass 1"),
        }
    }

    Ok(())
}

/// Determines the output file path
fn output_path(input: &str, explicit_output: Option<&str>) -> String {
    explicit_output.map_or_else(
        || input.replace(".asm", ".hack"),
        std::string::ToString::to_string,
    )
}

fn run(args: &[String]) -> Result<String, Diagnostic> {
    if !(2..=3).contains(&args.len()) {
        return Err(Diagnostic::usage(format!(
            "Usage: {} <input.asm> [output.hack]",
            args.first().map(String::as_str).unwrap_or("assembler")
        )));
    }

    let input_path = &args[1];
    let lines = read_lines(input_path)
        .map_err(|e| Diagnostic::usage(format!("cannot read {input_path}: {e}")))?;

    let mut symbol_table = SymbolTable::new();
    first_pass(&lines, &mut symbol_table);

    let output = output_path(input_path, args.get(2).map(String::as_str));
    // Write to a temporary file first so a failure mid-pass never leaves a
    // partially-written output behind (§7: "no partial output files").
    let tmp_output = format!("{output}.tmp");
    {
        let output_file = File::create(&tmp_output)
            .map_err(|e| Diagnostic::usage(format!("cannot create {tmp_output}: {e}")))?;
        let mut writer = BufWriter::new(output_file);
        second_pass(&lines, &mut symbol_table, &mut writer).inspect_err(|_| {
            let _ = fs::remove_file(&tmp_output);
        })?;
        writer
            .flush()
            .map_err(|e| Diagnostic::usage(format!("cannot flush {tmp_output}: {e}")))?;
    }
    fs::rename(&tmp_output, &output)
        .map_err(|e| Diagnostic::usage(format!("cannot finalize {output}: {e}")))?;

    Ok(output)
}

fn main() {
    let args: Vec<String> = env::args().collect();

    match run(&args) {
        Ok(output) => {
            println!("Assembly completed. Output written to {output}");
        }
        Err(diagnostic) => {
            eprintln!("{diagnostic}");
            process::exit(1);
        }
    }
}
