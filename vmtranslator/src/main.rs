//! VM Translator - Main Entry Point
//!
//! Translates Jack VM code into Hack assembly (`Nand2Tetris` Project 7/8).
//!
//! Accepts either a single `.vm` file or a directory containing `.vm` files.
//! A directory's files are translated in deterministic (sorted by name)
//! order; a single run always emits one bootstrap prelude, the translated
//! commands of every input file in turn, then one infinite-loop epilogue.
//!
//! # Usage
//! ```bash
//! vmtranslator <input.vm | input_dir>
//! ```

use common::Diagnostic;
use std::fs;
use std::path::{Path, PathBuf};
use std::process;
use vmtranslator::code_writer::CodeWriter;
use vmtranslator::parser::{self, CommandType, Parser};

/// Collects the `.vm` files to translate and the output assembly path.
///
/// A directory input translates every `.vm` file directly inside it
/// (non-recursive), sorted by file name for a deterministic run, and writes
/// `<dirname>.asm` inside that directory. A single file input translates
/// just that file and writes `<stem>.asm` beside it.
fn collect_inputs(input: &str) -> Result<(Vec<PathBuf>, PathBuf), Diagnostic> {
    let path = Path::new(input);
    let metadata = fs::metadata(path)
        .map_err(|e| Diagnostic::usage(format!("cannot read {input}: {e}")))?;

    if metadata.is_dir() {
        let mut vm_files: Vec<PathBuf> = fs::read_dir(path)
            .map_err(|e| Diagnostic::usage(format!("cannot read directory {input}: {e}")))?
            .filter_map(Result::ok)
            .map(|entry| entry.path())
            .filter(|p| p.extension().is_some_and(|ext| ext == "vm"))
            .collect();
        vm_files.sort();

        if vm_files.is_empty() {
            return Err(Diagnostic::usage(format!("no .vm files found in {input}")));
        }

        let dir_name = path
            .file_name()
            .and_then(|s| s.to_str())
            .unwrap_or("output");
        let output = path.join(format!("{dir_name}.asm"));
        Ok((vm_files, output))
    } else {
        let output = path.with_extension("asm");
        Ok((vec![path.to_path_buf()], output))
    }
}

fn translate_file(path: &Path, writer: &mut CodeWriter) -> Result<(), Diagnostic> {
    let path_str = path
        .to_str()
        .ok_or_else(|| Diagnostic::usage(format!("non-utf8 path: {}", path.display())))?;

    writer.set_filename(path_str);

    let mut parser = Parser::new(path_str)
        .map_err(|e| Diagnostic::usage(format!("cannot read {path_str}: {e}")))?;

    while parser.has_more_commands() {
        parser.advance();
        let line = parser.line_number();
        let syntax = |e: parser::ParserError| Diagnostic::syntactic(line, e.to_string());

        let lowering_result = match parser.command_type().map_err(syntax)? {
            CommandType::Arithmetic => writer.write_arithmetic(parser.arg1().map_err(syntax)?),
            CommandType::Push => writer.write_push_pop(
                "push",
                parser.arg1().map_err(syntax)?,
                parser.arg2().map_err(syntax)?,
            ),
            CommandType::Pop => writer.write_push_pop(
                "pop",
                parser.arg1().map_err(syntax)?,
                parser.arg2().map_err(syntax)?,
            ),
            CommandType::Label => writer.write_label(parser.arg1().map_err(syntax)?),
            CommandType::Goto => writer.write_goto(parser.arg1().map_err(syntax)?),
            CommandType::If => writer.write_if_goto(parser.arg1().map_err(syntax)?),
            CommandType::Function => {
                let n_locals = u16::try_from(parser.arg2().map_err(syntax)?)
                    .map_err(|_| Diagnostic::syntactic(line, "n_locals out of range"))?;
                writer.write_function(parser.arg1().map_err(syntax)?, n_locals)
            }
            CommandType::Call => {
                let n_args = u16::try_from(parser.arg2().map_err(syntax)?)
                    .map_err(|_| Diagnostic::syntactic(line, "n_args out of range"))?;
                writer.write_call(parser.arg1().map_err(syntax)?, n_args)
            }
            CommandType::Return => writer.write_return(),
        };
        lowering_result.map_err(|e| Diagnostic::syntactic(line, e.to_string()))?;
    }

    Ok(())
}

fn run(args: &[String]) -> Result<PathBuf, Diagnostic> {
    if args.len() != 2 {
        return Err(Diagnostic::usage(format!(
            "Usage: {} <input.vm | input_dir>",
            args.first().map(String::as_str).unwrap_or("vmtranslator")
        )));
    }

    let (vm_files, output) = collect_inputs(&args[1])?;

    let tmp_output = output.with_extension("asm.tmp");
    let tmp_output_str = tmp_output
        .to_str()
        .ok_or_else(|| Diagnostic::usage("non-utf8 output path".to_string()))?;

    let mut writer = CodeWriter::new(tmp_output_str)
        .map_err(|e| Diagnostic::usage(format!("cannot create {tmp_output_str}: {e}")))?;

    let result = (|| -> Result<(), Diagnostic> {
        writer
            .write_bootstrap()
            .map_err(|e| Diagnostic::syntactic(0, format!("write failed: {e}")))?;
        for vm_file in &vm_files {
            translate_file(vm_file, &mut writer)?;
        }
        writer
            .write_epilogue()
            .map_err(|e| Diagnostic::syntactic(0, format!("write failed: {e}")))?;
        writer
            .flush()
            .map_err(|e| Diagnostic::syntactic(0, format!("flush failed: {e}")))?;
        Ok(())
    })();

    if result.is_err() {
        let _ = fs::remove_file(&tmp_output);
        result?;
    }

    fs::rename(&tmp_output, &output)
        .map_err(|e| Diagnostic::usage(format!("cannot finalize {}: {e}", output.display())))?;

    Ok(output)
}

fn main() {
    let args: Vec<String> = std::env::args().collect();

    match run(&args) {
        Ok(output) => {
            println!("Translation complete: {}", output.display());
        }
        Err(diagnostic) => {
            eprintln!("{diagnostic}");
            process::exit(1);
        }
    }
}
