//! Jack Analyzer - Main Entry Point
//!
//! Tokenizes and parses Jack source (`Nand2Tetris` Project 10) and emits the
//! resulting parse tree as XML.
//!
//! Accepts either a single `.jack` file or a directory containing `.jack`
//! files. A directory's files are processed in deterministic (sorted by
//! name) order; each input file `foo.jack` produces `foo.xml` beside it.
//!
//! # Usage
//! ```bash
//! jackanalyzer <input.jack | input_dir>
//! ```

#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::missing_errors_doc, clippy::missing_panics_doc)]

use std::fs;
use std::path::{Path, PathBuf};
use std::process;

use common::Diagnostic;
use jackanalyzer::{write_xml, Parser, Tokenizer};

/// Collects the `.jack` files to analyze. A directory input collects every
/// `.jack` file directly inside it (non-recursive), sorted by name.
fn collect_inputs(input: &str) -> Result<Vec<PathBuf>, Diagnostic> {
    let path = Path::new(input);
    let metadata =
        fs::metadata(path).map_err(|e| Diagnostic::usage(format!("cannot read {input}: {e}")))?;

    if metadata.is_dir() {
        let mut jack_files: Vec<PathBuf> = fs::read_dir(path)
            .map_err(|e| Diagnostic::usage(format!("cannot read directory {input}: {e}")))?
            .filter_map(Result::ok)
            .map(|entry| entry.path())
            .filter(|p| p.extension().is_some_and(|ext| ext == "jack"))
            .collect();
        jack_files.sort();

        if jack_files.is_empty() {
            return Err(Diagnostic::usage(format!("no .jack files found in {input}")));
        }
        Ok(jack_files)
    } else {
        Ok(vec![path.to_path_buf()])
    }
}

fn analyze_file(path: &Path) -> Result<(), Diagnostic> {
    let path_str = path
        .to_str()
        .ok_or_else(|| Diagnostic::usage(format!("non-utf8 path: {}", path.display())))?;

    let source =
        fs::read_to_string(path).map_err(|e| Diagnostic::usage(format!("cannot read {path_str}: {e}")))?;

    let tokenizer = Tokenizer::new(&source)?;
    let tree = Parser::new(tokenizer).parse_class()?;

    let output = path.with_extension("xml");
    let tmp_output = output.with_extension("xml.tmp");
    let result = (|| -> Result<(), Diagnostic> {
        let file = fs::File::create(&tmp_output)
            .map_err(|e| Diagnostic::usage(format!("cannot create {}: {e}", tmp_output.display())))?;
        let mut writer = std::io::BufWriter::new(file);
        write_xml(&tree, &mut writer, 0)
            .map_err(|e| Diagnostic::usage(format!("write failed: {e}")))?;
        Ok(())
    })();

    if result.is_err() {
        let _ = fs::remove_file(&tmp_output);
        result?;
    }

    fs::rename(&tmp_output, &output)
        .map_err(|e| Diagnostic::usage(format!("cannot finalize {}: {e}", output.display())))?;

    Ok(())
}

fn run(args: &[String]) -> Result<Vec<PathBuf>, Diagnostic> {
    if args.len() != 2 {
        return Err(Diagnostic::usage(format!(
            "Usage: {} <input.jack | input_dir>",
            args.first().map(String::as_str).unwrap_or("jackanalyzer")
        )));
    }

    let jack_files = collect_inputs(&args[1])?;
    for file in &jack_files {
        analyze_file(file)?;
    }
    Ok(jack_files.iter().map(|p| p.with_extension("xml")).collect())
}

fn main() {
    let args: Vec<String> = std::env::args().collect();

    match run(&args) {
        Ok(outputs) => {
            for output in outputs {
                println!("Wrote {}", output.display());
            }
        }
        Err(diagnostic) => {
            eprintln!("{diagnostic}");
            process::exit(1);
        }
    }
}
