//! Jack language front-end for the `Nand2Tetris` course (Project 10).
//!
//! Tokenizes and parses `.jack` source into a structured parse tree, emitted
//! as the nand2tetris-standard XML dump. No semantic analysis: identifiers
//! are never resolved against a symbol table here, that's a later compiler
//! stage this front-end deliberately stops short of.
//!
//! # Architecture
//! - [`tokenizer`]: lexes source text into a fully pre-tokenized cursor with
//!   one-token lookahead.
//! - [`parser`]: recursive-descent parse of the Jack grammar into a
//!   [`parser::ParseTree`], plus its XML emission.

#![warn(clippy::all, clippy::pedantic)]
#![allow(
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::module_name_repetitions
)]

pub mod parser;
pub mod tokenizer;

pub use common::Diagnostic;
pub use parser::{write_xml, ParseTree, Parser};
pub use tokenizer::{Token, Tokenizer};
