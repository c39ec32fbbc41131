//! VM Translator for the `Nand2Tetris` course.
//!
//! Lowers Jack VM code (a stack-machine intermediate representation) to Hack
//! assembly. A translation unit tracks its mutable state — current function,
//! return/label counters, static-segment addresses — in one owned
//! [`code_writer::CodeWriter`] value rather than process globals, so unit
//! tests can exercise the lowering in isolation and two independent
//! translations can coexist in the same process.
//!
//! # Architecture
//! - [`parser`]: splits a `.vm` file into a cursor over commands, tracking
//!   the 1-based source line of each for diagnostics.
//! - [`code_writer`]: lowers one command at a time to Hack assembly.

#![warn(clippy::all, clippy::pedantic)]
#![allow(
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::module_name_repetitions
)]

pub mod code_writer;
pub mod parser;

pub use code_writer::{CodeWriter, CodeWriterError};
pub use common::Diagnostic;
pub use parser::{CommandType, Parser, ParserError};
