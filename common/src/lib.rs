//! Shared plumbing for the three pipeline stages (`assembler`, `vmtranslator`,
//! `jackanalyzer`): the `line N: message` diagnostic format every stage's
//! errors surface through, and the lazily-allocating address table pattern
//! the assembler's symbol table and the VM translator's static segment both
//! need.

pub mod address_table;
pub mod diagnostic;

pub use address_table::AddressTable;
pub use diagnostic::Diagnostic;
