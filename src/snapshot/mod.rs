//! Snapshot data model produced by the assembler.

pub mod types;

pub use types::*;
