//! Core pipeline for opsplit.
//!
//! Ties the knowledge base, prompt construction, generation gateway,
//! response parsing, and record assembly into the end-to-end split flow:
//! digest → prompt → generate → parse → assemble → persisted record.

pub mod assembler;
pub mod parser;
pub mod prompt;
pub mod splitter;
pub mod titles;

pub use splitter::{SplitOptions, Splitter};
