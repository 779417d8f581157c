//! collver-par - Word parser and program parser.
//!
//! Two passes over a preprocessed token stream: [`word::parse_words`]
//! tags every token with its operation type and resolves bare
//! identifiers against the procedure/extern/memory name tables as they
//! accumulate, then [`items::parse_program`] consumes the resulting words
//! into a [`Program`] of procedures, externs, and global memories.

mod ast;
mod items;
mod word;

pub use ast::{DataType, Keyword, Proc, ProcTypeSig, Program, TypeAnnotation, Word};
pub use items::parse_program;
pub use word::parse_words;
