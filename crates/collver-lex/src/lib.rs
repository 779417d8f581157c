//! collver-lex - Lexical analysis.
//!
//! A Collver source file is lines of whitespace-separated chunks; there is
//! no token that spans a line break, no keyword table (every bare word is
//! WORD until the parser gives it meaning), and no block comments. [`lex`]
//! reads a whole file's text and returns the flat token stream the
//! preprocessor (`collver-pre`) consumes next.

mod lexer;
mod token;

pub use lexer::lex;
pub use token::Token;
