//! collver-pre - Source-level preprocessing.
//!
//! Three sequential passes over the lexer's token stream, in the order
//! the language's semantics require: includes must be fully spliced in
//! before consts can see every definition, and consts must be substituted
//! before aliases run so an aliased name never shadows a const.

mod alias;
mod consts;
mod include;

pub use alias::process_aliases;
pub use consts::process_consts;
pub use include::{expand_includes, PreprocessConfig};

use collver_lex::Token;
use collver_util::CollverResult;

/// Run all three preprocessing passes over a freshly lexed token stream.
pub fn preprocess(tokens: Vec<Token>, config: &PreprocessConfig) -> CollverResult<Vec<Token>> {
    let tokens = expand_includes(tokens, config)?;
    let tokens = process_consts(tokens)?;
    process_aliases(tokens)
}
