//! Alias extraction and substitution: `alias NAME VALUE
//! end` records a single-token rewrite. Because an alias replaces at most
//! one token with another single token, no cycle can form by
//! construction — no fixed-point re-scan is needed.

use std::collections::HashMap;

use collver_lex::Token;
use collver_util::{CollverError, CollverResult, Diagnostic, Symbol};

pub fn process_aliases(tokens: Vec<Token>) -> CollverResult<Vec<Token>> {
    let (stripped, aliases) = extract_aliases(tokens)?;
    Ok(substitute(stripped, &aliases))
}

fn extract_aliases(tokens: Vec<Token>) -> CollverResult<(Vec<Token>, HashMap<Symbol, Token>)> {
    let mut out = Vec::with_capacity(tokens.len());
    let mut aliases = HashMap::new();
    let mut iter = tokens.into_iter().peekable();

    while let Some(token) = iter.next() {
        if !matches!(&token, Token::Word(text, _) if text == "alias") {
            out.push(token);
            continue;
        }

        let name_token = iter.next().ok_or_else(|| {
            CollverError::Preprocess(Diagnostic::error(
                "`alias` must be followed by a name",
                token.location(),
            ))
        })?;
        let Token::Word(name_text, _) = &name_token else {
            return Err(CollverError::Preprocess(Diagnostic::error(
                "`alias` must be followed by a name",
                name_token.location(),
            )));
        };
        let name = Symbol::intern(name_text);

        let value = iter.next().ok_or_else(|| {
            CollverError::Preprocess(Diagnostic::error(
                "`alias` is missing its value",
                name_token.location(),
            ))
        })?;

        match iter.next() {
            Some(Token::Word(text, _)) if text == "end" => {}
            Some(other) => {
                return Err(CollverError::Preprocess(Diagnostic::error(
                    "`alias` must be closed by `end`",
                    other.location(),
                )))
            }
            None => {
                return Err(CollverError::Preprocess(Diagnostic::error(
                    "unterminated `alias`: expected `end`",
                    token.location(),
                )))
            }
        }

        aliases.insert(name, value);
    }

    Ok((out, aliases))
}

fn substitute(tokens: Vec<Token>, aliases: &HashMap<Symbol, Token>) -> Vec<Token> {
    tokens
        .into_iter()
        .map(|token| match &token {
            Token::Word(text, loc) => match aliases.get(&Symbol::intern(text)) {
                Some(value) => value.clone().with_location(*loc),
                None => token,
            },
            _ => token,
        })
        .collect()
}
