//! Word parser: classifies a flat token stream into tagged [`Word`]s.
//!
//! One left-to-right scan, three growing symbol sets (`proc_names`,
//! `extern_names`, `mem_names`) and one piece of lookback state: the
//! keyword of the most recently emitted word, which decides whether the
//! current token is a name introduction (right after `proc`/`extern`/
//! `memory`) or an ordinary reference.

use std::collections::HashSet;

use collver_lex::Token;
use collver_util::{CollverError, CollverResult, Diagnostic, Location, Symbol};

use crate::ast::{DataType, Keyword, Word};

/// Arithmetic intrinsics usable in a `memory` size body.
/// These are built into the word parser rather than requiring a prelude
/// of `extern` declarations: they name no real external symbol, only an
/// RPN operator the memory-size evaluator recognizes.
const BUILTIN_INTRINSICS: [&str; 3] = ["intrinsic_plus", "intrinsic_minus", "intrinsic_mult"];

struct WordParser {
    proc_names: HashSet<Symbol>,
    extern_names: HashSet<Symbol>,
    mem_names: HashSet<Symbol>,
    /// Keyword of the previously emitted word, or `None` if the previous
    /// word was not a keyword (or this is the first token).
    last_keyword: Option<Keyword>,
}

/// Parse a preprocessed token stream into words.
pub fn parse_words(tokens: Vec<Token>) -> CollverResult<Vec<Word>> {
    let mut parser = WordParser {
        proc_names: HashSet::new(),
        extern_names: BUILTIN_INTRINSICS.iter().map(|s| Symbol::intern(s)).collect(),
        mem_names: HashSet::new(),
        last_keyword: None,
    };

    let mut words = Vec::with_capacity(tokens.len());
    for token in tokens {
        let word = parser.classify(token)?;
        parser.last_keyword = word.as_keyword();
        words.push(word);
    }
    Ok(words)
}

impl WordParser {
    fn classify(&mut self, token: Token) -> CollverResult<Word> {
        // A name slot right after `proc`/`extern`/`memory` takes priority
        // over every other classification rule.
        if let Some(owner) = self.last_keyword {
            if matches!(owner, Keyword::Proc | Keyword::Extern | Keyword::Memory) {
                return self.classify_name(owner, token);
            }
        }

        match token {
            Token::Int(value, _) => Ok(Word::PushInt { value, token }),
            Token::Str(ref value, _) => {
                let value = value.clone();
                Ok(Word::PushString { value, token })
            }
            Token::Word(ref text, loc) => self.classify_word(text.clone(), loc, token),
        }
    }

    fn classify_name(&mut self, owner: Keyword, token: Token) -> CollverResult<Word> {
        let Token::Word(ref text, _) = token else {
            return Err(CollverError::Parse(Diagnostic::error(
                format!("expected a name after `{}`, found {}", owner.as_text(), describe(&token)),
                token.location(),
            )));
        };
        let name = Symbol::intern(text);
        match owner {
            Keyword::Proc => {
                self.proc_names.insert(name);
                Ok(Word::ProcName { name, token })
            }
            Keyword::Extern => {
                self.extern_names.insert(name);
                Ok(Word::ProcName { name, token })
            }
            Keyword::Memory => {
                self.mem_names.insert(name);
                Ok(Word::MemoryName { name, token })
            }
            _ => unreachable!("classify_name only called for proc/extern/memory"),
        }
    }

    fn classify_word(&self, text: String, loc: Location, token: Token) -> CollverResult<Word> {
        if text == "here" {
            return Ok(Word::PushString { value: loc.to_string(), token });
        }
        if let Some(keyword) = Keyword::from_text(&text) {
            return Ok(Word::Keyword { keyword, token, jmp: None });
        }
        if let Some(data_type) = DataType::from_text(&text) {
            return Ok(Word::DataType { data_type, token });
        }
        let name = Symbol::intern(&text);
        if self.proc_names.contains(&name) || self.extern_names.contains(&name) {
            return Ok(Word::ProcCall { name, token });
        }
        if self.mem_names.contains(&name) {
            return Ok(Word::PushMemory { name, token });
        }
        Err(CollverError::Parse(Diagnostic::error(format!("unknown word `{text}`"), loc)))
    }
}

fn describe(token: &Token) -> &'static str {
    match token {
        Token::Int(..) => "an integer",
        Token::Str(..) => "a string",
        Token::Word(..) => "a word",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use collver_lex::lex;

    fn parse(src: &str) -> Vec<Word> {
        let tokens = lex("t.collver", src).unwrap();
        parse_words(tokens).unwrap()
    }

    #[test]
    fn proc_name_is_registered_and_later_calls_resolve() {
        let words = parse("proc add int int -> int do + end add");
        assert!(matches!(words[1], Word::ProcName { .. }));
        assert!(matches!(words.last().unwrap(), Word::ProcCall { .. }));
    }

    #[test]
    fn extern_name_uses_proc_name_tag() {
        let words = parse("extern drop int -> end");
        assert!(matches!(words[1], Word::ProcName { .. }));
    }

    #[test]
    fn memory_name_is_registered_and_later_refs_push_memory() {
        let words = parse("memory buf 8 end buf");
        assert!(matches!(words[1], Word::MemoryName { .. }));
        assert!(matches!(words.last().unwrap(), Word::PushMemory { .. }));
    }

    #[test]
    fn here_pushes_pretty_location() {
        let words = parse("here");
        match &words[0] {
            Word::PushString { value, .. } => assert_eq!(value, "t.collver:1:1"),
            other => panic!("expected PushString, got {other:?}"),
        }
    }

    #[test]
    fn unknown_word_is_an_error() {
        let tokens = lex("t.collver", "frobnicate").unwrap();
        let err = parse_words(tokens).unwrap_err();
        assert!(matches!(err, CollverError::Parse(_)));
    }

    #[test]
    fn missing_name_after_proc_is_an_error() {
        let tokens = lex("t.collver", "proc 1").unwrap();
        let err = parse_words(tokens).unwrap_err();
        assert!(matches!(err, CollverError::Parse(_)));
    }

    #[test]
    fn datatypes_classify_independently_of_registration() {
        let words = parse("int str ptr unknown");
        for w in &words {
            assert!(matches!(w, Word::DataType { .. }));
        }
    }

    #[quickcheck_macros::quickcheck]
    fn any_sequence_of_integers_yields_one_push_int_per_token(values: Vec<i32>) -> bool {
        let src = values.iter().map(|v| v.to_string()).collect::<Vec<_>>().join(" ");
        let tokens = lex("t.collver", &src).unwrap();
        let words = match parse_words(tokens) {
            Ok(words) => words,
            Err(_) => return false,
        };
        words.len() == values.len()
            && words
                .iter()
                .zip(&values)
                .all(|(w, v)| matches!(w, Word::PushInt { value, .. } if *value == *v as i64))
    }
}
