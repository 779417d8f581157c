//! Lexer output: a tagged union over `{INT, STRING, WORD}`,
//! each carrying the [`Location`] it was read from.

use collver_util::Location;

/// A single lexed token.
///
/// Rather than a `Token { kind: TokenKind, span: Span }` split, every
/// consumer here (the preprocessor's const/alias substitution, the word
/// parser) needs the payload and the location together at every use
/// site, so they live in one enum instead of a struct-plus-kind pair.
#[derive(Clone, Debug, PartialEq)]
pub enum Token {
    /// A bare token that parsed as a signed decimal integer.
    Int(i64, Location),
    /// A double-quoted string, quotes stripped, `\n`/`\r` already expanded
    /// to the literal two-character sequences `0A`/`0D`.
    Str(String, Location),
    /// Anything else: keywords, data types, identifiers are all WORD until
    /// the word parser classifies them further.
    Word(String, Location),
}

impl Token {
    pub fn location(&self) -> Location {
        match self {
            Token::Int(_, loc) | Token::Str(_, loc) | Token::Word(_, loc) => *loc,
        }
    }

    /// The token's text as it would appear in a rewritten stream: digits
    /// for an int, the word text verbatim. Strings have no single faithful
    /// textual form here since their escapes were already expanded: this
    /// is only used for "is this WORD named X" checks, which never apply
    /// to strings.
    pub fn as_word_text(&self) -> Option<&str> {
        match self {
            Token::Word(text, _) => Some(text),
            _ => None,
        }
    }

    pub fn with_location(self, location: Location) -> Token {
        match self {
            Token::Int(v, _) => Token::Int(v, location),
            Token::Str(v, _) => Token::Str(v, location),
            Token::Word(v, _) => Token::Word(v, location),
        }
    }
}
