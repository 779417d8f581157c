//! Line-based lexing.
//!
//! Collver's lexer has none of the cursor/state-machine machinery a
//! general-purpose language needs: a source file is a sequence of lines,
//! each line splits into whitespace-delimited chunks, and each chunk is
//! classified once it has been read in full. There is no token that spans
//! a line break.

use collver_util::{CollverError, CollverResult, Diagnostic, Location, Symbol};

use crate::Token;

/// Lex an entire source file's text into a flat token stream.
///
/// `file` is interned once per call and stamped onto every token's
/// location; `source` is split on `\n` with row numbers starting at 0
/// (displayed as 1, the convention every diagnostic location uses).
pub fn lex(file: &str, source: &str) -> CollverResult<Vec<Token>> {
    let file = Symbol::intern(file);
    let mut tokens = Vec::new();
    for (row, line) in source.lines().enumerate() {
        lex_line(file, row as u32, line, &mut tokens)?;
    }
    Ok(tokens)
}

fn lex_line(file: Symbol, row: u32, line: &str, out: &mut Vec<Token>) -> CollverResult<()> {
    let chars: Vec<char> = line.chars().collect();
    let mut col = 0usize;

    while col < chars.len() {
        if chars[col].is_whitespace() {
            col += 1;
            continue;
        }

        // `//` outside a string ends the line.
        if chars[col] == '/' && chars.get(col + 1) == Some(&'/') {
            break;
        }

        if chars[col] == '"' {
            let start_col = col;
            let (text, next_col) = lex_string(file, row, start_col, &chars)?;
            out.push(Token::Str(text, Location::new(file, row, start_col as u32)));
            col = next_col;
            continue;
        }

        let start_col = col;
        while col < chars.len() && !chars[col].is_whitespace() {
            col += 1;
        }
        let raw: String = chars[start_col..col].iter().collect();
        let loc = Location::new(file, row, start_col as u32);
        out.push(classify(raw, loc));
    }

    Ok(())
}

/// Lex a double-quoted string starting at `chars[start_col] == '"'`.
///
/// Returns the unescaped body and the column just past the closing quote.
/// `\n` expands to the two literal characters `0`, `A` and `\r` to `0`,
/// `D` rather than to actual control characters: Collver
/// strings are later re-encoded by the data section builder, which reads
/// pairs of hex digits.
fn lex_string(
    file: Symbol,
    row: u32,
    start_col: usize,
    chars: &[char],
) -> CollverResult<(String, usize)> {
    let mut col = start_col + 1;
    let mut text = String::new();

    loop {
        if col >= chars.len() {
            let loc = Location::new(file, row, start_col as u32);
            return Err(CollverError::Lex(Diagnostic::error(
                "unterminated string literal",
                loc,
            )));
        }

        match chars[col] {
            '"' => {
                col += 1;
                return Ok((text, col));
            }
            '\\' if chars.get(col + 1) == Some(&'n') => {
                text.push('0');
                text.push('A');
                col += 2;
            }
            '\\' if chars.get(col + 1) == Some(&'r') => {
                text.push('0');
                text.push('D');
                col += 2;
            }
            c => {
                text.push(c);
                col += 1;
            }
        }
    }
}

/// Classify a bare (non-string) chunk as INT or WORD: a
/// chunk that parses as a signed decimal integer is INT, everything else
/// is WORD.
fn classify(raw: String, loc: Location) -> Token {
    match raw.parse::<i64>() {
        Ok(value) => Token::Int(value, loc),
        Err(_) => Token::Word(raw, loc),
    }
}
