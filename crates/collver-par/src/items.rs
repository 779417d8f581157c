//! Program parser: consumes a flat [`Word`] stream into top-level
//! `proc`/`extern`/`memory` items.

use collver_util::{CollverError, CollverResult, Diagnostic, Location, Symbol};
use indexmap::IndexMap;

use crate::ast::{Keyword, Proc, ProcTypeSig, Program, TypeAnnotation, Word};

/// A read-only cursor over a word slice, tracking position for diagnostics.
struct Cursor<'a> {
    words: &'a [Word],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(words: &'a [Word]) -> Self {
        Self { words, pos: 0 }
    }

    fn peek(&self) -> Option<&'a Word> {
        self.words.get(self.pos)
    }

    fn next(&mut self) -> Option<&'a Word> {
        let word = self.words.get(self.pos);
        if word.is_some() {
            self.pos += 1;
        }
        word
    }

    fn eof_location(&self) -> Location {
        self.words.last().map(Word::location).unwrap_or(Location::DUMMY)
    }
}

/// Parse a fully word-parsed file into a [`Program`].
pub fn parse_program(source_path: Symbol, words: Vec<Word>) -> CollverResult<Program> {
    let mut cursor = Cursor::new(&words);
    let mut program = Program {
        source_path,
        procs: IndexMap::new(),
        externs: IndexMap::new(),
        global_memories: IndexMap::new(),
    };

    while let Some(word) = cursor.peek() {
        match word.as_keyword() {
            Some(Keyword::Proc) => parse_proc(&mut cursor, &mut program)?,
            Some(Keyword::Extern) => parse_extern(&mut cursor, &mut program)?,
            Some(Keyword::Memory) => {
                let (name, size) = parse_top_level_memory(&mut cursor)?;
                program.global_memories.insert(name, size);
            }
            _ => {
                return Err(CollverError::Parse(Diagnostic::error(
                    "expected `proc`, `extern`, or `memory` at top level",
                    word.location(),
                )))
            }
        }
    }

    Ok(program)
}

fn expect_name(cursor: &mut Cursor, what: &str) -> CollverResult<(Symbol, Location)> {
    match cursor.next() {
        Some(Word::ProcName { name, token }) | Some(Word::MemoryName { name, token }) => {
            Ok((*name, token.location()))
        }
        Some(other) => Err(CollverError::Parse(Diagnostic::error(
            format!("expected a {what} name"),
            other.location(),
        ))),
        None => Err(CollverError::Parse(Diagnostic::error(
            format!("expected a {what} name, found end of file"),
            cursor.eof_location(),
        ))),
    }
}

fn expect_keyword(cursor: &mut Cursor, keyword: Keyword) -> CollverResult<Location> {
    match cursor.next() {
        Some(Word::Keyword { keyword: k, token, .. }) if *k == keyword => Ok(token.location()),
        Some(other) => Err(CollverError::Parse(Diagnostic::error(
            format!("expected `{}`", keyword.as_text()),
            other.location(),
        ))),
        None => Err(CollverError::Parse(Diagnostic::error(
            format!("expected `{}`, found end of file", keyword.as_text()),
            cursor.eof_location(),
        ))),
    }
}

/// Signature parser: data types until `->`, then data
/// types until `terminator` (`do` for procs, `end` for externs).
fn parse_signature(cursor: &mut Cursor, terminator: Keyword) -> CollverResult<ProcTypeSig> {
    let mut args = Vec::new();
    loop {
        match cursor.peek() {
            Some(Word::DataType { data_type, token }) => {
                args.push(TypeAnnotation::new(*data_type, token.location()));
                cursor.next();
            }
            Some(Word::Keyword { keyword: Keyword::Arrow, .. }) => break,
            Some(other) => {
                return Err(CollverError::Parse(Diagnostic::error(
                    "expected a data type or `->` in signature",
                    other.location(),
                )))
            }
            None => {
                return Err(CollverError::Parse(Diagnostic::error(
                    "unterminated signature: expected `->`",
                    cursor.eof_location(),
                )))
            }
        }
    }
    let arrow_location = expect_keyword(cursor, Keyword::Arrow)?;

    let mut returns = Vec::new();
    loop {
        match cursor.peek() {
            Some(Word::DataType { data_type, token }) => {
                returns.push(TypeAnnotation::new(*data_type, token.location()));
                cursor.next();
            }
            Some(Word::Keyword { keyword, .. }) if *keyword == terminator => break,
            Some(other) => {
                return Err(CollverError::Parse(Diagnostic::error(
                    format!("expected a data type or `{}` in signature", terminator.as_text()),
                    other.location(),
                )))
            }
            None => {
                return Err(CollverError::Parse(Diagnostic::error(
                    format!("unterminated signature: expected `{}`", terminator.as_text()),
                    cursor.eof_location(),
                )))
            }
        }
    }
    expect_keyword(cursor, terminator)?;

    Ok(ProcTypeSig { args, returns, arrow_location })
}

const INTRINSIC_PLUS: &str = "intrinsic_plus";
const INTRINSIC_MINUS: &str = "intrinsic_minus";
const INTRINSIC_MULT: &str = "intrinsic_mult";

/// Evaluate a `memory NAME … end` size body already reduced to words: a
/// tiny RPN machine over literal ints and the three named arithmetic
/// externs, mirroring the const preprocessor's evaluator one level later
/// in the pipeline (these names only resolve to `ProcCall` words once the
/// standard library has declared them as externs, which is how the source
/// exposes "intrinsics" to its own memory-size language).
fn eval_memory_size(cursor: &mut Cursor, owner: Location) -> CollverResult<u64> {
    let mut stack: Vec<i64> = Vec::new();
    loop {
        match cursor.next() {
            Some(Word::PushInt { value, .. }) => stack.push(*value),
            Some(Word::ProcCall { name, token }) if *name == Symbol::intern(INTRINSIC_PLUS) => {
                binary_op(&mut stack, token.location(), |a, b| a + b)?
            }
            Some(Word::ProcCall { name, token }) if *name == Symbol::intern(INTRINSIC_MINUS) => {
                binary_op(&mut stack, token.location(), |a, b| b - a)?
            }
            Some(Word::ProcCall { name, token }) if *name == Symbol::intern(INTRINSIC_MULT) => {
                binary_op(&mut stack, token.location(), |a, b| a * b)?
            }
            Some(Word::Keyword { keyword: Keyword::End, .. }) => break,
            Some(other) => {
                return Err(CollverError::Parse(Diagnostic::error(
                    "memory size body may only contain integers and intrinsic arithmetic",
                    other.location(),
                )))
            }
            None => {
                return Err(CollverError::Parse(Diagnostic::error(
                    "unterminated memory size body: expected `end`",
                    owner,
                )))
            }
        }
    }
    match stack.as_slice() {
        [value] if *value >= 0 => Ok(*value as u64),
        [value] => Err(CollverError::Parse(Diagnostic::error(
            format!("memory size evaluated to a negative value ({value})"),
            owner,
        ))),
        _ => Err(CollverError::Parse(Diagnostic::error(
            format!("memory size body must evaluate to exactly one integer, got {}", stack.len()),
            owner,
        ))),
    }
}

fn binary_op(
    stack: &mut Vec<i64>,
    loc: Location,
    op: impl Fn(i64, i64) -> i64,
) -> CollverResult<()> {
    let a = stack.pop().ok_or_else(|| {
        CollverError::Parse(Diagnostic::error("intrinsic arithmetic needs two operands", loc))
    })?;
    let b = stack.pop().ok_or_else(|| {
        CollverError::Parse(Diagnostic::error("intrinsic arithmetic needs two operands", loc))
    })?;
    stack.push(op(a, b));
    Ok(())
}

fn parse_top_level_memory(cursor: &mut Cursor) -> CollverResult<(Symbol, u64)> {
    let memory_loc = expect_keyword(cursor, Keyword::Memory)?;
    let (name, _) = expect_name(cursor, "memory")?;
    let size = eval_memory_size(cursor, memory_loc)?;
    Ok((name, size))
}

fn parse_proc(cursor: &mut Cursor, program: &mut Program) -> CollverResult<()> {
    let proc_loc = expect_keyword(cursor, Keyword::Proc)?;
    let (name, _) = expect_name(cursor, "proc")?;
    let sig = parse_signature(cursor, Keyword::Do)?;

    let mut local_memories = IndexMap::new();
    while matches!(
        cursor.peek(),
        Some(Word::Keyword { keyword: Keyword::Memory, .. })
    ) {
        let (mem_name, size) = parse_top_level_memory(cursor)?;
        local_memories.insert(mem_name, size);
    }

    let (words, strings) = parse_proc_body(cursor, proc_loc)?;

    if program.procs.contains_key(&name) {
        return Err(CollverError::Parse(Diagnostic::error(
            "a procedure with this name is already defined",
            proc_loc,
        )));
    }
    program.procs.insert(
        name,
        Proc { location: proc_loc, local_memories, sig, strings, words },
    );
    Ok(())
}

fn parse_extern(cursor: &mut Cursor, program: &mut Program) -> CollverResult<()> {
    expect_keyword(cursor, Keyword::Extern)?;
    let (name, _) = expect_name(cursor, "extern")?;
    let sig = parse_signature(cursor, Keyword::End)?;
    program.externs.entry(name).or_default().push(sig);
    Ok(())
}

/// Consume a procedure body: a nested sequence of words where `if` and
/// `while` increase depth and `end` decreases it; the body closes when a
/// depth-zero `end` is reached. String literals are indexed by their
/// position in the returned word list.
///
/// Nesting is tracked with a stack of opener locations rather than a bare
/// counter so an unclosed body can name the innermost block still open
/// instead of just reporting "ran out of tokens". An `end` only closes the
/// innermost `if`/`while` when a later token remains that could still close
/// the body itself; an `end` with nothing after it can't be doing both
/// jobs at once, so it's left unconsumed and the still-open block it would
/// have closed is reported instead of falling through to a generic EOF at
/// the proc's own declaration.
fn parse_proc_body(
    cursor: &mut Cursor,
    proc_loc: Location,
) -> CollverResult<(Vec<Word>, IndexMap<usize, String>)> {
    let mut words = Vec::new();
    let mut strings = IndexMap::new();
    let mut open_blocks: Vec<Location> = Vec::new();

    loop {
        let word = match cursor.next() {
            Some(word) => word.clone(),
            None => {
                let unclosed_at = open_blocks.last().copied().unwrap_or(proc_loc);
                return Err(CollverError::Structure(Diagnostic::error(
                    "unclosed block: expected `end`",
                    unclosed_at,
                )));
            }
        };

        match &word {
            Word::Keyword { keyword: Keyword::If | Keyword::While, token, .. } => {
                open_blocks.push(token.location())
            }
            Word::Keyword { keyword: Keyword::End, .. } => {
                if open_blocks.is_empty() {
                    return Ok((words, strings));
                }
                if cursor.peek().is_none() {
                    let unclosed_at = *open_blocks.last().unwrap();
                    return Err(CollverError::Structure(Diagnostic::error(
                        "unclosed block: expected `end`",
                        unclosed_at,
                    )));
                }
                open_blocks.pop();
            }
            Word::PushString { value, .. } => {
                strings.insert(words.len(), value.clone());
            }
            _ => {}
        }
        words.push(word);
    }
}
