//! Data model shared by the word parser and the program parser.
//!
//! A [`Word`] is a tagged variant rather than the source language's single
//! struct with an untyped operand: the payload shape follows directly from
//! which operation it is, so push-int carries an `i64` and proc-call
//! carries a [`Symbol`], instead of every word carrying the union of all
//! possible payloads.

use collver_lex::Token;
use collver_util::{Location, Symbol};
use indexmap::IndexMap;

/// The closed set of reserved words recognized by the word parser.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Keyword {
    Memory,
    Proc,
    Extern,
    Arrow,
    If,
    Elif,
    While,
    Do,
    Else,
    End,
}

impl Keyword {
    pub fn from_text(text: &str) -> Option<Keyword> {
        Some(match text {
            "memory" => Keyword::Memory,
            "proc" => Keyword::Proc,
            "extern" => Keyword::Extern,
            "->" => Keyword::Arrow,
            "if" => Keyword::If,
            "elif" => Keyword::Elif,
            "while" => Keyword::While,
            "do" => Keyword::Do,
            "else" => Keyword::Else,
            "end" => Keyword::End,
            _ => return None,
        })
    }

    pub fn as_text(self) -> &'static str {
        match self {
            Keyword::Memory => "memory",
            Keyword::Proc => "proc",
            Keyword::Extern => "extern",
            Keyword::Arrow => "->",
            Keyword::If => "if",
            Keyword::Elif => "elif",
            Keyword::While => "while",
            Keyword::Do => "do",
            Keyword::Else => "else",
            Keyword::End => "end",
        }
    }
}

/// The closed set of primitive data types a signature or `unknown`
/// placeholder may name.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DataType {
    Int,
    Str,
    Ptr,
    Unknown,
}

impl DataType {
    pub fn from_text(text: &str) -> Option<DataType> {
        Some(match text {
            "int" => DataType::Int,
            "str" => DataType::Str,
            "ptr" => DataType::Ptr,
            "unknown" => DataType::Unknown,
            _ => return None,
        })
    }
}

impl std::fmt::Display for DataType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            DataType::Int => "int",
            DataType::Str => "str",
            DataType::Ptr => "ptr",
            DataType::Unknown => "unknown",
        })
    }
}

/// A stack slot's type, remembering the token that introduced it so
/// diagnostics can point back at it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TypeAnnotation {
    pub data_type: DataType,
    pub location: Location,
}

impl TypeAnnotation {
    pub fn new(data_type: DataType, location: Location) -> Self {
        Self { data_type, location }
    }
}

/// A single parsed instruction. `jmp` on [`Word::Keyword`] is `None` until
/// the cross-referencer fills it in; nothing else mutates a `Word` after
/// parsing.
#[derive(Clone, Debug, PartialEq)]
pub enum Word {
    PushInt { value: i64, token: Token },
    PushString { value: String, token: Token },
    Keyword { keyword: Keyword, token: Token, jmp: Option<usize> },
    DataType { data_type: DataType, token: Token },
    /// A name introduced right after `proc`, `extern`, or `memory`.
    MemoryName { name: Symbol, token: Token },
    PushMemory { name: Symbol, token: Token },
    ProcName { name: Symbol, token: Token },
    ProcCall { name: Symbol, token: Token },
}

impl Word {
    pub fn token(&self) -> &Token {
        match self {
            Word::PushInt { token, .. }
            | Word::PushString { token, .. }
            | Word::Keyword { token, .. }
            | Word::DataType { token, .. }
            | Word::MemoryName { token, .. }
            | Word::PushMemory { token, .. }
            | Word::ProcName { token, .. }
            | Word::ProcCall { token, .. } => token,
        }
    }

    pub fn location(&self) -> Location {
        self.token().location()
    }

    pub fn as_keyword(&self) -> Option<Keyword> {
        match self {
            Word::Keyword { keyword, .. } => Some(*keyword),
            _ => None,
        }
    }
}

/// `(args, returns, arrow_location)` for a `proc` or `extern` signature.
#[derive(Clone, Debug, PartialEq)]
pub struct ProcTypeSig {
    pub args: Vec<TypeAnnotation>,
    pub returns: Vec<TypeAnnotation>,
    pub arrow_location: Location,
}

/// One parsed procedure: its signature, its local memories, the string
/// literals its body pushes (indexed by position in `words`), and the
/// body itself.
#[derive(Clone, Debug)]
pub struct Proc {
    pub location: Location,
    pub local_memories: IndexMap<Symbol, u64>,
    pub sig: ProcTypeSig,
    pub strings: IndexMap<usize, String>,
    pub words: Vec<Word>,
}

/// A fully parsed (not yet type-checked) source file.
#[derive(Clone, Debug)]
pub struct Program {
    pub source_path: Symbol,
    pub procs: IndexMap<Symbol, Proc>,
    /// Externs are overloadable: each name maps to its registration-order
    /// list of candidate signatures.
    pub externs: IndexMap<Symbol, Vec<ProcTypeSig>>,
    pub global_memories: IndexMap<Symbol, u64>,
}
