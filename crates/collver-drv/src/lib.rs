//! collver-drv - Front-end pipeline orchestration.
//!
//! Runs every phase up to and including the cross-referencer: lex,
//! preprocess, word-parse, program-parse, type-check, cross-reference.
//! Lowering a checked [`Program`] to LLVM IR, linking, and the `collver`
//! CLI itself are out of scope here; this crate hands callers a
//! fully-checked, fully cross-referenced [`Program`] and nothing past it.

use std::fs;
use std::path::{Path, PathBuf};

use collver_check::check;
use collver_lex::lex;
use collver_par::{parse_program, parse_words, Program};
use collver_pre::{preprocess, PreprocessConfig};
use collver_util::{CollverError, CollverResult, Handler, Symbol};

/// Options governing a single front-end run.
#[derive(Clone, Debug, Default)]
pub struct DriverConfig {
    /// Extra directories searched for `include "<path>"` targets that
    /// don't resolve relative to the including file's own directory.
    pub include_dirs: Vec<PathBuf>,
    /// When set, each phase logs entry and exit at debug level.
    pub verbose: bool,
}

impl DriverConfig {
    fn preprocess_config(&self) -> PreprocessConfig {
        PreprocessConfig { include_dirs: self.include_dirs.clone() }
    }
}

/// A fully-checked, cross-referenced program plus the warnings its type
/// checker accumulated along the way.
pub struct CompiledUnit {
    pub program: Program,
    pub warnings: Handler,
}

/// Run the whole front end over source text already in memory.
///
/// `file_name` is used only for diagnostic locations; it need not exist
/// on disk, which is what lets tests and REPL-style callers compile a
/// string without a temp file.
pub fn compile_source(
    file_name: &str,
    source: &str,
    config: &DriverConfig,
) -> CollverResult<CompiledUnit> {
    if config.verbose {
        log::debug!("lexing {file_name}");
    }
    let tokens = lex(file_name, source)?;

    if config.verbose {
        log::debug!("preprocessing {file_name}");
    }
    let tokens = preprocess(tokens, &config.preprocess_config())?;

    if config.verbose {
        log::debug!("parsing words for {file_name}");
    }
    let words = parse_words(tokens)?;

    if config.verbose {
        log::debug!("parsing program for {file_name}");
    }
    let mut program = parse_program(Symbol::intern(file_name), words)?;

    if config.verbose {
        log::debug!("type-checking and cross-referencing {file_name}");
    }
    let warnings = check(&mut program)?;

    Ok(CompiledUnit { program, warnings })
}

/// Run the whole front end over a file on disk.
pub fn compile_file(path: &Path, config: &DriverConfig) -> CollverResult<CompiledUnit> {
    let source = fs::read_to_string(path).map_err(|e| CollverError::Io {
        path: path.display().to_string(),
        source: e,
    })?;
    let file_name = path.to_string_lossy();
    compile_source(&file_name, &source, config)
}

/// Entry point for a caller (the out-of-scope CLI) that only wants the
/// checked program and not the accumulated warnings.
pub fn compile_frontend(entry: &Path, config: &DriverConfig) -> CollverResult<Program> {
    Ok(compile_file(entry, config)?.program)
}
