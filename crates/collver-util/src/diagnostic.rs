//! Diagnostic reporting.
//!
//! The diagnostic line format is fixed:
//! `<file>:<row1>:<col1>:<severity>: <message>`, severity one of
//! `error`/`warning`/`note`. This module's [`Diagnostic`] renders exactly
//! that line (plus any attached notes on their own lines), and
//! [`Handler`] is where the handful of non-fatal diagnostics the checker
//! emits (unknown-call warnings) accumulate — everything else is a fatal
//! [`crate::CollverError`] returned directly.

use crate::Location;
use std::fmt;

/// Diagnostic severity.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Level {
    Error,
    Warning,
    Note,
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Level::Error => "error",
            Level::Warning => "warning",
            Level::Note => "note",
        })
    }
}

/// A single diagnostic message with its location and any attached notes.
///
/// # Examples
///
/// ```
/// use collver_util::{Diagnostic, Level, Location, Symbol};
///
/// let loc = Location::new(Symbol::intern("a.collver"), 0, 0);
/// let diag = Diagnostic::new(Level::Warning, "call to unknown procedure `foo`", loc);
/// assert_eq!(diag.to_string(), "a.collver:1:1:warning: call to unknown procedure `foo`");
/// ```
#[derive(Clone, Debug)]
pub struct Diagnostic {
    pub level: Level,
    pub message: String,
    pub location: Location,
    pub notes: Vec<(String, Location)>,
}

impl Diagnostic {
    pub fn new(level: Level, message: impl Into<String>, location: Location) -> Self {
        Self {
            level,
            message: message.into(),
            location,
            notes: Vec::new(),
        }
    }

    pub fn error(message: impl Into<String>, location: Location) -> Self {
        Self::new(Level::Error, message, location)
    }

    pub fn warning(message: impl Into<String>, location: Location) -> Self {
        Self::new(Level::Warning, message, location)
    }

    /// Attach a contributing location, e.g. "candidate signature defined
    /// here" on a failed extern overload resolution.
    pub fn with_note(mut self, message: impl Into<String>, location: Location) -> Self {
        self.notes.push((message.into(), location));
        self
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}:{}: {}", self.location, self.level, self.message)?;
        for (i, (note, loc)) in self.notes.iter().enumerate() {
            write!(f, "{}:{}: {}", loc, Level::Note, note)?;
            if i + 1 != self.notes.len() {
                writeln!(f)?;
            }
        }
        Ok(())
    }
}

/// Accumulates non-fatal diagnostics (warnings and their notes) over the
/// course of compiling one procedure or file.
///
/// Fatal errors never go through the handler: every phase returns them
/// immediately as a [`crate::CollverError`] and the pipeline stops. The
/// handler exists only for the checker's "unknown procedure call"
/// warning, which lets checking of that one procedure stop without
/// aborting the whole compilation.
#[derive(Default)]
pub struct Handler {
    diagnostics: Vec<Diagnostic>,
}

impl Handler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn emit(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }

    pub fn warning(&mut self, message: impl Into<String>, location: Location) {
        self.emit(Diagnostic::warning(message, location));
    }

    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }
}
