//! The fatal-error taxonomy.
//!
//! Every phase stops at its first fatal error and returns it immediately;
//! there is no accumulation or recovery. Each variant
//! carries the [`Diagnostic`] that would be printed for it, so a caller can
//! either `eprintln!` it directly or inspect `.location()`/`.to_string()`.

use crate::Diagnostic;
use thiserror::Error;

/// A fatal front-end error, tagged by the phase that raised it.
#[derive(Debug, Error)]
pub enum CollverError {
    /// Malformed token or unreadable source file.
    #[error("{0}")]
    Lex(Diagnostic),

    /// Include/const/alias preprocessing failure.
    #[error("{0}")]
    Preprocess(Diagnostic),

    /// Structural parse failure: unknown word, missing name/arrow/`do`/
    /// `end`, non-datatype in a signature.
    #[error("{0}")]
    Parse(Diagnostic),

    /// Call-site, branch-merge, or return-shape mismatch.
    #[error("{0}")]
    Type(Diagnostic),

    /// Unbalanced control flow: unmatched `elif`/`else`/`end`, or an
    /// unclosed block at procedure end.
    #[error("{0}")]
    Structure(Diagnostic),

    /// A source or include file could not be opened.
    #[error("cannot read `{path}`: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

impl CollverError {
    /// The diagnostic this error would print, if it carries one (every
    /// variant except [`CollverError::Io`], which has no source location).
    pub fn diagnostic(&self) -> Option<&Diagnostic> {
        match self {
            CollverError::Lex(d)
            | CollverError::Preprocess(d)
            | CollverError::Parse(d)
            | CollverError::Type(d)
            | CollverError::Structure(d) => Some(d),
            CollverError::Io { .. } => None,
        }
    }
}

pub type CollverResult<T> = std::result::Result<T, CollverError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Level, Location, Symbol};

    #[test]
    fn variant_display_is_the_diagnostic_line() {
        let loc = Location::new(Symbol::intern("x.collver"), 0, 0);
        let err = CollverError::Type(Diagnostic::new(Level::Error, "bad stack", loc));
        assert_eq!(err.to_string(), "x.collver:1:1:error: bad stack");
    }

    #[test]
    fn io_variant_has_no_diagnostic() {
        let err = CollverError::Io {
            path: "missing.collver".into(),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "not found"),
        };
        assert!(err.diagnostic().is_none());
    }
}
