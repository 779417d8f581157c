//! collver-util - Foundation types shared by every front-end crate.
//!
//! Three things every phase of the pipeline needs: a way to name a place
//! in source (`Location`), a way to intern the names procedures, externs,
//! memories, consts and aliases accumulate (`Symbol`), and a way to report
//! what went wrong (`Diagnostic`/`Handler`/`CollverError`).

mod diagnostic;
mod error;
mod span;
mod symbol;

pub use diagnostic::{Diagnostic, Handler, Level};
pub use error::{CollverError, CollverResult};
pub use span::Location;
pub use symbol::Symbol;
