//! collver-check - Type checker and cross-referencer.
//!
//! The type checker (§4.6) simulates each procedure's value stack
//! independently; the cross-referencer (§4.7) separately fills in every
//! control-flow word's `jmp` index. Neither depends on the other's
//! output, so [`check`] runs both and returns the checker's warnings.

mod checker;
mod xref;

pub use checker::check_program;
pub use xref::cross_reference_program;

use collver_par::Program;
use collver_util::{CollverResult, Handler};

/// Type-check and cross-reference a parsed program, stopping at the
/// first fatal error either phase reports.
pub fn check(program: &mut Program) -> CollverResult<Handler> {
    let handler = check_program(program)?;
    cross_reference_program(program)?;
    Ok(handler)
}
