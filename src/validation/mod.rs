//! Input and solution validation.
//!
//! - [`validate_input`]: structural checks on a snapshot before search.
//! - [`SolutionValidator`]: independent re-check of a finished entry set.

mod input;
mod solution;

pub use input::{validate_input, ValidationError, ValidationErrorKind, ValidationResult};
pub use solution::{SolutionValidator, ValidationFinding, ValidationReport};
