//! Line and structural differencing.

pub mod index;
pub mod lines;
pub mod signature;
pub mod structural;

pub use lines::{diff_lines, diff_lines_with_limit, DiffLine, LineType};
pub use structural::{diff_models, diff_models_detailed, StructuralDiff};

use crate::model::ChangeCategory;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DiffError {
    /// An entity reference that does not resolve inside its own model.
    #[error("Malformed model: {category} '{name}' is not in its lookup table")]
    MalformedModel {
        category: ChangeCategory,
        name: String,
    },
}
