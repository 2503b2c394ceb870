//! Geometry error type.

use thiserror::Error;

/// Errors produced by `az-geom`.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum GeomError {
    #[error("degenerate polygon with {vertices} vertices")]
    Degenerate { vertices: usize },

    #[error("vertex budget {0} is too small (minimum 3)")]
    BudgetTooSmall(usize),

    #[error("decomposition failed to converge: {vertices} vertices within a degenerate extent")]
    NonConvergent { vertices: usize },
}

pub type GeomResult<T> = Result<T, GeomError>;
