//! Error types for the core engine.

use thiserror::Error;

/// Errors that can occur in the LP management, cut selection, and presolve layers.
///
/// Solve outcomes (infeasible, unbounded, limits) are *not* errors; they are
/// reported through [`crate::lp::LpSolStat`] so the caller can discard a node
/// and keep searching.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Contract violation: invalid input or an operation on an object in the
    /// wrong state (locked row, unbalanced dive, stale solution access).
    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// A configuration value is outside its documented range.
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// The external LP oracle failed in a way that is not a solve status
    /// (transport/interface failure, inconsistent dimensions).
    #[error("LP oracle failure: {0}")]
    Oracle(String),
}

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;
