//! Presolving reductions applied before the branch-and-bound search.
//!
//! [`SparseMatrixView`] freezes the constraint matrix into a dual-major
//! compressed form with per-row activity bounds; [`DominanceDetector`] runs
//! over that view and fixes dominated columns through the external
//! [`VarStore`](crate::vars::VarStore).

mod domcol;
mod matrix;

pub use domcol::{DomcolStats, DominanceDetector, PresolveOutcome};
pub use matrix::SparseMatrixView;
