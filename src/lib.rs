//! Core LP-relaxation, cut-selection, and presolve machinery for a
//! branch-and-cut MIP solver.
//!
//! The crate owns three pieces of an LP-based search, each usable on its own:
//!
//! - **LP management** ([`lp`]): [`LpModel`](lp::LpModel) keeps an
//!   incrementally growing and shrinking linear program synchronized against
//!   an external simplex oracle, with diving, row/column aging, and solution
//!   caching. Rows live in a reference-counted [`RowPool`](lp::RowPool).
//! - **Cut selection** ([`cutsel`]): [`CutScorer`](cutsel::CutScorer)
//!   combines efficacy, directed cutoff distance, objective parallelism,
//!   integral support, and numerics signals into one score per candidate cut;
//!   [`CutSelector`](cutsel::CutSelector) greedily picks a budgeted,
//!   pairwise near-orthogonal subset in place.
//! - **Presolving** ([`presolve`]):
//!   [`DominanceDetector`](presolve::DominanceDetector) finds column
//!   dominance relations over a [`SparseMatrixView`](presolve::SparseMatrixView)
//!   and fixes dominated variables.
//!
//! The crate never owns the global variable state or the simplex
//! implementation; both are reached through traits ([`vars::VarStore`],
//! [`lp::LpOracle`]) so the surrounding solver process stays in control.

#![warn(clippy::all)]

pub mod cutsel;
pub mod error;
pub mod lp;
pub mod presolve;
pub mod settings;
pub mod vars;

// Re-export main types
pub use cutsel::{CutScorer, CutSelStats, CutSelector, ScoreContext};
pub use error::{CoreError, CoreResult};
pub use lp::{LpModel, LpOracle, LpSolStat, LpStats, Row, RowId, RowPool, SimplexKind};
pub use presolve::{DomcolStats, DominanceDetector, PresolveOutcome, SparseMatrixView};
pub use settings::{CutSelSettings, LpSettings};
pub use vars::{ProblemVars, VarClass, VarStore};
