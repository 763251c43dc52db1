//! Cut scoring and selection.
//!
//! One separation round scores the whole candidate set with [`CutScorer`]
//! and then lets [`CutSelector`] pick a budget-constrained, pairwise
//! near-orthogonal subset; the selected cuts end up as the prefix of the
//! candidate slice, in selection order.

mod score;
mod select;

pub use score::{CutScorer, ScoreContext};
pub use select::{CutSelStats, CutSelector};
