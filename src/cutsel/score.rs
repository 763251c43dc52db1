//! Composite cut scoring.
//!
//! Each candidate gets a weighted combination of normalized signals. The
//! normalizers are maxima over the whole candidate set, so scoring always runs
//! over the full set before any selection decision is made.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::error::CoreResult;
use crate::lp::{Row, RowId, RowPool};
use crate::settings::CutSelSettings;
use crate::vars::VarStore;

/// Violation tolerance: a cut with feasibility above `-EPS` scores zero
/// efficacy.
const EPS: f64 = 1e-6;

/// Bound on the uniform tie-breaking perturbation.
const PERTURBATION: f64 = 1e-6;

/// Everything the scorer reads besides the cuts themselves.
///
/// Solution and objective vectors are indexed by column id (arena order).
pub struct ScoreContext<'a> {
    /// Current LP relaxation point.
    pub lp_sol: &'a [f64],

    /// Incumbent solution, if any.
    pub best_sol: Option<&'a [f64]>,

    /// Objective coefficients.
    pub obj: &'a [f64],

    /// Whether separation runs at the root node.
    pub root: bool,

    /// Number of columns in the current LP (density denominator).
    pub ncols: usize,

    /// External variable store (classes, pseudocosts, locks).
    pub vars: &'a dyn VarStore,

    /// Column id to variable handle.
    pub col_vars: &'a [usize],
}

/// Raw per-cut signals before normalization.
#[derive(Debug, Default, Clone, Copy)]
struct Signals {
    eff: f64,
    dcd: f64,
    expimprov: f64,
    objparal: f64,
    intsup: f64,
    density: f64,
    coefratio: f64,
    pscost: f64,
    locks: f64,
}

/// Cut scorer with seeded tie-breaking perturbations.
pub struct CutScorer<'a> {
    settings: &'a CutSelSettings,
}

impl<'a> CutScorer<'a> {
    /// Create a scorer; fails on out-of-range settings.
    pub fn new(settings: &'a CutSelSettings) -> CoreResult<Self> {
        settings.validate()?;
        Ok(Self { settings })
    }

    /// Score every cut in `cuts`, in order.
    pub fn score_cuts(
        &self,
        pool: &RowPool,
        cuts: &[RowId],
        ctx: &ScoreContext<'_>,
    ) -> Vec<f64> {
        let objnorm = ctx.obj.iter().map(|c| c * c).sum::<f64>().sqrt();

        let mut signals = Vec::with_capacity(cuts.len());
        let mut maxeff = 0.0_f64;
        let mut maxdcd = 0.0_f64;
        let mut maxexp = 0.0_f64;
        let mut maxpscost = 0.0_f64;
        let mut maxlocks = 0.0_f64;

        let use_dcd = ctx.root && ctx.best_sol.is_some();
        for &id in cuts {
            let row = pool.get(id);

            // Efficacy against the incumbent, or the LP point without one.
            let effpoint = ctx.best_sol.unwrap_or(ctx.lp_sol);
            let eff = row.efficacy_at(effpoint, EPS);

            let dcd = if use_dcd {
                directed_cutoff_distance(row, ctx.lp_sol, ctx.best_sol.unwrap_or(ctx.lp_sol))
            } else {
                0.0
            };

            let objparal = row.obj_parallelism(ctx.obj, objnorm);
            let expimprov = eff * objparal;

            let sig = Signals {
                eff,
                dcd,
                expimprov,
                objparal,
                intsup: integral_support(row, ctx),
                density: row.density(ctx.ncols),
                coefratio: if row.min_abs_coef() > 0.0 {
                    row.max_abs_coef() / row.min_abs_coef()
                } else {
                    f64::INFINITY
                },
                pscost: pscost_score(row, ctx),
                locks: lock_score(row, ctx),
            };
            maxeff = maxeff.max(sig.eff);
            maxdcd = maxdcd.max(sig.dcd);
            maxexp = maxexp.max(sig.expimprov);
            maxpscost = maxpscost.max(sig.pscost);
            maxlocks = maxlocks.max(sig.locks);
            signals.push(sig);
        }

        let s = self.settings;
        signals
            .iter()
            .zip(cuts)
            .map(|(sig, &id)| {
                let mut score = 0.0;

                // The cutoff-distance weight folds into efficacy whenever the
                // distance itself cannot be computed.
                if use_dcd {
                    score += s.efficacyweight * log_scale(sig.eff, maxeff);
                    score += s.dircutoffdistweight * log_scale(sig.dcd, maxdcd);
                } else {
                    score += (s.efficacyweight + s.dircutoffdistweight) * log_scale(sig.eff, maxeff);
                }

                score += s.expimprovweight * log_scale(sig.expimprov, maxexp);
                score += s.objparalweight * sig.objparal;
                score += s.objorthogweight * (1.0 - sig.objparal);
                score += s.intsupportweight * sig.intsup;

                // Linear sparsity bonus, floored at zero past the threshold.
                score += s.maxsparsitybonus
                    * (1.0 - sig.density / s.endsparsitybonus).max(0.0);

                if sig.coefratio <= s.maxcoefratiobonus {
                    score += s.goodnumericsbonus;
                }

                if maxpscost > 0.0 {
                    score += s.pscostweight * (sig.pscost / maxpscost);
                }
                if maxlocks > 0.0 {
                    let normed = sig.locks / maxlocks;
                    score += s.locksweight * if s.penaliselocks { 1.0 - normed } else { normed };
                }

                score + self.perturbation(id)
            })
            .collect()
    }

    /// Tie-breaking perturbation derived from the seed and the cut's
    /// identity, never from its position: a cut's score stays the same
    /// however the candidate slice is permuted between rounds.
    fn perturbation(&self, id: RowId) -> f64 {
        let seed = self
            .settings
            .randseed
            .wrapping_add((id.0 as u64).wrapping_mul(0x9e37_79b9_7f4a_7c15));
        StdRng::seed_from_u64(seed).gen::<f64>() * PERTURBATION
    }
}

/// `(log1p(x) / log1p(max))^2`: compresses outliers while preserving the
/// ranking, so one huge cut cannot dominate by scale alone.
fn log_scale(x: f64, max: f64) -> f64 {
    if max <= 0.0 || x <= 0.0 {
        return 0.0;
    }
    let scaled = x.ln_1p() / max.ln_1p();
    scaled * scaled
}

/// Distance from the LP point toward the incumbent, restricted to the cut's
/// halfspace. Falls back to plain efficacy for a degenerate direction.
fn directed_cutoff_distance(row: &Row, lp_sol: &[f64], best_sol: &[f64]) -> f64 {
    let viol = -row.feasibility_at(lp_sol);
    if viol <= EPS {
        return 0.0;
    }

    let mut dot = 0.0;
    for &(c, a) in row.entries() {
        dot += a * (best_sol[c] - lp_sol[c]);
    }
    let dnorm = lp_sol
        .iter()
        .zip(best_sol)
        .map(|(x, y)| (y - x) * (y - x))
        .sum::<f64>()
        .sqrt();
    if dnorm <= 0.0 {
        return row.efficacy_at(lp_sol, EPS);
    }
    let denom = dot.abs() / dnorm;
    if denom < 1e-9 {
        return row.efficacy_at(lp_sol, EPS);
    }
    viol / denom
}

/// Fraction of nonzeros on integer-constrained columns.
fn integral_support(row: &Row, ctx: &ScoreContext<'_>) -> f64 {
    if row.is_empty() {
        return 0.0;
    }
    let nint = row
        .entries()
        .iter()
        .filter(|&&(c, _)| ctx.vars.class(ctx.col_vars[c]).is_integral())
        .count();
    nint as f64 / row.len() as f64
}

/// Pseudocost-weighted score: `sum |a_j|/norm * pscost(j)`.
fn pscost_score(row: &Row, ctx: &ScoreContext<'_>) -> f64 {
    let norm = row.norm();
    if norm <= 0.0 {
        return 0.0;
    }
    row.entries()
        .iter()
        .map(|&(c, a)| a.abs() / norm * ctx.vars.pseudocost_score(ctx.col_vars[c]))
        .sum()
}

/// Average relevant lock count over the cut's nonzeros. Only the lock
/// direction consistent with the finite side counts.
fn lock_score(row: &Row, ctx: &ScoreContext<'_>) -> f64 {
    if row.is_empty() {
        return 0.0;
    }
    let use_rhs = row.rhs().is_finite();
    let total: usize = row
        .entries()
        .iter()
        .map(|&(c, a)| {
            let var = ctx.col_vars[c];
            if use_rhs == (a > 0.0) {
                ctx.vars.n_locks_down(var)
            } else {
                ctx.vars.n_locks_up(var)
            }
        })
        .sum();
    total as f64 / row.len() as f64
}
