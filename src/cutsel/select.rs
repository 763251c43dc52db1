//! Greedy budgeted cut selection.
//!
//! Candidates and their scores live in parallel slices that are permuted in
//! lockstep; after selection the slice is partitioned into a selected prefix
//! and a rejected tail.

use crate::error::{CoreError, CoreResult};
use crate::lp::{RowId, RowPool};
use crate::settings::CutSelSettings;

use super::score::{CutScorer, ScoreContext};

/// Counters for one selection round.
#[derive(Debug, Default, Clone)]
pub struct CutSelStats {
    /// Candidates rejected by the density pre-filter.
    pub ndensefiltered: usize,

    /// Candidates rejected or penalized by the parallelism policy.
    pub nparalfiltered: usize,

    /// Cuts selected.
    pub nselected: usize,

    /// Cumulative nonzero budget spent (sum of nnz/ncols).
    pub budgetused: f64,
}

/// Greedy cut selector.
///
/// Constructed once per separation round; scoring always completes over the
/// whole candidate set before the first selection decision.
pub struct CutSelector {
    settings: CutSelSettings,
    stats: CutSelStats,
}

impl CutSelector {
    /// Create a selector; fails on out-of-range settings.
    pub fn new(settings: CutSelSettings) -> CoreResult<Self> {
        settings.validate()?;
        Ok(Self {
            settings,
            stats: CutSelStats::default(),
        })
    }

    /// Counters of the last round.
    pub fn stats(&self) -> &CutSelStats {
        &self.stats
    }

    /// Score and select cuts. `forced` cuts are always added by the caller
    /// and only constrain the candidates here. Returns the number of
    /// selected cuts; `cuts[..nselected]` is the selected prefix in
    /// selection order.
    pub fn select(
        &mut self,
        pool: &RowPool,
        cuts: &mut [RowId],
        forced: &[RowId],
        ctx: &ScoreContext<'_>,
    ) -> CoreResult<usize> {
        self.stats = CutSelStats::default();

        // Density pre-filter, before scoring: filtered cuts are excluded from
        // the normalizers as well.
        let mut len = cuts.len();
        if self.settings.filterdensecuts {
            let mut i = 0;
            while i < len {
                // Real-valued density; never integer division.
                let density = pool.get(cuts[i]).density(ctx.ncols);
                if density > self.settings.maxcutdensity {
                    len -= 1;
                    cuts.swap(i, len);
                    self.stats.ndensefiltered += 1;
                } else {
                    i += 1;
                }
            }
        }

        let scorer = CutScorer::new(&self.settings)?;
        let mut scores = scorer.score_cuts(pool, &cuts[..len], ctx);
        let nselected = self.greedy(pool, &mut cuts[..len], &mut scores, forced, ctx.root, ctx.ncols);
        Ok(nselected)
    }

    /// Selection on caller-provided scores; `cuts` and `scores` must have
    /// equal length and stay permuted identically.
    pub fn select_scored(
        &mut self,
        pool: &RowPool,
        cuts: &mut [RowId],
        scores: &mut [f64],
        forced: &[RowId],
        root: bool,
        ncols: usize,
    ) -> CoreResult<usize> {
        if cuts.len() != scores.len() {
            return Err(CoreError::InvalidData(format!(
                "cuts and scores length mismatch: {} vs {}",
                cuts.len(),
                scores.len()
            )));
        }
        self.stats = CutSelStats::default();
        Ok(self.greedy(pool, cuts, scores, forced, root, ncols))
    }

    fn greedy(
        &mut self,
        pool: &RowPool,
        cuts: &mut [RowId],
        scores: &mut [f64],
        forced: &[RowId],
        root: bool,
        ncols: usize,
    ) -> usize {
        let mut len = cuts.len();
        let mut nselected = 0;

        // Forced cuts constrain the candidates before any selection.
        for &f in forced {
            len = self.apply_parallelism(pool, cuts, scores, nselected, len, f);
        }

        let budgetcap = if root {
            self.settings.maxnonzerorootround
        } else {
            self.settings.maxnonzerotreeround
        };
        let mut budget = 0.0;

        while nselected < len && nselected < self.settings.maxnselectedcuts {
            // Deterministic winner: first occurrence of the maximum.
            let mut best = nselected;
            for i in nselected + 1..len {
                if scores[i] > scores[best] {
                    best = i;
                }
            }
            if scores[best] < self.settings.minscore {
                break;
            }

            cuts.swap(nselected, best);
            scores.swap(nselected, best);
            let selected = cuts[nselected];
            nselected += 1;

            if ncols > 0 {
                budget += pool.get(selected).len() as f64 / ncols as f64;
            }
            if budget > budgetcap {
                break;
            }

            len = self.apply_parallelism(pool, cuts, scores, nselected, len, selected);
        }

        self.stats.nselected = nselected;
        self.stats.budgetused = budget;
        log::debug!(
            "cut selection: {} of {} candidates, budget {:.3}/{:.3}",
            nselected,
            cuts.len(),
            budget,
            budgetcap
        );
        nselected
    }

    /// Apply the configured parallelism policy of `against` to the candidate
    /// region `[from, len)`; returns the new active length.
    fn apply_parallelism(
        &mut self,
        pool: &RowPool,
        cuts: &mut [RowId],
        scores: &mut [f64],
        from: usize,
        mut len: usize,
        against: RowId,
    ) -> usize {
        if !self.settings.filterparalcuts && !self.settings.penaliseparalcuts {
            return len;
        }
        let refrow = pool.get(against);
        if self.settings.filterparalcuts {
            let mut i = from;
            while i < len {
                if pool.get(cuts[i]).parallelism(refrow) > self.settings.maxparal {
                    len -= 1;
                    cuts.swap(i, len);
                    scores.swap(i, len);
                    self.stats.nparalfiltered += 1;
                } else {
                    i += 1;
                }
            }
        } else {
            for i in from..len {
                if pool.get(cuts[i]).parallelism(refrow) > self.settings.maxparal {
                    scores[i] -= self.settings.paralpenalty;
                    self.stats.nparalfiltered += 1;
                }
            }
        }
        len
    }
}
