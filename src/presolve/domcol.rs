//! Column-dominance presolving.
//!
//! A column dominates another when, for every row, setting the dominating
//! variable instead of the dominated one is at least as good for feasibility,
//! and its objective coefficient is no worse. A detected relation lets us fix
//! one of the two variables at a bound, provided a safety check on the
//! dominating variable's predicted bounds (or, for binary pairs, on clique
//! membership) passes.

use log::debug;

use crate::presolve::matrix::{classify, contribution, RowClass, SparseMatrixView};
use crate::vars::{VarClass, VarStore};

/// Result of one presolve round.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PresolveOutcome {
    /// A fixing contradicted the current domain; the node is infeasible.
    Cutoff,

    /// At least one variable was fixed.
    Reduced,

    /// Nothing changed.
    Unchanged,
}

/// Fixing recorded for a column, applied at the end of the round.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FixingDirective {
    AtLb,
    AtUb,
}

/// Counters for one detector's lifetime.
#[derive(Debug, Clone, Copy, Default)]
pub struct DomcolStats {
    /// Dominance relations established.
    pub ndomrelations: usize,

    /// Variables actually fixed.
    pub nfixedvars: usize,

    /// Relations where the predicted-bound safety check blocked the fixing.
    pub nboundpreventions: usize,

    /// Binary relations where clique membership blocked the fixing.
    pub ncliquepreventions: usize,
}

/// Running bound predictions for a dominating column, tightened row by row.
///
/// "Worst case" assumes the other columns of each row take the values that
/// restrict this column the most, "best case" the least.
#[derive(Debug, Clone, Copy)]
struct PredictedBounds {
    bestlb: f64,
    worstlb: f64,
    bestub: f64,
    worstub: f64,
}

impl Default for PredictedBounds {
    fn default() -> Self {
        Self {
            bestlb: f64::NEG_INFINITY,
            worstlb: f64::NEG_INFINITY,
            bestub: f64::INFINITY,
            worstub: f64::INFINITY,
        }
    }
}

impl PredictedBounds {
    /// Fold in the bound this row imposes on a column with coefficient `val`,
    /// given the row's residual activities with the column's own contribution
    /// removed. Infinite residuals follow explicit cases: an unbounded
    /// residual yields no information in the best case and an unattainable
    /// bound in the worst case.
    fn update(&mut self, class: RowClass, lhs: f64, rhs: f64, val: f64, minres: f64, maxres: f64) {
        match class {
            RowClass::Le => {
                if val > 0.0 {
                    // val * x <= rhs - residual: upper bound.
                    if minres != f64::NEG_INFINITY {
                        self.bestub = self.bestub.min((rhs - minres) / val);
                    }
                    let cand = if maxres == f64::INFINITY {
                        f64::NEG_INFINITY
                    } else {
                        (rhs - maxres) / val
                    };
                    self.worstub = self.worstub.min(cand);
                } else {
                    // Dividing by a negative coefficient flips to a lower bound.
                    if minres != f64::NEG_INFINITY {
                        self.bestlb = self.bestlb.max((rhs - minres) / val);
                    }
                    let cand = if maxres == f64::INFINITY {
                        f64::INFINITY
                    } else {
                        (rhs - maxres) / val
                    };
                    self.worstlb = self.worstlb.max(cand);
                }
            }
            RowClass::Ge => {
                if val > 0.0 {
                    if maxres != f64::INFINITY {
                        self.bestlb = self.bestlb.max((lhs - maxres) / val);
                    }
                    let cand = if minres == f64::NEG_INFINITY {
                        f64::INFINITY
                    } else {
                        (lhs - minres) / val
                    };
                    self.worstlb = self.worstlb.max(cand);
                } else {
                    if maxres != f64::INFINITY {
                        self.bestub = self.bestub.min((lhs - maxres) / val);
                    }
                    let cand = if minres == f64::NEG_INFINITY {
                        f64::NEG_INFINITY
                    } else {
                        (lhs - minres) / val
                    };
                    self.worstub = self.worstub.min(cand);
                }
            }
            // Equations and ranged rows kill dominance before bounds matter;
            // free rows never bind.
            RowClass::Equation | RowClass::Ranged | RowClass::Free => {}
        }
    }
}

/// Detects column-dominance relations and derives safe fixings.
#[derive(Debug, Default)]
pub struct DominanceDetector {
    stats: DomcolStats,
}

impl DominanceDetector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Lifetime counters.
    pub fn stats(&self) -> &DomcolStats {
        &self.stats
    }

    /// Run one detection round over `matrix` and apply the derived fixings
    /// through `store`.
    ///
    /// Rows are visited sparsest first; within each row the not yet processed
    /// columns are bucketed by variable class and compared pairwise. Fixings
    /// are recorded per column, first writer wins, and applied in a single
    /// reverse-order pass at the end; infeasibility from the store aborts the
    /// round with [`PresolveOutcome::Cutoff`].
    pub fn presolve_round(
        &mut self,
        matrix: &SparseMatrixView,
        store: &mut dyn VarStore,
    ) -> PresolveOutcome {
        let ncols = matrix.ncols();
        let mut varstofix: Vec<Option<FixingDirective>> = vec![None; ncols];
        let mut processed = vec![false; ncols];
        let mut nprocessed = 0;

        let mut roworder: Vec<usize> = (0..matrix.nrows()).collect();
        roworder.sort_by_key(|&r| matrix.row_nnz(r));

        for &r in &roworder {
            if nprocessed == ncols {
                break;
            }

            // Bucket the row's unprocessed columns: continuous,
            // integer-or-implied, binary.
            let mut buckets: [Vec<usize>; 3] = [Vec::new(), Vec::new(), Vec::new()];
            for &c in matrix.row_cols(r) {
                if !processed[c] {
                    buckets[store.class(matrix.var(c)).bucket()].push(c);
                }
            }

            for bucket in &buckets {
                if bucket.len() >= 2 {
                    for i in 0..bucket.len() {
                        for j in i + 1..bucket.len() {
                            self.process_pair(matrix, store, &mut varstofix, bucket[i], bucket[j]);
                        }
                    }
                }
                for &c in bucket {
                    processed[c] = true;
                    nprocessed += 1;
                }
            }
        }

        let mut nfixedround = 0;
        for c in (0..ncols).rev() {
            if let Some(directive) = varstofix[c] {
                let var = matrix.var(c);
                let value = match directive {
                    FixingDirective::AtLb => store.lb(var),
                    FixingDirective::AtUb => store.ub(var),
                };
                let (infeasible, fixed) = store.fix(var, value);
                if infeasible {
                    debug!("dominance fixing of variable {} at {} infeasible", var, value);
                    return PresolveOutcome::Cutoff;
                }
                if fixed {
                    self.stats.nfixedvars += 1;
                    nfixedround += 1;
                }
            }
        }

        debug!(
            "dominance round: {} relations, {} fixed, {} bound / {} clique preventions",
            self.stats.ndomrelations,
            self.stats.nfixedvars,
            self.stats.nboundpreventions,
            self.stats.ncliquepreventions
        );

        if nfixedround > 0 {
            PresolveOutcome::Reduced
        } else {
            PresolveOutcome::Unchanged
        }
    }

    fn process_pair(
        &mut self,
        matrix: &SparseMatrixView,
        store: &dyn VarStore,
        varstofix: &mut [Option<FixingDirective>],
        c1: usize,
        c2: usize,
    ) {
        let binary = store.class(matrix.var(c1)) == VarClass::Binary;
        let (col1dom, col2dom, bounds1, bounds2) =
            self.check_pair(matrix, store, varstofix, c1, c2);

        // Ties resolve in favor of the lower-index column; arbitrary but
        // deterministic.
        if col1dom {
            self.stats.ndomrelations += 1;
            self.record_fixing(store, varstofix, matrix.var(c1), matrix.var(c2), c1, c2, &bounds1, binary);
        } else if col2dom {
            self.stats.ndomrelations += 1;
            self.record_fixing(store, varstofix, matrix.var(c2), matrix.var(c1), c2, c1, &bounds2, binary);
        }
    }

    /// Merge-walk the two columns' row lists and decide dominance in both
    /// directions, accumulating predicted bounds for each column along rows
    /// where its direction still survives.
    fn check_pair(
        &self,
        matrix: &SparseMatrixView,
        store: &dyn VarStore,
        varstofix: &[Option<FixingDirective>],
        c1: usize,
        c2: usize,
    ) -> (bool, bool, PredictedBounds, PredictedBounds) {
        let var1 = matrix.var(c1);
        let var2 = matrix.var(c2);

        let mut col1dom =
            store.obj(var1) <= store.obj(var2) && varstofix[c2].is_none() && !store.is_fixed(var2);
        let mut col2dom =
            store.obj(var2) <= store.obj(var1) && varstofix[c1].is_none() && !store.is_fixed(var1);

        let mut bounds1 = PredictedBounds::default();
        let mut bounds2 = PredictedBounds::default();
        if !col1dom && !col2dom {
            return (false, false, bounds1, bounds2);
        }

        let (lb1, ub1) = (store.lb(var1), store.ub(var1));
        let (lb2, ub2) = (store.lb(var2), store.ub(var2));

        let (rows1, vals1) = matrix.col(c1);
        let (rows2, vals2) = matrix.col(c2);
        let mut i = 0;
        let mut j = 0;
        while (i < rows1.len() || j < rows2.len()) && (col1dom || col2dom) {
            let (r, v1, v2) = if j >= rows2.len() || (i < rows1.len() && rows1[i] < rows2[j]) {
                i += 1;
                (rows1[i - 1], Some(vals1[i - 1]), None)
            } else if i >= rows1.len() || rows2[j] < rows1[i] {
                j += 1;
                (rows2[j - 1], None, Some(vals2[j - 1]))
            } else {
                i += 1;
                j += 1;
                (rows1[i - 1], Some(vals1[i - 1]), Some(vals2[j - 1]))
            };

            let (lhs, rhs) = (matrix.lhs(r), matrix.rhs(r));
            let class = classify(lhs, rhs);
            let a1 = v1.unwrap_or(0.0);
            let a2 = v2.unwrap_or(0.0);
            match class {
                RowClass::Le => {
                    col1dom &= a1 <= a2;
                    col2dom &= a2 <= a1;
                }
                RowClass::Ge => {
                    col1dom &= a1 >= a2;
                    col2dom &= a2 >= a1;
                }
                RowClass::Equation | RowClass::Ranged => {
                    if a1 != a2 {
                        col1dom = false;
                        col2dom = false;
                    }
                }
                RowClass::Free => continue,
            }

            if col1dom {
                if let Some(val) = v1 {
                    let (minc, maxc) = contribution(val, lb1, ub1);
                    let minres = matrix.min_activity_without(r, minc);
                    let maxres = matrix.max_activity_without(r, maxc);
                    bounds1.update(class, lhs, rhs, val, minres, maxres);
                }
            }
            if col2dom {
                if let Some(val) = v2 {
                    let (minc, maxc) = contribution(val, lb2, ub2);
                    let minres = matrix.min_activity_without(r, minc);
                    let maxres = matrix.max_activity_without(r, maxc);
                    bounds2.update(class, lhs, rhs, val, minres, maxres);
                }
            }
        }

        (col1dom, col2dom, bounds1, bounds2)
    }

    /// Record the fixing implied by a dominance relation, if the safety
    /// checks allow one.
    #[allow(clippy::too_many_arguments)]
    fn record_fixing(
        &mut self,
        store: &dyn VarStore,
        varstofix: &mut [Option<FixingDirective>],
        dominating: usize,
        dominated: usize,
        domcol: usize,
        subcol: usize,
        bounds: &PredictedBounds,
        binary: bool,
    ) {
        if binary {
            let c11 = store.have_common_clique(dominating, true, dominated, true);
            let c10 = store.have_common_clique(dominating, true, dominated, false);
            let c00 = store.have_common_clique(dominating, false, dominated, false);
            if c11 && !c10 && !c00 {
                // Both at 1 is excluded; the dominated one goes to 0.
                if varstofix[subcol].is_none() {
                    varstofix[subcol] = Some(FixingDirective::AtLb);
                }
            } else if c00 && !c11 && !c10 {
                // Both at 0 is excluded; the dominating one goes to 1.
                if varstofix[domcol].is_none() {
                    varstofix[domcol] = Some(FixingDirective::AtUb);
                }
            } else {
                self.stats.ncliquepreventions += 1;
            }
            return;
        }

        // The dominating variable must be able to compensate for the fixing:
        // the predicted worst-case bound selected by its objective sign has to
        // stay within its domain, and the dominated variable needs a finite
        // lower bound to be fixed at.
        let obj = store.obj(dominating);
        let ub = store.ub(dominating);
        let lb_safe = bounds.worstlb.is_finite() && bounds.worstlb <= ub;
        let ub_safe = bounds.worstub.is_finite() && bounds.worstub <= ub;
        let safe = if obj > 0.0 {
            lb_safe
        } else if obj < 0.0 {
            ub_safe
        } else {
            lb_safe && ub_safe
        };
        if !safe || !store.lb(dominated).is_finite() {
            self.stats.nboundpreventions += 1;
            return;
        }
        if varstofix[subcol].is_none() {
            varstofix[subcol] = Some(FixingDirective::AtLb);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vars::ProblemVars;

    fn le_row() -> (Vec<f64>, Vec<f64>) {
        (vec![f64::NEG_INFINITY], vec![1.0])
    }

    #[test]
    fn test_equation_with_unequal_coefficients_blocks_dominance() {
        let mut vars = ProblemVars::new(2);
        for v in 0..2 {
            vars.set_bounds(v, 0.0, 1.0);
            vars.set_obj(v, 1.0);
        }
        let matrix = SparseMatrixView::build(
            1,
            2,
            &[(0, 0, 1.0), (0, 1, 2.0)],
            vec![1.0],
            vec![1.0],
            vec![0, 1],
            &vars,
        )
        .unwrap();

        let mut detector = DominanceDetector::new();
        let outcome = detector.presolve_round(&matrix, &mut vars);
        assert_eq!(outcome, PresolveOutcome::Unchanged);
        assert_eq!(detector.stats().ndomrelations, 0);
    }

    #[test]
    fn test_equal_coefficients_tie_resolves_to_first_column() {
        let mut vars = ProblemVars::new(2);
        for v in 0..2 {
            vars.set_bounds(v, 0.0, 1.0);
            vars.set_obj(v, 2.0);
        }
        let (lhs, rhs) = le_row();
        let matrix = SparseMatrixView::build(
            1,
            2,
            &[(0, 0, 1.0), (0, 1, 1.0)],
            lhs,
            rhs,
            vec![0, 1],
            &vars,
        )
        .unwrap();

        let detector = DominanceDetector::new();
        let varstofix = vec![None; 2];
        let (col1dom, col2dom, _, _) = detector.check_pair(&matrix, &vars, &varstofix, 0, 1);
        assert!(col1dom);
        assert!(col2dom);

        // The round picks the first direction; the <= row yields no lower
        // bound prediction, so the safety check blocks the fixing.
        let mut detector = DominanceDetector::new();
        let outcome = detector.presolve_round(&matrix, &mut vars);
        assert_eq!(outcome, PresolveOutcome::Unchanged);
        assert_eq!(detector.stats().ndomrelations, 1);
        assert_eq!(detector.stats().nboundpreventions, 1);
        assert_eq!(detector.stats().nfixedvars, 0);
    }

    #[test]
    fn test_covering_row_fixes_dominated_column() {
        // x0 + x1 >= 1 with both in [0, 2] and positive objective: x0
        // dominates x1 and can cover the row alone, so x1 is fixed at 0.
        let mut vars = ProblemVars::new(2);
        for v in 0..2 {
            vars.set_bounds(v, 0.0, 2.0);
            vars.set_obj(v, 1.0);
        }
        let matrix = SparseMatrixView::build(
            1,
            2,
            &[(0, 0, 1.0), (0, 1, 1.0)],
            vec![1.0],
            vec![f64::INFINITY],
            vec![0, 1],
            &vars,
        )
        .unwrap();

        let mut detector = DominanceDetector::new();
        let outcome = detector.presolve_round(&matrix, &mut vars);
        assert_eq!(outcome, PresolveOutcome::Reduced);
        assert_eq!(detector.stats().ndomrelations, 1);
        assert_eq!(detector.stats().nfixedvars, 1);
        assert_eq!(vars.lb(1), 0.0);
        assert_eq!(vars.ub(1), 0.0);
        assert!(!vars.is_fixed(0));
    }

    #[test]
    fn test_binary_one_one_clique_fixes_dominated_at_zero() {
        let mut vars = ProblemVars::new(2);
        for v in 0..2 {
            vars.set_class(v, crate::vars::VarClass::Binary);
            vars.set_obj(v, 0.0);
        }
        vars.add_clique(vec![(0, true), (1, true)]);
        let (lhs, rhs) = le_row();
        let matrix = SparseMatrixView::build(
            1,
            2,
            &[(0, 0, 1.0), (0, 1, 1.0)],
            lhs,
            rhs,
            vec![0, 1],
            &vars,
        )
        .unwrap();

        let mut detector = DominanceDetector::new();
        let outcome = detector.presolve_round(&matrix, &mut vars);
        assert_eq!(outcome, PresolveOutcome::Reduced);
        assert_eq!(detector.stats().nfixedvars, 1);
        assert_eq!(vars.ub(1), 0.0);
        assert!(!vars.is_fixed(0));
    }

    #[test]
    fn test_binary_zero_zero_clique_fixes_dominating_at_one() {
        let mut vars = ProblemVars::new(2);
        for v in 0..2 {
            vars.set_class(v, crate::vars::VarClass::Binary);
            vars.set_obj(v, 0.0);
        }
        vars.add_clique(vec![(0, false), (1, false)]);
        let (lhs, rhs) = le_row();
        let matrix = SparseMatrixView::build(
            1,
            2,
            &[(0, 0, 1.0), (0, 1, 1.0)],
            lhs,
            rhs,
            vec![0, 1],
            &vars,
        )
        .unwrap();

        let mut detector = DominanceDetector::new();
        let outcome = detector.presolve_round(&matrix, &mut vars);
        assert_eq!(outcome, PresolveOutcome::Reduced);
        assert_eq!(detector.stats().nfixedvars, 1);
        assert_eq!(vars.lb(0), 1.0);
    }

    #[test]
    fn test_binary_conflicting_cliques_prevent_fixing() {
        let mut vars = ProblemVars::new(2);
        for v in 0..2 {
            vars.set_class(v, crate::vars::VarClass::Binary);
        }
        vars.add_clique(vec![(0, true), (1, true)]);
        vars.add_clique(vec![(0, false), (1, false)]);
        let (lhs, rhs) = le_row();
        let matrix = SparseMatrixView::build(
            1,
            2,
            &[(0, 0, 1.0), (0, 1, 1.0)],
            lhs,
            rhs,
            vec![0, 1],
            &vars,
        )
        .unwrap();

        let mut detector = DominanceDetector::new();
        let outcome = detector.presolve_round(&matrix, &mut vars);
        assert_eq!(outcome, PresolveOutcome::Unchanged);
        assert_eq!(detector.stats().ncliquepreventions, 1);
        assert_eq!(detector.stats().nfixedvars, 0);
    }

    #[test]
    fn test_mixed_classes_never_compared() {
        // One continuous, one integer column sharing a row: different
        // buckets, so no pair is formed.
        let mut vars = ProblemVars::new(2);
        vars.set_bounds(0, 0.0, 1.0);
        vars.set_bounds(1, 0.0, 1.0);
        vars.set_class(1, crate::vars::VarClass::Integer);
        let (lhs, rhs) = le_row();
        let matrix = SparseMatrixView::build(
            1,
            2,
            &[(0, 0, 1.0), (0, 1, 1.0)],
            lhs,
            rhs,
            vec![0, 1],
            &vars,
        )
        .unwrap();

        let mut detector = DominanceDetector::new();
        let outcome = detector.presolve_round(&matrix, &mut vars);
        assert_eq!(outcome, PresolveOutcome::Unchanged);
        assert_eq!(detector.stats().ndomrelations, 0);
    }

    #[test]
    fn test_row_only_in_one_column_respects_sign_rules() {
        // x0 appears alone in a <= row with a positive coefficient: x0 can
        // only dominate if its coefficient helps, which it does not, while
        // the absent x1 still dominates x0.
        let mut vars = ProblemVars::new(2);
        for v in 0..2 {
            vars.set_bounds(v, 0.0, 1.0);
            vars.set_obj(v, 1.0);
        }
        // Shared >= row plus a private <= row on x0.
        let matrix = SparseMatrixView::build(
            2,
            2,
            &[(0, 0, 1.0), (0, 1, 1.0), (1, 0, 1.0)],
            vec![1.0, f64::NEG_INFINITY],
            vec![f64::INFINITY, 1.0],
            vec![0, 1],
            &vars,
        )
        .unwrap();

        let detector = DominanceDetector::new();
        let varstofix = vec![None; 2];
        let (col1dom, col2dom, _, _) = detector.check_pair(&matrix, &vars, &varstofix, 0, 1);
        assert!(!col1dom);
        assert!(col2dom);
    }

    #[test]
    fn test_infeasible_fixing_reports_cutoff() {
        // The dominated variable's lower bound lies outside its domain once
        // the store is perturbed behind the detector's back.
        struct Hostile(ProblemVars);
        impl VarStore for Hostile {
            fn lb(&self, var: usize) -> f64 {
                self.0.lb(var)
            }
            fn ub(&self, var: usize) -> f64 {
                self.0.ub(var)
            }
            fn obj(&self, var: usize) -> f64 {
                self.0.obj(var)
            }
            fn class(&self, var: usize) -> crate::vars::VarClass {
                self.0.class(var)
            }
            fn n_locks_down(&self, var: usize) -> usize {
                self.0.n_locks_down(var)
            }
            fn n_locks_up(&self, var: usize) -> usize {
                self.0.n_locks_up(var)
            }
            fn have_common_clique(
                &self,
                var1: usize,
                val1: bool,
                var2: usize,
                val2: bool,
            ) -> bool {
                self.0.have_common_clique(var1, val1, var2, val2)
            }
            fn pseudocost_score(&self, var: usize) -> f64 {
                self.0.pseudocost_score(var)
            }
            fn fix(&mut self, _var: usize, _value: f64) -> (bool, bool) {
                (true, false)
            }
        }

        let mut inner = ProblemVars::new(2);
        for v in 0..2 {
            inner.set_bounds(v, 0.0, 2.0);
            inner.set_obj(v, 1.0);
        }
        let matrix = SparseMatrixView::build(
            1,
            2,
            &[(0, 0, 1.0), (0, 1, 1.0)],
            vec![1.0],
            vec![f64::INFINITY],
            vec![0, 1],
            &inner,
        )
        .unwrap();

        let mut store = Hostile(inner);
        let mut detector = DominanceDetector::new();
        let outcome = detector.presolve_round(&matrix, &mut store);
        assert_eq!(outcome, PresolveOutcome::Cutoff);
        assert_eq!(detector.stats().nfixedvars, 0);
    }
}
