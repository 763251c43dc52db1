//! Read-only dual-major view of the constraint matrix with precomputed
//! activity bounds.
//!
//! Built once per presolve call and discarded at the end of it. Construction
//! goes through `sprs` (duplicate merging, ordering); access is plain
//! compressed arrays in both column-major and row-major layout over the same
//! coefficient data.

use sprs::{CsMat, TriMat};

use crate::error::{CoreError, CoreResult};
use crate::vars::VarStore;

/// Shape of a row's sides.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum RowClass {
    /// `a^T x <= rhs`.
    Le,

    /// `a^T x >= lhs`.
    Ge,

    /// `a^T x == lhs == rhs`.
    Equation,

    /// Both sides finite and distinct.
    Ranged,

    /// Both sides infinite; never binds.
    Free,
}

pub(crate) fn classify(lhs: f64, rhs: f64) -> RowClass {
    match (lhs.is_finite(), rhs.is_finite()) {
        (true, true) if lhs == rhs => RowClass::Equation,
        (true, true) => RowClass::Ranged,
        (false, true) => RowClass::Le,
        (true, false) => RowClass::Ge,
        (false, false) => RowClass::Free,
    }
}

/// Column- and row-major compressed view of one coefficient matrix, with
/// per-row activity bounds and infinite-contribution counts.
pub struct SparseMatrixView {
    nrows: usize,
    ncols: usize,

    colbeg: Vec<usize>,
    colind: Vec<usize>,
    colval: Vec<f64>,

    rowbeg: Vec<usize>,
    rowind: Vec<usize>,
    rowval: Vec<f64>,

    lhs: Vec<f64>,
    rhs: Vec<f64>,

    /// Column to variable handle.
    vars: Vec<usize>,

    /// Finite part of the minimal/maximal row activity.
    minact: Vec<f64>,
    maxact: Vec<f64>,

    /// Number of `-inf` contributions to the minimal activity.
    minact_ninf: Vec<usize>,

    /// Number of `+inf` contributions to the maximal activity.
    maxact_ninf: Vec<usize>,
}

impl SparseMatrixView {
    /// Build the view from triplets. Explicit zeros are dropped, duplicates
    /// merged; row sides must satisfy `lhs <= rhs`.
    pub fn build(
        nrows: usize,
        ncols: usize,
        entries: &[(usize, usize, f64)],
        lhs: Vec<f64>,
        rhs: Vec<f64>,
        vars: Vec<usize>,
        store: &dyn VarStore,
    ) -> CoreResult<Self> {
        if lhs.len() != nrows || rhs.len() != nrows {
            return Err(CoreError::InvalidData(format!(
                "side vectors sized {}/{} for {} rows",
                lhs.len(),
                rhs.len(),
                nrows
            )));
        }
        if vars.len() != ncols {
            return Err(CoreError::InvalidData(format!(
                "variable vector sized {} for {} columns",
                vars.len(),
                ncols
            )));
        }
        for r in 0..nrows {
            if lhs[r] > rhs[r] {
                return Err(CoreError::InvalidData(format!(
                    "row {} sides inverted: lhs {} > rhs {}",
                    r, lhs[r], rhs[r]
                )));
            }
        }

        let mut tri = TriMat::new((nrows, ncols));
        for &(r, c, v) in entries {
            if r >= nrows || c >= ncols {
                return Err(CoreError::InvalidData(format!(
                    "entry ({r}, {c}) outside {nrows}x{ncols} matrix"
                )));
            }
            if v != 0.0 {
                tri.add_triplet(r, c, v);
            }
        }
        let colmat: CsMat<f64> = tri.to_csc();
        let rowmat = colmat.to_csr();

        let mut colbeg = Vec::with_capacity(ncols + 1);
        let mut colind = Vec::new();
        let mut colval = Vec::new();
        colbeg.push(0);
        for col_view in colmat.outer_iterator() {
            for (row, &val) in col_view.iter() {
                colind.push(row);
                colval.push(val);
            }
            colbeg.push(colind.len());
        }

        let mut rowbeg = Vec::with_capacity(nrows + 1);
        let mut rowind = Vec::new();
        let mut rowval = Vec::new();
        rowbeg.push(0);
        for row_view in rowmat.outer_iterator() {
            for (col, &val) in row_view.iter() {
                rowind.push(col);
                rowval.push(val);
            }
            rowbeg.push(rowind.len());
        }

        let mut view = Self {
            nrows,
            ncols,
            colbeg,
            colind,
            colval,
            rowbeg,
            rowind,
            rowval,
            lhs,
            rhs,
            vars,
            minact: vec![0.0; nrows],
            maxact: vec![0.0; nrows],
            minact_ninf: vec![0; nrows],
            maxact_ninf: vec![0; nrows],
        };
        view.calc_activities(store);
        Ok(view)
    }

    fn calc_activities(&mut self, store: &dyn VarStore) {
        for c in 0..self.ncols {
            let lb = store.lb(self.vars[c]);
            let ub = store.ub(self.vars[c]);
            for k in self.colbeg[c]..self.colbeg[c + 1] {
                let r = self.colind[k];
                let val = self.colval[k];
                let (mincontrib, maxcontrib) = contribution(val, lb, ub);
                if mincontrib == f64::NEG_INFINITY {
                    self.minact_ninf[r] += 1;
                } else {
                    self.minact[r] += mincontrib;
                }
                if maxcontrib == f64::INFINITY {
                    self.maxact_ninf[r] += 1;
                } else {
                    self.maxact[r] += maxcontrib;
                }
            }
        }
    }

    /// Number of rows.
    pub fn nrows(&self) -> usize {
        self.nrows
    }

    /// Number of columns.
    pub fn ncols(&self) -> usize {
        self.ncols
    }

    /// Sorted (rows, values) of one column.
    pub fn col(&self, c: usize) -> (&[usize], &[f64]) {
        let range = self.colbeg[c]..self.colbeg[c + 1];
        (&self.colind[range.clone()], &self.colval[range])
    }

    /// Sorted column indices of one row.
    pub fn row_cols(&self, r: usize) -> &[usize] {
        &self.rowind[self.rowbeg[r]..self.rowbeg[r + 1]]
    }

    /// Sorted (columns, values) of one row.
    pub fn row(&self, r: usize) -> (&[usize], &[f64]) {
        let range = self.rowbeg[r]..self.rowbeg[r + 1];
        (&self.rowind[range.clone()], &self.rowval[range])
    }

    /// Nonzeros in one row.
    pub fn row_nnz(&self, r: usize) -> usize {
        self.rowbeg[r + 1] - self.rowbeg[r]
    }

    /// Left-hand side of one row.
    pub fn lhs(&self, r: usize) -> f64 {
        self.lhs[r]
    }

    /// Right-hand side of one row.
    pub fn rhs(&self, r: usize) -> f64 {
        self.rhs[r]
    }

    /// Variable handle of one column.
    pub fn var(&self, c: usize) -> usize {
        self.vars[c]
    }

    /// Minimal activity of one row.
    pub fn min_activity(&self, r: usize) -> f64 {
        if self.minact_ninf[r] > 0 {
            f64::NEG_INFINITY
        } else {
            self.minact[r]
        }
    }

    /// Maximal activity of one row.
    pub fn max_activity(&self, r: usize) -> f64 {
        if self.maxact_ninf[r] > 0 {
            f64::INFINITY
        } else {
            self.maxact[r]
        }
    }

    /// Minimal activity of row `r` with one column's contribution removed.
    /// `contrib` is that column's minimal contribution (possibly `-inf`).
    pub fn min_activity_without(&self, r: usize, contrib: f64) -> f64 {
        if contrib == f64::NEG_INFINITY {
            if self.minact_ninf[r] > 1 {
                f64::NEG_INFINITY
            } else {
                self.minact[r]
            }
        } else if self.minact_ninf[r] > 0 {
            f64::NEG_INFINITY
        } else {
            self.minact[r] - contrib
        }
    }

    /// Maximal activity of row `r` with one column's contribution removed.
    /// `contrib` is that column's maximal contribution (possibly `+inf`).
    pub fn max_activity_without(&self, r: usize, contrib: f64) -> f64 {
        if contrib == f64::INFINITY {
            if self.maxact_ninf[r] > 1 {
                f64::INFINITY
            } else {
                self.maxact[r]
            }
        } else if self.maxact_ninf[r] > 0 {
            f64::INFINITY
        } else {
            self.maxact[r] - contrib
        }
    }
}

/// Min/max contribution of one coefficient given the variable's bounds.
pub(crate) fn contribution(val: f64, lb: f64, ub: f64) -> (f64, f64) {
    if val > 0.0 {
        (val * lb, val * ub)
    } else {
        (val * ub, val * lb)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vars::ProblemVars;

    #[test]
    fn test_dual_major_views_agree() {
        let mut vars = ProblemVars::new(3);
        for v in 0..3 {
            vars.set_bounds(v, 0.0, 1.0);
        }
        // Includes an explicit zero that must be dropped.
        let entries = [
            (0, 0, 1.0),
            (0, 2, 2.0),
            (1, 1, -1.0),
            (1, 2, 0.0),
        ];
        let view = SparseMatrixView::build(
            2,
            3,
            &entries,
            vec![f64::NEG_INFINITY; 2],
            vec![4.0, 4.0],
            vec![0, 1, 2],
            &vars,
        )
        .unwrap();

        assert_eq!(view.row_cols(0), &[0, 2]);
        assert_eq!(view.row_cols(1), &[1]);
        assert_eq!(view.row_nnz(1), 1);

        let (rows, vals) = view.col(2);
        assert_eq!(rows, &[0]);
        assert_eq!(vals, &[2.0]);
    }

    #[test]
    fn test_activity_bounds() {
        let mut vars = ProblemVars::new(2);
        vars.set_bounds(0, 0.0, 2.0);
        vars.set_bounds(1, -1.0, 1.0);
        // Row 0: x0 - x1; min = 0*1 - 1 = -1, max = 2 + 1 = 3.
        let view = SparseMatrixView::build(
            1,
            2,
            &[(0, 0, 1.0), (0, 1, -1.0)],
            vec![f64::NEG_INFINITY],
            vec![5.0],
            vec![0, 1],
            &vars,
        )
        .unwrap();

        assert_eq!(view.min_activity(0), -1.0);
        assert_eq!(view.max_activity(0), 3.0);
    }

    #[test]
    fn test_infinite_contributions_counted() {
        let mut vars = ProblemVars::new(2);
        vars.set_bounds(0, 0.0, f64::INFINITY);
        vars.set_bounds(1, 0.0, 1.0);
        let view = SparseMatrixView::build(
            1,
            2,
            &[(0, 0, 1.0), (0, 1, 1.0)],
            vec![f64::NEG_INFINITY],
            vec![5.0],
            vec![0, 1],
            &vars,
        )
        .unwrap();

        assert_eq!(view.min_activity(0), 0.0);
        assert_eq!(view.max_activity(0), f64::INFINITY);

        // Removing the unbounded column's contribution makes the maximal
        // activity finite again.
        assert_eq!(view.max_activity_without(0, f64::INFINITY), 1.0);
        // Removing the bounded one does not.
        assert_eq!(view.max_activity_without(0, 1.0), f64::INFINITY);
    }

    #[test]
    fn test_inverted_sides_rejected() {
        let vars = ProblemVars::new(1);
        let result = SparseMatrixView::build(
            1,
            1,
            &[(0, 0, 1.0)],
            vec![2.0],
            vec![1.0],
            vec![0],
            &vars,
        );
        assert!(result.is_err());
    }
}
