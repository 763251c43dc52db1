//! LP columns.

use super::row::RowId;

/// Identifier of a column in the model's column arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ColId(pub usize);

/// The LP-facing entity of one decision variable.
///
/// A column belongs to exactly one variable (`var` is the handle into the
/// external store) and lists the rows it appears in. Solution caches are
/// stamped with the model's solve generation so stale values are never read.
#[derive(Debug, Clone)]
pub struct Column {
    /// Owning variable handle (1:1).
    pub var: usize,

    /// Sparse (row, coefficient) back-references, sorted on demand.
    pub(crate) rows: Vec<(RowId, f64)>,
    pub(crate) sorted: bool,

    /// Objective coefficient.
    pub obj: f64,

    /// Lower bound.
    pub lb: f64,

    /// Upper bound.
    pub ub: f64,

    /// Primal value from the last solve.
    pub(crate) primsol: f64,

    /// Reduced cost from the last solve.
    pub(crate) redcost: f64,

    /// Position in the current LP, if any.
    pub(crate) lppos: Option<usize>,

    /// Position in the oracle, if loaded.
    pub(crate) lpipos: Option<usize>,

    /// Consecutive solves with a primal value of exactly zero.
    pub(crate) age: u32,

    /// Column may be aged out of the LP.
    pub removable: bool,

    /// Column has pending obj/bound changes not yet flushed to the oracle.
    pub(crate) changed: bool,
}

impl Column {
    /// Create a column for variable `var`.
    pub fn new(var: usize, obj: f64, lb: f64, ub: f64) -> Self {
        Self {
            var,
            rows: Vec::new(),
            sorted: true,
            obj,
            lb,
            ub,
            primsol: 0.0,
            redcost: 0.0,
            lppos: None,
            lpipos: None,
            age: 0,
            removable: false,
            changed: false,
        }
    }

    /// Rows this column appears in.
    pub fn rows(&self) -> &[(RowId, f64)] {
        &self.rows
    }

    /// Number of row entries.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the column appears in no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Position in the current LP, if any.
    pub fn lppos(&self) -> Option<usize> {
        self.lppos
    }

    /// Age: consecutive solves with a primal value of exactly zero.
    pub fn age(&self) -> u32 {
        self.age
    }

    pub(crate) fn link_row(&mut self, row: RowId, val: f64) {
        self.rows.push((row, val));
        self.sorted = false;
    }

    pub(crate) fn unlink_row(&mut self, row: RowId) {
        self.rows.retain(|&(r, _)| r != row);
    }

    pub(crate) fn sort_rows(&mut self) {
        if !self.sorted {
            self.rows.sort_by_key(|&(r, _)| r.0);
            self.sorted = true;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_link_unlink() {
        let mut col = Column::new(0, 1.0, 0.0, 1.0);
        col.link_row(RowId(3), 2.0);
        col.link_row(RowId(1), -1.0);
        assert_eq!(col.len(), 2);

        col.sort_rows();
        assert_eq!(col.rows()[0].0, RowId(1));

        col.unlink_row(RowId(3));
        assert_eq!(col.rows(), &[(RowId(1), -1.0)]);
    }
}
