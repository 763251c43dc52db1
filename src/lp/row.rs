//! LP rows and the reference-counted row pool.

use crate::error::{CoreError, CoreResult};

/// Identifier of a row in a [`RowPool`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RowId(pub usize);

/// A linear inequality `lhs <= a^T x + constant <= rhs`.
///
/// Coefficients are kept sorted by column index with duplicates merged on
/// insert; zero coefficients are dropped. Norm and extreme-coefficient caches
/// are refreshed on every structural change so read access stays `&self`.
#[derive(Debug, Clone)]
pub struct Row {
    /// Optional name for debugging.
    pub name: Option<String>,

    /// Sparse (column, coefficient) entries, sorted by column.
    cols: Vec<(usize, f64)>,

    /// Constant shift added to the activity.
    pub constant: f64,

    lhs: f64,
    rhs: f64,

    /// Cached squared Euclidean norm of the coefficients.
    sqrnorm: f64,

    /// Cached maximum absolute coefficient.
    maxabs: f64,

    /// Cached minimum absolute coefficient (infinity for an empty row).
    minabs: f64,

    /// Dual value from the last solve.
    pub dual: f64,

    /// Activity from the last solve; valid while `activity_valid` matches the
    /// model's solve generation.
    pub(crate) activity: f64,
    pub(crate) activity_valid: u64,

    /// Reference count; the pool frees the row exactly when it reaches zero.
    pub(crate) nuses: usize,

    /// Structural lock count; sides and coefficients are sealed while > 0.
    nlocks: usize,

    /// Row is only valid in the current subtree.
    pub local: bool,

    /// Row may gain coefficients later (e.g. model constraints).
    pub modifiable: bool,

    /// Row may be aged out of the LP.
    pub removable: bool,

    /// Consecutive solves where the row was slack.
    pub(crate) age: u32,

    /// Position in the current LP, if any.
    pub(crate) lppos: Option<usize>,

    /// Position in the oracle, if loaded.
    pub(crate) lpipos: Option<usize>,

    /// Row has pending side changes not yet flushed to the oracle.
    pub(crate) changed: bool,
}

impl Row {
    /// Create a row from unsorted entries.
    ///
    /// Duplicate columns are merged, zero coefficients dropped. Fails if
    /// `lhs > rhs`.
    pub fn new(
        name: Option<String>,
        entries: &[(usize, f64)],
        constant: f64,
        lhs: f64,
        rhs: f64,
    ) -> CoreResult<Self> {
        if lhs > rhs {
            return Err(CoreError::InvalidData(format!(
                "row sides inverted: lhs {lhs} > rhs {rhs}"
            )));
        }

        let mut cols: Vec<(usize, f64)> = Vec::with_capacity(entries.len());
        for &(col, val) in entries {
            cols.push((col, val));
        }
        cols.sort_by_key(|&(col, _)| col);

        // Merge duplicates in place.
        let mut merged: Vec<(usize, f64)> = Vec::with_capacity(cols.len());
        for (col, val) in cols {
            match merged.last_mut() {
                Some((lastcol, lastval)) if *lastcol == col => *lastval += val,
                _ => merged.push((col, val)),
            }
        }
        merged.retain(|&(_, val)| val != 0.0);

        let mut row = Self {
            name,
            cols: merged,
            constant,
            lhs,
            rhs,
            sqrnorm: 0.0,
            maxabs: 0.0,
            minabs: f64::INFINITY,
            dual: 0.0,
            activity: 0.0,
            activity_valid: 0,
            nuses: 0,
            nlocks: 0,
            local: false,
            modifiable: false,
            removable: false,
            age: 0,
            lppos: None,
            lpipos: None,
            changed: false,
        };
        row.recalc_norms();
        Ok(row)
    }

    fn recalc_norms(&mut self) {
        self.sqrnorm = 0.0;
        self.maxabs = 0.0;
        self.minabs = f64::INFINITY;
        for &(_, val) in &self.cols {
            self.sqrnorm += val * val;
            self.maxabs = self.maxabs.max(val.abs());
            self.minabs = self.minabs.min(val.abs());
        }
    }

    /// Sorted sparse entries.
    pub fn entries(&self) -> &[(usize, f64)] {
        &self.cols
    }

    /// Number of nonzeros.
    pub fn len(&self) -> usize {
        self.cols.len()
    }

    /// Whether the row has no nonzeros.
    pub fn is_empty(&self) -> bool {
        self.cols.is_empty()
    }

    /// Left-hand side.
    pub fn lhs(&self) -> f64 {
        self.lhs
    }

    /// Right-hand side.
    pub fn rhs(&self) -> f64 {
        self.rhs
    }

    /// Add `val` to the coefficient of `col`, merging and keeping order.
    ///
    /// Fails while the row is locked.
    pub fn add_coef(&mut self, col: usize, val: f64) -> CoreResult<()> {
        if self.nlocks > 0 {
            return Err(CoreError::InvalidData(
                "cannot modify coefficients of a locked row".into(),
            ));
        }
        match self.cols.binary_search_by_key(&col, |&(c, _)| c) {
            Ok(pos) => {
                self.cols[pos].1 += val;
                if self.cols[pos].1 == 0.0 {
                    self.cols.remove(pos);
                }
            }
            Err(pos) => {
                if val != 0.0 {
                    self.cols.insert(pos, (col, val));
                }
            }
        }
        self.recalc_norms();
        Ok(())
    }

    /// Change the sides. Fails while locked or if `lhs > rhs`.
    pub fn set_sides(&mut self, lhs: f64, rhs: f64) -> CoreResult<()> {
        if self.nlocks > 0 {
            return Err(CoreError::InvalidData(
                "cannot modify sides of a locked row".into(),
            ));
        }
        if lhs > rhs {
            return Err(CoreError::InvalidData(format!(
                "row sides inverted: lhs {lhs} > rhs {rhs}"
            )));
        }
        self.lhs = lhs;
        self.rhs = rhs;
        Ok(())
    }

    /// Seal the row against structural modification.
    pub fn lock(&mut self) {
        self.nlocks += 1;
    }

    /// Release one structural lock.
    pub fn unlock(&mut self) -> CoreResult<()> {
        if self.nlocks == 0 {
            return Err(CoreError::InvalidData("row lock underflow".into()));
        }
        self.nlocks -= 1;
        Ok(())
    }

    /// Current lock count.
    pub fn nlocks(&self) -> usize {
        self.nlocks
    }

    /// Current reference count.
    pub fn nuses(&self) -> usize {
        self.nuses
    }

    /// Squared Euclidean norm of the coefficients.
    pub fn sqrnorm(&self) -> f64 {
        self.sqrnorm
    }

    /// Euclidean norm of the coefficients.
    pub fn norm(&self) -> f64 {
        self.sqrnorm.sqrt()
    }

    /// Maximum absolute coefficient.
    pub fn max_abs_coef(&self) -> f64 {
        self.maxabs
    }

    /// Minimum absolute coefficient (infinity for an empty row).
    pub fn min_abs_coef(&self) -> f64 {
        self.minabs
    }

    /// Nonzero density relative to `ncols` LP columns.
    pub fn density(&self, ncols: usize) -> f64 {
        if ncols == 0 {
            return 0.0;
        }
        self.cols.len() as f64 / ncols as f64
    }

    /// Position in the current LP, if any.
    pub fn lppos(&self) -> Option<usize> {
        self.lppos
    }

    /// Age: consecutive solves where the row was slack.
    pub fn age(&self) -> u32 {
        self.age
    }

    /// Activity `a^T x + constant` at `point` (indexed by column id).
    pub fn activity_at(&self, point: &[f64]) -> f64 {
        let mut act = self.constant;
        for &(col, val) in &self.cols {
            act += val * point[col];
        }
        act
    }

    /// Feasibility at `point`: `min(activity - lhs, rhs - activity)`.
    ///
    /// Negative iff the row is violated; infinite sides never bind.
    pub fn feasibility_at(&self, point: &[f64]) -> f64 {
        let act = self.activity_at(point);
        let lhsdist = if self.lhs.is_finite() {
            act - self.lhs
        } else {
            f64::INFINITY
        };
        let rhsdist = if self.rhs.is_finite() {
            self.rhs - act
        } else {
            f64::INFINITY
        };
        lhsdist.min(rhsdist)
    }

    /// Efficacy at `point`: violation divided by the coefficient norm.
    /// Zero when the row is not violated.
    pub fn efficacy_at(&self, point: &[f64], eps: f64) -> f64 {
        let feas = self.feasibility_at(point);
        if feas >= -eps {
            return 0.0;
        }
        let norm = self.norm();
        if norm <= 0.0 {
            return 0.0;
        }
        -feas / norm
    }

    /// Dot product with another row's coefficients (merge walk over the
    /// sorted supports).
    pub fn scalar_product(&self, other: &Row) -> f64 {
        let mut dot = 0.0;
        let (a, b) = (&self.cols, &other.cols);
        let (mut i, mut j) = (0, 0);
        while i < a.len() && j < b.len() {
            if a[i].0 < b[j].0 {
                i += 1;
            } else if b[j].0 < a[i].0 {
                j += 1;
            } else {
                dot += a[i].1 * b[j].1;
                i += 1;
                j += 1;
            }
        }
        dot
    }

    /// Cosine similarity with another row, in [0, 1].
    pub fn parallelism(&self, other: &Row) -> f64 {
        let denom = (self.sqrnorm * other.sqrnorm).sqrt();
        if denom <= 0.0 {
            return 0.0;
        }
        (self.scalar_product(other).abs() / denom).min(1.0)
    }

    /// Cosine similarity with a dense objective vector, in [0, 1].
    pub fn obj_parallelism(&self, obj: &[f64], objnorm: f64) -> f64 {
        let norm = self.norm();
        if norm <= 0.0 || objnorm <= 0.0 {
            return 0.0;
        }
        let mut dot = 0.0;
        for &(col, val) in &self.cols {
            dot += val * obj[col];
        }
        (dot.abs() / (norm * objnorm)).min(1.0)
    }
}

enum Slot {
    Occupied(Row),
    Vacant,
}

/// Arena of reference-counted rows.
///
/// Rows are created with one reference, captured by every additional owner
/// (the LP, cut storage) and released when an owner lets go; the slot is freed
/// exactly when the count reaches zero and recycled through a free list.
#[derive(Default)]
pub struct RowPool {
    slots: Vec<Slot>,
    free: Vec<usize>,
    nrows: usize,
}

impl RowPool {
    /// Create an empty pool.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live rows.
    pub fn len(&self) -> usize {
        self.nrows
    }

    /// Whether the pool holds no live rows.
    pub fn is_empty(&self) -> bool {
        self.nrows == 0
    }

    /// Insert a row with a reference count of one.
    pub fn create(&mut self, mut row: Row) -> RowId {
        row.nuses = 1;
        let id = match self.free.pop() {
            Some(idx) => {
                self.slots[idx] = Slot::Occupied(row);
                idx
            }
            None => {
                self.slots.push(Slot::Occupied(row));
                self.slots.len() - 1
            }
        };
        self.nrows += 1;
        RowId(id)
    }

    /// Access a live row. Panics on a released id (a caller bug).
    pub fn get(&self, id: RowId) -> &Row {
        match &self.slots[id.0] {
            Slot::Occupied(row) => row,
            Slot::Vacant => panic!("row {} accessed after release", id.0),
        }
    }

    /// Mutable access to a live row. Panics on a released id (a caller bug).
    pub fn get_mut(&mut self, id: RowId) -> &mut Row {
        match &mut self.slots[id.0] {
            Slot::Occupied(row) => row,
            Slot::Vacant => panic!("row {} accessed after release", id.0),
        }
    }

    /// Whether `id` refers to a live row.
    pub fn contains(&self, id: RowId) -> bool {
        matches!(self.slots.get(id.0), Some(Slot::Occupied(_)))
    }

    /// Increment the reference count of a live row.
    pub fn capture(&mut self, id: RowId) {
        self.get_mut(id).nuses += 1;
    }

    /// Decrement the reference count; frees and returns the row at zero.
    pub fn release(&mut self, id: RowId) -> Option<Row> {
        let row = self.get_mut(id);
        debug_assert!(row.nuses > 0, "row {} released below zero", id.0);
        row.nuses -= 1;
        if row.nuses > 0 {
            return None;
        }
        let slot = std::mem::replace(&mut self.slots[id.0], Slot::Vacant);
        self.free.push(id.0);
        self.nrows -= 1;
        match slot {
            Slot::Occupied(row) => Some(row),
            Slot::Vacant => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(entries: &[(usize, f64)], lhs: f64, rhs: f64) -> Row {
        Row::new(None, entries, 0.0, lhs, rhs).unwrap()
    }

    #[test]
    fn test_merge_and_sort_on_create() {
        let r = row(&[(3, 1.0), (1, 2.0), (3, -1.0), (0, 4.0)], 0.0, 1.0);
        // Column 3 merged to zero and dropped; rest sorted.
        assert_eq!(r.entries(), &[(0, 4.0), (1, 2.0)]);
        assert!((r.sqrnorm() - 20.0).abs() < 1e-12);
        assert_eq!(r.max_abs_coef(), 4.0);
        assert_eq!(r.min_abs_coef(), 2.0);
    }

    #[test]
    fn test_inverted_sides_rejected() {
        assert!(Row::new(None, &[(0, 1.0)], 0.0, 2.0, 1.0).is_err());
    }

    #[test]
    fn test_locked_row_sealed() {
        let mut r = row(&[(0, 1.0)], 0.0, 1.0);
        r.lock();
        assert!(r.add_coef(1, 1.0).is_err());
        assert!(r.set_sides(0.0, 2.0).is_err());
        r.unlock().unwrap();
        assert!(r.add_coef(1, 1.0).is_ok());
    }

    #[test]
    fn test_feasibility_and_efficacy() {
        // x0 + x1 <= 1
        let r = row(&[(0, 1.0), (1, 1.0)], f64::NEG_INFINITY, 1.0);

        assert!((r.feasibility_at(&[0.4, 0.4]) - 0.2).abs() < 1e-12);
        assert_eq!(r.efficacy_at(&[0.4, 0.4], 1e-9), 0.0);

        let feas = r.feasibility_at(&[0.8, 0.8]);
        assert!((feas + 0.6).abs() < 1e-12);
        let eff = r.efficacy_at(&[0.8, 0.8], 1e-9);
        assert!((eff - 0.6 / 2.0_f64.sqrt()).abs() < 1e-12);
    }

    #[test]
    fn test_parallelism() {
        let a = row(&[(0, 1.0), (1, 1.0)], f64::NEG_INFINITY, 1.0);
        let b = row(&[(0, 2.0), (1, 2.0)], f64::NEG_INFINITY, 4.0);
        let c = row(&[(0, 1.0), (1, -1.0)], f64::NEG_INFINITY, 0.0);

        assert!((a.parallelism(&b) - 1.0).abs() < 1e-12);
        assert!(a.parallelism(&c).abs() < 1e-12);
    }

    #[test]
    fn test_pool_capture_release() {
        let mut pool = RowPool::new();
        let id = pool.create(row(&[(0, 1.0)], 0.0, 1.0));
        assert_eq!(pool.get(id).nuses(), 1);

        pool.capture(id);
        assert_eq!(pool.get(id).nuses(), 2);

        assert!(pool.release(id).is_none());
        assert!(pool.contains(id));

        let freed = pool.release(id);
        assert!(freed.is_some());
        assert!(!pool.contains(id));
        assert_eq!(pool.len(), 0);

        // Slot is recycled.
        let id2 = pool.create(row(&[(1, 1.0)], 0.0, 1.0));
        assert_eq!(id2.0, id.0);
    }
}
