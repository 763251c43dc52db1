//! Incremental LP model synchronized against the external simplex oracle.
//!
//! The model owns two logical views: the ordered "current LP" arrays of
//! columns and rows (what branch-and-bound believes the model is) and the
//! oracle-loaded prefix (what has actually been pushed). `lpifirstchgcol` /
//! `lpifirstchgrow` mark the first index where the two views may diverge;
//! everything before is known synchronized. [`LpModel::flush`] reconciles the
//! views by deleting from the first changed index and re-adding the tail, then
//! replaying pending bound/objective/side changes.

use crate::error::{CoreError, CoreResult};
use crate::settings::LpSettings;

use super::column::{ColId, Column};
use super::oracle::{LpOracle, LpSolStat, OracleCol, OracleRow, SimplexKind};
use super::row::{Row, RowId, RowPool};

/// Counters for LP management.
#[derive(Debug, Default, Clone)]
pub struct LpStats {
    /// Total solves.
    pub nsolves: u64,

    /// Solves run with the primal simplex.
    pub nprimalsolves: u64,

    /// Solves run with the dual simplex.
    pub ndualsolves: u64,

    /// Columns evicted by aging.
    pub ncolsremoved: u64,

    /// Rows evicted by aging.
    pub nrowsremoved: u64,
}

/// A weighted aggregation of rows, coefficients indexed by column id.
#[derive(Debug, Clone)]
pub struct SummedRow {
    /// Dense coefficients, one per column in the arena.
    pub vals: Vec<f64>,

    /// Aggregated left-hand side.
    pub lhs: f64,

    /// Aggregated right-hand side.
    pub rhs: f64,
}

/// The LP relaxation manager.
pub struct LpModel<O: LpOracle> {
    oracle: O,
    settings: LpSettings,

    pool: RowPool,

    /// Column arena, append-only; one entry per variable that ever had a column.
    cols: Vec<Column>,

    /// Current-LP column ordering.
    lpcols: Vec<ColId>,

    /// Current-LP row ordering.
    lprows: Vec<RowId>,

    /// Number of columns/rows loaded into the oracle.
    nlpicols: usize,
    nlpirows: usize,

    /// First index where current LP and oracle may diverge.
    lpifirstchgcol: usize,
    lpifirstchgrow: usize,

    /// Columns/rows with pending attribute changes.
    chgcols: Vec<ColId>,
    chgrows: Vec<RowId>,

    flushed: bool,

    solstat: LpSolStat,
    objval: f64,

    /// Solve generation; solution caches are valid while their stamp matches.
    lpcount: u64,
    validsollp: u64,

    primalfeasible: bool,
    dualfeasible: bool,

    diving: bool,
    divestate: Vec<(f64, f64, f64)>,

    marked_ncols: usize,
    marked_nrows: usize,

    stats: LpStats,
}

impl<O: LpOracle> LpModel<O> {
    /// Create an empty model around an oracle.
    pub fn new(oracle: O, settings: LpSettings) -> CoreResult<Self> {
        settings.validate()?;
        Ok(Self {
            oracle,
            settings,
            pool: RowPool::new(),
            cols: Vec::new(),
            lpcols: Vec::new(),
            lprows: Vec::new(),
            nlpicols: 0,
            nlpirows: 0,
            lpifirstchgcol: 0,
            lpifirstchgrow: 0,
            chgcols: Vec::new(),
            chgrows: Vec::new(),
            flushed: true,
            solstat: LpSolStat::NotSolved,
            objval: 0.0,
            lpcount: 0,
            validsollp: 0,
            primalfeasible: true,
            dualfeasible: false,
            diving: false,
            divestate: Vec::new(),
            marked_ncols: 0,
            marked_nrows: 0,
            stats: LpStats::default(),
        })
    }

    // === Structure queries ===

    /// Number of columns in the current LP.
    pub fn ncols(&self) -> usize {
        self.lpcols.len()
    }

    /// Number of rows in the current LP.
    pub fn nrows(&self) -> usize {
        self.lprows.len()
    }

    /// Total number of columns ever created (arena size).
    pub fn ntotalcols(&self) -> usize {
        self.cols.len()
    }

    /// Current-LP column ordering.
    pub fn lp_cols(&self) -> &[ColId] {
        &self.lpcols
    }

    /// Current-LP row ordering.
    pub fn lp_rows(&self) -> &[RowId] {
        &self.lprows
    }

    /// Access a column.
    pub fn col(&self, id: ColId) -> &Column {
        &self.cols[id.0]
    }

    /// Access a row.
    pub fn row(&self, id: RowId) -> &Row {
        self.pool.get(id)
    }

    /// The row pool.
    pub fn pool(&self) -> &RowPool {
        &self.pool
    }

    /// The oracle (for basis, Farkas, and iteration queries).
    pub fn oracle(&self) -> &O {
        &self.oracle
    }

    /// LP management counters.
    pub fn stats(&self) -> &LpStats {
        &self.stats
    }

    /// Whether a dive is active.
    pub fn diving(&self) -> bool {
        self.diving
    }

    // === Structural mutation ===

    /// Create a column for variable `var` in the arena (not yet in the LP).
    pub fn create_col(&mut self, var: usize, obj: f64, lb: f64, ub: f64) -> CoreResult<ColId> {
        if self.diving {
            return Err(CoreError::InvalidData(
                "cannot create columns while diving".into(),
            ));
        }
        if lb > ub {
            return Err(CoreError::InvalidData(format!(
                "column bounds inverted: lb {lb} > ub {ub}"
            )));
        }
        self.cols.push(Column::new(var, obj, lb, ub));
        Ok(ColId(self.cols.len() - 1))
    }

    /// Append a column to the current LP.
    pub fn add_col(&mut self, id: ColId) -> CoreResult<()> {
        let pos = self.lpcols.len();
        let col = self
            .cols
            .get_mut(id.0)
            .ok_or_else(|| CoreError::InvalidData(format!("unknown column {}", id.0)))?;
        if col.lppos.is_some() {
            return Err(CoreError::InvalidData(format!(
                "column {} is already in the LP",
                id.0
            )));
        }
        col.lppos = Some(pos);
        col.age = 0;
        self.lpcols.push(id);
        self.flushed = false;
        Ok(())
    }

    /// Create a row in the pool (not yet in the LP) and link it into its
    /// columns. The caller owns one reference.
    pub fn create_row(
        &mut self,
        name: Option<String>,
        entries: &[(ColId, f64)],
        constant: f64,
        lhs: f64,
        rhs: f64,
        removable: bool,
    ) -> CoreResult<RowId> {
        for &(cid, _) in entries {
            if cid.0 >= self.cols.len() {
                return Err(CoreError::InvalidData(format!(
                    "row references unknown column {}",
                    cid.0
                )));
            }
        }
        let raw: Vec<(usize, f64)> = entries.iter().map(|&(c, v)| (c.0, v)).collect();
        let mut row = Row::new(name, &raw, constant, lhs, rhs)?;
        row.removable = removable;

        let links: Vec<(usize, f64)> = row.entries().to_vec();
        let id = self.pool.create(row);
        for (c, v) in links {
            self.cols[c].link_row(id, v);
        }
        Ok(id)
    }

    /// Append a row to the current LP; the LP captures a reference.
    pub fn add_row(&mut self, id: RowId) -> CoreResult<()> {
        if !self.pool.contains(id) {
            return Err(CoreError::InvalidData(format!("unknown row {}", id.0)));
        }
        if self.pool.get(id).lppos.is_some() {
            return Err(CoreError::InvalidData(format!(
                "row {} is already in the LP",
                id.0
            )));
        }
        self.pool.capture(id);
        let pos = self.lprows.len();
        let row = self.pool.get_mut(id);
        row.lppos = Some(pos);
        row.age = 0;
        self.lprows.push(id);
        self.flushed = false;
        Ok(())
    }

    /// Truncate the current LP to its first `n` rows, releasing the LP's
    /// reference on everything removed (backtracking primitive).
    pub fn remove_rows_after(&mut self, n: usize) {
        if n >= self.lprows.len() {
            return;
        }
        let removed: Vec<RowId> = self.lprows.split_off(n);
        self.lpifirstchgrow = self.lpifirstchgrow.min(n);
        for id in removed {
            {
                let row = self.pool.get_mut(id);
                row.lppos = None;
                row.lpipos = None;
            }
            if let Some(freed) = self.pool.release(id) {
                for &(c, _) in freed.entries() {
                    self.cols[c].unlink_row(id);
                }
            }
        }
        self.flushed = false;
    }

    /// Truncate the current LP to its first `n` columns.
    ///
    /// Rows may keep coefficients on removed columns; those coefficients are
    /// inactive until the column is added back.
    pub fn remove_cols_after(&mut self, n: usize) {
        if n >= self.lpcols.len() {
            return;
        }
        let removed: Vec<ColId> = self.lpcols.split_off(n);
        self.lpifirstchgcol = self.lpifirstchgcol.min(n);
        for id in removed {
            let col = &mut self.cols[id.0];
            col.lppos = None;
            col.lpipos = None;
        }
        self.flushed = false;
    }

    // === Snapshot-then-diff protocol ===

    /// Snapshot the current LP sizes; O(1).
    pub fn mark_size(&mut self) {
        self.marked_ncols = self.lpcols.len();
        self.marked_nrows = self.lprows.len();
    }

    /// Columns added since the last [`LpModel::mark_size`].
    pub fn get_new_cols(&self) -> &[ColId] {
        self.lpcols.get(self.marked_ncols..).unwrap_or(&[])
    }

    /// Rows added since the last [`LpModel::mark_size`].
    pub fn get_new_rows(&self) -> &[RowId] {
        self.lprows.get(self.marked_nrows..).unwrap_or(&[])
    }

    // === Attribute changes ===

    /// Change a column's bounds.
    pub fn change_col_bounds(&mut self, id: ColId, lb: f64, ub: f64) -> CoreResult<()> {
        if lb > ub {
            return Err(CoreError::InvalidData(format!(
                "column bounds inverted: lb {lb} > ub {ub}"
            )));
        }
        let col = self
            .cols
            .get_mut(id.0)
            .ok_or_else(|| CoreError::InvalidData(format!("unknown column {}", id.0)))?;
        if col.lb == lb && col.ub == ub {
            return Ok(());
        }
        col.lb = lb;
        col.ub = ub;
        if col.lpipos.is_some() && !col.changed {
            col.changed = true;
            self.chgcols.push(id);
        }
        self.flushed = false;
        Ok(())
    }

    /// Change a column's objective coefficient.
    pub fn change_col_obj(&mut self, id: ColId, obj: f64) -> CoreResult<()> {
        let col = self
            .cols
            .get_mut(id.0)
            .ok_or_else(|| CoreError::InvalidData(format!("unknown column {}", id.0)))?;
        if col.obj == obj {
            return Ok(());
        }
        col.obj = obj;
        if col.lpipos.is_some() && !col.changed {
            col.changed = true;
            self.chgcols.push(id);
        }
        self.flushed = false;
        Ok(())
    }

    /// Change a row's sides (fails while the row is locked).
    pub fn change_row_sides(&mut self, id: RowId, lhs: f64, rhs: f64) -> CoreResult<()> {
        if !self.pool.contains(id) {
            return Err(CoreError::InvalidData(format!("unknown row {}", id.0)));
        }
        let row = self.pool.get_mut(id);
        if row.lhs() == lhs && row.rhs() == rhs {
            return Ok(());
        }
        row.set_sides(lhs, rhs)?;
        if row.lpipos.is_some() && !row.changed {
            row.changed = true;
            self.chgrows.push(id);
        }
        self.flushed = false;
        Ok(())
    }

    // === Diving ===

    /// Enter temporary-override mode. Bound/objective changes made until
    /// [`LpModel::end_dive`] are rolled back exactly.
    pub fn start_dive(&mut self) -> CoreResult<()> {
        if self.diving {
            return Err(CoreError::InvalidData("dive already active".into()));
        }
        self.divestate = self.cols.iter().map(|c| (c.obj, c.lb, c.ub)).collect();
        self.diving = true;
        Ok(())
    }

    /// Leave temporary-override mode, restoring every column's objective and
    /// bounds to their pre-dive values bit-identically.
    pub fn end_dive(&mut self) -> CoreResult<()> {
        if !self.diving {
            return Err(CoreError::InvalidData("no dive active".into()));
        }
        let divestate = std::mem::take(&mut self.divestate);
        for (i, (obj, lb, ub)) in divestate.into_iter().enumerate() {
            let col = &mut self.cols[i];
            if col.obj != obj || col.lb != lb || col.ub != ub {
                col.obj = obj;
                col.lb = lb;
                col.ub = ub;
                if col.lpipos.is_some() && !col.changed {
                    col.changed = true;
                    self.chgcols.push(ColId(i));
                }
                self.flushed = false;
            }
        }
        self.diving = false;
        Ok(())
    }

    // === Oracle synchronization and solving ===

    fn oracle_sides(row: &Row) -> (f64, f64) {
        let lhs = if row.lhs().is_finite() {
            row.lhs() - row.constant
        } else {
            row.lhs()
        };
        let rhs = if row.rhs().is_finite() {
            row.rhs() - row.constant
        } else {
            row.rhs()
        };
        (lhs, rhs)
    }

    /// Push all pending structural and attribute changes to the oracle.
    pub fn flush(&mut self) -> CoreResult<()> {
        if self.flushed {
            return Ok(());
        }

        // Deletions: rows first since they reference columns.
        if self.lpifirstchgrow < self.nlpirows {
            self.oracle.del_rows_from(self.lpifirstchgrow)?;
            let first = self.lpifirstchgrow;
            for &rid in &self.lprows {
                let row = self.pool.get_mut(rid);
                if matches!(row.lpipos, Some(p) if p >= first) {
                    row.lpipos = None;
                }
            }
            self.nlpirows = first;
        }
        if self.lpifirstchgcol < self.nlpicols {
            self.oracle.del_cols_from(self.lpifirstchgcol)?;
            let first = self.lpifirstchgcol;
            for col in &mut self.cols {
                if matches!(col.lpipos, Some(p) if p >= first) {
                    col.lpipos = None;
                }
            }
            self.nlpicols = first;
        }

        // Additions: columns first so new rows can reference them.
        if self.nlpicols < self.lpcols.len() {
            let mut newcols = Vec::with_capacity(self.lpcols.len() - self.nlpicols);
            for &cid in &self.lpcols[self.nlpicols..] {
                let col = &self.cols[cid.0];
                let mut entries = Vec::new();
                for &(rid, val) in col.rows() {
                    if let Some(p) = self.pool.get(rid).lpipos {
                        entries.push((p, val));
                    }
                }
                newcols.push(OracleCol {
                    obj: col.obj,
                    lb: col.lb,
                    ub: col.ub,
                    entries,
                });
            }
            self.oracle.add_cols(&newcols)?;
            for (i, &cid) in self.lpcols[self.nlpicols..].iter().enumerate() {
                let col = &mut self.cols[cid.0];
                col.lpipos = Some(self.nlpicols + i);
                col.changed = false;
            }
            self.nlpicols = self.lpcols.len();
        }

        if self.nlpirows < self.lprows.len() {
            let mut newrows = Vec::with_capacity(self.lprows.len() - self.nlpirows);
            for &rid in &self.lprows[self.nlpirows..] {
                let row = self.pool.get(rid);
                let mut entries = Vec::with_capacity(row.len());
                for &(c, val) in row.entries() {
                    // Coefficients on columns outside the current LP are
                    // inactive; they come back if the column is re-added.
                    if let Some(p) = self.cols[c].lpipos {
                        entries.push((p, val));
                    }
                }
                let (lhs, rhs) = Self::oracle_sides(row);
                newrows.push(OracleRow { lhs, rhs, entries });
            }
            self.oracle.add_rows(&newrows)?;
            for (i, &rid) in self.lprows[self.nlpirows..].iter().enumerate() {
                let row = self.pool.get_mut(rid);
                row.lpipos = Some(self.nlpirows + i);
                row.changed = false;
            }
            self.nlpirows = self.lprows.len();
        }

        // Pending attribute changes.
        let chgcols = std::mem::take(&mut self.chgcols);
        for cid in chgcols {
            let col = &mut self.cols[cid.0];
            if !col.changed {
                continue;
            }
            col.changed = false;
            if let Some(p) = col.lpipos {
                self.oracle.chg_bounds(p, col.lb, col.ub)?;
                self.oracle.chg_obj(p, col.obj)?;
            }
        }
        let chgrows = std::mem::take(&mut self.chgrows);
        for rid in chgrows {
            if !self.pool.contains(rid) {
                continue;
            }
            let (changed, lpipos, sides) = {
                let row = self.pool.get(rid);
                (row.changed, row.lpipos, Self::oracle_sides(row))
            };
            if !changed {
                continue;
            }
            self.pool.get_mut(rid).changed = false;
            if let Some(p) = lpipos {
                self.oracle.chg_sides(p, sides.0, sides.1)?;
            }
        }

        self.lpifirstchgcol = self.nlpicols;
        self.lpifirstchgrow = self.nlpirows;
        self.flushed = true;
        Ok(())
    }

    /// Flush and solve, picking the primal simplex iff the last basis was
    /// primal-feasible (re-solving from a near-feasible dual basis after a
    /// bound change is far cheaper via dual simplex).
    pub fn solve(&mut self) -> CoreResult<LpSolStat> {
        self.flush()?;

        let kind = if self.primalfeasible {
            SimplexKind::Primal
        } else {
            SimplexKind::Dual
        };
        let stat = self.oracle.solve(kind)?;
        self.lpcount += 1;
        self.stats.nsolves += 1;
        match kind {
            SimplexKind::Primal => self.stats.nprimalsolves += 1,
            SimplexKind::Dual => self.stats.ndualsolves += 1,
        }

        self.solstat = stat;
        match stat {
            LpSolStat::Optimal => {
                self.objval = self.oracle.objval();
                self.primalfeasible = true;
                self.dualfeasible = true;
            }
            LpSolStat::Infeasible | LpSolStat::ObjLimit => {
                self.objval = f64::INFINITY;
                self.primalfeasible = false;
                self.dualfeasible = true;
            }
            LpSolStat::Unbounded => {
                self.objval = f64::NEG_INFINITY;
                self.primalfeasible = true;
                self.dualfeasible = false;
            }
            LpSolStat::IterLimit
            | LpSolStat::TimeLimit
            | LpSolStat::Error
            | LpSolStat::NotSolved => {
                self.objval = self.oracle.objval();
                self.primalfeasible = false;
                self.dualfeasible = false;
            }
        }

        log::debug!(
            "LP solve #{}: {:?} via {:?}, obj={:.6e}, {} iters",
            self.lpcount,
            stat,
            kind,
            self.objval,
            self.oracle.iterations()
        );
        Ok(stat)
    }

    /// Status of the last solve.
    pub fn solstat(&self) -> LpSolStat {
        self.solstat
    }

    /// Objective value of the last solve.
    pub fn objval(&self) -> f64 {
        self.objval
    }

    /// Pull primal values, reduced costs, duals, and activities into the
    /// column/row caches, stamped with the current solve generation.
    pub fn get_sol(&mut self) -> CoreResult<()> {
        if self.solstat != LpSolStat::Optimal {
            return Err(CoreError::InvalidData(format!(
                "no optimal solution available (status {:?})",
                self.solstat
            )));
        }
        let sol = self.oracle.solution()?;
        if sol.primal.len() < self.nlpicols
            || sol.redcost.len() < self.nlpicols
            || sol.dual.len() < self.nlpirows
            || sol.activity.len() < self.nlpirows
        {
            return Err(CoreError::Oracle(format!(
                "solution vectors sized {}/{}/{}/{} for an LP of dimensions {}x{}",
                sol.primal.len(),
                sol.redcost.len(),
                sol.dual.len(),
                sol.activity.len(),
                self.nlpicols,
                self.nlpirows
            )));
        }

        for col in &mut self.cols {
            if let Some(p) = col.lpipos {
                col.primsol = sol.primal[p];
                col.redcost = sol.redcost[p];
            }
        }
        for &rid in &self.lprows {
            let lpcount = self.lpcount;
            let row = self.pool.get_mut(rid);
            if let Some(p) = row.lpipos {
                row.dual = sol.dual[p];
                row.activity = sol.activity[p] + row.constant;
                row.activity_valid = lpcount;
            }
        }
        self.validsollp = self.lpcount;
        Ok(())
    }

    /// Cached primal value of a column; `None` if no fresh solution is loaded.
    pub fn primsol(&self, id: ColId) -> Option<f64> {
        if self.validsollp == self.lpcount && self.lpcount > 0 {
            Some(self.cols[id.0].primsol)
        } else {
            None
        }
    }

    /// Cached reduced cost of a column; `None` if no fresh solution is loaded.
    pub fn redcost(&self, id: ColId) -> Option<f64> {
        if self.validsollp == self.lpcount && self.lpcount > 0 {
            Some(self.cols[id.0].redcost)
        } else {
            None
        }
    }

    /// Cached activity of a row; `None` if stale.
    pub fn row_activity(&self, id: RowId) -> Option<f64> {
        let row = self.pool.get(id);
        if row.activity_valid == self.lpcount && self.lpcount > 0 {
            Some(row.activity)
        } else {
            None
        }
    }

    /// Dense primal solution indexed by column id (arena order).
    pub fn primsol_vec(&self) -> CoreResult<Vec<f64>> {
        if self.validsollp != self.lpcount || self.lpcount == 0 {
            return Err(CoreError::InvalidData(
                "no fresh LP solution loaded".into(),
            ));
        }
        Ok(self.cols.iter().map(|c| c.primsol).collect())
    }

    // === Aging ===

    /// Update ages from the freshly loaded solution: a removable column ages
    /// while its primal value is exactly zero; a removable row ages while it
    /// is slack (activity at neither side).
    pub fn update_ages(&mut self) -> CoreResult<()> {
        if self.validsollp != self.lpcount || self.lpcount == 0 {
            return Err(CoreError::InvalidData(
                "ages require a fresh LP solution".into(),
            ));
        }
        for &cid in &self.lpcols {
            let col = &mut self.cols[cid.0];
            if col.removable && col.primsol == 0.0 {
                col.age += 1;
            } else {
                col.age = 0;
            }
        }
        let feastol = self.settings.feastol;
        for &rid in &self.lprows {
            let row = self.pool.get_mut(rid);
            let tight = (row.lhs().is_finite() && (row.activity - row.lhs()).abs() <= feastol)
                || (row.rhs().is_finite() && (row.rhs() - row.activity).abs() <= feastol);
            if row.removable && !tight {
                row.age += 1;
            } else {
                row.age = 0;
            }
        }
        Ok(())
    }

    /// Evict removable columns/rows whose age exceeds the configured limits.
    /// Returns (columns removed, rows removed).
    pub fn remove_obsoletes(&mut self) -> (usize, usize) {
        let (collimit, rowlimit) = (self.settings.colagelimit, self.settings.rowagelimit);
        self.remove_aged(collimit, rowlimit)
    }

    /// Evict every removable column/row that was inactive in the last solve.
    pub fn cleanup(&mut self) -> (usize, usize) {
        self.remove_aged(0, 0)
    }

    fn remove_aged(&mut self, collimit: u32, rowlimit: u32) -> (usize, usize) {
        // Rows.
        let mut keptrows = Vec::with_capacity(self.lprows.len());
        let mut removedrows = Vec::new();
        let mut firstchgrow = None;
        for &rid in &self.lprows {
            let row = self.pool.get(rid);
            if row.removable && row.nlocks() == 0 && row.age > rowlimit {
                if firstchgrow.is_none() {
                    firstchgrow = Some(keptrows.len());
                }
                removedrows.push(rid);
            } else {
                keptrows.push(rid);
            }
        }
        if let Some(first) = firstchgrow {
            for (pos, &rid) in keptrows.iter().enumerate() {
                self.pool.get_mut(rid).lppos = Some(pos);
            }
            self.lprows = keptrows;
            for id in &removedrows {
                {
                    let row = self.pool.get_mut(*id);
                    row.lppos = None;
                    row.lpipos = None;
                }
                if let Some(freed) = self.pool.release(*id) {
                    for &(c, _) in freed.entries() {
                        self.cols[c].unlink_row(*id);
                    }
                }
            }
            self.lpifirstchgrow = self.lpifirstchgrow.min(first);
            self.flushed = false;
        }

        // Columns.
        let mut keptcols = Vec::with_capacity(self.lpcols.len());
        let mut nremovedcols = 0;
        let mut firstchgcol = None;
        for &cid in &self.lpcols {
            let col = &self.cols[cid.0];
            if col.removable && col.age > collimit {
                if firstchgcol.is_none() {
                    firstchgcol = Some(keptcols.len());
                }
                nremovedcols += 1;
                let col = &mut self.cols[cid.0];
                col.lppos = None;
                col.lpipos = None;
            } else {
                keptcols.push(cid);
            }
        }
        if let Some(first) = firstchgcol {
            for (pos, &cid) in keptcols.iter().enumerate() {
                self.cols[cid.0].lppos = Some(pos);
            }
            self.lpcols = keptcols;
            self.lpifirstchgcol = self.lpifirstchgcol.min(first);
            self.flushed = false;
        }

        let nrows = removedrows.len();
        self.stats.ncolsremoved += nremovedcols as u64;
        self.stats.nrowsremoved += nrows as u64;
        if nremovedcols > 0 || nrows > 0 {
            log::debug!(
                "aged out {} columns and {} rows (LP now {}x{})",
                nremovedcols,
                nrows,
                self.lpcols.len(),
                self.lprows.len()
            );
        }
        (nremovedcols, nrows)
    }

    // === Row aggregation ===

    /// Weighted aggregation of rows: coefficients indexed by column id,
    /// sides swapped for negative weights, infinite sides absorbing.
    ///
    /// This is the aggregation primitive under mixed-integer-rounding cut
    /// generation; the rounding itself lives outside the model.
    pub fn sum_rows(&self, weights: &[(RowId, f64)]) -> CoreResult<SummedRow> {
        let mut vals = vec![0.0; self.cols.len()];
        let mut lhs = 0.0;
        let mut rhs = 0.0;
        let mut lhsinfinite = false;
        let mut rhsinfinite = false;

        for &(rid, weight) in weights {
            if !self.pool.contains(rid) {
                return Err(CoreError::InvalidData(format!("unknown row {}", rid.0)));
            }
            if weight == 0.0 {
                continue;
            }
            let row = self.pool.get(rid);
            for &(c, v) in row.entries() {
                vals[c] += weight * v;
            }
            let (rowlhs, rowrhs) = (row.lhs(), row.rhs());
            if weight > 0.0 {
                if rowlhs.is_finite() {
                    lhs += weight * (rowlhs - row.constant);
                } else {
                    lhsinfinite = true;
                }
                if rowrhs.is_finite() {
                    rhs += weight * (rowrhs - row.constant);
                } else {
                    rhsinfinite = true;
                }
            } else {
                if rowrhs.is_finite() {
                    lhs += weight * (rowrhs - row.constant);
                } else {
                    lhsinfinite = true;
                }
                if rowlhs.is_finite() {
                    rhs += weight * (rowlhs - row.constant);
                } else {
                    rhsinfinite = true;
                }
            }
        }

        Ok(SummedRow {
            vals,
            lhs: if lhsinfinite { f64::NEG_INFINITY } else { lhs },
            rhs: if rhsinfinite { f64::INFINITY } else { rhs },
        })
    }
}
