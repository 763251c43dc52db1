//! External LP oracle boundary.
//!
//! The simplex solver itself lives outside this crate; [`LpModel`] talks to it
//! through the [`LpOracle`] trait and treats every solve outcome as data.
//!
//! [`LpModel`]: crate::lp::LpModel

use crate::error::CoreResult;

/// Which simplex algorithm to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimplexKind {
    /// Primal simplex (preferred when the last basis is primal-feasible).
    Primal,

    /// Dual simplex (preferred after bound changes on a dual-feasible basis).
    Dual,
}

/// Status of the last LP solve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LpSolStat {
    /// No solve has happened since the last structural change.
    #[default]
    NotSolved,

    /// Optimal solution found.
    Optimal,

    /// LP is primal infeasible (node can be pruned).
    Infeasible,

    /// LP is unbounded.
    Unbounded,

    /// Objective limit reached.
    ObjLimit,

    /// Iteration limit reached.
    IterLimit,

    /// Time limit reached.
    TimeLimit,

    /// Numerical difficulties; the caller may retry with different settings.
    Error,
}

/// Basis status of a column or row in the oracle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BasisStatus {
    /// Nonbasic at lower bound.
    Lower,

    /// Basic.
    Basic,

    /// Nonbasic at upper bound.
    Upper,

    /// Nonbasic free variable at zero.
    Zero,
}

/// Column data pushed to the oracle.
///
/// Coefficients are given only for rows already loaded, by oracle row index;
/// coefficients in not-yet-loaded rows travel with the rows instead.
#[derive(Debug, Clone)]
pub struct OracleCol {
    /// Objective coefficient.
    pub obj: f64,

    /// Lower bound.
    pub lb: f64,

    /// Upper bound.
    pub ub: f64,

    /// Sparse (oracle row index, coefficient) entries.
    pub entries: Vec<(usize, f64)>,
}

/// Row data pushed to the oracle (sides already adjusted for the row constant).
#[derive(Debug, Clone)]
pub struct OracleRow {
    /// Left-hand side.
    pub lhs: f64,

    /// Right-hand side.
    pub rhs: f64,

    /// Sparse (oracle column index, coefficient) entries.
    pub entries: Vec<(usize, f64)>,
}

/// Solution values read back from the oracle after a successful solve.
#[derive(Debug, Clone, Default)]
pub struct OracleSolution {
    /// Primal objective value.
    pub objval: f64,

    /// Primal values per oracle column.
    pub primal: Vec<f64>,

    /// Reduced costs per oracle column.
    pub redcost: Vec<f64>,

    /// Dual values per oracle row.
    pub dual: Vec<f64>,

    /// Row activities per oracle row.
    pub activity: Vec<f64>,
}

/// Opaque simplex oracle.
///
/// Hard interface failures are `Err`; infeasibility, unboundedness, and limits
/// are [`LpSolStat`] values so branch-and-bound can discard the node and
/// continue.
pub trait LpOracle {
    /// Append columns.
    fn add_cols(&mut self, cols: &[OracleCol]) -> CoreResult<()>;

    /// Append rows.
    fn add_rows(&mut self, rows: &[OracleRow]) -> CoreResult<()>;

    /// Delete all columns from index `first` on.
    fn del_cols_from(&mut self, first: usize) -> CoreResult<()>;

    /// Delete all rows from index `first` on.
    fn del_rows_from(&mut self, first: usize) -> CoreResult<()>;

    /// Change the bounds of a loaded column.
    fn chg_bounds(&mut self, col: usize, lb: f64, ub: f64) -> CoreResult<()>;

    /// Change the objective coefficient of a loaded column.
    fn chg_obj(&mut self, col: usize, obj: f64) -> CoreResult<()>;

    /// Change the sides of a loaded row.
    fn chg_sides(&mut self, row: usize, lhs: f64, rhs: f64) -> CoreResult<()>;

    /// Run the simplex algorithm.
    fn solve(&mut self, kind: SimplexKind) -> CoreResult<LpSolStat>;

    /// Objective value of the last solve.
    fn objval(&self) -> f64;

    /// Solution values of the last solve.
    fn solution(&self) -> CoreResult<OracleSolution>;

    /// Basis status per column and per row.
    fn basis(&self) -> CoreResult<(Vec<BasisStatus>, Vec<BasisStatus>)>;

    /// One row of the basis inverse.
    fn binv_row(&self, row: usize) -> CoreResult<Vec<f64>>;

    /// Dual Farkas certificate of primal infeasibility.
    fn dual_farkas(&self) -> CoreResult<Vec<f64>>;

    /// Simplex iterations of the last solve.
    fn iterations(&self) -> usize;
}
