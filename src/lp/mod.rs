//! LP relaxation management.
//!
//! [`LpModel`] tracks a dynamically growing and shrinking linear program and
//! keeps it synchronized against an external simplex oracle. Rows live in a
//! reference-counted [`RowPool`]; columns belong 1:1 to variables of the
//! external store.

mod column;
mod model;
pub mod oracle;
mod row;

pub use column::{ColId, Column};
pub use model::{LpModel, LpStats, SummedRow};
pub use oracle::{BasisStatus, LpOracle, LpSolStat, OracleCol, OracleRow, OracleSolution, SimplexKind};
pub use row::{Row, RowId, RowPool};
