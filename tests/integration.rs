//! End-to-end scenarios across LP management, cut selection, and presolving.

use mip_core::lp::{
    BasisStatus, LpOracle, LpSolStat, OracleCol, OracleRow, OracleSolution, Row, RowId, RowPool,
    SimplexKind,
};
use mip_core::{
    CoreResult, CutSelSettings, CutSelector, DominanceDetector, LpModel, LpSettings,
    PresolveOutcome, ProblemVars, ScoreContext, SparseMatrixView, VarClass, VarStore,
};

/// Toy oracle: stores the pushed LP verbatim and "solves" it by putting every
/// column at its finite lower bound (upper bound if only that is finite, zero
/// otherwise). Good enough to exercise the synchronization and solution
/// plumbing end to end.
#[derive(Default)]
struct DenseOracle {
    cols: Vec<OracleCol>,
    rows: Vec<OracleRow>,
    solution: OracleSolution,
}

impl LpOracle for DenseOracle {
    fn add_cols(&mut self, cols: &[OracleCol]) -> CoreResult<()> {
        self.cols.extend_from_slice(cols);
        Ok(())
    }

    fn add_rows(&mut self, rows: &[OracleRow]) -> CoreResult<()> {
        self.rows.extend_from_slice(rows);
        Ok(())
    }

    fn del_cols_from(&mut self, first: usize) -> CoreResult<()> {
        self.cols.truncate(first);
        Ok(())
    }

    fn del_rows_from(&mut self, first: usize) -> CoreResult<()> {
        self.rows.truncate(first);
        Ok(())
    }

    fn chg_bounds(&mut self, col: usize, lb: f64, ub: f64) -> CoreResult<()> {
        self.cols[col].lb = lb;
        self.cols[col].ub = ub;
        Ok(())
    }

    fn chg_obj(&mut self, col: usize, obj: f64) -> CoreResult<()> {
        self.cols[col].obj = obj;
        Ok(())
    }

    fn chg_sides(&mut self, row: usize, lhs: f64, rhs: f64) -> CoreResult<()> {
        self.rows[row].lhs = lhs;
        self.rows[row].rhs = rhs;
        Ok(())
    }

    fn solve(&mut self, _kind: SimplexKind) -> CoreResult<LpSolStat> {
        let primal: Vec<f64> = self
            .cols
            .iter()
            .map(|c| {
                if c.lb.is_finite() {
                    c.lb
                } else if c.ub.is_finite() {
                    c.ub
                } else {
                    0.0
                }
            })
            .collect();
        let activity: Vec<f64> = self
            .rows
            .iter()
            .map(|r| r.entries.iter().map(|&(c, v)| v * primal[c]).sum())
            .collect();
        self.solution = OracleSolution {
            objval: self
                .cols
                .iter()
                .zip(&primal)
                .map(|(c, x)| c.obj * x)
                .sum(),
            redcost: vec![0.0; primal.len()],
            dual: vec![0.0; activity.len()],
            primal,
            activity,
        };
        Ok(LpSolStat::Optimal)
    }

    fn objval(&self) -> f64 {
        self.solution.objval
    }

    fn solution(&self) -> CoreResult<OracleSolution> {
        Ok(self.solution.clone())
    }

    fn basis(&self) -> CoreResult<(Vec<BasisStatus>, Vec<BasisStatus>)> {
        Ok((
            vec![BasisStatus::Lower; self.cols.len()],
            vec![BasisStatus::Basic; self.rows.len()],
        ))
    }

    fn binv_row(&self, row: usize) -> CoreResult<Vec<f64>> {
        let mut e = vec![0.0; self.rows.len()];
        e[row] = 1.0;
        Ok(e)
    }

    fn dual_farkas(&self) -> CoreResult<Vec<f64>> {
        Ok(vec![0.0; self.rows.len()])
    }

    fn iterations(&self) -> usize {
        0
    }
}

/// Cut candidates over four columns: two near-parallel knapsack-style cuts
/// and one orthogonal single-column cut.
fn candidate_pool() -> (RowPool, Vec<RowId>) {
    let mut pool = RowPool::new();
    let ids = vec![
        pool.create(Row::new(None, &[(0, 1.0), (1, 1.0)], 0.0, f64::NEG_INFINITY, 1.0).unwrap()),
        pool.create(Row::new(None, &[(0, 1.0), (1, 0.99)], 0.0, f64::NEG_INFINITY, 1.0).unwrap()),
        pool.create(Row::new(None, &[(3, 1.0)], 0.0, f64::NEG_INFINITY, 0.5).unwrap()),
    ];
    (pool, ids)
}

#[test]
fn test_selection_scenario_three_cuts_budget_two() {
    // Scores [5, 3, 4], two cuts allowed, no forced cuts, no parallelism
    // filtering: the selected prefix must be cut 0 then cut 2.
    let (pool, ids) = candidate_pool();
    let settings = CutSelSettings {
        filterparalcuts: false,
        ..Default::default()
    }
    .with_maxnselectedcuts(2)
    .with_minscore(0.0);
    let mut selector = CutSelector::new(settings).unwrap();

    let mut cuts = ids.clone();
    let mut scores = vec![5.0, 3.0, 4.0];
    let n = selector
        .select_scored(&pool, &mut cuts, &mut scores, &[], false, 4)
        .unwrap();

    assert_eq!(n, 2);
    assert_eq!(cuts[0], ids[0]);
    assert_eq!(cuts[1], ids[2]);
    assert_eq!(cuts[2], ids[1]);
    assert_eq!(scores[..2], [5.0, 4.0]);
    assert_eq!(selector.stats().nselected, 2);
}

#[test]
fn test_scoring_and_parallelism_filter_pipeline() {
    // Full pipeline: both near-parallel cuts are violated at the LP point,
    // but after the first is taken the second gets filtered, so the
    // orthogonal cut joins instead.
    let (pool, ids) = candidate_pool();
    let mut vars = ProblemVars::new(4);
    for v in 0..4 {
        vars.set_bounds(v, 0.0, 1.0);
    }
    let lp_sol = vec![0.9, 0.9, 0.0, 0.9];
    let obj = vec![1.0, 1.0, 1.0, 1.0];
    let ctx = ScoreContext {
        lp_sol: &lp_sol,
        best_sol: None,
        obj: &obj,
        root: false,
        ncols: 4,
        vars: &vars,
        col_vars: &[0, 1, 2, 3],
    };

    let mut selector = CutSelector::new(CutSelSettings::default()).unwrap();
    let mut cuts = ids.clone();
    let n = selector.select(&pool, &mut cuts, &[], &ctx).unwrap();

    assert_eq!(n, 2);
    let selected = &cuts[..n];
    assert!(!(selected.contains(&ids[0]) && selected.contains(&ids[1])));
    assert!(selected.contains(&ids[2]));
    assert_eq!(selector.stats().nparalfiltered, 1);
}

#[test]
fn test_lp_round_trip_with_dive() {
    let mut model = LpModel::new(DenseOracle::default(), LpSettings::default()).unwrap();

    let x = model.create_col(0, 1.0, 0.5, 2.0).unwrap();
    let y = model.create_col(1, -1.0, 0.0, 1.0).unwrap();
    let z = model.create_col(2, 0.0, 0.25, f64::INFINITY).unwrap();
    for &c in &[x, y, z] {
        model.add_col(c).unwrap();
    }
    let r0 = model
        .create_row(
            Some("cap".into()),
            &[(x, 1.0), (y, 2.0)],
            0.0,
            f64::NEG_INFINITY,
            4.0,
            false,
        )
        .unwrap();
    let r1 = model
        .create_row(None, &[(y, 1.0), (z, 1.0)], 0.5, 0.0, f64::INFINITY, true)
        .unwrap();
    model.add_row(r0).unwrap();
    model.add_row(r1).unwrap();

    assert_eq!(model.solve().unwrap(), LpSolStat::Optimal);
    model.get_sol().unwrap();

    // The toy oracle parks every column at its lower bound.
    assert_eq!(model.primsol(x), Some(0.5));
    assert_eq!(model.primsol(z), Some(0.25));
    // Activity caches include the row constant.
    assert_eq!(model.row_activity(r1), Some(0.25 + 0.5));

    // Dive, rewrite everything, and come back: the pre-dive state must be
    // restored exactly.
    model.start_dive().unwrap();
    model.change_col_bounds(x, 1.0, 1.0).unwrap();
    model.change_col_bounds(z, 0.0, 3.0).unwrap();
    model.change_col_obj(y, 7.5).unwrap();
    assert_eq!(model.solve().unwrap(), LpSolStat::Optimal);
    model.end_dive().unwrap();

    assert_eq!(model.col(x).lb, 0.5);
    assert_eq!(model.col(x).ub, 2.0);
    assert_eq!(model.col(y).obj, -1.0);
    assert_eq!(model.col(z).lb, 0.25);
    assert_eq!(model.col(z).ub, f64::INFINITY);

    // And the restored LP still solves.
    assert_eq!(model.solve().unwrap(), LpSolStat::Optimal);
    model.get_sol().unwrap();
    assert_eq!(model.primsol(x), Some(0.5));
}

#[test]
fn test_dominance_equation_yields_no_relation() {
    // One equation row with distinct coefficients: no dominance either way.
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
    assert_eq!(vars.nfixed(), 0);
}

#[test]
fn test_dominance_binary_clique_fixing() {
    // Three binaries in a covering row; a (1,1)-clique between the first two
    // fixes the dominated one at zero, the third stays free.
    let mut vars = ProblemVars::new(3);
    for v in 0..3 {
        vars.set_class(v, VarClass::Binary);
        vars.set_obj(v, 0.0);
    }
    vars.set_obj(2, 5.0);
    vars.add_clique(vec![(0, true), (1, true)]);

    let matrix = SparseMatrixView::build(
        2,
        3,
        &[(0, 0, 1.0), (0, 1, 1.0), (1, 2, 1.0)],
        vec![f64::NEG_INFINITY, f64::NEG_INFINITY],
        vec![1.0, 1.0],
        vec![0, 1, 2],
        &vars,
    )
    .unwrap();

    let mut detector = DominanceDetector::new();
    let outcome = detector.presolve_round(&matrix, &mut vars);
    assert_eq!(outcome, PresolveOutcome::Reduced);
    assert_eq!(detector.stats().nfixedvars, 1);
    assert_eq!(vars.ub(1), 0.0);
    assert!(!vars.is_fixed(0));
    assert!(!vars.is_fixed(2));
}
