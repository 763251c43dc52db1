//! Boundary to the external variable/bound store.
//!
//! The core never owns the global variable state; it reads bounds, objective
//! coefficients, variable classes, lock counts, and clique memberships through
//! [`VarStore`], and requests fixings through [`VarStore::fix`]. A plain
//! in-memory implementation, [`ProblemVars`], is provided for presolve drivers
//! and tests.

/// Class of a decision variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VarClass {
    /// Binary variable (bounds within {0, 1}).
    Binary,

    /// General integer variable.
    Integer,

    /// Continuous variable required to take an integral value in any optimum.
    ImpliedInteger,

    /// Continuous variable.
    Continuous,
}

impl VarClass {
    /// Bucket index used when grouping columns of comparable class:
    /// continuous, integer-or-implied, binary.
    pub fn bucket(self) -> usize {
        match self {
            VarClass::Continuous => 0,
            VarClass::Integer | VarClass::ImpliedInteger => 1,
            VarClass::Binary => 2,
        }
    }

    /// Whether the variable is integer-constrained.
    pub fn is_integral(self) -> bool {
        !matches!(self, VarClass::Continuous)
    }
}

/// Read/write access to the external variable and bound state.
pub trait VarStore {
    /// Current lower bound of `var`.
    fn lb(&self, var: usize) -> f64;

    /// Current upper bound of `var`.
    fn ub(&self, var: usize) -> f64;

    /// Objective coefficient of `var` (minimization sense).
    fn obj(&self, var: usize) -> f64;

    /// Class of `var`.
    fn class(&self, var: usize) -> VarClass;

    /// Number of down-locks: rows that block rounding `var` down.
    fn n_locks_down(&self, var: usize) -> usize;

    /// Number of up-locks: rows that block rounding `var` up.
    fn n_locks_up(&self, var: usize) -> usize;

    /// Whether `(var1, val1)` and `(var2, val2)` appear together in a clique.
    ///
    /// `val = true` refers to the variable at value 1, `false` at value 0.
    fn have_common_clique(&self, var1: usize, val1: bool, var2: usize, val2: bool) -> bool;

    /// Pseudocost score of `var` from the branching history.
    fn pseudocost_score(&self, var: usize) -> f64;

    /// Whether `var` is fixed (`lb == ub`).
    fn is_fixed(&self, var: usize) -> bool {
        self.lb(var) >= self.ub(var)
    }

    /// Fix `var` at `value`.
    ///
    /// Returns `(infeasible, fixed)`: `infeasible` if the fixing contradicts
    /// the current domain (the whole presolve round must then report a
    /// cutoff), `fixed` if the domain actually changed.
    fn fix(&mut self, var: usize, value: f64) -> (bool, bool);
}

/// Plain in-memory variable store.
#[derive(Debug, Clone, Default)]
pub struct ProblemVars {
    lb: Vec<f64>,
    ub: Vec<f64>,
    obj: Vec<f64>,
    class: Vec<VarClass>,
    locks_down: Vec<usize>,
    locks_up: Vec<usize>,
    pscost: Vec<f64>,

    /// Cliques as lists of (variable, value) literals.
    cliques: Vec<Vec<(usize, bool)>>,

    /// Fixings performed so far.
    nfixed: usize,
}

impl ProblemVars {
    /// Create a store with `n` free continuous variables and zero objective.
    pub fn new(n: usize) -> Self {
        Self {
            lb: vec![f64::NEG_INFINITY; n],
            ub: vec![f64::INFINITY; n],
            obj: vec![0.0; n],
            class: vec![VarClass::Continuous; n],
            locks_down: vec![0; n],
            locks_up: vec![0; n],
            pscost: vec![0.0; n],
            cliques: Vec::new(),
            nfixed: 0,
        }
    }

    /// Number of variables.
    pub fn len(&self) -> usize {
        self.lb.len()
    }

    /// Whether the store holds no variables.
    pub fn is_empty(&self) -> bool {
        self.lb.is_empty()
    }

    /// Set the bounds of `var`.
    pub fn set_bounds(&mut self, var: usize, lb: f64, ub: f64) {
        self.lb[var] = lb;
        self.ub[var] = ub;
    }

    /// Set the objective coefficient of `var`.
    pub fn set_obj(&mut self, var: usize, obj: f64) {
        self.obj[var] = obj;
    }

    /// Set the class of `var`. Binary variables get [0, 1] bounds tightened.
    pub fn set_class(&mut self, var: usize, class: VarClass) {
        self.class[var] = class;
        if class == VarClass::Binary {
            self.lb[var] = self.lb[var].max(0.0);
            self.ub[var] = self.ub[var].min(1.0);
        }
    }

    /// Set the lock counts of `var`.
    pub fn set_locks(&mut self, var: usize, down: usize, up: usize) {
        self.locks_down[var] = down;
        self.locks_up[var] = up;
    }

    /// Set the pseudocost score of `var`.
    pub fn set_pscost(&mut self, var: usize, score: f64) {
        self.pscost[var] = score;
    }

    /// Declare a clique over (variable, value) literals.
    pub fn add_clique(&mut self, literals: Vec<(usize, bool)>) {
        self.cliques.push(literals);
    }

    /// Number of fixings performed through [`VarStore::fix`].
    pub fn nfixed(&self) -> usize {
        self.nfixed
    }
}

impl VarStore for ProblemVars {
    fn lb(&self, var: usize) -> f64 {
        self.lb[var]
    }

    fn ub(&self, var: usize) -> f64 {
        self.ub[var]
    }

    fn obj(&self, var: usize) -> f64 {
        self.obj[var]
    }

    fn class(&self, var: usize) -> VarClass {
        self.class[var]
    }

    fn n_locks_down(&self, var: usize) -> usize {
        self.locks_down[var]
    }

    fn n_locks_up(&self, var: usize) -> usize {
        self.locks_up[var]
    }

    fn have_common_clique(&self, var1: usize, val1: bool, var2: usize, val2: bool) -> bool {
        self.cliques.iter().any(|clique| {
            clique.contains(&(var1, val1)) && clique.contains(&(var2, val2))
        })
    }

    fn pseudocost_score(&self, var: usize) -> f64 {
        self.pscost[var]
    }

    fn fix(&mut self, var: usize, value: f64) -> (bool, bool) {
        let eps = 1e-9;
        if value < self.lb[var] - eps || value > self.ub[var] + eps {
            return (true, false);
        }
        if self.lb[var] >= self.ub[var] {
            // Already fixed.
            return (false, false);
        }
        self.lb[var] = value;
        self.ub[var] = value;
        self.nfixed += 1;
        (false, true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fix_within_bounds() {
        let mut vars = ProblemVars::new(2);
        vars.set_bounds(0, 0.0, 5.0);

        let (infeasible, fixed) = vars.fix(0, 2.0);
        assert!(!infeasible);
        assert!(fixed);
        assert_eq!(vars.lb(0), 2.0);
        assert_eq!(vars.ub(0), 2.0);

        // Fixing again changes nothing.
        let (infeasible, fixed) = vars.fix(0, 2.0);
        assert!(!infeasible);
        assert!(!fixed);
    }

    #[test]
    fn test_fix_outside_bounds_is_infeasible() {
        let mut vars = ProblemVars::new(1);
        vars.set_bounds(0, 0.0, 1.0);

        let (infeasible, fixed) = vars.fix(0, 3.0);
        assert!(infeasible);
        assert!(!fixed);
    }

    #[test]
    fn test_common_clique() {
        let mut vars = ProblemVars::new(3);
        for v in 0..3 {
            vars.set_class(v, VarClass::Binary);
        }
        vars.add_clique(vec![(0, true), (1, true)]);

        assert!(vars.have_common_clique(0, true, 1, true));
        assert!(!vars.have_common_clique(0, true, 1, false));
        assert!(!vars.have_common_clique(0, true, 2, true));
    }

    #[test]
    fn test_binary_class_tightens_bounds() {
        let mut vars = ProblemVars::new(1);
        vars.set_class(0, VarClass::Binary);
        assert_eq!(vars.lb(0), 0.0);
        assert_eq!(vars.ub(0), 1.0);
    }
}
