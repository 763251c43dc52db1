//! Configuration settings for LP management and cut selection.
//!
//! All settings are plain structs passed by reference into the operations that
//! need them; there is no global configuration state. Out-of-range values are
//! rejected by `validate()` at configuration time, never silently clamped.

use crate::error::{CoreError, CoreResult};

/// Cut scoring and selection settings.
#[derive(Debug, Clone)]
pub struct CutSelSettings {
    // === Scoring weights ===
    /// Weight of the efficacy score. Range [0, inf).
    pub efficacyweight: f64,

    /// Weight of the directed cutoff distance score. Range [0, inf).
    ///
    /// Only used at the root node with an incumbent present; otherwise this
    /// weight folds into the efficacy coefficient.
    pub dircutoffdistweight: f64,

    /// Weight of objective parallelism. Range [0, inf).
    pub objparalweight: f64,

    /// Weight of objective orthogonality. Range [0, inf).
    /// May be nonzero together with `objparalweight`.
    pub objorthogweight: f64,

    /// Weight of integral support. Range [0, inf).
    pub intsupportweight: f64,

    /// Weight of the expected objective improvement. Range [0, inf).
    pub expimprovweight: f64,

    /// Weight of the pseudocost score. Range [0, inf).
    pub pscostweight: f64,

    /// Weight of the variable lock score. Range [0, inf).
    pub locksweight: f64,

    /// Reward cuts over variables with *few* locks instead of many.
    pub penaliselocks: bool,

    // === Bonuses ===
    /// Sparsity bonus at density zero, decreasing linearly to zero at
    /// `endsparsitybonus`. Range [0, inf).
    pub maxsparsitybonus: f64,

    /// Density at which the sparsity bonus reaches zero. Range (0, 1].
    pub endsparsitybonus: f64,

    /// Flat bonus for well-conditioned cuts. Range [0, inf).
    pub goodnumericsbonus: f64,

    /// Maximum max|coef|/min|coef| ratio still considered well conditioned.
    /// Range [1, inf).
    pub maxcoefratiobonus: f64,

    // === Selection ===
    /// Minimum score for a cut to be selected; selection stops at the first
    /// candidate below it. Any real value.
    pub minscore: f64,

    /// Maximum number of cuts selected per round.
    pub maxnselectedcuts: usize,

    /// Hard-filter candidates too parallel to an already selected or forced
    /// cut. Mutually exclusive with `penaliseparalcuts`.
    pub filterparalcuts: bool,

    /// Penalize (instead of filter) candidates too parallel to an already
    /// selected or forced cut. Mutually exclusive with `filterparalcuts`.
    pub penaliseparalcuts: bool,

    /// Cosine similarity above which two cuts count as parallel. Range [0, 1].
    pub maxparal: f64,

    /// Score penalty applied in penalize mode. Range [0, inf).
    pub paralpenalty: f64,

    /// Drop candidates denser than `maxcutdensity` before scoring.
    pub filterdensecuts: bool,

    /// Maximum cut density (nonzeros / LP columns). Range (0, 1].
    pub maxcutdensity: f64,

    /// Cumulative nonzero budget (sum of nnz/ncols) per root-node round.
    /// Range (0, inf).
    pub maxnonzerorootround: f64,

    /// Cumulative nonzero budget per tree-node round. Range (0, inf).
    pub maxnonzerotreeround: f64,

    /// Seed for the tie-breaking score perturbation (deterministic per seed).
    pub randseed: u64,
}

impl Default for CutSelSettings {
    fn default() -> Self {
        Self {
            // Scoring
            efficacyweight: 1.0,
            dircutoffdistweight: 0.5,
            objparalweight: 0.1,
            objorthogweight: 0.1,
            intsupportweight: 0.1,
            expimprovweight: 0.1,
            pscostweight: 0.0,
            locksweight: 0.0,
            penaliselocks: false,

            // Bonuses
            maxsparsitybonus: 0.5,
            endsparsitybonus: 0.4,
            goodnumericsbonus: 0.0,
            maxcoefratiobonus: 1e4,

            // Selection
            minscore: 0.0,
            maxnselectedcuts: usize::MAX,
            filterparalcuts: true,
            penaliseparalcuts: false,
            maxparal: 0.95,
            paralpenalty: 0.25,
            filterdensecuts: false,
            maxcutdensity: 0.425,
            maxnonzerorootround: 8.0,
            maxnonzerotreeround: 4.0,

            randseed: 0,
        }
    }
}

impl CutSelSettings {
    /// Check all values against their documented ranges.
    pub fn validate(&self) -> CoreResult<()> {
        let nonneg = [
            ("efficacyweight", self.efficacyweight),
            ("dircutoffdistweight", self.dircutoffdistweight),
            ("objparalweight", self.objparalweight),
            ("objorthogweight", self.objorthogweight),
            ("intsupportweight", self.intsupportweight),
            ("expimprovweight", self.expimprovweight),
            ("pscostweight", self.pscostweight),
            ("locksweight", self.locksweight),
            ("maxsparsitybonus", self.maxsparsitybonus),
            ("goodnumericsbonus", self.goodnumericsbonus),
            ("paralpenalty", self.paralpenalty),
        ];
        for (name, val) in nonneg {
            if !(val >= 0.0) || !val.is_finite() {
                return Err(CoreError::InvalidParameter(format!(
                    "{name} must be finite and >= 0, got {val}"
                )));
            }
        }

        if !(self.endsparsitybonus > 0.0 && self.endsparsitybonus <= 1.0) {
            return Err(CoreError::InvalidParameter(format!(
                "endsparsitybonus must be in (0, 1], got {}",
                self.endsparsitybonus
            )));
        }
        if !(self.maxcoefratiobonus >= 1.0) {
            return Err(CoreError::InvalidParameter(format!(
                "maxcoefratiobonus must be >= 1, got {}",
                self.maxcoefratiobonus
            )));
        }
        if !self.minscore.is_finite() {
            return Err(CoreError::InvalidParameter(format!(
                "minscore must be finite, got {}",
                self.minscore
            )));
        }
        if !(0.0..=1.0).contains(&self.maxparal) {
            return Err(CoreError::InvalidParameter(format!(
                "maxparal must be in [0, 1], got {}",
                self.maxparal
            )));
        }
        if !(self.maxcutdensity > 0.0 && self.maxcutdensity <= 1.0) {
            return Err(CoreError::InvalidParameter(format!(
                "maxcutdensity must be in (0, 1], got {}",
                self.maxcutdensity
            )));
        }
        if !(self.maxnonzerorootround > 0.0) {
            return Err(CoreError::InvalidParameter(format!(
                "maxnonzerorootround must be > 0, got {}",
                self.maxnonzerorootround
            )));
        }
        if !(self.maxnonzerotreeround > 0.0) {
            return Err(CoreError::InvalidParameter(format!(
                "maxnonzerotreeround must be > 0, got {}",
                self.maxnonzerotreeround
            )));
        }
        if self.filterparalcuts && self.penaliseparalcuts {
            return Err(CoreError::InvalidParameter(
                "filterparalcuts and penaliseparalcuts are mutually exclusive".into(),
            ));
        }
        Ok(())
    }

    /// Set the maximum number of selected cuts per round.
    pub fn with_maxnselectedcuts(mut self, n: usize) -> Self {
        self.maxnselectedcuts = n;
        self
    }

    /// Set the minimum selectable score.
    pub fn with_minscore(mut self, minscore: f64) -> Self {
        self.minscore = minscore;
        self
    }

    /// Set the perturbation seed.
    pub fn with_randseed(mut self, seed: u64) -> Self {
        self.randseed = seed;
        self
    }
}

/// LP management settings.
#[derive(Debug, Clone)]
pub struct LpSettings {
    /// Feasibility tolerance used for at-bound tests. Range (0, inf).
    pub feastol: f64,

    /// Column age above which a removable column becomes an eviction
    /// candidate.
    pub colagelimit: u32,

    /// Row age above which a removable row becomes an eviction candidate.
    pub rowagelimit: u32,
}

impl Default for LpSettings {
    fn default() -> Self {
        Self {
            feastol: 1e-6,
            colagelimit: 10,
            rowagelimit: 10,
        }
    }
}

impl LpSettings {
    /// Check all values against their documented ranges.
    pub fn validate(&self) -> CoreResult<()> {
        if !(self.feastol > 0.0) || !self.feastol.is_finite() {
            return Err(CoreError::InvalidParameter(format!(
                "feastol must be finite and > 0, got {}",
                self.feastol
            )));
        }
        Ok(())
    }
}
