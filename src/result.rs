/// The five free parameters spec.md §3 enumerates, in their canonical
/// ordering — a user-supplied initial-guess list is reordered to match
/// this order (spec.md §4.7).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
pub enum ParameterName {
    ScalingWater,
    ScalingExv,
    ScalingRho,
    DebyeWallerAtomic,
    DebyeWallerExv,
}

impl ParameterName {
    pub const CANONICAL_ORDER: [ParameterName; 5] = [
        ParameterName::ScalingWater,
        ParameterName::ScalingExv,
        ParameterName::ScalingRho,
        ParameterName::DebyeWallerAtomic,
        ParameterName::DebyeWallerExv,
    ];

    /// Canonical starting point for the outer optimizer.
    pub fn default_initial_value(&self) -> f64 {
        match self {
            ParameterName::ScalingWater => 1.0,
            ParameterName::ScalingExv => 1.0,
            ParameterName::ScalingRho => 1.0,
            ParameterName::DebyeWallerAtomic => 0.0,
            ParameterName::DebyeWallerExv => 0.0,
        }
    }

    pub fn default_bounds(&self) -> (f64, f64) {
        match self {
            ParameterName::ScalingWater => (0.0, 10.0),
            ParameterName::ScalingExv => (0.5, 1.5),
            ParameterName::ScalingRho => (0.5, 1.5),
            ParameterName::DebyeWallerAtomic => (0.0, 10.0),
            ParameterName::DebyeWallerExv => (0.0, 10.0),
        }
    }

    pub fn requires_excluded_volume(&self) -> bool {
        matches!(self, ParameterName::ScalingExv | ParameterName::DebyeWallerExv)
    }
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct FittedParameter {
    pub name: ParameterName,
    pub value: f64,
    pub uncertainty: f64,
    pub bounds: (f64, f64),
}

/// Status of a completed fit. Numerical issues (spec.md §7) never
/// prevent `fit()` from returning a [`FitResult`] — they only set this
/// field to something other than `Converged`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum FitStatus {
    Converged,
    MaxIterationsReached,
    NonImproving,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct FitResult {
    pub parameters: Vec<FittedParameter>,
    pub chi2: f64,
    pub dof: i64,
    pub residuals: Vec<f64>,
    pub status: FitStatus,
    pub fevals: usize,
}

/// `I(q)` plus the q-axis it was evaluated on.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ScatteringProfile {
    pub q: Vec<f64>,
    pub intensity: Vec<f64>,
}

impl ScatteringProfile {
    pub fn new(q: Vec<f64>, intensity: Vec<f64>) -> Self {
        debug_assert_eq!(q.len(), intensity.len());
        Self { q, intensity }
    }
}
