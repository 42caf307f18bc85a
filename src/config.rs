use crate::error::EngineError;

/// Bin edges for a 1D axis: `bin_count` bins spanning `[min, max)`.
///
/// Bin assignment is `floor((d - min) / bin_width)`, per spec (the
/// alternative `round`-at-edge convention was considered and rejected —
/// see DESIGN.md).
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Axis {
    min: f64,
    max: f64,
    bin_count: usize,
}

impl Axis {
    pub fn new(min: f64, max: f64, bin_count: usize) -> Result<Self, EngineError> {
        if bin_count == 0 || !(max > min) || !min.is_finite() || !max.is_finite() {
            return Err(EngineError::InvalidDistanceAxis {
                min,
                max,
                bin_count,
            });
        }
        Ok(Self {
            min,
            max,
            bin_count,
        })
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }

    pub fn bin_count(&self) -> usize {
        self.bin_count
    }

    pub fn bin_width(&self) -> f64 {
        (self.max - self.min) / self.bin_count as f64
    }

    /// Bin index for `value`, or `None` if it falls outside `[min, max)`.
    pub fn bin_index(&self, value: f64) -> Option<usize> {
        if value < self.min || value >= self.max {
            return None;
        }
        let idx = ((value - self.min) / self.bin_width()).floor() as usize;
        Some(idx.min(self.bin_count - 1))
    }

    /// Nominal center of `bin`.
    pub fn bin_center(&self, bin: usize) -> f64 {
        self.min + self.bin_width() * (bin as f64 + 0.5)
    }

    pub fn resized(&self, new_bin_count: usize) -> Self {
        Self {
            bin_count: new_bin_count,
            ..*self
        }
    }
}

/// How out-of-range distances are handled by the pairwise kernel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum OverflowPolicy {
    /// Default: silently drop contributions past `d_axis.max()`.
    Discard,
    /// Deposit them into the last bin instead.
    SaturateLastBin,
}

impl Default for OverflowPolicy {
    fn default() -> Self {
        OverflowPolicy::Discard
    }
}

/// Which composite-intensity assembly a [`crate::composite::CompositeDistanceHistogram`]
/// uses. All variants share the same underlying partials; they differ only
/// in `compose_intensity` and which scaling parameters they support.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum HistogramVariant {
    /// Averages form factors into a single effective scattering length per
    /// atom; cheapest, least accurate channel separation.
    SimpleAvg,
    /// Full (ff1, ff2, q) resolved product tables.
    ExplicitFf,
    /// Mimics FoXS's excluded-volume treatment (explicit ff + exv channels,
    /// no surface term).
    FoxsMimic,
    /// Mimics CRYSOL's excluded-volume treatment (explicit ff + exv + a
    /// solvent-accessible-surface term folded into cρ).
    CrysolMimic,
    /// Mimics Pepsi-SAXS's treatment (explicit ff + exv, Debye-Waller
    /// dampening applied per-channel rather than globally).
    PepsiMimic,
    /// Full grid-based excluded volume: dummy atoms from a caller-supplied
    /// grid, rescaled by `cx` via an owned geometry snapshot.
    GridBased,
}

impl HistogramVariant {
    /// Whether this variant has any excluded-volume channel at all, i.e.
    /// whether `cx`/`B_x` have any effect on `compose_intensity`.
    pub fn supports_excluded_volume(&self) -> bool {
        !matches!(self, HistogramVariant::SimpleAvg)
    }
}

/// Immutable configuration frozen at engine construction.
///
/// Bundles the axes and toggles that spec.md's Design Notes flag as
/// "read throughout" global state; capturing them once here and passing
/// `&EngineConfig` down the call stack avoids both global mutable state
/// and a parameter list that grows with every new toggle.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct EngineConfig {
    d_axis: Axis,
    q_axis: Vec<f64>,
    job_size: usize,
    use_weighted_bins: bool,
    histogram_variant: HistogramVariant,
    overflow_policy: OverflowPolicy,
    /// Average atomic radius `r_m` used by the excluded-volume Gaussian
    /// dampening `G(q)`.
    average_atomic_radius: f64,
}

impl EngineConfig {
    pub fn new(
        d_axis: Axis,
        q_axis: Vec<f64>,
        job_size: usize,
        use_weighted_bins: bool,
        histogram_variant: HistogramVariant,
    ) -> Result<Self, EngineError> {
        if q_axis.is_empty() {
            return Err(EngineError::EmptyQAxis);
        }
        if job_size == 0 {
            return Err(EngineError::InvalidJobSize);
        }
        Ok(Self {
            d_axis,
            q_axis,
            job_size,
            use_weighted_bins,
            histogram_variant,
            overflow_policy: OverflowPolicy::default(),
            average_atomic_radius: 1.62,
        })
    }

    pub fn with_overflow_policy(mut self, policy: OverflowPolicy) -> Self {
        self.overflow_policy = policy;
        self
    }

    pub fn with_average_atomic_radius(mut self, r_m: f64) -> Self {
        self.average_atomic_radius = r_m;
        self
    }

    pub fn d_axis(&self) -> &Axis {
        &self.d_axis
    }

    pub fn q_axis(&self) -> &[f64] {
        &self.q_axis
    }

    pub fn job_size(&self) -> usize {
        self.job_size
    }

    pub fn use_weighted_bins(&self) -> bool {
        self.use_weighted_bins
    }

    pub fn histogram_variant(&self) -> HistogramVariant {
        self.histogram_variant
    }

    pub fn overflow_policy(&self) -> OverflowPolicy {
        self.overflow_policy
    }

    pub fn average_atomic_radius(&self) -> f64 {
        self.average_atomic_radius
    }
}
