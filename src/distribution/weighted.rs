use crate::atoms::FormFactorType;
use crate::distribution::Distribution1D;
use crate::distribution::Distribution3D;
use crate::kernel::Accumulator;

/// A [`Distribution1D`] that additionally tracks, per bin, the
/// weight-weighted true distance of its contributions, so a bin center
/// can be refined to a weighted mean rather than the nominal midpoint.
#[derive(Debug, Clone)]
pub struct WeightedDistribution1D {
    counts: Distribution1D,
    weighted_distance: Distribution1D,
}

impl WeightedDistribution1D {
    pub fn zeros(bin_count: usize) -> Self {
        Self {
            counts: Distribution1D::zeros(bin_count),
            weighted_distance: Distribution1D::zeros(bin_count),
        }
    }

    pub fn plain(&self) -> &Distribution1D {
        &self.counts
    }

    /// Weighted mean distance in `bin`, falling back to `fallback` (the
    /// nominal bin center) when the bin has no contributions.
    pub fn mean_distance(&self, bin: usize, fallback: f64) -> f64 {
        let w = self.counts.get(bin);
        if w == 0.0 {
            fallback
        } else {
            self.weighted_distance.get(bin) / w
        }
    }

    pub fn add_weighted(&mut self, bin: usize, value: f64, true_distance: f64) {
        self.counts.add(bin, value);
        self.weighted_distance.add(bin, value * true_distance);
    }
}

impl Accumulator for WeightedDistribution1D {
    fn add(&mut self, _ff_a: FormFactorType, _ff_b: FormFactorType, bin: usize, value: f64) {
        self.counts.add(bin, value);
    }

    fn add_weighted(
        &mut self,
        _ff_a: FormFactorType,
        _ff_b: FormFactorType,
        bin: usize,
        value: f64,
        true_distance: f64,
    ) {
        WeightedDistribution1D::add_weighted(self, bin, value, true_distance);
    }
}

/// As [`WeightedDistribution1D`], but ff-resolved — used when a
/// body's self/cross partial itself needs refined bin centers (e.g. the
/// `explicit-ff` composite variant).
#[derive(Debug, Clone)]
pub struct WeightedDistribution3D {
    counts: Distribution3D,
    weighted_distance: Distribution3D,
}

impl WeightedDistribution3D {
    pub fn zeros(ff_count: usize, bin_count: usize) -> Self {
        Self {
            counts: Distribution3D::zeros(ff_count, bin_count),
            weighted_distance: Distribution3D::zeros(ff_count, bin_count),
        }
    }

    pub fn plain(&self) -> &Distribution3D {
        &self.counts
    }

    pub fn mean_distance(&self, ff_i: FormFactorType, ff_j: FormFactorType, bin: usize, fallback: f64) -> f64 {
        let w = self.counts.get(ff_i, ff_j, bin);
        if w == 0.0 {
            fallback
        } else {
            self.weighted_distance.get(ff_i, ff_j, bin) / w
        }
    }
}

impl Accumulator for WeightedDistribution3D {
    fn add(&mut self, ff_a: FormFactorType, ff_b: FormFactorType, bin: usize, value: f64) {
        self.counts.add(ff_a, ff_b, bin, value);
    }

    fn add_weighted(
        &mut self,
        ff_a: FormFactorType,
        ff_b: FormFactorType,
        bin: usize,
        value: f64,
        true_distance: f64,
    ) {
        self.counts.add(ff_a, ff_b, bin, value);
        self.weighted_distance.add(ff_a, ff_b, bin, value * true_distance);
    }
}
