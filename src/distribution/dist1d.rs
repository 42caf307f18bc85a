use std::ops::AddAssign;
use std::ops::SubAssign;

use ndarray::Array1;

use crate::atoms::FormFactorType;
use crate::kernel::Accumulator;

/// `distance_bin -> f64`. Backs `total_1d` and `self_ww` in spec.md's
/// partial-histogram state.
#[derive(Debug, Clone, PartialEq)]
pub struct Distribution1D {
    bins: Array1<f64>,
}

impl Distribution1D {
    pub fn zeros(bin_count: usize) -> Self {
        Self {
            bins: Array1::zeros(bin_count),
        }
    }

    pub fn bin_count(&self) -> usize {
        self.bins.len()
    }

    #[inline]
    pub fn add(&mut self, bin: usize, value: f64) {
        debug_assert!(bin < self.bins.len(), "bin {bin} out of range");
        self.bins[bin] += value;
    }

    pub fn get(&self, bin: usize) -> f64 {
        self.bins[bin]
    }

    pub fn as_slice(&self) -> &[f64] {
        self.bins.as_slice().unwrap()
    }

    pub fn iter(&self) -> impl Iterator<Item = &f64> {
        self.bins.iter()
    }

    /// Preserves contents up to `min(old, new)`, zero-fills the rest.
    pub fn resize(&mut self, new_bin_count: usize) {
        let mut new_bins = Array1::zeros(new_bin_count);
        let keep = new_bin_count.min(self.bins.len());
        new_bins
            .slice_mut(ndarray::s![..keep])
            .assign(&self.bins.slice(ndarray::s![..keep]));
        self.bins = new_bins;
    }

    /// Smallest prefix ending at the last nonzero bin, floored at
    /// `min_bins`, per spec.md §4.3 step 4.
    pub fn shrunk_to_last_nonzero(&self, min_bins: usize) -> Self {
        let last_nonzero = self
            .bins
            .iter()
            .rposition(|&v| v != 0.0)
            .map(|i| i + 1)
            .unwrap_or(0);
        let new_len = last_nonzero.max(min_bins.min(self.bins.len()));
        let mut out = self.clone();
        out.resize(new_len);
        out
    }

    pub fn sum(&self) -> f64 {
        self.bins.sum()
    }
}

impl AddAssign<&Distribution1D> for Distribution1D {
    fn add_assign(&mut self, rhs: &Distribution1D) {
        debug_assert_eq!(self.bins.len(), rhs.bins.len());
        self.bins += &rhs.bins;
    }
}

impl SubAssign<&Distribution1D> for Distribution1D {
    fn sub_assign(&mut self, rhs: &Distribution1D) {
        debug_assert_eq!(self.bins.len(), rhs.bins.len());
        self.bins -= &rhs.bins;
    }
}

impl Accumulator for Distribution1D {
    /// Ignores ff entirely — used for `self_ww`, the one partial with no
    /// ff axis (hydration atoms are all `FormFactorType::Water`).
    fn add(&mut self, _ff_a: FormFactorType, _ff_b: FormFactorType, bin: usize, value: f64) {
        Distribution1D::add(self, bin, value);
    }
}
