use std::ops::AddAssign;
use std::ops::SubAssign;

use ndarray::Array2;
use ndarray::Axis as NdAxis;

use crate::atoms::FormFactorType;
use crate::kernel::Accumulator;

/// `(ff_type, distance_bin) -> f64`. Used for atom↔water partials
/// (`cross_aw[b]` in spec.md's engine state).
#[derive(Debug, Clone, PartialEq)]
pub struct Distribution2D {
    bins: Array2<f64>,
}

impl Distribution2D {
    pub fn zeros(ff_count: usize, bin_count: usize) -> Self {
        Self {
            bins: Array2::zeros((ff_count, bin_count)),
        }
    }

    pub fn bin_count(&self) -> usize {
        self.bins.shape()[1]
    }

    pub fn ff_count(&self) -> usize {
        self.bins.shape()[0]
    }

    #[inline]
    pub fn add(&mut self, ff: FormFactorType, bin: usize, value: f64) {
        self.bins[[ff.catalog_index(), bin]] += value;
    }

    pub fn get(&self, ff: FormFactorType, bin: usize) -> f64 {
        self.bins[[ff.catalog_index(), bin]]
    }

    /// Fixed-ff-index row, needed by the Debye transform's innermost loop.
    pub fn row(&self, ff: FormFactorType) -> ndarray::ArrayView1<'_, f64> {
        self.bins.index_axis(NdAxis(0), ff.catalog_index())
    }

    pub fn resize(&mut self, new_bin_count: usize) {
        let mut new_bins = Array2::zeros((self.ff_count(), new_bin_count));
        let keep = new_bin_count.min(self.bin_count());
        new_bins
            .slice_mut(ndarray::s![.., ..keep])
            .assign(&self.bins.slice(ndarray::s![.., ..keep]));
        self.bins = new_bins;
    }

    /// Collapsed over the ff-index, for folding into `total_1d`.
    pub fn collapse_to_1d(&self) -> crate::distribution::Distribution1D {
        let mut out = crate::distribution::Distribution1D::zeros(self.bin_count());
        for bin in 0..self.bin_count() {
            let sum: f64 = self.bins.column(bin).sum();
            out.add(bin, sum);
        }
        out
    }
}

impl AddAssign<&Distribution2D> for Distribution2D {
    fn add_assign(&mut self, rhs: &Distribution2D) {
        self.bins += &rhs.bins;
    }
}

impl SubAssign<&Distribution2D> for Distribution2D {
    fn sub_assign(&mut self, rhs: &Distribution2D) {
        self.bins -= &rhs.bins;
    }
}

impl Accumulator for Distribution2D {
    /// Bins by `ff_a` — the atom's own type. `cross_aw[b]` pairs body `b`'s
    /// atoms (array `a` in every call site) against the hydration layer
    /// (array `b`, always `FormFactorType::Water`), so the only informative
    /// ff axis is the atom's.
    fn add(&mut self, ff_a: FormFactorType, _ff_b: FormFactorType, bin: usize, value: f64) {
        Distribution2D::add(self, ff_a, bin, value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_get_roundtrip() {
        let mut d = Distribution2D::zeros(crate::atoms::CATALOG_SIZE, 10);
        d.add(FormFactorType::Water, 3, 2.0);
        assert_eq!(d.get(FormFactorType::Water, 3), 2.0);
        assert_eq!(d.get(FormFactorType::Sulfur, 3), 0.0);
    }
}
