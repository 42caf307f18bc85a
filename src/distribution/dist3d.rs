use std::ops::AddAssign;
use std::ops::SubAssign;

use ndarray::Array3;
use ndarray::Axis as NdAxis;

use crate::atoms::FormFactorType;
use crate::kernel::Accumulator;

/// `(ff_type_i, ff_type_j, distance_bin) -> f64`. Used for ff-resolved
/// atom↔atom partials (`self_aa[b]`, `cross_aa[b1,b2]`).
#[derive(Debug, Clone, PartialEq)]
pub struct Distribution3D {
    bins: Array3<f64>,
}

impl Distribution3D {
    pub fn zeros(ff_count: usize, bin_count: usize) -> Self {
        Self {
            bins: Array3::zeros((ff_count, ff_count, bin_count)),
        }
    }

    pub fn bin_count(&self) -> usize {
        self.bins.shape()[2]
    }

    pub fn ff_count(&self) -> usize {
        self.bins.shape()[0]
    }

    #[inline]
    pub fn add(&mut self, ff_i: FormFactorType, ff_j: FormFactorType, bin: usize, value: f64) {
        self.bins[[ff_i.catalog_index(), ff_j.catalog_index(), bin]] += value;
    }

    pub fn get(&self, ff_i: FormFactorType, ff_j: FormFactorType, bin: usize) -> f64 {
        self.bins[[ff_i.catalog_index(), ff_j.catalog_index(), bin]]
    }

    /// Fixed-(ff_i, ff_j)-prefix row over the distance axis.
    pub fn row(&self, ff_i: FormFactorType, ff_j: FormFactorType) -> ndarray::ArrayView1<'_, f64> {
        self.bins
            .index_axis(NdAxis(0), ff_i.catalog_index())
            .index_axis_move(NdAxis(0), ff_j.catalog_index())
    }

    pub fn resize(&mut self, new_bin_count: usize) {
        let mut new_bins = Array3::zeros((self.ff_count(), self.ff_count(), new_bin_count));
        let keep = new_bin_count.min(self.bin_count());
        new_bins
            .slice_mut(ndarray::s![.., .., ..keep])
            .assign(&self.bins.slice(ndarray::s![.., .., ..keep]));
        self.bins = new_bins;
    }

    /// Deposits the self-correlation term at bin 0: `sum(w_i^2)` per
    /// ff-type, per spec.md's Invariant I2.
    pub fn add_self_correlation(&mut self, ff: FormFactorType, weight_squared: f64) {
        self.add(ff, ff, 0, weight_squared);
    }

    pub fn collapse_to_1d(&self) -> crate::distribution::Distribution1D {
        let mut out = crate::distribution::Distribution1D::zeros(self.bin_count());
        for bin in 0..self.bin_count() {
            let sum: f64 = self.bins.slice(ndarray::s![.., .., bin]).sum();
            out.add(bin, sum);
        }
        out
    }
}

impl AddAssign<&Distribution3D> for Distribution3D {
    fn add_assign(&mut self, rhs: &Distribution3D) {
        self.bins += &rhs.bins;
    }
}

impl SubAssign<&Distribution3D> for Distribution3D {
    fn sub_assign(&mut self, rhs: &Distribution3D) {
        self.bins -= &rhs.bins;
    }
}

impl Accumulator for Distribution3D {
    fn add(&mut self, ff_a: FormFactorType, ff_b: FormFactorType, bin: usize, value: f64) {
        Distribution3D::add(self, ff_a, ff_b, bin, value);
    }
}
