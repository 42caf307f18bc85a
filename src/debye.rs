use ndarray::Array2;
use ndarray::Array3;

use crate::atoms::FormFactorType;
use crate::atoms::CATALOG_SIZE;
use crate::config::Axis;
use crate::distribution::Distribution1D;
use crate::distribution::Distribution3D;
use crate::formfactor;

#[inline]
fn sinc(x: f64) -> f64 {
    if x == 0.0 {
        1.0
    } else {
        x.sin() / x
    }
}

/// Precomputed `sin(qd)/qd` table, one row per q value. Two flavors exist,
/// matching spec.md §4.4:
///
/// - [`SincTable::from_axis`] (the "array table"): bin-centered `d`
///   values, shared read-only across every histogram computed against the
///   same [`Axis`].
/// - [`SincTable::from_distances`] (the "vector table"): built from a
///   [`crate::distribution::WeightedDistribution1D`]'s true mean
///   distances, allocated fresh per histogram.
#[derive(Debug, Clone)]
pub struct SincTable {
    values: Array2<f64>, // [q_index][bin]
}

impl SincTable {
    pub fn from_axis(q_axis: &[f64], d_axis: &Axis) -> Self {
        let distances: Vec<f64> = (0..d_axis.bin_count())
            .map(|bin| d_axis.bin_center(bin))
            .collect();
        Self::from_distances(q_axis, &distances)
    }

    pub fn from_distances(q_axis: &[f64], distances: &[f64]) -> Self {
        let mut values = Array2::zeros((q_axis.len(), distances.len()));
        for (qi, &q) in q_axis.iter().enumerate() {
            for (bi, &d) in distances.iter().enumerate() {
                values[[qi, bi]] = sinc(q * d);
            }
        }
        Self { values }
    }

    #[inline]
    pub fn value(&self, q_index: usize, bin: usize) -> f64 {
        self.values[[q_index, bin]]
    }

    pub fn bin_count(&self) -> usize {
        self.values.shape()[1]
    }
}

/// Precomputed `f_i(q) * f_j(q)` for every (ff_i, ff_j, q) triple —
/// computed once per q-axis and shared across however many histograms use
/// that axis.
#[derive(Debug, Clone)]
pub struct FormFactorProductTable {
    values: Array3<f64>, // [ff_i][ff_j][q_index]
}

impl FormFactorProductTable {
    pub fn new(q_axis: &[f64]) -> Self {
        let mut values = Array3::zeros((CATALOG_SIZE, CATALOG_SIZE, q_axis.len()));
        let per_ff_q: Vec<Vec<f64>> = FormFactorType::ALL
            .iter()
            .map(|ff| q_axis.iter().map(|&q| formfactor::coefficients(*ff).evaluate(q)).collect())
            .collect();
        for i in 0..CATALOG_SIZE {
            for j in 0..CATALOG_SIZE {
                for (qi, _) in q_axis.iter().enumerate() {
                    values[[i, j, qi]] = per_ff_q[i][qi] * per_ff_q[j][qi];
                }
            }
        }
        Self { values }
    }

    #[inline]
    pub fn product(&self, ff_i: FormFactorType, ff_j: FormFactorType, q_index: usize) -> f64 {
        self.values[[ff_i.catalog_index(), ff_j.catalog_index(), q_index]]
    }
}

/// `I[q] = sum_d p[d] * sinc(q*d)`, and its ff-resolved variant.
pub struct DebyeTransform {
    q_axis: Vec<f64>,
    sinc: SincTable,
}

impl DebyeTransform {
    pub fn new(q_axis: &[f64], d_axis: &Axis) -> Self {
        Self {
            q_axis: q_axis.to_vec(),
            sinc: SincTable::from_axis(q_axis, d_axis),
        }
    }

    pub fn with_refined_distances(q_axis: &[f64], distances: &[f64]) -> Self {
        Self {
            q_axis: q_axis.to_vec(),
            sinc: SincTable::from_distances(q_axis, distances),
        }
    }

    pub fn q_axis(&self) -> &[f64] {
        &self.q_axis
    }

    /// Exposes the underlying sinc table so [`crate::composite`] can reuse
    /// it for a 2D distribution's per-row transform without recomputing or
    /// duplicating it.
    pub fn transform_sinc(&self, q_index: usize, bin: usize) -> f64 {
        self.sinc.value(q_index, bin)
    }

    /// Plain (not ff-resolved) transform: `I[q] = sum_d p[d] * sinc(qd)`.
    pub fn transform(&self, dist: &Distribution1D) -> Vec<f64> {
        let mut out = vec![0.0; self.q_axis.len()];
        let values = dist.as_slice();
        for qi in 0..self.q_axis.len() {
            let mut acc = 0.0;
            for (bin, &p) in values.iter().enumerate() {
                if p != 0.0 {
                    acc += p * self.sinc.value(qi, bin);
                }
            }
            out[qi] = acc;
        }
        out
    }

    /// Ff-resolved transform: iterates (ff1, ff2, q) innermost, multiplying
    /// each term by the precomputed form-factor product and an optional
    /// per-(ff1, ff2) multiplier (e.g. the exv dampening `G(q)`, folded in
    /// by the caller rather than hard-coded here since which channels get
    /// which multiplier is a [`crate::composite`]-variant decision).
    pub fn transform_ff_resolved(
        &self,
        dist: &Distribution3D,
        products: &FormFactorProductTable,
        mut channel_multiplier: impl FnMut(FormFactorType, FormFactorType, usize) -> f64,
    ) -> Vec<f64> {
        let mut out = vec![0.0; self.q_axis.len()];
        for &ff_i in FormFactorType::ALL.iter() {
            for &ff_j in FormFactorType::ALL.iter() {
                let row = dist.row(ff_i, ff_j);
                if row.iter().all(|&v| v == 0.0) {
                    continue;
                }
                for qi in 0..self.q_axis.len() {
                    let mut acc = 0.0;
                    for (bin, &p) in row.iter().enumerate() {
                        if p != 0.0 {
                            acc += p * self.sinc.value(qi, bin);
                        }
                    }
                    out[qi] += acc * products.product(ff_i, ff_j, qi) * channel_multiplier(ff_i, ff_j, qi);
                }
            }
        }
        out
    }
}
