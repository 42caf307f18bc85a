use crate::atoms::FormFactorType;
use crate::config::Axis;
use crate::config::OverflowPolicy;
use crate::coords::CompactCoords;

/// Sink for pairwise contributions, implemented by the distribution
/// containers in [`crate::distribution`]. Kept as a trait (rather than
/// hard-wiring the kernel to one container shape) so the same inner loop
/// serves 1D/2D/3D, weighted and unweighted accumulation without
/// duplicating the batching logic.
pub trait Accumulator {
    fn add(&mut self, ff_a: FormFactorType, ff_b: FormFactorType, bin: usize, value: f64);

    /// Called instead of [`Accumulator::add`] when the kernel is
    /// configured for weighted bins; `true_distance` is the unbinned
    /// distance so the container can track a weighted mean per bin.
    fn add_weighted(
        &mut self,
        ff_a: FormFactorType,
        ff_b: FormFactorType,
        bin: usize,
        value: f64,
        true_distance: f64,
    ) {
        // Default: ignore the true distance, behave like `add`.
        self.add(ff_a, ff_b, bin, value);
    }
}

/// A single pairwise contribution computed by the kernel, before it is
/// deposited into an [`Accumulator`].
#[derive(Debug, Clone, Copy)]
pub struct Contribution {
    pub ff_a: FormFactorType,
    pub ff_b: FormFactorType,
    pub bin: usize,
    pub distance: f64,
    pub weight: f64,
}

/// Computes pairwise distance/weight/form-factor contributions between
/// two [`CompactCoords`] arrays and deposits them into an [`Accumulator`].
///
/// `factor` is 2 for same-array unordered pairs (symmetry bookkeeping —
/// each unordered pair is counted for both orderings) and 1 for
/// cross-array ordered pairs, matching spec.md's Invariant I3. Self-pairs
/// (`i == j` in a same-array batch) must never be submitted here — they
/// are deposited separately as the self-correlation term (spec.md §4.3
/// step 1, Invariant I2).
pub struct PairwiseKernel<'a> {
    d_axis: &'a Axis,
    overflow_policy: OverflowPolicy,
    use_weighted_bins: bool,
}

impl<'a> PairwiseKernel<'a> {
    pub fn new(d_axis: &'a Axis, overflow_policy: OverflowPolicy, use_weighted_bins: bool) -> Self {
        Self {
            d_axis,
            overflow_policy,
            use_weighted_bins,
        }
    }

    #[inline]
    fn contribution(&self, a: &CompactCoords, i: usize, b: &CompactCoords, j: usize) -> Option<Contribution> {
        let d = (a.position(i) - b.position(j)).length();
        let bin = match self.d_axis.bin_index(d) {
            Some(bin) => bin,
            None => match self.overflow_policy {
                OverflowPolicy::Discard => return None,
                OverflowPolicy::SaturateLastBin => self.d_axis.bin_count() - 1,
            },
        };
        Some(Contribution {
            ff_a: a.ff_type(i),
            ff_b: b.ff_type(j),
            bin,
            distance: d,
            weight: a.weight(i) * b.weight(j),
        })
    }

    fn deposit(&self, acc: &mut dyn Accumulator, c: Contribution, factor: f64) {
        let value = factor * c.weight;
        if self.use_weighted_bins {
            acc.add_weighted(c.ff_a, c.ff_b, c.bin, value, c.distance);
        } else {
            acc.add(c.ff_a, c.ff_b, c.bin, value);
        }
    }

    /// One pair `(i, j)`, `i != j`.
    pub fn evaluate1(
        &self,
        acc: &mut dyn Accumulator,
        a: &CompactCoords,
        i: usize,
        b: &CompactCoords,
        j: usize,
        factor: f64,
    ) {
        debug_assert!(!std::ptr::eq(a, b) || i != j, "self-pair submitted to the kernel");
        if let Some(c) = self.contribution(a, i, b, j) {
            self.deposit(acc, c, factor);
        }
    }

    /// `a[i]` against the four contiguous entries `b[j..j+4]`. The loop is
    /// written so each lane only touches `b`'s attribute arrays at
    /// sequential offsets and `a`'s attributes are loaded once — the
    /// shape a vectorizing compiler can turn into SIMD gathers over `b`.
    pub fn evaluate4(
        &self,
        acc: &mut dyn Accumulator,
        a: &CompactCoords,
        i: usize,
        b: &CompactCoords,
        j: usize,
        factor: f64,
    ) {
        let end = (j + 4).min(b.len());
        let ax = a.x()[i];
        let ay = a.y()[i];
        let az = a.z()[i];
        let aw = a.weight(i);
        let a_ff = a.ff_type(i);
        for k in j..end {
            if std::ptr::eq(a, b) && i == k {
                continue;
            }
            let dx = ax - b.x()[k];
            let dy = ay - b.y()[k];
            let dz = az - b.z()[k];
            let d = (dx * dx + dy * dy + dz * dz).sqrt();
            let bin = match self.d_axis.bin_index(d) {
                Some(bin) => bin,
                None => match self.overflow_policy {
                    OverflowPolicy::Discard => continue,
                    OverflowPolicy::SaturateLastBin => self.d_axis.bin_count() - 1,
                },
            };
            let value = factor * aw * b.weight(k);
            if self.use_weighted_bins {
                acc.add_weighted(a_ff, b.ff_type(k), bin, value, d);
            } else {
                acc.add(a_ff, b.ff_type(k), bin, value);
            }
        }
    }

    /// As [`PairwiseKernel::evaluate4`] but over eight contiguous `b`
    /// entries.
    pub fn evaluate8(
        &self,
        acc: &mut dyn Accumulator,
        a: &CompactCoords,
        i: usize,
        b: &CompactCoords,
        j: usize,
        factor: f64,
    ) {
        let end = (j + 8).min(b.len());
        let ax = a.x()[i];
        let ay = a.y()[i];
        let az = a.z()[i];
        let aw = a.weight(i);
        let a_ff = a.ff_type(i);
        for k in j..end {
            if std::ptr::eq(a, b) && i == k {
                continue;
            }
            let dx = ax - b.x()[k];
            let dy = ay - b.y()[k];
            let dz = az - b.z()[k];
            let d = (dx * dx + dy * dy + dz * dz).sqrt();
            let bin = match self.d_axis.bin_index(d) {
                Some(bin) => bin,
                None => match self.overflow_policy {
                    OverflowPolicy::Discard => continue,
                    OverflowPolicy::SaturateLastBin => self.d_axis.bin_count() - 1,
                },
            };
            let value = factor * aw * b.weight(k);
            if self.use_weighted_bins {
                acc.add_weighted(a_ff, b.ff_type(k), bin, value, d);
            } else {
                acc.add(a_ff, b.ff_type(k), bin, value);
            }
        }
    }

    /// `a[i]` against `b[j_start..]`, batched 8/4/1. Factored out of
    /// [`PairwiseKernel::evaluate_all`] so callers that parallelize by atom
    /// row (rather than submitting the whole cross product at once) can
    /// drive the same batching from their own chunked loop.
    pub fn evaluate_row(
        &self,
        acc: &mut dyn Accumulator,
        a: &CompactCoords,
        i: usize,
        b: &CompactCoords,
        j_start: usize,
        factor: f64,
    ) {
        let mut j = j_start;
        while j + 8 <= b.len() {
            self.evaluate8(acc, a, i, b, j, factor);
            j += 8;
        }
        while j + 4 <= b.len() {
            self.evaluate4(acc, a, i, b, j, factor);
            j += 4;
        }
        while j < b.len() {
            self.evaluate1(acc, a, i, b, j, factor);
            j += 1;
        }
    }

    /// Runs the whole `a × b` cross product (or, when `a` and `b` are the
    /// same array, the whole upper triangle) in batches of eight, falling
    /// back to four then one at the tail. `same_array` controls self-pair
    /// exclusion and the starting offset for each row (upper triangle
    /// only, when true).
    pub fn evaluate_all(
        &self,
        acc: &mut dyn Accumulator,
        a: &CompactCoords,
        b: &CompactCoords,
        same_array: bool,
        factor: f64,
    ) {
        for i in 0..a.len() {
            let start = if same_array { i + 1 } else { 0 };
            self.evaluate_row(acc, a, i, b, start, factor);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::atoms::FormFactorType;
    use glam::DVec3;

    struct RecordingAccumulator {
        total: f64,
        per_bin: std::collections::HashMap<usize, f64>,
    }

    impl Accumulator for RecordingAccumulator {
        fn add(&mut self, _ff_a: FormFactorType, _ff_b: FormFactorType, bin: usize, value: f64) {
            self.total += value;
            *self.per_bin.entry(bin).or_insert(0.0) += value;
        }
    }

    #[test]
    fn two_atoms_one_angstrom_apart() {
        let axis = Axis::new(0.0, 10.0, 20).unwrap(); // bin width 0.5
        let coords = CompactCoords::from_atoms(&[
            crate::atoms::AtomRecord::new(DVec3::ZERO, 1.0, FormFactorType::CarbonAliphatic),
            crate::atoms::AtomRecord::new(DVec3::new(1.0, 0.0, 0.0), 1.0, FormFactorType::CarbonAliphatic),
        ]);
        let kernel = PairwiseKernel::new(&axis, OverflowPolicy::Discard, false);
        let mut acc = RecordingAccumulator {
            total: 0.0,
            per_bin: Default::default(),
        };
        kernel.evaluate_all(&mut acc, &coords, &coords, true, 2.0);
        // d=1.0 -> bin 2, weight 1*1=1, factor 2 => contributes 2.0
        assert_eq!(acc.per_bin.get(&2), Some(&2.0));
        assert_eq!(acc.total, 2.0);
    }

    #[test]
    fn overflow_is_discarded_by_default() {
        let axis = Axis::new(0.0, 1.0, 4).unwrap();
        let coords = CompactCoords::from_atoms(&[
            crate::atoms::AtomRecord::new(DVec3::ZERO, 1.0, FormFactorType::CarbonAliphatic),
            crate::atoms::AtomRecord::new(DVec3::new(5.0, 0.0, 0.0), 1.0, FormFactorType::CarbonAliphatic),
        ]);
        let kernel = PairwiseKernel::new(&axis, OverflowPolicy::Discard, false);
        let mut acc = RecordingAccumulator {
            total: 0.0,
            per_bin: Default::default(),
        };
        kernel.evaluate_all(&mut acc, &coords, &coords, true, 2.0);
        assert_eq!(acc.total, 0.0);
    }
}
