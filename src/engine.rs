use std::collections::HashMap;
use std::sync::Mutex;

use crate::atoms::CATALOG_SIZE;
use crate::body::BodyId;
use crate::config::EngineConfig;
use crate::coords::CompactCoords;
use crate::error::EngineError;
use crate::kernel::PairwiseKernel;
use crate::molecule::MoleculeProvider;
use crate::pool::ThreadLocalWrapper;
use crate::pool::WorkerPool;
use crate::state::StateManager;

use crate::distribution::Distribution1D;
use crate::distribution::Distribution2D;
use crate::distribution::Distribution3D;

/// Canonical partial-histogram state (spec.md §4.2), mutated only in the
/// serial post-merge phase of [`PartialHistogramEngine::calculate`] under
/// this one mutex. No concurrent writer ever touches these fields —
/// per-worker accumulation happens into fresh [`ThreadLocalWrapper`]
/// instances instead, which are merged in here once a phase's barrier has
/// passed.
struct EngineCanonical {
    self_aa: HashMap<BodyId, Distribution3D>,
    cross_aa: HashMap<(usize, usize), Distribution3D>,
    cross_aw: HashMap<BodyId, Distribution2D>,
    self_ww: Distribution1D,
    /// Atom↔exv, present only for [`crate::config::HistogramVariant::GridBased`].
    cross_ax: HashMap<BodyId, Distribution2D>,
    /// Exv self-histogram (homogeneous ff, like `self_ww`).
    self_xx: Distribution1D,
    /// Water↔exv (both homogeneous ff, plain distance histogram).
    cross_wx: Distribution1D,
    total_1d: Distribution1D,
}

/// Drives the partial-histogram algorithm spec.md §4.3 describes: a
/// per-body/per-pair cache of distance histograms, refreshed only where a
/// [`crate::state::StateManager`] dirty flag says it must be, then folded
/// into a single `total_1d` that callers pass to
/// [`crate::composite::CompositeDistanceHistogram`].
///
/// Mirrors the teacher's `gravity::Solver` shape: a plain struct holding
/// configuration plus pure compute methods, with no ECS glue baked in —
/// callers own the molecule and drive `calculate`/`calculate_all`
/// themselves.
pub struct PartialHistogramEngine {
    config: EngineConfig,
    pool: WorkerPool,
    state: StateManager,
    body_order: Vec<BodyId>,
    coords: HashMap<BodyId, CompactCoords>,
    hydration_coords: CompactCoords,
    exv_coords: CompactCoords,
    canonical: Mutex<EngineCanonical>,
    first_call: bool,
}

impl PartialHistogramEngine {
    /// Registers one signaller per body plus the hydration signaller, then
    /// performs the first (necessarily full) histogram pass so a
    /// newly-built engine is immediately queryable.
    ///
    /// Returns [`EngineError::SignallerCountMismatch`] rather than
    /// panicking if `molecule` already had signallers registered (e.g. a
    /// second engine built over the same molecule) — a caller trying that
    /// can still back out cleanly instead of hitting `Body`'s internal
    /// assert.
    pub fn new(config: EngineConfig, molecule: &mut dyn MoleculeProvider, num_threads: Option<usize>) -> Result<Self, EngineError> {
        if molecule.iterate_bodies().any(|b| b.has_signaller()) {
            return Err(EngineError::SignallerCountMismatch {
                registered: molecule.iterate_bodies().filter(|b| b.has_signaller()).count(),
                bodies: molecule.size_body(),
            });
        }
        let state = StateManager::new();
        let mut body_order = Vec::with_capacity(molecule.size_body());
        for body in molecule.iterate_bodies_mut() {
            let id = body.unique_id();
            body.register_signaller(state.register(id));
            body_order.push(id);
        }
        molecule.register_hydration_signaller(state.hydration_signaller());

        let mut engine = Self {
            pool: WorkerPool::new(num_threads),
            state,
            body_order,
            coords: HashMap::new(),
            hydration_coords: CompactCoords::from_atoms(&[]),
            exv_coords: CompactCoords::from_atoms(&[]),
            canonical: Mutex::new(EngineCanonical {
                self_aa: HashMap::new(),
                cross_aa: HashMap::new(),
                cross_aw: HashMap::new(),
                self_ww: Distribution1D::zeros(config.d_axis().bin_count()),
                cross_ax: HashMap::new(),
                self_xx: Distribution1D::zeros(config.d_axis().bin_count()),
                cross_wx: Distribution1D::zeros(config.d_axis().bin_count()),
                total_1d: Distribution1D::zeros(config.d_axis().bin_count()),
            }),
            first_call: true,
            config,
        };
        engine.calculate(molecule);
        Ok(engine)
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// `total_1d` as of the most recent [`PartialHistogramEngine::calculate`].
    pub fn total_distribution(&self) -> Distribution1D {
        self.canonical.lock().unwrap().total_1d.clone()
    }

    fn kernel(&self) -> PairwiseKernel<'_> {
        PairwiseKernel::new(self.config.d_axis(), self.config.overflow_policy(), self.config.use_weighted_bins())
    }

    fn bin_count(&self) -> usize {
        self.config.d_axis().bin_count()
    }

    /// Refreshes every dirty partial and returns the updated `total_1d`.
    /// On the first call (from [`PartialHistogramEngine::new`]) every body
    /// and the hydration layer are treated as dirty, matching spec.md
    /// §4.3's "first pass is always full" rule.
    pub fn calculate(&mut self, molecule: &dyn MoleculeProvider) -> Distribution1D {
        let first_call = self.first_call;
        self.first_call = false;

        let dirty = if first_call {
            self.body_order.iter().map(|id| (*id, true, true)).collect::<Vec<_>>()
        } else {
            let flags = self.state.dirty_bodies();
            flags.into_iter().map(|(id, f)| (id, f.internal, f.external)).collect::<Vec<_>>()
        };
        let hydration_dirty = first_call || self.state.is_hydration_dirty();

        // Refresh CompactCoords snapshots for anything whose atoms moved
        // or changed composition.
        for body in molecule.iterate_bodies() {
            let id = body.unique_id();
            if first_call || self.coords_need_refresh(id, &dirty) {
                self.coords.insert(id, CompactCoords::from_atoms(body.atoms()));
            }
        }
        if hydration_dirty {
            self.hydration_coords = CompactCoords::from_atoms(molecule.hydration_atoms());
        }
        let has_exv = self.config.histogram_variant().supports_excluded_volume() && !molecule.exv_atoms().is_empty();
        if has_exv && hydration_dirty {
            self.exv_coords = CompactCoords::from_positions(molecule.exv_atoms(), crate::atoms::FormFactorType::ExcludedVolume);
        }

        let kernel = self.kernel();
        let bin_count = self.bin_count();

        // Self-histograms: full recompute for any body with a dirty
        // `internal` flag.
        for &(id, internal, _) in &dirty {
            if internal {
                let coords = &self.coords[&id];
                let fresh = compute_self_3d(&self.pool, &kernel, self.config.job_size(), coords, bin_count);
                let mut canon = self.canonical.lock().unwrap();
                canon.self_aa.insert(id, fresh);
            }
        }

        // Cross atom-atom histograms: recompute for any pair touching a
        // body with either flag set.
        let dirty_ids: std::collections::HashSet<BodyId> = dirty.iter().filter(|(_, i, e)| *i || *e).map(|(id, _, _)| *id).collect();
        if !dirty_ids.is_empty() {
            for i in 0..self.body_order.len() {
                for j in (i + 1)..self.body_order.len() {
                    let a_id = self.body_order[i];
                    let b_id = self.body_order[j];
                    if dirty_ids.contains(&a_id) || dirty_ids.contains(&b_id) {
                        let a = &self.coords[&a_id];
                        let b = &self.coords[&b_id];
                        let fresh = compute_cross_3d(&self.pool, &kernel, self.config.job_size(), a, b, bin_count);
                        let mut canon = self.canonical.lock().unwrap();
                        canon.cross_aa.insert((i, j), fresh);
                    }
                }
            }
        }

        // Cross atom-water histograms: recompute for any dirty body, or
        // every body if hydration itself changed.
        if hydration_dirty || !dirty_ids.is_empty() {
            for &id in &self.body_order {
                if hydration_dirty || dirty_ids.contains(&id) {
                    let atoms = &self.coords[&id];
                    let fresh = compute_cross_2d(&self.pool, &kernel, self.config.job_size(), atoms, &self.hydration_coords, bin_count);
                    let mut canon = self.canonical.lock().unwrap();
                    canon.cross_aw.insert(id, fresh);
                }
            }
        }

        // Water-water self-histogram: recompute only if hydration changed.
        if hydration_dirty {
            let fresh = compute_self_1d(&self.pool, &kernel, self.config.job_size(), &self.hydration_coords, bin_count);
            let mut canon = self.canonical.lock().unwrap();
            canon.self_ww = fresh;
        }

        // Excluded-volume channels: only for variants that carry them, and
        // only when the molecule actually supplies exv dummy atoms.
        if has_exv {
            if hydration_dirty || !dirty_ids.is_empty() {
                for &id in &self.body_order {
                    if hydration_dirty || dirty_ids.contains(&id) {
                        let atoms = &self.coords[&id];
                        let fresh = compute_cross_2d(&self.pool, &kernel, self.config.job_size(), atoms, &self.exv_coords, bin_count);
                        let mut canon = self.canonical.lock().unwrap();
                        canon.cross_ax.insert(id, fresh);
                    }
                }
            }
            if hydration_dirty {
                let fresh_xx = compute_self_1d(&self.pool, &kernel, self.config.job_size(), &self.exv_coords, bin_count);
                let fresh_wx = compute_cross_1d_plain(&self.pool, &kernel, self.config.job_size(), &self.hydration_coords, &self.exv_coords, bin_count);
                let mut canon = self.canonical.lock().unwrap();
                canon.self_xx = fresh_xx;
                canon.cross_wx = fresh_wx;
            }
        }

        self.state.reset_to_false();

        // Recompose total_1d from every partial. Simpler and less
        // error-prone than incrementally patching it in place, and still
        // O(total bins) rather than O(atoms^2).
        let mut canon = self.canonical.lock().unwrap();
        let mut total = Distribution1D::zeros(bin_count);
        for dist in canon.self_aa.values() {
            total += &dist.collapse_to_1d();
        }
        for dist in canon.cross_aa.values() {
            total += &dist.collapse_to_1d();
        }
        for dist in canon.cross_aw.values() {
            total += &dist.collapse_to_1d();
        }
        total += &canon.self_ww;
        canon.total_1d = total.clone();
        total
    }

    /// Convenience wrapper spec.md §4.3 names alongside `calculate`: same
    /// effect, but returns the composed
    /// [`crate::composite::CompositeDistanceHistogram`] rather than the
    /// bare `total_1d`.
    pub fn calculate_all(&mut self, molecule: &dyn MoleculeProvider) -> crate::composite::CompositeDistanceHistogram {
        self.calculate(molecule);
        self.snapshot()
    }

    /// Builds a [`crate::composite::CompositeDistanceHistogram`] from the
    /// engine's current partials without recomputing anything.
    pub fn snapshot(&self) -> crate::composite::CompositeDistanceHistogram {
        let canon = self.canonical.lock().unwrap();
        let bin_count = self.bin_count();

        let mut aa = Distribution3D::zeros(CATALOG_SIZE, bin_count);
        for dist in canon.self_aa.values() {
            aa += dist;
        }
        for dist in canon.cross_aa.values() {
            aa += dist;
        }
        let mut aw = Distribution2D::zeros(CATALOG_SIZE, bin_count);
        for dist in canon.cross_aw.values() {
            aw += dist;
        }
        let ww = canon.self_ww.clone();

        let mut ax = Distribution2D::zeros(CATALOG_SIZE, bin_count);
        for dist in canon.cross_ax.values() {
            ax += dist;
        }
        let xx = canon.self_xx.clone();
        let wx = canon.cross_wx.clone();

        crate::composite::CompositeDistanceHistogram::new(&self.config, aa, aw, ww, ax, xx, wx)
    }

    fn coords_need_refresh(&self, id: BodyId, dirty: &[(BodyId, bool, bool)]) -> bool {
        dirty.iter().any(|(d_id, internal, external)| *d_id == id && (*internal || *external))
    }
}

fn compute_self_3d(pool: &WorkerPool, kernel: &PairwiseKernel<'_>, job_size: usize, coords: &CompactCoords, bin_count: usize) -> Distribution3D {
    let wrapper: ThreadLocalWrapper<Distribution3D> = ThreadLocalWrapper::new(move || Distribution3D::zeros(CATALOG_SIZE, bin_count));
    let indices: Vec<usize> = (0..coords.len()).collect();
    pool.for_each_chunk(&indices, job_size, |chunk| {
        let cell = wrapper.get();
        let mut acc = cell.borrow_mut();
        for &i in chunk {
            acc.add_self_correlation(coords.ff_type(i), coords.weight(i).powi(2));
            kernel.evaluate_row(&mut *acc, coords, i, coords, i + 1, 2.0);
        }
    });
    wrapper.merge(Distribution3D::zeros(CATALOG_SIZE, bin_count))
}

fn compute_cross_3d(pool: &WorkerPool, kernel: &PairwiseKernel<'_>, job_size: usize, a: &CompactCoords, b: &CompactCoords, bin_count: usize) -> Distribution3D {
    let wrapper: ThreadLocalWrapper<Distribution3D> = ThreadLocalWrapper::new(move || Distribution3D::zeros(CATALOG_SIZE, bin_count));
    let indices: Vec<usize> = (0..a.len()).collect();
    pool.for_each_chunk(&indices, job_size, |chunk| {
        let cell = wrapper.get();
        let mut acc = cell.borrow_mut();
        for &i in chunk {
            kernel.evaluate_row(&mut *acc, a, i, b, 0, 1.0);
        }
    });
    wrapper.merge(Distribution3D::zeros(CATALOG_SIZE, bin_count))
}

fn compute_cross_2d(pool: &WorkerPool, kernel: &PairwiseKernel<'_>, job_size: usize, atoms: &CompactCoords, water: &CompactCoords, bin_count: usize) -> Distribution2D {
    let wrapper: ThreadLocalWrapper<Distribution2D> = ThreadLocalWrapper::new(move || Distribution2D::zeros(CATALOG_SIZE, bin_count));
    let indices: Vec<usize> = (0..atoms.len()).collect();
    pool.for_each_chunk(&indices, job_size, |chunk| {
        let cell = wrapper.get();
        let mut acc = cell.borrow_mut();
        for &i in chunk {
            kernel.evaluate_row(&mut *acc, atoms, i, water, 0, 1.0);
        }
    });
    wrapper.merge(Distribution2D::zeros(CATALOG_SIZE, bin_count))
}

fn compute_cross_1d_plain(pool: &WorkerPool, kernel: &PairwiseKernel<'_>, job_size: usize, a: &CompactCoords, b: &CompactCoords, bin_count: usize) -> Distribution1D {
    let wrapper: ThreadLocalWrapper<Distribution1D> = ThreadLocalWrapper::new(move || Distribution1D::zeros(bin_count));
    let indices: Vec<usize> = (0..a.len()).collect();
    pool.for_each_chunk(&indices, job_size, |chunk| {
        let cell = wrapper.get();
        let mut acc = cell.borrow_mut();
        for &i in chunk {
            kernel.evaluate_row(&mut *acc, a, i, b, 0, 1.0);
        }
    });
    wrapper.merge(Distribution1D::zeros(bin_count))
}

fn compute_self_1d(pool: &WorkerPool, kernel: &PairwiseKernel<'_>, job_size: usize, water: &CompactCoords, bin_count: usize) -> Distribution1D {
    let wrapper: ThreadLocalWrapper<Distribution1D> = ThreadLocalWrapper::new(move || Distribution1D::zeros(bin_count));
    let indices: Vec<usize> = (0..water.len()).collect();
    pool.for_each_chunk(&indices, job_size, |chunk| {
        let cell = wrapper.get();
        let mut acc = cell.borrow_mut();
        for &i in chunk {
            acc.add(0, water.weight(i).powi(2));
            kernel.evaluate_row(&mut *acc, water, i, water, i + 1, 2.0);
        }
    });
    wrapper.merge(Distribution1D::zeros(bin_count))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::atoms::AtomRecord;
    use crate::atoms::FormFactorType;
    use crate::config::Axis;
    use crate::config::HistogramVariant;
    use crate::molecule::Molecule;
    use generational_arena::Arena;
    use glam::DVec3;

    fn atom(x: f64, y: f64, z: f64, ff: FormFactorType) -> AtomRecord {
        AtomRecord::new(DVec3::new(x, y, z), 1.0, ff)
    }

    fn small_config() -> EngineConfig {
        EngineConfig::new(Axis::new(0.0, 10.0, 20).unwrap(), vec![0.0, 0.1, 0.2], 4, false, HistogramVariant::ExplicitFf).unwrap()
    }

    #[test]
    fn first_pass_accounts_for_every_pair() {
        let mut arena = Arena::new();
        let mut mol = Molecule::new();
        mol.add_body(
            &mut arena,
            vec![
                atom(0.0, 0.0, 0.0, FormFactorType::CarbonAliphatic),
                atom(1.0, 0.0, 0.0, FormFactorType::CarbonAliphatic),
            ],
        );
        mol.add_body(&mut arena, vec![atom(5.0, 0.0, 0.0, FormFactorType::Sulfur)]);

        let mut engine = PartialHistogramEngine::new(small_config(), &mut mol, Some(2)).unwrap();
        let total = engine.total_distribution();
        // Self-correlation: 2 atoms in body A (weight^2 each) + 1 in body B = 3.
        // Pairwise: A-A (1 pair, factor 2 => 2), A-B (2*1 pairs, factor 1 => 2).
        assert!((total.sum() - 7.0).abs() < 1e-9);
    }

    #[test]
    fn translating_a_body_only_touches_cross_partials() {
        let mut arena = Arena::new();
        let mut mol = Molecule::new();
        mol.add_body(&mut arena, vec![atom(0.0, 0.0, 0.0, FormFactorType::CarbonAliphatic)]);
        mol.add_body(&mut arena, vec![atom(5.0, 0.0, 0.0, FormFactorType::Sulfur)]);

        let mut engine = PartialHistogramEngine::new(small_config(), &mut mol, Some(2)).unwrap();
        let before = engine.total_distribution();

        mol.body_mut(mol.iterate_bodies().next().unwrap().unique_id()).unwrap().translate(DVec3::new(1.0, 0.0, 0.0));
        let after = engine.calculate(&mol);

        assert!((before.sum() - after.sum()).abs() < 1e-9);
        assert_ne!(before, after);
    }
}
