use generational_arena::Arena;
use glam::DVec3;

use crate::atoms::AtomRecord;
use crate::atoms::FormFactorType;
use crate::body::Body;
use crate::body::BodyId;
use crate::state::HydrationSignaller;
use crate::state::StateManager;

/// The external "molecule provider" contract (spec.md §6): a sequence of
/// bodies plus a hydration layer and, for the grid-based variant, a set
/// of excluded-volume dummy positions and a solvent volume estimate. This
/// crate consumes this trait; it never parses a structure file or owns
/// rigid-body dynamics itself.
pub trait MoleculeProvider {
    fn iterate_bodies(&self) -> std::slice::Iter<'_, Body>;
    fn iterate_bodies_mut(&mut self) -> std::slice::IterMut<'_, Body>;
    fn hydration_atoms(&self) -> &[AtomRecord];
    fn exv_atoms(&self) -> &[DVec3];
    fn get_volume_grid(&self) -> f64;
    fn size_body(&self) -> usize;
    fn size_atom(&self) -> usize;
    fn size_water(&self) -> usize;

    /// Receives the hydration layer's change signal. Called exactly once,
    /// by [`crate::engine::PartialHistogramEngine::new`], alongside
    /// per-body signaller registration.
    fn register_hydration_signaller(&mut self, signaller: HydrationSignaller);
}

/// A concrete, directly-mutable [`MoleculeProvider`]: an ordered sequence
/// of [`Body`]s plus a hydration layer, owned rather than borrowed from an
/// external rigid-body engine. Suitable for tests, benchmarks, and callers
/// without a pre-existing molecule representation of their own.
#[derive(Debug, Clone, Default)]
pub struct Molecule {
    bodies: Vec<Body>,
    hydration: Vec<AtomRecord>,
    exv: Vec<DVec3>,
    volume_grid: f64,
    hydration_signaller: Option<HydrationSignaller>,
}

impl Molecule {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a body (atoms owned by the caller, id allocated by `arena`)
    /// and returns its id. Must be followed by
    /// [`Molecule::register_signallers`] before any mutation.
    pub fn add_body(&mut self, arena: &mut Arena<()>, atoms: Vec<AtomRecord>) -> BodyId {
        let id = arena.insert(());
        self.bodies.push(Body::new(id, atoms));
        id
    }

    pub fn set_hydration(&mut self, waters: Vec<AtomRecord>) {
        debug_assert!(waters.iter().all(|a| a.ff_type.is_water()));
        self.hydration = waters;
        if let Some(sig) = &self.hydration_signaller {
            sig.modified();
        }
    }

    pub fn set_exv_atoms(&mut self, exv: Vec<DVec3>) {
        self.exv = exv;
    }

    pub fn set_volume_grid(&mut self, volume: f64) {
        self.volume_grid = volume;
    }

    /// Registers one signaller per body plus the hydration signaller.
    /// Enforces the Molecule invariant: exactly one signaller per body.
    pub fn register_signallers(&mut self, state: &StateManager) {
        for body in self.bodies.iter_mut() {
            assert!(
                !body.has_signaller(),
                "register_signallers called twice on this molecule"
            );
            body.register_signaller(state.register(body.unique_id()));
        }
        self.hydration_signaller = Some(state.hydration_signaller());
    }

    pub fn body(&self, id: BodyId) -> Option<&Body> {
        self.bodies.iter().find(|b| b.unique_id() == id)
    }

    pub fn body_mut(&mut self, id: BodyId) -> Option<&mut Body> {
        self.bodies.iter_mut().find(|b| b.unique_id() == id)
    }
}

impl MoleculeProvider for Molecule {
    fn iterate_bodies(&self) -> std::slice::Iter<'_, Body> {
        self.bodies.iter()
    }

    fn iterate_bodies_mut(&mut self) -> std::slice::IterMut<'_, Body> {
        self.bodies.iter_mut()
    }

    fn hydration_atoms(&self) -> &[AtomRecord] {
        &self.hydration
    }

    fn exv_atoms(&self) -> &[DVec3] {
        &self.exv
    }

    fn get_volume_grid(&self) -> f64 {
        self.volume_grid
    }

    fn size_body(&self) -> usize {
        self.bodies.len()
    }

    fn size_atom(&self) -> usize {
        self.bodies.iter().map(|b| b.len()).sum()
    }

    fn size_water(&self) -> usize {
        self.hydration.len()
    }

    fn register_hydration_signaller(&mut self, signaller: HydrationSignaller) {
        self.hydration_signaller = Some(signaller);
    }
}
