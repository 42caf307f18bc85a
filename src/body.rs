use generational_arena::Index;

use crate::atoms::AtomRecord;
use crate::state::Signaller;

/// Stable identity for a [`Body`], backed by a
/// [`generational_arena::Index`] rather than a pointer — this is what
/// lets [`crate::state::Signaller`] reference "which body" without ever
/// holding a reference back into the owning [`crate::molecule::Molecule`]
/// or [`crate::engine::PartialHistogramEngine`].
pub type BodyId = Index;

/// The external "molecule provider" contract for one rigid body (spec.md
/// §6). This crate ships [`Body`] as both the trait and a concrete,
/// directly-mutable implementation suitable for a caller that doesn't
/// have its own rigid-body representation; a host application with an
/// existing body type should implement [`BodyProvider`] against its own
/// atoms storage instead of constructing a [`Body`].
pub trait BodyProvider {
    fn atoms(&self) -> &[AtomRecord];
    fn unique_id(&self) -> BodyId;
}

/// An ordered collection of [`AtomRecord`]s sharing a rigid-motion
/// history. Exposes the two change signals spec.md requires: internal
/// (composition changed) and external (rigid motion only).
#[derive(Debug, Clone)]
pub struct Body {
    id: BodyId,
    atoms: Vec<AtomRecord>,
    signaller: Option<Signaller>,
}

impl Body {
    pub fn new(id: BodyId, atoms: Vec<AtomRecord>) -> Self {
        Self {
            id,
            atoms,
            signaller: None,
        }
    }

    /// Called once by the engine/molecule during registration. Calling
    /// this a second time is a logic error — a body may have exactly one
    /// signaller (spec.md §3's Molecule invariant) — and panics.
    pub fn register_signaller(&mut self, signaller: Signaller) {
        assert!(
            self.signaller.is_none(),
            "body {:?} already has a registered signaller",
            self.id
        );
        self.signaller = Some(signaller);
    }

    pub fn has_signaller(&self) -> bool {
        self.signaller.is_some()
    }

    fn signaller(&self) -> &Signaller {
        self.signaller
            .as_ref()
            .expect("body mutated before a signaller was registered")
    }

    /// Rigid translation. Only cross-partials involving this body need
    /// recomputation afterwards.
    pub fn translate(&mut self, delta: glam::DVec3) {
        for atom in self.atoms.iter_mut() {
            atom.position += delta;
        }
        self.signaller().modified_external();
    }

    /// Rigid rotation about `pivot`.
    pub fn rotate(&mut self, rotation: glam::DQuat, pivot: glam::DVec3) {
        for atom in self.atoms.iter_mut() {
            atom.position = pivot + rotation * (atom.position - pivot);
        }
        self.signaller().modified_external();
    }

    /// Adds an atom. The self-histogram must be recomputed from scratch.
    pub fn push_atom(&mut self, atom: AtomRecord) {
        self.atoms.push(atom);
        self.signaller().modified_internal();
    }

    /// Removes the atom at `index`. The self-histogram must be
    /// recomputed from scratch.
    pub fn remove_atom(&mut self, index: usize) -> AtomRecord {
        let atom = self.atoms.remove(index);
        self.signaller().modified_internal();
        atom
    }

    /// Reweights (e.g. occupancy change) the atom at `index`.
    pub fn reweight_atom(&mut self, index: usize, new_weight: f64) {
        self.atoms[index].weight = new_weight;
        self.signaller().modified_internal();
    }

    pub fn len(&self) -> usize {
        self.atoms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.atoms.is_empty()
    }
}

impl BodyProvider for Body {
    fn atoms(&self) -> &[AtomRecord] {
        &self.atoms
    }

    fn unique_id(&self) -> BodyId {
        self.id
    }
}
