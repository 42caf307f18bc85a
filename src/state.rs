use std::sync::Arc;
use std::sync::Mutex;

use crate::body::BodyId;

/// External/internal/any dirty bits for one body, plus the combined flag
/// the engine actually scans.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BodyFlags {
    pub external: bool,
    pub internal: bool,
}

impl BodyFlags {
    pub fn any(&self) -> bool {
        self.external || self.internal
    }
}

#[derive(Debug, Default)]
struct StateManagerInner {
    flags: Vec<(BodyId, BodyFlags)>,
    hydration_dirty: bool,
}

impl StateManagerInner {
    fn index_of(&self, body: BodyId) -> Option<usize> {
        self.flags.iter().position(|(id, _)| *id == body)
    }
}

/// A fixed-size bit table: three flags per body (external, internal, any)
/// plus one global hydration flag. Owned by the engine; the only code
/// allowed to clear it is [`crate::engine::PartialHistogramEngine`].
///
/// Signallers hold a cloned `Arc` into the same inner table rather than a
/// pointer back to the engine or the `StateManager` itself — this is the
/// "arena + indices" resolution of the cyclic body↔engine observer
/// redesign flag: a `Signaller` is a plain `(Arc<Mutex<...>>, BodyId)`
/// value, not a back-reference.
#[derive(Debug, Clone)]
pub struct StateManager {
    inner: Arc<Mutex<StateManagerInner>>,
}

impl Default for StateManager {
    fn default() -> Self {
        Self::new()
    }
}

impl StateManager {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(StateManagerInner::default())),
        }
    }

    /// Registers a body and returns a [`Signaller`] bound to it. Calling
    /// this twice for the same id is a logic error (it would let two
    /// signallers claim authority over the same flags) and panics.
    pub fn register(&self, body: BodyId) -> Signaller {
        let mut inner = self.inner.lock().unwrap();
        assert!(
            inner.index_of(body).is_none(),
            "body {body:?} already has a registered signaller"
        );
        inner.flags.push((body, BodyFlags::default()));
        Signaller {
            inner: Arc::clone(&self.inner),
            body,
        }
    }

    pub fn registered_body_count(&self) -> usize {
        self.inner.lock().unwrap().flags.len()
    }

    pub fn hydration_signaller(&self) -> HydrationSignaller {
        HydrationSignaller {
            inner: Arc::clone(&self.inner),
        }
    }

    pub fn is_hydration_dirty(&self) -> bool {
        self.inner.lock().unwrap().hydration_dirty
    }

    pub fn flags_for(&self, body: BodyId) -> BodyFlags {
        let inner = self.inner.lock().unwrap();
        inner
            .index_of(body)
            .map(|i| inner.flags[i].1)
            .unwrap_or_default()
    }

    /// All bodies with at least one dirty flag, in registration order.
    pub fn dirty_bodies(&self) -> Vec<(BodyId, BodyFlags)> {
        self.inner
            .lock()
            .unwrap()
            .flags
            .iter()
            .filter(|(_, f)| f.any())
            .copied()
            .collect()
    }

    pub fn reset_to_false(&self) {
        let mut inner = self.inner.lock().unwrap();
        for (_, flags) in inner.flags.iter_mut() {
            *flags = BodyFlags::default();
        }
        inner.hydration_dirty = false;
    }
}

/// Capability a [`crate::body::Body`] uses to report its own mutations.
/// `Copy`-able, holds no back-pointer to the engine — only a shared handle
/// into the state table and the id it is allowed to flip bits for.
#[derive(Debug, Clone)]
pub struct Signaller {
    inner: Arc<Mutex<StateManagerInner>>,
    body: BodyId,
}

impl Signaller {
    /// Atoms added/removed/reweighted: the body's self-histogram must be
    /// recomputed from scratch.
    pub fn modified_internal(&self) {
        let mut inner = self.inner.lock().unwrap();
        let idx = inner
            .index_of(self.body)
            .expect("signaller outlived its StateManager registration");
        inner.flags[idx].1.internal = true;
    }

    /// Rigid translation/rotation: only cross-histograms with other bodies
    /// and with hydration must be recomputed.
    pub fn modified_external(&self) {
        let mut inner = self.inner.lock().unwrap();
        let idx = inner
            .index_of(self.body)
            .expect("signaller outlived its StateManager registration");
        inner.flags[idx].1.external = true;
    }
}

/// The hydration layer's equivalent of a [`Signaller`] — hydration has no
/// body id, so it gets a dedicated flag rather than sharing the per-body
/// table.
#[derive(Debug, Clone)]
pub struct HydrationSignaller {
    inner: Arc<Mutex<StateManagerInner>>,
}

impl HydrationSignaller {
    pub fn modified(&self) {
        self.inner.lock().unwrap().hydration_dirty = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use generational_arena::Arena;

    #[test]
    fn fresh_registration_is_clean() {
        let mgr = StateManager::new();
        let mut arena: Arena<()> = Arena::new();
        let id = arena.insert(());
        let signaller = mgr.register(id);
        assert!(!mgr.flags_for(id).any());
        signaller.modified_internal();
        assert!(mgr.flags_for(id).internal);
        assert!(!mgr.flags_for(id).external);
        mgr.reset_to_false();
        assert!(!mgr.flags_for(id).any());
    }

    #[test]
    fn hydration_flag_is_distinct_from_body_flags() {
        let mgr = StateManager::new();
        let mut arena: Arena<()> = Arena::new();
        let id = arena.insert(());
        let _ = mgr.register(id);
        let hydration = mgr.hydration_signaller();
        hydration.modified();
        assert!(mgr.is_hydration_dirty());
        assert!(!mgr.flags_for(id).any());
    }

    #[test]
    #[should_panic]
    fn double_registration_panics() {
        let mgr = StateManager::new();
        let mut arena: Arena<()> = Arena::new();
        let id = arena.insert(());
        let _a = mgr.register(id);
        let _b = mgr.register(id);
    }
}
