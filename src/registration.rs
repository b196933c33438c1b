//! Service registration types and the concurrent registry.

use std::any::Any;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use once_cell::sync::OnceCell;
use parking_lot::RwLock;

use crate::error::DiResult;
use crate::key::Key;
use crate::lifetime::Lifetime;
use crate::provider::ResolverContext;
use crate::scope::ScopeKind;

// Type-erased value. The concrete type inside is always `Arc<T>` for the
// registered shape `T`, so sized types and `dyn Trait` share one path.
pub(crate) type AnyArc = Arc<dyn Any + Send + Sync>;

pub(crate) type Ctor = Arc<dyn for<'a> Fn(&ResolverContext<'a>) -> DiResult<AnyArc> + Send + Sync>;

#[inline]
pub(crate) fn erase<T: ?Sized + Send + Sync + 'static>(value: Arc<T>) -> AnyArc {
    Arc::new(value)
}

/// Factory evaluated once, on first resolution.
pub(crate) struct LazySingleton {
    pub(crate) ctor: Ctor,
    pub(crate) cell: OnceCell<AnyArc>,
}

/// A stored registration.
#[derive(Clone)]
pub(crate) enum Entry {
    Instance(AnyArc),
    Transient(Ctor),
    Singleton(Arc<LazySingleton>),
    Scoped(ScopeKind, Ctor),
}

impl Entry {
    pub(crate) fn lazy_singleton(ctor: Ctor) -> Self {
        Entry::Singleton(Arc::new(LazySingleton { ctor, cell: OnceCell::new() }))
    }

    pub(crate) fn from_lifetime(lifetime: Lifetime, ctor: Ctor) -> Self {
        match lifetime {
            Lifetime::Singleton => Entry::lazy_singleton(ctor),
            Lifetime::Transient => Entry::Transient(ctor),
            Lifetime::Scoped(kind) => Entry::Scoped(kind, ctor),
        }
    }

    pub(crate) fn lifetime(&self) -> Lifetime {
        match self {
            Entry::Instance(_) | Entry::Singleton(_) => Lifetime::Singleton,
            Entry::Transient(_) => Lifetime::Transient,
            Entry::Scoped(kind, _) => Lifetime::Scoped(*kind),
        }
    }
}

/// An entry together with the generation it was stored under.
#[derive(Clone)]
pub(crate) struct Registration {
    pub(crate) entry: Entry,
    pub(crate) generation: u64,
}

static NEXT_GENERATION: AtomicU64 = AtomicU64::new(1);

/// Concurrent `Key -> Registration` map.
///
/// Readers share the lock, writers are serialized against readers and each
/// other. Lookups clone the registration out so no producer ever runs while
/// the lock is held.
#[derive(Default)]
pub(crate) struct Registry {
    entries: RwLock<HashMap<Key, Registration, ahash::RandomState>>,
}

impl Registry {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Stores `entry` under `key`, replacing any previous registration.
    /// Returns the generation assigned to the new registration.
    pub(crate) fn insert(&self, key: Key, entry: Entry) -> u64 {
        let generation = NEXT_GENERATION.fetch_add(1, Ordering::Relaxed);
        let replaced = self.entries.write().insert(key, Registration { entry, generation });
        if replaced.is_some() {
            tracing::debug!(target: "weave_di", key = %key, "registration replaced");
        }
        generation
    }

    pub(crate) fn register_instance(&self, key: Key, value: AnyArc) -> u64 {
        self.insert(key, Entry::Instance(value))
    }

    #[inline]
    pub(crate) fn get(&self, key: &Key) -> Option<Registration> {
        self.entries.read().get(key).cloned()
    }

    #[inline]
    pub(crate) fn contains(&self, key: &Key) -> bool {
        self.entries.read().contains_key(key)
    }

    pub(crate) fn release(&self, key: &Key) -> bool {
        self.entries.write().remove(key).is_some()
    }

    /// Removes the registration for `key` only if it is still the one stored
    /// under `generation`.
    pub(crate) fn release_if(&self, key: &Key, generation: u64) -> bool {
        let mut entries = self.entries.write();
        match entries.get(key) {
            Some(reg) if reg.generation == generation => {
                entries.remove(key);
                true
            }
            _ => false,
        }
    }

    pub(crate) fn remove_all(&self) {
        self.entries.write().clear();
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    pub(crate) fn keys(&self) -> Vec<Key> {
        self.entries.read().keys().copied().collect()
    }

    pub(crate) fn descriptors(&self) -> Vec<(Key, Lifetime)> {
        self.entries
            .read()
            .iter()
            .map(|(k, r)| (*k, r.entry.lifetime()))
            .collect()
    }
}
