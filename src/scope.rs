//! Scope identities and the process-wide scope context.
//!
//! Scoped registrations are keyed by `(Key, ScopeId)` rather than by `Key`
//! alone. The current id of each scope kind lives in a [`ScopeContext`];
//! cached scoped instances live in a [`ScopedStore`] that is kept apart from
//! the plain registry so the two namespaces can never collide.

use std::collections::hash_map::Entry as MapEntry;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Weak};

use once_cell::sync::Lazy;
use parking_lot::{Mutex, RwLock};

use crate::key::Key;
use crate::registration::AnyArc;

/// Classification of scoped lifetimes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScopeKind {
    Singleton,
    Screen,
    Session,
    Request,
}

impl ScopeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScopeKind::Singleton => "singleton",
            ScopeKind::Screen => "screen",
            ScopeKind::Session => "session",
            ScopeKind::Request => "request",
        }
    }
}

impl fmt::Display for ScopeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One concrete scope instance: its kind plus an instance id.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ScopeId {
    pub kind: ScopeKind,
    pub id: String,
}

impl ScopeId {
    pub fn new(kind: ScopeKind, id: impl Into<String>) -> Self {
        Self { kind, id: id.into() }
    }
}

impl fmt::Display for ScopeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind, self.id)
    }
}

/// Key of a scoped instance: the service identity qualified by a scope.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ScopedKey {
    pub key: Key,
    pub scope: ScopeId,
}

impl ScopedKey {
    pub fn new(key: Key, scope: ScopeId) -> Self {
        Self { key, scope }
    }
}

static GLOBAL_SCOPE_CONTEXT: Lazy<Arc<ScopeContext>> = Lazy::new(|| Arc::new(ScopeContext::new()));

/// Thread-safe storage of the current scope id per scope kind.
///
/// Every container created with a context binds its scoped cache to it.
/// Clearing a scope drops the instances cached for it in all of them, so a
/// reused id always starts from fresh instances.
///
/// # Examples
///
/// ```rust
/// use weave_di::{ScopeContext, ScopeKind};
///
/// let ctx = ScopeContext::new();
/// assert_eq!(ctx.current_id(ScopeKind::Request), None);
///
/// ctx.set_current(ScopeKind::Request, "req-1");
/// assert_eq!(ctx.current_id(ScopeKind::Request).as_deref(), Some("req-1"));
/// assert_eq!(ctx.current_id(ScopeKind::Session), None);
///
/// ctx.clear(ScopeKind::Request);
/// assert_eq!(ctx.current_id(ScopeKind::Request), None);
/// ```
#[derive(Debug, Default)]
pub struct ScopeContext {
    current: RwLock<HashMap<ScopeKind, String>>,
    stores: Mutex<Vec<Weak<ScopedStore>>>,
}

impl ScopeContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide context shared by containers that were not given
    /// their own.
    pub fn global() -> Arc<ScopeContext> {
        GLOBAL_SCOPE_CONTEXT.clone()
    }

    /// Makes `id` the current scope of `kind`, replacing any previous id.
    ///
    /// The previous id is only switched away from, not ended: its cached
    /// instances stay until the scope is cleared.
    pub fn set_current(&self, kind: ScopeKind, id: impl Into<String>) {
        let id = id.into();
        tracing::trace!(target: "weave_di", scope = %kind, id = %id, "scope entered");
        self.current.write().insert(kind, id);
    }

    /// Clears the current scope of `kind` and drops every instance cached
    /// for it. Returns the id that was active.
    pub fn clear(&self, kind: ScopeKind) -> Option<String> {
        self.end_scope(kind).map(|(id, _)| id)
    }

    pub fn current_id(&self, kind: ScopeKind) -> Option<String> {
        self.current.read().get(&kind).cloned()
    }

    pub fn current_scope(&self, kind: ScopeKind) -> Option<ScopeId> {
        self.current_id(kind).map(|id| ScopeId::new(kind, id))
    }

    /// Clears every scope kind, dropping their cached instances.
    pub fn clear_all(&self) {
        let ended: Vec<ScopeId> = self
            .current
            .write()
            .drain()
            .map(|(kind, id)| ScopeId::new(kind, id))
            .collect();
        for scope in &ended {
            self.evict(scope);
        }
    }

    /// Ends the current scope of `kind`. Returns how many instances were dropped.
    pub(crate) fn end(&self, kind: ScopeKind) -> usize {
        self.end_scope(kind).map_or(0, |(_, dropped)| dropped)
    }

    fn end_scope(&self, kind: ScopeKind) -> Option<(String, usize)> {
        let id = self.current.write().remove(&kind)?;
        let scope = ScopeId::new(kind, id);
        let dropped = self.evict(&scope);
        tracing::debug!(target: "weave_di", %scope, dropped, "scope ended");
        Some((scope.id, dropped))
    }

    /// Registers `store` so ending a scope also clears it.
    pub(crate) fn bind(&self, store: &Arc<ScopedStore>) {
        let mut stores = self.stores.lock();
        stores.retain(|s| s.strong_count() > 0);
        stores.push(Arc::downgrade(store));
    }

    fn evict(&self, scope: &ScopeId) -> usize {
        let live: Vec<Arc<ScopedStore>> = {
            let mut stores = self.stores.lock();
            stores.retain(|s| s.strong_count() > 0);
            stores.iter().filter_map(Weak::upgrade).collect()
        };
        live.iter().map(|store| store.clear_scope(scope)).sum()
    }
}

/// Cache of scoped instances, indexed by [`ScopedKey`].
///
/// Each value carries the generation of the registration that produced it.
/// A lookup under another generation misses, so a value built by a replaced
/// factory is never served for the new registration.
#[derive(Default)]
pub(crate) struct ScopedStore {
    cells: RwLock<HashMap<ScopedKey, (u64, AnyArc), ahash::RandomState>>,
}

impl fmt::Debug for ScopedStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScopedStore").field("len", &self.len()).finish()
    }
}

impl ScopedStore {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn get(&self, key: &ScopedKey, generation: u64) -> Option<AnyArc> {
        match self.cells.read().get(key) {
            Some((cached, value)) if *cached == generation => Some(value.clone()),
            _ => None,
        }
    }

    /// Returns the value cached for `key` under `generation`, creating it
    /// with `create` if absent.
    ///
    /// `create` runs without holding the lock. When two threads race, the
    /// first insert wins and both observe the same value. A value from an
    /// older generation is replaced; a slot already owned by a newer one is
    /// left alone and the fresh value is returned uncached.
    pub(crate) fn get_or_try_insert<E>(
        &self,
        key: ScopedKey,
        generation: u64,
        create: impl FnOnce() -> Result<AnyArc, E>,
    ) -> Result<AnyArc, E> {
        if let Some(existing) = self.get(&key, generation) {
            return Ok(existing);
        }

        let value = create()?;

        let mut cells = self.cells.write();
        let stale = match cells.entry(key) {
            MapEntry::Vacant(slot) => {
                slot.insert((generation, value.clone()));
                None
            }
            MapEntry::Occupied(mut slot) => {
                let cached = slot.get().0;
                if cached == generation {
                    return Ok(slot.get().1.clone());
                }
                if cached > generation {
                    return Ok(value);
                }
                Some(slot.insert((generation, value.clone())))
            }
        };
        drop(cells);
        drop(stale);
        Ok(value)
    }

    /// Drops every instance cached for `scope`. Returns how many were dropped.
    pub(crate) fn clear_scope(&self, scope: &ScopeId) -> usize {
        let removed: Vec<(u64, AnyArc)> = {
            let mut cells = self.cells.write();
            let stale: Vec<ScopedKey> = cells.keys().filter(|k| &k.scope == scope).cloned().collect();
            stale.iter().filter_map(|k| cells.remove(k)).collect()
        };
        removed.len()
    }

    /// Drops every scoped instance of `key`, in any scope.
    pub(crate) fn remove_key(&self, key: &Key) -> usize {
        let removed: Vec<(u64, AnyArc)> = {
            let mut cells = self.cells.write();
            let stale: Vec<ScopedKey> = cells.keys().filter(|k| &k.key == key).cloned().collect();
            stale.iter().filter_map(|k| cells.remove(k)).collect()
        };
        removed.len()
    }

    pub(crate) fn clear(&self) {
        let removed = std::mem::take(&mut *self.cells.write());
        drop(removed);
    }

    pub(crate) fn len(&self) -> usize {
        self.cells.read().len()
    }
}
