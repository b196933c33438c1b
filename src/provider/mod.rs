//! Composite dependency container.
//!
//! This module contains the [`DiContainer`] type: a registry plus an optional
//! parent and a list of children. Resolution looks at the local registry
//! first and then walks up the parent chain.

use std::fmt;
use std::sync::{Arc, Weak};
use std::time::Instant;

use parking_lot::RwLock;

use crate::config::DiConfig;
use crate::descriptors::ServiceDescriptor;
use crate::error::{DiError, DiResult};
use crate::internal::ResolutionGuard;
use crate::key::Key;
use crate::lifetime::Lifetime;
use crate::observer::{DiObserver, Observers};
use crate::registration::{erase, AnyArc, Ctor, Entry, Registration, Registry};
use crate::scope::{ScopeContext, ScopeKind, ScopedKey, ScopedStore};
use crate::traits::ResolverCore;

pub mod context;
mod global;
mod handle;

pub use context::ResolverContext;
pub use handle::ReleaseHandle;

/// Dependency container with parent/child composition.
///
/// A `DiContainer` owns one registry. Registrations made on a child shadow
/// the parent's registrations for the same key; everything else falls
/// through to the parent, which is consulted at resolution time (a child
/// sees registrations its parent receives after the child was created).
///
/// # Thread Safety
///
/// `DiContainer` is a cheap handle (`Arc` inside). Registration and
/// resolution are safe from any number of threads; producers never run
/// while a registry lock is held, so they may register or resolve freely.
///
/// # Examples
///
/// ```
/// use weave_di::{DiContainer, Resolver};
/// use std::sync::Arc;
///
/// struct Database { url: String }
/// struct UserService { db: Arc<Database> }
///
/// let root = DiContainer::new();
/// root.register_instance(Database { url: "postgres://localhost".to_string() });
///
/// let child = root.create_child();
/// child.register_factory(|ctx| UserService {
///     db: ctx.resolve::<Database>().expect("registered on the parent"),
/// });
///
/// let users = child.resolve::<UserService>().unwrap();
/// assert_eq!(users.db.url, "postgres://localhost");
/// assert!(root.resolve::<UserService>().is_none());
/// ```
pub struct DiContainer {
    inner: Arc<ContainerInner>,
}

pub(crate) struct ContainerInner {
    registry: Registry,
    scoped: Arc<ScopedStore>,
    parent: Option<Weak<ContainerInner>>,
    children: RwLock<Vec<Weak<ContainerInner>>>,
    observers: Observers,
    config: DiConfig,
    scope_context: Arc<ScopeContext>,
}

impl DiContainer {
    /// Creates an empty root container with the default configuration.
    pub fn new() -> Self {
        Self::with_config(DiConfig::default())
    }

    /// Creates an empty root container using `config`.
    pub fn with_config(config: DiConfig) -> Self {
        Self::with_config_and_scope_context(config, ScopeContext::global())
    }

    /// Creates an empty root container reading scope ids from `scope_context`
    /// instead of the process-wide context.
    pub fn with_scope_context(scope_context: Arc<ScopeContext>) -> Self {
        Self::with_config_and_scope_context(DiConfig::default(), scope_context)
    }

    pub fn with_config_and_scope_context(config: DiConfig, scope_context: Arc<ScopeContext>) -> Self {
        Self::from_parts(config, scope_context, None)
    }

    /// Creates a container whose parent is `parent`.
    ///
    /// The child inherits the parent's configuration and scope context and
    /// is recorded in the parent's children list. The list does not keep the
    /// child alive: it is destroyed once its last handle is dropped.
    pub fn with_parent(parent: &DiContainer) -> Self {
        let child = Self::from_parts(
            parent.inner.config.clone(),
            parent.inner.scope_context.clone(),
            Some(Arc::downgrade(&parent.inner)),
        );
        {
            let mut children = parent.inner.children.write();
            children.retain(|c| c.strong_count() > 0);
            children.push(Arc::downgrade(&child.inner));
        }
        tracing::debug!(target: "weave_di", depth = child.depth(), "child container created");
        child
    }

    fn from_parts(config: DiConfig, scope_context: Arc<ScopeContext>, parent: Option<Weak<ContainerInner>>) -> Self {
        let scoped = Arc::new(ScopedStore::new());
        scope_context.bind(&scoped);
        Self {
            inner: Arc::new(ContainerInner {
                registry: Registry::new(),
                scoped,
                parent,
                children: RwLock::new(Vec::new()),
                observers: Observers::new(),
                config,
                scope_context,
            }),
        }
    }

    /// Creates a child container whose parent is `self`.
    pub fn create_child(&self) -> DiContainer {
        DiContainer::with_parent(self)
    }

    /// The parent container, if any and still alive.
    pub fn parent(&self) -> Option<DiContainer> {
        self.inner
            .parent
            .as_ref()
            .and_then(Weak::upgrade)
            .map(|inner| DiContainer { inner })
    }

    /// Live children created from this container, in creation order.
    pub fn children(&self) -> Vec<DiContainer> {
        self.inner
            .children
            .read()
            .iter()
            .filter_map(Weak::upgrade)
            .map(|inner| DiContainer { inner })
            .collect()
    }

    /// Number of children still alive.
    pub fn child_count(&self) -> usize {
        self.inner.children.read().iter().filter(|c| c.strong_count() > 0).count()
    }

    /// Forgets `child`. Returns false if it was not a child of `self`.
    pub fn remove_child(&self, child: &DiContainer) -> bool {
        let target = Arc::as_ptr(&child.inner);
        let mut removed = false;
        self.inner.children.write().retain(|c| {
            if c.as_ptr() == target {
                removed = true;
                return false;
            }
            c.strong_count() > 0
        });
        removed
    }

    /// Number of ancestors (0 for a root).
    pub fn depth(&self) -> usize {
        let mut depth = 0;
        let mut current = self.parent();
        while let Some(c) = current {
            depth += 1;
            current = c.parent();
        }
        depth
    }

    /// True when both handles refer to the same container.
    pub fn ptr_eq(&self, other: &DiContainer) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    pub fn config(&self) -> &DiConfig {
        &self.inner.config
    }

    pub fn scope_context(&self) -> &Arc<ScopeContext> {
        &self.inner.scope_context
    }

    /// Adds an observer notified of resolutions started on this container.
    pub fn add_observer(&self, observer: Arc<dyn DiObserver>) -> &Self {
        self.inner.observers.add(observer);
        self
    }

    // ===== Registration =====

    fn store(&self, key: Key, entry: Entry) -> ReleaseHandle {
        let lifetime = entry.lifetime();
        let generation = self.inner.registry.insert(key, entry);
        // A new producer invalidates instances cached from the old one
        self.inner.scoped.remove_key(&key);
        tracing::debug!(target: "weave_di", key = %key, ?lifetime, "registered");
        ReleaseHandle::new(Arc::downgrade(&self.inner), key, generation)
    }

    fn ctor<T, F>(key: Key, factory: F) -> Ctor
    where
        T: ?Sized + Send + Sync + 'static,
        F: Fn(&ResolverContext<'_>) -> DiResult<Arc<T>> + Send + Sync + 'static,
    {
        let service = key.display_name();
        Arc::new(move |ctx: &ResolverContext<'_>| match factory(ctx) {
            Ok(value) => Ok(erase(value)),
            Err(err @ (DiError::Circular(_) | DiError::DepthExceeded(_) | DiError::CreationFailed { .. })) => Err(err),
            Err(other) => Err(DiError::creation_failed(service, other)),
        })
    }

    /// Registers `value` as the instance of `T`.
    ///
    /// Every resolution of `T` returns a clone of the same `Arc`.
    pub fn register_instance<T>(&self, value: T) -> ReleaseHandle
    where
        T: Send + Sync + 'static,
    {
        self.register_arc(Arc::new(value))
    }

    /// Registers an already shared value, including trait objects.
    ///
    /// ```
    /// use weave_di::{DiContainer, Resolver};
    /// use std::sync::Arc;
    ///
    /// trait Clock: Send + Sync { fn now(&self) -> u64; }
    /// struct Fixed;
    /// impl Clock for Fixed { fn now(&self) -> u64 { 7 } }
    ///
    /// let container = DiContainer::new();
    /// container.register_arc::<dyn Clock>(Arc::new(Fixed));
    /// assert_eq!(container.resolve::<dyn Clock>().unwrap().now(), 7);
    /// ```
    pub fn register_arc<T>(&self, value: Arc<T>) -> ReleaseHandle
    where
        T: ?Sized + Send + Sync + 'static,
    {
        self.store(Key::of::<T>(), Entry::Instance(erase(value)))
    }

    pub fn register_named_instance<T>(&self, name: &'static str, value: T) -> ReleaseHandle
    where
        T: Send + Sync + 'static,
    {
        self.store(Key::named::<T>(name), Entry::Instance(erase(Arc::new(value))))
    }

    /// Registers a transient factory for `T`, invoked on every resolution.
    ///
    /// ```
    /// use weave_di::{DiContainer, Resolver};
    /// use std::sync::Arc;
    /// use std::sync::atomic::{AtomicU32, Ordering};
    ///
    /// let calls = Arc::new(AtomicU32::new(0));
    /// let counter = calls.clone();
    ///
    /// let container = DiContainer::new();
    /// container.register_factory(move |_| counter.fetch_add(1, Ordering::SeqCst) + 1);
    ///
    /// assert_eq!(*container.resolve::<u32>().unwrap(), 1);
    /// assert_eq!(*container.resolve::<u32>().unwrap(), 2);
    /// assert_eq!(calls.load(Ordering::SeqCst), 2);
    /// ```
    pub fn register_factory<T, F>(&self, factory: F) -> ReleaseHandle
    where
        T: Send + Sync + 'static,
        F: Fn(&ResolverContext<'_>) -> T + Send + Sync + 'static,
    {
        let key = Key::of::<T>();
        self.store(key, Entry::Transient(Self::ctor(key, move |ctx| Ok(Arc::new(factory(ctx))))))
    }

    /// Registers a transient factory producing shared values, e.g. trait objects.
    pub fn register_arc_factory<T, F>(&self, factory: F) -> ReleaseHandle
    where
        T: ?Sized + Send + Sync + 'static,
        F: Fn(&ResolverContext<'_>) -> Arc<T> + Send + Sync + 'static,
    {
        let key = Key::of::<T>();
        self.store(key, Entry::Transient(Self::ctor(key, move |ctx| Ok(factory(ctx)))))
    }

    /// Registers a fallible transient factory.
    ///
    /// Errors surface from [`try_resolve`](crate::Resolver::try_resolve) as
    /// [`DiError::CreationFailed`]; cycle errors pass through unchanged.
    pub fn register_try_factory<T, F>(&self, factory: F) -> ReleaseHandle
    where
        T: Send + Sync + 'static,
        F: Fn(&ResolverContext<'_>) -> DiResult<T> + Send + Sync + 'static,
    {
        let key = Key::of::<T>();
        self.store(key, Entry::Transient(Self::ctor(key, move |ctx| factory(ctx).map(Arc::new))))
    }

    /// Registers a factory evaluated on first resolution and cached afterwards.
    pub fn register_singleton_factory<T, F>(&self, factory: F) -> ReleaseHandle
    where
        T: Send + Sync + 'static,
        F: Fn(&ResolverContext<'_>) -> T + Send + Sync + 'static,
    {
        let key = Key::of::<T>();
        self.store(key, Entry::lazy_singleton(Self::ctor(key, move |ctx| Ok(Arc::new(factory(ctx))))))
    }

    /// Registers a factory evaluated once per active scope id of `kind`.
    ///
    /// ```
    /// use weave_di::{DiContainer, Resolver, ScopeContext, ScopeKind};
    /// use std::sync::Arc;
    ///
    /// struct RequestState;
    ///
    /// let scopes = Arc::new(ScopeContext::new());
    /// let container = DiContainer::with_scope_context(scopes.clone());
    /// container.register_scoped_factory(ScopeKind::Request, |_| RequestState);
    ///
    /// scopes.set_current(ScopeKind::Request, "r1");
    /// let a = container.resolve::<RequestState>().unwrap();
    /// let b = container.resolve::<RequestState>().unwrap();
    /// assert!(Arc::ptr_eq(&a, &b));
    ///
    /// scopes.set_current(ScopeKind::Request, "r2");
    /// let c = container.resolve::<RequestState>().unwrap();
    /// assert!(!Arc::ptr_eq(&a, &c));
    /// ```
    pub fn register_scoped_factory<T, F>(&self, kind: ScopeKind, factory: F) -> ReleaseHandle
    where
        T: Send + Sync + 'static,
        F: Fn(&ResolverContext<'_>) -> T + Send + Sync + 'static,
    {
        let key = Key::of::<T>();
        self.store(key, Entry::Scoped(kind, Self::ctor(key, move |ctx| Ok(Arc::new(factory(ctx))))))
    }

    pub fn register_named_factory<T, F>(&self, name: &'static str, factory: F) -> ReleaseHandle
    where
        T: Send + Sync + 'static,
        F: Fn(&ResolverContext<'_>) -> T + Send + Sync + 'static,
    {
        let key = Key::named::<T>(name);
        self.store(key, Entry::Transient(Self::ctor(key, move |ctx| Ok(Arc::new(factory(ctx))))))
    }

    /// Registers a producer under an explicit key and lifetime.
    ///
    /// The key must describe `T`; otherwise nothing is stored and
    /// [`DiError::TypeMismatch`] is returned.
    ///
    /// ```
    /// use weave_di::{DiContainer, DiError, Key, Lifetime, Resolver};
    /// use std::sync::Arc;
    ///
    /// let container = DiContainer::new();
    /// container
    ///     .register_with::<String, _>(Key::named::<String>("greeting"), Lifetime::Singleton, |_| {
    ///         Ok(Arc::new("hello".to_string()))
    ///     })
    ///     .unwrap();
    /// assert_eq!(&*container.resolve_named::<String>("greeting").unwrap(), "hello");
    ///
    /// let wrong = container.register_with::<u32, _>(Key::of::<String>(), Lifetime::Transient, |_| Ok(Arc::new(1)));
    /// assert!(matches!(wrong, Err(DiError::TypeMismatch(_))));
    /// ```
    pub fn register_with<T, F>(&self, key: Key, lifetime: Lifetime, factory: F) -> DiResult<ReleaseHandle>
    where
        T: ?Sized + Send + Sync + 'static,
        F: Fn(&ResolverContext<'_>) -> DiResult<Arc<T>> + Send + Sync + 'static,
    {
        if !key.is::<T>() {
            tracing::warn!(target: "weave_di", key = %key, requested = std::any::type_name::<T>(), "registration type mismatch");
            return Err(DiError::TypeMismatch(std::any::type_name::<T>()));
        }
        Ok(self.store(key, Entry::from_lifetime(lifetime, Self::ctor(key, factory))))
    }

    /// Stores an already produced value under `key`. Used by modules.
    pub(crate) fn store_instance(&self, key: Key, value: AnyArc) {
        self.inner.registry.register_instance(key, value);
        self.inner.scoped.remove_key(&key);
        tracing::debug!(target: "weave_di", key = %key, "instance registered");
    }

    // ===== Release =====

    /// Removes the local registration of `T`. Ancestors are untouched.
    pub fn release<T: ?Sized + 'static>(&self) -> bool {
        self.release_key(&Key::of::<T>())
    }

    pub fn release_named<T: ?Sized + 'static>(&self, name: &'static str) -> bool {
        self.release_key(&Key::named::<T>(name))
    }

    pub fn release_key(&self, key: &Key) -> bool {
        let removed = self.inner.registry.release(key);
        self.inner.scoped.remove_key(key);
        if removed {
            tracing::debug!(target: "weave_di", key = %key, "released");
        }
        removed
    }

    pub(crate) fn release_generation(&self, key: &Key, generation: u64) -> bool {
        let removed = self.inner.registry.release_if(key, generation);
        if removed {
            self.inner.scoped.remove_key(key);
            tracing::debug!(target: "weave_di", key = %key, "released by handle");
        }
        removed
    }

    /// Clears every local registration and cached scoped instance.
    pub fn remove_all(&self) {
        self.inner.registry.remove_all();
        self.inner.scoped.clear();
        tracing::debug!(target: "weave_di", "registry cleared");
    }

    // ===== Scopes =====

    /// Makes `id` the current scope of `kind` in this container's scope context.
    pub fn begin_scope(&self, kind: ScopeKind, id: impl Into<String>) {
        self.inner.scope_context.set_current(kind, id);
    }

    /// Ends the current scope of `kind`.
    ///
    /// Clears the current id and drops every instance cached for it in every
    /// container sharing this scope context, the whole tree included.
    /// Returns how many instances were dropped.
    pub fn end_scope(&self, kind: ScopeKind) -> usize {
        self.inner.scope_context.end(kind)
    }

    // ===== Introspection =====

    /// Number of local registrations.
    pub fn len(&self) -> usize {
        self.inner.registry.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.registry.is_empty()
    }

    /// Keys registered locally (not including ancestors).
    pub fn registered_keys(&self) -> Vec<Key> {
        self.inner.registry.keys()
    }

    pub fn descriptors(&self) -> Vec<ServiceDescriptor> {
        self.inner
            .registry
            .descriptors()
            .into_iter()
            .map(|(key, lifetime)| ServiceDescriptor::new(key, lifetime))
            .collect()
    }

    // ===== Resolution =====

    /// Finds the container owning `key`: self first, then each ancestor.
    fn lookup(&self, key: &Key) -> Option<(DiContainer, Registration)> {
        if let Some(reg) = self.inner.registry.get(key) {
            return Some((self.clone(), reg));
        }
        let mut current = self.parent();
        while let Some(container) = current {
            if let Some(reg) = container.inner.registry.get(key) {
                return Some((container, reg));
            }
            current = container.parent();
        }
        None
    }

    fn enter(&self, key: &Key) -> DiResult<ResolutionGuard> {
        let owner = Arc::as_ptr(&self.inner) as usize;
        ResolutionGuard::enter(owner, *key, self.inner.config.max_resolution_depth)
    }

    /// Produces the value of `registration`, owned by `self`.
    ///
    /// Producers run against the owning container, so an ancestor's factory
    /// never observes a descendant's overrides.
    fn materialize(&self, key: &Key, registration: Registration) -> DiResult<AnyArc> {
        let Registration { entry, generation } = registration;
        match entry {
            Entry::Instance(value) => Ok(value),
            Entry::Transient(ctor) => {
                let _guard = self.enter(key)?;
                ctor(&ResolverContext::new(self))
            }
            Entry::Singleton(lazy) => {
                if let Some(value) = lazy.cell.get() {
                    return Ok(value.clone());
                }
                // Guard first: re-entering the cell from its own initializer would block
                let _guard = self.enter(key)?;
                lazy.cell
                    .get_or_try_init(|| (lazy.ctor)(&ResolverContext::new(self)))
                    .cloned()
            }
            Entry::Scoped(kind, ctor) => {
                let scope = self.inner.scope_context.current_scope(kind).ok_or_else(|| {
                    DiError::Configuration(format!("no active {} scope while resolving {}", kind, key))
                })?;
                // Values are tagged with the registration's generation so one
                // produced by a replaced factory is never served for its successor
                self.inner.scoped.get_or_try_insert(ScopedKey::new(*key, scope), generation, || {
                    let _guard = self.enter(key)?;
                    ctor(&ResolverContext::new(self))
                })
            }
        }
    }

    fn resolve_any_impl(&self, key: &Key) -> DiResult<AnyArc> {
        tracing::trace!(target: "weave_di", key = %key, "resolving");
        let (owner, registration) = self
            .lookup(key)
            .ok_or(DiError::NotFound(key.display_name()))?;
        owner.materialize(key, registration)
    }
}

impl ResolverCore for DiContainer {
    fn resolve_any(&self, key: &Key) -> DiResult<AnyArc> {
        if !self.inner.observers.has_observers() {
            return self.resolve_any_impl(key);
        }

        let start = Instant::now();
        self.inner.observers.resolving(key);
        let result = self.resolve_any_impl(key);
        match &result {
            Ok(_) => self.inner.observers.resolved(key, start.elapsed()),
            Err(err) if !err.is_not_found() => self.inner.observers.failed(key, err),
            Err(_) => {}
        }
        result
    }

    fn contains_key(&self, key: &Key) -> bool {
        if self.inner.registry.contains(key) {
            return true;
        }
        let mut current = self.parent();
        while let Some(container) = current {
            if container.inner.registry.contains(key) {
                return true;
            }
            current = container.parent();
        }
        false
    }

    fn report_miss(&self, key: &Key) {
        tracing::warn!(target: "weave_di", key = %key, depth = self.depth(), "no registered dependency found");
        if self.inner.observers.has_observers() {
            self.inner.observers.missed(key);
        }
    }

    fn log_on_miss(&self) -> bool {
        self.inner.config.log_on_miss
    }
}

impl Clone for DiContainer {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl Default for DiContainer {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for DiContainer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DiContainer")
            .field("registrations", &self.len())
            .field("scoped_instances", &self.inner.scoped.len())
            .field("children", &self.child_count())
            .field("has_parent", &self.parent().is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Resolver;

    #[test]
    fn lookup_reports_owner() {
        let root = DiContainer::new();
        root.register_instance(1u8);
        let child = root.create_child();

        let (owner, _) = child.lookup(&Key::of::<u8>()).unwrap();
        assert!(owner.ptr_eq(&root));
        assert!(child.lookup(&Key::of::<u16>()).is_none());
    }

    #[test]
    fn ancestor_factory_runs_against_ancestor() {
        struct Greeting(String);

        let root = DiContainer::new();
        root.register_instance("root".to_string());
        root.register_factory(|ctx| Greeting(format!("hello {}", ctx.resolve::<String>().unwrap())));

        let child = root.create_child();
        child.register_instance("child".to_string());

        assert_eq!(child.resolve::<Greeting>().unwrap().0, "hello root");
    }

    #[test]
    fn depth_counts_ancestors() {
        let root = DiContainer::new();
        let child = root.create_child();
        let grandchild = child.create_child();
        assert_eq!(root.depth(), 0);
        assert_eq!(grandchild.depth(), 2);
        assert!(grandchild.parent().unwrap().ptr_eq(&child));
    }

    #[test]
    fn reregistration_drops_cached_scoped_instances() {
        let scopes = Arc::new(ScopeContext::new());
        let container = DiContainer::with_scope_context(scopes.clone());
        scopes.set_current(ScopeKind::Session, "s");

        container.register_scoped_factory(ScopeKind::Session, |_| 1u32);
        assert_eq!(*container.resolve::<u32>().unwrap(), 1);
        assert_eq!(container.inner.scoped.len(), 1);

        container.register_scoped_factory(ScopeKind::Session, |_| 2u32);
        assert_eq!(container.inner.scoped.len(), 0);
        assert_eq!(*container.resolve::<u32>().unwrap(), 2);
    }
}
