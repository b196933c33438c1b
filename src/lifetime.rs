//! Service lifetime definitions.

use crate::scope::ScopeKind;

/// Service lifetimes controlling instance caching behavior
///
/// # Examples
///
/// ```rust
/// use weave_di::{DiContainer, Resolver, ScopeKind};
/// use std::sync::Arc;
///
/// struct Database { url: String }
/// struct RequestModel { id: u32 }
///
/// let container = DiContainer::new();
///
/// // Singleton: one instance for the container's lifetime
/// container.register_instance(Database { url: "postgres://localhost".to_string() });
///
/// // Transient: new instance every time
/// container.register_factory(|_| RequestModel { id: 7 });
///
/// let db1 = container.resolve::<Database>().unwrap();
/// let db2 = container.resolve::<Database>().unwrap();
/// assert!(Arc::ptr_eq(&db1, &db2));
///
/// let m1 = container.resolve::<RequestModel>().unwrap();
/// let m2 = container.resolve::<RequestModel>().unwrap();
/// assert!(!Arc::ptr_eq(&m1, &m2));
/// # let _ = ScopeKind::Request;
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Lifetime {
    /// Single instance per registration.
    ///
    /// Either a value registered up front, or a factory evaluated on first
    /// resolution and cached in the registration afterwards.
    Singleton,
    /// New instance per resolution, never cached.
    Transient,
    /// Single instance per active scope id of the given kind.
    ///
    /// The current id is read from the container's
    /// [`ScopeContext`](crate::ScopeContext) at resolution time, so two
    /// concurrently active request scopes never share an instance.
    Scoped(ScopeKind),
}

impl Lifetime {
    /// Whether values of this lifetime are reused across resolutions.
    pub fn is_cached(&self) -> bool {
        !matches!(self, Lifetime::Transient)
    }
}
