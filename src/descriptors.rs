//! Service descriptors for introspection and diagnostics.

use crate::key::Key;
use crate::lifetime::Lifetime;

/// Service descriptor for introspection and diagnostics
///
/// Describes one registration held by a container's local registry. Useful
/// for startup health checks and for debugging which container in a
/// hierarchy actually owns a registration.
///
/// # Examples
///
/// ```rust
/// use weave_di::{DiContainer, Lifetime, ScopeKind};
///
/// struct Database { url: String }
/// struct Repository { name: String }
///
/// let container = DiContainer::new();
/// container.register_instance(Database { url: "postgres://localhost".to_string() });
/// container.register_scoped_factory(ScopeKind::Request, |_| Repository { name: "UserRepo".to_string() });
/// container.register_named_instance("config_value", 42u32);
///
/// let descriptors = container.descriptors();
/// assert_eq!(descriptors.len(), 3);
///
/// let db = descriptors.iter().find(|d| d.type_name().contains("Database")).unwrap();
/// assert_eq!(db.lifetime, Lifetime::Singleton);
/// assert!(!db.is_named());
///
/// let config = descriptors.iter().find(|d| d.service_name() == Some("config_value")).unwrap();
/// assert_eq!(config.type_name(), "u32");
///
/// let scoped = descriptors.iter().filter(|d| matches!(d.lifetime, Lifetime::Scoped(_))).count();
/// assert_eq!(scoped, 1);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceDescriptor {
    /// The service key (type/trait name with optional service name)
    pub key: Key,
    /// Service lifetime
    pub lifetime: Lifetime,
}

impl ServiceDescriptor {
    pub(crate) fn new(key: Key, lifetime: Lifetime) -> Self {
        Self { key, lifetime }
    }

    /// Get the type or trait name
    pub fn type_name(&self) -> &'static str {
        self.key.display_name()
    }

    /// Get the service name (for named services)
    pub fn service_name(&self) -> Option<&'static str> {
        self.key.service_name()
    }

    /// Check if this is a named service
    pub fn is_named(&self) -> bool {
        self.key.service_name().is_some()
    }
}
