//! Lazily resolved dependency fields.

use std::fmt;
use std::sync::Arc;

use once_cell::sync::OnceCell;

use crate::error::DiResult;
use crate::provider::DiContainer;
use crate::traits::Resolver;

/// A dependency resolved on first access and kept afterwards.
///
/// `Inject::new()` resolves from [`DiContainer::shared`] as it is at the
/// time of the first access; `Inject::from_container` pins a container.
/// Failed lookups are not cached, so a later registration is picked up.
///
/// # Examples
///
/// ```
/// use weave_di::{DiContainer, Inject};
///
/// struct Mailer { host: String }
///
/// struct Signup {
///     mailer: Inject<Mailer>,
/// }
///
/// let container = DiContainer::new();
/// let signup = Signup { mailer: Inject::from_container(&container) };
/// assert!(signup.mailer.get().is_none());
///
/// container.register_instance(Mailer { host: "smtp.local".to_string() });
/// assert_eq!(signup.mailer.get().unwrap().host, "smtp.local");
/// ```
pub struct Inject<T: ?Sized + Send + Sync + 'static> {
    container: Option<DiContainer>,
    value: OnceCell<Arc<T>>,
}

impl<T: ?Sized + Send + Sync + 'static> Inject<T> {
    /// Accessor backed by the process-wide default container.
    pub fn new() -> Self {
        Self {
            container: None,
            value: OnceCell::new(),
        }
    }

    pub fn from_container(container: &DiContainer) -> Self {
        Self {
            container: Some(container.clone()),
            value: OnceCell::new(),
        }
    }

    fn source(&self) -> DiContainer {
        self.container.clone().unwrap_or_else(DiContainer::shared)
    }

    /// The dependency, resolving it on first use. Misses are reported like
    /// any [`Resolver::resolve`] miss.
    pub fn get(&self) -> Option<Arc<T>> {
        if let Some(value) = self.value.get() {
            return Some(value.clone());
        }
        let resolved = self.source().resolve::<T>()?;
        Some(self.value.get_or_init(|| resolved).clone())
    }

    /// Like [`get`](Self::get), surfacing the reason of a failure.
    pub fn try_get(&self) -> DiResult<Arc<T>> {
        self.value
            .get_or_try_init(|| self.source().try_resolve::<T>())
            .cloned()
    }

    pub fn is_resolved(&self) -> bool {
        self.value.get().is_some()
    }
}

impl<T: ?Sized + Send + Sync + 'static> Default for Inject<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: ?Sized + Send + Sync + 'static> fmt::Debug for Inject<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Inject")
            .field("type", &std::any::type_name::<T>())
            .field("resolved", &self.is_resolved())
            .finish()
    }
}
