use std::fmt;
use std::sync::Weak;

use crate::key::Key;

use super::{ContainerInner, DiContainer};

/// Token returned by every registration call.
///
/// Releasing through the handle removes the registration only if it is
/// still the one the handle was issued for; a later registration of the
/// same key is left alone. The handle does not keep the container alive.
///
/// ```
/// use weave_di::{DiContainer, Resolver};
///
/// let container = DiContainer::new();
/// let first = container.register_instance(1u32);
/// let second = container.register_instance(2u32);
///
/// assert!(!first.release());
/// assert_eq!(*container.resolve::<u32>().unwrap(), 2);
/// assert!(second.release());
/// assert!(!container.is_registered::<u32>());
/// ```
pub struct ReleaseHandle {
    container: Weak<ContainerInner>,
    key: Key,
    generation: u64,
}

impl ReleaseHandle {
    pub(crate) fn new(container: Weak<ContainerInner>, key: Key, generation: u64) -> Self {
        Self { container, key, generation }
    }

    pub fn key(&self) -> &Key {
        &self.key
    }

    /// Removes the registration this handle was issued for.
    ///
    /// Returns false when the container is gone, or when the key has since
    /// been re-registered or released.
    pub fn release(self) -> bool {
        match self.container.upgrade() {
            Some(inner) => DiContainer { inner }.release_generation(&self.key, self.generation),
            None => false,
        }
    }
}

impl fmt::Debug for ReleaseHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReleaseHandle")
            .field("key", &self.key)
            .field("generation", &self.generation)
            .finish()
    }
}
