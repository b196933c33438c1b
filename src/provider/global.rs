//! Process-wide default container.
//!
//! Prefer passing a [`DiContainer`] explicitly. The shared slot exists for
//! code paths that have no way to receive one, such as [`Inject`](crate::Inject).

use std::sync::atomic::{AtomicBool, Ordering};

use once_cell::sync::Lazy;
use parking_lot::RwLock;

use crate::error::{DiError, DiResult};

use super::DiContainer;

static SHARED: Lazy<RwLock<DiContainer>> = Lazy::new(|| RwLock::new(DiContainer::new()));
static BOOTSTRAPPED: AtomicBool = AtomicBool::new(false);

impl DiContainer {
    /// Handle to the process-wide default container.
    ///
    /// Readers always observe either the old or the new container during a
    /// concurrent [`set_shared`](Self::set_shared), never a mix.
    pub fn shared() -> DiContainer {
        SHARED.read().clone()
    }

    /// Replaces the default container and returns the previous one.
    pub fn set_shared(container: DiContainer) -> DiContainer {
        let previous = std::mem::replace(&mut *SHARED.write(), container);
        tracing::debug!(target: "weave_di", "shared container replaced");
        previous
    }

    /// Installs a fresh default container configured by `configure` and
    /// marks the process as bootstrapped.
    ///
    /// ```
    /// use weave_di::{DiContainer, Resolver};
    ///
    /// let container = DiContainer::bootstrap(|c| {
    ///     c.register_instance("from bootstrap".to_string());
    /// });
    ///
    /// let shared = DiContainer::shared_bootstrapped().unwrap();
    /// assert!(shared.ptr_eq(&container));
    /// assert_eq!(&*shared.resolve::<String>().unwrap(), "from bootstrap");
    /// # DiContainer::reset_shared();
    /// ```
    pub fn bootstrap<F>(configure: F) -> DiContainer
    where
        F: FnOnce(&DiContainer),
    {
        let container = DiContainer::new();
        configure(&container);
        DiContainer::set_shared(container.clone());
        BOOTSTRAPPED.store(true, Ordering::Release);
        tracing::info!(target: "weave_di", registrations = container.len(), "container bootstrapped");
        container
    }

    /// The default container, or [`DiError::NotBootstrapped`] before
    /// [`bootstrap`](Self::bootstrap) ran.
    pub fn shared_bootstrapped() -> DiResult<DiContainer> {
        if !BOOTSTRAPPED.load(Ordering::Acquire) {
            return Err(DiError::NotBootstrapped);
        }
        Ok(DiContainer::shared())
    }

    pub fn is_bootstrapped() -> bool {
        BOOTSTRAPPED.load(Ordering::Acquire)
    }

    /// Installs an empty default container and clears the bootstrap flag.
    pub fn reset_shared() {
        BOOTSTRAPPED.store(false, Ordering::Release);
        DiContainer::set_shared(DiContainer::new());
    }
}
