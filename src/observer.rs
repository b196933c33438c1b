//! Diagnostic observers for dependency injection traceability.
//!
//! Observers receive resolution events from the container they are added
//! to: start, success, miss and failure.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;

use crate::error::DiError;
use crate::key::Key;

/// Observer trait for dependency injection resolution events.
///
/// # Performance
///
/// Observer calls are made synchronously during resolution. Keep
/// implementations lightweight; queue expensive work elsewhere.
///
/// # Examples
///
/// ```
/// use weave_di::{DiContainer, DiObserver, Key, Resolver};
/// use std::sync::{Arc, Mutex};
/// use std::time::Duration;
///
/// #[derive(Default)]
/// struct MissRecorder {
///     misses: Mutex<Vec<&'static str>>,
/// }
///
/// impl DiObserver for MissRecorder {
///     fn resolving(&self, _key: &Key) {}
///     fn resolved(&self, _key: &Key, _duration: Duration) {}
///     fn missed(&self, key: &Key) {
///         self.misses.lock().unwrap().push(key.display_name());
///     }
/// }
///
/// let recorder = Arc::new(MissRecorder::default());
/// let container = DiContainer::new();
/// container.add_observer(recorder.clone());
///
/// assert!(container.resolve::<u64>().is_none());
/// assert_eq!(recorder.misses.lock().unwrap().as_slice(), &["u64"]);
/// ```
pub trait DiObserver: Send + Sync {
    /// Called before a service is resolved.
    fn resolving(&self, key: &Key);

    /// Called when a service was resolved, with the elapsed time.
    fn resolved(&self, key: &Key, duration: Duration);

    /// Called when nothing is registered for `key` and miss reporting is on.
    fn missed(&self, _key: &Key) {}

    /// Called when resolution of `key` failed for a reason other than a miss.
    fn failed(&self, _key: &Key, _error: &DiError) {}
}

/// Container for registered observers.
///
/// Designed to have minimal overhead when no observers are registered.
#[derive(Default)]
pub(crate) struct Observers {
    observers: RwLock<Vec<Arc<dyn DiObserver>>>,
    any: AtomicBool,
}

impl Observers {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn add(&self, observer: Arc<dyn DiObserver>) {
        self.observers.write().push(observer);
        self.any.store(true, Ordering::Release);
    }

    /// Returns true if any observers are registered.
    #[inline]
    pub(crate) fn has_observers(&self) -> bool {
        self.any.load(Ordering::Acquire)
    }

    #[inline]
    pub(crate) fn resolving(&self, key: &Key) {
        for observer in self.observers.read().iter() {
            observer.resolving(key);
        }
    }

    #[inline]
    pub(crate) fn resolved(&self, key: &Key, duration: Duration) {
        for observer in self.observers.read().iter() {
            observer.resolved(key, duration);
        }
    }

    pub(crate) fn missed(&self, key: &Key) {
        for observer in self.observers.read().iter() {
            observer.missed(key);
        }
    }

    pub(crate) fn failed(&self, key: &Key, error: &DiError) {
        for observer in self.observers.read().iter() {
            observer.failed(key, error);
        }
    }
}

/// Built-in observer that forwards events to `tracing`.
///
/// Resolution starts and completions go to `trace`, misses to `warn`,
/// failures to `error`, all under the `weave_di` target and tagged with the
/// observer's label.
///
/// # Examples
///
/// ```
/// use weave_di::{DiContainer, LoggingObserver};
/// use std::sync::Arc;
///
/// let container = DiContainer::new();
/// container.add_observer(Arc::new(LoggingObserver::with_label("app")));
/// ```
pub struct LoggingObserver {
    label: String,
}

impl LoggingObserver {
    pub fn new() -> Self {
        Self { label: "weave-di".to_string() }
    }

    pub fn with_label(label: impl Into<String>) -> Self {
        Self { label: label.into() }
    }
}

impl Default for LoggingObserver {
    fn default() -> Self {
        Self::new()
    }
}

impl DiObserver for LoggingObserver {
    fn resolving(&self, key: &Key) {
        tracing::trace!(target: "weave_di", label = %self.label, key = %key, "resolving");
    }

    fn resolved(&self, key: &Key, duration: Duration) {
        tracing::trace!(target: "weave_di", label = %self.label, key = %key, ?duration, "resolved");
    }

    fn missed(&self, key: &Key) {
        tracing::warn!(target: "weave_di", label = %self.label, key = %key, "no registration found");
    }

    fn failed(&self, key: &Key, error: &DiError) {
        tracing::error!(target: "weave_di", label = %self.label, key = %key, %error, "resolution failed");
    }
}
