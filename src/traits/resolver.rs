//! Resolver traits for service resolution.

use std::any::Any;
use std::sync::Arc;

use crate::error::{DiError, DiResult};
use crate::key::Key;

/// Core resolver trait for object-safe service resolution.
///
/// This trait provides the type-erased resolution primitive. Most users
/// should use the [`Resolver`] trait instead, which provides ergonomic
/// generic methods built on top of this one.
pub trait ResolverCore: Send + Sync {
    /// Resolves `key` against this resolver and its ancestors.
    ///
    /// # Returns
    ///
    /// * `Ok(value)` - an `Arc<dyn Any>` wrapping the registered `Arc<T>`
    /// * `Err(DiError)` - not found, circular, creation failed, ...
    fn resolve_any(&self, key: &Key) -> DiResult<Arc<dyn Any + Send + Sync>>;

    /// True when `key` is registered here or on an ancestor.
    fn contains_key(&self, key: &Key) -> bool;

    /// Emits the miss diagnostic for `key`.
    fn report_miss(&self, key: &Key);

    /// Whether plain [`Resolver::resolve`] reports misses.
    fn log_on_miss(&self) -> bool;
}

fn downcast<T>(any: Arc<dyn Any + Send + Sync>, key: &Key) -> DiResult<Arc<T>>
where
    T: ?Sized + Send + Sync + 'static,
{
    any.downcast_ref::<Arc<T>>()
        .cloned()
        .ok_or(DiError::TypeMismatch(key.display_name()))
}

fn resolve_optional<R, T>(resolver: &R, key: Key, log_on_miss: bool) -> Option<Arc<T>>
where
    R: ResolverCore + ?Sized,
    T: ?Sized + Send + Sync + 'static,
{
    match resolver.resolve_any(&key).and_then(|any| downcast::<T>(any, &key)) {
        Ok(value) => Some(value),
        Err(DiError::NotFound(_)) => {
            if log_on_miss {
                resolver.report_miss(&key);
            } else {
                tracing::debug!(target: "weave_di", key = %key, "optional dependency absent");
            }
            None
        }
        Err(err) => {
            tracing::error!(target: "weave_di", key = %key, error = %err, "resolution failed");
            None
        }
    }
}

/// High-level resolver interface with generic methods for type-safe service resolution.
///
/// Both [`DiContainer`](crate::DiContainer) and
/// [`ResolverContext`](crate::ResolverContext) implement this trait, so
/// factories resolve their own dependencies with the same calls as
/// application code.
///
/// # Examples
///
/// ```
/// use weave_di::{DiContainer, Resolver};
/// use std::sync::Arc;
///
/// trait Logger: Send + Sync {
///     fn log(&self, msg: &str) -> String;
/// }
///
/// struct ConsoleLogger;
/// impl Logger for ConsoleLogger {
///     fn log(&self, msg: &str) -> String { format!("LOG: {}", msg) }
/// }
///
/// let container = DiContainer::new();
/// container.register_instance(42usize);
/// container.register_arc::<dyn Logger>(Arc::new(ConsoleLogger));
///
/// assert_eq!(*container.resolve::<usize>().unwrap(), 42);
/// let logger = container.resolve::<dyn Logger>().unwrap();
/// assert_eq!(logger.log("hi"), "LOG: hi");
/// assert!(container.resolve::<String>().is_none());
/// ```
pub trait Resolver: ResolverCore {
    /// Resolves `T`, reporting misses according to the resolver's config.
    fn resolve<T>(&self) -> Option<Arc<T>>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        resolve_optional(self, Key::of::<T>(), self.log_on_miss())
    }

    /// Resolves `T` with an explicit miss-reporting flag.
    fn resolve_with<T>(&self, log_on_miss: bool) -> Option<Arc<T>>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        resolve_optional(self, Key::of::<T>(), log_on_miss)
    }

    /// Resolves the registration of `T` named `name`.
    fn resolve_named<T>(&self, name: &'static str) -> Option<Arc<T>>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        resolve_optional(self, Key::named::<T>(name), self.log_on_miss())
    }

    /// Resolves `T`, falling back to `default` without any miss diagnostic.
    fn resolve_or_default<T>(&self, default: Arc<T>) -> Arc<T>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        resolve_optional(self, Key::of::<T>(), false).unwrap_or(default)
    }

    /// Resolves `T`, building the fallback lazily.
    fn resolve_or_else<T, F>(&self, fallback: F) -> Arc<T>
    where
        T: ?Sized + Send + Sync + 'static,
        F: FnOnce() -> Arc<T>,
    {
        resolve_optional(self, Key::of::<T>(), false).unwrap_or_else(fallback)
    }

    /// Resolves `T`, surfacing every failure (including a miss) as an error.
    ///
    /// # Examples
    ///
    /// ```
    /// use weave_di::{DiContainer, DiError, Resolver};
    ///
    /// let container = DiContainer::new();
    /// container.register_instance("configuration".to_string());
    ///
    /// assert_eq!(&*container.try_resolve::<String>().unwrap(), "configuration");
    /// assert!(matches!(container.try_resolve::<u8>(), Err(DiError::NotFound(_))));
    /// ```
    fn try_resolve<T>(&self) -> DiResult<Arc<T>>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        self.try_resolve_key::<T>(Key::of::<T>())
    }

    fn try_resolve_named<T>(&self, name: &'static str) -> DiResult<Arc<T>>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        self.try_resolve_key::<T>(Key::named::<T>(name))
    }

    /// Resolves an explicit key as `T`.
    ///
    /// A key that describes another shape fails with
    /// [`DiError::TypeMismatch`] instead of trapping.
    fn try_resolve_key<T>(&self, key: Key) -> DiResult<Arc<T>>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        if !key.is::<T>() {
            return Err(DiError::TypeMismatch(std::any::type_name::<T>()));
        }
        let any = self.resolve_any(&key)?;
        downcast::<T>(any, &key)
    }

    /// True when `T` is registered here or on an ancestor.
    fn is_registered<T>(&self) -> bool
    where
        T: ?Sized + 'static,
    {
        self.contains_key(&Key::of::<T>())
    }
}

impl<R: ResolverCore + ?Sized> Resolver for R {}
