//! Service module system for modular registration.
//!
//! A [`Module`] pairs a key with a one-shot producer. Modules are collected
//! into a [`Container`](crate::Container) and registered in parallel when the
//! container is built.

use std::fmt;
use std::sync::Arc;

use crate::error::{DiError, DiResult};
use crate::key::Key;
use crate::provider::{DiContainer, ResolverContext};
use crate::registration::{erase, AnyArc};

type Producer = Box<dyn for<'a> FnOnce(&ResolverContext<'a>) -> DiResult<AnyArc> + Send>;

/// A single deferred registration.
///
/// The producer is evaluated exactly once, when the module is registered,
/// and its value is stored as an instance: every later resolution of the
/// key returns the same `Arc`.
///
/// # Example
///
/// ```rust
/// use weave_di::{DiContainer, Module, Resolver};
///
/// struct Settings { retries: u32 }
///
/// let container = DiContainer::new();
/// Module::new(|_| Settings { retries: 3 }).register(&container).unwrap();
///
/// assert_eq!(container.resolve::<Settings>().unwrap().retries, 3);
/// ```
pub struct Module {
    key: Key,
    producer: Producer,
}

impl Module {
    /// Module producing a `T`. The producer may resolve prerequisites from
    /// the target container.
    pub fn new<T, F>(producer: F) -> Self
    where
        T: Send + Sync + 'static,
        F: FnOnce(&ResolverContext<'_>) -> T + Send + 'static,
    {
        Self::with_key(Key::of::<T>(), move |ctx| Ok(Arc::new(producer(ctx))))
    }

    /// Module registering an existing shared value, e.g. a trait object.
    pub fn from_arc<T>(value: Arc<T>) -> Self
    where
        T: ?Sized + Send + Sync + 'static,
    {
        Self::with_key(Key::of::<T>(), move |_| Ok(value))
    }

    /// Module whose producer may fail. The failure is reported by the build.
    pub fn try_new<T, F>(producer: F) -> Self
    where
        T: Send + Sync + 'static,
        F: FnOnce(&ResolverContext<'_>) -> DiResult<T> + Send + 'static,
    {
        Self::with_key(Key::of::<T>(), move |ctx| producer(ctx).map(Arc::new))
    }

    pub fn named<T, F>(name: &'static str, producer: F) -> Self
    where
        T: Send + Sync + 'static,
        F: FnOnce(&ResolverContext<'_>) -> T + Send + 'static,
    {
        Self::with_key(Key::named::<T>(name), move |ctx| Ok(Arc::new(producer(ctx))))
    }

    fn with_key<T, F>(key: Key, producer: F) -> Self
    where
        T: ?Sized + Send + Sync + 'static,
        F: FnOnce(&ResolverContext<'_>) -> DiResult<Arc<T>> + Send + 'static,
    {
        Self {
            key,
            producer: Box::new(move |ctx: &ResolverContext<'_>| producer(ctx).map(erase)),
        }
    }

    pub fn key(&self) -> &Key {
        &self.key
    }

    /// Evaluates the producer against `target` and stores the value there.
    ///
    /// A producer error is returned as [`DiError::RegistrationFailed`] and
    /// leaves `target` untouched.
    pub fn register(self, target: &DiContainer) -> DiResult<()> {
        let Module { key, producer } = self;
        let value = producer(&ResolverContext::new(target)).map_err(|err| DiError::RegistrationFailed {
            service: key.display_name(),
            reason: err.to_string(),
        })?;
        target.store_instance(key, value);
        Ok(())
    }
}

impl fmt::Debug for Module {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Module").field("key", &self.key).finish_non_exhaustive()
    }
}

/// A group of modules contributed by one feature area.
///
/// # Example
///
/// ```rust
/// use weave_di::{Container, DiContainer, Module, Resolver, ServiceModule};
///
/// struct UserConfig { page_size: usize }
/// struct UserService { page_size: usize }
///
/// struct UserModule;
///
/// impl ServiceModule for UserModule {
///     fn modules(self) -> Vec<Module> {
///         vec![
///             Module::new(|_| UserConfig { page_size: 50 }),
///             Module::named("users", |_| UserService { page_size: 50 }),
///         ]
///     }
/// }
///
/// let target = DiContainer::new();
/// let report = Container::for_container(target.clone()).add_group(UserModule).build();
///
/// assert_eq!(report.registered, 2);
/// assert_eq!(target.resolve::<UserConfig>().unwrap().page_size, 50);
/// assert_eq!(target.resolve_named::<UserService>("users").unwrap().page_size, 50);
/// ```
pub trait ServiceModule {
    fn modules(self) -> Vec<Module>;
}

impl ServiceModule for Vec<Module> {
    fn modules(self) -> Vec<Module> {
        self
    }
}

impl ServiceModule for Module {
    fn modules(self) -> Vec<Module> {
        vec![self]
    }
}
