//! Resolver context for dependency injection.
//!
//! This module contains the ResolverContext type which provides
//! the interface for factory functions to resolve dependencies.

use crate::error::DiResult;
use crate::key::Key;
use crate::registration::AnyArc;
use crate::traits::ResolverCore;

use super::DiContainer;

/// Context passed to factory functions for resolving dependencies.
///
/// A `ResolverContext` borrows the container that owns the registration
/// being produced. Dependencies resolved through it follow that container's
/// lookup chain, and nested resolutions share the caller thread's cycle
/// tracking.
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
/// let container = DiContainer::new();
/// container.register_instance(Database {
///     url: "postgres://localhost".to_string()
/// });
/// container.register_factory(|ctx| {
///     // ctx is a ResolverContext that provides access to other services
///     UserService {
///         db: ctx.resolve::<Database>().expect("database registered"),
///     }
/// });
///
/// assert_eq!(container.resolve::<UserService>().unwrap().db.url, "postgres://localhost");
/// ```
pub struct ResolverContext<'a> {
    container: &'a DiContainer,
}

impl<'a> ResolverContext<'a> {
    pub(crate) fn new(container: &'a DiContainer) -> Self {
        Self { container }
    }

    /// The container owning the registration being produced.
    ///
    /// Factories can use it to register follow-up services or to hand a
    /// handle to the object they build.
    pub fn container(&self) -> &'a DiContainer {
        self.container
    }
}

impl<'a> ResolverCore for ResolverContext<'a> {
    fn resolve_any(&self, key: &Key) -> DiResult<AnyArc> {
        self.container.resolve_any(key)
    }

    fn contains_key(&self, key: &Key) -> bool {
        self.container.contains_key(key)
    }

    fn report_miss(&self, key: &Key) {
        self.container.report_miss(key);
    }

    fn log_on_miss(&self) -> bool {
        self.container.log_on_miss()
    }
}
