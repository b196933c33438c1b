//! Error types for the dependency injection container.

use thiserror::Error;

/// Dependency injection errors
///
/// Represents the failure conditions of registration, resolution and the
/// module build pipeline. A plain resolution miss is only an error on the
/// `try_*` paths; [`Resolver::resolve`](crate::Resolver::resolve) turns it
/// into `None`.
///
/// # Examples
///
/// ```rust
/// use weave_di::{DiContainer, DiError, Resolver};
///
/// let container = DiContainer::new();
/// match container.try_resolve::<String>() {
///     Err(DiError::NotFound(type_name)) => {
///         assert_eq!(type_name, "alloc::string::String");
///     }
///     _ => unreachable!(),
/// }
/// ```
///
/// ```rust
/// use weave_di::DiError;
///
/// let circular = DiError::Circular(vec!["ServiceA", "ServiceB", "ServiceA"]);
/// assert_eq!(circular.to_string(), "Circular dependency: ServiceA -> ServiceB -> ServiceA");
/// ```
#[derive(Debug, Clone, Error)]
pub enum DiError {
    /// Service not registered on the container or any ancestor
    #[error("Service not found: {0}")]
    NotFound(&'static str),
    /// Circular dependency detected (includes path)
    #[error("Circular dependency: {}", .0.join(" -> "))]
    Circular(Vec<&'static str>),
    /// A module or registration could not be stored
    #[error("Registration failed for {service}: {reason}")]
    RegistrationFailed {
        service: &'static str,
        reason: String,
    },
    /// A producer ran but reported an error
    #[error("Creation failed for {service}: {source}")]
    CreationFailed {
        service: &'static str,
        #[source]
        source: Box<DiError>,
    },
    /// Invalid container setup (e.g. scoped resolution without an active scope)
    #[error("Configuration error: {0}")]
    Configuration(String),
    /// The process-wide default container was used before bootstrap
    #[error("Container has not been bootstrapped")]
    NotBootstrapped,
    /// Invariant violation inside the container
    #[error("Internal error: {0}")]
    Internal(String),
    /// Stored value does not have the requested shape
    #[error("Type mismatch for: {0}")]
    TypeMismatch(&'static str),
    /// Maximum recursion depth exceeded
    #[error("Max depth {0} exceeded")]
    DepthExceeded(usize),
}

impl DiError {
    /// Wraps `self` as the cause of a failed creation of `service`.
    pub fn creation_failed(service: &'static str, source: DiError) -> Self {
        DiError::CreationFailed { service, source: Box::new(source) }
    }

    /// True for the "nothing registered" case only.
    pub fn is_not_found(&self) -> bool {
        matches!(self, DiError::NotFound(_))
    }
}

/// Result type for DI operations
pub type DiResult<T> = Result<T, DiError>;
