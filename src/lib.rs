//! # weave-di
//!
//! Thread-safe runtime dependency registration and resolution.
//!
//! ## Features
//!
//! - **Type keys**: services are identified by `TypeId` (plus an optional name), including `dyn Trait`
//! - **Composable containers**: children shadow their parent and fall back to it at resolution time
//! - **Parallel module build**: register many modules on the rayon pool behind one barrier
//! - **Scoped lifetimes**: one instance per active request/session/screen scope id
//! - **Circular dependency detection**: cycles fail with the full path instead of overflowing the stack
//!
//! ## Quick Start
//!
//! ```rust
//! use weave_di::{DiContainer, Resolver};
//! use std::sync::Arc;
//!
//! // Define your services
//! struct Database {
//!     connection_string: String,
//! }
//!
//! struct UserService {
//!     db: Arc<Database>,
//! }
//!
//! // Register services
//! let container = DiContainer::new();
//! container.register_instance(Database {
//!     connection_string: "postgres://localhost".to_string(),
//! });
//! container.register_factory(|ctx| UserService {
//!     db: ctx.resolve::<Database>().expect("database registered"),
//! });
//!
//! let user_service = container.resolve::<UserService>().unwrap();
//! assert_eq!(user_service.db.connection_string, "postgres://localhost");
//! ```
//!
//! ## Service Lifetimes
//!
//! - **Singleton**: instances, and singleton factories evaluated once on first use
//! - **Transient**: the factory runs on every resolution
//! - **Scoped**: created once per current id of a [`ScopeKind`]
//!
//! ## Parent/Child Containers
//!
//! ```rust
//! use weave_di::{DiContainer, Resolver};
//!
//! let app = DiContainer::new();
//! app.register_instance("production".to_string());
//! app.register_instance(8080u16);
//!
//! let test = app.create_child();
//! test.register_instance("test".to_string());
//!
//! assert_eq!(&*test.resolve::<String>().unwrap(), "test");
//! assert_eq!(*test.resolve::<u16>().unwrap(), 8080);
//! assert_eq!(&*app.resolve::<String>().unwrap(), "production");
//! ```
//!
//! ## Module Builds
//!
//! ```rust
//! use weave_di::{Container, DiContainer, Module, Resolver};
//!
//! struct Metrics { enabled: bool }
//!
//! let target = DiContainer::new();
//! let mut builder = Container::for_container(target.clone());
//! builder.register(Module::new(|_| Metrics { enabled: true }));
//! builder.build().into_result().unwrap();
//!
//! assert!(target.resolve::<Metrics>().unwrap().enabled);
//! ```

// Module declarations
pub mod collection;
pub mod config;
pub mod descriptors;
pub mod error;
pub mod inject;
pub mod key;
pub mod lifetime;
pub mod observer;
pub mod provider;
pub mod scope;
pub mod traits;

// Internal modules
mod internal;
mod registration;

// Re-export core types
pub use collection::{BuildReport, Container, Module, ServiceModule};
pub use config::DiConfig;
pub use descriptors::ServiceDescriptor;
pub use error::{DiError, DiResult};
pub use inject::Inject;
pub use key::{key_of_type, Key};
pub use lifetime::Lifetime;
pub use observer::{DiObserver, LoggingObserver};
pub use provider::{DiContainer, ReleaseHandle, ResolverContext};
pub use scope::{ScopeContext, ScopeId, ScopeKind, ScopedKey};
pub use traits::{Resolver, ResolverCore};
