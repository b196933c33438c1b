//! Module collection and the parallel build pipeline.
//!
//! This module contains the [`Container`] builder: an ordered list of
//! [`Module`]s plus the container they will be registered into. Building
//! registers every module concurrently and returns once all of them are done.

use std::any::Any;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};

use rayon::prelude::*;

use crate::error::{DiError, DiResult};
use crate::provider::DiContainer;

pub mod module_system;
pub use module_system::*;

/// Outcome of [`Container::build`].
#[derive(Debug, Default)]
pub struct BuildReport {
    /// Modules taken from the builder.
    pub submitted: usize,
    /// Modules whose value is now stored in the target.
    pub registered: usize,
    /// One [`DiError::RegistrationFailed`] per module that errored or panicked.
    pub failures: Vec<DiError>,
}

impl BuildReport {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    /// `Ok(registered)` when every module succeeded, otherwise the first failure.
    pub fn into_result(self) -> DiResult<usize> {
        match self.failures.into_iter().next() {
            None => Ok(self.registered),
            Some(err) => Err(err),
        }
    }

    fn from_outcomes(outcomes: Vec<DiResult<()>>) -> Self {
        let submitted = outcomes.len();
        let failures: Vec<DiError> = outcomes.into_iter().filter_map(Result::err).collect();
        Self {
            submitted,
            registered: submitted - failures.len(),
            failures,
        }
    }

    fn log(&self) {
        for failure in &self.failures {
            tracing::warn!(target: "weave_di", error = %failure, "module registration failed");
        }
        tracing::info!(
            target: "weave_di",
            submitted = self.submitted,
            registered = self.registered,
            failed = self.failures.len(),
            "container build finished"
        );
    }
}

/// Builder accumulating modules for one parallel registration batch.
///
/// Registration order within a batch is unspecified. `build` is a barrier:
/// when it returns, every submitted module has either been stored in the
/// target or reported as a failure.
///
/// # Examples
///
/// ```rust
/// use weave_di::{Container, DiContainer, Module, Resolver};
///
/// struct Database { url: String }
/// struct Cache { size: usize }
///
/// let target = DiContainer::new();
/// let mut builder = Container::for_container(target.clone());
/// builder
///     .register(Module::new(|_| Database { url: "postgres://localhost".to_string() }))
///     .register(Module::new(|_| Cache { size: 128 }));
///
/// let report = builder.build();
/// assert_eq!(report.registered, 2);
/// assert!(builder.is_empty());
///
/// assert_eq!(target.resolve::<Database>().unwrap().url, "postgres://localhost");
/// assert_eq!(target.resolve::<Cache>().unwrap().size, 128);
/// ```
#[derive(Default)]
pub struct Container {
    modules: Vec<Module>,
    target: Option<DiContainer>,
}

impl Container {
    /// Builder targeting whatever [`DiContainer::shared`] is at build time.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder targeting `target`.
    pub fn for_container(target: DiContainer) -> Self {
        Self {
            modules: Vec::new(),
            target: Some(target),
        }
    }

    /// Appends `module` to the pending batch. Nothing is registered yet.
    pub fn register(&mut self, module: Module) -> &mut Self {
        self.modules.push(module);
        self
    }

    /// Appends every module of `group`.
    pub fn add_group(&mut self, group: impl ServiceModule) -> &mut Self {
        self.modules.extend(group.modules());
        self
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    fn take_batch(&mut self) -> (Vec<Module>, DiContainer) {
        let target = self.target.clone().unwrap_or_else(DiContainer::shared);
        (std::mem::take(&mut self.modules), target)
    }

    /// Registers every pending module concurrently on the rayon pool and
    /// waits for all of them.
    ///
    /// The builder is left empty. A failing module never stops the others.
    pub fn build(&mut self) -> BuildReport {
        let (modules, target) = self.take_batch();
        tracing::debug!(target: "weave_di", modules = modules.len(), "building container");

        let outcomes: Vec<DiResult<()>> = modules
            .into_par_iter()
            .map(|module| register_guarded(module, &target))
            .collect();

        let report = BuildReport::from_outcomes(outcomes);
        report.log();
        report
    }

    /// Same as [`build`](Self::build), with each module on a tokio blocking
    /// task.
    ///
    /// ```rust
    /// use weave_di::{Container, DiContainer, Module, Resolver};
    ///
    /// # #[tokio::main(flavor = "current_thread")]
    /// # async fn main() {
    /// let target = DiContainer::new();
    /// let mut builder = Container::for_container(target.clone());
    /// for i in 0..4u64 {
    ///     builder.register(Module::named("slot", move |_| i));
    /// }
    ///
    /// let report = builder.build_async().await;
    /// assert_eq!(report.registered, 4);
    /// assert!(target.resolve_named::<u64>("slot").is_some());
    /// # }
    /// ```
    #[cfg(feature = "async")]
    pub async fn build_async(&mut self) -> BuildReport {
        use tokio::task::JoinSet;

        let (modules, target) = self.take_batch();
        tracing::debug!(target: "weave_di", modules = modules.len(), "building container on blocking tasks");

        let mut tasks = JoinSet::new();
        for module in modules {
            let target = target.clone();
            tasks.spawn_blocking(move || register_guarded(module, &target));
        }

        let mut outcomes = Vec::with_capacity(tasks.len());
        while let Some(joined) = tasks.join_next().await {
            outcomes.push(joined.unwrap_or_else(|e| Err(DiError::Internal(format!("module task failed: {}", e)))));
        }

        let report = BuildReport::from_outcomes(outcomes);
        report.log();
        report
    }
}

impl fmt::Debug for Container {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Container")
            .field("pending", &self.modules.len())
            .field("target", &self.target)
            .finish()
    }
}

fn register_guarded(module: Module, target: &DiContainer) -> DiResult<()> {
    let service = module.key().display_name();
    panic::catch_unwind(AssertUnwindSafe(|| module.register(target))).unwrap_or_else(|payload| {
        Err(DiError::RegistrationFailed {
            service,
            reason: format!("producer panicked: {}", panic_message(payload.as_ref())),
        })
    })
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&'static str>() {
        s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.as_str()
    } else {
        "non-string panic payload"
    }
}
