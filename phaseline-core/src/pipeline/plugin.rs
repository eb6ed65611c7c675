//! Pipeline plugin trait for extensibility.

use indexmap::IndexMap;

use super::{Phase, Pipeline};
use crate::Result;

/// A plugin that weaves behavior into a pipeline.
///
/// Plugins attach interceptors to existing phases and may insert phases of
/// their own relative to them. Installing the same plugin on a pipeline
/// twice never duplicates phases, but it does register its interceptors
/// again; [`Plugins`] guards against that by keying plugins on their name.
///
/// # Example
///
/// ```ignore
/// struct StorePlugin {
///     output: Phase,
///     store: Phase,
/// }
///
/// impl Plugin<Record, Logger> for StorePlugin {
///     fn name(&self) -> &'static str { "store" }
///
///     fn install(&self, pipeline: &mut Pipeline<Record, Logger>) -> Result<()> {
///         pipeline.insert_phase_after(&self.output, self.store.clone())?;
///         pipeline.intercept(&self.store, |ctx| {
///             ctx.context().persist(ctx.subject())?;
///             ctx.proceed()
///         })
///     }
/// }
/// ```
pub trait Plugin<S, C>: Send + Sync {
    /// The name of this plugin (for deduplication and logging).
    fn name(&self) -> &'static str;

    /// Register phases and interceptors on `pipeline`.
    ///
    /// # Errors
    ///
    /// Return an error if a phase the plugin depends on is missing.
    fn install(&self, pipeline: &mut Pipeline<S, C>) -> Result<()>;
}

/// An ordered set of plugins, keyed by name.
///
/// Plugins are applied in registration order. Registering a second plugin
/// under a name that is already taken keeps the first one.
pub struct Plugins<S, C> {
    plugins: IndexMap<&'static str, Box<dyn Plugin<S, C>>>,
}

impl<S, C> Plugins<S, C> {
    /// Create an empty plugin set.
    pub fn new() -> Self {
        Self {
            plugins: IndexMap::new(),
        }
    }

    /// Register a plugin.
    ///
    /// Returns false if a plugin with the same name was already registered.
    pub fn install(&mut self, plugin: impl Plugin<S, C> + 'static) -> bool {
        let name = plugin.name();
        if self.plugins.contains_key(name) {
            tracing::debug!(plugin = name, "plugin already installed, skipping");
            return false;
        }
        self.plugins.insert(name, Box::new(plugin));
        true
    }

    /// Builder-style variant of [`install`](Self::install).
    pub fn with(mut self, plugin: impl Plugin<S, C> + 'static) -> Self {
        self.install(plugin);
        self
    }

    /// Returns true if a plugin named `name` is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.plugins.contains_key(name)
    }

    /// Names of the registered plugins, in registration order.
    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.plugins.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.plugins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }

    /// Install every plugin on `pipeline`, in registration order.
    ///
    /// # Errors
    ///
    /// Stops at and returns the first plugin error.
    pub fn apply(&self, pipeline: &mut Pipeline<S, C>) -> Result<()> {
        for (name, plugin) in &self.plugins {
            tracing::debug!(plugin = *name, "installing plugin");
            plugin.install(pipeline)?;
        }
        Ok(())
    }

    /// Create a pipeline with `phases` and install every plugin on it.
    pub fn build(&self, phases: impl IntoIterator<Item = Phase>) -> Result<Pipeline<S, C>> {
        let mut pipeline = Pipeline::new(phases);
        self.apply(&mut pipeline)?;
        Ok(pipeline)
    }
}

impl<S, C> Default for Plugins<S, C> {
    fn default() -> Self {
        Self::new()
    }
}
