//! # Environment Registry
//!
//! Name-indexed environment factories grouped into suites.
//!
//! A [`Suite`] (locomotion, manipulation, ...) maps task names to
//! [`EnvironmentDescriptor`]s. The top-level [`Registry`] owns an ordered list
//! of suites and resolves a name by asking each suite in turn; a name unknown
//! to every suite produces a single [`EnvError::UnknownEnvironment`] listing
//! all registered names.
//!
//! Registries are plain values. Build one with [`Registry::with_default_suites`]
//! for the shipped tasks or [`Registry::empty`] for an isolated registry, and
//! pass it to whatever needs it.

use crate::assets::{AssetBundle, NoAssets};
use crate::env::Environment;
use crate::error::EnvError;
use crate::locomotion;
use crate::model::{DomainRandomizer, Model};
use config_tree::ConfigTree;
use std::sync::Arc;

/// Builds an environment from a resolved config and optional dotted-key
/// overrides.
pub type EnvFactory = Arc<
    dyn Fn(ConfigTree, Option<&ConfigTree>) -> Result<Box<dyn Environment>, EnvError>
        + Send
        + Sync,
>;

/// Produces a fresh default configuration on every call.
pub type ConfigFactory = Arc<dyn Fn() -> ConfigTree + Send + Sync>;

/// Everything the registry knows about one task.
#[derive(Clone)]
pub struct EnvironmentDescriptor {
    pub name: String,
    pub factory: EnvFactory,
    pub default_config: ConfigFactory,
    pub domain_randomizer: Option<DomainRandomizer>,
}

impl EnvironmentDescriptor {
    pub fn new<F, C>(name: impl Into<String>, factory: F, default_config: C) -> Self
    where
        F: Fn(ConfigTree, Option<&ConfigTree>) -> Result<Box<dyn Environment>, EnvError>
            + Send
            + Sync
            + 'static,
        C: Fn() -> ConfigTree + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            factory: Arc::new(factory),
            default_config: Arc::new(default_config),
            domain_randomizer: None,
        }
    }

    #[must_use]
    pub fn with_randomizer<R>(mut self, randomizer: R) -> Self
    where
        R: Fn(&Model, u64) -> (Model, Model) + Send + Sync + 'static,
    {
        self.domain_randomizer = Some(Arc::new(randomizer));
        self
    }
}

/// A named group of tasks.
pub struct Suite {
    name: String,
    descriptors: Vec<EnvironmentDescriptor>,
}

impl Suite {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), descriptors: Vec::new() }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Inserts `descriptor`, replacing any task of the same name.
    pub fn register(&mut self, descriptor: EnvironmentDescriptor) {
        match self.descriptors.iter_mut().find(|d| d.name == descriptor.name) {
            Some(slot) => {
                tracing::debug!("{}: replacing registration for '{}'", self.name, descriptor.name);
                *slot = descriptor;
            }
            None => self.descriptors.push(descriptor),
        }
    }

    pub fn remove(&mut self, name: &str) -> Option<EnvironmentDescriptor> {
        let idx = self.descriptors.iter().position(|d| d.name == name)?;
        Some(self.descriptors.remove(idx))
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&EnvironmentDescriptor> {
        self.descriptors.iter().find(|d| d.name == name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.descriptors.iter().map(|d| d.name.as_str())
    }

    pub fn get_default_config(&self, name: &str) -> Result<ConfigTree, EnvError> {
        Ok((self.lookup(name)?.default_config)())
    }

    pub fn load(
        &self,
        name: &str,
        config: Option<ConfigTree>,
        overrides: Option<&ConfigTree>,
    ) -> Result<Box<dyn Environment>, EnvError> {
        let descriptor = self.lookup(name)?;
        let config = config.unwrap_or_else(|| (descriptor.default_config)());
        (descriptor.factory)(config, overrides)
    }

    #[must_use]
    pub fn get_domain_randomizer(&self, name: &str) -> Option<DomainRandomizer> {
        let randomizer = self.get(name).and_then(|d| d.domain_randomizer.clone());
        if randomizer.is_none() {
            tracing::info!("'{name}' has no domain randomizer in the {} suite", self.name);
        }
        randomizer
    }

    fn lookup(&self, name: &str) -> Result<&EnvironmentDescriptor, EnvError> {
        self.get(name).ok_or_else(|| EnvError::UnknownEnvironment {
            name: name.to_string(),
            available: self.names().map(str::to_string).collect(),
        })
    }
}

/// Top-level registry composed of suites.
pub struct Registry {
    suites: Vec<Suite>,
    assets: Arc<dyn AssetBundle>,
}

impl Default for Registry {
    fn default() -> Self {
        Self::empty()
    }
}

impl Registry {
    /// A registry with no suites and no asset requirements.
    #[must_use]
    pub fn empty() -> Self {
        Self { suites: Vec::new(), assets: Arc::new(NoAssets) }
    }

    /// A registry holding every shipped suite.
    #[must_use]
    pub fn with_default_suites() -> Self {
        let mut registry = Self::empty();
        registry.add_suite(locomotion::suite());
        registry
    }

    #[must_use]
    pub fn with_assets(mut self, assets: Arc<dyn AssetBundle>) -> Self {
        self.assets = assets;
        self
    }

    /// Appends `suite`; a suite with the same name is replaced.
    pub fn add_suite(&mut self, suite: Suite) {
        match self.suites.iter_mut().find(|s| s.name == suite.name) {
            Some(slot) => *slot = suite,
            None => self.suites.push(suite),
        }
    }

    #[must_use]
    pub fn suite(&self, name: &str) -> Option<&Suite> {
        self.suites.iter().find(|s| s.name == name)
    }

    /// Registers `descriptor` into `suite`, creating the suite on first use.
    ///
    /// A task name lives in exactly one suite, so registering it here removes
    /// it from any other suite. Re-registering a name silently overwrites it.
    pub fn register(&mut self, suite: &str, descriptor: EnvironmentDescriptor) {
        for other in self.suites.iter_mut().filter(|s| s.name != suite) {
            if other.remove(&descriptor.name).is_some() {
                tracing::debug!("'{}' moved from suite {} to {suite}", descriptor.name, other.name);
            }
        }
        if self.suite(suite).is_none() {
            self.suites.push(Suite::new(suite));
        }
        if let Some(target) = self.suites.iter_mut().find(|s| s.name == suite) {
            target.register(descriptor);
        }
    }

    /// Every registered task name, suite by suite in registration order.
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        self.suites.iter().flat_map(Suite::names).map(str::to_string).collect()
    }

    #[must_use]
    pub fn suite_of(&self, name: &str) -> Option<&str> {
        self.suites.iter().find(|s| s.contains(name)).map(Suite::name)
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.suite_of(name).is_some()
    }

    pub fn get_default_config(&self, name: &str) -> Result<ConfigTree, EnvError> {
        self.owning_suite(name)?.get_default_config(name)
    }

    /// Builds `name` from `config` (or its defaults) after making sure the
    /// asset bundle is present.
    pub fn load(
        &self,
        name: &str,
        config: Option<ConfigTree>,
        overrides: Option<&ConfigTree>,
    ) -> Result<Box<dyn Environment>, EnvError> {
        let suite = self.owning_suite(name)?;
        self.assets.ensure_present()?;
        suite.load(name, config, overrides)
    }

    /// The task's randomizer, if it registered one. Absence is not an error.
    #[must_use]
    pub fn get_domain_randomizer(&self, name: &str) -> Option<DomainRandomizer> {
        match self.suites.iter().find(|s| s.contains(name)) {
            Some(suite) => suite.get_domain_randomizer(name),
            None => {
                tracing::info!("'{name}' is not registered; no domain randomizer available");
                None
            }
        }
    }

    fn owning_suite(&self, name: &str) -> Result<&Suite, EnvError> {
        self.suites
            .iter()
            .find(|s| s.contains(name))
            .ok_or_else(|| EnvError::UnknownEnvironment {
                name: name.to_string(),
                available: self.names(),
            })
    }
}
