//! Source registry
//!
//! Maps a driver kind (the `driver` key of a section) to a factory that
//! builds a fresh, unconfigured source. New drivers are registered here,
//! the controller never changes.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use contracts::{DataSource, SourceConfig};

use crate::drivers::{MockSource, ReplaySource, MOCK_DRIVER, REPLAY_DRIVER};
use crate::error::{AcquisitionError, Result};

/// Source constructor
pub type SourceFactory = Arc<dyn Fn() -> Box<dyn DataSource> + Send + Sync>;

/// Driver kind → factory lookup
#[derive(Clone)]
pub struct SourceRegistry {
    factories: BTreeMap<String, SourceFactory>,
}

impl fmt::Debug for SourceRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SourceRegistry")
            .field("kinds", &self.kinds().collect::<Vec<_>>())
            .finish()
    }
}

impl Default for SourceRegistry {
    fn default() -> Self {
        Self::with_builtin_drivers()
    }
}

impl SourceRegistry {
    /// Empty registry
    pub fn new() -> Self {
        Self {
            factories: BTreeMap::new(),
        }
    }

    /// Registry with the `mock` and `replay` drivers
    pub fn with_builtin_drivers() -> Self {
        let mut registry = Self::new();
        registry.register(MOCK_DRIVER, || Box::new(MockSource::new()));
        registry.register(REPLAY_DRIVER, || Box::new(ReplaySource::new()));
        registry
    }

    /// Register (or replace) a driver
    pub fn register<F>(&mut self, kind: impl Into<String>, factory: F) -> &mut Self
    where
        F: Fn() -> Box<dyn DataSource> + Send + Sync + 'static,
    {
        self.factories.insert(kind.into(), Arc::new(factory));
        self
    }

    /// Build a source for `config.driver_kind`
    ///
    /// # Errors
    /// `UnknownDriver` if no factory is registered for the kind.
    pub fn create(&self, config: &SourceConfig) -> Result<Box<dyn DataSource>> {
        self.factories
            .get(&config.driver_kind)
            .map(|factory| factory())
            .ok_or_else(|| AcquisitionError::UnknownDriver {
                label: config.label.clone(),
                driver: config.driver_kind.clone(),
            })
    }

    pub fn contains(&self, kind: &str) -> bool {
        self.factories.contains_key(kind)
    }

    /// Registered driver kinds, sorted
    pub fn kinds(&self) -> impl Iterator<Item = &str> {
        self.factories.keys().map(String::as_str)
    }
}
