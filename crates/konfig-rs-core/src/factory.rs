//! Type-tag registry for constructing config objects.

use crate::ConfigError;
use crate::object::ConfigObject;
use crate::plugin::ConfigPlugins;
use log::debug;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

/// Constructor registered under a type tag.
pub type ConfigConstructor = Arc<dyn Fn(ConfigPlugins) -> ConfigObject + Send + Sync>;

/// Maps type tags to config constructors.
#[derive(Default)]
pub struct ConfigFactory {
    constructors: RwLock<HashMap<String, ConfigConstructor>>,
}

impl ConfigFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a constructor. A later registration replaces an earlier one.
    pub fn register_config_type<F>(&self, tag: impl Into<String>, constructor: F)
    where
        F: Fn(ConfigPlugins) -> ConfigObject + Send + Sync + 'static,
    {
        let tag = tag.into();
        debug!("registered config type (tag={})", tag);
        self.constructors.write().insert(tag, Arc::new(constructor));
    }

    /// Construct a config object for `tag` with the given plugins.
    pub fn create_config(
        &self,
        tag: &str,
        plugins: ConfigPlugins,
    ) -> Result<ConfigObject, ConfigError> {
        let constructor = self
            .constructors
            .read()
            .get(tag)
            .cloned()
            .ok_or_else(|| ConfigError::NotFound(format!("unknown config type '{tag}'")))?;
        Ok(constructor(plugins))
    }

    pub fn has_type(&self, tag: &str) -> bool {
        self.constructors.read().contains_key(tag)
    }

    /// Registered tags, sorted.
    pub fn type_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.constructors.read().keys().cloned().collect();
        names.sort();
        names
    }
}

impl std::fmt::Debug for ConfigFactory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfigFactory")
            .field("types", &self.type_names())
            .finish()
    }
}
