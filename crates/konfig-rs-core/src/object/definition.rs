//! The per-config contract: name, defaults and required keys.

use serde_json::{Map, Value};

/// Supplies the identity and defaults of one named config.
pub trait ConfigDefinition: Send + Sync {
    /// Unique config name, e.g. `database`.
    fn config_name(&self) -> &str;

    /// Values filled in for keys that are not otherwise set.
    fn default_values(&self) -> Map<String, Value>;

    /// Keys that must be present for `validate` to pass.
    fn required_keys(&self) -> Vec<String>;
}

/// A definition assembled from plain data.
#[derive(Debug, Clone, Default)]
pub struct StaticDefinition {
    name: String,
    defaults: Map<String, Value>,
    required: Vec<String>,
}

impl StaticDefinition {
    /// Create an empty definition with the given name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            defaults: Map::new(),
            required: Vec::new(),
        }
    }

    /// Add one default value.
    pub fn with_default(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.defaults.insert(key.into(), value.into());
        self
    }

    /// Replace all default values.
    pub fn with_defaults(mut self, defaults: Map<String, Value>) -> Self {
        self.defaults = defaults;
        self
    }

    /// Add required keys.
    pub fn with_required<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.required.extend(keys.into_iter().map(Into::into));
        self
    }
}

impl ConfigDefinition for StaticDefinition {
    fn config_name(&self) -> &str {
        &self.name
    }

    fn default_values(&self) -> Map<String, Value> {
        self.defaults.clone()
    }

    fn required_keys(&self) -> Vec<String> {
        self.required.clone()
    }
}
