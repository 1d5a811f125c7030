//! Capability interfaces injected into config objects.
//!
//! Plugins are held behind `Arc` so a single validator, cache or encryptor
//! can be shared by several config objects.

use crate::ConfigError;
use crate::metadata::ConfigSource;
use serde_json::{Map, Value};
use std::sync::Arc;
use std::time::Duration;

/// Validates a single key/value pair.
pub trait ConfigValidator: Send + Sync {
    /// Validate one key. The returned errors belong to this call only;
    /// callers accumulate across keys.
    fn validate(&self, key: &str, value: &Value) -> Result<(), Vec<String>>;

    /// Errors produced by the most recent `validate` call.
    fn validation_errors(&self) -> Vec<String>;
}

/// Fetches a mapping from a source identifier.
pub trait ConfigLoader: Send + Sync {
    /// Load the mapping identified by `source`.
    fn load(&self, source: &str) -> Result<Map<String, Value>, ConfigError>;

    /// Source kind recorded in metadata for loaded keys.
    fn source(&self) -> ConfigSource;

    /// Whether this loader reads the given kind of source.
    fn supports_source(&self, source: ConfigSource) -> bool {
        self.source() == source
    }
}

/// Converts a mapping to and from text.
pub trait ConfigSerializer: Send + Sync {
    fn serialize(&self, data: &Map<String, Value>) -> Result<String, ConfigError>;
    fn deserialize(&self, text: &str) -> Result<Map<String, Value>, ConfigError>;
}

/// Encrypts sensitive values before they are stored.
pub trait ConfigEncryptor: Send + Sync {
    fn encrypt(&self, plaintext: &str) -> Result<String, ConfigError>;
    fn decrypt(&self, ciphertext: &str) -> Result<String, ConfigError>;
}

/// Read-through cache consulted by `ConfigObject::get`.
pub trait ConfigCache: Send + Sync {
    fn get(&self, key: &str) -> Option<Value>;
    fn set(&self, key: &str, value: Value, ttl: Option<Duration>);
    fn invalidate(&self, key: &str);
    fn clear(&self);
}

/// Receives change notifications from config objects.
pub trait ConfigObserver: Send + Sync {
    /// Called after `key` changed. `new_value` is `None` when the key was removed.
    fn on_config_changed(
        &self,
        key: &str,
        old_value: Option<&Value>,
        new_value: Option<&Value>,
    ) -> anyhow::Result<()>;
}

/// Optional plugins attached to a config object.
#[derive(Clone, Default)]
pub struct ConfigPlugins {
    pub validator: Option<Arc<dyn ConfigValidator>>,
    pub loader: Option<Arc<dyn ConfigLoader>>,
    pub serializer: Option<Arc<dyn ConfigSerializer>>,
    pub encryptor: Option<Arc<dyn ConfigEncryptor>>,
    pub cache: Option<Arc<dyn ConfigCache>>,
    /// Source identifier used by `load(None)` when a loader is attached.
    pub source: Option<String>,
}

impl ConfigPlugins {
    /// Plugins with nothing attached.
    pub fn none() -> Self {
        Self::default()
    }
}

impl std::fmt::Debug for ConfigPlugins {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfigPlugins")
            .field("validator", &self.validator.is_some())
            .field("loader", &self.loader.is_some())
            .field("serializer", &self.serializer.is_some())
            .field("encryptor", &self.encryptor.is_some())
            .field("cache", &self.cache.is_some())
            .field("source", &self.source)
            .finish()
    }
}
