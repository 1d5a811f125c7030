use konfig_rs_core::{ConfigError, ConfigLoader, ConfigSource};
use parking_lot::Mutex;
use serde_json::{Map, Value};

/// Loader returning a fixed mapping and counting calls.
#[derive(Default)]
pub struct FixedLoader {
    data: Map<String, Value>,
    calls: Mutex<Vec<String>>,
}

impl FixedLoader {
    pub fn new(data: Value) -> Self {
        Self {
            data: data.as_object().cloned().unwrap_or_default(),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Sources passed to `load`, in order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }
}

impl ConfigLoader for FixedLoader {
    fn load(&self, source: &str) -> Result<Map<String, Value>, ConfigError> {
        self.calls.lock().push(source.to_string());
        Ok(self.data.clone())
    }

    fn source(&self) -> ConfigSource {
        ConfigSource::Remote
    }
}

/// Loader that always fails with a `Load` error naming the source.
#[derive(Clone, Copy, Default)]
pub struct FailingLoader;

impl ConfigLoader for FailingLoader {
    fn load(&self, source: &str) -> Result<Map<String, Value>, ConfigError> {
        Err(ConfigError::Load(format!("source unavailable: {source}")))
    }

    fn source(&self) -> ConfigSource {
        ConfigSource::Remote
    }
}
