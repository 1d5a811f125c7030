//! Scoped overrides and registry-backed call wrappers.

use crate::registry::ConfigRegistry;
use konfig_rs_core::{ConfigError, ConfigMetadata, ConfigObject, value};
use log::{debug, error, warn};
use serde_json::Value;
use std::sync::Arc;

/// Pre-override state of the shallowest path a write changes.
struct SavedKey {
    key: String,
    previous: Option<(Value, Option<ConfigMetadata>)>,
    existed: bool,
    /// The write turned this non-mapping parent into a mapping.
    replaced_parent: bool,
}

impl SavedKey {
    fn absent(key: &str) -> Self {
        Self {
            key: key.to_string(),
            previous: None,
            existed: false,
            replaced_parent: false,
        }
    }
}

/// Temporary changes to one config, undone when the guard is dropped.
///
/// Keys that existed before are written back with their previous value and
/// metadata. Keys the override introduced are removed together with any
/// parent mappings the write had to create.
pub struct ConfigOverride {
    config: Arc<ConfigObject>,
    saved: Vec<SavedKey>,
}

impl ConfigOverride {
    /// Apply `changes` to the named config. If any change is rejected, the
    /// ones already applied are rolled back and the error is returned.
    pub fn apply<I, K, V>(
        registry: &ConfigRegistry,
        name: &str,
        changes: I,
    ) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        let config = registry.get_config(name)?;
        let mut guard = Self {
            config,
            saved: Vec::new(),
        };
        for (key, value) in changes {
            let key = key.into();
            let saved = guard.capture(&key);
            guard.config.set(&key, value)?;
            guard.saved.push(saved);
        }
        debug!(
            "applied config override (config={}, keys={})",
            guard.config.name(),
            guard.saved.len()
        );
        Ok(guard)
    }

    /// The overridden config.
    pub fn config(&self) -> &Arc<ConfigObject> {
        &self.config
    }

    fn capture(&self, key: &str) -> SavedKey {
        let data = self.config.raw_data();
        let segments: Vec<&str> = value::split_path(key).collect();
        let mut path = String::new();
        for (depth, segment) in segments.iter().enumerate() {
            if depth > 0 {
                path.push('.');
            }
            path.push_str(segment);
            let is_leaf = depth + 1 == segments.len();
            match value::get_path(&data, &path) {
                None => return SavedKey::absent(&path),
                Some(Value::Object(_)) if !is_leaf => continue,
                Some(_) => return self.capture_existing(&path, !is_leaf),
            }
        }
        SavedKey::absent(key)
    }

    fn capture_existing(&self, key: &str, replaced_parent: bool) -> SavedKey {
        let previous = self
            .config
            .get(key)
            .map(|value| (value, self.config.get_metadata(key)));
        SavedKey {
            key: key.to_string(),
            previous,
            existed: true,
            replaced_parent,
        }
    }

    fn restore(&mut self) {
        while let Some(saved) = self.saved.pop() {
            let result = match (saved.existed, saved.previous) {
                (true, Some((value, metadata))) if saved.replaced_parent => self
                    .config
                    .remove_key(&saved.key)
                    .and_then(|()| self.config.set_with_metadata(&saved.key, value, metadata)),
                (true, Some((value, metadata))) => {
                    self.config.set_with_metadata(&saved.key, value, metadata)
                }
                (true, None) => {
                    warn!(
                        "cannot restore unreadable value (config={}, key={})",
                        self.config.name(),
                        saved.key
                    );
                    Ok(())
                }
                (false, _) => self.config.remove_key(&saved.key),
            };
            if let Err(err) = result {
                error!(
                    "failed to restore overridden key (config={}, key={}): {}",
                    self.config.name(),
                    saved.key,
                    err
                );
            }
        }
    }
}

impl Drop for ConfigOverride {
    fn drop(&mut self) {
        self.restore();
    }
}

/// Run `f` with `changes` applied to the named config, restoring afterwards
/// even if `f` panics.
pub fn with_overrides<I, K, V, R>(
    registry: &ConfigRegistry,
    name: &str,
    changes: I,
    f: impl FnOnce(&ConfigObject) -> R,
) -> Result<R, ConfigError>
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<Value>,
{
    let guard = ConfigOverride::apply(registry, name, changes)?;
    let output = f(guard.config());
    drop(guard);
    Ok(output)
}

/// Run `f` with the value of `name.key`, or fail with `NotFound` if it is
/// missing or null.
pub fn config_required<R>(
    registry: &ConfigRegistry,
    name: &str,
    key: &str,
    f: impl FnOnce(Value) -> R,
) -> Result<R, ConfigError> {
    match registry.get_config(name)?.get(key) {
        Some(value) if !value.is_null() => Ok(f(value)),
        _ => Err(ConfigError::NotFound(format!(
            "required configuration '{name}.{key}' not found"
        ))),
    }
}

/// Resolve the named config (honouring the loading strategy) and pass it to `f`.
pub fn with_config<R>(
    registry: &ConfigRegistry,
    name: &str,
    f: impl FnOnce(&ConfigObject) -> R,
) -> Result<R, ConfigError> {
    let config = registry.get_config(name)?;
    Ok(f(&config))
}
