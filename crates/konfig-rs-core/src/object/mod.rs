//! A named, independently loadable unit of configuration.
//!
//! A `ConfigObject` owns a value tree and per-key metadata, and composes the
//! optional plugins it was built with. Reads (`get`) never fail: decryption
//! or cache problems are logged and the caller's default is used instead.
//! Writes (`set`, `remove_key`, `load`) return typed errors.

mod definition;
mod snapshot;


pub use definition::{ConfigDefinition, StaticDefinition};
pub use snapshot::ConfigSnapshot;

use crate::metadata::{ConfigMetadata, ConfigPriority};
use crate::plugin::{ConfigEncryptor, ConfigObserver, ConfigPlugins};
use crate::value;
use crate::ConfigError;
use log::{debug, error, info, warn};
use parking_lot::RwLock;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Weak};

/// Key fragments that mark a value as sensitive.
pub const SENSITIVE_PATTERNS: &[&str] = &["password", "secret", "key", "token", "credential"];

/// Whether a key is encrypted on write when an encryptor is attached.
pub fn is_sensitive_key(key: &str) -> bool {
    let lowered = key.to_lowercase();
    SENSITIVE_PATTERNS
        .iter()
        .any(|pattern| lowered.contains(pattern))
}

#[derive(Debug, Default)]
struct ObjectState {
    data: Map<String, Value>,
    metadata: HashMap<String, ConfigMetadata>,
    loaded: bool,
    validated: bool,
    readonly: bool,
    validation_errors: Vec<String>,
}

/// Config value container composed with its plugins.
pub struct ConfigObject {
    definition: Arc<dyn ConfigDefinition>,
    plugins: ConfigPlugins,
    state: RwLock<ObjectState>,
    observers: RwLock<Vec<Weak<dyn ConfigObserver>>>,
}

impl ConfigObject {
    /// Create an empty, unloaded config object.
    pub fn new(definition: Arc<dyn ConfigDefinition>, plugins: ConfigPlugins) -> Self {
        Self {
            definition,
            plugins,
            state: RwLock::new(ObjectState::default()),
            observers: RwLock::new(Vec::new()),
        }
    }

    /// Create a config object with no plugins attached.
    pub fn from_definition(definition: impl ConfigDefinition + 'static) -> Self {
        Self::new(Arc::new(definition), ConfigPlugins::none())
    }

    /// Config name supplied by the definition.
    pub fn name(&self) -> &str {
        self.definition.config_name()
    }

    /// The definition backing this object.
    pub fn definition(&self) -> &Arc<dyn ConfigDefinition> {
        &self.definition
    }

    /// Attached plugins.
    pub fn plugins(&self) -> &ConfigPlugins {
        &self.plugins
    }

    /// Resolve a dotted key. Returns `None` when the path is missing or the
    /// stored value cannot be decrypted.
    pub fn get(&self, key: &str) -> Option<Value> {
        if let Some(cache) = &self.plugins.cache
            && let Some(hit) = cache.get(key)
        {
            return Some(hit);
        }

        let (raw, encrypted) = {
            let state = self.state.read();
            let raw = value::get_path(&state.data, key).cloned();
            let encrypted = state.metadata.get(key).is_some_and(|meta| meta.encrypted);
            (raw, encrypted)
        };
        let raw = raw?;

        let resolved = match (&self.plugins.encryptor, encrypted) {
            (Some(encryptor), true) => match decrypt_value(encryptor.as_ref(), &raw) {
                Ok(plain) => plain,
                Err(err) => {
                    error!(
                        "failed to decrypt config value (config={}, key={}): {}",
                        self.name(),
                        key,
                        err
                    );
                    return None;
                }
            },
            _ => raw,
        };

        if let Some(cache) = &self.plugins.cache
            && !resolved.is_null()
        {
            cache.set(key, resolved.clone(), None);
            if let Some(meta) = self.state.write().metadata.get_mut(key) {
                meta.cached = true;
            }
        }

        Some(resolved)
    }

    /// Resolve a dotted key, falling back to `default`.
    pub fn get_or(&self, key: &str, default: impl Into<Value>) -> Value {
        self.get(key).unwrap_or_else(|| default.into())
    }

    /// Resolve a dotted key and deserialize it into `T`.
    pub fn get_as<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let value = self.get(key)?;
        match serde_json::from_value(value) {
            Ok(typed) => Some(typed),
            Err(err) => {
                warn!(
                    "config value has unexpected shape (config={}, key={}): {}",
                    self.name(),
                    key,
                    err
                );
                None
            }
        }
    }

    /// Write a value with default `{memory, medium}` metadata.
    pub fn set(&self, key: &str, value: impl Into<Value>) -> Result<(), ConfigError> {
        self.set_with_metadata(key, value.into(), None)
    }

    /// Write a value, replacing the key's metadata record.
    ///
    /// The validator runs first and rejects the write on failure. Sensitive
    /// keys are encrypted when an encryptor is attached. Observers see the
    /// plaintext old and new values.
    pub fn set_with_metadata(
        &self,
        key: &str,
        value: Value,
        metadata: Option<ConfigMetadata>,
    ) -> Result<(), ConfigError> {
        self.ensure_writable(key)?;

        if let Some(validator) = &self.plugins.validator
            && let Err(errors) = validator.validate(key, &value)
        {
            warn!(
                "rejected config value (config={}, key={}, errors={:?})",
                self.name(),
                key,
                errors
            );
            return Err(ConfigError::validation(key, errors));
        }

        let old_value = self.get(key);
        let mut metadata = metadata.unwrap_or_else(ConfigMetadata::memory);
        let stored = match &self.plugins.encryptor {
            Some(encryptor) if is_sensitive_key(key) => {
                metadata.encrypted = true;
                encrypt_value(encryptor.as_ref(), &value)?
            }
            _ => {
                metadata.encrypted = false;
                value.clone()
            }
        };

        {
            let mut state = self.state.write();
            if state.readonly {
                return Err(self.readonly_error(key));
            }
            value::set_path(&mut state.data, key, stored);
            state.metadata.insert(key.to_string(), metadata);
        }

        self.invalidate_cached(key, old_value.as_ref(), Some(&value));
        self.notify_observers(key, old_value.as_ref(), Some(&value));
        debug!("set config key (config={}, key={})", self.name(), key);
        Ok(())
    }

    /// Fill in default values for keys not already present. Never overwrites.
    pub fn load_defaults(&self) {
        let defaults = self.definition.default_values();
        let mut state = self.state.write();
        for (key, value) in defaults {
            if !state.data.contains_key(&key) {
                state.metadata.insert(key.clone(), ConfigMetadata::defaults());
                state.data.insert(key, value);
            }
        }
        state.loaded = true;
        debug!("default values loaded (config={})", self.name());
    }

    /// Load from `source` (or the default source) through the attached loader,
    /// deep-merge the result, then `set` every default that is still missing.
    pub fn load(&self, source: Option<&str>) -> Result<(), ConfigError> {
        let source = source
            .map(str::to_string)
            .or_else(|| self.plugins.source.clone());

        if let (Some(loader), Some(source)) = (&self.plugins.loader, source.as_deref()) {
            let loaded = loader.load(source).map_err(|err| {
                error!(
                    "loader failed (config={}, source={}): {}",
                    self.name(),
                    source,
                    err
                );
                into_load_error(err)
            })?;
            let kind = loader.source();
            let mut state = self.state.write();
            value::merge_maps(&mut state.data, &loaded);
            for (key, loaded_value) in &loaded {
                forget_overwritten_metadata(&mut state.metadata, key, loaded_value);
                state
                    .metadata
                    .insert(key.clone(), ConfigMetadata::new(kind, ConfigPriority::High));
            }
            if let Some(cache) = &self.plugins.cache {
                cache.clear();
            }
            debug!(
                "merged loaded values (config={}, source={}, keys={})",
                self.name(),
                source,
                loaded.len()
            );
        }

        for (key, value) in self.definition.default_values() {
            let present = self.state.read().data.contains_key(&key);
            if !present {
                self.set_with_metadata(&key, value, Some(ConfigMetadata::defaults()))
                    .map_err(|err| {
                        error!(
                            "failed to apply default (config={}, key={}): {}",
                            self.name(),
                            key,
                            err
                        );
                        into_load_error(err)
                    })?;
            }
        }

        self.state.write().loaded = true;
        info!("config loaded (config={})", self.name());
        Ok(())
    }

    /// Check required keys and run the validator over every top-level key.
    /// All problems are collected before returning.
    pub fn validate(&self) -> bool {
        let (missing, entries) = {
            let state = self.state.read();
            let missing: Vec<String> = self
                .definition
                .required_keys()
                .into_iter()
                .filter(|key| !value::contains_path(&state.data, key))
                .collect();
            let entries: Vec<(String, Value, bool)> = state
                .data
                .iter()
                .map(|(key, value)| {
                    let encrypted = state.metadata.get(key).is_some_and(|meta| meta.encrypted);
                    (key.clone(), value.clone(), encrypted)
                })
                .collect();
            (missing, entries)
        };

        let mut errors: Vec<String> = missing
            .iter()
            .map(|key| format!("missing required key '{key}'"))
            .collect();

        if let Some(validator) = &self.plugins.validator {
            for (key, raw, encrypted) in entries {
                let value = match (&self.plugins.encryptor, encrypted) {
                    (Some(encryptor), true) => {
                        decrypt_value(encryptor.as_ref(), &raw).unwrap_or(raw)
                    }
                    _ => raw,
                };
                if let Err(key_errors) = validator.validate(&key, &value) {
                    errors.extend(
                        key_errors
                            .into_iter()
                            .map(|err| format!("key '{key}': {err}")),
                    );
                }
            }
        }

        let valid = errors.is_empty();
        if valid {
            debug!("config validated (config={})", self.name());
        } else {
            warn!(
                "config validation failed (config={}, errors={:?})",
                self.name(),
                errors
            );
        }
        let mut state = self.state.write();
        state.validation_errors = errors;
        state.validated = valid;
        valid
    }

    /// Errors collected by the most recent `validate`.
    pub fn validation_errors(&self) -> Vec<String> {
        self.state.read().validation_errors.clone()
    }

    /// Reset lifecycle flags, clear the cache, then load and validate again.
    pub fn reload(&self) -> Result<bool, ConfigError> {
        {
            let mut state = self.state.write();
            state.loaded = false;
            state.validated = false;
        }
        if let Some(cache) = &self.plugins.cache {
            cache.clear();
        }
        self.load(None)?;
        Ok(self.validate())
    }

    /// Deep copy of data and metadata.
    pub fn backup(&self) -> ConfigSnapshot {
        let state = self.state.read();
        ConfigSnapshot {
            data: state.data.clone(),
            metadata: state
                .metadata
                .iter()
                .map(|(key, meta)| (key.clone(), meta.clone()))
                .collect(),
        }
    }

    /// Replace data and metadata with the snapshot. No merge.
    pub fn restore(&self, snapshot: &ConfigSnapshot) {
        {
            let mut state = self.state.write();
            state.data = snapshot.data.clone();
            state.metadata = snapshot
                .metadata
                .iter()
                .map(|(key, meta)| (key.clone(), meta.clone()))
                .collect();
        }
        if let Some(cache) = &self.plugins.cache {
            cache.clear();
        }
        debug!(
            "config restored (config={}, keys={})",
            self.name(),
            snapshot.data.len()
        );
    }

    /// Register a change listener. The object keeps only a weak reference.
    pub fn add_observer(&self, observer: &Arc<dyn ConfigObserver>) {
        let mut observers = self.observers.write();
        let already = observers
            .iter()
            .any(|existing| existing.upgrade().is_some_and(|o| Arc::ptr_eq(&o, observer)));
        if !already {
            observers.push(Arc::downgrade(observer));
        }
    }

    /// Unregister a change listener.
    pub fn remove_observer(&self, observer: &Arc<dyn ConfigObserver>) {
        self.observers.write().retain(|existing| {
            existing
                .upgrade()
                .is_some_and(|o| !Arc::ptr_eq(&o, observer))
        });
    }

    /// Number of live observers.
    pub fn observer_count(&self) -> usize {
        self.observers
            .read()
            .iter()
            .filter(|observer| observer.strong_count() > 0)
            .count()
    }

    /// Lock or unlock the object against `set`/`remove_key`.
    pub fn set_readonly(&self, readonly: bool) {
        self.state.write().readonly = readonly;
    }

    pub fn is_readonly(&self) -> bool {
        self.state.read().readonly
    }

    pub fn is_loaded(&self) -> bool {
        self.state.read().loaded
    }

    pub fn is_validated(&self) -> bool {
        self.state.read().validated
    }

    /// Metadata recorded for a key, if any.
    pub fn get_metadata(&self, key: &str) -> Option<ConfigMetadata> {
        self.state.read().metadata.get(key).cloned()
    }

    /// Top-level keys currently present.
    pub fn keys(&self) -> Vec<String> {
        self.state.read().data.keys().cloned().collect()
    }

    /// Whether a dotted key resolves to a stored value.
    pub fn has_key(&self, key: &str) -> bool {
        value::contains_path(&self.state.read().data, key)
    }

    /// Stored tree as-is, with sensitive values still encrypted.
    pub fn raw_data(&self) -> Map<String, Value> {
        self.state.read().data.clone()
    }

    /// Remove a key, its metadata and any nested metadata.
    pub fn remove_key(&self, key: &str) -> Result<(), ConfigError> {
        self.ensure_writable(key)?;
        let old_value = self.get(key);
        let removed = {
            let mut state = self.state.write();
            if state.readonly {
                return Err(self.readonly_error(key));
            }
            let removed = value::remove_path(&mut state.data, key);
            if removed.is_some() {
                let nested = format!("{key}.");
                state
                    .metadata
                    .retain(|meta_key, _| meta_key != key && !meta_key.starts_with(&nested));
            }
            removed
        };
        if removed.is_none() {
            return Ok(());
        }

        self.invalidate_cached(key, old_value.as_ref(), None);
        self.notify_observers(key, old_value.as_ref(), None);
        debug!("removed config key (config={}, key={})", self.name(), key);
        Ok(())
    }

    /// Serialize the stored tree with the attached serializer.
    pub fn export_data(&self) -> Result<String, ConfigError> {
        let serializer = self.plugins.serializer.as_ref().ok_or_else(|| {
            ConfigError::Serialize(format!("config '{}' has no serializer attached", self.name()))
        })?;
        serializer.serialize(&self.state.read().data)
    }

    /// Deserialize text with the attached serializer and `set` each top-level key.
    pub fn import_data(&self, text: &str) -> Result<(), ConfigError> {
        let serializer = self.plugins.serializer.as_ref().ok_or_else(|| {
            ConfigError::Serialize(format!("config '{}' has no serializer attached", self.name()))
        })?;
        let data = serializer.deserialize(text)?;
        for (key, value) in data {
            self.set(&key, value)?;
        }
        Ok(())
    }

    fn ensure_writable(&self, key: &str) -> Result<(), ConfigError> {
        if self.state.read().readonly {
            return Err(self.readonly_error(key));
        }
        Ok(())
    }

    fn readonly_error(&self, key: &str) -> ConfigError {
        ConfigError::Readonly {
            name: self.name().to_string(),
            key: key.to_string(),
        }
    }

    /// Drop cache entries that may now be stale: the key, its ancestors, and
    /// everything when a mapping (with possibly cached children) changed.
    fn invalidate_cached(&self, key: &str, old_value: Option<&Value>, new_value: Option<&Value>) {
        let Some(cache) = &self.plugins.cache else {
            return;
        };
        if old_value.is_some_and(Value::is_object) || new_value.is_some_and(Value::is_object) {
            cache.clear();
            return;
        }
        cache.invalidate(key);
        let mut prefix = key;
        while let Some((parent, _)) = prefix.rsplit_once('.') {
            cache.invalidate(parent);
            prefix = parent;
        }
    }

    fn notify_observers(&self, key: &str, old_value: Option<&Value>, new_value: Option<&Value>) {
        let live: Vec<Arc<dyn ConfigObserver>> = {
            let mut observers = self.observers.write();
            observers.retain(|observer| observer.strong_count() > 0);
            observers.iter().filter_map(Weak::upgrade).collect()
        };
        for observer in live {
            if let Err(err) = observer.on_config_changed(key, old_value, new_value) {
                error!(
                    "config observer failed (config={}, key={}): {:#}",
                    self.name(),
                    key,
                    err
                );
            }
        }
    }
}

impl fmt::Debug for ConfigObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.read();
        f.debug_struct("ConfigObject")
            .field("name", &self.name())
            .field("keys", &state.data.len())
            .field("loaded", &state.loaded)
            .field("validated", &state.validated)
            .field("readonly", &state.readonly)
            .field("plugins", &self.plugins)
            .finish()
    }
}

impl fmt::Display for ConfigObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ConfigObject(name='{}', loaded={}, validated={})",
            self.name(),
            self.is_loaded(),
            self.is_validated()
        )
    }
}

/// Sensitive values are encrypted as JSON text so their type survives.
fn encrypt_value(encryptor: &dyn ConfigEncryptor, value: &Value) -> Result<Value, ConfigError> {
    let plaintext = serde_json::to_string(value)?;
    Ok(Value::String(encryptor.encrypt(&plaintext)?))
}

fn decrypt_value(encryptor: &dyn ConfigEncryptor, stored: &Value) -> Result<Value, ConfigError> {
    let Some(ciphertext) = stored.as_str() else {
        return Err(ConfigError::Encryption(
            "encrypted value is not a string".to_string(),
        ));
    };
    let plaintext = encryptor.decrypt(ciphertext)?;
    Ok(serde_json::from_str(&plaintext).unwrap_or(Value::String(plaintext)))
}

/// Drop metadata for every path a loaded value wrote to. A non-mapping value
/// replaces its whole subtree, so nested records go too. Sibling records
/// under a merged mapping are kept.
fn forget_overwritten_metadata(
    metadata: &mut HashMap<String, ConfigMetadata>,
    path: &str,
    loaded: &Value,
) {
    metadata.remove(path);
    match loaded {
        Value::Object(children) => {
            for (child, value) in children {
                forget_overwritten_metadata(metadata, &format!("{path}.{child}"), value);
            }
        }
        _ => {
            let nested = format!("{path}.");
            metadata.retain(|key, _| !key.starts_with(&nested));
        }
    }
}

fn into_load_error(err: ConfigError) -> ConfigError {
    match err {
        ConfigError::Load(_) => err,
        other => ConfigError::Load(other.to_string()),
    }
}
