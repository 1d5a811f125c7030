//! The config registry: named objects, strategy, environment and bulk operations.

#[cfg(test)]
mod tests;

use crate::backup::{ExportFormat, RegistryBackup};
use crate::container::ServiceContainer;
use crate::report::{ConfigHealth, HealthStatus, Statistics, format_memory_usage};
use crate::strategy::{ConfigEnvironment, ConfigStrategy};
use chrono::{DateTime, Utc};
use konfig_rs_core::{
    ConfigBuilder, ConfigDefinition, ConfigError, ConfigFactory, ConfigObject, ConfigObserver,
    ConfigPlugins,
};
use log::{debug, error, info, warn};
use parking_lot::ReentrantMutex;
use serde_json::Value;
use std::any::Any;
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

/// Interval used by auto-reload until one is configured.
pub const DEFAULT_RELOAD_INTERVAL: Duration = Duration::from_secs(60);

#[derive(Debug, Clone)]
struct AutoReload {
    enabled: bool,
    interval: Duration,
    last_reload: DateTime<Utc>,
}

struct RegistryState {
    configs: BTreeMap<String, Arc<ConfigObject>>,
    environment: ConfigEnvironment,
    strategy: ConfigStrategy,
    auto_reload: AutoReload,
    observers: Vec<Arc<dyn ConfigObserver>>,
}

impl Default for RegistryState {
    fn default() -> Self {
        Self {
            configs: BTreeMap::new(),
            environment: ConfigEnvironment::default(),
            strategy: ConfigStrategy::default(),
            auto_reload: AutoReload {
                enabled: false,
                interval: DEFAULT_RELOAD_INTERVAL,
                last_reload: Utc::now(),
            },
            observers: Vec::new(),
        }
    }
}

/// Holds every registered config object for the lifetime of the process.
///
/// All access to the registry map goes through one reentrant lock, so an
/// observer or service factory running on the same thread may call back into
/// the registry. Config objects themselves are called without any borrow of
/// the map held.
#[derive(Default)]
pub struct ConfigRegistry {
    state: ReentrantMutex<RefCell<RegistryState>>,
    container: ServiceContainer,
    factory: ConfigFactory,
}

impl ConfigRegistry {
    /// Empty registry: lazy strategy, development environment.
    pub fn new() -> Self {
        Self::default()
    }

    fn read<R>(&self, f: impl FnOnce(&RegistryState) -> R) -> R {
        let guard = self.state.lock();
        let state = guard.borrow();
        f(&state)
    }

    fn write<R>(&self, f: impl FnOnce(&mut RegistryState) -> R) -> R {
        let guard = self.state.lock();
        let mut state = guard.borrow_mut();
        f(&mut state)
    }

    fn entries(&self) -> Vec<(String, Arc<ConfigObject>)> {
        self.read(|state| {
            state
                .configs
                .iter()
                .map(|(name, config)| (name.clone(), Arc::clone(config)))
                .collect()
        })
    }

    /// Register `config` under `name`, replacing any earlier registration.
    ///
    /// Global observers are attached. With `auto_load` under the eager
    /// strategy the config is loaded and validated immediately and a load
    /// failure is returned.
    pub fn register_config(
        &self,
        name: impl Into<String>,
        config: Arc<ConfigObject>,
        auto_load: bool,
    ) -> Result<(), ConfigError> {
        let name = name.into();
        let _guard = self.state.lock();
        let (replaced, observers, strategy) = self.write(|state| {
            let replaced = state
                .configs
                .insert(name.clone(), Arc::clone(&config))
                .is_some();
            (replaced, state.observers.clone(), state.strategy)
        });
        if replaced {
            warn!("config already registered, overwriting (name={})", name);
        }
        for observer in &observers {
            config.add_observer(observer);
        }

        if auto_load && strategy == ConfigStrategy::Eager {
            config.load(None).map_err(|err| {
                error!("failed to load config (name={}): {}", name, err);
                err
            })?;
            config.validate();
        }
        info!("registered config (name={})", name);
        Ok(())
    }

    /// Fetch a config. Under the lazy strategy an unloaded config is loaded
    /// and validated first.
    pub fn get_config(&self, name: &str) -> Result<Arc<ConfigObject>, ConfigError> {
        let _guard = self.state.lock();
        let (config, strategy) = self.read(|state| (state.configs.get(name).cloned(), state.strategy));
        let config =
            config.ok_or_else(|| ConfigError::NotFound(format!("config '{name}' not found")))?;

        if strategy == ConfigStrategy::Lazy && !config.is_loaded() {
            debug!("lazy loading config (name={})", name);
            config.load(None).map_err(|err| {
                error!("failed to lazy load config (name={}): {}", name, err);
                err
            })?;
            config.validate();
        }
        Ok(config)
    }

    /// Read one value. Never fails: lookup or load problems are logged and
    /// `default` is returned.
    pub fn get_config_value(&self, name: &str, key: &str, default: impl Into<Value>) -> Value {
        match self.get_config(name) {
            Ok(config) => config.get_or(key, default),
            Err(err) => {
                error!(
                    "failed to get config value (config={}, key={}): {}",
                    name, key, err
                );
                default.into()
            }
        }
    }

    /// Write one value through the named config.
    pub fn set_config_value(
        &self,
        name: &str,
        key: &str,
        value: impl Into<Value>,
    ) -> Result<(), ConfigError> {
        self.get_config(name)?.set(key, value)
    }

    pub fn has_config(&self, name: &str) -> bool {
        self.read(|state| state.configs.contains_key(name))
    }

    /// Unregister a config, detaching global observers from it.
    pub fn remove_config(&self, name: &str) -> Option<Arc<ConfigObject>> {
        let _guard = self.state.lock();
        let (removed, observers) =
            self.write(|state| (state.configs.remove(name), state.observers.clone()));
        if let Some(config) = &removed {
            for observer in &observers {
                config.remove_observer(observer);
            }
            info!("removed config (name={})", name);
        }
        removed
    }

    /// Registered names, sorted.
    pub fn config_names(&self) -> Vec<String> {
        self.read(|state| state.configs.keys().cloned().collect())
    }

    /// Every registered config, sorted by name.
    pub fn configs(&self) -> Vec<(String, Arc<ConfigObject>)> {
        self.entries()
    }

    pub fn len(&self) -> usize {
        self.read(|state| state.configs.len())
    }

    pub fn is_empty(&self) -> bool {
        self.read(|state| state.configs.is_empty())
    }

    /// Unregister every config, detaching global observers from each.
    pub fn clear_all(&self) {
        let _guard = self.state.lock();
        let (cleared, observers) =
            self.write(|state| (std::mem::take(&mut state.configs), state.observers.clone()));
        for config in cleared.values() {
            for observer in &observers {
                config.remove_observer(observer);
            }
        }
        info!("all configurations cleared (count={})", cleared.len());
    }

    pub fn factory(&self) -> &ConfigFactory {
        &self.factory
    }

    /// Register a constructor for `create_config`.
    pub fn register_config_type<F>(&self, tag: impl Into<String>, constructor: F)
    where
        F: Fn(ConfigPlugins) -> ConfigObject + Send + Sync + 'static,
    {
        self.factory.register_config_type(tag, constructor);
    }

    /// Construct a config of type `tag` and register it under `name`.
    pub fn create_config(
        &self,
        name: &str,
        tag: &str,
        plugins: ConfigPlugins,
    ) -> Result<Arc<ConfigObject>, ConfigError> {
        let config = Arc::new(self.factory.create_config(tag, plugins)?);
        self.register_config(name, Arc::clone(&config), true)?;
        Ok(config)
    }

    pub fn builder(&self, definition: Arc<dyn ConfigDefinition>) -> ConfigBuilder {
        ConfigBuilder::new(definition)
    }

    pub fn set_environment(&self, environment: ConfigEnvironment) {
        self.write(|state| state.environment = environment);
        info!("environment set (environment={})", environment);
    }

    pub fn environment(&self) -> ConfigEnvironment {
        self.read(|state| state.environment)
    }

    pub fn set_strategy(&self, strategy: ConfigStrategy) {
        self.write(|state| state.strategy = strategy);
        info!("loading strategy set (strategy={})", strategy);
    }

    pub fn strategy(&self) -> ConfigStrategy {
        self.read(|state| state.strategy)
    }

    /// Apply `<dir>/<environment>.json`. Top-level keys name configs, nested
    /// objects are `set` key by key. A missing file is skipped; unknown
    /// config names are ignored.
    pub fn load_environment_configs(&self, dir: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = dir
            .as_ref()
            .join(format!("{}.json", self.environment().as_str()));
        if !path.exists() {
            debug!("no environment config file (path={})", path.display());
            return Ok(());
        }

        let result = fs::read_to_string(&path)
            .map_err(|err| err.to_string())
            .and_then(|text| serde_json::from_str::<Value>(&text).map_err(|err| err.to_string()))
            .and_then(|value| self.apply_environment_overrides(value));
        if let Err(detail) = result {
            error!(
                "failed to load environment configs (path={}): {}",
                path.display(),
                detail
            );
            return Err(ConfigError::Load(format!(
                "failed to load environment configs from {}: {detail}",
                path.display()
            )));
        }
        info!("loaded environment configs (path={})", path.display());
        Ok(())
    }

    fn apply_environment_overrides(&self, document: Value) -> Result<(), String> {
        let Value::Object(sections) = document else {
            return Err("expected a mapping of config names".to_string());
        };
        for (name, overrides) in sections {
            let Some(config) = self.read(|state| state.configs.get(&name).cloned()) else {
                debug!("skipping overrides for unregistered config (name={})", name);
                continue;
            };
            let Value::Object(values) = overrides else {
                return Err(format!("overrides for '{name}' are not a mapping"));
            };
            for (key, value) in values {
                config
                    .set(&key, value)
                    .map_err(|err| format!("config '{name}': {err}"))?;
            }
        }
        Ok(())
    }

    /// Load every config that is not loaded yet. All failures are collected
    /// into one `Load` error.
    pub fn load_all(&self) -> Result<(), ConfigError> {
        let _guard = self.state.lock();
        let mut failures = Vec::new();
        for (name, config) in self.entries() {
            if config.is_loaded() {
                continue;
            }
            if let Err(err) = config.load(None) {
                error!("failed to load config (name={}): {}", name, err);
                failures.push(format!("config '{name}': {err}"));
            }
        }
        if !failures.is_empty() {
            return Err(ConfigError::Load(format!(
                "failed to load some configurations: {}",
                failures.join("; ")
            )));
        }
        info!("all configurations loaded");
        Ok(())
    }

    /// Validate every config. Returns one `Validation` error listing each
    /// failing config and its problems.
    pub fn validate_all(&self) -> Result<(), ConfigError> {
        let _guard = self.state.lock();
        let failures: Vec<String> = self
            .entries()
            .into_iter()
            .filter(|(_, config)| !config.validate())
            .map(|(name, config)| {
                format!("config '{name}': {}", config.validation_errors().join(", "))
            })
            .collect();
        if !failures.is_empty() {
            error!("configuration validation errors: {:?}", failures);
            return Err(ConfigError::validation("configurations", failures));
        }
        info!("all configurations validated");
        Ok(())
    }

    /// Reload every config and stamp `last_reload`. Failures are collected
    /// into one `Load` error.
    pub fn reload_all(&self) -> Result<(), ConfigError> {
        let _guard = self.state.lock();
        let mut failures = Vec::new();
        for (name, config) in self.entries() {
            match config.reload() {
                Ok(_) => debug!("reloaded config (name={})", name),
                Err(err) => {
                    error!("failed to reload config (name={}): {}", name, err);
                    failures.push(format!("config '{name}': {err}"));
                }
            }
        }
        self.write(|state| state.auto_reload.last_reload = Utc::now());
        if !failures.is_empty() {
            return Err(ConfigError::Load(format!(
                "failed to reload some configurations: {}",
                failures.join("; ")
            )));
        }
        info!("all configurations reloaded");
        Ok(())
    }

    pub fn enable_auto_reload(&self, interval: Duration) {
        self.write(|state| {
            state.auto_reload.enabled = true;
            state.auto_reload.interval = interval;
        });
        info!("auto-reload enabled (interval={:?})", interval);
    }

    pub fn disable_auto_reload(&self) {
        self.write(|state| state.auto_reload.enabled = false);
        info!("auto-reload disabled");
    }

    pub fn auto_reload_enabled(&self) -> bool {
        self.read(|state| state.auto_reload.enabled)
    }

    pub fn reload_interval(&self) -> Duration {
        self.read(|state| state.auto_reload.interval)
    }

    pub fn last_reload(&self) -> DateTime<Utc> {
        self.read(|state| state.auto_reload.last_reload)
    }

    /// Run `reload_all` if auto-reload is enabled and the interval has
    /// elapsed. Returns whether a reload ran. Nothing calls this on a timer.
    ///
    /// The registry lock is held from the check through the reload, so
    /// concurrent callers see the new `last_reload` and skip.
    pub fn check_and_reload(&self) -> Result<bool, ConfigError> {
        let _guard = self.state.lock();
        let auto_reload = self.read(|state| state.auto_reload.clone());
        if !auto_reload.enabled {
            return Ok(false);
        }
        let elapsed = Utc::now()
            .signed_duration_since(auto_reload.last_reload)
            .to_std()
            .unwrap_or_default();
        if elapsed < auto_reload.interval {
            return Ok(false);
        }
        self.reload_all()?;
        Ok(true)
    }

    /// Attach an observer to every current and future config.
    pub fn add_global_observer(&self, observer: Arc<dyn ConfigObserver>) {
        let _guard = self.state.lock();
        let already = self.read(|state| {
            state
                .observers
                .iter()
                .any(|existing| Arc::ptr_eq(existing, &observer))
        });
        if already {
            return;
        }
        self.write(|state| state.observers.push(Arc::clone(&observer)));
        for (_, config) in self.entries() {
            config.add_observer(&observer);
        }
    }

    /// Detach an observer from the registry and every current config.
    pub fn remove_global_observer(&self, observer: &Arc<dyn ConfigObserver>) {
        let _guard = self.state.lock();
        self.write(|state| {
            state
                .observers
                .retain(|existing| !Arc::ptr_eq(existing, observer))
        });
        for (_, config) in self.entries() {
            config.remove_observer(observer);
        }
    }

    pub fn container(&self) -> &ServiceContainer {
        &self.container
    }

    /// Register a singleton service.
    pub fn register_service<T>(&self, name: impl Into<String>, service: T)
    where
        T: Any + Send + Sync,
    {
        self.container.register_singleton(name, service);
    }

    /// Register a service constructed on first use.
    pub fn register_factory<T, F>(&self, name: impl Into<String>, factory: F)
    where
        T: Any + Send + Sync,
        F: Fn() -> T + Send + Sync + 'static,
    {
        self.container.register_factory(name, factory);
    }

    pub fn get_service<T>(&self, name: &str) -> Result<Arc<T>, ConfigError>
    where
        T: Any + Send + Sync,
    {
        self.container.get(name)
    }

    /// Snapshot every config plus environment and strategy.
    pub fn backup_all(&self) -> RegistryBackup {
        let _guard = self.state.lock();
        let (environment, strategy) = self.read(|state| (state.environment, state.strategy));
        RegistryBackup {
            timestamp: Utc::now(),
            environment,
            strategy,
            configs: self
                .entries()
                .into_iter()
                .map(|(name, config)| (name, config.backup()))
                .collect(),
        }
    }

    /// Restore every config named in the backup that is registered here.
    /// Returns how many configs were restored.
    pub fn restore_all(&self, backup: &RegistryBackup) -> usize {
        let _guard = self.state.lock();
        let mut restored = 0;
        for (name, snapshot) in &backup.configs {
            match self.read(|state| state.configs.get(name).cloned()) {
                Some(config) => {
                    config.restore(snapshot);
                    restored += 1;
                }
                None => debug!("skipping backup of unregistered config (name={})", name),
            }
        }
        info!(
            "restored configurations (restored={}, in_backup={})",
            restored,
            backup.configs.len()
        );
        restored
    }

    /// Write `backup_all()` to `path`.
    pub fn export_to_file(
        &self,
        path: impl AsRef<Path>,
        format: ExportFormat,
    ) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let text = self.backup_all().encode(format)?;
        fs::write(path, text).map_err(|err| {
            error!("failed to export configurations (path={}): {}", path.display(), err);
            ConfigError::Serialize(format!("failed to write {}: {err}", path.display()))
        })?;
        info!(
            "configurations exported (path={}, format={})",
            path.display(),
            format
        );
        Ok(())
    }

    /// Read a backup from `path` and `restore_all` it.
    pub fn import_from_file(
        &self,
        path: impl AsRef<Path>,
        format: ExportFormat,
    ) -> Result<usize, ConfigError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|err| {
            ConfigError::Load(format!("failed to read {}: {err}", path.display()))
        })?;
        let backup = RegistryBackup::decode(&text, format)?;
        let restored = self.restore_all(&backup);
        info!("configurations imported (path={})", path.display());
        Ok(restored)
    }

    pub fn health_status(&self) -> HealthStatus {
        let _guard = self.state.lock();
        let (environment, strategy, auto_reload) =
            self.read(|state| (state.environment, state.strategy, state.auto_reload.clone()));
        let configs: BTreeMap<String, ConfigHealth> = self
            .entries()
            .into_iter()
            .map(|(name, config)| {
                let loaded = config.is_loaded();
                let health = ConfigHealth {
                    loaded,
                    validated: config.is_validated(),
                    keys_count: if loaded { config.keys().len() } else { 0 },
                };
                (name, health)
            })
            .collect();
        HealthStatus {
            total_configs: configs.len(),
            loaded_configs: configs.values().filter(|c| c.loaded).count(),
            validated_configs: configs.values().filter(|c| c.validated).count(),
            environment,
            strategy,
            auto_reload: auto_reload.enabled,
            last_reload: auto_reload.last_reload,
            configs,
        }
    }

    /// Key counts over loaded configs and their estimated serialized size.
    pub fn statistics(&self) -> Statistics {
        let entries = self.entries();
        let mut config_sizes = BTreeMap::new();
        let mut bytes = 0usize;
        for (name, config) in &entries {
            if !config.is_loaded() {
                continue;
            }
            config_sizes.insert(name.clone(), config.keys().len());
            bytes += serde_json::to_vec(&config.raw_data())
                .map(|encoded| encoded.len())
                .unwrap_or_default();
        }
        let total_keys: usize = config_sizes.values().sum();
        let average_keys_per_config = if entries.is_empty() {
            0.0
        } else {
            total_keys as f64 / entries.len() as f64
        };
        Statistics {
            total_configurations: entries.len(),
            total_keys,
            average_keys_per_config,
            config_sizes,
            memory_usage: format_memory_usage(bytes),
        }
    }
}

impl fmt::Debug for ConfigRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConfigRegistry")
            .field("configs", &self.config_names())
            .field("environment", &self.environment())
            .field("strategy", &self.strategy())
            .finish()
    }
}

impl fmt::Display for ConfigRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ConfigRegistry(configs={}, env={}, strategy={})",
            self.len(),
            self.environment(),
            self.strategy()
        )
    }
}
