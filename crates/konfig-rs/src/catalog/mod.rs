//! The application config catalog: eleven named configs with their defaults,
//! required keys and, where one exists, a schema.
//!
//! Catalog configs are plain [`ConfigObject`]s built from a
//! [`StaticDefinition`]; [`CatalogConfig`] only knows how to assemble them.

mod defaults;
mod schemas;

use konfig_rs_core::{ConfigFactory, ConfigLoader, ConfigObject, ConfigPlugins, StaticDefinition};
use konfig_rs_plugins::{FileLoader, MemoryCache, SchemaValidator};
use log::debug;
use serde_json::{Map, Value};
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;

/// File extensions probed, in order, for a config's default source.
pub const SOURCE_EXTENSIONS: [&str; 3] = ["json", "yaml", "yml"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CatalogConfig {
    Application,
    Database,
    Cache,
    Security,
    Logging,
    Payment,
    Notification,
    Ppob,
    Monitoring,
    RateLimit,
    Tasks,
}

impl CatalogConfig {
    pub const ALL: [CatalogConfig; 11] = [
        CatalogConfig::Application,
        CatalogConfig::Database,
        CatalogConfig::Cache,
        CatalogConfig::Security,
        CatalogConfig::Logging,
        CatalogConfig::Payment,
        CatalogConfig::Notification,
        CatalogConfig::Ppob,
        CatalogConfig::Monitoring,
        CatalogConfig::RateLimit,
        CatalogConfig::Tasks,
    ];

    /// Registry name, also used as the factory type tag.
    pub fn name(&self) -> &'static str {
        match self {
            CatalogConfig::Application => "application",
            CatalogConfig::Database => "database",
            CatalogConfig::Cache => "cache",
            CatalogConfig::Security => "security",
            CatalogConfig::Logging => "logging",
            CatalogConfig::Payment => "payment",
            CatalogConfig::Notification => "notification",
            CatalogConfig::Ppob => "ppob",
            CatalogConfig::Monitoring => "monitoring",
            CatalogConfig::RateLimit => "rate_limit",
            CatalogConfig::Tasks => "tasks",
        }
    }

    pub fn required_keys(&self) -> &'static [&'static str] {
        match self {
            CatalogConfig::Application => &["app_name", "host", "port"],
            CatalogConfig::Database => &["host", "port", "database", "username", "password"],
            CatalogConfig::Cache => &["backend"],
            CatalogConfig::Security => &["secret_key"],
            CatalogConfig::Logging => &["level", "format"],
            CatalogConfig::Payment => &["default_gateway", "gateways"],
            CatalogConfig::Ppob => &["providers"],
            CatalogConfig::Tasks => &["broker"],
            CatalogConfig::Notification | CatalogConfig::Monitoring | CatalogConfig::RateLimit => {
                &[]
            }
        }
    }

    /// Default values. Each call for `Security` generates a fresh secret key.
    pub fn default_values(&self) -> Map<String, Value> {
        match self {
            CatalogConfig::Application => defaults::application(),
            CatalogConfig::Database => defaults::database(),
            CatalogConfig::Cache => defaults::cache(),
            CatalogConfig::Security => defaults::security(&defaults::generate_secret_key()),
            CatalogConfig::Logging => defaults::logging(),
            CatalogConfig::Payment => defaults::payment(),
            CatalogConfig::Notification => defaults::notification(),
            CatalogConfig::Ppob => defaults::ppob(),
            CatalogConfig::Monitoring => defaults::monitoring(),
            CatalogConfig::RateLimit => defaults::rate_limit(),
            CatalogConfig::Tasks => defaults::tasks(),
        }
    }

    /// A definition with defaults fixed at construction time.
    pub fn definition(&self) -> StaticDefinition {
        StaticDefinition::new(self.name())
            .with_defaults(self.default_values())
            .with_required(self.required_keys().iter().copied())
    }

    /// Field schema, for the configs that have one.
    pub fn schema(&self) -> Option<SchemaValidator> {
        match self {
            CatalogConfig::Application => Some(schemas::application()),
            CatalogConfig::Database => Some(schemas::database()),
            CatalogConfig::Cache => Some(schemas::cache()),
            CatalogConfig::Security => Some(schemas::security()),
            _ => None,
        }
    }

    /// Build the config with only its schema validator attached.
    pub fn create(&self) -> ConfigObject {
        self.create_with(ConfigPlugins::none())
    }

    /// Build the config with `plugins`. The schema validator is attached
    /// unless `plugins` already carries a validator.
    pub fn create_with(&self, mut plugins: ConfigPlugins) -> ConfigObject {
        if plugins.validator.is_none()
            && let Some(schema) = self.schema()
        {
            plugins.validator = Some(Arc::new(schema));
        }
        ConfigObject::new(Arc::new(self.definition()), plugins)
    }
}

impl fmt::Display for CatalogConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for CatalogConfig {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('-', "_");
        CatalogConfig::ALL
            .into_iter()
            .find(|entry| entry.name() == normalized)
            .ok_or_else(|| format!("unknown catalog config: {s}"))
    }
}

/// Every catalog config with its schema attached, in catalog order.
pub fn create_all_configs() -> Vec<Arc<ConfigObject>> {
    CatalogConfig::ALL
        .iter()
        .map(|entry| Arc::new(entry.create()))
        .collect()
}

/// Every catalog config with a [`FileLoader`] and a [`MemoryCache`]. When
/// `<dir>/<name>.json`, `.yaml` or `.yml` exists it becomes the config's
/// default source.
pub fn create_with_loaders(dir: impl AsRef<Path>) -> Vec<Arc<ConfigObject>> {
    let dir = dir.as_ref();
    let loader: Arc<dyn ConfigLoader> = Arc::new(FileLoader::new());
    CatalogConfig::ALL
        .iter()
        .map(|entry| {
            let source = find_source(dir, entry.name());
            debug!(
                "creating catalog config (name={}, source={:?})",
                entry.name(),
                source
            );
            let plugins = ConfigPlugins {
                loader: Some(Arc::clone(&loader)),
                cache: Some(Arc::new(MemoryCache::new())),
                source,
                ..ConfigPlugins::none()
            };
            Arc::new(entry.create_with(plugins))
        })
        .collect()
}

/// Register every catalog entry as a factory type tag named after it.
pub fn register_catalog_types(factory: &ConfigFactory) {
    for entry in CatalogConfig::ALL {
        factory.register_config_type(entry.name(), move |plugins| entry.create_with(plugins));
    }
}

fn find_source(dir: &Path, name: &str) -> Option<String> {
    SOURCE_EXTENSIONS
        .iter()
        .map(|ext| dir.join(format!("{name}.{ext}")))
        .find(|path| path.is_file())
        .map(|path| path.to_string_lossy().into_owned())
}
