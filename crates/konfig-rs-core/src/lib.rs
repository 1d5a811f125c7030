//! Config objects, plugin contracts and construction helpers.

pub mod builder;
pub mod error;
pub mod factory;
pub mod metadata;
pub mod object;
pub mod plugin;
pub mod value;

pub use builder::ConfigBuilder;
pub use error::{ConfigError, ConfigErrorKind};
pub use factory::{ConfigConstructor, ConfigFactory};
pub use metadata::{ConfigMetadata, ConfigPriority, ConfigSource, DEFAULT_METADATA_VERSION};
pub use object::{
    ConfigDefinition, ConfigObject, ConfigSnapshot, SENSITIVE_PATTERNS, StaticDefinition,
    is_sensitive_key,
};
pub use plugin::{
    ConfigCache, ConfigEncryptor, ConfigLoader, ConfigObserver, ConfigPlugins, ConfigSerializer,
    ConfigValidator,
};
