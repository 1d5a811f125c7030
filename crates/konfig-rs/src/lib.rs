//! Public surface for konfig-rs.
//!
//! This crate re-exports the building blocks from the member crates, ships the
//! application config catalog and provides the startup helpers that wire a
//! [`ConfigRegistry`] up from a config directory.

pub mod catalog;
mod init;
mod logging;

/// Re-export for convenience.
pub use konfig_rs_core as core;
/// Re-export for convenience.
pub use konfig_rs_plugins as plugins;
/// Re-export for convenience.
pub use konfig_rs_registry as registry;

pub use catalog::{CatalogConfig, create_all_configs, create_with_loaders, register_catalog_types};
pub use init::initialize_configs;
pub use konfig_rs_core::{
    ConfigBuilder, ConfigDefinition, ConfigError, ConfigErrorKind, ConfigMetadata, ConfigObject,
    ConfigObserver, ConfigPlugins, ConfigPriority, ConfigSource, StaticDefinition,
};
pub use konfig_rs_registry::{
    ConfigEnvironment, ConfigOverride, ConfigRegistry, ConfigStrategy, ExportFormat,
    config_required, with_config, with_overrides,
};
pub use logging::{logging_filter, parse_level, setup_logging_from_config};

#[inline]
/// Initialize logging using env_logger if the "logging" feature is enabled.
///
/// This is a no-op if the feature is not enabled.
pub fn init_logging() {
    #[cfg(feature = "logging")]
    {
        let _ = env_logger::try_init();
    }
}
