use crate::catalog::create_with_loaders;
use konfig_rs_core::ConfigError;
use konfig_rs_registry::{ConfigEnvironment, ConfigRegistry};
use log::{info, warn};
use std::path::Path;

/// Populate `registry` with the whole catalog.
///
/// Sets the environment (unknown names fall back to development), loads every
/// catalog config from `dir`, registers it, then applies
/// `<dir>/<environment>.json`. A broken environment file only logs a warning.
/// Validation problems are returned as `config '<name>': <error>` lines
/// rather than failing; a config that cannot be loaded at all is an error.
pub fn initialize_configs(
    registry: &ConfigRegistry,
    dir: impl AsRef<Path>,
    environment: &str,
) -> Result<Vec<String>, ConfigError> {
    let dir = dir.as_ref();
    registry.set_environment(ConfigEnvironment::from_name_or_default(environment));

    for config in create_with_loaders(dir) {
        config.load(None)?;
        registry.register_config(config.name().to_string(), config, false)?;
    }

    if let Err(err) = registry.load_environment_configs(dir) {
        warn!("failed to apply environment configs: {}", err);
    }

    let mut warnings = Vec::new();
    for (name, config) in registry.configs() {
        if !config.validate() {
            warnings.extend(
                config
                    .validation_errors()
                    .into_iter()
                    .map(|error| format!("config '{name}': {error}")),
            );
        }
    }
    if !warnings.is_empty() {
        warn!("configuration validation warnings: {:?}", warnings);
    }

    info!(
        "initialized configs (dir={}, environment={}, configs={}, warnings={})",
        dir.display(),
        registry.environment(),
        registry.len(),
        warnings.len()
    );
    Ok(warnings)
}
