//! Log filters derived from the `logging` config.

use konfig_rs_registry::ConfigRegistry;
use log::{LevelFilter, debug, warn};
use serde_json::Value;

const LOGGING_CONFIG: &str = "logging";

/// Map a level name such as `DEBUG`, `warning` or `critical` to a filter.
/// Unknown names map to `Info`.
pub fn parse_level(name: &str) -> LevelFilter {
    match name.trim().to_ascii_lowercase().as_str() {
        "off" => LevelFilter::Off,
        "critical" | "fatal" | "error" => LevelFilter::Error,
        "warning" | "warn" => LevelFilter::Warn,
        "info" => LevelFilter::Info,
        "debug" => LevelFilter::Debug,
        "trace" | "notset" => LevelFilter::Trace,
        other => {
            warn!("unknown log level, using info (level={})", other);
            LevelFilter::Info
        }
    }
}

/// Build an env_logger filter string from `logging.level` and
/// `logging.loggers.<target>.level`.
pub fn logging_filter(registry: &ConfigRegistry) -> String {
    let level = registry.get_config_value(LOGGING_CONFIG, "level", "INFO");
    let mut directives = vec![directive(level.as_str().unwrap_or("INFO"))];

    if let Value::Object(loggers) = registry.get_config_value(LOGGING_CONFIG, "loggers", Value::Null)
    {
        for (target, settings) in loggers {
            if let Some(level) = settings.get("level").and_then(Value::as_str) {
                directives.push(format!("{target}={}", directive(level)));
            }
        }
    }
    directives.join(",")
}

/// Install a global logger filtered by the `logging` config and return the
/// filter it was built from. Without the `logging` feature nothing is
/// installed.
pub fn setup_logging_from_config(registry: &ConfigRegistry) -> String {
    let filter = logging_filter(registry);

    #[cfg(feature = "logging")]
    {
        let installed = env_logger::Builder::new()
            .parse_filters(&filter)
            .format_timestamp_millis()
            .try_init()
            .is_ok();
        if !installed {
            warn!("logger already installed, keeping it (filter={})", filter);
        }
    }

    debug!("configured logging (filter={})", filter);
    filter
}

fn directive(level: &str) -> String {
    parse_level(level).as_str().to_ascii_lowercase()
}

#[cfg(test)]
mod tests {
    use super::{logging_filter, parse_level};
    use konfig_rs_core::{ConfigObject, StaticDefinition};
    use konfig_rs_registry::ConfigRegistry;
    use log::LevelFilter;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::sync::Arc;

    #[test]
    fn level_names_are_case_insensitive() {
        assert_eq!(parse_level("DEBUG"), LevelFilter::Debug);
        assert_eq!(parse_level("Warning"), LevelFilter::Warn);
        assert_eq!(parse_level("CRITICAL"), LevelFilter::Error);
        assert_eq!(parse_level(" error "), LevelFilter::Error);
        assert_eq!(parse_level("verbose"), LevelFilter::Info);
    }

    #[test]
    fn filter_includes_per_target_levels() {
        let registry = ConfigRegistry::new();
        let logging = ConfigObject::from_definition(
            StaticDefinition::new("logging")
                .with_default("level", "DEBUG")
                .with_default(
                    "loggers",
                    json!({
                        "sqlx": {"level": "WARNING"},
                        "hyper": {"level": "bogus"},
                        "redis": {"handlers": ["console"]}
                    }),
                ),
        );
        registry
            .register_config("logging", Arc::new(logging), false)
            .expect("register");

        assert_eq!(logging_filter(&registry), "debug,hyper=info,sqlx=warn");
    }

    #[test]
    fn missing_logging_config_defaults_to_info() {
        assert_eq!(logging_filter(&ConfigRegistry::new()), "info");
    }
}
