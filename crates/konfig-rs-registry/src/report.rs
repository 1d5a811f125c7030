//! Health and statistics reports.

use crate::strategy::{ConfigEnvironment, ConfigStrategy};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

/// Registry health summary.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HealthStatus {
    pub total_configs: usize,
    pub loaded_configs: usize,
    pub validated_configs: usize,
    pub environment: ConfigEnvironment,
    pub strategy: ConfigStrategy,
    pub auto_reload: bool,
    pub last_reload: DateTime<Utc>,
    pub configs: BTreeMap<String, ConfigHealth>,
}

/// Per-config health entry. `keys_count` is 0 for unloaded configs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConfigHealth {
    pub loaded: bool,
    pub validated: bool,
    pub keys_count: usize,
}

/// Key counts over loaded configs.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Statistics {
    pub total_configurations: usize,
    pub total_keys: usize,
    pub average_keys_per_config: f64,
    pub config_sizes: BTreeMap<String, usize>,
    pub memory_usage: String,
}

/// Human-readable byte count: `N bytes`, `x.xx KB` or `x.xx MB`.
pub fn format_memory_usage(bytes: usize) -> String {
    const KB: usize = 1024;
    if bytes < KB {
        format!("{bytes} bytes")
    } else if bytes < KB * KB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{:.2} MB", bytes as f64 / (KB * KB) as f64)
    }
}
