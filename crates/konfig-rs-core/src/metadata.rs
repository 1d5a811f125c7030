//! Per-key metadata recorded alongside config values.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Default version stamped on new metadata records.
pub const DEFAULT_METADATA_VERSION: &str = "1.0.0";

/// Where a config value came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfigSource {
    Environment,
    File,
    Database,
    Remote,
    Memory,
}

impl ConfigSource {
    /// Stable lowercase name used in snapshots.
    pub fn as_str(&self) -> &'static str {
        match self {
            ConfigSource::Environment => "environment",
            ConfigSource::File => "file",
            ConfigSource::Database => "database",
            ConfigSource::Remote => "remote",
            ConfigSource::Memory => "memory",
        }
    }
}

impl fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Relative priority of a value. Serialized as its integer level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum ConfigPriority {
    Low = 1,
    Medium = 2,
    High = 3,
    Critical = 4,
}

impl From<ConfigPriority> for u8 {
    fn from(priority: ConfigPriority) -> Self {
        priority as u8
    }
}

impl TryFrom<u8> for ConfigPriority {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(ConfigPriority::Low),
            2 => Ok(ConfigPriority::Medium),
            3 => Ok(ConfigPriority::High),
            4 => Ok(ConfigPriority::Critical),
            other => Err(format!("invalid config priority: {other}")),
        }
    }
}

/// Metadata for a single key. Replaced wholesale on every `set`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigMetadata {
    pub source: ConfigSource,
    pub priority: ConfigPriority,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default = "default_version")]
    pub version: String,
    #[serde(default)]
    pub encrypted: bool,
    #[serde(default)]
    pub cached: bool,
}

fn default_version() -> String {
    DEFAULT_METADATA_VERSION.to_string()
}

impl ConfigMetadata {
    /// Create a record stamped with the current time.
    pub fn new(source: ConfigSource, priority: ConfigPriority) -> Self {
        Self {
            source,
            priority,
            created_at: Utc::now(),
            updated_at: None,
            version: default_version(),
            encrypted: false,
            cached: false,
        }
    }

    /// Default record for values written through `set` without metadata.
    pub fn memory() -> Self {
        Self::new(ConfigSource::Memory, ConfigPriority::Medium)
    }

    /// Record for default values filled in by the config definition.
    pub fn defaults() -> Self {
        Self::new(ConfigSource::Memory, ConfigPriority::Low)
    }

    /// Set the version string.
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }
}
