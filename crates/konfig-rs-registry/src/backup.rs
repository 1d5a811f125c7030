//! Registry-wide snapshots and their file encodings.

use crate::strategy::{ConfigEnvironment, ConfigStrategy};
use chrono::{DateTime, Utc};
use konfig_rs_core::{ConfigError, ConfigSnapshot};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Snapshot of every registered config plus registry settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegistryBackup {
    pub timestamp: DateTime<Utc>,
    pub environment: ConfigEnvironment,
    pub strategy: ConfigStrategy,
    pub configs: BTreeMap<String, ConfigSnapshot>,
}

impl RegistryBackup {
    /// Encode in the given format.
    pub fn encode(&self, format: ExportFormat) -> Result<String, ConfigError> {
        match format {
            ExportFormat::Json => serde_json::to_string_pretty(self)
                .map_err(|err| ConfigError::Serialize(format!("failed to encode backup: {err}"))),
            ExportFormat::Yaml => serde_yaml::to_string(self)
                .map_err(|err| ConfigError::Serialize(format!("failed to encode backup: {err}"))),
        }
    }

    /// Decode from the given format.
    pub fn decode(text: &str, format: ExportFormat) -> Result<Self, ConfigError> {
        match format {
            ExportFormat::Json => serde_json::from_str(text)
                .map_err(|err| ConfigError::Load(format!("invalid backup: {err}"))),
            ExportFormat::Yaml => serde_yaml::from_str(text)
                .map_err(|err| ConfigError::Load(format!("invalid backup: {err}"))),
        }
    }
}

/// File encoding for `export_to_file`/`import_from_file`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExportFormat {
    #[default]
    Json,
    Yaml,
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExportFormat::Json => f.write_str("json"),
            ExportFormat::Yaml => f.write_str("yaml"),
        }
    }
}

impl FromStr for ExportFormat {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(ExportFormat::Json),
            "yaml" | "yml" => Ok(ExportFormat::Yaml),
            other => Err(ConfigError::Serialize(format!(
                "unsupported format: {other}"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{ExportFormat, RegistryBackup};
    use crate::strategy::{ConfigEnvironment, ConfigStrategy};
    use chrono::Utc;
    use konfig_rs_core::{ConfigErrorKind, ConfigMetadata, ConfigSnapshot};
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::collections::BTreeMap;

    fn backup() -> RegistryBackup {
        let mut metadata = BTreeMap::new();
        metadata.insert("host".to_string(), ConfigMetadata::defaults());
        let snapshot = ConfigSnapshot {
            data: json!({ "host": "localhost" })
                .as_object()
                .cloned()
                .unwrap_or_default(),
            metadata,
        };
        RegistryBackup {
            timestamp: Utc::now(),
            environment: ConfigEnvironment::Staging,
            strategy: ConfigStrategy::Eager,
            configs: BTreeMap::from([("database".to_string(), snapshot)]),
        }
    }

    #[test]
    fn json_layout_uses_primitive_enums() {
        let value = serde_json::to_value(backup()).expect("json");
        assert_eq!(value["environment"], json!("staging"));
        assert_eq!(value["strategy"], json!("eager"));
        assert_eq!(value["configs"]["database"]["data"]["host"], json!("localhost"));
        assert_eq!(
            value["configs"]["database"]["metadata"]["host"]["source"],
            json!("memory")
        );
        assert_eq!(
            value["configs"]["database"]["metadata"]["host"]["priority"],
            json!(1)
        );
    }

    #[test]
    fn both_formats_decode_what_they_encode() {
        let original = backup();
        for format in [ExportFormat::Json, ExportFormat::Yaml] {
            let text = original.encode(format).expect("encode");
            assert_eq!(RegistryBackup::decode(&text, format).expect("decode"), original);
        }
    }

    #[test]
    fn format_names_parse_case_insensitively() {
        assert_eq!("JSON".parse::<ExportFormat>().expect("json"), ExportFormat::Json);
        assert_eq!("yml".parse::<ExportFormat>().expect("yml"), ExportFormat::Yaml);
        assert_eq!(
            "xml".parse::<ExportFormat>().unwrap_err().kind(),
            ConfigErrorKind::Serialize
        );
    }
}
