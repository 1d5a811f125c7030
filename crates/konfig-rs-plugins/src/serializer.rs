//! JSON and YAML text encodings of a config mapping.

use konfig_rs_core::{ConfigError, ConfigSerializer};
use serde_json::{Map, Value};

/// Pretty-printed JSON.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonSerializer;

impl ConfigSerializer for JsonSerializer {
    fn serialize(&self, data: &Map<String, Value>) -> Result<String, ConfigError> {
        serde_json::to_string_pretty(data)
            .map_err(|err| ConfigError::Serialize(format!("failed to serialize to JSON: {err}")))
    }

    fn deserialize(&self, text: &str) -> Result<Map<String, Value>, ConfigError> {
        let value: Value = serde_json::from_str(text)
            .map_err(|err| ConfigError::Serialize(format!("failed to deserialize JSON: {err}")))?;
        into_mapping(value, "JSON")
    }
}

/// Block-style YAML. An empty document decodes to an empty mapping.
#[derive(Debug, Clone, Copy, Default)]
pub struct YamlSerializer;

impl ConfigSerializer for YamlSerializer {
    fn serialize(&self, data: &Map<String, Value>) -> Result<String, ConfigError> {
        serde_yaml::to_string(data)
            .map_err(|err| ConfigError::Serialize(format!("failed to serialize to YAML: {err}")))
    }

    fn deserialize(&self, text: &str) -> Result<Map<String, Value>, ConfigError> {
        if text.trim().is_empty() {
            return Ok(Map::new());
        }
        let value: Value = serde_yaml::from_str(text)
            .map_err(|err| ConfigError::Serialize(format!("failed to deserialize YAML: {err}")))?;
        if value.is_null() {
            return Ok(Map::new());
        }
        into_mapping(value, "YAML")
    }
}

fn into_mapping(value: Value, format: &str) -> Result<Map<String, Value>, ConfigError> {
    match value {
        Value::Object(map) => Ok(map),
        _ => Err(ConfigError::Serialize(format!(
            "{format} document is not a mapping"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::{JsonSerializer, YamlSerializer};
    use konfig_rs_core::{ConfigErrorKind, ConfigSerializer};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn sample() -> serde_json::Map<String, serde_json::Value> {
        json!({ "host": "db", "port": 5432, "pool": { "size": 5 }, "tags": ["a", "b"] })
            .as_object()
            .cloned()
            .unwrap_or_default()
    }

    #[test]
    fn json_output_is_pretty_and_decodes() {
        let text = JsonSerializer.serialize(&sample()).expect("serialize");
        assert!(text.contains("\n  \"host\": \"db\""));
        assert_eq!(JsonSerializer.deserialize(&text).expect("deserialize"), sample());
    }

    #[test]
    fn yaml_decodes_block_style() {
        let text = YamlSerializer.serialize(&sample()).expect("serialize");
        assert!(text.contains("host: db"));
        assert_eq!(YamlSerializer.deserialize(&text).expect("deserialize"), sample());
        assert!(YamlSerializer.deserialize("").expect("empty").is_empty());
    }

    #[test]
    fn malformed_input_is_serialize_error() {
        let err = JsonSerializer.deserialize("{ not json").unwrap_err();
        assert_eq!(err.kind(), ConfigErrorKind::Serialize);
        let err = YamlSerializer.deserialize("key: [unclosed").unwrap_err();
        assert_eq!(err.kind(), ConfigErrorKind::Serialize);
        let err = JsonSerializer.deserialize("[1]").unwrap_err();
        assert!(err.to_string().contains("not a mapping"));
    }
}
