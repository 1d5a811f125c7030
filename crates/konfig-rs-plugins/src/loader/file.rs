use super::ini;
use konfig_rs_core::{ConfigError, ConfigLoader, ConfigSource};
use log::{debug, error};
use serde_json::{Map, Value};
use std::fs;
use std::path::Path;

/// Reads JSON, YAML or INI files, chosen by extension.
#[derive(Debug, Clone, Copy, Default)]
pub struct FileLoader;

impl FileLoader {
    pub fn new() -> Self {
        Self
    }

    /// Parse `contents` as the format implied by `extension`.
    pub fn parse(extension: &str, contents: &str) -> Result<Map<String, Value>, ConfigError> {
        let value = match extension.to_ascii_lowercase().as_str() {
            "json" => serde_json::from_str::<Value>(contents)
                .map_err(|err| ConfigError::Load(format!("invalid JSON: {err}")))?,
            "yaml" | "yml" if contents.trim().is_empty() => Value::Object(Map::new()),
            "yaml" | "yml" => {
                let value: Value = serde_yaml::from_str(contents)
                    .map_err(|err| ConfigError::Load(format!("invalid YAML: {err}")))?;
                if value.is_null() {
                    Value::Object(Map::new())
                } else {
                    value
                }
            }
            "ini" | "cfg" => Value::Object(ini::parse(contents)?),
            other => {
                return Err(ConfigError::Load(format!(
                    "unsupported file format: .{other}"
                )));
            }
        };
        match value {
            Value::Object(map) => Ok(map),
            other => Err(ConfigError::Load(format!(
                "expected a mapping at the top level, found {}",
                kind_name(&other)
            ))),
        }
    }
}

fn kind_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

impl ConfigLoader for FileLoader {
    fn load(&self, source: &str) -> Result<Map<String, Value>, ConfigError> {
        let path = Path::new(source);
        if !path.exists() {
            return Err(ConfigError::Load(format!(
                "configuration file not found: {source}"
            )));
        }
        debug!("loading config file (path={})", path.display());

        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .unwrap_or_default();
        let result = fs::read_to_string(path)
            .map_err(|err| ConfigError::Load(err.to_string()))
            .and_then(|contents| Self::parse(extension, &contents));

        result.map_err(|err| {
            error!("failed to load config file (path={}): {}", source, err);
            let detail = match err {
                ConfigError::Load(detail) => detail,
                other => other.to_string(),
            };
            ConfigError::Load(format!("failed to load config from {source}: {detail}"))
        })
    }

    fn source(&self) -> ConfigSource {
        ConfigSource::File
    }
}

#[cfg(test)]
mod tests {
    use super::FileLoader;
    use konfig_rs_core::{ConfigErrorKind, ConfigLoader, ConfigSource};
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn loads_json_yaml_and_ini() {
        let temp = TempDir::new().expect("tmp");
        let json_path = temp.path().join("database.json");
        fs::write(&json_path, r#"{"host": "db", "port": 5432}"#).expect("write");
        let yaml_path = temp.path().join("cache.yml");
        fs::write(&yaml_path, "ttl: 300\nredis:\n  host: r1\n").expect("write");
        let ini_path = temp.path().join("app.ini");
        fs::write(&ini_path, "[server]\nport = 8000\n").expect("write");

        let loader = FileLoader::new();
        let db = loader.load(json_path.to_str().expect("utf8")).expect("json");
        assert_eq!(db["port"], json!(5432));
        let cache = loader.load(yaml_path.to_str().expect("utf8")).expect("yaml");
        assert_eq!(cache["redis"], json!({ "host": "r1" }));
        let app = loader.load(ini_path.to_str().expect("utf8")).expect("ini");
        assert_eq!(app["server"], json!({ "port": "8000" }));
    }

    #[test]
    fn empty_yaml_is_empty_mapping() {
        assert!(FileLoader::parse("yaml", "").expect("parse").is_empty());
    }

    #[test]
    fn missing_file_error_names_the_path() {
        let temp = TempDir::new().expect("tmp");
        let path = temp.path().join("nope.json");
        let source = path.to_str().expect("utf8");
        let err = FileLoader::new().load(source).unwrap_err();
        assert_eq!(err.kind(), ConfigErrorKind::Load);
        assert!(err.to_string().contains(source));
    }

    #[test]
    fn unsupported_extension_is_load_error() {
        let temp = TempDir::new().expect("tmp");
        let path = temp.path().join("settings.toml");
        fs::write(&path, "a = 1").expect("write");
        let err = FileLoader::new().load(path.to_str().expect("utf8")).unwrap_err();
        assert_eq!(err.kind(), ConfigErrorKind::Load);
        assert!(err.to_string().contains("unsupported file format: .toml"));
    }

    #[test]
    fn top_level_must_be_a_mapping() {
        let err = FileLoader::parse("json", "[1, 2]").unwrap_err();
        assert!(err.to_string().contains("found array"));
    }

    #[test]
    fn supports_only_file_sources() {
        let loader = FileLoader::new();
        assert!(loader.supports_source(ConfigSource::File));
        assert!(!loader.supports_source(ConfigSource::Environment));
    }
}
