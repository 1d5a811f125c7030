use konfig_rs_core::{ConfigError, ConfigLoader, ConfigSource, is_sensitive_key};
use log::{debug, error, info, warn};
use serde_json::{Map, Number, Value};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Shown in summaries in place of a sensitive value that is set.
pub const HIDDEN_VALUE: &str = "***HIDDEN***";
/// Shown in summaries for a sensitive variable that is empty.
pub const NOT_SET: &str = "NOT_SET";

/// Reads environment variables sharing a prefix.
///
/// `APP_DB_HOST=x` with prefix `APP_` loads as `{"db_host": "x"}`. The source
/// identifier passed to `load` is ignored.
///
/// Variables from an optional `.env` file are layered under the process
/// environment: a variable set in both places takes the process value. The
/// file is parsed with `dotenvy` and never written into the process
/// environment.
#[derive(Debug, Clone, Default)]
pub struct EnvironmentLoader {
    prefix: String,
    env_file: Option<PathBuf>,
    file_vars: BTreeMap<String, String>,
}

impl EnvironmentLoader {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            ..Default::default()
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// The `.env` file in use, if any.
    pub fn env_file(&self) -> Option<&Path> {
        self.env_file.as_deref()
    }

    /// Read variables from a dotenv file. A missing or malformed file is a
    /// `Load` error.
    pub fn with_env_file(mut self, path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let entries = dotenvy::from_path_iter(path).map_err(|err| {
            error!("failed to open env file (path={}): {}", path.display(), err);
            ConfigError::Load(format!("{}: {err}", path.display()))
        })?;
        let mut file_vars = BTreeMap::new();
        for entry in entries {
            let (name, value) =
                entry.map_err(|err| ConfigError::Load(format!("{}: {err}", path.display())))?;
            file_vars.insert(name, value);
        }
        info!(
            "loaded env file (path={}, count={})",
            path.display(),
            file_vars.len()
        );
        self.file_vars = file_vars;
        self.env_file = Some(path.to_path_buf());
        Ok(self)
    }

    /// Use the nearest `.env` found from `start` upwards. Without one, only
    /// the process environment is read.
    pub fn with_discovered_env_file(self, start: impl AsRef<Path>) -> Result<Self, ConfigError> {
        match find_env_file(start.as_ref()) {
            Some(path) => self.with_env_file(path),
            None => {
                warn!(
                    "no .env file found from {}, using process environment",
                    start.as_ref().display()
                );
                Ok(self)
            }
        }
    }

    /// Value of a variable by its full name. Process variables win over the
    /// env file.
    pub fn get(&self, name: &str) -> Option<String> {
        std::env::var(name)
            .ok()
            .or_else(|| self.file_vars.get(name).cloned())
    }

    /// Integer value, or `default` when missing or unparseable.
    pub fn get_int(&self, name: &str, default: i64) -> i64 {
        self.get(name)
            .and_then(|raw| raw.trim().parse().ok())
            .unwrap_or(default)
    }

    /// `true/1/yes/on` and `false/0/no/off`, case-insensitive. Anything else
    /// yields `default`.
    pub fn get_bool(&self, name: &str, default: bool) -> bool {
        match self.get(name).map(|raw| raw.to_lowercase()).as_deref() {
            Some("true" | "1" | "yes" | "on") => true,
            Some("false" | "0" | "no" | "off") => false,
            _ => default,
        }
    }

    /// A JSON array, or comma-separated items with surrounding whitespace and
    /// quotes stripped. Missing or empty yields `default`.
    pub fn get_list(&self, name: &str, default: &[&str]) -> Vec<String> {
        let raw = match self.get(name) {
            Some(raw) if !raw.is_empty() => raw,
            _ => return default.iter().map(|item| item.to_string()).collect(),
        };
        if raw.starts_with('[')
            && raw.ends_with(']')
            && let Ok(items) = serde_json::from_str::<Vec<Value>>(&raw)
        {
            return items
                .into_iter()
                .map(|item| match item {
                    Value::String(text) => text,
                    other => other.to_string(),
                })
                .collect();
        }
        raw.split(',')
            .map(|item| {
                item.trim()
                    .trim_matches('"')
                    .trim_matches('\'')
                    .to_string()
            })
            .collect()
    }

    /// Fail with a `Validation` error naming every variable that is missing
    /// or empty.
    pub fn validate_required<I, S>(&self, names: I) -> Result<(), ConfigError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let missing: Vec<String> = names
            .into_iter()
            .filter(|name| self.get(name.as_ref()).is_none_or(|value| value.is_empty()))
            .map(|name| format!("missing required variable '{}'", name.as_ref()))
            .collect();
        if missing.is_empty() {
            return Ok(());
        }
        error!("required environment variables missing: {}", missing.join(", "));
        Err(ConfigError::validation("environment", missing))
    }

    /// Prefixed variables by full name, with sensitive values masked.
    pub fn summary(&self) -> BTreeMap<String, String> {
        self.vars()
            .into_iter()
            .filter(|(name, _)| name.starts_with(self.prefix.as_str()))
            .map(|(name, value)| {
                let shown = if !is_sensitive_key(&name) {
                    value
                } else if value.is_empty() {
                    NOT_SET.to_string()
                } else {
                    HIDDEN_VALUE.to_string()
                };
                (name, shown)
            })
            .collect()
    }

    /// Build the mapping from arbitrary name/value pairs.
    pub fn load_from_iter<I>(&self, vars: I) -> Map<String, Value>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        vars.into_iter()
            .filter_map(|(name, raw)| {
                let key = name.strip_prefix(self.prefix.as_str())?;
                Some((key.to_lowercase(), coerce_value(&raw)))
            })
            .collect()
    }

    /// Env file variables overlaid with the process environment.
    fn vars(&self) -> BTreeMap<String, String> {
        let mut vars = self.file_vars.clone();
        vars.extend(std::env::vars_os().filter_map(|(name, value)| {
            Some((name.into_string().ok()?, value.into_string().ok()?))
        }));
        vars
    }
}

/// Nearest `.env` file in `start` or one of its ancestors.
pub fn find_env_file(start: &Path) -> Option<PathBuf> {
    start
        .ancestors()
        .map(|dir| dir.join(".env"))
        .find(|candidate| candidate.is_file())
}

/// Coerce a raw variable: boolean, integer, float, JSON literal, then string.
pub fn coerce_value(raw: &str) -> Value {
    let lowered = raw.to_ascii_lowercase();
    if lowered == "true" || lowered == "false" {
        return Value::Bool(lowered == "true");
    }
    let trimmed = raw.trim();
    if let Ok(int) = trimmed.parse::<i64>() {
        return Value::Number(int.into());
    }
    if let Ok(big) = trimmed.parse::<u64>() {
        return Value::Number(big.into());
    }
    if let Ok(float) = trimmed.parse::<f64>()
        && let Some(number) = Number::from_f64(float)
    {
        return Value::Number(number);
    }
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}

impl ConfigLoader for EnvironmentLoader {
    fn load(&self, _source: &str) -> Result<Map<String, Value>, ConfigError> {
        let loaded = self.load_from_iter(self.vars());
        debug!(
            "loaded environment variables (prefix={}, count={})",
            self.prefix,
            loaded.len()
        );
        Ok(loaded)
    }

    fn source(&self) -> ConfigSource {
        ConfigSource::Environment
    }
}

#[cfg(test)]
mod tests {
    use super::{EnvironmentLoader, HIDDEN_VALUE, NOT_SET, coerce_value, find_env_file};
    use konfig_rs_core::{ConfigErrorKind, ConfigLoader, ConfigSource};
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn coercion_follows_priority_order() {
        assert_eq!(coerce_value("TRUE"), json!(true));
        assert_eq!(coerce_value("false"), json!(false));
        assert_eq!(coerce_value("9090"), json!(9090));
        assert_eq!(coerce_value("-3"), json!(-3));
        assert_eq!(
            coerce_value("18446744073709551615"),
            json!(18446744073709551615u64)
        );
        assert_eq!(coerce_value("18446744073709551616"), json!(1.8446744073709552e19));
        assert_eq!(coerce_value("0.25"), json!(0.25));
        assert_eq!(coerce_value("[1, 2]"), json!([1, 2]));
        assert_eq!(coerce_value(r#"{"a": 1}"#), json!({ "a": 1 }));
        assert_eq!(coerce_value("null"), json!(null));
        assert_eq!(coerce_value("localhost"), json!("localhost"));
        assert_eq!(coerce_value("inf"), json!("inf"));
    }

    #[test]
    fn prefix_is_case_sensitive_and_stripped() {
        let loader = EnvironmentLoader::new("APP_");
        let loaded = loader.load_from_iter([
            ("APP_PORT".to_string(), "9090".to_string()),
            ("APP_Log_Level".to_string(), "debug".to_string()),
            ("app_ignored".to_string(), "x".to_string()),
            ("OTHER".to_string(), "y".to_string()),
        ]);
        assert_eq!(
            serde_json::Value::Object(loaded),
            json!({ "port": 9090, "log_level": "debug" })
        );
    }

    #[test]
    fn reads_process_environment() {
        temp_env::with_vars(
            [
                ("KONFIG_TEST_PORT", Some("9090")),
                ("KONFIG_TEST_DEBUG", Some("true")),
            ],
            || {
                let loaded = EnvironmentLoader::new("KONFIG_TEST_")
                    .load("ignored")
                    .expect("load");
                assert_eq!(loaded["port"], json!(9090));
                assert_eq!(loaded["debug"], json!(true));
            },
        );
    }

    #[test]
    fn reports_environment_source() {
        assert_eq!(
            EnvironmentLoader::new("X_").source(),
            ConfigSource::Environment
        );
    }

    #[test]
    fn env_file_is_layered_under_process_variables() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join(".env");
        fs::write(
            &path,
            "KONFIG_DOT_PORT=9000\nKONFIG_DOT_HOST=file.local\n# comment\nKONFIG_DOT_NAME=\"shop api\"\n",
        )
        .expect("write env file");

        temp_env::with_vars(
            [
                ("KONFIG_DOT_HOST", Some("process.local")),
                ("KONFIG_DOT_PORT", None),
                ("KONFIG_DOT_NAME", None),
            ],
            || {
                let loader = EnvironmentLoader::new("KONFIG_DOT_")
                    .with_env_file(&path)
                    .expect("env file");
                assert_eq!(loader.env_file(), Some(path.as_path()));
                assert_eq!(loader.get("KONFIG_DOT_NAME"), Some("shop api".to_string()));

                let loaded = loader.load("ignored").expect("load");
                assert_eq!(loaded["port"], json!(9000));
                assert_eq!(loaded["host"], json!("process.local"));
                assert_eq!(loaded["name"], json!("shop api"));
                assert!(std::env::var("KONFIG_DOT_PORT").is_err());
            },
        );
    }

    #[test]
    fn missing_env_file_is_load_error() {
        let dir = tempdir().expect("tempdir");
        let err = EnvironmentLoader::new("APP_")
            .with_env_file(dir.path().join("absent.env"))
            .unwrap_err();
        assert_eq!(err.kind(), ConfigErrorKind::Load);
        assert!(err.to_string().contains("absent.env"));
    }

    #[test]
    fn env_file_is_discovered_in_parent_directories() {
        let dir = tempdir().expect("tempdir");
        let nested = dir.path().join("services").join("api");
        fs::create_dir_all(&nested).expect("nested dirs");
        fs::write(dir.path().join(".env"), "KONFIG_FOUND_MODE=parent\n").expect("write");

        assert_eq!(find_env_file(&nested), Some(dir.path().join(".env")));

        fs::write(nested.join(".env"), "KONFIG_FOUND_MODE=nearest\n").expect("write");
        temp_env::with_var_unset("KONFIG_FOUND_MODE", || {
            let loader = EnvironmentLoader::new("KONFIG_FOUND_")
                .with_discovered_env_file(&nested)
                .expect("discover");
            assert_eq!(loader.env_file(), Some(nested.join(".env").as_path()));
            assert_eq!(loader.get("KONFIG_FOUND_MODE"), Some("nearest".to_string()));
        });
    }

    #[test]
    fn typed_getters_fall_back_to_defaults() {
        temp_env::with_vars(
            [
                ("KONFIG_GET_PORT", Some(" 8080 ")),
                ("KONFIG_GET_BAD_PORT", Some("eighty")),
                ("KONFIG_GET_RELOAD", Some("Yes")),
                ("KONFIG_GET_METRICS", Some("off")),
                ("KONFIG_GET_FLAG", Some("maybe")),
                ("KONFIG_GET_HOSTS", Some(" localhost , '127.0.0.1',\"api\" ")),
                ("KONFIG_GET_ORIGINS", Some(r#"["https://a.example", 3]"#)),
                ("KONFIG_GET_BROKEN", Some("[a, b]")),
                ("KONFIG_GET_EMPTY", Some("")),
            ],
            || {
                let loader = EnvironmentLoader::new("KONFIG_GET_");
                assert_eq!(loader.get_int("KONFIG_GET_PORT", 8000), 8080);
                assert_eq!(loader.get_int("KONFIG_GET_BAD_PORT", 8000), 8000);
                assert_eq!(loader.get_int("KONFIG_GET_MISSING", 7), 7);

                assert!(loader.get_bool("KONFIG_GET_RELOAD", false));
                assert!(!loader.get_bool("KONFIG_GET_METRICS", true));
                assert!(loader.get_bool("KONFIG_GET_FLAG", true));
                assert!(!loader.get_bool("KONFIG_GET_MISSING", false));

                assert_eq!(
                    loader.get_list("KONFIG_GET_HOSTS", &[]),
                    vec!["localhost", "127.0.0.1", "api"]
                );
                assert_eq!(
                    loader.get_list("KONFIG_GET_ORIGINS", &[]),
                    vec!["https://a.example", "3"]
                );
                assert_eq!(loader.get_list("KONFIG_GET_BROKEN", &[]), vec!["[a", "b]"]);
                assert_eq!(
                    loader.get_list("KONFIG_GET_EMPTY", &["localhost"]),
                    vec!["localhost"]
                );
            },
        );
    }

    #[test]
    fn validate_required_names_missing_and_empty_variables() {
        temp_env::with_vars(
            [
                ("KONFIG_REQ_URL", Some("sqlite://memory")),
                ("KONFIG_REQ_TOKEN", Some("")),
                ("KONFIG_REQ_USER", None),
            ],
            || {
                let loader = EnvironmentLoader::new("KONFIG_REQ_");
                loader.validate_required(["KONFIG_REQ_URL"]).expect("present");

                let err = loader
                    .validate_required(["KONFIG_REQ_URL", "KONFIG_REQ_TOKEN", "KONFIG_REQ_USER"])
                    .unwrap_err();
                assert_eq!(err.kind(), ConfigErrorKind::Validation);
                let message = err.to_string();
                assert!(message.contains("environment"));
                assert!(message.contains("KONFIG_REQ_TOKEN"));
                assert!(message.contains("KONFIG_REQ_USER"));
                assert!(!message.contains("KONFIG_REQ_URL"));
            },
        );
    }

    #[test]
    fn summary_masks_sensitive_variables() {
        temp_env::with_vars(
            [
                ("KONFIG_SUM_HOST", Some("db.local")),
                ("KONFIG_SUM_SECRET_KEY", Some("s3cret")),
                ("KONFIG_SUM_SMTP_PASSWORD", Some("")),
            ],
            || {
                let summary = EnvironmentLoader::new("KONFIG_SUM_").summary();
                assert_eq!(summary.len(), 3);
                assert_eq!(summary["KONFIG_SUM_HOST"], "db.local");
                assert_eq!(summary["KONFIG_SUM_SECRET_KEY"], HIDDEN_VALUE);
                assert_eq!(summary["KONFIG_SUM_SMTP_PASSWORD"], NOT_SET);
            },
        );
    }
}
