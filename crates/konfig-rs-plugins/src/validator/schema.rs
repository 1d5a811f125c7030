use super::{ValueKind, type_error};
use konfig_rs_core::ConfigValidator;
use log::debug;
use parking_lot::Mutex;
use regex::Regex;
use serde_json::Value;
use std::collections::HashMap;

/// Constraints for a single top-level key.
#[derive(Debug, Clone, Default)]
pub struct FieldSchema {
    pub required: bool,
    pub kind: Option<ValueKind>,
    pub min: Option<f64>,
    pub max: Option<f64>,
    /// Matched at the start of the string.
    pub pattern: Option<Regex>,
    pub choices: Vec<Value>,
}

impl FieldSchema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn of_kind(kind: ValueKind) -> Self {
        Self {
            kind: Some(kind),
            ..Self::default()
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn min(mut self, min: f64) -> Self {
        self.min = Some(min);
        self
    }

    pub fn max(mut self, max: f64) -> Self {
        self.max = Some(max);
        self
    }

    pub fn range(self, min: f64, max: f64) -> Self {
        self.min(min).max(max)
    }

    pub fn pattern(mut self, pattern: Regex) -> Self {
        self.pattern = Some(pattern);
        self
    }

    pub fn choices<I, V>(mut self, choices: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.choices = choices.into_iter().map(Into::into).collect();
        self
    }

    /// First violated constraint, if any.
    fn check(&self, key: &str, value: &Value) -> Option<String> {
        if value.is_null() {
            return self.required.then(|| format!("'{key}' is required"));
        }

        if let Some(kind) = self.kind
            && !kind.matches(value)
        {
            return Some(type_error(key, kind));
        }

        if let Some(number) = value.as_f64() {
            if let Some(min) = self.min
                && number < min
            {
                return Some(format!("'{key}' must be >= {}", format_bound(min)));
            }
            if let Some(max) = self.max
                && number > max
            {
                return Some(format!("'{key}' must be <= {}", format_bound(max)));
            }
        }

        if let (Some(text), Some(pattern)) = (value.as_str(), &self.pattern) {
            let anchored = pattern.find(text).is_some_and(|m| m.start() == 0);
            if !anchored {
                return Some(format!(
                    "'{key}' does not match pattern {}",
                    pattern.as_str()
                ));
            }
        }

        if !self.choices.is_empty() && !self.choices.contains(value) {
            let listed: Vec<String> = self.choices.iter().map(Value::to_string).collect();
            return Some(format!("'{key}' must be one of [{}]", listed.join(", ")));
        }

        None
    }
}

/// Integral bounds print without a trailing `.0`.
fn format_bound(bound: f64) -> String {
    if bound.fract() == 0.0 && bound.abs() < 1e15 {
        format!("{}", bound as i64)
    } else {
        bound.to_string()
    }
}

/// Validates keys against per-key [`FieldSchema`] entries. Keys without an
/// entry always pass.
#[derive(Debug, Default)]
pub struct SchemaValidator {
    schema: HashMap<String, FieldSchema>,
    last_errors: Mutex<Vec<String>>,
}

impl SchemaValidator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace the entry for `key`.
    pub fn with_field(mut self, key: impl Into<String>, field: FieldSchema) -> Self {
        self.schema.insert(key.into(), field);
        self
    }

    pub fn field(&self, key: &str) -> Option<&FieldSchema> {
        self.schema.get(key)
    }

    pub fn len(&self) -> usize {
        self.schema.len()
    }

    pub fn is_empty(&self) -> bool {
        self.schema.is_empty()
    }
}

impl ConfigValidator for SchemaValidator {
    fn validate(&self, key: &str, value: &Value) -> Result<(), Vec<String>> {
        let errors: Vec<String> = self
            .schema
            .get(key)
            .and_then(|field| field.check(key, value))
            .into_iter()
            .collect();
        if !errors.is_empty() {
            debug!("schema check failed (key={}, errors={:?})", key, errors);
        }
        *self.last_errors.lock() = errors.clone();
        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }

    fn validation_errors(&self) -> Vec<String> {
        self.last_errors.lock().clone()
    }
}
