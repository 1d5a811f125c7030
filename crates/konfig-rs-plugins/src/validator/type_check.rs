use super::{ValueKind, type_error};
use konfig_rs_core::ConfigValidator;
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::HashMap;

/// Checks only the kind of each mapped key.
#[derive(Debug, Default)]
pub struct TypeValidator {
    kinds: HashMap<String, ValueKind>,
    last_errors: Mutex<Vec<String>>,
}

impl TypeValidator {
    pub fn new<I, K>(kinds: I) -> Self
    where
        I: IntoIterator<Item = (K, ValueKind)>,
        K: Into<String>,
    {
        Self {
            kinds: kinds.into_iter().map(|(k, v)| (k.into(), v)).collect(),
            last_errors: Mutex::new(Vec::new()),
        }
    }
}

impl ConfigValidator for TypeValidator {
    fn validate(&self, key: &str, value: &Value) -> Result<(), Vec<String>> {
        let errors: Vec<String> = match self.kinds.get(key) {
            Some(kind) if !kind.matches(value) => vec![type_error(key, *kind)],
            _ => Vec::new(),
        };
        *self.last_errors.lock() = errors.clone();
        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }

    fn validation_errors(&self) -> Vec<String> {
        self.last_errors.lock().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::TypeValidator;
    use crate::validator::ValueKind;
    use konfig_rs_core::ConfigValidator;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn rejects_mismatched_kind() {
        let validator = TypeValidator::new([("debug", ValueKind::Boolean)]);
        assert_eq!(validator.validate("debug", &json!(true)), Ok(()));
        assert_eq!(
            validator.validate("debug", &json!("yes")),
            Err(vec!["'debug' must be of type boolean".to_string()])
        );
        assert_eq!(validator.validation_errors().len(), 1);
        assert_eq!(validator.validate("other", &json!("yes")), Ok(()));
        assert!(validator.validation_errors().is_empty());
    }
}
