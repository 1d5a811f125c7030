//! Error types for config objects, plugins and the registry.

use thiserror::Error;

/// Errors returned by configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A named config, service or type tag is not registered.
    #[error("not found: {0}")]
    NotFound(String),
    /// A source could not be read or parsed.
    #[error("failed to load config: {0}")]
    Load(String),
    /// One or more schema or required-key violations.
    #[error("validation failed for {subject}: {}", errors.join("; "))]
    Validation { subject: String, errors: Vec<String> },
    /// Mutation attempted on a readonly config object.
    #[error("config '{name}' is readonly, cannot modify '{key}'")]
    Readonly { name: String, key: String },
    /// Encoding or decoding failed.
    #[error("serialization failed: {0}")]
    Serialize(String),
    /// Cipher failure or decrypt of a one-way hash.
    #[error("encryption failed: {0}")]
    Encryption(String),
}

/// Fieldless discriminant of [`ConfigError`], handy for matching in callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigErrorKind {
    NotFound,
    Load,
    Validation,
    Readonly,
    Serialize,
    Encryption,
}

impl ConfigError {
    /// Return the error category.
    pub fn kind(&self) -> ConfigErrorKind {
        match self {
            ConfigError::NotFound(_) => ConfigErrorKind::NotFound,
            ConfigError::Load(_) => ConfigErrorKind::Load,
            ConfigError::Validation { .. } => ConfigErrorKind::Validation,
            ConfigError::Readonly { .. } => ConfigErrorKind::Readonly,
            ConfigError::Serialize(_) => ConfigErrorKind::Serialize,
            ConfigError::Encryption(_) => ConfigErrorKind::Encryption,
        }
    }

    /// Build a validation error for a subject (key or config name).
    pub fn validation(subject: impl Into<String>, errors: Vec<String>) -> Self {
        ConfigError::Validation {
            subject: subject.into(),
            errors,
        }
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(err: serde_json::Error) -> Self {
        ConfigError::Serialize(err.to_string())
    }
}
