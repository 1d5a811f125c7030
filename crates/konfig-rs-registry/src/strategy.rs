//! Loading strategies and deployment environments.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// When a registered config is loaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfigStrategy {
    /// Load on first `get_config`.
    #[default]
    Lazy,
    /// Load on registration.
    Eager,
    /// Never load implicitly; callers load explicitly.
    OnDemand,
}

impl ConfigStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConfigStrategy::Lazy => "lazy",
            ConfigStrategy::Eager => "eager",
            ConfigStrategy::OnDemand => "on_demand",
        }
    }
}

impl fmt::Display for ConfigStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ConfigStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "lazy" => Ok(ConfigStrategy::Lazy),
            "eager" => Ok(ConfigStrategy::Eager),
            "on_demand" => Ok(ConfigStrategy::OnDemand),
            other => Err(format!("unknown loading strategy: {other}")),
        }
    }
}

/// Deployment environment. Selects the `<environment>.json` override file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfigEnvironment {
    #[default]
    Development,
    Testing,
    Staging,
    Production,
}

impl ConfigEnvironment {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConfigEnvironment::Development => "development",
            ConfigEnvironment::Testing => "testing",
            ConfigEnvironment::Staging => "staging",
            ConfigEnvironment::Production => "production",
        }
    }

    /// Parse a name, falling back to development for unknown names.
    pub fn from_name_or_default(name: &str) -> Self {
        name.parse().unwrap_or_default()
    }
}

impl fmt::Display for ConfigEnvironment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ConfigEnvironment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "development" => Ok(ConfigEnvironment::Development),
            "testing" => Ok(ConfigEnvironment::Testing),
            "staging" => Ok(ConfigEnvironment::Staging),
            "production" => Ok(ConfigEnvironment::Production),
            other => Err(format!("unknown environment: {other}")),
        }
    }
}
