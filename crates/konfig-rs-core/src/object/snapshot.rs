//! Serializable point-in-time copy of a config object.

use crate::metadata::ConfigMetadata;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Deep copy of a config object's data plus every metadata record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConfigSnapshot {
    #[serde(default)]
    pub data: Map<String, Value>,
    #[serde(default)]
    pub metadata: BTreeMap<String, ConfigMetadata>,
}
