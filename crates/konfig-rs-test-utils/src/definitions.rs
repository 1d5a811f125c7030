use konfig_rs_core::StaticDefinition;
use serde_json::json;

/// `database` definition with a nested pool and three required keys.
pub fn database_definition() -> StaticDefinition {
    StaticDefinition::new("database")
        .with_default("host", "localhost")
        .with_default("port", 5432)
        .with_default("pool", json!({ "size": 5, "timeout": 30 }))
        .with_required(["host", "port", "name"])
}

/// Small definition with one default and no required keys.
pub fn service_definition(name: &str) -> StaticDefinition {
    StaticDefinition::new(name).with_default("enabled", true)
}
