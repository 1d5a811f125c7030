use konfig_rs_core::{ConfigBuilder, ConfigObject, StaticDefinition};
use konfig_rs_plugins::{FileLoader, MemoryCache};
use konfig_rs_registry::{ConfigEnvironment, ConfigRegistry, ConfigStrategy, ExportFormat};
use konfig_rs_test_utils::database_definition;
use pretty_assertions::assert_eq;
use serde_json::{Value, json};
use std::fs;
use std::sync::Arc;
use std::thread;
use tempfile::TempDir;

#[test]
fn concurrent_readers_and_writers_share_one_registry() {
    let registry = Arc::new(ConfigRegistry::new());
    for i in 0..4 {
        let name = format!("svc{i}");
        let config = ConfigObject::from_definition(
            StaticDefinition::new(name.clone()).with_default("hits", 0),
        );
        registry
            .register_config(name, Arc::new(config), false)
            .expect("register");
    }

    let handles: Vec<_> = (0..8)
        .map(|worker| {
            let registry = Arc::clone(&registry);
            thread::spawn(move || {
                let name = format!("svc{}", worker % 4);
                for i in 0..20 {
                    registry
                        .set_config_value(&name, &format!("w{worker}.i{i}"), i)
                        .expect("set");
                    let _ = registry.get_config_value(&name, "hits", Value::Null);
                }
                let _ = registry.health_status();
            })
        })
        .collect();
    for handle in handles {
        handle.join().expect("join");
    }

    assert_eq!(registry.health_status().loaded_configs, 4);
    assert_eq!(
        registry.get_config_value("svc1", "w5.i19", Value::Null),
        json!(19)
    );
}

#[test]
fn file_backed_configs_survive_export_and_import() {
    let temp = TempDir::new().expect("tmp");
    let source = temp.path().join("database.json");
    fs::write(&source, r#"{"host": "db.internal", "name": "orders"}"#).expect("write");

    let registry = ConfigRegistry::new();
    registry.set_strategy(ConfigStrategy::Eager);
    registry.set_environment(ConfigEnvironment::Production);
    let db = ConfigBuilder::for_definition(database_definition())
        .with_loader(Arc::new(FileLoader::new()))
        .with_cache(Arc::new(MemoryCache::new()))
        .with_source(source.to_str().expect("utf8"))
        .build();
    registry
        .register_config("database", Arc::new(db), true)
        .expect("register");
    registry.validate_all().expect("valid");

    let export = temp.path().join("export.yaml");
    registry
        .export_to_file(&export, "YML".parse::<ExportFormat>().expect("format"))
        .expect("export");
    registry
        .set_config_value("database", "host", "elsewhere")
        .expect("set");
    registry
        .import_from_file(&export, ExportFormat::Yaml)
        .expect("import");

    assert_eq!(
        registry.get_config_value("database", "host", Value::Null),
        json!("db.internal")
    );
    let text = fs::read_to_string(&export).expect("read");
    assert!(text.contains("environment: production"));
}
