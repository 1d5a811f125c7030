//! Tests for registry lifecycle, bulk operations and persistence.

use super::*;
use crate::strategy::{ConfigEnvironment, ConfigStrategy};
use konfig_rs_core::{ConfigErrorKind, StaticDefinition};
use konfig_rs_test_utils::{
    FailingLoader, FixedLoader, RecordingObserver, database_definition, service_definition,
};
use pretty_assertions::assert_eq;
use serde_json::json;
use std::fs;
use tempfile::TempDir;

fn database() -> Arc<ConfigObject> {
    Arc::new(ConfigObject::from_definition(database_definition()))
}

fn failing(name: &str) -> Arc<ConfigObject> {
    Arc::new(
        ConfigBuilder::for_definition(service_definition(name))
            .with_loader(Arc::new(FailingLoader))
            .with_source(format!("remote://{name}"))
            .build(),
    )
}

#[test]
fn lazy_strategy_loads_on_first_value_read() {
    let registry = ConfigRegistry::new();
    assert_eq!(registry.strategy(), ConfigStrategy::Lazy);
    let db = database();
    registry
        .register_config("db", Arc::clone(&db), true)
        .expect("register");
    assert!(!db.is_loaded());
    assert_eq!(
        registry.get_config_value("db", "host", Value::Null),
        json!("localhost")
    );
    assert!(db.is_loaded());
}

#[test]
fn eager_strategy_loads_on_registration() {
    let registry = ConfigRegistry::new();
    registry.set_strategy(ConfigStrategy::Eager);
    let db = database();
    registry
        .register_config("db", Arc::clone(&db), true)
        .expect("register");
    assert!(db.is_loaded());
    // `name` is required and has no default
    assert!(!db.is_validated());

    let err = registry
        .register_config("broken", failing("broken"), true)
        .unwrap_err();
    assert_eq!(err.kind(), ConfigErrorKind::Load);
    assert!(registry.has_config("broken"));
}

#[test]
fn on_demand_strategy_never_loads_implicitly() {
    let registry = ConfigRegistry::new();
    registry.set_strategy(ConfigStrategy::OnDemand);
    let db = database();
    registry
        .register_config("db", Arc::clone(&db), true)
        .expect("register");
    assert_eq!(
        registry.get_config_value("db", "host", "fallback"),
        json!("fallback")
    );
    assert!(!db.is_loaded());
}

#[test]
fn missing_config_is_not_found_but_reads_fall_back() {
    let registry = ConfigRegistry::new();
    let err = registry.get_config("ghost").unwrap_err();
    assert_eq!(err.kind(), ConfigErrorKind::NotFound);
    assert_eq!(registry.get_config_value("ghost", "x", 7), json!(7));
    assert_eq!(
        registry.set_config_value("ghost", "x", 1).unwrap_err().kind(),
        ConfigErrorKind::NotFound
    );
}

#[test]
fn lazy_load_failure_falls_back_for_reads() {
    let registry = ConfigRegistry::new();
    registry
        .register_config("remote", failing("remote"), true)
        .expect("register");
    assert_eq!(
        registry.get_config_value("remote", "enabled", false),
        json!(false)
    );
    assert_eq!(
        registry.get_config("remote").unwrap_err().kind(),
        ConfigErrorKind::Load
    );
}

#[test]
fn remove_and_clear() {
    let registry = ConfigRegistry::new();
    registry
        .register_config("db", database(), false)
        .expect("register");
    registry
        .register_config("cache", Arc::new(ConfigObject::from_definition(service_definition("cache"))), false)
        .expect("register");
    assert_eq!(registry.config_names(), vec!["cache".to_string(), "db".to_string()]);

    assert!(registry.remove_config("db").is_some());
    assert!(registry.remove_config("db").is_none());
    assert!(!registry.has_config("db"));
    registry.clear_all();
    assert!(registry.is_empty());
}

#[test]
fn clear_all_detaches_global_observers() {
    let registry = ConfigRegistry::new();
    let db = database();
    registry
        .register_config("db", Arc::clone(&db), false)
        .expect("register");
    let recorder = Arc::new(RecordingObserver::new());
    registry.add_global_observer(recorder.clone());

    db.set("host", "before").expect("set");
    registry.clear_all();
    db.set("host", "after").expect("set");

    assert!(registry.is_empty());
    assert_eq!(recorder.keys(), vec!["host".to_string()]);
}

#[test]
fn create_config_uses_registered_types() {
    let registry = ConfigRegistry::new();
    registry.register_config_type("database", |plugins| {
        ConfigObject::new(Arc::new(database_definition()), plugins)
    });
    let created = registry
        .create_config("primary_db", "database", ConfigPlugins::none())
        .expect("create");
    assert_eq!(created.name(), "database");
    assert!(registry.has_config("primary_db"));

    let err = registry
        .create_config("x", "unknown", ConfigPlugins::none())
        .unwrap_err();
    assert_eq!(err.kind(), ConfigErrorKind::NotFound);
}

#[test]
fn environment_overrides_apply_nested_values() {
    let temp = TempDir::new().expect("tmp");
    fs::write(
        temp.path().join("production.json"),
        r#"{"db": {"host": "db.prod", "pool.size": 50}, "unknown": {"a": 1}}"#,
    )
    .expect("write");

    let registry = ConfigRegistry::new();
    let db = database();
    db.load_defaults();
    registry
        .register_config("db", Arc::clone(&db), false)
        .expect("register");

    // development.json does not exist
    registry
        .load_environment_configs(temp.path())
        .expect("missing file is skipped");
    assert_eq!(db.get("host"), Some(json!("localhost")));

    registry.set_environment(ConfigEnvironment::Production);
    registry
        .load_environment_configs(temp.path())
        .expect("overrides");
    assert_eq!(db.get("host"), Some(json!("db.prod")));
    assert_eq!(db.get("pool.size"), Some(json!(50)));
}

#[test]
fn malformed_environment_file_is_load_error() {
    let temp = TempDir::new().expect("tmp");
    fs::write(temp.path().join("testing.json"), "{ not json").expect("write");
    let registry = ConfigRegistry::new();
    registry.set_environment(ConfigEnvironment::Testing);
    let err = registry.load_environment_configs(temp.path()).unwrap_err();
    assert_eq!(err.kind(), ConfigErrorKind::Load);
    assert!(err.to_string().contains("testing.json"));
}

#[test]
fn bulk_operations_report_every_failure() {
    let registry = ConfigRegistry::new();
    registry
        .register_config("db", database(), false)
        .expect("register");
    registry
        .register_config("alpha", failing("alpha"), false)
        .expect("register");
    registry
        .register_config("beta", failing("beta"), false)
        .expect("register");

    let err = registry.load_all().unwrap_err();
    assert_eq!(err.kind(), ConfigErrorKind::Load);
    let message = err.to_string();
    assert!(message.contains("config 'alpha'"));
    assert!(message.contains("config 'beta'"));
    assert!(registry.get_config("db").expect("db").is_loaded());

    let err = registry.validate_all().unwrap_err();
    assert_eq!(err.kind(), ConfigErrorKind::Validation);
    assert!(err.to_string().contains("missing required key 'name'"));

    registry
        .set_config_value("db", "name", "orders")
        .expect("set");
    registry.remove_config("alpha");
    registry.remove_config("beta");
    registry.validate_all().expect("valid");
}

#[test]
fn reload_all_stamps_last_reload_even_on_failure() {
    let registry = ConfigRegistry::new();
    registry
        .register_config("alpha", failing("alpha"), false)
        .expect("register");
    let before = registry.last_reload();
    std::thread::sleep(Duration::from_millis(5));
    let err = registry.reload_all().unwrap_err();
    assert!(err.to_string().contains("config 'alpha'"));
    assert!(registry.last_reload() > before);
}

#[test]
fn check_and_reload_respects_interval() {
    let loader = Arc::new(FixedLoader::new(json!({ "name": "orders" })));
    let db = Arc::new(
        ConfigBuilder::for_definition(database_definition())
            .with_loader(loader.clone())
            .with_source("db")
            .build(),
    );
    let registry = ConfigRegistry::new();
    registry
        .register_config("db", db, false)
        .expect("register");

    assert!(!registry.check_and_reload().expect("disabled"));
    registry.enable_auto_reload(Duration::from_secs(3600));
    assert!(!registry.check_and_reload().expect("not due"));
    assert!(loader.calls().is_empty());

    registry.enable_auto_reload(Duration::ZERO);
    assert!(registry.check_and_reload().expect("due"));
    assert_eq!(loader.calls(), vec!["db".to_string()]);

    registry.disable_auto_reload();
    assert!(!registry.auto_reload_enabled());
    assert!(!registry.check_and_reload().expect("disabled"));
}

#[test]
fn concurrent_check_and_reload_reloads_once() {
    let loader = Arc::new(FixedLoader::new(json!({ "name": "orders" })));
    let db = Arc::new(
        ConfigBuilder::for_definition(database_definition())
            .with_loader(loader.clone())
            .with_source("db")
            .build(),
    );
    let registry = ConfigRegistry::new();
    registry
        .register_config("db", db, false)
        .expect("register");
    registry.enable_auto_reload(Duration::from_secs(3600));
    registry.write(|state| {
        state.auto_reload.last_reload = Utc::now() - chrono::Duration::hours(2);
    });

    let barrier = std::sync::Barrier::new(8);
    let outcomes: Vec<bool> = std::thread::scope(|scope| {
        let handles: Vec<_> = (0..8)
            .map(|_| {
                scope.spawn(|| {
                    barrier.wait();
                    registry.check_and_reload().expect("reload")
                })
            })
            .collect();
        handles
            .into_iter()
            .map(|handle| handle.join().expect("thread"))
            .collect()
    });

    assert_eq!(outcomes.iter().filter(|ran| **ran).count(), 1);
    assert_eq!(loader.calls(), vec!["db".to_string()]);
}

#[test]
fn global_observers_follow_configs() {
    let registry = ConfigRegistry::new();
    let db = database();
    registry
        .register_config("db", Arc::clone(&db), false)
        .expect("register");

    let recorder = Arc::new(RecordingObserver::new());
    let observer: Arc<dyn ConfigObserver> = recorder.clone();
    registry.add_global_observer(Arc::clone(&observer));
    registry.add_global_observer(Arc::clone(&observer));

    let cache = Arc::new(ConfigObject::from_definition(service_definition("cache")));
    registry
        .register_config("cache", Arc::clone(&cache), false)
        .expect("register");

    db.set("host", "a").expect("set");
    cache.set("enabled", false).expect("set");
    assert_eq!(recorder.keys(), vec!["host".to_string(), "enabled".to_string()]);

    registry.remove_global_observer(&observer);
    db.set("host", "b").expect("set");
    assert_eq!(recorder.changes().len(), 2);
}

/// Observers may call back into the registry while a bulk operation holds its lock.
#[test]
fn reentrant_observer_does_not_deadlock() {
    struct Mirror {
        registry: Arc<ConfigRegistry>,
    }

    impl ConfigObserver for Mirror {
        fn on_config_changed(
            &self,
            key: &str,
            _old_value: Option<&Value>,
            new_value: Option<&Value>,
        ) -> anyhow::Result<()> {
            if key == "host" {
                let value = new_value.cloned().unwrap_or(Value::Null);
                self.registry.set_config_value("mirror", "host", value)?;
            }
            Ok(())
        }
    }

    let registry = Arc::new(ConfigRegistry::new());
    let db = database();
    registry
        .register_config("db", Arc::clone(&db), false)
        .expect("register");
    let mirror = Arc::new(ConfigObject::from_definition(StaticDefinition::new("mirror")));
    registry
        .register_config("mirror", Arc::clone(&mirror), false)
        .expect("register");

    let observer: Arc<dyn ConfigObserver> = Arc::new(Mirror {
        registry: Arc::clone(&registry),
    });
    db.add_observer(&observer);

    registry.load_all().expect("load");
    assert_eq!(mirror.get("host"), Some(json!("localhost")));
}

#[test]
fn backup_restore_and_file_round_trip() {
    let registry = ConfigRegistry::new();
    let db = database();
    db.load_defaults();
    registry
        .register_config("db", Arc::clone(&db), false)
        .expect("register");
    registry.set_environment(ConfigEnvironment::Staging);

    let backup = registry.backup_all();
    assert_eq!(backup.environment, ConfigEnvironment::Staging);
    assert_eq!(backup.configs["db"].data["host"], json!("localhost"));

    db.set("host", "changed").expect("set");
    db.set("extra", true).expect("set");
    assert_eq!(registry.restore_all(&backup), 1);
    assert_eq!(db.get("host"), Some(json!("localhost")));
    assert!(!db.has_key("extra"));

    let temp = TempDir::new().expect("tmp");
    for (file, format) in [("backup.json", ExportFormat::Json), ("backup.yaml", ExportFormat::Yaml)] {
        let path = temp.path().join(file);
        registry.export_to_file(&path, format).expect("export");
        db.set("host", "mutated").expect("set");
        assert_eq!(registry.import_from_file(&path, format).expect("import"), 1);
        assert_eq!(db.get("host"), Some(json!("localhost")));
        assert_eq!(
            db.get_metadata("host").expect("metadata").priority,
            konfig_rs_core::ConfigPriority::Low
        );
    }

    let err = registry
        .import_from_file(temp.path().join("missing.json"), ExportFormat::Json)
        .unwrap_err();
    assert_eq!(err.kind(), ConfigErrorKind::Load);
}

#[test]
fn health_and_statistics_summaries() {
    let registry = ConfigRegistry::new();
    let db = database();
    db.load_defaults();
    db.set("name", "orders").expect("set");
    db.validate();
    registry
        .register_config("db", db, false)
        .expect("register");
    registry
        .register_config("idle", Arc::new(ConfigObject::from_definition(service_definition("idle"))), false)
        .expect("register");

    let health = registry.health_status();
    assert_eq!(health.total_configs, 2);
    assert_eq!(health.loaded_configs, 1);
    assert_eq!(health.validated_configs, 1);
    assert_eq!(health.configs["db"].keys_count, 4);
    assert_eq!(health.configs["idle"].keys_count, 0);
    let value = serde_json::to_value(&health).expect("json");
    assert_eq!(value["strategy"], json!("lazy"));
    assert_eq!(value["environment"], json!("development"));
    assert_eq!(value["auto_reload"], json!(false));

    let stats = registry.statistics();
    assert_eq!(stats.total_configurations, 2);
    assert_eq!(stats.total_keys, 4);
    assert_eq!(stats.average_keys_per_config, 2.0);
    assert!(stats.memory_usage.ends_with("bytes"));
    assert_eq!(
        registry.to_string(),
        "ConfigRegistry(configs=2, env=development, strategy=lazy)"
    );
}

#[test]
fn services_resolve_through_the_container() {
    let registry = ConfigRegistry::new();
    registry.register_service("greeting", "hello".to_string());
    registry.register_factory("answer", || 42u32);
    assert_eq!(*registry.get_service::<String>("greeting").expect("greeting"), "hello");
    assert_eq!(*registry.get_service::<u32>("answer").expect("answer"), 42);
    assert_eq!(
        registry.get_service::<u32>("nope").unwrap_err().kind(),
        ConfigErrorKind::NotFound
    );
}
