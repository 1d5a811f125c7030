//! Process-wide registry of named config objects.
//!
//! A [`ConfigRegistry`] is created once at startup and passed by reference to
//! whatever needs configuration. It owns the loading strategy, the active
//! environment, bulk operations, backups and a small service container.

pub mod backup;
pub mod container;
pub mod registry;
pub mod report;
pub mod scoped;
pub mod strategy;

pub use backup::{ExportFormat, RegistryBackup};
pub use container::ServiceContainer;
pub use registry::{ConfigRegistry, DEFAULT_RELOAD_INTERVAL};
pub use report::{ConfigHealth, HealthStatus, Statistics, format_memory_usage};
pub use scoped::{ConfigOverride, config_required, with_config, with_overrides};
pub use strategy::{ConfigEnvironment, ConfigStrategy};
