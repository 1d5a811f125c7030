//! Test helpers shared across konfig-rs crates.

pub mod definitions;
pub mod loader;
pub mod observer;
pub mod store;

pub use definitions::{database_definition, service_definition};
pub use loader::{FailingLoader, FixedLoader};
pub use observer::{FailingObserver, RecordedChange, RecordingObserver};
pub use store::FailingStore;
