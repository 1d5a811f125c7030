//! Loaders producing a top-level mapping from a source identifier.

mod env;
mod file;
mod ini;

pub use env::{EnvironmentLoader, HIDDEN_VALUE, NOT_SET, coerce_value, find_env_file};
pub use file::FileLoader;
