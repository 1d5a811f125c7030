//! Plugin variants for `konfig-rs-core` config objects.
//!
//! Every type here implements one of the capability traits from
//! `konfig_rs_core::plugin` and can be shared across config objects behind an
//! `Arc`.

pub mod cache;
pub mod encryptor;
pub mod loader;
pub mod serializer;
pub mod validator;

pub use cache::{InMemoryStore, KeyValueStore, MemoryCache, REMOTE_CACHE_PREFIX, RemoteCache, StoreError};
pub use encryptor::{AES_KEY_SIZE, AES_NONCE_SIZE, AesGcmEncryptor, HashAlgorithm, HashEncryptor};
pub use loader::{EnvironmentLoader, FileLoader};
pub use serializer::{JsonSerializer, YamlSerializer};
pub use validator::{FieldSchema, SchemaValidator, TypeValidator, ValueKind};
