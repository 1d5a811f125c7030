//! Caches consulted by config objects on read.

mod memory;
mod remote;

pub use memory::MemoryCache;
pub use remote::{InMemoryStore, KeyValueStore, REMOTE_CACHE_PREFIX, RemoteCache, StoreError};
