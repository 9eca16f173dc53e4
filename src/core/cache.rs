//! Cache abstractions used by the data providers.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

/// A byte-keyed collection whose entries may expire.
#[async_trait]
pub trait KeyValueCollection: Send + Sync {
    async fn get(&self, key: &[u8]) -> Option<Vec<u8>>;
    async fn put(&self, key: &[u8], value: &[u8], ttl: Option<Duration>);
    async fn remove(&self, key: &[u8]);
    async fn clear(&self);
}

/// A registry of named collections.
pub trait Store: Send + Sync {
    /// Returns the collection called `name`. `persist` selects disk over memory;
    /// with `create_if_missing` unset, only existing collections are returned.
    fn get_collection(
        &self,
        name: &str,
        persist: bool,
        create_if_missing: bool,
    ) -> Option<Arc<dyn KeyValueCollection>>;

    fn remove_collection(&self, name: &str) -> bool;
}
