pub mod disk;
pub mod memory;

use crate::core::cache::{KeyValueCollection, Store};
use disk::DiskCollection;
use fjall::{Keyspace, PartitionCreateOptions};
use memory::MemoryCollection;
use std::{
    collections::HashMap,
    path::Path,
    sync::{Arc, RwLock},
};
use tracing::{debug, warn};

/// A thread-safe registry of named cache collections.
///
/// Persistent collections live in a fjall keyspace under `<data_path>/cache`.
/// When the keyspace cannot be opened, persistent requests fall back to memory.
pub struct KeyValueStore {
    collections: RwLock<HashMap<String, Arc<dyn KeyValueCollection>>>,
    keyspace: Option<Arc<Keyspace>>,
}

impl KeyValueStore {
    pub fn new(data_path: Option<&Path>) -> Self {
        let keyspace = data_path
            .and_then(|path| {
                let cache_dir = path.join("cache");
                match fjall::Config::new(&cache_dir).open() {
                    Ok(keyspace) => Some(keyspace),
                    Err(e) => {
                        warn!(path = %cache_dir.display(), error = %e, "Could not open cache, using memory");
                        None
                    }
                }
            })
            .map(Arc::new);

        Self {
            collections: RwLock::new(HashMap::new()),
            keyspace,
        }
    }

    /// A store that never touches disk.
    pub fn in_memory() -> Self {
        Self::new(None)
    }

    pub fn is_persistent(&self) -> bool {
        self.keyspace.is_some()
    }

    fn open_collection(&self, name: &str, persist: bool) -> Arc<dyn KeyValueCollection> {
        if persist {
            if let Some(keyspace) = &self.keyspace {
                match keyspace.open_partition(name, PartitionCreateOptions::default()) {
                    Ok(partition) => return Arc::new(DiskCollection::new(partition)),
                    Err(e) => warn!(collection = name, error = %e, "Could not open partition"),
                }
            }
        }
        debug!(collection = name, "Using in-memory collection");
        Arc::new(MemoryCollection::new())
    }
}

impl Default for KeyValueStore {
    fn default() -> Self {
        Self::in_memory()
    }
}

impl Store for KeyValueStore {
    fn get_collection(
        &self,
        name: &str,
        persist: bool,
        create_if_missing: bool,
    ) -> Option<Arc<dyn KeyValueCollection>> {
        if let Ok(collections) = self.collections.read() {
            if let Some(collection) = collections.get(name) {
                return Some(Arc::clone(collection));
            }
        }
        if !create_if_missing {
            return None;
        }

        let mut collections = self.collections.write().ok()?;
        let collection = collections
            .entry(name.to_string())
            .or_insert_with(|| self.open_collection(name, persist));
        Some(Arc::clone(collection))
    }

    fn remove_collection(&self, name: &str) -> bool {
        self.collections
            .write()
            .map(|mut collections| collections.remove(name).is_some())
            .unwrap_or(false)
    }
}
