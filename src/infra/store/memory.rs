use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;

use crate::application::store::{CollectionStore, StoreError};

/// Process-local collections. Clones share the same underlying map.
#[derive(Debug, Clone, Default)]
pub struct MemoryCollectionStore {
    collections: Arc<RwLock<HashMap<String, Vec<Value>>>>,
}

impl MemoryCollectionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Names of every collection written so far, sorted.
    pub async fn collection_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.collections.read().await.keys().cloned().collect();
        names.sort();
        names
    }
}

#[async_trait]
impl CollectionStore for MemoryCollectionStore {
    async fn load(&self, name: &str) -> Result<Option<Vec<Value>>, StoreError> {
        Ok(self.collections.read().await.get(name).cloned())
    }

    async fn save(&self, name: &str, items: Vec<Value>) -> Result<(), StoreError> {
        self.collections
            .write()
            .await
            .insert(name.to_string(), items);
        Ok(())
    }
}
