//! Named JSON collections and the cached, write-serialized view services use.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::debug;

use crate::application::error::ServiceError;
use crate::cache::CollectionCache;

pub mod collections {
    pub const BLOG_POSTS: &str = "blog_posts";
    pub const BLOG_CATEGORIES: &str = "blog_categories";
    pub const NAVIGATION_MENUS: &str = "navigation_menus";
    pub const LEGAL_PAGES: &str = "legal_pages";
    pub const PRODUCTS: &str = "products";
    pub const ORDERS: &str = "orders";
    pub const AI_REQUESTS: &str = "ai_requests";
    pub const AI_TEMPLATES: &str = "ai_templates";
    pub const AI_SETTINGS: &str = "ai_settings";
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("collection `{collection}` i/o failed: {source}")]
    Io {
        collection: String,
        #[source]
        source: std::io::Error,
    },
    #[error("collection `{collection}` holds malformed documents: {source}")]
    Serialization {
        collection: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("collection backend request failed: {0}")]
    Transport(String),
    #[error("collection backend returned status {status}: {message}")]
    Backend { status: u16, message: String },
}

impl StoreError {
    pub fn io(collection: &str, source: std::io::Error) -> Self {
        Self::Io {
            collection: collection.to_string(),
            source,
        }
    }

    pub fn serialization(collection: &str, source: serde_json::Error) -> Self {
        Self::Serialization {
            collection: collection.to_string(),
            source,
        }
    }
}

/// Backing document store. Each collection is an opaque JSON array that is
/// always replaced as a whole.
#[async_trait]
pub trait CollectionStore: Send + Sync {
    /// Returns `None` when the collection does not exist yet.
    async fn load(&self, name: &str) -> Result<Option<Vec<Value>>, StoreError>;

    async fn save(&self, name: &str, items: Vec<Value>) -> Result<(), StoreError>;
}

/// Load and decode a collection; a missing collection is empty.
pub async fn load_collection<T: DeserializeOwned>(
    store: &dyn CollectionStore,
    name: &str,
) -> Result<Vec<T>, StoreError> {
    let Some(raw) = store.load(name).await? else {
        debug!(
            target = "timberline::store",
            collection = name,
            "collection missing; treating as empty"
        );
        return Ok(Vec::new());
    };

    raw.into_iter()
        .map(|value| serde_json::from_value(value).map_err(|err| StoreError::serialization(name, err)))
        .collect()
}

pub async fn save_collection<T: Serialize>(
    store: &dyn CollectionStore,
    name: &str,
    items: &[T],
) -> Result<(), StoreError> {
    let values = items
        .iter()
        .map(serde_json::to_value)
        .collect::<Result<Vec<_>, _>>()
        .map_err(|err| StoreError::serialization(name, err))?;
    store.save(name, values).await
}

/// A collection owned by one service: cached reads, serialized
/// read-modify-write updates, and invalidation after every write.
pub struct CachedCollection<T> {
    store: Arc<dyn CollectionStore>,
    name: &'static str,
    cache: CollectionCache<T>,
    write_lock: Mutex<()>,
}

impl<T> CachedCollection<T>
where
    T: Serialize + DeserializeOwned + Send + Sync,
{
    pub fn new(store: Arc<dyn CollectionStore>, name: &'static str, ttl: Duration) -> Self {
        Self {
            store,
            name,
            cache: CollectionCache::new(name, ttl),
            write_lock: Mutex::new(()),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Snapshot of the collection, served from cache while fresh.
    pub async fn all(&self) -> Result<Arc<Vec<T>>, StoreError> {
        self.cache
            .get_or_load(|| load_collection::<T>(self.store.as_ref(), self.name))
            .await
    }

    /// Apply `apply` to a freshly loaded copy of the collection and persist the
    /// result. Nothing is written when `apply` fails.
    pub async fn mutate<R, F>(&self, apply: F) -> Result<R, ServiceError>
    where
        F: FnOnce(&mut Vec<T>) -> Result<R, ServiceError>,
    {
        let _guard = self.write_lock.lock().await;
        let mut items = load_collection::<T>(self.store.as_ref(), self.name).await?;
        let result = apply(&mut items)?;
        let saved = save_collection(self.store.as_ref(), self.name, &items).await;
        self.cache.invalidate();
        saved?;
        Ok(result)
    }

    pub fn invalidate(&self) {
        self.cache.invalidate();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::store::MemoryCollectionStore;
    use serde::Deserialize;
    use serde_json::json;
    use std::sync::Mutex as StdMutex;
    use tokio::sync::Notify;

    /// Holds the next `load` open after it has read, until released.
    struct GatedStore {
        inner: MemoryCollectionStore,
        gate: StdMutex<Option<(Arc<Notify>, Arc<Notify>)>>,
    }

    #[async_trait]
    impl CollectionStore for GatedStore {
        async fn load(&self, name: &str) -> Result<Option<Vec<Value>>, StoreError> {
            let items = self.inner.load(name).await?;
            let gate = self.gate.lock().unwrap().take();
            if let Some((loaded, release)) = gate {
                loaded.notify_one();
                release.notified().await;
            }
            Ok(items)
        }

        async fn save(&self, name: &str, items: Vec<Value>) -> Result<(), StoreError> {
            self.inner.save(name, items).await
        }
    }

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Plank {
        species: String,
        length_mm: u32,
    }

    fn plank(species: &str) -> Plank {
        Plank {
            species: species.to_string(),
            length_mm: 2400,
        }
    }

    #[tokio::test]
    async fn missing_collection_loads_empty() {
        let store = MemoryCollectionStore::new();
        let items: Vec<Plank> = load_collection(&store, "planks").await.unwrap();
        assert!(items.is_empty());
    }

    #[tokio::test]
    async fn malformed_documents_surface_serialization_error() {
        let store = MemoryCollectionStore::new();
        store
            .save("planks", vec![json!({"species": 42})])
            .await
            .unwrap();
        let result: Result<Vec<Plank>, _> = load_collection(&store, "planks").await;
        assert!(matches!(result, Err(StoreError::Serialization { .. })));
    }

    #[tokio::test]
    async fn mutate_persists_and_invalidates_cache() {
        let store: Arc<dyn CollectionStore> = Arc::new(MemoryCollectionStore::new());
        let planks = CachedCollection::<Plank>::new(
            store.clone(),
            "planks",
            Duration::from_secs(300),
        );

        assert!(planks.all().await.unwrap().is_empty());
        planks
            .mutate(|items| {
                items.push(plank("jarrah"));
                Ok(())
            })
            .await
            .unwrap();

        let cached = planks.all().await.unwrap();
        assert_eq!(cached.as_slice(), &[plank("jarrah")]);
        let stored: Vec<Plank> = load_collection(store.as_ref(), "planks").await.unwrap();
        assert_eq!(stored, vec![plank("jarrah")]);
    }

    #[tokio::test]
    async fn failed_mutation_writes_nothing() {
        let store: Arc<dyn CollectionStore> = Arc::new(MemoryCollectionStore::new());
        let planks =
            CachedCollection::<Plank>::new(store.clone(), "planks", Duration::from_secs(300));

        let result = planks
            .mutate(|items| {
                items.push(plank("karri"));
                Err::<(), _>(ServiceError::conflict("duplicate"))
            })
            .await;

        assert!(result.is_err());
        assert!(store.load("planks").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn read_overlapping_a_write_does_not_pin_stale_snapshot() {
        let loaded = Arc::new(Notify::new());
        let release = Arc::new(Notify::new());
        let store: Arc<dyn CollectionStore> = Arc::new(GatedStore {
            inner: MemoryCollectionStore::new(),
            gate: StdMutex::new(Some((loaded.clone(), release.clone()))),
        });
        let planks = Arc::new(CachedCollection::<Plank>::new(
            store,
            "planks",
            Duration::from_secs(300),
        ));

        let reader = tokio::spawn({
            let planks = planks.clone();
            async move { planks.all().await }
        });
        loaded.notified().await;

        planks
            .mutate(|items| {
                items.push(plank("jarrah"));
                Ok(())
            })
            .await
            .unwrap();
        release.notify_one();

        let overlapping = reader.await.unwrap().unwrap();
        assert!(overlapping.is_empty());
        assert_eq!(planks.all().await.unwrap().as_slice(), &[plank("jarrah")]);
    }
}
