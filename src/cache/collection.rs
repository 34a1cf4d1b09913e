use std::future::Future;
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};

use metrics::counter;
use tracing::trace;

use super::lock::{read_slot, write_slot};

struct Snapshot<T> {
    items: Arc<Vec<T>>,
    loaded_at: Instant,
}

struct Slot<T> {
    snapshot: Option<Snapshot<T>>,
    /// Bumped by every invalidation; a load only installs its result when
    /// no invalidation happened while it ran.
    generation: u64,
}

/// Time-bounded snapshot of one collection.
///
/// Readers share the snapshot through an `Arc`. A miss loads outside the
/// lock, so concurrent misses may both hit the store; a load that overlaps a
/// write is returned to its caller but never cached.
pub struct CollectionCache<T> {
    collection: &'static str,
    ttl: Duration,
    slot: RwLock<Slot<T>>,
}

impl<T> CollectionCache<T> {
    pub fn new(collection: &'static str, ttl: Duration) -> Self {
        Self {
            collection,
            ttl,
            slot: RwLock::new(Slot {
                snapshot: None,
                generation: 0,
            }),
        }
    }

    /// Fresh snapshot, if any.
    pub fn get(&self) -> Option<Arc<Vec<T>>> {
        let slot = read_slot(&self.slot, self.collection);
        slot.snapshot
            .as_ref()
            .filter(|snapshot| snapshot.loaded_at.elapsed() < self.ttl)
            .map(|snapshot| Arc::clone(&snapshot.items))
    }

    pub fn put(&self, items: Vec<T>) -> Arc<Vec<T>> {
        let items = Arc::new(items);
        write_slot(&self.slot, self.collection).snapshot = Some(Snapshot {
            items: Arc::clone(&items),
            loaded_at: Instant::now(),
        });
        items
    }

    pub async fn get_or_load<F, Fut, E>(&self, loader: F) -> Result<Arc<Vec<T>>, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Vec<T>, E>>,
    {
        let generation = {
            let slot = read_slot(&self.slot, self.collection);
            if let Some(snapshot) = slot
                .snapshot
                .as_ref()
                .filter(|snapshot| snapshot.loaded_at.elapsed() < self.ttl)
            {
                counter!("timberline_cache_hit_total", "collection" => self.collection).increment(1);
                return Ok(Arc::clone(&snapshot.items));
            }
            slot.generation
        };

        counter!("timberline_cache_miss_total", "collection" => self.collection).increment(1);
        trace!(
            target = "timberline::cache",
            collection = self.collection,
            generation,
            "loading collection snapshot"
        );
        let items = Arc::new(loader().await?);

        let mut slot = write_slot(&self.slot, self.collection);
        if slot.generation == generation {
            slot.snapshot = Some(Snapshot {
                items: Arc::clone(&items),
                loaded_at: Instant::now(),
            });
        } else {
            trace!(
                target = "timberline::cache",
                collection = self.collection,
                "collection changed during load; snapshot not cached"
            );
        }
        Ok(items)
    }

    pub fn invalidate(&self) {
        let mut slot = write_slot(&self.slot, self.collection);
        slot.snapshot = None;
        slot.generation = slot.generation.wrapping_add(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn serves_cached_snapshot_until_invalidated() {
        let cache = CollectionCache::new("species", Duration::from_secs(60));
        let loads = AtomicUsize::new(0);
        let loader = || async {
            loads.fetch_add(1, Ordering::SeqCst);
            Ok::<_, ()>(vec!["spotted gum", "ironbark"])
        };

        let first = cache.get_or_load(loader).await.unwrap();
        let second = cache.get_or_load(loader).await.unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(loads.load(Ordering::SeqCst), 1);

        cache.invalidate();
        cache.get_or_load(loader).await.unwrap();
        assert_eq!(loads.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn expired_snapshot_reloads() {
        let cache = CollectionCache::new("species", Duration::ZERO);
        cache.put(vec![1, 2, 3]);
        assert!(cache.get().is_none());

        let reloaded = cache
            .get_or_load(|| async { Ok::<_, ()>(vec![4]) })
            .await
            .unwrap();
        assert_eq!(reloaded.as_slice(), &[4]);
    }

    #[tokio::test]
    async fn loader_error_leaves_cache_empty() {
        let cache: CollectionCache<u8> = CollectionCache::new("species", Duration::from_secs(60));
        let result = cache.get_or_load(|| async { Err("offline") }).await;
        assert_eq!(result.err(), Some("offline"));
        assert!(cache.get().is_none());
    }

    #[tokio::test]
    async fn load_overlapping_an_invalidation_is_not_cached() {
        let cache = CollectionCache::new("species", Duration::from_secs(60));
        let stale = cache
            .get_or_load(|| {
                let cache = &cache;
                async move {
                    cache.invalidate();
                    Ok::<_, ()>(vec!["before write"])
                }
            })
            .await
            .unwrap();
        assert_eq!(stale.as_slice(), &["before write"]);
        assert!(cache.get().is_none());

        let fresh = cache
            .get_or_load(|| async { Ok::<_, ()>(vec!["after write"]) })
            .await
            .unwrap();
        assert_eq!(fresh.as_slice(), &["after write"]);
        assert!(cache.get().is_some());
    }
}
