//! Handle Cache
//!
//! Amortizes the cost of constructing live cluster clients. Entries are
//! keyed by cluster name, expire after a process-wide TTL, and can be
//! evicted explicitly by callers that observed a sick handle.

use crate::domain::entities::ClusterDescriptor;
use crate::domain::errors::DispatchError;
use crate::domain::ports::{ClientFactory, ClusterClient};
use dashmap::DashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

/// Process-wide default for handle expiry.
pub const DEFAULT_TTL: Duration = Duration::from_secs(3600);

/// A cached live handle with its construction timestamp.
struct CachedHandle {
    handle: Arc<dyn ClusterClient>,
    created_at: Instant,
}

impl CachedHandle {
    /// Whether this handle has outlived the cache TTL.
    fn is_expired(&self, ttl: Duration) -> bool {
        self.created_at.elapsed() > ttl
    }
}

/// Per-cluster slot.
///
/// The inner mutex serializes construction for ONE cluster only: a second
/// request for the same cluster waits for the in-flight construction and
/// reuses its result, while requests for other clusters proceed on their
/// own slots.
struct CacheSlot {
    entry: Mutex<Option<CachedHandle>>,
}

/// Cache of live cluster handles.
///
/// The only mutable shared state in the dispatch core. Holds nothing for a
/// cluster whose construction failed, so the next request retries instead
/// of observing a poisoned entry.
pub struct HandleCache {
    ttl: Duration,
    factory: Arc<dyn ClientFactory>,
    slots: DashMap<String, Arc<CacheSlot>>,
}

impl HandleCache {
    /// Create a cache over a client factory.
    pub fn new(factory: Arc<dyn ClientFactory>, ttl: Duration) -> Self {
        Self {
            ttl,
            factory,
            slots: DashMap::new(),
        }
    }

    /// Get or create the slot for a cluster.
    fn slot(&self, name: &str) -> Arc<CacheSlot> {
        self.slots
            .entry(name.to_string())
            .or_insert_with(|| {
                Arc::new(CacheSlot {
                    entry: Mutex::new(None),
                })
            })
            .clone()
    }

    /// Return a live handle for the cluster, building one if needed.
    ///
    /// A fresh cached handle is returned as-is. A stale one is discarded and
    /// replaced transparently. Construction failures propagate and leave the
    /// slot empty.
    pub async fn get(
        &self,
        descriptor: &ClusterDescriptor,
    ) -> Result<Arc<dyn ClusterClient>, DispatchError> {
        let slot = self.slot(&descriptor.name);
        let mut entry = slot.entry.lock().await;

        if let Some(cached) = entry.as_ref() {
            if !cached.is_expired(self.ttl) {
                tracing::debug!("using cached client for cluster '{}'", descriptor.name);
                return Ok(cached.handle.clone());
            }
            tracing::debug!("client cache expired for cluster '{}'", descriptor.name);
            *entry = None;
        }

        let handle = self.factory.construct(descriptor).await.map_err(|e| {
            tracing::error!(
                "failed to create client for cluster '{}': {}",
                descriptor.name,
                e
            );
            e
        })?;

        *entry = Some(CachedHandle {
            handle: handle.clone(),
            created_at: Instant::now(),
        });
        tracing::info!("created new client for cluster '{}'", descriptor.name);

        Ok(handle)
    }

    /// Evict the cached handle for one cluster, if any.
    ///
    /// Returns whether an entry was actually evicted. Unknown names are a
    /// no-op; deciding WHEN to evict is the caller's policy.
    pub async fn invalidate(&self, name: &str) -> bool {
        let Some(slot) = self.slots.get(name).map(|s| s.value().clone()) else {
            return false;
        };
        let evicted = slot.entry.lock().await.take().is_some();
        if evicted {
            tracing::info!("evicted cached client for cluster '{}'", name);
        }
        evicted
    }

    /// Evict every cached handle.
    pub async fn clear(&self) {
        // Collect slots first so no DashMap guard is held across an await
        let slots: Vec<Arc<CacheSlot>> = self.slots.iter().map(|e| e.value().clone()).collect();
        for slot in slots {
            *slot.entry.lock().await = None;
        }
        tracing::info!("cleared cached clients for all clusters");
    }

    /// Number of non-expired cached handles.
    pub async fn cached_count(&self) -> usize {
        let slots: Vec<Arc<CacheSlot>> = self.slots.iter().map(|e| e.value().clone()).collect();
        let mut count = 0;
        for slot in slots {
            if let Some(cached) = slot.entry.lock().await.as_ref() {
                if !cached.is_expired(self.ttl) {
                    count += 1;
                }
            }
        }
        count
    }

    /// The configured TTL.
    pub fn ttl(&self) -> Duration {
        self.ttl
    }
}
