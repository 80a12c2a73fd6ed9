//! Latest-value bus for vision snapshots.
//!
//! The sensing worker publishes; the control loop reads the latest value and
//! subscribes callbacks that fire synchronously on every publish. There is
//! no queue: a publish replaces whatever was there before, and a slow reader
//! only ever sees the newest snapshot.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock, Weak};

use abyssrun_domain::VisionSnapshot;
use dashmap::DashMap;

/// Callback invoked with each newly published snapshot.
///
/// Runs on the publishing thread, so it must stay cheap: flip a flag, cancel
/// a token.
pub type SnapshotCallback = Arc<dyn Fn(&Arc<VisionSnapshot>) + Send + Sync>;

struct BusInner {
    latest: RwLock<Option<Arc<VisionSnapshot>>>,
    subscribers: DashMap<u64, SnapshotCallback>,
    next_id: AtomicU64,
    published: AtomicU64,
}

/// Cloneable handle to a shared snapshot slot.
#[derive(Clone)]
pub struct SnapshotBus {
    inner: Arc<BusInner>,
}

impl SnapshotBus {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(BusInner {
                latest: RwLock::new(None),
                subscribers: DashMap::new(),
                next_id: AtomicU64::new(1),
                published: AtomicU64::new(0),
            }),
        }
    }

    /// Store `snapshot` as the latest value and notify every subscriber.
    pub fn publish(&self, snapshot: VisionSnapshot) {
        let snapshot = Arc::new(snapshot);
        {
            let mut slot = self
                .inner
                .latest
                .write()
                .unwrap_or_else(PoisonError::into_inner);
            *slot = Some(Arc::clone(&snapshot));
        }
        self.inner.published.fetch_add(1, Ordering::AcqRel);

        // Snapshot the registry first so callbacks may subscribe or drop
        // subscriptions without holding a shard lock.
        let callbacks: Vec<SnapshotCallback> = self
            .inner
            .subscribers
            .iter()
            .map(|entry| Arc::clone(entry.value()))
            .collect();
        for callback in callbacks {
            callback(&snapshot);
        }
    }

    /// Most recent snapshot, if any has been published.
    pub fn latest(&self) -> Option<Arc<VisionSnapshot>> {
        self.inner
            .latest
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Register `callback` for future publishes. The registration lasts as
    /// long as the returned [`Subscription`].
    #[must_use = "dropping the subscription unsubscribes immediately"]
    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&Arc<VisionSnapshot>) + Send + Sync + 'static,
    {
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        self.inner.subscribers.insert(id, Arc::new(callback));
        Subscription {
            id,
            bus: Arc::downgrade(&self.inner),
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.inner.subscribers.len()
    }

    /// Number of snapshots published so far.
    pub fn publish_count(&self) -> u64 {
        self.inner.published.load(Ordering::Acquire)
    }
}

impl Default for SnapshotBus {
    fn default() -> Self {
        Self::new()
    }
}

/// Registration handle returned by [`SnapshotBus::subscribe`].
///
/// Dropping it removes the callback.
pub struct Subscription {
    id: u64,
    bus: Weak<BusInner>,
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(bus) = self.bus.upgrade() {
            bus.subscribers.remove(&self.id);
        }
    }
}
