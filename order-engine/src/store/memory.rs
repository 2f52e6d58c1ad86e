//! Memory 存储实现 (同进程通信)
//!
//! In-process [`OrderStore`] used by tests, demos and oneshot tooling.
//! Every venue owns one record tree and one broadcast channel; every
//! successful write or delete pushes a full snapshot to all subscribers,
//! which is exactly the contract a real-time backend adapter has to honor.

use async_trait::async_trait;
use dashmap::DashMap;
use serde_json::Value;
use tokio::sync::broadcast;

use super::{OrderStore, PatchSet, RawSnapshot, SnapshotStream, StoreError, StoreResult, StoreSignal};

/// Capacity of each per-venue broadcast channel
const DEFAULT_CHANNEL_CAPACITY: usize = 64;

/// In-memory subscribable order store
#[derive(Debug)]
pub struct MemoryStore {
    venues: DashMap<String, RawSnapshot>,
    channels: DashMap<String, broadcast::Sender<StoreSignal>>,
    capacity: usize,
    /// Simulated transport outage (test hook)
    offline: std::sync::atomic::AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CHANNEL_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            venues: DashMap::new(),
            channels: DashMap::new(),
            capacity,
            offline: std::sync::atomic::AtomicBool::new(false),
        }
    }

    fn sender(&self, venue: &str) -> broadcast::Sender<StoreSignal> {
        self.channels
            .entry(venue.to_string())
            .or_insert_with(|| broadcast::channel(self.capacity).0)
            .clone()
    }

    fn is_offline(&self) -> bool {
        self.offline.load(std::sync::atomic::Ordering::SeqCst)
    }

    /// Current tree of one venue (empty when the venue has no orders)
    pub fn snapshot(&self, venue: &str) -> RawSnapshot {
        self.venues
            .get(venue)
            .map(|tree| tree.clone())
            .unwrap_or_default()
    }

    /// Seed an order record without going through the mutation path,
    /// then push the resulting snapshot.
    pub fn seed_order(&self, venue: &str, order_id: &str, record: Value) {
        self.venues
            .entry(venue.to_string())
            .or_default()
            .insert(order_id.to_string(), record);
        self.publish(venue);
    }

    /// Inject a transport error into a venue's subscription stream
    /// (test hook - a real adapter surfaces backend errors this way).
    pub fn push_error(&self, venue: &str, error: StoreError) {
        if let Some(tx) = self.channels.get(venue) {
            let _ = tx.send(StoreSignal::Error(error));
        }
    }

    /// Toggle a simulated outage: while offline, every store operation
    /// fails with a connection error.
    pub fn set_offline(&self, offline: bool) {
        self.offline
            .store(offline, std::sync::atomic::Ordering::SeqCst);
    }

    fn publish(&self, venue: &str) {
        let snapshot = self.snapshot(venue);
        if let Some(tx) = self.channels.get(venue) {
            let _ = tx.send(StoreSignal::Snapshot(snapshot));
        }
    }

    /// Apply one path write inside a record. A `null` value removes the
    /// leaf (real-time store convention).
    fn apply_op(record: &mut serde_json::Map<String, Value>, path: &str, value: &Value) {
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        let Some((leaf, parents)) = segments.split_last() else {
            return;
        };

        let mut current = record;
        for segment in parents {
            let entry = current
                .entry(segment.to_string())
                .or_insert_with(|| Value::Object(serde_json::Map::new()));
            if !entry.is_object() {
                *entry = Value::Object(serde_json::Map::new());
            }
            let Value::Object(map) = entry else {
                unreachable!("entry was just coerced to an object");
            };
            current = map;
        }

        if value.is_null() {
            current.remove(*leaf);
        } else {
            current.insert(leaf.to_string(), value.clone());
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl OrderStore for MemoryStore {
    async fn subscribe(&self, venue: &str) -> StoreResult<SnapshotStream> {
        if self.is_offline() {
            return Err(StoreError::Connection("store offline".to_string()));
        }
        let tx = self.sender(venue);
        let rx = tx.subscribe();
        // Initial snapshot lands in the freshly created receiver's buffer
        let _ = tx.send(StoreSignal::Snapshot(self.snapshot(venue)));
        Ok(SnapshotStream::new(rx))
    }

    async fn fetch(&self, venue: &str, order_id: &str) -> StoreResult<Option<Value>> {
        if self.is_offline() {
            return Err(StoreError::Connection("store offline".to_string()));
        }
        Ok(self
            .venues
            .get(venue)
            .and_then(|tree| tree.get(order_id).cloned()))
    }

    async fn write_paths(&self, venue: &str, order_id: &str, patch: PatchSet) -> StoreResult<()> {
        if self.is_offline() {
            return Err(StoreError::Connection("store offline".to_string()));
        }
        {
            let mut tree = self.venues.entry(venue.to_string()).or_default();
            let entry = tree
                .entry(order_id.to_string())
                .or_insert_with(|| Value::Object(serde_json::Map::new()));
            if !entry.is_object() {
                *entry = Value::Object(serde_json::Map::new());
            }
            let Value::Object(record) = entry else {
                unreachable!("entry was just coerced to an object");
            };
            for op in patch.ops() {
                Self::apply_op(record, &op.path, &op.value);
            }
        }
        self.publish(venue);
        Ok(())
    }

    async fn delete_tree(&self, venue: &str, order_id: &str) -> StoreResult<()> {
        if self.is_offline() {
            return Err(StoreError::Connection("store offline".to_string()));
        }
        if let Some(mut tree) = self.venues.get_mut(venue) {
            tree.remove(order_id);
        }
        self.publish(venue);
        Ok(())
    }
}
