//! External store abstraction
//!
//! # 架构
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │                OrderEngine                  │
//! └──────────────────────┬──────────────────────┘
//!                        │
//!             ┌──────────┴──────────┐
//!             │   OrderStore Trait  │  ◄── 可插拔实现
//!             └──────────┬──────────┘
//!                        │
//!            ┌───────────┴───────────┐
//!            ▼                       ▼
//!       MemoryStore            (real-time backend
//!       (同进程, 测试用)         adapter, out of tree)
//! ```
//!
//! The engine never talks to a concrete real-time backend. It depends on
//! this narrow seam only: a subscribable key-value tree that pushes a full
//! snapshot of one venue's order sub-tree on every change, applies
//! flattened partial-path writes independently, and deletes sub-trees.

mod memory;
mod patch;

pub use memory::MemoryStore;
pub use patch::{PatchOp, PatchSet};

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::broadcast;

/// Raw order sub-tree snapshot: order id -> raw record
pub type RawSnapshot = serde_json::Map<String, Value>;

/// Store-level errors
#[derive(Debug, Clone, thiserror::Error)]
pub enum StoreError {
    /// Transport-level failure; the subscription manager retries these
    #[error("Connection error: {0}")]
    Connection(String),

    /// The subscription was closed from the store side
    #[error("Subscription closed")]
    Closed,

    /// Backend rejected the operation
    #[error("Backend error: {0}")]
    Backend(String),
}

/// Result alias for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Signal pushed through a live subscription
#[derive(Debug, Clone)]
pub enum StoreSignal {
    /// Full point-in-time copy of the venue's order sub-tree
    Snapshot(RawSnapshot),
    /// Transport error; the stream may keep delivering afterwards
    Error(StoreError),
}

/// Live subscription handle. Dropping it unsubscribes.
pub struct SnapshotStream {
    rx: broadcast::Receiver<StoreSignal>,
}

impl SnapshotStream {
    pub fn new(rx: broadcast::Receiver<StoreSignal>) -> Self {
        Self { rx }
    }

    /// Next signal, or `None` once the store side is gone. Lagged
    /// deliveries are skipped - only the freshest snapshot matters.
    pub async fn recv(&mut self) -> Option<StoreSignal> {
        loop {
            match self.rx.recv().await {
                Ok(signal) => return Some(signal),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::debug!(skipped, "Snapshot stream lagged, skipping stale signals");
                    continue;
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }
}

/// Subscribable external store holding one order sub-tree per venue
///
/// All engine logic depends only on this narrow seam: subscribe to a
/// sub-tree, re-read one record, apply partial-path writes, delete a
/// sub-tree.
#[async_trait]
pub trait OrderStore: Send + Sync + 'static {
    /// Open a live subscription to a venue's order sub-tree. The store
    /// pushes one initial snapshot immediately and a full snapshot on
    /// every subsequent change.
    async fn subscribe(&self, venue: &str) -> StoreResult<SnapshotStream>;

    /// Fetch one order record as currently stored. `None` when the order
    /// does not exist (mutations re-check existence through this).
    async fn fetch(&self, venue: &str, order_id: &str) -> StoreResult<Option<Value>>;

    /// Apply a flattened patch to one order. Each `(path, value)` pair is
    /// applied independently so concurrent writers never clobber
    /// unrelated sibling fields.
    async fn write_paths(&self, venue: &str, order_id: &str, patch: PatchSet) -> StoreResult<()>;

    /// Remove an order's entire sub-tree.
    async fn delete_tree(&self, venue: &str, order_id: &str) -> StoreResult<()>;
}
