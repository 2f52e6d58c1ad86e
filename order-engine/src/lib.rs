//! Order stream engine
//!
//! Subscribes to a continuously mutating collection of order records held
//! in an external real-time store, converts heterogeneous legacy record
//! shapes into one canonical representation, derives filtered views and
//! aggregate analytics, and serializes mutating operations against the
//! same store while the stream keeps pushing new snapshots.
//!
//! # Architecture
//!
//! ```text
//! store ──▶ OrderFeed ──▶ normalizer ──▶ sort ──▶ watch (canonical set)
//!                                                    │
//!                               filters ◀── OrderEngine ──▶ analytics
//!                                                    │
//! store ◀── MutationCoordinator ◀────────────────────┘
//! ```
//!
//! Reads are push-driven: every store snapshot atomically replaces the
//! canonical order set. Writes go through the single-flight
//! [`mutation::MutationCoordinator`] and come back as data, never panics.

pub mod analytics;
pub mod core;
pub mod filters;
pub mod mutation;
pub mod orders;
pub mod store;
pub mod stream;
pub mod utils;

// Re-exports
pub use crate::core::{EngineConfig, OrderEngine};
pub use crate::filters::{FilterOptions, StatusFilter, TimePeriod};
pub use crate::mutation::MutationCoordinator;
pub use crate::orders::{SortDirection, SortKey, SortSpec};
pub use crate::store::{MemoryStore, OrderStore, PatchSet, StoreError};
pub use crate::stream::{ConnectionState, ConnectionStatus, FeedOptions, OrderFeed};
pub use crate::utils::{EngineError, EngineResult};

// Re-export shared types for convenience
pub use shared::order::{
    CustomerInfo, MutationError, MutationErrorCode, MutationResponse, Order, OrderItem,
    OrderStatus,
};
