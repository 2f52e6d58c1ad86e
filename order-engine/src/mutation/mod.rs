//! Mutation Coordinator - serialized writes against the external store
//!
//! # Command Flow
//!
//! ```text
//! set_status / update_order / delete_order
//!     ├─ 1. Validate caller input
//!     ├─ 2. Acquire the single-flight permit (or fail Busy immediately)
//!     ├─ 3. Re-fetch the order (NotFound if it vanished)
//!     ├─ 4. Plan the write (per-action planner -> flattened PatchSet)
//!     ├─ 5. Apply to the store
//!     └─ 6. Return MutationResponse (failures are data, never panics)
//! ```
//!
//! The permit is an explicit single-slot semaphore owned by the
//! coordinator instance, held from before the first store round trip
//! until the operation resolves - the RAII guard is the `finally` path.
//! Concurrent mutations are rejected with `Busy`, never queued. There is
//! no cross-instance locking; the flattened-path write strategy minimizes
//! but does not eliminate lost updates on the same field between separate
//! clients.

pub mod actions;

pub use actions::{DeleteOrderAction, SetStatusAction, UpdateOrderAction};

use std::sync::Arc;

use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::Value;
use tokio::sync::Semaphore;

use shared::order::{MutationError, MutationErrorCode, MutationResponse, OrderStatus};

use crate::store::{OrderStore, PatchSet, StoreError};
use crate::utils::EngineError;

/// Internal mutation failure, converted to [`MutationError`] at the
/// boundary
#[derive(Debug, thiserror::Error)]
pub enum CoordinatorError {
    #[error("Order not found: {0}")]
    NotFound(String),

    #[error("Another mutation is already in flight")]
    Busy,

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<EngineError> for CoordinatorError {
    fn from(err: EngineError) -> Self {
        match err {
            EngineError::NotFound(id) => CoordinatorError::NotFound(id),
            EngineError::Validation(msg) => CoordinatorError::Validation(msg),
            EngineError::Store(e) => CoordinatorError::Store(e),
            EngineError::Internal(msg) => CoordinatorError::Internal(msg),
        }
    }
}

impl From<CoordinatorError> for MutationError {
    fn from(err: CoordinatorError) -> Self {
        let (code, message) = match err {
            CoordinatorError::NotFound(id) => (
                MutationErrorCode::NotFound,
                format!("Order not found: {}", id),
            ),
            CoordinatorError::Busy => (
                MutationErrorCode::Busy,
                "Another mutation is already in flight".to_string(),
            ),
            CoordinatorError::Validation(msg) => (MutationErrorCode::Validation, msg),
            CoordinatorError::Store(e) => (MutationErrorCode::Connection, e.to_string()),
            CoordinatorError::Internal(msg) => (MutationErrorCode::Internal, msg),
        };
        MutationError::new(code, message)
    }
}

/// Read-only context every planner sees: the freshly fetched record and
/// one consistent `now`
pub struct MutationContext<'a> {
    pub order_id: &'a str,
    pub current: &'a serde_json::Map<String, Value>,
    pub now: DateTime<Utc>,
}

/// What a planned mutation does to the store
pub enum WritePlan {
    Patch(PatchSet),
    RemoveTree,
}

/// One mutation operation, planned against the current record.
///
/// Planners are pure - all store I/O stays in the coordinator.
pub trait MutationPlanner {
    fn plan(&self, ctx: &MutationContext<'_>) -> Result<WritePlan, CoordinatorError>;
}

/// ISO timestamp in the store's JavaScript-shaped format
pub(crate) fn iso_timestamp(now: DateTime<Utc>) -> String {
    now.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Serialized mutation entry points for one venue
pub struct MutationCoordinator {
    store: Arc<dyn OrderStore>,
    venue: String,
    /// Single-slot lock: at most one in-flight mutation per engine instance
    in_flight: Arc<Semaphore>,
}

impl MutationCoordinator {
    pub fn new(store: Arc<dyn OrderStore>, venue: impl Into<String>) -> Self {
        Self {
            store,
            venue: venue.into(),
            in_flight: Arc::new(Semaphore::new(1)),
        }
    }

    /// Transition an order to `status`, stamping its lifecycle timestamp.
    /// `extra` fields are merged into the write as individual paths.
    pub async fn set_status(
        &self,
        order_id: &str,
        status: OrderStatus,
        extra: Option<serde_json::Map<String, Value>>,
    ) -> MutationResponse {
        self.execute(order_id, SetStatusAction { status, extra })
            .await
    }

    /// Apply a partial edit. Every patch field is written as its own path;
    /// `items` triggers validation plus `totalAmount`/`itemCount`
    /// recomputation.
    pub async fn update_order(
        &self,
        order_id: &str,
        patch: serde_json::Map<String, Value>,
    ) -> MutationResponse {
        self.execute(order_id, UpdateOrderAction { patch }).await
    }

    /// Remove the order's entire sub-tree
    pub async fn delete_order(&self, order_id: &str) -> MutationResponse {
        self.execute(order_id, DeleteOrderAction).await
    }

    async fn execute(&self, order_id: &str, planner: impl MutationPlanner) -> MutationResponse {
        match self.try_execute(order_id, planner).await {
            Ok(()) => MutationResponse::ok(),
            Err(error) => {
                tracing::warn!(order_id = %order_id, error = %error, "Mutation failed");
                MutationResponse::failure(error.into())
            }
        }
    }

    async fn try_execute(
        &self,
        order_id: &str,
        planner: impl MutationPlanner,
    ) -> Result<(), CoordinatorError> {
        if order_id.trim().is_empty() {
            return Err(CoordinatorError::Validation(
                "order id must not be empty".to_string(),
            ));
        }

        // Held until return on every path, success or failure
        let _permit = self
            .in_flight
            .try_acquire()
            .map_err(|_| CoordinatorError::Busy)?;

        // Existence is re-checked at call time, never assumed from cache
        let current = match self.store.fetch(&self.venue, order_id).await? {
            Some(Value::Object(map)) => map,
            Some(_) => {
                return Err(CoordinatorError::Internal(format!(
                    "Order record is malformed: {}",
                    order_id
                )));
            }
            None => return Err(CoordinatorError::NotFound(order_id.to_string())),
        };

        let ctx = MutationContext {
            order_id,
            current: &current,
            now: Utc::now(),
        };

        match planner.plan(&ctx)? {
            WritePlan::Patch(patch) => {
                self.store.write_paths(&self.venue, order_id, patch).await?;
            }
            WritePlan::RemoveTree => {
                self.store.delete_tree(&self.venue, order_id).await?;
            }
        }
        Ok(())
    }
}
