//! SetStatus planner
//!
//! Transitions an order to a new lifecycle status. The write touches only
//! the status fields, the last-updated stamp, the lifecycle timestamp for
//! the new status, and whatever `extra` fields the caller supplied - each
//! as its own path, so concurrent partial writes never clobber unrelated
//! siblings.

use serde_json::Value;

use shared::order::OrderStatus;

use crate::mutation::{CoordinatorError, MutationContext, MutationPlanner, WritePlan, iso_timestamp};
use crate::store::PatchSet;

/// SetStatus action
#[derive(Debug, Clone)]
pub struct SetStatusAction {
    pub status: OrderStatus,
    /// Caller-supplied sibling fields, flattened into the same write
    pub extra: Option<serde_json::Map<String, Value>>,
}

impl MutationPlanner for SetStatusAction {
    fn plan(&self, ctx: &MutationContext<'_>) -> Result<WritePlan, CoordinatorError> {
        let mut patch = PatchSet::new();

        // Extra fields first - canonical fields below win on conflict
        if let Some(extra) = &self.extra {
            for (key, value) in extra {
                if key == "id" {
                    tracing::warn!(order_id = %ctx.order_id, "Ignoring attempt to rewrite order id");
                    continue;
                }
                patch.merge(key, value);
            }
        }

        let now_iso = iso_timestamp(ctx.now);
        patch.set("status", self.status.as_str());
        patch.set("normalizedStatus", self.status.as_str());
        patch.set("updatedAt", now_iso.clone());

        // A stamp that already exists is never rewritten
        let key = self.status.timestamp_key();
        if !has_stamp(ctx.current, key) {
            patch.set(format!("lifecycleTimestamps/{}", key), now_iso);
        }

        Ok(WritePlan::Patch(patch))
    }
}

fn has_stamp(current: &serde_json::Map<String, Value>, key: &str) -> bool {
    current
        .get("lifecycleTimestamps")
        .and_then(|v| v.as_object())
        .is_some_and(|stamps| stamps.contains_key(key))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use serde_json::json;

    fn context<'a>(
        order_id: &'a str,
        current: &'a serde_json::Map<String, Value>,
    ) -> MutationContext<'a> {
        MutationContext {
            order_id,
            current,
            now: Utc::now(),
        }
    }

    #[test]
    fn test_plan_touches_only_status_fields_and_stamp() {
        let current = json!({ "status": "received" }).as_object().cloned().unwrap();
        let action = SetStatusAction {
            status: OrderStatus::Preparing,
            extra: None,
        };

        let WritePlan::Patch(patch) = action.plan(&context("o1", &current)).unwrap() else {
            panic!("Expected a patch plan");
        };

        assert_eq!(patch.len(), 4);
        assert!(patch.touches("status"));
        assert!(patch.touches("normalizedStatus"));
        assert!(patch.touches("updatedAt"));
        assert!(patch.touches("lifecycleTimestamps/preparingAt"));
    }

    #[test]
    fn test_existing_stamp_is_not_replanned() {
        let current = json!({
            "status": "completed",
            "lifecycleTimestamps": { "completedAt": "2024-05-01T10:00:00.000Z" }
        })
        .as_object()
        .cloned()
        .unwrap();
        let action = SetStatusAction {
            status: OrderStatus::Completed,
            extra: None,
        };

        let WritePlan::Patch(patch) = action.plan(&context("o1", &current)).unwrap() else {
            panic!("Expected a patch plan");
        };

        assert!(!patch.touches("lifecycleTimestamps/completedAt"));
    }

    #[test]
    fn test_extra_cannot_shadow_canonical_fields() {
        let current = json!({ "status": "ready" }).as_object().cloned().unwrap();
        let extra = json!({ "status": "sneaky", "note": "vip" })
            .as_object()
            .cloned();
        let action = SetStatusAction {
            status: OrderStatus::Served,
            extra,
        };

        let WritePlan::Patch(patch) = action.plan(&context("o1", &current)).unwrap() else {
            panic!("Expected a patch plan");
        };

        let status_op = patch.ops().iter().find(|op| op.path == "status").unwrap();
        assert_eq!(status_op.value, json!("served"));
        assert!(patch.touches("note"));
    }

    #[test]
    fn test_extra_id_is_dropped() {
        let current = json!({ "status": "ready" }).as_object().cloned().unwrap();
        let extra = json!({ "id": "o2" }).as_object().cloned();
        let action = SetStatusAction {
            status: OrderStatus::Served,
            extra,
        };

        let WritePlan::Patch(patch) = action.plan(&context("o1", &current)).unwrap() else {
            panic!("Expected a patch plan");
        };
        assert!(!patch.touches("id"));
    }
}
