//! UpdateOrder planner
//!
//! Applies a partial edit. Every patch field becomes an individually
//! addressed path (never one blind object replace) so a concurrent
//! `set_status` on the same order cannot be lost to a last-writer-wins
//! collision on an unrelated field. When `items` is supplied the item
//! list is validated, line totals are filled, and `totalAmount` plus
//! `itemCount` are recomputed.

use serde_json::Value;

use crate::mutation::{CoordinatorError, MutationContext, MutationPlanner, WritePlan, iso_timestamp};
use crate::orders::money;
use crate::orders::normalizer::items_from_value;
use crate::store::PatchSet;

/// UpdateOrder action
#[derive(Debug, Clone)]
pub struct UpdateOrderAction {
    pub patch: serde_json::Map<String, Value>,
}

impl MutationPlanner for UpdateOrderAction {
    fn plan(&self, ctx: &MutationContext<'_>) -> Result<WritePlan, CoordinatorError> {
        if self.patch.is_empty() {
            return Err(CoordinatorError::Validation(
                "patch must not be empty".to_string(),
            ));
        }

        let mut patch_set = PatchSet::new();

        for (key, value) in &self.patch {
            match key.as_str() {
                // id is assigned by the store at creation, never reassigned
                "id" => {
                    tracing::warn!(order_id = %ctx.order_id, "Ignoring attempt to rewrite order id");
                }
                // handled below with validation and recomputation
                "items" => {}
                _ => {
                    patch_set.merge(key, value);
                }
            }
        }

        if let Some(items_value) = self.patch.get("items") {
            let items = items_from_value(items_value);
            if items.is_empty() {
                return Err(CoordinatorError::Validation(
                    "items must not be empty".to_string(),
                ));
            }
            for item in &items {
                money::validate_item(item)?;
            }

            let total_amount = money::sum_line_totals(&items);
            let item_count: i32 = items.iter().map(|i| i.quantity).sum();

            let items_json = serde_json::to_value(&items)
                .map_err(|e| CoordinatorError::Internal(format!("item serialization: {}", e)))?;
            patch_set.set("items", items_json);
            patch_set.set("totalAmount", total_amount);
            patch_set.set("itemCount", item_count);
        }

        patch_set.set("updatedAt", iso_timestamp(ctx.now));
        Ok(WritePlan::Patch(patch_set))
    }
}
