//! DeleteOrder planner
//!
//! Removes the order's entire sub-tree. Existence was already re-checked
//! by the coordinator; there is nothing left to validate here.

use crate::mutation::{CoordinatorError, MutationContext, MutationPlanner, WritePlan};

/// DeleteOrder action
#[derive(Debug, Clone)]
pub struct DeleteOrderAction;

impl MutationPlanner for DeleteOrderAction {
    fn plan(&self, _ctx: &MutationContext<'_>) -> Result<WritePlan, CoordinatorError> {
        Ok(WritePlan::RemoveTree)
    }
}
