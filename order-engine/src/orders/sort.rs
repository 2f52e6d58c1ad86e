//! Canonical-set ordering
//!
//! The feed applies one sort to every published snapshot: newest first by
//! default, or whichever key and direction the consumer configured.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};
use shared::order::Order;

/// Sortable fields of the canonical order set
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum SortKey {
    #[default]
    Timestamp,
    Status,
    Table,
    OrderNumber,
}

/// Sort direction
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Ascending,
    #[default]
    Descending,
}

/// Complete sort selection; default is newest first
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct SortSpec {
    pub key: SortKey,
    pub direction: SortDirection,
}

impl SortSpec {
    pub fn new(key: SortKey, direction: SortDirection) -> Self {
        Self { key, direction }
    }
}

/// Table labels and order numbers are frequently numeric strings; compare
/// them numerically when both sides parse, lexically otherwise.
fn numeric_then_lexical(a: &str, b: &str) -> Ordering {
    match (a.trim().parse::<f64>(), b.trim().parse::<f64>()) {
        (Ok(x), Ok(y)) => x.partial_cmp(&y).unwrap_or(Ordering::Equal),
        _ => a.cmp(b),
    }
}

/// Sort in place. Ties fall back to the order id so the published set is
/// stable across snapshots.
pub fn sort_orders(orders: &mut [Order], spec: &SortSpec) {
    orders.sort_by(|a, b| {
        let ordering = match spec.key {
            SortKey::Timestamp => a.order_timestamp.cmp(&b.order_timestamp),
            SortKey::Status => a
                .normalized_status
                .to_ascii_lowercase()
                .cmp(&b.normalized_status.to_ascii_lowercase()),
            SortKey::Table => numeric_then_lexical(&a.table, &b.table),
            SortKey::OrderNumber => numeric_then_lexical(&a.order_number, &b.order_number),
        };
        let ordering = match spec.direction {
            SortDirection::Ascending => ordering,
            SortDirection::Descending => ordering.reverse(),
        };
        ordering.then_with(|| a.id.cmp(&b.id))
    });
}
