//! Canonical order record - the normalized snapshot shape
//!
//! Field names serialize in camelCase because UI collaborators and the
//! external store both speak the JavaScript-shaped record format. Raw
//! fields the normalizer does not recognize survive in `extra` and are
//! flattened back beneath the canonical fields on serialization; canonical
//! fields always win on conflict.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::status::OrderStatus;

/// One line item of an order
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    /// Item ID (store key, array index, or explicit field)
    pub id: String,
    /// Menu item name
    pub menu_name: String,
    /// Menu category name snapshot (for analytics grouping)
    pub menu_category: String,
    /// Quantity, always >= 1
    pub quantity: i32,
    /// Per-unit price
    pub unit_price: f64,
    /// Line total; recomputed as unit_price * quantity when the raw value
    /// is absent or stale
    pub line_total: f64,
    /// Free-form note ("no onions")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// Optional customer block attached to an order
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CustomerInfo {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub table_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

impl CustomerInfo {
    /// True when no field carries a value
    pub fn is_empty(&self) -> bool {
        self.table_number.is_none() && self.name.is_none() && self.phone.is_none()
    }
}

/// Canonical, immutable order snapshot produced by the normalizer
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    /// Store-assigned key, unique within one venue; never reassigned
    pub id: String,
    /// Human-facing sequence label; falls back to `id`
    pub order_number: String,
    /// Status string as stored (legacy values survive here untouched)
    pub status: String,
    /// Trimmed status used by the filter pipeline
    pub normalized_status: String,
    /// Resolved order timestamp
    pub order_timestamp: DateTime<Utc>,
    /// Calendar date of the order in the venue timezone
    pub order_date: NaiveDate,
    /// Table or seat identifier, `"Unknown"` when absent
    pub table: String,
    /// Line items
    pub items: Vec<OrderItem>,
    /// Order total; explicit store value preferred, else sum of line totals
    pub total_amount: f64,
    /// Customer block when present
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer: Option<CustomerInfo>,
    /// Transition name -> ISO timestamp; grows only, stamps are never
    /// overwritten
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub lifecycle_timestamps: BTreeMap<String, String>,
    /// Unrecognized raw fields, preserved beneath the canonical ones
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

impl Order {
    /// Typed lifecycle state; unknown legacy strings fall back to
    /// [`OrderStatus::Received`]
    pub fn lifecycle(&self) -> OrderStatus {
        OrderStatus::parse(&self.normalized_status).unwrap_or_default()
    }

    /// Total quantity across all line items
    pub fn item_count(&self) -> i32 {
        self.items.iter().map(|i| i.quantity).sum()
    }

    /// Whether the order already carries a stamp for `key`
    pub fn has_lifecycle_stamp(&self, key: &str) -> bool {
        self.lifecycle_timestamps.contains_key(key)
    }
}
