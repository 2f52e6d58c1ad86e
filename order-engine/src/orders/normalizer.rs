//! Order Normalizer - raw snapshot to canonical orders
//!
//! The store has accumulated several generations of record shapes
//! (`tableNo` vs `tableNumber`, items as arrays vs keyed objects, explicit
//! vs missing line totals). This module is the single place that knows all
//! of them: each raw record resolves through ordered candidate-field
//! chains into exactly one canonical [`Order`].
//!
//! Pure transformation - no store access, no side effects beyond a
//! `warn!` for records that cannot be interpreted at all. Canonical field
//! names lead every candidate chain, so normalizing an already-canonical
//! record yields the same record.

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use chrono_tz::Tz;
use serde_json::Value;
use std::collections::BTreeMap;

use shared::order::{CustomerInfo, Order, OrderItem};

use super::money;
use crate::store::RawSnapshot;

/// Fallback table identifier when every candidate field is absent
const UNKNOWN_TABLE: &str = "Unknown";
/// Fallback status when every candidate field is absent
const DEFAULT_STATUS: &str = "received";
/// Fallback category for items without one
const DEFAULT_CATEGORY: &str = "Uncategorized";

/// Timestamp candidates, canonical name first
const TIMESTAMP_FIELDS: [&str; 4] = ["orderTimestamp", "timestamp", "createdAt", "created_at"];
/// Status candidates, canonical name first
const STATUS_FIELDS: [&str; 4] = ["status", "normalizedStatus", "orderStatus", "state"];
/// Table candidates, canonical name first
const TABLE_FIELDS: [&str; 4] = ["table", "tableNo", "tableNumber", "tableName"];
/// Order-number candidates, canonical name first
const NUMBER_FIELDS: [&str; 4] = ["orderNumber", "orderNo", "receiptNumber", "number"];
/// Item-collection candidates
const ITEMS_FIELDS: [&str; 3] = ["items", "orderItems", "cart"];
/// Explicit-total candidates
const TOTAL_FIELDS: [&str; 3] = ["totalAmount", "total", "grandTotal"];
/// Customer-block candidates
const CUSTOMER_FIELDS: [&str; 2] = ["customer", "customerInfo"];
/// Lifecycle-stamp-map candidates
const LIFECYCLE_FIELDS: [&str; 2] = ["lifecycleTimestamps", "statusTimestamps"];

/// Every key the normalizer interprets. Anything else survives in
/// `Order::extra`; these never do (canonical fields win on conflict).
fn is_consumed_key(key: &str) -> bool {
    key == "id"
        || key == "orderDate"
        || TIMESTAMP_FIELDS.contains(&key)
        || STATUS_FIELDS.contains(&key)
        || TABLE_FIELDS.contains(&key)
        || NUMBER_FIELDS.contains(&key)
        || ITEMS_FIELDS.contains(&key)
        || TOTAL_FIELDS.contains(&key)
        || CUSTOMER_FIELDS.contains(&key)
        || LIFECYCLE_FIELDS.contains(&key)
}

/// Normalize a full raw snapshot (possibly absent or empty) into canonical
/// orders, ordered by store key for determinism. Sorting for display is a
/// separate step.
pub fn normalize_snapshot(raw: Option<&RawSnapshot>, tz: Tz) -> Vec<Order> {
    let Some(raw) = raw else {
        return Vec::new();
    };

    let mut keys: Vec<&String> = raw.keys().collect();
    keys.sort();

    keys.into_iter()
        .filter_map(|id| normalize_record(id, &raw[id.as_str()], tz))
        .collect()
}

/// Normalize one raw record. Returns `None` (with a warning) when the
/// value is not an object at all.
pub fn normalize_record(id: &str, raw: &Value, tz: Tz) -> Option<Order> {
    let Value::Object(map) = raw else {
        tracing::warn!(order_id = %id, "Skipping malformed order record (not an object)");
        return None;
    };

    let order_timestamp = resolve_timestamp(map, tz);
    let order_date = resolve_order_date(map, order_timestamp, tz);

    let status = first_string(map, &STATUS_FIELDS)
        .filter(|s| !s.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_STATUS.to_string());
    let normalized_status = status.trim().to_string();

    let customer = CUSTOMER_FIELDS
        .iter()
        .find_map(|field| map.get(*field))
        .and_then(customer_from_value);

    let table = first_string(map, &TABLE_FIELDS)
        .filter(|s| !s.trim().is_empty())
        .or_else(|| {
            customer
                .as_ref()
                .and_then(|c| c.table_number.clone())
                .filter(|s| !s.trim().is_empty())
        })
        .unwrap_or_else(|| UNKNOWN_TABLE.to_string());

    let order_number = first_string(map, &NUMBER_FIELDS)
        .filter(|s| !s.trim().is_empty())
        .unwrap_or_else(|| id.to_string());

    let items = ITEMS_FIELDS
        .iter()
        .find_map(|field| map.get(*field))
        .map(items_from_value)
        .unwrap_or_default();

    let total_amount = first_number(map, &TOTAL_FIELDS)
        .filter(|n| n.is_finite())
        .unwrap_or_else(|| money::sum_line_totals(&items));

    let lifecycle_timestamps = LIFECYCLE_FIELDS
        .iter()
        .find_map(|field| map.get(*field))
        .map(lifecycle_from_value)
        .unwrap_or_default();

    let extra: serde_json::Map<String, Value> = map
        .iter()
        .filter(|(key, _)| !is_consumed_key(key))
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect();

    Some(Order {
        id: id.to_string(),
        order_number,
        status,
        normalized_status,
        order_timestamp,
        order_date,
        table,
        items,
        total_amount,
        customer,
        lifecycle_timestamps,
        extra,
    })
}

/// Resolve the order timestamp through the candidate chain, falling back
/// to a date-only `orderDate` (midnight, venue tz) and finally to now.
fn resolve_timestamp(map: &serde_json::Map<String, Value>, tz: Tz) -> DateTime<Utc> {
    for field in TIMESTAMP_FIELDS {
        if let Some(ts) = map.get(field).and_then(parse_timestamp) {
            return ts;
        }
    }
    if let Some(date) = map.get("orderDate").and_then(parse_date_value) {
        if let Some(midnight) = date.and_hms_opt(0, 0, 0) {
            // DST gap fallback: 本地时间不存在时退回 UTC
            return tz
                .from_local_datetime(&midnight)
                .earliest()
                .map(|dt| dt.with_timezone(&Utc))
                .unwrap_or_else(|| midnight.and_utc());
        }
    }
    Utc::now()
}

/// Calendar date: explicit `orderDate` wins, else the timestamp's date in
/// the venue timezone.
fn resolve_order_date(
    map: &serde_json::Map<String, Value>,
    timestamp: DateTime<Utc>,
    tz: Tz,
) -> NaiveDate {
    map.get("orderDate")
        .and_then(parse_date_value)
        .unwrap_or_else(|| timestamp.with_timezone(&tz).date_naive())
}

/// First candidate field carrying a string (numbers are stringified -
/// legacy records store table numbers both ways)
fn first_string(map: &serde_json::Map<String, Value>, fields: &[&str]) -> Option<String> {
    fields.iter().find_map(|field| match map.get(*field) {
        Some(Value::String(s)) => Some(s.clone()),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

/// First candidate field carrying a number (numeric strings accepted)
fn first_number(map: &serde_json::Map<String, Value>, fields: &[&str]) -> Option<f64> {
    fields.iter().find_map(|field| number_of(map.get(*field)?))
}

fn number_of(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}

/// Parse a timestamp value: RFC 3339 string, `YYYY-MM-DD HH:MM:SS`, or a
/// Unix epoch number (heuristic: >= 1e12 means milliseconds).
fn parse_timestamp(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::String(s) => {
            let s = s.trim();
            if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
                return Some(dt.with_timezone(&Utc));
            }
            if let Ok(naive) = chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
                return Some(naive.and_utc());
            }
            None
        }
        Value::Number(n) => {
            let n = n.as_f64()?;
            if !n.is_finite() || n <= 0.0 {
                return None;
            }
            let millis = if n >= 1e12 { n as i64 } else { (n * 1000.0) as i64 };
            Utc.timestamp_millis_opt(millis).single()
        }
        _ => None,
    }
}

fn parse_date_value(value: &Value) -> Option<NaiveDate> {
    match value {
        Value::String(s) => NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").ok(),
        _ => None,
    }
}

/// Items arrive as an array or as a keyed object (real-time stores
/// deliver both); keyed objects are iterated in key order.
pub(crate) fn items_from_value(value: &Value) -> Vec<OrderItem> {
    match value {
        Value::Array(entries) => entries
            .iter()
            .enumerate()
            .filter_map(|(idx, entry)| item_from_value(&idx.to_string(), entry))
            .collect(),
        Value::Object(entries) => {
            let mut keys: Vec<&String> = entries.keys().collect();
            keys.sort();
            keys.into_iter()
                .filter_map(|key| item_from_value(key, &entries[key.as_str()]))
                .collect()
        }
        _ => Vec::new(),
    }
}

fn item_from_value(fallback_id: &str, value: &Value) -> Option<OrderItem> {
    let Value::Object(map) = value else {
        return None;
    };

    let id = first_string(map, &["id"]).unwrap_or_else(|| fallback_id.to_string());
    let menu_name = first_string(map, &["menuName", "name", "itemName", "title"])
        .filter(|s| !s.trim().is_empty())
        .unwrap_or_else(|| "Unknown Item".to_string());
    let menu_category = first_string(map, &["menuCategory", "category", "categoryName"])
        .filter(|s| !s.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_CATEGORY.to_string());

    let quantity = first_number(map, &["quantity", "qty", "count"])
        .map(|n| n as i32)
        .unwrap_or(1)
        .max(1);
    let unit_price = first_number(map, &["unitPrice", "price", "rate"])
        .filter(|n| n.is_finite())
        .unwrap_or(0.0);

    let computed = money::line_total(unit_price, quantity);
    let line_total = first_number(map, &["lineTotal", "total", "amount"])
        .filter(|n| n.is_finite() && money::money_eq(*n, computed))
        .unwrap_or(computed);

    let notes = first_string(map, &["notes", "note"]).filter(|s| !s.trim().is_empty());

    Some(OrderItem {
        id,
        menu_name,
        menu_category,
        quantity,
        unit_price,
        line_total,
        notes,
    })
}

fn customer_from_value(value: &Value) -> Option<CustomerInfo> {
    let Value::Object(map) = value else {
        return None;
    };
    let customer = CustomerInfo {
        table_number: first_string(map, &["tableNumber", "tableNo", "table"]),
        name: first_string(map, &["name", "customerName"]),
        phone: first_string(map, &["phone", "phoneNumber", "mobile"]),
    };
    if customer.is_empty() {
        None
    } else {
        Some(customer)
    }
}

fn lifecycle_from_value(value: &Value) -> BTreeMap<String, String> {
    let Value::Object(map) = value else {
        return BTreeMap::new();
    };
    map.iter()
        .filter_map(|(key, value)| match value {
            Value::String(s) => Some((key.clone(), s.clone())),
            Value::Number(n) => Some((key.clone(), n.to_string())),
            _ => None,
        })
        .collect()
}
