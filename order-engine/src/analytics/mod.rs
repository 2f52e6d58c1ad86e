//! Analytics Engine - aggregate stats over the filtered order set
//!
//! Pure and deterministic: every getter recomputes from the order set it
//! is handed, holds no state, and is safe to re-run on every snapshot.
//! Revenue figures only count orders in a terminal revenue state
//! (completed/served); rejected orders never contribute.

use std::collections::{BTreeMap, HashSet};

use chrono::Timelike;
use chrono_tz::Tz;
use rust_decimal::Decimal;
use serde::Serialize;

use shared::order::{Order, OrderStatus};

use crate::orders::money::{to_decimal, to_f64};

/// Sentinel table identifier excluded from the distinct-table count
const UNKNOWN_TABLE: &str = "Unknown";

/// Aggregate statistics over one filtered order set
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct OrderStats {
    /// Size of the filtered set
    pub total: usize,
    pub received: usize,
    pub preparing: usize,
    pub ready: usize,
    pub completed: usize,
    pub served: usize,
    pub rejected: usize,
    /// Revenue over completed/served orders only
    pub revenue: f64,
    /// Average order value over the same revenue-counted set
    pub average_order_value: f64,
    /// Distinct tables, excluding the `"Unknown"` sentinel
    pub active_tables: usize,
    /// Hour of day (0-23, venue tz) with the most orders; ties break to
    /// the lowest hour, `None` for an empty set
    pub peak_hour: Option<u32>,
}

impl OrderStats {
    /// Display label for the peak hour ("N/A" when the set is empty)
    pub fn peak_hour_label(&self) -> String {
        match self.peak_hour {
            Some(hour) => format!("{:02}:00", hour),
            None => "N/A".to_string(),
        }
    }
}

/// Per-menu-item aggregate
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MenuStat {
    pub name: String,
    /// Category snapshot of the first item seen under this name
    pub category: String,
    pub quantity: i64,
    pub revenue: f64,
    /// Percentage of all line-item quantity in the filtered set
    pub share: f64,
}

/// Per-category aggregate
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CategoryStat {
    pub name: String,
    pub quantity: i64,
    pub revenue: f64,
    pub share: f64,
}

/// Compute aggregate statistics for one filtered set
pub fn compute_stats(orders: &[Order], tz: Tz) -> OrderStats {
    let mut stats = OrderStats {
        total: orders.len(),
        ..Default::default()
    };

    let mut revenue = Decimal::ZERO;
    let mut counted_orders = 0usize;
    let mut tables: HashSet<&str> = HashSet::new();
    let mut hour_counts = [0usize; 24];

    for order in orders {
        let lifecycle = order.lifecycle();
        match lifecycle {
            OrderStatus::Received => stats.received += 1,
            OrderStatus::Preparing => stats.preparing += 1,
            OrderStatus::Ready => stats.ready += 1,
            OrderStatus::Completed => stats.completed += 1,
            OrderStatus::Served => stats.served += 1,
            OrderStatus::Rejected => stats.rejected += 1,
        }

        if lifecycle.counts_toward_revenue() {
            revenue += to_decimal(order.total_amount);
            counted_orders += 1;
        }

        if order.table != UNKNOWN_TABLE {
            tables.insert(order.table.as_str());
        }

        let hour = order.order_timestamp.with_timezone(&tz).hour() as usize;
        hour_counts[hour] += 1;
    }

    stats.revenue = to_f64(revenue);
    stats.average_order_value = if counted_orders > 0 {
        to_f64(revenue / Decimal::from(counted_orders))
    } else {
        0.0
    };
    stats.active_tables = tables.len();
    stats.peak_hour = peak_hour(&hour_counts, orders.is_empty());
    stats
}

fn peak_hour(hour_counts: &[usize; 24], empty: bool) -> Option<u32> {
    if empty {
        return None;
    }
    let mut best_hour = 0u32;
    let mut best_count = hour_counts[0];
    for (hour, &count) in hour_counts.iter().enumerate().skip(1) {
        // strictly greater keeps the lowest hour on ties
        if count > best_count {
            best_hour = hour as u32;
            best_count = count;
        }
    }
    Some(best_hour)
}

struct Accumulator {
    category: String,
    quantity: i64,
    revenue: Decimal,
}

fn accumulate<'a>(
    orders: &'a [Order],
    key_of: impl Fn(&'a shared::order::OrderItem) -> &'a str,
) -> (BTreeMap<&'a str, Accumulator>, i64) {
    let mut groups: BTreeMap<&str, Accumulator> = BTreeMap::new();
    let mut total_quantity = 0i64;

    for order in orders {
        for item in &order.items {
            let entry = groups.entry(key_of(item)).or_insert_with(|| Accumulator {
                category: item.menu_category.clone(),
                quantity: 0,
                revenue: Decimal::ZERO,
            });
            entry.quantity += item.quantity as i64;
            entry.revenue += to_decimal(item.line_total);
            total_quantity += item.quantity as i64;
        }
    }
    (groups, total_quantity)
}

fn share_of(quantity: i64, total_quantity: i64) -> f64 {
    if total_quantity == 0 {
        return 0.0;
    }
    to_f64(Decimal::from(quantity) * Decimal::ONE_HUNDRED / Decimal::from(total_quantity))
}

/// Full per-menu-item ranking: quantity descending, name ascending on
/// ties. Never truncated - display truncation is [`top_menu`].
pub fn menu_rankings(orders: &[Order]) -> Vec<MenuStat> {
    let (groups, total_quantity) = accumulate(orders, |item| item.menu_name.as_str());

    let mut rankings: Vec<MenuStat> = groups
        .into_iter()
        .map(|(name, acc)| MenuStat {
            name: name.to_string(),
            category: acc.category,
            quantity: acc.quantity,
            revenue: to_f64(acc.revenue),
            share: share_of(acc.quantity, total_quantity),
        })
        .collect();
    rankings.sort_by(|a, b| b.quantity.cmp(&a.quantity).then_with(|| a.name.cmp(&b.name)));
    rankings
}

/// Top-N menu ranking for display purposes only
pub fn top_menu(orders: &[Order], limit: usize) -> Vec<MenuStat> {
    let mut rankings = menu_rankings(orders);
    rankings.truncate(limit);
    rankings
}

/// Per-category ranking, unbounded
pub fn category_rankings(orders: &[Order]) -> Vec<CategoryStat> {
    let (groups, total_quantity) = accumulate(orders, |item| item.menu_category.as_str());

    let mut rankings: Vec<CategoryStat> = groups
        .into_iter()
        .map(|(name, acc)| CategoryStat {
            name: name.to_string(),
            quantity: acc.quantity,
            revenue: to_f64(acc.revenue),
            share: share_of(acc.quantity, total_quantity),
        })
        .collect();
    rankings.sort_by(|a, b| b.quantity.cmp(&a.quantity).then_with(|| a.name.cmp(&b.name)));
    rankings
}
