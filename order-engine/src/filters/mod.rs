//! Filter Pipeline - time period, status, search
//!
//! Three pure stages applied in fixed order because later stages are
//! cheaper over a smaller set:
//!
//! ```text
//! canonical set ──▶ by_period ──▶ by_status ──▶ by_search ──▶ visible set
//! ```
//!
//! Each stage is independently testable, and chaining them is equivalent
//! to one combined predicate - order of application never changes the
//! result. The search term reaching [`by_search`] must already be
//! debounced by the caller (see [`crate::utils::Debouncer`]).

use chrono::NaiveDate;
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use shared::order::{Order, OrderStatus};

use crate::utils::time;

/// Time scope of the visible order set
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TimePeriod {
    Daily,
    Weekly,
    Monthly,
    #[default]
    Total,
}

/// Status scope of the visible order set
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StatusFilter {
    #[default]
    All,
    Only(OrderStatus),
}

/// Complete filter selection coming from the UI collaborators
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterOptions {
    pub period: TimePeriod,
    pub status: StatusFilter,
    /// Free-text search term (already debounced by the caller)
    pub search: String,
    /// Anchor date for `TimePeriod::Daily`; today in the venue timezone
    /// when absent
    pub selected_date: Option<NaiveDate>,
}

/// Stage 1: time period
///
/// `daily` keeps orders dated exactly `selected_date`; `weekly`/`monthly`
/// keep orders inside the current range; `total` is identity.
pub fn by_period(
    orders: &[Order],
    period: TimePeriod,
    selected_date: Option<NaiveDate>,
    tz: Tz,
) -> Vec<Order> {
    match period {
        TimePeriod::Total => orders.to_vec(),
        TimePeriod::Daily => {
            let anchor = selected_date.unwrap_or_else(|| time::today(tz));
            orders
                .iter()
                .filter(|o| o.order_date == anchor)
                .cloned()
                .collect()
        }
        TimePeriod::Weekly => {
            let (start, end) = time::current_week_range(tz);
            orders
                .iter()
                .filter(|o| time::is_in_range(o.order_date, start, end))
                .cloned()
                .collect()
        }
        TimePeriod::Monthly => {
            let (start, end) = time::current_month_range(tz);
            orders
                .iter()
                .filter(|o| time::is_in_range(o.order_date, start, end))
                .cloned()
                .collect()
        }
    }
}

/// Stage 2: status
pub fn by_status(orders: &[Order], status: StatusFilter) -> Vec<Order> {
    match status {
        StatusFilter::All => orders.to_vec(),
        StatusFilter::Only(wanted) => orders
            .iter()
            .filter(|o| o.normalized_status.eq_ignore_ascii_case(wanted.as_str()))
            .cloned()
            .collect(),
    }
}

/// Stage 3: free-text search
///
/// Case-insensitive substring match against order number, id, table,
/// customer name, and item menu names. Empty terms are identity.
pub fn by_search(orders: &[Order], term: &str) -> Vec<Order> {
    let needle = term.trim().to_lowercase();
    if needle.is_empty() {
        return orders.to_vec();
    }
    orders
        .iter()
        .filter(|o| matches_search(o, &needle))
        .cloned()
        .collect()
}

fn matches_search(order: &Order, needle: &str) -> bool {
    if order.order_number.to_lowercase().contains(needle)
        || order.id.to_lowercase().contains(needle)
        || order.table.to_lowercase().contains(needle)
    {
        return true;
    }
    if let Some(customer) = &order.customer
        && let Some(name) = &customer.name
        && name.to_lowercase().contains(needle)
    {
        return true;
    }
    order
        .items
        .iter()
        .any(|item| item.menu_name.to_lowercase().contains(needle))
}

/// Full pipeline in the fixed stage order
pub fn apply(orders: &[Order], options: &FilterOptions, tz: Tz) -> Vec<Order> {
    let after_period = by_period(orders, options.period, options.selected_date, tz);
    let after_status = by_status(&after_period, options.status);
    by_search(&after_status, &options.search)
}
