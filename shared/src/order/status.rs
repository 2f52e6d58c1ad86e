//! Order lifecycle status
//!
//! 订单生命周期状态机：
//!
//! ```text
//! received ──▶ preparing ──▶ ready ──▶ completed (终态)
//!     │            │           │   └──▶ served    (终态)
//!     └────────────┴───────────┴──────▶ rejected  (终态)
//! ```
//!
//! The graph is advisory: callers may set any status, but every transition
//! stamps its lifecycle timestamp (see [`OrderStatus::timestamp_key`]).
//! Legacy free-form status strings exist only at the normalization
//! boundary; inside the engine the vocabulary is this closed enum.

use serde::{Deserialize, Serialize};

/// Closed order lifecycle vocabulary
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    /// 新订单 (初始状态)
    #[default]
    Received,
    /// 备餐中
    Preparing,
    /// 可取餐
    Ready,
    /// 已完成 (终态, 计入营收)
    Completed,
    /// 已上桌 (终态, 计入营收)
    Served,
    /// 已拒绝 (终态, 任何非终态均可达)
    Rejected,
}

impl OrderStatus {
    /// All states, in lifecycle order
    pub const ALL: [OrderStatus; 6] = [
        OrderStatus::Received,
        OrderStatus::Preparing,
        OrderStatus::Ready,
        OrderStatus::Completed,
        OrderStatus::Served,
        OrderStatus::Rejected,
    ];

    /// Canonical lowercase name (what gets written back to the store)
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Received => "received",
            OrderStatus::Preparing => "preparing",
            OrderStatus::Ready => "ready",
            OrderStatus::Completed => "completed",
            OrderStatus::Served => "served",
            OrderStatus::Rejected => "rejected",
        }
    }

    /// Lenient parse for the normalization boundary.
    ///
    /// Accepts the canonical names case-insensitively plus the legacy
    /// synonyms that show up in old records. Anything else is `None`;
    /// callers decide the fallback (the normalizer defaults to
    /// [`OrderStatus::Received`]).
    pub fn parse(raw: &str) -> Option<OrderStatus> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "received" | "pending" | "new" => Some(OrderStatus::Received),
            "preparing" | "in_progress" | "cooking" => Some(OrderStatus::Preparing),
            "ready" => Some(OrderStatus::Ready),
            "completed" | "complete" | "done" => Some(OrderStatus::Completed),
            "served" | "delivered" => Some(OrderStatus::Served),
            "rejected" | "cancelled" | "canceled" => Some(OrderStatus::Rejected),
            _ => None,
        }
    }

    /// Terminal states have no outgoing transitions
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            OrderStatus::Completed | OrderStatus::Served | OrderStatus::Rejected
        )
    }

    /// Whether orders in this state count toward revenue totals
    pub fn counts_toward_revenue(&self) -> bool {
        matches!(self, OrderStatus::Completed | OrderStatus::Served)
    }

    /// Key in the order's `lifecycleTimestamps` map stamped when this
    /// status is set
    pub fn timestamp_key(&self) -> &'static str {
        match self {
            OrderStatus::Received => "receivedAt",
            OrderStatus::Preparing => "preparingAt",
            OrderStatus::Ready => "readyAt",
            OrderStatus::Completed => "completedAt",
            OrderStatus::Served => "servedAt",
            OrderStatus::Rejected => "rejectedAt",
        }
    }

    /// Legal successors in the advisory transition graph
    pub fn next_states(&self) -> &'static [OrderStatus] {
        match self {
            OrderStatus::Received => &[OrderStatus::Preparing, OrderStatus::Rejected],
            OrderStatus::Preparing => &[OrderStatus::Ready, OrderStatus::Rejected],
            OrderStatus::Ready => &[
                OrderStatus::Completed,
                OrderStatus::Served,
                OrderStatus::Rejected,
            ],
            OrderStatus::Completed | OrderStatus::Served | OrderStatus::Rejected => &[],
        }
    }

    /// Whether `next` is a legal successor of `self`
    pub fn can_transition_to(&self, next: OrderStatus) -> bool {
        self.next_states().contains(&next)
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_canonical_names() {
        for status in OrderStatus::ALL {
            assert_eq!(OrderStatus::parse(status.as_str()), Some(status));
        }
    }

    #[test]
    fn test_parse_is_case_insensitive_and_trims() {
        assert_eq!(OrderStatus::parse("  READY "), Some(OrderStatus::Ready));
        assert_eq!(OrderStatus::parse("Completed"), Some(OrderStatus::Completed));
    }

    #[test]
    fn test_parse_legacy_synonyms() {
        assert_eq!(OrderStatus::parse("pending"), Some(OrderStatus::Received));
        assert_eq!(OrderStatus::parse("done"), Some(OrderStatus::Completed));
        assert_eq!(OrderStatus::parse("delivered"), Some(OrderStatus::Served));
        assert_eq!(OrderStatus::parse("cancelled"), Some(OrderStatus::Rejected));
    }

    #[test]
    fn test_parse_unknown_is_none() {
        assert_eq!(OrderStatus::parse("Accepted"), None);
        assert_eq!(OrderStatus::parse(""), None);
    }

    #[test]
    fn test_terminal_states() {
        assert!(OrderStatus::Completed.is_terminal());
        assert!(OrderStatus::Served.is_terminal());
        assert!(OrderStatus::Rejected.is_terminal());
        assert!(!OrderStatus::Received.is_terminal());
        assert!(!OrderStatus::Preparing.is_terminal());
        assert!(!OrderStatus::Ready.is_terminal());
    }

    #[test]
    fn test_revenue_states() {
        let counted: Vec<_> = OrderStatus::ALL
            .into_iter()
            .filter(|s| s.counts_toward_revenue())
            .collect();
        assert_eq!(counted, vec![OrderStatus::Completed, OrderStatus::Served]);
    }

    #[test]
    fn test_timestamp_keys_are_unique() {
        let keys: std::collections::HashSet<_> =
            OrderStatus::ALL.iter().map(|s| s.timestamp_key()).collect();
        assert_eq!(keys.len(), OrderStatus::ALL.len());
    }

    #[test]
    fn test_transition_graph() {
        assert!(OrderStatus::Received.can_transition_to(OrderStatus::Preparing));
        assert!(OrderStatus::Preparing.can_transition_to(OrderStatus::Rejected));
        assert!(OrderStatus::Ready.can_transition_to(OrderStatus::Served));
        assert!(!OrderStatus::Completed.can_transition_to(OrderStatus::Received));
        assert!(!OrderStatus::Received.can_transition_to(OrderStatus::Completed));
    }

    #[test]
    fn test_serde_roundtrip_lowercase() {
        let json = serde_json::to_string(&OrderStatus::Preparing).unwrap();
        assert_eq!(json, "\"preparing\"");
        let back: OrderStatus = serde_json::from_str(&json).unwrap();
        assert_eq!(back, OrderStatus::Preparing);
    }
}
