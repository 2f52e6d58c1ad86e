//! Order processing - normalization, money arithmetic, sorting
//!
//! - **normalizer**: raw store snapshot -> canonical [`shared::Order`] set
//! - **money**: precise decimal arithmetic for line totals and revenue
//! - **sort**: default and caller-selected orderings of the canonical set

pub mod money;
pub mod normalizer;
pub mod sort;

pub use normalizer::{normalize_record, normalize_snapshot};
pub use sort::{SortDirection, SortKey, SortSpec, sort_orders};
