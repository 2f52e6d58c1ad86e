//! OrderEngine - 持有引擎各组件的单例门面
//!
//! OrderEngine 把订阅流、过滤状态、统计计算和变更协调器接成一个
//! 对 UI 协作方友好的表面：
//!
//! | 组件 | 类型 | 说明 |
//! |------|------|------|
//! | feed | OrderFeed | 订阅管理 (规范化 + 排序 + 发布) |
//! | coordinator | MutationCoordinator | 串行化写入 |
//! | filters | RwLock<FilterOptions> | 当前过滤选择 |
//!
//! 过滤视图和所有统计都在每次读取时从当前快照重新计算，
//! 派生数据永远不会被直接修改。

use std::sync::Arc;

use chrono::NaiveDate;
use parking_lot::RwLock;
use serde_json::Value;
use tokio::sync::watch;

use shared::order::{MutationResponse, Order, OrderStatus};

use crate::analytics::{self, CategoryStat, MenuStat, OrderStats};
use crate::core::EngineConfig;
use crate::filters::{self, FilterOptions};
use crate::mutation::MutationCoordinator;
use crate::store::OrderStore;
use crate::stream::{ConnectionStatus, OrderFeed};
use crate::utils::time;

/// Engine facade for one venue
pub struct OrderEngine {
    config: EngineConfig,
    feed: OrderFeed,
    coordinator: MutationCoordinator,
    filters: RwLock<FilterOptions>,
}

impl OrderEngine {
    /// Connect to a venue's order sub-tree and start streaming
    pub fn connect(
        store: Arc<dyn OrderStore>,
        venue: impl Into<String>,
        config: EngineConfig,
    ) -> Self {
        let venue = venue.into();
        tracing::info!(venue = %venue, tz = %config.timezone, "Connecting order engine");
        let feed = OrderFeed::spawn(store.clone(), venue.clone(), config.feed_options());
        let coordinator = MutationCoordinator::new(store, venue);
        Self {
            config,
            feed,
            coordinator,
            filters: RwLock::new(FilterOptions::default()),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    // ========== Read path ==========

    /// Full canonical set of the latest snapshot
    pub fn all_orders(&self) -> Arc<Vec<Order>> {
        self.feed.current()
    }

    /// Visible set: current snapshot through the filter pipeline,
    /// recomputed on every call
    pub fn orders(&self) -> Vec<Order> {
        let options = self.filters.read().clone();
        filters::apply(&self.feed.current(), &options, self.config.timezone)
    }

    /// Watch the canonical set (one atomic replacement per snapshot)
    pub fn orders_rx(&self) -> watch::Receiver<Arc<Vec<Order>>> {
        self.feed.orders()
    }

    /// Watch connection status transitions
    pub fn status_rx(&self) -> watch::Receiver<ConnectionStatus> {
        self.feed.status()
    }

    /// Current connection status
    pub fn connection(&self) -> ConnectionStatus {
        self.feed.connection()
    }

    // ========== Filters ==========

    /// Replace the whole filter selection
    pub fn set_filters(&self, options: FilterOptions) {
        *self.filters.write() = options;
    }

    /// Adjust part of the filter selection in place
    pub fn update_filters(&self, f: impl FnOnce(&mut FilterOptions)) {
        f(&mut self.filters.write());
    }

    /// Current filter selection
    pub fn filters(&self) -> FilterOptions {
        self.filters.read().clone()
    }

    /// Human label for the currently selected period
    pub fn period_label(&self) -> String {
        let options = self.filters.read().clone();
        let anchor: NaiveDate = options
            .selected_date
            .unwrap_or_else(|| time::today(self.config.timezone));
        time::period_label(options.period, anchor)
    }

    // ========== Analytics (recomputed per read) ==========

    /// Aggregate stats over the visible set
    pub fn stats(&self) -> OrderStats {
        analytics::compute_stats(&self.orders(), self.config.timezone)
    }

    /// Full per-menu-item ranking
    pub fn menu_analytics(&self) -> Vec<MenuStat> {
        analytics::menu_rankings(&self.orders())
    }

    /// Display-truncated menu ranking (limit from config)
    pub fn top_menu_items(&self) -> Vec<MenuStat> {
        analytics::top_menu(&self.orders(), self.config.menu_ranking_limit)
    }

    /// Per-category ranking, unbounded
    pub fn category_analytics(&self) -> Vec<CategoryStat> {
        analytics::category_rankings(&self.orders())
    }

    // ========== Write path (single-flight per instance) ==========

    pub async fn set_status(
        &self,
        order_id: &str,
        status: OrderStatus,
        extra: Option<serde_json::Map<String, Value>>,
    ) -> MutationResponse {
        self.coordinator.set_status(order_id, status, extra).await
    }

    pub async fn update_order(
        &self,
        order_id: &str,
        patch: serde_json::Map<String, Value>,
    ) -> MutationResponse {
        self.coordinator.update_order(order_id, patch).await
    }

    pub async fn delete_order(&self, order_id: &str) -> MutationResponse {
        self.coordinator.delete_order(order_id).await
    }

    // ========== Teardown ==========

    /// Stop snapshot delivery and cancel pending retries. An in-flight
    /// mutation may still complete; its result is the caller's to discard.
    pub fn shutdown(&self) {
        self.feed.shutdown();
    }
}
