//! End-to-end engine tests against the in-memory store
//!
//! Drives the full read/write loop: seeded snapshots flow through the
//! feed into filters and analytics, mutations flow back into the store
//! and re-enter the read path as fresh snapshots.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{Value, json};

use order_engine::store::{SnapshotStream, StoreResult};
use order_engine::stream::ConnectionState;
use order_engine::{
    EngineConfig, MemoryStore, MutationCoordinator, OrderEngine, OrderStatus, OrderStore,
    PatchSet, StatusFilter, TimePeriod,
};

async fn connected(store: Arc<dyn OrderStore>, venue: &str) -> OrderEngine {
    let engine = OrderEngine::connect(store, venue, EngineConfig::default());
    let mut status = engine.status_rx();
    loop {
        if status.borrow().state == ConnectionState::Connected {
            break;
        }
        status.changed().await.expect("feed died before connecting");
    }
    engine
}

async fn wait_for<F: Fn(&OrderEngine) -> bool>(engine: &OrderEngine, predicate: F) {
    let mut orders_rx = engine.orders_rx();
    loop {
        if predicate(engine) {
            return;
        }
        orders_rx.changed().await.expect("feed died while waiting");
    }
}

fn seeded_store() -> Arc<MemoryStore> {
    let store = Arc::new(MemoryStore::new());
    store.seed_order(
        "venue-1",
        "o1",
        json!({
            "status": "received",
            "tableNo": "5",
            "orderTimestamp": "2024-05-01T10:00:00Z",
            "items": [{ "menuName": "Tea", "menuCategory": "Drinks", "quantity": 2, "price": 10 }]
        }),
    );
    store.seed_order(
        "venue-1",
        "o2",
        json!({
            "status": "completed",
            "table": "7",
            "orderTimestamp": "2024-05-01T12:00:00Z",
            "totalAmount": 42.0,
            "items": [{ "menuName": "Paella", "menuCategory": "Mains", "quantity": 1, "price": 42 }]
        }),
    );
    store
}

#[tokio::test(start_paused = true)]
async fn snapshots_flow_through_normalizer_into_views() {
    let engine = connected(seeded_store(), "venue-1").await;

    let orders = engine.orders();
    assert_eq!(orders.len(), 2);
    // default sort: newest first
    assert_eq!(orders[0].id, "o2");
    // legacy tableNo resolved, line totals filled
    let o1 = orders.iter().find(|o| o.id == "o1").unwrap();
    assert_eq!(o1.table, "5");
    assert_eq!(o1.items[0].line_total, 20.0);
    assert_eq!(o1.total_amount, 20.0);

    engine.shutdown();
}

#[tokio::test(start_paused = true)]
async fn stats_conserve_counts_and_count_terminal_revenue() {
    let engine = connected(seeded_store(), "venue-1").await;

    let stats = engine.stats();
    assert_eq!(stats.total, 2);
    assert_eq!(
        stats.received + stats.preparing + stats.ready + stats.completed + stats.served
            + stats.rejected,
        stats.total
    );
    // only the completed order counts toward revenue
    assert_eq!(stats.revenue, 42.0);
    assert_eq!(stats.average_order_value, 42.0);
    assert_eq!(stats.active_tables, 2);

    engine.shutdown();
}

#[tokio::test(start_paused = true)]
async fn daily_filter_excludes_other_dates() {
    let store = seeded_store();
    store.seed_order(
        "venue-1",
        "o3",
        json!({ "status": "received", "orderTimestamp": "2024-05-02T09:00:00Z" }),
    );
    let engine = connected(store, "venue-1").await;
    wait_for(&engine, |e| e.all_orders().len() == 3).await;

    engine.update_filters(|f| {
        f.period = TimePeriod::Daily;
        f.selected_date = chrono::NaiveDate::from_ymd_opt(2024, 5, 1);
    });

    let visible = engine.orders();
    assert_eq!(visible.len(), 2);
    assert!(visible.iter().all(|o| o.id != "o3"));

    engine.shutdown();
}

#[tokio::test(start_paused = true)]
async fn search_and_status_filters_compose() {
    let engine = connected(seeded_store(), "venue-1").await;

    engine.update_filters(|f| {
        f.status = StatusFilter::Only(OrderStatus::Completed);
        f.search = "paella".to_string();
    });
    assert_eq!(engine.orders().len(), 1);

    engine.update_filters(|f| f.search = "tea".to_string());
    // o1 matches the search but is not completed
    assert!(engine.orders().is_empty());

    engine.shutdown();
}

#[tokio::test(start_paused = true)]
async fn menu_analytics_rank_by_quantity() {
    let engine = connected(seeded_store(), "venue-1").await;

    let rankings = engine.menu_analytics();
    assert_eq!(rankings[0].name, "Tea");
    assert_eq!(rankings[0].quantity, 2);
    assert_eq!(rankings[1].name, "Paella");

    let categories = engine.category_analytics();
    assert_eq!(categories[0].name, "Drinks");

    engine.shutdown();
}

#[tokio::test(start_paused = true)]
async fn status_mutation_re_enters_the_read_path() {
    let engine = connected(seeded_store(), "venue-1").await;

    let resp = engine.set_status("o1", OrderStatus::Preparing, None).await;
    assert!(resp.success);

    wait_for(&engine, |e| {
        e.all_orders()
            .iter()
            .any(|o| o.id == "o1" && o.normalized_status == "preparing")
    })
    .await;

    let orders = engine.all_orders();
    let o1 = orders.iter().find(|o| o.id == "o1").unwrap();
    assert!(o1.has_lifecycle_stamp("preparingAt"));

    engine.shutdown();
}

#[tokio::test(start_paused = true)]
async fn lifecycle_stamps_are_monotonic_through_the_engine() {
    let store = seeded_store();
    let engine = connected(store.clone(), "venue-1").await;

    assert!(engine.set_status("o1", OrderStatus::Completed, None).await.success);
    let first_stamp = store.fetch("venue-1", "o1").await.unwrap().unwrap()
        ["lifecycleTimestamps"]["completedAt"]
        .clone();

    assert!(engine.set_status("o1", OrderStatus::Received, None).await.success);
    assert!(engine.set_status("o1", OrderStatus::Completed, None).await.success);

    let second_stamp = store.fetch("venue-1", "o1").await.unwrap().unwrap()
        ["lifecycleTimestamps"]["completedAt"]
        .clone();
    assert_eq!(first_stamp, second_stamp);

    engine.shutdown();
}

#[tokio::test(start_paused = true)]
async fn delete_shrinks_the_visible_set() {
    let engine = connected(seeded_store(), "venue-1").await;

    assert!(engine.delete_order("o1").await.success);
    wait_for(&engine, |e| e.all_orders().len() == 1).await;
    assert_eq!(engine.all_orders()[0].id, "o2");

    // second delete: the order is gone
    let resp = engine.delete_order("o1").await;
    assert_eq!(
        resp.code(),
        Some(order_engine::MutationErrorCode::NotFound)
    );

    engine.shutdown();
}

// ============================================================================
// Single-flight guarantee (slow store forces overlap)
// ============================================================================

struct SlowStore {
    inner: Arc<MemoryStore>,
    delay: Duration,
}

#[async_trait]
impl OrderStore for SlowStore {
    async fn subscribe(&self, venue: &str) -> StoreResult<SnapshotStream> {
        self.inner.subscribe(venue).await
    }

    async fn fetch(&self, venue: &str, order_id: &str) -> StoreResult<Option<Value>> {
        tokio::time::sleep(self.delay).await;
        self.inner.fetch(venue, order_id).await
    }

    async fn write_paths(&self, venue: &str, order_id: &str, patch: PatchSet) -> StoreResult<()> {
        tokio::time::sleep(self.delay).await;
        self.inner.write_paths(venue, order_id, patch).await
    }

    async fn delete_tree(&self, venue: &str, order_id: &str) -> StoreResult<()> {
        self.inner.delete_tree(venue, order_id).await
    }
}

#[tokio::test(start_paused = true)]
async fn concurrent_mutations_one_succeeds_one_busy() {
    let inner = Arc::new(MemoryStore::new());
    inner.seed_order("venue-1", "o1", json!({ "status": "ready" }));
    let store = Arc::new(SlowStore {
        inner: inner.clone(),
        delay: Duration::from_millis(100),
    });

    let coordinator = MutationCoordinator::new(store, "venue-1");

    // A second set_status while the first is in flight returns Busy
    // instead of queueing
    let first = coordinator.set_status("o1", OrderStatus::Rejected, None);
    let second = coordinator.set_status("o1", OrderStatus::Completed, None);
    let (a, b) = tokio::join!(first, second);

    assert!(a.success);
    assert!(b.is_busy());

    // strictly sequential calls both succeed
    let c = coordinator.set_status("o1", OrderStatus::Completed, None).await;
    assert!(c.success);

    let record = inner.fetch("venue-1", "o1").await.unwrap().unwrap();
    assert_eq!(record["status"], "completed");
    // the rejected stamp from the first mutation survived
    assert!(record["lifecycleTimestamps"]["rejectedAt"].is_string());
}

#[tokio::test(start_paused = true)]
async fn mixed_concurrent_mutations_single_flight() {
    let inner = Arc::new(MemoryStore::new());
    inner.seed_order("venue-1", "o1", json!({ "status": "ready" }));
    let store = Arc::new(SlowStore {
        inner,
        delay: Duration::from_millis(100),
    });

    let coordinator = MutationCoordinator::new(store, "venue-1");

    let patch = json!({ "table": "2" }).as_object().cloned().unwrap();
    let status = coordinator.set_status("o1", OrderStatus::Served, None);
    let update = coordinator.update_order("o1", patch);
    let (a, b) = tokio::join!(status, update);

    assert!(a.success);
    assert!(b.is_busy());
}
