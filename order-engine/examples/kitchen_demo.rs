//! Kitchen Demo - 在内存存储上驱动完整的订单流
//!
//! 这个示例展示引擎的完整读写回路:
//! 1. 订阅 venue 的订单子树 (内存存储模拟实时后端)
//! 2. 快照 → 规范化 → 过滤 → 统计
//! 3. 状态流转写回存储并重新进入读路径
//!
//! 运行: cargo run -p order-engine --example kitchen_demo

use std::sync::Arc;

use anyhow::Result;
use serde_json::json;

use order_engine::stream::ConnectionState;
use order_engine::{EngineConfig, MemoryStore, OrderEngine, OrderStatus, StatusFilter};

#[tokio::main]
async fn main() -> Result<()> {
    order_engine::utils::init_logger();

    println!("=== Kitchen Demo ===\n");

    // === 1. Seed the store with a few legacy-shaped records ===
    println!("1. Seeding the in-memory store...");
    let store = Arc::new(MemoryStore::new());
    store.seed_order(
        "demo-venue",
        "o1",
        json!({
            "status": "received",
            "tableNo": "5",
            "items": [
                { "menuName": "Tea", "menuCategory": "Drinks", "quantity": 2, "price": 2.5 },
                { "menuName": "Paella", "menuCategory": "Mains", "quantity": 1, "price": 14.0 }
            ]
        }),
    );
    store.seed_order(
        "demo-venue",
        "o2",
        json!({
            "status": "completed",
            "table": "7",
            "totalAmount": 21.0,
            "items": [{ "menuName": "Flan", "menuCategory": "Dessert", "quantity": 3, "price": 7.0 }]
        }),
    );

    // === 2. Connect the engine and wait for the first snapshot ===
    println!("2. Connecting the engine...");
    let engine = OrderEngine::connect(store.clone(), "demo-venue", EngineConfig::default());
    let mut status = engine.status_rx();
    while status.borrow().state != ConnectionState::Connected {
        status.changed().await?;
    }
    println!("   Connected. {} orders visible.\n", engine.orders().len());

    // === 3. Stats over the visible set ===
    let stats = engine.stats();
    println!("3. Stats:");
    println!("   total={} received={} completed={}", stats.total, stats.received, stats.completed);
    println!("   revenue={:.2} avg={:.2}", stats.revenue, stats.average_order_value);
    println!("   peak hour: {}\n", stats.peak_hour_label());

    // === 4. Drive o1 through the kitchen ===
    println!("4. Driving o1 through the lifecycle...");
    for status in [OrderStatus::Preparing, OrderStatus::Ready, OrderStatus::Served] {
        let resp = engine.set_status("o1", status, None).await;
        println!("   -> {} (success={})", status, resp.success);
    }

    // Let the resulting snapshots re-enter the read path
    let mut orders_rx = engine.orders_rx();
    loop {
        {
            let orders = orders_rx.borrow();
            if orders.iter().any(|o| o.id == "o1" && o.normalized_status == "served") {
                break;
            }
        }
        orders_rx.changed().await?;
    }

    // === 5. Filtered view + rankings ===
    engine.update_filters(|f| f.status = StatusFilter::Only(OrderStatus::Served));
    println!("\n5. Served orders: {}", engine.orders().len());

    engine.update_filters(|f| f.status = StatusFilter::All);
    println!("   Top menu items:");
    for stat in engine.top_menu_items() {
        println!("   {:>3}x {:<10} {:>6.2} ({:.0}%)", stat.quantity, stat.name, stat.revenue, stat.share);
    }

    engine.shutdown();
    println!("\nDone.");
    Ok(())
}
