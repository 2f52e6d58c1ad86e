//! Stream Subscription Manager
//!
//! Owns the live connection to the external store for one venue:
//!
//! ```text
//! disconnected ──▶ connecting ──▶ connected
//!                      ▲              │ transport error
//!                      │              ▼
//!                      └── backoff ── error   (2000ms × attempt, max 3)
//! ```
//!
//! Every pushed snapshot is normalized, sorted and published through a
//! `watch` channel - one atomic replacement per snapshot, readers never
//! observe a torn set. Teardown cancels the retry timer and the
//! subscription synchronously; no callback fires afterwards.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use chrono_tz::Tz;
use serde::Serialize;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use shared::order::Order;

use crate::orders::{SortSpec, normalize_snapshot, sort_orders};
use crate::store::{OrderStore, StoreSignal};

/// 重连配置
const MAX_RETRY_ATTEMPTS: u32 = 3;
const RETRY_DELAY_MS: u64 = 2000;

/// Connection lifecycle of one feed
#[derive(Debug, Clone, Copy, Default, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connecting,
    Connected,
    Error,
}

/// Connection status surfaced to readers
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionStatus {
    pub state: ConnectionState,
    /// Last transport error, cleared by the next successful snapshot
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Reconnect attempt counter (0 while healthy)
    pub attempt: u32,
    /// Unix millis of the last successful snapshot
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<i64>,
}

/// Feed behavior knobs
#[derive(Debug, Clone)]
pub struct FeedOptions {
    pub sort: SortSpec,
    pub max_retry_attempts: u32,
    pub retry_delay: Duration,
    pub timezone: Tz,
}

impl Default for FeedOptions {
    fn default() -> Self {
        Self {
            sort: SortSpec::default(),
            max_retry_attempts: MAX_RETRY_ATTEMPTS,
            retry_delay: Duration::from_millis(RETRY_DELAY_MS),
            timezone: chrono_tz::Europe::Madrid,
        }
    }
}

/// Live order feed for one venue
///
/// Spawns a background task on construction; dropping the feed (or calling
/// [`OrderFeed::shutdown`]) cancels it, including any pending backoff
/// timer.
#[derive(Debug)]
pub struct OrderFeed {
    orders_rx: watch::Receiver<Arc<Vec<Order>>>,
    status_rx: watch::Receiver<ConnectionStatus>,
    shutdown: CancellationToken,
}

impl OrderFeed {
    /// Connect to a venue's order sub-tree and start publishing
    pub fn spawn(
        store: Arc<dyn OrderStore>,
        venue: impl Into<String>,
        options: FeedOptions,
    ) -> Self {
        let venue = venue.into();
        let (orders_tx, orders_rx) = watch::channel(Arc::new(Vec::new()));
        let (status_tx, status_rx) = watch::channel(ConnectionStatus::default());
        let shutdown = CancellationToken::new();

        let token = shutdown.clone();
        tokio::spawn(async move {
            run_feed(store, venue, options, orders_tx, status_tx, token).await;
        });

        Self {
            orders_rx,
            status_rx,
            shutdown,
        }
    }

    /// Current canonical order set (already normalized and sorted)
    pub fn current(&self) -> Arc<Vec<Order>> {
        self.orders_rx.borrow().clone()
    }

    /// Watch the canonical set; each snapshot is one atomic replacement
    pub fn orders(&self) -> watch::Receiver<Arc<Vec<Order>>> {
        self.orders_rx.clone()
    }

    /// Watch connection status transitions
    pub fn status(&self) -> watch::Receiver<ConnectionStatus> {
        self.status_rx.clone()
    }

    /// Current connection status
    pub fn connection(&self) -> ConnectionStatus {
        self.status_rx.borrow().clone()
    }

    /// Stop snapshot delivery and cancel any pending retry timer
    pub fn shutdown(&self) {
        self.shutdown.cancel();
    }

    pub fn is_shutdown(&self) -> bool {
        self.shutdown.is_cancelled()
    }
}

impl Drop for OrderFeed {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

async fn run_feed(
    store: Arc<dyn OrderStore>,
    venue: String,
    options: FeedOptions,
    orders_tx: watch::Sender<Arc<Vec<Order>>>,
    status_tx: watch::Sender<ConnectionStatus>,
    token: CancellationToken,
) {
    let mut attempt: u32 = 0;

    loop {
        status_tx.send_modify(|s| {
            s.state = ConnectionState::Connecting;
            s.attempt = attempt;
        });

        let subscribed = tokio::select! {
            _ = token.cancelled() => return,
            result = store.subscribe(&venue) => result,
        };

        match subscribed {
            Ok(mut stream) => loop {
                let signal = tokio::select! {
                    _ = token.cancelled() => return,
                    signal = stream.recv() => signal,
                };
                match signal {
                    Some(StoreSignal::Snapshot(raw)) => {
                        let mut orders = normalize_snapshot(Some(&raw), options.timezone);
                        sort_orders(&mut orders, &options.sort);
                        tracing::debug!(venue = %venue, count = orders.len(), "Publishing snapshot");
                        orders_tx.send_replace(Arc::new(orders));
                        attempt = 0;
                        status_tx.send_modify(|s| {
                            s.state = ConnectionState::Connected;
                            s.error = None;
                            s.attempt = 0;
                            s.last_updated = Some(Utc::now().timestamp_millis());
                        });
                    }
                    Some(StoreSignal::Error(error)) => {
                        tracing::warn!(venue = %venue, error = %error, "Subscription transport error");
                        status_tx.send_modify(|s| {
                            s.state = ConnectionState::Error;
                            s.error = Some(error.to_string());
                        });
                        break;
                    }
                    None => {
                        tracing::warn!(venue = %venue, "Subscription stream closed by store");
                        status_tx.send_modify(|s| {
                            s.state = ConnectionState::Error;
                            s.error = Some("subscription closed".to_string());
                        });
                        break;
                    }
                }
            },
            Err(error) => {
                tracing::warn!(venue = %venue, error = %error, "Failed to open subscription");
                status_tx.send_modify(|s| {
                    s.state = ConnectionState::Error;
                    s.error = Some(error.to_string());
                });
            }
        }

        attempt += 1;
        if attempt > options.max_retry_attempts {
            // 超过重试次数：错误状态保持到 shutdown
            tracing::error!(
                venue = %venue,
                attempts = options.max_retry_attempts,
                "Max retry attempts exceeded, feed stays in error state"
            );
            status_tx.send_modify(|s| s.attempt = options.max_retry_attempts);
            return;
        }

        // 线性退避: 2000ms × attempt
        let delay = options.retry_delay * attempt;
        tracing::info!(
            venue = %venue,
            attempt,
            max = options.max_retry_attempts,
            delay_ms = delay.as_millis() as u64,
            "Scheduling reconnect"
        );
        status_tx.send_modify(|s| s.attempt = attempt);

        tokio::select! {
            _ = token.cancelled() => return,
            _ = tokio::time::sleep(delay) => {}
        }
    }
}
