//! 引擎配置
//!
//! # 环境变量
//!
//! 所有配置项都可以通过环境变量覆盖：
//!
//! | 环境变量 | 默认值 | 说明 |
//! |----------|--------|------|
//! | ORDER_TZ | Europe/Madrid | 业务时区 |
//! | MAX_RETRY_ATTEMPTS | 3 | 订阅重连次数上限 |
//! | RETRY_DELAY_MS | 2000 | 线性退避基数 (毫秒) |
//! | MENU_RANKING_LIMIT | 10 | 菜品排行显示条数 |
//!
//! # 示例
//!
//! ```ignore
//! ORDER_TZ=Europe/Lisbon RETRY_DELAY_MS=500 cargo run
//! ```

use std::time::Duration;

use chrono_tz::Tz;

use crate::orders::SortSpec;
use crate::stream::FeedOptions;

/// Default business timezone
const DEFAULT_TZ: Tz = chrono_tz::Europe::Madrid;

/// Engine configuration
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// 业务时区 (日期过滤、峰值小时都以此为准)
    pub timezone: Tz,
    /// 订阅重连次数上限
    pub max_retry_attempts: u32,
    /// 线性退避基数 (毫秒); 第 n 次重连等待 n × 该值
    pub retry_delay_ms: u64,
    /// 快照默认排序
    pub sort: SortSpec,
    /// 菜品排行显示截断条数 (完整排行始终可用)
    pub menu_ranking_limit: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            timezone: DEFAULT_TZ,
            max_retry_attempts: 3,
            retry_delay_ms: 2000,
            sort: SortSpec::default(),
            menu_ranking_limit: 10,
        }
    }
}

impl EngineConfig {
    /// 从环境变量加载配置，未设置的项使用默认值
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            timezone: std::env::var("ORDER_TZ")
                .ok()
                .and_then(|tz| tz.parse().ok())
                .unwrap_or(defaults.timezone),
            max_retry_attempts: std::env::var("MAX_RETRY_ATTEMPTS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.max_retry_attempts),
            retry_delay_ms: std::env::var("RETRY_DELAY_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.retry_delay_ms),
            sort: defaults.sort,
            menu_ranking_limit: std::env::var("MENU_RANKING_LIMIT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.menu_ranking_limit),
        }
    }

    /// Feed options derived from this configuration
    pub fn feed_options(&self) -> FeedOptions {
        FeedOptions {
            sort: self.sort,
            max_retry_attempts: self.max_retry_attempts,
            retry_delay: Duration::from_millis(self.retry_delay_ms),
            timezone: self.timezone,
        }
    }
}
