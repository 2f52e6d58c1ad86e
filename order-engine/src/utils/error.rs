//! 统一错误处理
//!
//! 引擎内部的应用级错误。变更操作不会把这些错误抛给调用方 -
//! MutationCoordinator 在边界处统一转换为 `MutationResponse` 数据。

use crate::store::StoreError;

/// Application-level engine error
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// 目标订单不存在 (读写之间消失)
    #[error("Order not found: {0}")]
    NotFound(String),

    /// 调用方输入非法 (空 ID、坏补丁)
    #[error("Validation failed: {0}")]
    Validation(String),

    /// 外部存储传输错误
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// 内部错误
    #[error("Internal error: {0}")]
    Internal(String),
}

// ========== Helper Constructors ==========

impl EngineError {
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }
}
