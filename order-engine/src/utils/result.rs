//! Unified Result Types
//!
//! Provides type aliases for commonly used Result types across the engine

use crate::utils::EngineError;

/// Application-level Result type
pub type EngineResult<T> = Result<T, EngineError>;
