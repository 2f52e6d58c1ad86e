//! Engine utilities
//!
//! - [`error`] / [`result`]: application-level error type and alias
//! - [`time`]: business-timezone date helpers
//! - [`logger`]: tracing setup
//! - [`debounce`]: caller-side debounce helper for the search contract

pub mod debounce;
pub mod error;
pub mod logger;
pub mod result;
pub mod time;

pub use debounce::Debouncer;
pub use error::EngineError;
pub use logger::{init_logger, init_logger_with_file};
pub use result::EngineResult;
