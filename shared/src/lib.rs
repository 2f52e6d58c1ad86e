//! Shared data model for the order stream engine
//!
//! This crate holds the canonical order representation that every layer of
//! the engine (and its UI collaborators) agrees on:
//!
//! - **order**: canonical `Order` / `OrderItem`, the `OrderStatus`
//!   lifecycle enum, and the uniform mutation result types
//!
//! The canonical model is produced exclusively by the engine's normalizer;
//! collaborators only ever read it or hand it back to mutation entry
//! points.

pub mod order;

// Re-export the common surface at crate root
pub use order::{
    CustomerInfo, MutationError, MutationErrorCode, MutationResponse, Order, OrderItem,
    OrderStatus,
};
