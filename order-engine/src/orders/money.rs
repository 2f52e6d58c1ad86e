//! Money calculation utilities using rust_decimal for precision
//!
//! All monetary arithmetic (line totals, order totals, revenue) is done
//! using `Decimal` internally, then converted to `f64` for the
//! JavaScript-shaped records the store holds.

use rust_decimal::prelude::*;

use shared::order::OrderItem;

use crate::utils::{EngineError, EngineResult};

/// Rounding strategy for monetary values (2 decimal places, half-up)
const DECIMAL_PLACES: u32 = 2;

/// Tolerance for monetary comparisons (0.01)
pub const MONEY_TOLERANCE: Decimal = Decimal::from_parts(1, 0, 0, false, 2);

/// Maximum allowed price per item
const MAX_PRICE: f64 = 1_000_000.0;
/// Maximum allowed quantity per item
const MAX_QUANTITY: i32 = 9999;

/// Convert f64 to Decimal for calculation
#[inline]
pub fn to_decimal(value: f64) -> Decimal {
    Decimal::from_f64(value).unwrap_or_default()
}

/// Convert Decimal back to f64 for storage, rounded to 2 decimal places
#[inline]
pub fn to_f64(value: Decimal) -> f64 {
    value
        .round_dp_with_strategy(DECIMAL_PLACES, RoundingStrategy::MidpointAwayFromZero)
        .to_f64()
        .unwrap_or_default()
}

/// Line total: unit_price * quantity
pub fn line_total(unit_price: f64, quantity: i32) -> f64 {
    to_f64(to_decimal(unit_price) * Decimal::from(quantity))
}

/// Sum line totals across items with precise arithmetic
pub fn sum_line_totals(items: &[OrderItem]) -> f64 {
    let total: Decimal = items.iter().map(|i| to_decimal(i.line_total)).sum();
    to_f64(total)
}

/// Compare two monetary values for equality (within 0.01 tolerance)
pub fn money_eq(a: f64, b: f64) -> bool {
    let diff = (to_decimal(a) - to_decimal(b)).abs();
    diff < MONEY_TOLERANCE
}

/// Validate one canonical item before it is written back to the store
pub fn validate_item(item: &OrderItem) -> EngineResult<()> {
    if item.menu_name.trim().is_empty() {
        return Err(EngineError::validation("item menuName must not be empty"));
    }
    if !item.unit_price.is_finite() {
        return Err(EngineError::validation(format!(
            "unitPrice must be a finite number, got {}",
            item.unit_price
        )));
    }
    if item.unit_price < 0.0 {
        return Err(EngineError::validation(format!(
            "unitPrice must be non-negative, got {}",
            item.unit_price
        )));
    }
    if item.unit_price > MAX_PRICE {
        return Err(EngineError::validation(format!(
            "unitPrice exceeds maximum allowed ({}), got {}",
            MAX_PRICE, item.unit_price
        )));
    }
    if item.quantity < 1 {
        return Err(EngineError::validation(format!(
            "quantity must be at least 1, got {}",
            item.quantity
        )));
    }
    if item.quantity > MAX_QUANTITY {
        return Err(EngineError::validation(format!(
            "quantity exceeds maximum allowed ({}), got {}",
            MAX_QUANTITY, item.quantity
        )));
    }
    Ok(())
}
