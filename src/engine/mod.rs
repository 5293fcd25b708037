//! Margin engine: pure functions from a product table to derived metrics.
//!
//! Nothing in here holds state or does I/O. Callers pass a snapshot of
//! the product list and get a fresh table back on every call.

pub mod allocation;
pub mod margin;
pub mod summary;

use rust_decimal::prelude::*;

pub use margin::compute;
pub use summary::summarize;

/// Round to 2 decimal places, half-to-even, going through `Decimal` so
/// binary artifacts (2.675 → 2.67) don't leak into the table.
/// Non-finite values are returned unchanged.
pub fn round_money(value: f64) -> f64 {
    Decimal::from_f64(value)
        .map(|d| d.round_dp_with_strategy(2, RoundingStrategy::MidpointNearestEven))
        .and_then(|d| d.to_f64())
        .unwrap_or(value)
}
