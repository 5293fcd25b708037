//! Portfolio summary over a derived table.

use rust_decimal::prelude::*;

use super::round_money;
use crate::types::{PortfolioSummary, ProductMetrics};

/// Aggregate the derived rows: count, average margin, loss-makers and
/// total profit. Totals are summed in `Decimal` so a long table of
/// 2-decimal amounts adds up exactly.
pub fn summarize(rows: &[ProductMetrics]) -> PortfolioSummary {
    let product_count = rows.len();

    let average_margin_percent = if product_count > 0 {
        let total_margin = sum_exact(rows.iter().map(|r| r.current_margin_percent));
        round_money(total_margin / product_count as f64)
    } else {
        0.0
    };

    let negative_profit_count = rows.iter().filter(|r| r.net_profit < 0.0).count();
    let total_net_profit = round_money(sum_exact(rows.iter().map(|r| r.net_profit)));

    let with_fixed: Vec<f64> = rows
        .iter()
        .filter_map(|r| r.fixed.map(|f| f.net_profit_with_fixed))
        .collect();
    let total_net_profit_with_fixed = if with_fixed.is_empty() {
        None
    } else {
        Some(round_money(sum_exact(with_fixed.into_iter())))
    };

    PortfolioSummary {
        product_count,
        average_margin_percent,
        negative_profit_count,
        total_net_profit,
        total_net_profit_with_fixed,
    }
}

/// Sum in `Decimal`, falling back to a plain `f64` sum when a value or
/// the running total leaves the `Decimal` range.
fn sum_exact(values: impl Iterator<Item = f64>) -> f64 {
    let values: Vec<f64> = values.collect();
    values
        .iter()
        .try_fold(Decimal::ZERO, |acc, v| acc.checked_add(Decimal::from_f64(*v)?))
        .and_then(|total| total.to_f64())
        .unwrap_or_else(|| values.iter().sum())
}
