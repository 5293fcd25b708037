//! Per-product profit, margin, ideal price and break-even.
//!
//! Formulas (all amounts per unit):
//!
//!   fee_amount     = price × fee% / 100
//!   net_profit     = price − cost − fee_amount − other_costs
//!   margin%        = net_profit / price × 100            (0 when price = 0)
//!   ideal_price    = (cost + other_costs) / (1 − fee% − target%)
//!   breakeven      = fixed_costs / net_profit            (net_profit > 0)
//!
//! The ideal price is the price at which fee and target margin, both taken
//! as a share of price, are covered together. When fee + target reach 100%
//! no finite price satisfies that and the value is `None`.

use tracing::debug;

use super::allocation::allocate_fixed_costs;
use super::round_money;
use crate::types::{FixedCostMetrics, PricingParams, Product, ProductMetrics};

/// Compute the derived table for `products`, one row per product, in order.
///
/// Never fails: non-finite inputs are treated as 0 and every undefined
/// ratio comes back as `None`. The input slice is not modified.
pub fn compute(products: &[Product], params: &PricingParams) -> Vec<ProductMetrics> {
    let products: Vec<Product> = products.iter().map(Product::normalized).collect();

    let allocations = if params.include_fixed_costs {
        let prices: Vec<f64> = products.iter().map(|p| p.price).collect();
        Some(allocate_fixed_costs(&prices, params.fixed_costs))
    } else {
        None
    };

    let rows: Vec<ProductMetrics> = products
        .iter()
        .enumerate()
        .map(|(i, product)| {
            let allocated = allocations.as_ref().map(|a| a[i]);
            metrics_for(product, params, allocated).rounded()
        })
        .collect();

    debug!(
        products = rows.len(),
        target_margin = params.target_margin_percent,
        fixed_costs = params.fixed_costs,
        include_fixed_costs = params.include_fixed_costs,
        "Margins computed"
    );

    rows
}

fn metrics_for(product: &Product, params: &PricingParams, allocated: Option<f64>) -> ProductMetrics {
    let price = product.price;
    let base_cost = product.cost + product.other_costs;

    let fee_amount = price * product.fee_percent / 100.0;
    let net_profit = price - product.cost - fee_amount - product.other_costs;
    let current_margin_percent = percent_of(net_profit, price).unwrap_or(0.0);

    // Share of the price left once fee and target margin are taken out.
    let price_share = 1.0 - (product.fee_percent / 100.0 + params.target_margin_percent / 100.0);

    let ideal_price = solve_price(base_cost, price_share);
    let ideal_price_diff_percent = ideal_price.and_then(|ideal| percent_of(ideal - price, price));

    let breakeven_units = if net_profit > 0.0 {
        Some(params.fixed_costs / net_profit)
    } else {
        None
    };

    let fixed = allocated.map(|allocated_fixed| {
        let net_profit_with_fixed = net_profit - allocated_fixed;
        let ideal_price_with_fixed = solve_price(base_cost + allocated_fixed, price_share);
        FixedCostMetrics {
            allocated_fixed,
            net_profit_with_fixed,
            net_margin_percent: percent_of(net_profit_with_fixed, price).unwrap_or(0.0),
            ideal_price_with_fixed,
            ideal_price_with_fixed_diff_percent: ideal_price_with_fixed
                .and_then(|ideal| percent_of(ideal - price, price)),
        }
    });

    ProductMetrics {
        name: product.name.clone(),
        cost: product.cost,
        price,
        fee_percent: product.fee_percent,
        other_costs: product.other_costs,
        fee_amount,
        net_profit,
        current_margin_percent,
        ideal_price,
        ideal_price_diff_percent,
        breakeven_units,
        fixed,
    }
}

/// `amount / share`, or `None` when the share is not positive.
fn solve_price(amount: f64, price_share: f64) -> Option<f64> {
    if price_share > 0.0 {
        Some(amount / price_share)
    } else {
        None
    }
}

/// `value / base × 100`, or `None` on a zero base.
fn percent_of(value: f64, base: f64) -> Option<f64> {
    if base == 0.0 {
        None
    } else {
        Some(value / base * 100.0)
    }
}

impl ProductMetrics {
    fn rounded(self) -> Self {
        Self {
            cost: round_money(self.cost),
            price: round_money(self.price),
            fee_percent: round_money(self.fee_percent),
            other_costs: round_money(self.other_costs),
            fee_amount: round_money(self.fee_amount),
            net_profit: round_money(self.net_profit),
            current_margin_percent: round_money(self.current_margin_percent),
            ideal_price: self.ideal_price.map(round_money),
            ideal_price_diff_percent: self.ideal_price_diff_percent.map(round_money),
            breakeven_units: self.breakeven_units.map(round_money),
            fixed: self.fixed.map(FixedCostMetrics::rounded),
            ..self
        }
    }
}

impl FixedCostMetrics {
    fn rounded(self) -> Self {
        Self {
            allocated_fixed: round_money(self.allocated_fixed),
            net_profit_with_fixed: round_money(self.net_profit_with_fixed),
            net_margin_percent: round_money(self.net_margin_percent),
            ideal_price_with_fixed: self.ideal_price_with_fixed.map(round_money),
            ideal_price_with_fixed_diff_percent: self
                .ideal_price_with_fixed_diff_percent
                .map(round_money),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
