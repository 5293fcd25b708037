//! Fixed-cost allocation by revenue share.

/// Split `fixed_costs` across products proportionally to price.
///
/// When the prices add up to zero there is no revenue share to go by, so
/// every product gets an even slice (divisor floored at 1 for an empty
/// table). Returns one amount per product, in input order, unrounded.
pub fn allocate_fixed_costs(prices: &[f64], fixed_costs: f64) -> Vec<f64> {
    let total_price: f64 = prices.iter().sum();

    if total_price == 0.0 {
        let share = fixed_costs / prices.len().max(1) as f64;
        return vec![share; prices.len()];
    }

    prices
        .iter()
        .map(|price| price / total_price * fixed_costs)
        .collect()
}
