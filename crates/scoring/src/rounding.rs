//! Decimal rounding of scores.

use rust_decimal::{Decimal, RoundingStrategy};

/// Round `value` to `decimals` places, ties to even.
///
/// Works on the exact decimal expansion of the float, so 2.675 (stored as
/// 2.67499999...) rounds down to 2.67. Values a decimal cannot hold
/// (non-finite or beyond ~7.9e28) are returned unchanged.
pub fn round_half_even(value: f64, decimals: u32) -> f64 {
    if !value.is_finite() {
        return value;
    }
    let Some(exact) = Decimal::from_f64_retain(value) else {
        return value;
    };

    let rounded = exact.round_dp_with_strategy(decimals, RoundingStrategy::MidpointNearestEven);
    // Parsing the decimal text yields the f64 nearest to the rounded value.
    rounded.to_string().parse().unwrap_or(value)
}
