//! Liquidity scoring for the liquidity signal pipeline.
//!
//! This crate handles:
//! - Numeric field coercion (integer and float)
//! - Decimal rounding of the stored score
//! - Score computation and signal classification

pub mod coercion;
pub mod rounding;
pub mod scorer;

pub use coercion::{coerce_float, coerce_int};
pub use rounding::round_half_even;
pub use scorer::{compute_liquidity_signal, raw_score, LiquidityScorer};
