//! Liquidity score and signal computation.
//!
//! score  = avg_volume / volume_normalizer + turnover_ratio
//! signal = LIQUID if score >= threshold else ILLIQUID
//!
//! The threshold is applied to the unrounded score. Only the stored value is
//! rounded, so 1.999999 stays ILLIQUID even though it is stored as 2.0.

use crate::coercion::{coerce_float, coerce_int};
use crate::rounding::round_half_even;
use liquidity_core::config::ScoringConfig;
use liquidity_core::{
    fields, DiagnosticSink, EnrichedMessage, LiquidityResult, LiquiditySignal, Result,
    TracingSink, ValidatedMessage,
};
use serde_json::Value;
use std::borrow::Cow;
use std::sync::Arc;

/// Unrounded liquidity score.
///
/// `avg_volume` is converted to `f64` before dividing, so for magnitudes
/// above 2^53 the result can differ in the last bit from exact integer
/// division.
#[inline]
pub fn raw_score(avg_volume: i64, turnover_ratio: f64, volume_normalizer: f64) -> f64 {
    (avg_volume as f64 / volume_normalizer) + turnover_ratio
}

/// Score a validated message and merge the result into a copy of it.
///
/// Absent fields take the configured defaults. A field that is present but
/// not numeric (including `null`) fails with a coercion error.
pub fn compute_liquidity_signal(
    message: &ValidatedMessage,
    config: &ScoringConfig,
    sink: &dyn DiagnosticSink,
) -> Result<EnrichedMessage> {
    let symbol = symbol_label(message.get(fields::SYMBOL), &config.default_symbol);
    let avg_volume = match message.get(fields::AVG_VOLUME) {
        Some(value) => coerce_int(fields::AVG_VOLUME, value)?,
        None => config.default_avg_volume,
    };
    let turnover_ratio = match message.get(fields::TURNOVER_RATIO) {
        Some(value) => coerce_float(fields::TURNOVER_RATIO, value)?,
        None => config.default_turnover_ratio,
    };

    sink.info(format_args!("Computing liquidity signal for {}", symbol));

    let score = raw_score(avg_volume, turnover_ratio, config.volume_normalizer);
    let result = LiquidityResult {
        liquidity_score: round_half_even(score, config.score_decimals),
        liquidity_signal: LiquiditySignal::from_score(score, config.liquid_threshold),
    };

    sink.debug(format_args!("Liquidity result for {}: {}", symbol, result));
    Ok(EnrichedMessage::merge(message, result))
}

/// Symbol as shown in diagnostics. Strings print bare, other values as JSON.
fn symbol_label<'a>(value: Option<&'a Value>, default: &'a str) -> Cow<'a, str> {
    match value {
        Some(Value::String(s)) => Cow::Borrowed(s.as_str()),
        Some(other) => Cow::Owned(other.to_string()),
        None => Cow::Borrowed(default),
    }
}

/// Scoring policy bound to a diagnostic sink.
pub struct LiquidityScorer {
    config: ScoringConfig,
    sink: Arc<dyn DiagnosticSink>,
}

impl LiquidityScorer {
    /// Create a scorer with default policy, reporting through `tracing`.
    pub fn new() -> Self {
        Self::with_config(ScoringConfig::default())
    }

    /// Create a scorer from a custom policy.
    pub fn with_config(config: ScoringConfig) -> Self {
        Self {
            config,
            sink: Arc::new(TracingSink),
        }
    }

    /// Replace the diagnostic sink.
    pub fn with_sink(mut self, sink: Arc<dyn DiagnosticSink>) -> Self {
        self.sink = sink;
        self
    }

    /// Score one validated message.
    pub fn score(&self, message: &ValidatedMessage) -> Result<EnrichedMessage> {
        compute_liquidity_signal(message, &self.config, self.sink.as_ref())
    }

    /// Scoring policy.
    pub fn config(&self) -> &ScoringConfig {
        &self.config
    }
}

impl Default for LiquidityScorer {
    fn default() -> Self {
        Self::new()
    }
}
