//! Message types for the liquidity signal pipeline.

use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value};
use std::fmt;
use std::ops::Deref;

/// A market-data observation: string keys to arbitrary JSON values.
pub type Message = Map<String, Value>;

/// A message that has not been through schema validation.
pub type RawMessage = Message;

/// Well-known message keys.
pub mod fields {
    /// Instrument symbol (diagnostic context only).
    pub const SYMBOL: &str = "symbol";
    /// Average traded volume per period.
    pub const AVG_VOLUME: &str = "avg_volume";
    /// Fraction of float traded over the reference period.
    pub const TURNOVER_RATIO: &str = "turnover_ratio";
    /// Computed liquidity score.
    pub const LIQUIDITY_SCORE: &str = "liquidity_score";
    /// Computed liquidity signal.
    pub const LIQUIDITY_SIGNAL: &str = "liquidity_signal";
}

/// Displays a message as compact JSON.
pub struct MessageDisplay<'a>(pub &'a Message);

impl fmt::Display for MessageDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let json = serde_json::to_string(self.0).map_err(|_| fmt::Error)?;
        f.write_str(&json)
    }
}

/// A message that passed schema validation.
///
/// Wraps the exact value that was validated. The scorer only accepts this
/// type, so unvalidated input cannot reach it by accident.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ValidatedMessage(Message);

impl ValidatedMessage {
    /// Tag a message as validated without running a schema check.
    ///
    /// For hosts that validated the message upstream. Everything else goes
    /// through the validator.
    pub fn assume_valid(message: RawMessage) -> Self {
        ValidatedMessage(message)
    }

    /// Borrow the underlying mapping.
    #[inline]
    pub fn as_message(&self) -> &Message {
        &self.0
    }

    /// Unwrap into the underlying mapping.
    pub fn into_inner(self) -> RawMessage {
        self.0
    }
}

impl Deref for ValidatedMessage {
    type Target = Message;

    fn deref(&self) -> &Message {
        &self.0
    }
}

impl PartialEq<Message> for ValidatedMessage {
    fn eq(&self, other: &Message) -> bool {
        &self.0 == other
    }
}

/// Categorical liquidity classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LiquiditySignal {
    /// Score at or above the threshold.
    Liquid,
    /// Score below the threshold (or not a number).
    Illiquid,
}

impl LiquiditySignal {
    /// Classify a score against a threshold. The boundary is inclusive.
    #[inline]
    pub fn from_score(score: f64, threshold: f64) -> Self {
        if score >= threshold {
            LiquiditySignal::Liquid
        } else {
            LiquiditySignal::Illiquid
        }
    }

    /// Wire representation.
    pub fn as_str(self) -> &'static str {
        match self {
            LiquiditySignal::Liquid => "LIQUID",
            LiquiditySignal::Illiquid => "ILLIQUID",
        }
    }

    /// Is this the liquid classification?
    pub fn is_liquid(self) -> bool {
        self == LiquiditySignal::Liquid
    }
}

impl fmt::Display for LiquiditySignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The two computed fields.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LiquidityResult {
    /// Score rounded to the configured number of decimals.
    pub liquidity_score: f64,
    /// Signal derived from the unrounded score.
    pub liquidity_signal: LiquiditySignal,
}

impl fmt::Display for LiquidityResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{{liquidity_score: {}, liquidity_signal: {}}}",
            self.liquidity_score, self.liquidity_signal
        )
    }
}

/// A validated message merged with its computed liquidity fields.
///
/// Serializes as the flat mapping.
#[derive(Debug, Clone, PartialEq)]
pub struct EnrichedMessage {
    fields: Message,
    result: LiquidityResult,
}

impl EnrichedMessage {
    /// Merge `result` over a copy of `message`. Computed keys overwrite
    /// existing ones.
    pub fn merge(message: &ValidatedMessage, result: LiquidityResult) -> Self {
        let mut merged = message.as_message().clone();
        // Non-finite scores become null, JSON has no representation for them.
        merged.insert(
            fields::LIQUIDITY_SCORE.to_string(),
            Value::from(result.liquidity_score),
        );
        merged.insert(
            fields::LIQUIDITY_SIGNAL.to_string(),
            Value::String(result.liquidity_signal.as_str().to_string()),
        );
        Self {
            fields: merged,
            result,
        }
    }

    /// Rounded liquidity score.
    #[inline]
    pub fn liquidity_score(&self) -> f64 {
        self.result.liquidity_score
    }

    /// Liquidity signal.
    #[inline]
    pub fn liquidity_signal(&self) -> LiquiditySignal {
        self.result.liquidity_signal
    }

    /// Both computed fields.
    pub fn result(&self) -> LiquidityResult {
        self.result
    }

    /// Borrow the merged mapping.
    pub fn as_message(&self) -> &Message {
        &self.fields
    }

    /// Unwrap into the merged mapping.
    pub fn into_inner(self) -> Message {
        self.fields
    }
}

impl Deref for EnrichedMessage {
    type Target = Message;

    fn deref(&self) -> &Message {
        &self.fields
    }
}

impl Serialize for EnrichedMessage {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.fields.serialize(serializer)
    }
}
