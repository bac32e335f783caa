//! Batch results and statistics.

use liquidity_core::{EnrichedMessage, Error, ErrorKind, LiquiditySignal};
use serde::Serialize;

/// Counts gathered over one batch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BatchStats {
    /// Messages seen.
    pub total: u64,
    /// Messages that were scored.
    pub enriched: u64,
    /// Scored messages classified LIQUID.
    pub liquid: u64,
    /// Scored messages classified ILLIQUID.
    pub illiquid: u64,
    /// Messages the schema rejected.
    pub validation_failures: u64,
    /// Messages with a non-numeric volume or ratio.
    pub coercion_failures: u64,
}

impl BatchStats {
    /// Count a scored message.
    pub fn record_enriched(&mut self, signal: LiquiditySignal) {
        self.total += 1;
        self.enriched += 1;
        match signal {
            LiquiditySignal::Liquid => self.liquid += 1,
            LiquiditySignal::Illiquid => self.illiquid += 1,
        }
    }

    /// Count a failed message.
    pub fn record_failure(&mut self, kind: ErrorKind) {
        self.total += 1;
        match kind {
            ErrorKind::Validation => self.validation_failures += 1,
            ErrorKind::Coercion => self.coercion_failures += 1,
            _ => {}
        }
    }

    /// Messages that did not produce output.
    pub fn rejected(&self) -> u64 {
        self.total - self.enriched
    }

    /// Fraction of scored messages that are LIQUID.
    pub fn liquid_frac(&self) -> f64 {
        if self.enriched > 0 {
            self.liquid as f64 / self.enriched as f64
        } else {
            0.0
        }
    }
}

/// A message that failed, with its position in the batch.
#[derive(Debug)]
pub struct Rejection {
    pub index: usize,
    pub error: Error,
}

/// Everything a batch produced.
#[derive(Debug, Default)]
pub struct BatchOutcome {
    /// Scored messages, in input order.
    pub enriched: Vec<EnrichedMessage>,
    /// Failed messages, in input order.
    pub rejected: Vec<Rejection>,
    /// Summary counts.
    pub stats: BatchStats,
}

impl BatchOutcome {
    /// True if every message was scored.
    pub fn is_clean(&self) -> bool {
        self.rejected.is_empty()
    }
}
