//! Validate-then-score pipeline.
//!
//! Holds configuration only. Every call is independent, so a processor can be
//! shared across worker threads as-is.

use crate::batch::{BatchOutcome, BatchStats, Rejection};
use liquidity_core::config::ScoringConfig;
use liquidity_core::{
    Config, DiagnosticSink, EnrichedMessage, Error, RawMessage, Result, TracingSink,
};
use liquidity_scoring::LiquidityScorer;
use liquidity_validation::{MarketDataSchema, MessageValidator, SchemaPredicate};
use serde_json::Value;
use std::sync::Arc;

/// Validator and scorer run in sequence.
pub struct LiquidityProcessor<P> {
    validator: MessageValidator<P>,
    scorer: LiquidityScorer,
    sink: Arc<dyn DiagnosticSink>,
}

impl LiquidityProcessor<MarketDataSchema> {
    /// Build the default schema and scorer from configuration.
    pub fn from_config(config: &Config) -> Self {
        Self::from_config_with_sink(config, Arc::new(TracingSink))
    }

    /// Same as [`from_config`](Self::from_config) with an explicit sink.
    pub fn from_config_with_sink(config: &Config, sink: Arc<dyn DiagnosticSink>) -> Self {
        Self::with_sink(
            MarketDataSchema::from_config(&config.schema),
            config.scoring.clone(),
            sink,
        )
    }
}

impl<P: SchemaPredicate> LiquidityProcessor<P> {
    /// Create a processor that reports through `tracing`.
    pub fn new(schema: P, scoring: ScoringConfig) -> Self {
        Self::with_sink(schema, scoring, Arc::new(TracingSink))
    }

    /// Create a processor with an explicit sink shared by both stages.
    pub fn with_sink(schema: P, scoring: ScoringConfig, sink: Arc<dyn DiagnosticSink>) -> Self {
        Self {
            validator: MessageValidator::with_sink(schema, sink.clone()),
            scorer: LiquidityScorer::with_config(scoring).with_sink(sink.clone()),
            sink,
        }
    }

    /// Validate and score one message.
    pub fn process(&self, message: RawMessage) -> Result<EnrichedMessage> {
        let validated = self.validator.validate(message)?;
        self.scorer.score(&validated)
    }

    /// Parse one JSON object and process it.
    pub fn process_json(&self, json: &str) -> Result<EnrichedMessage> {
        match serde_json::from_str::<Value>(json)? {
            Value::Object(message) => self.process(message),
            other => Err(Error::data(format!(
                "expected a JSON object, got {}",
                json_kind(&other)
            ))),
        }
    }

    /// Process every message. Failures are collected, not propagated.
    pub fn process_batch<I>(&self, messages: I) -> BatchOutcome
    where
        I: IntoIterator<Item = RawMessage>,
    {
        let mut enriched = Vec::new();
        let mut rejected = Vec::new();
        let mut stats = BatchStats::default();

        for (index, message) in messages.into_iter().enumerate() {
            match self.process(message) {
                Ok(output) => {
                    stats.record_enriched(output.liquidity_signal());
                    enriched.push(output);
                }
                Err(error) => {
                    self.sink
                        .warn(format_args!("Rejected message {}: {}", index, error));
                    stats.record_failure(error.kind());
                    rejected.push(Rejection { index, error });
                }
            }
        }

        self.sink.info(format_args!(
            "Processed batch: {}/{} enriched, {} liquid",
            stats.enriched, stats.total, stats.liquid
        ));

        BatchOutcome {
            enriched,
            rejected,
            stats,
        }
    }

    /// The validator stage.
    pub fn validator(&self) -> &MessageValidator<P> {
        &self.validator
    }

    /// The scorer stage.
    pub fn scorer(&self) -> &LiquidityScorer {
        &self.scorer
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use liquidity_core::{DiagnosticLevel, ErrorKind, LiquiditySignal, MemorySink, Message};
    use liquidity_validation::AcceptAll;
    use serde_json::json;

    fn message(value: Value) -> Message {
        match value {
            Value::Object(map) => map,
            _ => panic!("test message must be an object"),
        }
    }

    fn processor() -> (LiquidityProcessor<MarketDataSchema>, Arc<MemorySink>) {
        let sink = Arc::new(MemorySink::new());
        let mut config = Config::default();
        config.schema.required_fields = vec!["symbol".to_string()];
        (LiquidityProcessor::from_config_with_sink(&config, sink.clone()), sink)
    }

    #[test]
    fn test_process_end_to_end() {
        let (processor, sink) = processor();
        let enriched = processor
            .process(message(json!({
                "symbol": "AAPL",
                "avg_volume": 1_200_000,
                "turnover_ratio": 0.8
            })))
            .unwrap();

        assert_eq!(enriched.liquidity_signal(), LiquiditySignal::Liquid);
        assert_eq!(enriched.liquidity_score(), 2.0);
        assert_eq!(sink.count(DiagnosticLevel::Debug), 2);
        assert_eq!(sink.count(DiagnosticLevel::Info), 1);
    }

    #[test]
    fn test_invalid_message_never_scored() {
        let (processor, sink) = processor();
        let err = processor.process(message(json!({"avg_volume": 5}))).unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Validation);
        assert_eq!(sink.count(DiagnosticLevel::Error), 1);
        assert_eq!(sink.count(DiagnosticLevel::Info), 0);
    }

    #[test]
    fn test_coercion_error_surfaces() {
        let processor = LiquidityProcessor::with_sink(
            AcceptAll,
            ScoringConfig::default(),
            Arc::new(MemorySink::new()),
        );
        let err = processor
            .process(message(json!({"avg_volume": "not_a_number"})))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Coercion);
    }

    #[test]
    fn test_process_json() {
        let (processor, _) = processor();
        let enriched = processor
            .process_json(r#"{"symbol": "ABC", "turnover_ratio": "1.5"}"#)
            .unwrap();
        assert_eq!(enriched.liquidity_score(), 2.5);
        assert_eq!(
            serde_json::to_value(&enriched).unwrap(),
            json!({
                "symbol": "ABC",
                "turnover_ratio": "1.5",
                "liquidity_score": 2.5,
                "liquidity_signal": "LIQUID"
            })
        );
    }

    #[test]
    fn test_process_json_rejects_non_objects() {
        let (processor, _) = processor();
        assert_eq!(processor.process_json("[1, 2]").unwrap_err().kind(), ErrorKind::Data);
        assert_eq!(processor.process_json("{oops").unwrap_err().kind(), ErrorKind::Json);
    }

    #[test]
    fn test_batch_collects_failures() {
        let (processor, sink) = processor();
        let outcome = processor.process_batch(vec![
            message(json!({"symbol": "A", "avg_volume": 2_000_000})),
            message(json!({"avg_volume": 1})),
            message(json!({"symbol": "B"})),
            message(json!({"symbol": "C", "turnover_ratio": "high"})),
        ]);

        assert_eq!(outcome.enriched.len(), 2);
        assert_eq!(outcome.rejected.len(), 2);
        assert_eq!(outcome.rejected[0].index, 1);
        assert_eq!(outcome.rejected[0].error.kind(), ErrorKind::Validation);
        assert_eq!(outcome.rejected[1].index, 3);
        assert_eq!(outcome.rejected[1].error.kind(), ErrorKind::Coercion);
        assert!(!outcome.is_clean());

        let stats = &outcome.stats;
        assert_eq!(stats.total, 4);
        assert_eq!(stats.liquid, 1);
        assert_eq!(stats.illiquid, 1);
        assert_eq!(stats.validation_failures, 1);
        assert_eq!(stats.coercion_failures, 1);
        assert_eq!(sink.count(DiagnosticLevel::Warn), 2);
        assert!(sink.contains(DiagnosticLevel::Info, "2/4 enriched"));
    }

    #[test]
    fn test_processor_is_shareable_across_threads() {
        let (processor, _) = processor();
        let processor = Arc::new(processor);

        let handles: Vec<_> = (0..4)
            .map(|i| {
                let processor = Arc::clone(&processor);
                std::thread::spawn(move || {
                    let symbol = format!("SYM{}", i);
                    processor
                        .process(message(json!({"symbol": symbol, "avg_volume": i * 1_000_000})))
                        .map(|e| e.liquidity_signal())
                })
            })
            .collect();

        let signals: Vec<_> = handles
            .into_iter()
            .map(|h| h.join().unwrap().unwrap())
            .collect();
        assert_eq!(
            signals,
            vec![
                LiquiditySignal::Illiquid,
                LiquiditySignal::Illiquid,
                LiquiditySignal::Liquid,
                LiquiditySignal::Liquid,
            ]
        );
    }
}
