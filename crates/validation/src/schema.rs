//! Schema predicates.
//!
//! The pipeline only needs a yes/no answer about a message's shape. Hosts
//! inject their own predicate; [`MarketDataSchema`] covers the common case.

use liquidity_core::config::SchemaConfig;
use liquidity_core::{fields, Message};
use serde_json::Value;
use std::fmt;

/// Decides whether a message has the expected shape.
pub trait SchemaPredicate: Send + Sync {
    /// Return true if `message` matches the schema.
    fn validate_message_schema(&self, message: &Message) -> bool;
}

impl<F> SchemaPredicate for F
where
    F: Fn(&Message) -> bool + Send + Sync,
{
    fn validate_message_schema(&self, message: &Message) -> bool {
        self(message)
    }
}

/// Admits every message.
#[derive(Debug, Clone, Copy, Default)]
pub struct AcceptAll;

impl SchemaPredicate for AcceptAll {
    fn validate_message_schema(&self, _message: &Message) -> bool {
        true
    }
}

/// Why a message failed [`MarketDataSchema`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaViolation {
    /// A required key is absent.
    MissingField(String),
    /// A key holds a value of the wrong JSON type.
    WrongType {
        field: &'static str,
        expected: &'static str,
        actual: &'static str,
    },
}

impl fmt::Display for SchemaViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SchemaViolation::MissingField(field) => write!(f, "missing required field '{}'", field),
            SchemaViolation::WrongType {
                field,
                expected,
                actual,
            } => write!(f, "field '{}' must be {}, got {}", field, expected, actual),
        }
    }
}

/// Default market-data schema.
///
/// - every configured required key is present
/// - `symbol`, if present, is a string
/// - `avg_volume` and `turnover_ratio`, if present, are scalars (number,
///   string or boolean). Numeric strings pass so the scorer can coerce them.
#[derive(Debug, Clone, Default)]
pub struct MarketDataSchema {
    required_fields: Vec<String>,
}

impl MarketDataSchema {
    /// Schema with no required keys.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from configuration.
    pub fn from_config(config: &SchemaConfig) -> Self {
        Self {
            required_fields: config.required_fields.clone(),
        }
    }

    /// Add a required key.
    pub fn require(mut self, field: impl Into<String>) -> Self {
        self.required_fields.push(field.into());
        self
    }

    /// Required keys.
    pub fn required_fields(&self) -> &[String] {
        &self.required_fields
    }

    /// First rule the message breaks, if any.
    pub fn first_violation(&self, message: &Message) -> Option<SchemaViolation> {
        if let Some(missing) = self
            .required_fields
            .iter()
            .find(|field| !message.contains_key(field.as_str()))
        {
            return Some(SchemaViolation::MissingField(missing.clone()));
        }

        if let Some(symbol) = message.get(fields::SYMBOL) {
            if !symbol.is_string() {
                return Some(SchemaViolation::WrongType {
                    field: fields::SYMBOL,
                    expected: "a string",
                    actual: json_type(symbol),
                });
            }
        }

        for field in [fields::AVG_VOLUME, fields::TURNOVER_RATIO] {
            if let Some(value) = message.get(field) {
                if !is_scalar(value) {
                    return Some(SchemaViolation::WrongType {
                        field,
                        expected: "a number or string",
                        actual: json_type(value),
                    });
                }
            }
        }

        None
    }
}

impl SchemaPredicate for MarketDataSchema {
    fn validate_message_schema(&self, message: &Message) -> bool {
        self.first_violation(message).is_none()
    }
}

fn is_scalar(value: &Value) -> bool {
    matches!(value, Value::Number(_) | Value::String(_) | Value::Bool(_))
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
