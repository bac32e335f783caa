//! Schema validation for the liquidity signal pipeline.
//!
//! This crate handles:
//! - The schema predicate seam (`SchemaPredicate`)
//! - A default market-data schema
//! - The validator that gates untrusted input before scoring

pub mod schema;
pub mod validator;

pub use schema::{AcceptAll, MarketDataSchema, SchemaPredicate, SchemaViolation};
pub use validator::{validate_input_message, MessageValidator};
