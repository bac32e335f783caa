//! Core types and configuration for the liquidity signal pipeline.
//!
//! This crate provides shared pieces used across all other crates:
//! - Message types (raw, validated, enriched)
//! - Configuration structures and policy constants
//! - Common error types
//! - The diagnostic sink and tracing setup

pub mod config;
pub mod diagnostics;
pub mod error;
pub mod logging;
pub mod types;

pub use config::Config;
pub use diagnostics::{DiagnosticLevel, DiagnosticSink, MemorySink, NullSink, TracingSink};
pub use error::{Error, ErrorKind, NumericType, Result};
pub use types::*;
