//! End-to-end liquidity processing.
//!
//! This crate provides:
//! - The validate-then-score pipeline
//! - A JSON entry point for transport layers
//! - Batch processing with summary statistics

pub mod batch;
pub mod pipeline;

pub use batch::{BatchOutcome, BatchStats, Rejection};
pub use pipeline::LiquidityProcessor;
