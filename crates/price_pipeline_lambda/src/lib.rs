//! AWS-oriented adapters and handlers for the price pipeline.
//!
//! This crate owns runtime integration details (Lambda handlers, storage,
//! table and alerting adapters, environment configuration) on top of the
//! contracts in `price_pipeline_core`.

pub mod adapters;
pub mod config;
pub mod handlers;
pub mod telemetry;
