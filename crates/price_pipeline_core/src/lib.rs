//! Shared price pipeline domain primitives.
//!
//! This crate owns request/response contracts, price classification, storage
//! key layout, and the regression model artifact. It intentionally excludes
//! AWS SDK and Lambda runtime concerns.

pub mod classification;
pub mod contract;
pub mod model;
pub mod storage_keys;
