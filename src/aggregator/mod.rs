//! Aggregation of raw samples into running summaries.
//!
//! This module provides:
//! - The `Aggregatable` contract and the `Aggregate` wrapper (summary + merged ids)
//! - Timer, SQL and HTTP aggregation (shared timer totals, different keys)
//! - Exception aggregation by lifecycle stage
//! - A keyed `Aggregator` that seeds and folds aggregates per key

pub mod exception;
pub mod merge;
pub mod performer;
pub mod samples;

// Re-export main types and functions
pub use exception::ExceptionSummary;
pub use merge::{merge, merge_aggregates, Aggregatable, Aggregate};
pub use performer::Aggregator;
pub use samples::{HttpKey, SqlKey};
