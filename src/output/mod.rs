//! Aggregation report output.
//!
//! This module handles:
//! - The report schema (`AggregationReport` and its rows)
//! - Writing and reading reports as JSON

pub mod json;
pub mod schema;

// Re-export main types and functions
pub use json::{read_report, report_to_string, write_report};
pub use schema::{
    AggregationReport, ExceptionRow, FootprintSummary, HttpRow, SqlRow, TimerRow, TraceFootprint,
};
