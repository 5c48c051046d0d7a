//! APM trace core
//!
//! Aggregation and memory accounting for application performance
//! measurements: method timers, SQL statements, HTTP requests, exception
//! lifecycles and the invocation traces that tie them together.
//!
//! This crate provides the core implementation for the `apm-trace` CLI.
//!
//! ## Modules
//!
//! - [`model`]: raw measurement records
//! - [`aggregator`]: merging samples into aggregates
//! - [`trace`]: invocation trees, duration attribution and assembly
//! - [`sizing`]: estimated memory footprint
//! - [`output`]: aggregation reports

pub mod aggregator;
pub mod commands;
pub mod model;
pub mod output;
pub mod sizing;
pub mod trace;
pub mod utils;
