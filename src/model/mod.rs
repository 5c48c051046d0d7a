//! Raw measurement records produced by agents.
//!
//! This module defines:
//! - Identity fields shared by every record
//! - Timer, SQL, HTTP and exception samples
//! - Invocation-aware bookkeeping (which traces a sample appeared in)
//! - The sentinel encoding spoken by legacy producers

pub mod exception;
pub mod http;
pub mod identity;
pub mod invocation_aware;
pub mod legacy;
pub mod record;
pub mod sql;
pub mod timer;

// Re-export main types
pub use exception::{EventKind, ExceptionEvent, ExceptionOverviewKey};
pub use http::HttpSample;
pub use identity::SampleIdentity;
pub use invocation_aware::InvocationAwareData;
pub use legacy::LegacyTimerFields;
pub use record::MeasurementRecord;
pub use sql::SqlSample;
pub use timer::{CpuStats, ExclusiveStats, TimerSample};
