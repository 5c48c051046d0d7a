//! Aggregation report schema.
//!
//! Flat rows built from finalized aggregates. Every row type is plain
//! data so that reports can be read back and compared.

use crate::aggregator::{Aggregate, ExceptionSummary, HttpKey, SqlKey};
use crate::model::{HttpSample, SqlSample, TimerSample};
use crate::sizing::{EstimatedSize, MemorySizer, ObjectSizes};
use crate::trace::InvocationTrace;
use serde::{Deserialize, Serialize};

/// Top-level report written by the `aggregate` command
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregationReport {
    /// Schema version (e.g., "1.0.0")
    pub version: String,

    /// ISO 8601 timestamp of report generation
    pub generated_at: String,

    /// Memory model the sizes were computed with
    pub memory_model: ObjectSizes,

    /// Number of invocation trees read
    pub trace_count: usize,

    /// Number of samples folded into aggregates
    pub sample_count: usize,

    /// Timer aggregates per method
    pub methods: Vec<TimerRow>,

    /// Root invocations per method, timed by their synthetic timers
    pub invocations: Vec<TimerRow>,

    pub sql: Vec<SqlRow>,

    pub http: Vec<HttpRow>,

    pub exceptions: Vec<ExceptionRow>,

    /// Estimated memory held by the traces and the aggregates
    pub footprint: FootprintSummary,
}

/// One timer aggregate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimerRow {
    pub method_ident: u64,
    pub count: u64,
    pub duration: f64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub average: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cpu_average: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exclusive_average: Option<f64>,

    /// Distinct invocations the samples were recorded in
    pub invocation_count: usize,

    /// Distinct sample ids merged in
    pub merged_ids: usize,

    pub estimated_size: u64,
}

impl TimerRow {
    pub fn from_aggregate(aggregate: &Aggregate<TimerSample>, sizer: &dyn MemorySizer) -> Self {
        let timer = &aggregate.data;
        Self {
            method_ident: timer.identity.method_ident,
            count: timer.count,
            duration: timer.duration,
            min: timer.min,
            max: timer.max,
            average: timer.average,
            cpu_average: timer.cpu.as_ref().and_then(|cpu| cpu.average),
            exclusive_average: timer.exclusive.as_ref().and_then(|exclusive| exclusive.average),
            invocation_count: timer.invocation.parent_count(),
            merged_ids: aggregate.merged_id_count(),
            estimated_size: aggregate.estimated_size(sizer, true),
        }
    }
}

/// One SQL aggregate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SqlRow {
    pub sql: String,
    pub prepared_statement: bool,
    pub count: u64,
    pub duration: f64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub average: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,

    pub invocation_count: usize,
    pub estimated_size: u64,
}

impl SqlRow {
    pub fn from_aggregate(key: &SqlKey, aggregate: &Aggregate<SqlSample>, sizer: &dyn MemorySizer) -> Self {
        let timer = &aggregate.data.timer;
        Self {
            sql: key.sql.clone(),
            prepared_statement: key.prepared_statement,
            count: timer.count,
            duration: timer.duration,
            average: timer.average,
            max: timer.max,
            invocation_count: timer.invocation.parent_count(),
            estimated_size: aggregate.estimated_size(sizer, true),
        }
    }
}

/// One HTTP aggregate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HttpRow {
    pub uri: String,
    pub request_method: String,
    pub count: u64,
    pub duration: f64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub average: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,

    pub estimated_size: u64,
}

impl HttpRow {
    pub fn from_aggregate(key: &HttpKey, aggregate: &Aggregate<HttpSample>, sizer: &dyn MemorySizer) -> Self {
        let timer = &aggregate.data.timer;
        Self {
            uri: key.uri.clone(),
            request_method: key.request_method.clone(),
            count: timer.count,
            duration: timer.duration,
            average: timer.average,
            max: timer.max,
            estimated_size: aggregate.estimated_size(sizer, true),
        }
    }
}

/// One exception aggregate
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExceptionRow {
    pub throwable_type: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,

    pub created: u64,
    pub passed_or_rethrown: u64,
    pub handled: u64,
    pub invocation_count: usize,
    pub estimated_size: u64,
}

impl ExceptionRow {
    pub fn from_aggregate(aggregate: &Aggregate<ExceptionSummary>, sizer: &dyn MemorySizer) -> Self {
        let summary = &aggregate.data;
        Self {
            throwable_type: summary.throwable_type.clone(),
            error_message: summary.error_message.clone(),
            created: summary.created,
            passed_or_rethrown: summary.passed_or_rethrown,
            handled: summary.handled,
            invocation_count: summary.invocation.parent_count(),
            estimated_size: aggregate.estimated_size(sizer, true),
        }
    }
}

/// Estimated memory of one invocation tree
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraceFootprint {
    pub id: u64,
    pub nodes: usize,
    pub depth: usize,
    pub bytes: u64,
}

impl TraceFootprint {
    pub fn of(trace: &InvocationTrace, sizer: &dyn MemorySizer) -> Self {
        Self {
            id: trace.identity.id,
            nodes: trace.node_count(),
            depth: trace.depth(),
            bytes: trace.estimated_size(sizer, true),
        }
    }
}

/// Memory totals for a report
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FootprintSummary {
    /// Summed size of all input traces
    pub trace_bytes: u64,

    /// Summed size of all aggregates
    pub aggregate_bytes: u64,
}
