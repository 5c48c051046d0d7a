//! Aggregate command implementation.
//!
//! Orchestrates the aggregation workflow:
//! 1. Load engine configuration
//! 2. Read trace input (assembling flat records when asked)
//! 3. Extract samples from every trace
//! 4. Fold samples into timer, SQL, HTTP and exception aggregates
//! 5. Build the method-invocation view from the trace roots
//! 6. Write the JSON report

use super::input::{load_input, TraceInput};
use super::models::AggregateArgs;
use crate::aggregator::{Aggregator, ExceptionSummary};
use crate::model::{HttpSample, MeasurementRecord, SqlSample, TimerSample};
use crate::output::{
    write_report, AggregationReport, ExceptionRow, FootprintSummary, HttpRow, SqlRow, TimerRow, TraceFootprint,
};
use crate::sizing::{MemorySizer, ObjectSizes};
use crate::trace::{extract_samples, synthetic_timer};
use crate::utils::config::{load_config, EngineConfig, REPORT_SCHEMA_VERSION};
use crate::utils::error::TraceError;
use anyhow::{Context, Result};
use chrono::Utc;
use log::{debug, info};
use std::time::Instant;

/// Running aggregates for one report
struct Aggregators {
    timers: Aggregator<TimerSample>,
    sqls: Aggregator<SqlSample>,
    https: Aggregator<HttpSample>,
    exceptions: Aggregator<ExceptionSummary>,
    invocations: Aggregator<TimerSample>,
    samples: usize,
}

impl Aggregators {
    fn new() -> Self {
        Self {
            timers: Aggregator::new(),
            sqls: Aggregator::new(),
            https: Aggregator::new(),
            exceptions: Aggregator::new(),
            invocations: Aggregator::new(),
            samples: 0,
        }
    }

    fn add_record(&mut self, record: &MeasurementRecord) {
        match record {
            MeasurementRecord::Timer(timer) => {
                self.timers.add(timer);
                self.samples += 1;
            }
            MeasurementRecord::Sql(sql) => {
                self.sqls.add(sql);
                self.samples += 1;
            }
            MeasurementRecord::Http(http) => {
                self.https.add(http);
                self.samples += 1;
            }
            MeasurementRecord::Exception(event) => {
                self.exceptions.add_all(event.lifecycle());
                self.samples += event.lifecycle().count();
            }
        }
    }

    fn estimated_size(&self, sizer: &dyn MemorySizer) -> u64 {
        self.timers.estimated_size(sizer)
            + self.sqls.estimated_size(sizer)
            + self.https.estimated_size(sizer)
            + self.exceptions.estimated_size(sizer)
            + self.invocations.estimated_size(sizer)
    }
}

/// Aggregate everything in `input` into a report
///
/// Tables are ordered by sample count, largest first, and cut to `top`
/// rows when given. Sizes are computed before the cut.
///
/// # Errors
/// * `TraceError::TraceTooDeep` - a trace nests deeper than the configured limit
pub fn build_report(
    input: &TraceInput,
    config: &EngineConfig,
    top: Option<usize>,
) -> Result<AggregationReport, TraceError> {
    let sizer = config.sizer.build();
    let max_depth = config.trace.max_depth;
    let mut aggregators = Aggregators::new();
    let mut trace_bytes = 0;

    for trace in &input.traces {
        let samples = extract_samples(trace, max_depth)?;
        aggregators.timers.add_all(&samples.timers);
        aggregators.sqls.add_all(&samples.sqls);
        for event in &samples.exceptions {
            aggregators.exceptions.add_all(event.lifecycle());
            aggregators.samples += event.lifecycle().count();
        }
        aggregators.samples += samples.timers.len() + samples.sqls.len();

        aggregators.invocations.add(&synthetic_timer(trace, max_depth)?);
        trace_bytes += TraceFootprint::of(trace, &sizer).bytes;
    }

    for record in &input.records {
        aggregators.add_record(record);
    }

    let footprint = FootprintSummary {
        trace_bytes,
        aggregate_bytes: aggregators.estimated_size(&sizer),
    };
    debug!(
        "Aggregated {} samples into {} method, {} SQL, {} HTTP and {} exception aggregates",
        aggregators.samples,
        aggregators.timers.len(),
        aggregators.sqls.len(),
        aggregators.https.len(),
        aggregators.exceptions.len()
    );

    Ok(into_report(aggregators, input.traces.len(), footprint, sizer, top))
}

fn into_report(
    mut aggregators: Aggregators,
    trace_count: usize,
    footprint: FootprintSummary,
    sizer: ObjectSizes,
    top: Option<usize>,
) -> AggregationReport {
    aggregators.timers.finalize_all();
    aggregators.sqls.finalize_all();
    aggregators.https.finalize_all();
    aggregators.exceptions.finalize_all();
    aggregators.invocations.finalize_all();

    let limit = top.unwrap_or(usize::MAX);
    let timer_rows = |aggregator: Aggregator<TimerSample>| -> Vec<TimerRow> {
        aggregator
            .into_sorted()
            .into_iter()
            .take(limit)
            .map(|(_, aggregate)| TimerRow::from_aggregate(&aggregate, &sizer))
            .collect()
    };

    AggregationReport {
        version: REPORT_SCHEMA_VERSION.to_string(),
        generated_at: Utc::now().to_rfc3339(),
        memory_model: sizer,
        trace_count,
        sample_count: aggregators.samples,
        methods: timer_rows(aggregators.timers),
        invocations: timer_rows(aggregators.invocations),
        sql: aggregators
            .sqls
            .into_sorted()
            .into_iter()
            .take(limit)
            .map(|(key, aggregate)| SqlRow::from_aggregate(&key, &aggregate, &sizer))
            .collect(),
        http: aggregators
            .https
            .into_sorted()
            .into_iter()
            .take(limit)
            .map(|(key, aggregate)| HttpRow::from_aggregate(&key, &aggregate, &sizer))
            .collect(),
        exceptions: aggregators
            .exceptions
            .into_sorted()
            .into_iter()
            .take(limit)
            .map(|(_, aggregate)| ExceptionRow::from_aggregate(&aggregate, &sizer))
            .collect(),
        footprint,
    }
}

/// Execute the aggregate command
///
/// # Errors
/// * Config file read or validation errors
/// * Input read, parse or assembly errors
/// * Report write errors
pub fn execute_aggregate(args: AggregateArgs) -> Result<()> {
    let start_time = Instant::now();

    info!("Step 1/4: Loading configuration...");
    let config = match &args.config {
        Some(path) => load_config(path).with_context(|| format!("Failed to load config {}", path.display()))?,
        None => EngineConfig::default(),
    };

    info!("Step 2/4: Reading traces from {}...", args.input.display());
    let input = load_input(&args.input, args.flat, config.trace.max_depth)
        .context("Failed to read trace input")?;

    info!("Step 3/4: Aggregating samples...");
    let report = build_report(&input, &config, args.top).context("Failed to aggregate traces")?;

    info!("Step 4/4: Writing report...");
    write_report(&report, &args.output).context("Failed to write report JSON")?;
    info!("✓ Report written to: {}", args.output.display());

    if args.print_summary {
        print_summary(&report);
    }

    info!("Aggregation completed in {:.2}s", start_time.elapsed().as_secs_f64());
    Ok(())
}

fn print_summary(report: &AggregationReport) {
    println!("\n{}", "=".repeat(80));
    println!("AGGREGATION SUMMARY");
    println!("{}", "=".repeat(80));
    println!("Traces:     {}", report.trace_count);
    println!("Samples:    {}", report.sample_count);
    println!(
        "Memory:     {} bytes in traces, {} bytes in aggregates",
        report.footprint.trace_bytes, report.footprint.aggregate_bytes
    );

    println!("\nMethods:");
    for row in &report.methods {
        println!(
            "  method {:>8}  count {:>6}  avg {:>10}  max {:>10}",
            row.method_ident,
            row.count,
            format_ms(row.average),
            format_ms(row.max)
        );
    }

    if !report.sql.is_empty() {
        println!("\nSQL:");
        for row in &report.sql {
            println!("  {:>6} x {:>10}  {}", row.count, format_ms(row.average), row.sql);
        }
    }

    if !report.http.is_empty() {
        println!("\nHTTP:");
        for row in &report.http {
            println!(
                "  {:>6} x {:>10}  {} {}",
                row.count,
                format_ms(row.average),
                row.request_method,
                row.uri
            );
        }
    }

    if !report.exceptions.is_empty() {
        println!("\nExceptions:");
        for row in &report.exceptions {
            println!(
                "  {}  created {}  passed {}  handled {}",
                row.throwable_type, row.created, row.passed_or_rethrown, row.handled
            );
        }
    }
    println!("{}", "=".repeat(80));
}

fn format_ms(value: Option<f64>) -> String {
    value.map_or_else(|| "-".to_string(), |ms| format!("{:.2}ms", ms))
}
