//! Size command implementation.
//!
//! Reports the estimated memory held by each trace and by the standalone
//! records under the configured memory model.

use super::input::{load_input, TraceInput};
use super::models::SizeArgs;
use crate::output::TraceFootprint;
use crate::sizing::{EstimatedSize, MemorySizer};
use crate::utils::config::{load_config, EngineConfig};
use anyhow::{Context, Result};
use log::info;

/// Footprint of every trace in `input`, plus the summed size of its records
pub fn measure_input(input: &TraceInput, sizer: &dyn MemorySizer) -> (Vec<TraceFootprint>, u64) {
    let traces = input
        .traces
        .iter()
        .map(|trace| TraceFootprint::of(trace, sizer))
        .collect();
    let records = input
        .records
        .iter()
        .map(|record| record.estimated_size(sizer, true))
        .sum();
    (traces, records)
}

/// Execute the size command
pub fn execute_size(args: SizeArgs) -> Result<()> {
    let config = match &args.config {
        Some(path) => load_config(path).with_context(|| format!("Failed to load config {}", path.display()))?,
        None => EngineConfig::default(),
    };
    let sizer = config.sizer.build();
    info!("Memory model: {:?}", sizer);

    let input = load_input(&args.input, args.flat, config.trace.max_depth)
        .context("Failed to read trace input")?;

    let (traces, record_bytes) = measure_input(&input, &sizer);

    println!("{:>12}  {:>8}  {:>6}  {:>12}", "trace", "nodes", "depth", "bytes");
    for footprint in &traces {
        println!(
            "{:>12}  {:>8}  {:>6}  {:>12}",
            footprint.id, footprint.nodes, footprint.depth, footprint.bytes
        );
    }

    let trace_bytes: u64 = traces.iter().map(|footprint| footprint.bytes).sum();
    println!();
    println!("Traces:  {} ({} bytes)", traces.len(), trace_bytes);
    println!("Records: {} ({} bytes)", input.records.len(), record_bytes);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{MeasurementRecord, SampleIdentity, TimerSample};
    use crate::sizing::ObjectSizes;
    use crate::trace::InvocationTrace;

    #[test]
    fn test_measure_input() {
        let sizes = ObjectSizes::default();
        let identity = SampleIdentity::new(1, 2, 3);
        let timer = TimerSample::single(identity.clone(), 1.0);
        let trace = InvocationTrace::new(identity.clone().with_id(5), 2.0)
            .with_child(InvocationTrace::new(identity, 1.0));
        let input = TraceInput {
            traces: vec![trace.clone()],
            records: vec![MeasurementRecord::Timer(timer.clone())],
        };

        let (traces, record_bytes) = measure_input(&input, &sizes);

        assert_eq!(traces.len(), 1);
        assert_eq!(traces[0].id, 5);
        assert_eq!(traces[0].nodes, 2);
        assert_eq!(traces[0].depth, 1);
        assert_eq!(traces[0].bytes, trace.estimated_size(&sizes, true));
        assert_eq!(record_bytes, timer.estimated_size(&sizes, true));
    }
}
