use apm_trace_core::model::{EventKind, ExceptionEvent, SampleIdentity, SqlSample, TimerSample};
use apm_trace_core::trace::{
    assemble, exclusive_duration, extract_samples, nested_duration, own_duration, synthetic_timer, InvocationTrace,
};
use apm_trace_core::utils::TraceError;
use pretty_assertions::assert_eq;

const DEPTH: usize = 128;

fn identity(id: u64) -> SampleIdentity {
    SampleIdentity::new(1, 2, id).with_id(id)
}

fn record(id: u64, parent_id: Option<u64>, duration: f64) -> InvocationTrace {
    let mut record = InvocationTrace::new(identity(id), duration);
    record.parent_id = parent_id;
    record
}

#[test]
fn test_assembled_tree_attributes_durations() {
    let mut timed = record(2, Some(1), 30.0);
    timed.timer_sample = Some(TimerSample::single(identity(2), 30.0));
    let mut sql = record(3, Some(1), 25.0);
    sql.sql_sample = Some(SqlSample::single(identity(3), "SELECT 1", 20.0));

    let trees = assemble(vec![record(1, None, 100.0), timed, sql], DEPTH).unwrap();
    let root = &trees[0];

    assert_eq!(own_duration(root), Some(100.0));
    assert_eq!(nested_duration(root, DEPTH).unwrap(), 50.0);
    assert_eq!(exclusive_duration(root, DEPTH).unwrap(), Some(50.0));

    let timer = synthetic_timer(root, DEPTH).unwrap();
    assert_eq!(timer.duration, 100.0);
    assert_eq!(timer.exclusive.unwrap().duration, 50.0);
}

#[test]
fn test_assemble_then_extract() {
    let mut child = record(2, Some(1), 5.0);
    child.timer_sample = Some(TimerSample::single(identity(2), 5.0));
    child.exceptions = Some(vec![ExceptionEvent::new(identity(2), "Timeout", EventKind::Created)]);

    let trees = assemble(vec![child, record(1, None, 9.0)], DEPTH).unwrap();
    assert_eq!(trees.len(), 1);

    let samples = extract_samples(&trees[0], DEPTH).unwrap();
    assert_eq!(samples.timers.len(), 1);
    assert_eq!(samples.exceptions.len(), 1);
    assert_eq!(samples.timers[0].invocation.parent_count(), 1);
    assert_eq!(samples.exceptions[0].invocation.in_invocation_count, 1);
}

#[test]
fn test_assemble_errors() {
    assert_eq!(
        assemble(vec![record(1, None, 1.0), record(1, None, 1.0)], DEPTH).unwrap_err(),
        TraceError::DuplicateId { id: 1 }
    );
    assert_eq!(
        assemble(vec![record(2, Some(3), 1.0)], DEPTH).unwrap_err(),
        TraceError::UnknownParent { id: 2, parent_id: 3 }
    );
    assert_eq!(
        assemble(vec![record(2, Some(3), 1.0), record(3, Some(2), 1.0)], DEPTH).unwrap_err(),
        TraceError::CyclicTrace { id: 2 }
    );
}

#[test]
fn test_deep_trace_reports_error_instead_of_overflowing() {
    let mut trace = record(0, None, 1.0);
    for id in 1..50_000 {
        trace = record(id, None, 1.0).with_child(trace);
    }

    assert_eq!(
        extract_samples(&trace, DEPTH).unwrap_err(),
        TraceError::TraceTooDeep { limit: DEPTH }
    );
    assert_eq!(
        nested_duration(&trace, DEPTH).unwrap_err(),
        TraceError::TraceTooDeep { limit: DEPTH }
    );
    assert_eq!(trace.node_count(), 50_000);
}

#[test]
fn test_trace_json_round_trip_keeps_structure() {
    let root = InvocationTrace::new(identity(1), 10.0)
        .with_child(InvocationTrace::new(identity(2), 4.0).with_timer(TimerSample::single(identity(2), 4.0)));

    let json = serde_json::to_string(&root).unwrap();
    let parsed: InvocationTrace = serde_json::from_str(&json).unwrap();

    assert_eq!(parsed, root);
    assert_eq!(parsed.nested[0].parent_id, Some(1));
}
