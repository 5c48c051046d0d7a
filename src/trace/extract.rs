//! Pull the samples out of an invocation trace for aggregation.

use super::invocation::InvocationTrace;
use crate::model::{ExceptionEvent, SqlSample, TimerSample};
use crate::utils::error::TraceError;
use log::debug;

/// Every sample found in one trace, marked with the trace's root id
#[derive(Debug, Clone, Default)]
pub struct ExtractedSamples {
    pub timers: Vec<TimerSample>,
    pub sqls: Vec<SqlSample>,
    /// Chain heads; every link of a chain is marked
    pub exceptions: Vec<ExceptionEvent>,
}

impl ExtractedSamples {
    pub fn len(&self) -> usize {
        self.timers.len() + self.sqls.len() + self.exceptions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Copy every timer, SQL and exception sample out of `root`
///
/// Each copy records one occurrence under the root's id, so aggregates
/// built from them know which invocations they came from.
///
/// # Errors
/// * `TraceError::TraceTooDeep` - the trace nests deeper than `max_depth`
pub fn extract_samples(root: &InvocationTrace, max_depth: usize) -> Result<ExtractedSamples, TraceError> {
    let root_id = root.identity.id;
    let mut samples = ExtractedSamples::default();

    for node in root.checked_nodes(max_depth)? {
        if let Some(timer) = &node.timer_sample {
            let mut timer = timer.clone();
            timer.invocation.record_parent(root_id);
            samples.timers.push(timer);
        }
        if let Some(sql) = &node.sql_sample {
            let mut sql = sql.clone();
            sql.timer.invocation.record_parent(root_id);
            samples.sqls.push(sql);
        }
        for event in node.exceptions.iter().flatten() {
            let mut event = event.clone();
            mark_chain(&mut event, root_id);
            samples.exceptions.push(event);
        }
    }

    debug!(
        "Extracted {} samples from invocation {}",
        samples.len(),
        root_id
    );
    Ok(samples)
}

fn mark_chain(head: &mut ExceptionEvent, root_id: u64) {
    let mut link = Some(head);
    while let Some(event) = link {
        event.invocation.record_parent(root_id);
        link = event.child.as_deref_mut();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{EventKind, SampleIdentity};

    fn identity(id: u64) -> SampleIdentity {
        SampleIdentity::new(1, 2, id)
    }

    #[test]
    fn test_extract_marks_root() {
        let chain = ExceptionEvent::new(identity(9), "E", EventKind::Created)
            .with_child(ExceptionEvent::new(identity(9), "E", EventKind::Handled));
        let root = InvocationTrace::new(identity(1).with_id(100), 50.0)
            .with_timer(TimerSample::single(identity(1), 50.0))
            .with_child(
                InvocationTrace::new(identity(2), 10.0)
                    .with_sql(SqlSample::single(identity(2), "SELECT 1", 10.0))
                    .with_exception(chain),
            )
            .with_child(
                InvocationTrace::new(identity(3), 5.0).with_timer(TimerSample::single(identity(3), 5.0)),
            );

        let samples = extract_samples(&root, 16).unwrap();

        assert_eq!(samples.timers.len(), 2);
        assert_eq!(samples.sqls.len(), 1);
        assert_eq!(samples.exceptions.len(), 1);
        assert_eq!(samples.len(), 4);
        for timer in &samples.timers {
            assert_eq!(timer.invocation.in_invocation_count, 1);
            assert!(timer.invocation.invocation_parent_ids.as_ref().unwrap().contains(&100));
        }
        for link in samples.exceptions[0].lifecycle() {
            assert_eq!(link.invocation.in_invocation_count, 1);
        }
        // the trace itself is untouched
        assert!(!root.timer_sample.as_ref().unwrap().invocation.is_in_invocation());
    }

    #[test]
    fn test_extract_empty_trace() {
        let root = InvocationTrace::new(identity(1), 1.0);
        assert!(extract_samples(&root, 4).unwrap().is_empty());
    }
}
