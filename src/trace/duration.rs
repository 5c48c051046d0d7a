//! Duration attribution within invocation traces.
//!
//! A node's own duration comes from its timer sample, else its SQL sample,
//! else (for a root only) its measured wall time. Nested duration sums the
//! own durations of the direct children; a child with no own duration is
//! skipped and its children are counted instead, so time is attributed
//! deeper rather than lost.

use super::invocation::InvocationTrace;
use crate::model::TimerSample;
use crate::utils::error::TraceError;
use log::debug;

/// Own duration of a node reached as a descendant (never a root)
fn attributed_duration(node: &InvocationTrace) -> Option<f64> {
    node.timer_sample
        .as_ref()
        .map(|timer| timer.duration)
        .or_else(|| node.sql_sample.as_ref().map(|sql| sql.timer.duration))
}

/// Duration measured for `node` itself, `None` when it has none
///
/// Callers summing durations must skip nodes that return `None`.
pub fn own_duration(node: &InvocationTrace) -> Option<f64> {
    attributed_duration(node).or_else(|| node.is_root().then_some(node.duration))
}

/// Duration attributable to the calls nested under `node`
///
/// # Errors
/// * `TraceError::TraceTooDeep` - the walk had to descend past `max_depth`
pub fn nested_duration(node: &InvocationTrace, max_depth: usize) -> Result<f64, TraceError> {
    let mut total = 0.0;
    let mut pending: Vec<(usize, &InvocationTrace)> =
        node.nested.iter().map(|child| (1, child)).collect();

    while let Some((depth, child)) = pending.pop() {
        if depth > max_depth {
            return Err(TraceError::TraceTooDeep { limit: max_depth });
        }
        match attributed_duration(child) {
            Some(duration) => total += duration,
            None => pending.extend(child.nested.iter().map(|grandchild| (depth + 1, grandchild))),
        }
    }

    Ok(total)
}

/// Own duration minus nested duration, `None` when `node` has no own duration
///
/// Not clamped: children measured on a different clock than their parent
/// can make this negative.
pub fn exclusive_duration(node: &InvocationTrace, max_depth: usize) -> Result<Option<f64>, TraceError> {
    let Some(own) = own_duration(node) else {
        return Ok(None);
    };
    Ok(Some(own - nested_duration(node, max_depth)?))
}

/// Timer describing `node` for the method-invocation view
///
/// A node with its own timer sample returns that sample. Otherwise a
/// single-measurement timer is manufactured from the node's duration, with
/// the exclusive time computed once here.
pub fn synthetic_timer(node: &InvocationTrace, max_depth: usize) -> Result<TimerSample, TraceError> {
    if let Some(timer) = &node.timer_sample {
        return Ok(timer.clone());
    }

    let duration = own_duration(node).unwrap_or(node.duration);
    let exclusive = duration - nested_duration(node, max_depth)?;
    if exclusive < 0.0 {
        debug!(
            "Negative exclusive time {} for invocation {} (clock skew between nested calls)",
            exclusive, node.identity.id
        );
    }

    let mut timer = TimerSample::single(node.identity.clone(), duration);
    timer.add_exclusive_measurement(exclusive);
    Ok(timer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{SampleIdentity, SqlSample};

    const DEPTH: usize = 64;

    fn identity(id: u64) -> SampleIdentity {
        SampleIdentity::new(1, 2, 3).with_id(id)
    }

    fn bare(id: u64, duration: f64) -> InvocationTrace {
        InvocationTrace::new(identity(id), duration)
    }

    fn timed(id: u64, duration: f64) -> InvocationTrace {
        bare(id, duration).with_timer(TimerSample::single(identity(id), duration))
    }

    #[test]
    fn test_own_duration_precedence() {
        let root = bare(1, 100.0);
        assert_eq!(own_duration(&root), Some(100.0));

        let with_sql = bare(2, 100.0).with_sql(SqlSample::single(identity(2), "SELECT 1", 7.0));
        assert_eq!(own_duration(&with_sql), Some(7.0));

        let with_both = timed(3, 9.0).with_sql(SqlSample::single(identity(3), "SELECT 1", 7.0));
        assert_eq!(own_duration(&with_both), Some(9.0));
    }

    #[test]
    fn test_own_duration_undefined_for_bare_child() {
        let root = bare(1, 100.0).with_child(bare(2, 50.0));
        assert_eq!(own_duration(&root.nested[0]), None);
    }

    #[test]
    fn test_nested_duration_descends_on_miss() {
        // root -> bare -> (timed 30, timed 20)
        //      -> timed 40 -> timed 5 (not counted, parent has own duration)
        let root = bare(1, 100.0)
            .with_child(bare(2, 60.0).with_child(timed(3, 30.0)).with_child(timed(4, 20.0)))
            .with_child(timed(5, 40.0).with_child(timed(6, 5.0)));

        assert_eq!(nested_duration(&root, DEPTH).unwrap(), 90.0);
        assert_eq!(exclusive_duration(&root, DEPTH).unwrap(), Some(10.0));
    }

    #[test]
    fn test_nested_duration_without_samples_is_zero() {
        let mut chain = bare(10, 1.0);
        for id in (1..10).rev() {
            chain = bare(id, 1.0).with_child(chain);
        }
        assert_eq!(nested_duration(&chain, 10).unwrap(), 0.0);
    }

    #[test]
    fn test_nested_duration_depth_limit() {
        let root = bare(1, 1.0).with_child(bare(2, 1.0).with_child(bare(3, 1.0)));
        assert!(nested_duration(&root, 2).is_ok());
        assert_eq!(
            nested_duration(&root, 1).unwrap_err(),
            TraceError::TraceTooDeep { limit: 1 }
        );
    }

    #[test]
    fn test_synthetic_timer_for_root() {
        let root = bare(1, 100.0).with_child(timed(2, 30.0));
        let timer = synthetic_timer(&root, DEPTH).unwrap();

        assert_eq!(timer.count, 1);
        assert_eq!(timer.duration, 100.0);
        let exclusive = timer.exclusive.unwrap();
        assert_eq!(exclusive.count, 1);
        assert_eq!(exclusive.duration, 70.0);
    }

    #[test]
    fn test_synthetic_timer_keeps_negative_exclusive() {
        let root = bare(1, 10.0).with_child(timed(2, 12.0));
        let timer = synthetic_timer(&root, DEPTH).unwrap();
        assert_eq!(timer.exclusive.unwrap().duration, -2.0);
    }

    #[test]
    fn test_synthetic_timer_prefers_explicit_timer() {
        let root = timed(1, 50.0).with_child(timed(2, 10.0));
        let timer = synthetic_timer(&root, DEPTH).unwrap();
        assert_eq!(timer, *root.timer_sample.as_ref().unwrap());
        assert!(timer.exclusive.is_none());
    }
}
