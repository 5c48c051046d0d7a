use apm_trace_core::aggregator::{merge, merge_aggregates, Aggregate, Aggregator, ExceptionSummary, SqlKey};
use apm_trace_core::model::{EventKind, ExceptionEvent, SampleIdentity, SqlSample, TimerSample};
use pretty_assertions::assert_eq;
use proptest::prelude::*;

fn timer(id: u64, duration: f64) -> TimerSample {
    TimerSample::single(SampleIdentity::new(1, 2, 3).with_id(id), duration)
}

fn fold_all(samples: &[TimerSample]) -> Aggregate<TimerSample> {
    let mut aggregate = Aggregate::empty_like(&samples[0]);
    for sample in samples {
        merge(&mut aggregate, sample);
    }
    aggregate.finalize();
    aggregate
}

#[test]
fn test_two_timers_average() {
    let aggregate = fold_all(&[timer(1, 10.0), timer(2, 30.0)]);

    assert_eq!(aggregate.data.count, 2);
    assert_eq!(aggregate.data.duration, 40.0);
    assert_eq!(aggregate.data.min, Some(10.0));
    assert_eq!(aggregate.data.max, Some(30.0));
    assert_eq!(aggregate.data.average, Some(20.0));
    assert_eq!(aggregate.merged_ids().collect::<Vec<_>>(), vec![1, 2]);
}

#[test]
fn test_zero_count_finalize_has_no_average() {
    let mut aggregate: Aggregate<TimerSample> = Aggregate::empty_like(&timer(1, 5.0));
    aggregate.finalize();
    assert_eq!(aggregate.data.average, None);
    assert_eq!(aggregate.count(), 0);
}

#[test]
fn test_unsaved_samples_are_not_tracked() {
    let aggregate = fold_all(&[timer(0, 1.0), timer(0, 2.0)]);
    assert_eq!(aggregate.count(), 2);
    assert_eq!(aggregate.merged_id_count(), 0);
}

#[test]
fn test_sql_aggregate_drops_parameters() {
    let identity = SampleIdentity::new(1, 2, 3);
    let sample = SqlSample::prepared(
        TimerSample::single(identity, 4.0),
        "SELECT * FROM t WHERE id = ?",
        vec!["7".to_string()],
    );
    assert_eq!(sample.rendered_sql(), "SELECT * FROM t WHERE id = 7");

    let mut aggregator = Aggregator::<SqlSample>::new();
    aggregator.add(&sample);
    aggregator.add(&sample);
    aggregator.finalize_all();

    let key = SqlKey {
        sql: "SELECT * FROM t WHERE id = ?".to_string(),
        prepared_statement: true,
    };
    let aggregate = aggregator.get(&key).unwrap();
    assert!(aggregate.data.parameter_values.is_empty());
    assert_eq!(aggregate.data.timer.count, 2);
    assert_eq!(aggregate.data.timer.average, Some(4.0));
}

#[test]
fn test_exception_lifecycle_counts() {
    let identity = SampleIdentity::new(1, 2, 3);
    let chain = ExceptionEvent::new(identity.clone().with_id(1), "IoError", EventKind::Created)
        .with_message("disk full")
        .with_child(
            ExceptionEvent::new(identity.clone().with_id(2), "IoError", EventKind::Passed).with_child(
                ExceptionEvent::new(identity.clone().with_id(3), "IoError", EventKind::Handled),
            ),
        );
    let unknown = ExceptionEvent::new(identity.with_id(4), "IoError", EventKind::Unknown);

    let mut aggregator = Aggregator::<ExceptionSummary>::new();
    aggregator.add_all(chain.lifecycle());
    aggregator.add(&unknown);

    let (_, aggregate) = aggregator.into_sorted().remove(0);
    assert_eq!(aggregate.data.created, 1);
    assert_eq!(aggregate.data.passed_or_rethrown, 1);
    assert_eq!(aggregate.data.handled, 1);
    assert_eq!(aggregate.data.error_message.as_deref(), Some("disk full"));
    assert_eq!(aggregate.merged_ids().collect::<Vec<_>>(), vec![1, 2, 3]);
}

proptest! {
    #[test]
    fn merge_order_does_not_change_totals(
        durations in prop::collection::vec(0u16..10_000, 1..40),
        seed in any::<u64>(),
    ) {
        let samples: Vec<TimerSample> = durations
            .iter()
            .enumerate()
            .map(|(index, &duration)| timer(index as u64 + 1, f64::from(duration)))
            .collect();

        let mut shuffled = samples.clone();
        let len = shuffled.len();
        shuffled.rotate_left((seed as usize) % len);
        shuffled.reverse();

        let forward = fold_all(&samples);
        let backward = fold_all(&shuffled);

        prop_assert_eq!(forward.data.count, backward.data.count);
        prop_assert_eq!(forward.data.duration, backward.data.duration);
        prop_assert_eq!(forward.data.min, backward.data.min);
        prop_assert_eq!(forward.data.max, backward.data.max);
        prop_assert_eq!(forward.data.average, backward.data.average);
        prop_assert_eq!(
            forward.merged_ids().collect::<Vec<_>>(),
            backward.merged_ids().collect::<Vec<_>>()
        );
    }

    #[test]
    fn merging_aggregates_unions_ids(
        left in prop::collection::btree_set(1u64..500, 1..20),
        right in prop::collection::btree_set(1u64..500, 1..20),
    ) {
        let left_samples: Vec<TimerSample> = left.iter().map(|&id| timer(id, 1.0)).collect();
        let right_samples: Vec<TimerSample> = right.iter().map(|&id| timer(id, 1.0)).collect();
        let mut a = fold_all(&left_samples);
        let b = fold_all(&right_samples);

        merge_aggregates(&mut a, &b);

        let expected: Vec<u64> = left.union(&right).copied().collect();
        prop_assert_eq!(a.merged_ids().collect::<Vec<_>>(), expected);
        prop_assert_eq!(a.count(), (left.len() + right.len()) as u64);
    }

    #[test]
    fn split_merge_matches_straight_fold(
        measurements in prop::collection::vec(
            (0u16..10_000, prop::option::of(0u16..10_000), prop::option::of(-500i16..500)),
            2..40,
        ),
        seed in any::<usize>(),
    ) {
        let samples: Vec<TimerSample> = measurements
            .iter()
            .enumerate()
            .map(|(index, &(duration, cpu, exclusive))| {
                let mut sample = timer(index as u64 + 1, f64::from(duration));
                if let Some(cpu) = cpu {
                    sample.add_cpu_measurement(f64::from(cpu));
                }
                if let Some(exclusive) = exclusive {
                    sample.add_exclusive_measurement(f64::from(exclusive));
                }
                sample
            })
            .collect();
        let split = 1 + seed % (samples.len() - 1);

        let straight = fold_all(&samples);
        let mut left = fold_all(&samples[..split]);
        let right = fold_all(&samples[split..]);
        merge_aggregates(&mut left, &right);
        left.finalize();

        prop_assert_eq!(left.data.count, straight.data.count);
        prop_assert_eq!(left.data.duration, straight.data.duration);
        prop_assert_eq!(left.data.min, straight.data.min);
        prop_assert_eq!(left.data.max, straight.data.max);
        prop_assert_eq!(left.data.average, straight.data.average);
        prop_assert_eq!(left.data.cpu, straight.data.cpu);
        prop_assert_eq!(left.data.exclusive, straight.data.exclusive);
        prop_assert_eq!(
            left.merged_ids().collect::<Vec<_>>(),
            straight.merged_ids().collect::<Vec<_>>()
        );

        let any_cpu = measurements.iter().any(|(_, cpu, _)| cpu.is_some());
        let any_exclusive = measurements.iter().any(|(_, _, exclusive)| exclusive.is_some());
        prop_assert_eq!(straight.data.is_cpu_available(), any_cpu);
        prop_assert_eq!(straight.data.is_exclusive_available(), any_exclusive);
        if let Some(exclusive) = &straight.data.exclusive {
            let measured = measurements.iter().filter(|(_, _, e)| e.is_some()).count() as u64;
            prop_assert_eq!(exclusive.count, measured);
        }

        let (min, average, max) = (
            straight.data.min.unwrap(),
            straight.data.average.unwrap(),
            straight.data.max.unwrap(),
        );
        prop_assert!(min <= average && average <= max, "{} <= {} <= {}", min, average, max);
    }
}
