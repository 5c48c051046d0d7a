//! Keyed collection of running aggregates.
//!
//! Seeds an empty aggregate the first time a key is seen and folds every
//! later sample with the same key into it. Not synchronized; wrap it in a
//! lock (or shard by key) when several writers feed it.

use super::merge::{Aggregatable, Aggregate};
use crate::sizing::{EstimatedSize, MemorySizer};
use log::debug;
use std::collections::hash_map::Entry;
use std::collections::HashMap;

/// Aggregates of one summary type, keyed by aggregation key
pub struct Aggregator<A: Aggregatable> {
    aggregates: HashMap<A::Key, Aggregate<A>>,
    key_fn: fn(&A::Sample) -> A::Key,
}

impl<A: Aggregatable> Aggregator<A> {
    /// Aggregator grouping by the summary's default key
    pub fn new() -> Self {
        Self::with_key_fn(A::key_of)
    }

    /// Aggregator grouping by a custom key
    pub fn with_key_fn(key_fn: fn(&A::Sample) -> A::Key) -> Self {
        Self {
            aggregates: HashMap::new(),
            key_fn,
        }
    }

    /// Fold one sample into the aggregate for its key
    pub fn add(&mut self, sample: &A::Sample) {
        if !A::accepts(sample) {
            return;
        }
        let key = (self.key_fn)(sample);
        self.aggregates
            .entry(key)
            .or_insert_with(|| Aggregate::empty_like(sample))
            .merge(sample);
    }

    /// Fold every sample of `samples`
    pub fn add_all<'a, I>(&mut self, samples: I)
    where
        I: IntoIterator<Item = &'a A::Sample>,
        A::Sample: 'a,
    {
        for sample in samples {
            self.add(sample);
        }
    }

    /// Fold a pre-built aggregate under `key`
    pub fn add_aggregate(&mut self, key: A::Key, aggregate: &Aggregate<A>) {
        match self.aggregates.entry(key) {
            Entry::Occupied(mut entry) => entry.get_mut().merge_aggregates(aggregate),
            Entry::Vacant(entry) => {
                entry.insert(aggregate.clone());
            }
        }
    }

    /// Fold every aggregate of `other` into this aggregator
    pub fn absorb(&mut self, other: Aggregator<A>) {
        for (key, aggregate) in other.aggregates {
            self.add_aggregate(key, &aggregate);
        }
    }

    pub fn get(&self, key: &A::Key) -> Option<&Aggregate<A>> {
        self.aggregates.get(key)
    }

    pub fn len(&self) -> usize {
        self.aggregates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.aggregates.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&A::Key, &Aggregate<A>)> {
        self.aggregates.iter()
    }

    /// Compute derived values of every aggregate
    pub fn finalize_all(&mut self) {
        debug!("Finalizing {} aggregates", self.aggregates.len());
        for aggregate in self.aggregates.values_mut() {
            aggregate.finalize();
        }
    }
}

impl<A: Aggregatable> Aggregator<A>
where
    A::Key: Ord,
{
    /// Aggregates sorted by sample count (descending), ties by key
    pub fn into_sorted(self) -> Vec<(A::Key, Aggregate<A>)> {
        let mut sorted: Vec<(A::Key, Aggregate<A>)> = self.aggregates.into_iter().collect();
        sorted.sort_by(|a, b| b.1.count().cmp(&a.1.count()).then_with(|| a.0.cmp(&b.0)));
        sorted
    }
}

impl<A: Aggregatable + EstimatedSize> Aggregator<A> {
    /// Summed size of all aggregates, each one aligned on its own
    pub fn estimated_size(&self, sizer: &dyn MemorySizer) -> u64 {
        self.aggregates
            .values()
            .map(|aggregate| aggregate.estimated_size(sizer, true))
            .sum()
    }
}

impl<A: Aggregatable> Default for Aggregator<A> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregator::ExceptionSummary;
    use crate::model::{EventKind, ExceptionEvent, SampleIdentity, TimerSample};
    use crate::sizing::ObjectSizes;

    fn timer(method: u64, duration: f64) -> TimerSample {
        TimerSample::single(SampleIdentity::new(1, 2, method), duration)
    }

    #[test]
    fn test_groups_by_method() {
        let mut aggregator = Aggregator::<TimerSample>::new();
        aggregator.add_all(&[timer(1, 10.0), timer(2, 5.0), timer(1, 30.0)]);
        aggregator.finalize_all();

        assert_eq!(aggregator.len(), 2);
        let first = aggregator.get(&1).unwrap();
        assert_eq!(first.count(), 2);
        assert_eq!(first.data.average, Some(20.0));
    }

    #[test]
    fn test_into_sorted_orders_by_count_then_key() {
        let mut aggregator = Aggregator::<TimerSample>::new();
        aggregator.add_all(&[timer(3, 1.0), timer(1, 1.0), timer(2, 1.0), timer(2, 1.0)]);

        let keys: Vec<u64> = aggregator.into_sorted().into_iter().map(|(key, _)| key).collect();
        assert_eq!(keys, vec![2, 1, 3]);
    }

    #[test]
    fn test_absorb_merges_shared_keys() {
        let mut a = Aggregator::<TimerSample>::new();
        a.add(&timer(1, 1.0));
        let mut b = Aggregator::<TimerSample>::new();
        b.add(&timer(1, 3.0));
        b.add(&timer(4, 2.0));

        a.absorb(b);

        assert_eq!(a.len(), 2);
        assert_eq!(a.get(&1).unwrap().count(), 2);
    }

    #[test]
    fn test_overview_key_fn() {
        let identity = SampleIdentity::new(1, 2, 3);
        let a = ExceptionEvent::new(identity.clone(), "E", EventKind::Created).with_message("x");
        let b = ExceptionEvent::new(identity, "E", EventKind::Created).with_message("y");

        let mut by_type = Aggregator::<ExceptionSummary>::new();
        by_type.add_all([&a, &b]);
        let mut overview = Aggregator::<ExceptionSummary>::with_key_fn(ExceptionSummary::overview_key_of);
        overview.add_all([&a, &b]);

        assert_eq!(by_type.len(), 1);
        assert_eq!(overview.len(), 2);
    }

    #[test]
    fn test_unknown_kind_creates_no_aggregate() {
        let event = ExceptionEvent::new(SampleIdentity::new(1, 2, 3), "E", EventKind::Unknown);
        let mut aggregator = Aggregator::<ExceptionSummary>::new();
        aggregator.add(&event);
        assert!(aggregator.is_empty());
    }

    #[test]
    fn test_estimated_size_sums_aligned_aggregates() {
        let sizes = ObjectSizes::default();
        let mut aggregator = Aggregator::<TimerSample>::new();
        aggregator.add_all(&[timer(1, 1.0), timer(2, 1.0)]);

        let expected: u64 = aggregator
            .iter()
            .map(|(_, aggregate)| aggregate.estimated_size(&sizes, true))
            .sum();
        assert_eq!(aggregator.estimated_size(&sizes), expected);
        assert!(expected > 0);
    }
}
