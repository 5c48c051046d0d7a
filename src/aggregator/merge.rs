//! Folding samples and aggregates into running aggregates.
//!
//! Merging is additive: folding the same sample twice counts it twice, so
//! callers must apply each sample once. Averages are derived on demand by
//! `finalize`, which should run once after the last merge.
//!
//! Merges mutate running totals and need external synchronization when
//! several writers share one aggregate.

use crate::sizing::{self, EstimatedSize, MemorySizer};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt::Debug;
use std::hash::Hash;

/// A running summary that samples of one kind can be folded into
pub trait Aggregatable: Clone {
    /// Raw sample type folded into this summary
    type Sample;

    /// Equality under which samples share one aggregate
    type Key: Eq + Hash + Clone + Debug;

    /// Default aggregation key of a sample
    fn key_of(sample: &Self::Sample) -> Self::Key;

    /// Empty summary shaped like `sample` (same origin, nothing counted)
    fn empty_like(sample: &Self::Sample) -> Self;

    /// Persistent id of a sample, 0 when it has none
    fn sample_id(sample: &Self::Sample) -> u64;

    /// Whether `sample` takes part in aggregation at all
    fn accepts(_sample: &Self::Sample) -> bool {
        true
    }

    /// Fold one raw sample into this summary
    fn fold(&mut self, sample: &Self::Sample);

    /// Fold another summary into this one
    fn combine(&mut self, other: &Self);

    /// Compute derived values
    fn finalize(&mut self);

    /// Number of raw samples folded so far
    fn count(&self) -> u64;
}

/// A summary plus the ids of the samples folded into it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Aggregate<A> {
    pub data: A,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    merged_ids: Option<BTreeSet<u64>>,
}

impl<A: Aggregatable> Aggregate<A> {
    pub fn new(data: A) -> Self {
        Self {
            data,
            merged_ids: None,
        }
    }

    /// Empty aggregate for samples like `sample`
    pub fn empty_like(sample: &A::Sample) -> Self {
        Self::new(A::empty_like(sample))
    }

    /// Fold one raw sample in; samples the summary does not accept are skipped
    pub fn merge(&mut self, sample: &A::Sample) {
        if !A::accepts(sample) {
            return;
        }
        self.data.fold(sample);
        self.record_id(A::sample_id(sample));
    }

    /// Fold another aggregate in
    pub fn merge_aggregates(&mut self, other: &Aggregate<A>) {
        self.data.combine(&other.data);
        if let Some(ids) = &other.merged_ids {
            self.merged_ids
                .get_or_insert_with(BTreeSet::new)
                .extend(ids.iter().copied());
        }
    }

    pub fn finalize(&mut self) {
        self.data.finalize();
    }

    pub fn count(&self) -> u64 {
        self.data.count()
    }

    /// Ids of the persisted samples folded in
    pub fn merged_ids(&self) -> impl Iterator<Item = u64> + '_ {
        self.merged_ids.iter().flat_map(|ids| ids.iter().copied())
    }

    pub fn merged_id_count(&self) -> usize {
        self.merged_ids.as_ref().map_or(0, BTreeSet::len)
    }

    pub(crate) fn record_id(&mut self, id: u64) {
        if id != 0 {
            self.merged_ids.get_or_insert_with(BTreeSet::new).insert(id);
        }
    }
}

/// Fold one raw sample into `aggregate`
pub fn merge<A: Aggregatable>(aggregate: &mut Aggregate<A>, sample: &A::Sample) {
    aggregate.merge(sample);
}

/// Fold aggregate `b` into aggregate `a`
pub fn merge_aggregates<A: Aggregatable>(a: &mut Aggregate<A>, b: &Aggregate<A>) {
    a.merge_aggregates(b);
}

impl<A: EstimatedSize> EstimatedSize for Aggregate<A> {
    fn estimated_size(&self, sizer: &dyn MemorySizer, align: bool) -> u64 {
        let mut size = self.data.estimated_size(sizer, false);
        // merged id set reference
        size += sizer.primitive_sizes(0, 0, 0, 0, 1, 0);
        size += sizing::id_set(sizer, self.merged_ids.as_ref());
        sizing::finish(sizer, size, align)
    }
}
