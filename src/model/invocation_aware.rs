//! Tracking of the invocation trees a sample was seen in.

use crate::sizing::{self, EstimatedSize, MemorySizer};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// How often, and under which invocation roots, a sample occurred
///
/// The same sample may occur several times under one root, so
/// `in_invocation_count >= invocation_parent_ids.len()` always holds.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InvocationAwareData {
    /// Number of occurrences inside invocation trees
    #[serde(default)]
    pub in_invocation_count: u64,

    /// Distinct invocation roots, allocated on first insert
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub invocation_parent_ids: Option<BTreeSet<u64>>,
}

impl InvocationAwareData {
    /// Record one more occurrence under the invocation `parent_id`
    pub fn record_parent(&mut self, parent_id: u64) {
        self.in_invocation_count += 1;
        self.invocation_parent_ids
            .get_or_insert_with(BTreeSet::new)
            .insert(parent_id);
    }

    /// Union the parent ids and add the occurrence counts
    pub fn merge(&mut self, other: &InvocationAwareData) {
        self.in_invocation_count += other.in_invocation_count;
        if let Some(ids) = &other.invocation_parent_ids {
            self.invocation_parent_ids
                .get_or_insert_with(BTreeSet::new)
                .extend(ids.iter().copied());
        }
    }

    /// Number of distinct invocation roots
    pub fn parent_count(&self) -> usize {
        self.invocation_parent_ids.as_ref().map_or(0, BTreeSet::len)
    }

    pub fn is_in_invocation(&self) -> bool {
        self.in_invocation_count > 0
    }
}

impl EstimatedSize for InvocationAwareData {
    fn estimated_size(&self, sizer: &dyn MemorySizer, align: bool) -> u64 {
        // count + set reference
        let size = sizer.primitive_sizes(0, 0, 0, 0, 2, 0)
            + sizing::id_set(sizer, self.invocation_parent_ids.as_ref());
        sizing::finish(sizer, size, align)
    }
}
