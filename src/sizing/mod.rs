//! Estimated memory footprint of records, traces and aggregates.
//!
//! A bounded buffer outside this crate asks every payload how large it is
//! before admitting it and again while choosing what to evict. Each type
//! sums its embedded parts, its declared fields and its containers. Nested
//! parts are always sized with `align = false`; only the outermost call
//! rounds up to the alignment boundary.

pub mod sizer;

pub use sizer::{MemorySizer, ObjectSizes, SizerProfile};

use std::collections::{BTreeMap, BTreeSet};

/// Deterministic, side-effect-free memory footprint estimate
pub trait EstimatedSize {
    /// Estimated bytes held by `self`, rounded to the alignment boundary
    /// when `align` is true
    fn estimated_size(&self, sizer: &dyn MemorySizer, align: bool) -> u64;
}

impl<T: EstimatedSize + ?Sized> EstimatedSize for &T {
    fn estimated_size(&self, sizer: &dyn MemorySizer, align: bool) -> u64 {
        (**self).estimated_size(sizer, align)
    }
}

/// Round `size` when this is the outermost call
pub(crate) fn finish(sizer: &dyn MemorySizer, size: u64, align: bool) -> u64 {
    if align {
        sizer.align(size)
    } else {
        size
    }
}

/// A boxed 64-bit integer stored in a set
pub(crate) fn boxed_u64(sizer: &dyn MemorySizer) -> u64 {
    sizer.object_header() + sizer.primitive_sizes(0, 0, 0, 0, 1, 0)
}

/// Set of ids plus its boxed elements, zero when never allocated
pub(crate) fn id_set(sizer: &dyn MemorySizer, ids: Option<&BTreeSet<u64>>) -> u64 {
    match ids {
        Some(ids) => sizer.size_of_set(ids.len()) + ids.len() as u64 * boxed_u64(sizer),
        None => 0,
    }
}

/// Optional string, zero when absent
pub(crate) fn opt_string(sizer: &dyn MemorySizer, value: Option<&str>) -> u64 {
    value.map(|s| sizer.size_of_string(s)).unwrap_or(0)
}

/// String to string map with its keys and values, zero when absent
pub(crate) fn string_map(sizer: &dyn MemorySizer, map: Option<&BTreeMap<String, String>>) -> u64 {
    match map {
        Some(map) => {
            sizer.size_of_map(map.len())
                + map
                    .iter()
                    .map(|(k, v)| sizer.size_of_string(k) + sizer.size_of_string(v))
                    .sum::<u64>()
        }
        None => 0,
    }
}

/// String to string-array map with its keys and arrays, zero when absent
pub(crate) fn multi_string_map(
    sizer: &dyn MemorySizer,
    map: Option<&BTreeMap<String, Vec<String>>>,
) -> u64 {
    match map {
        Some(map) => {
            sizer.size_of_map(map.len())
                + map
                    .iter()
                    .map(|(k, values)| {
                        sizer.size_of_string(k)
                            + sizer.size_of_array(values.len())
                            + values.iter().map(|v| sizer.size_of_string(v)).sum::<u64>()
                    })
                    .sum::<u64>()
        }
        None => 0,
    }
}
