//! Memory-model constants used to estimate record footprints.
//!
//! `MemorySizer` is the seam the external buffer plugs its own memory
//! model into. `ObjectSizes` is the stock implementation modelled on a
//! JVM heap layout, in 32-bit, 64-bit and 64-bit compressed-reference
//! variants.

use serde::{Deserialize, Serialize};

/// Size of one slot in the `long_or_ref` and `double` primitive buckets
const WIDE_SLOT: u64 = 8;

/// HashMap default load factor, as numerator/denominator
const LOAD_FACTOR_NUM: u64 = 3;
const LOAD_FACTOR_DEN: u64 = 4;

/// HashMap minimum table capacity once the table is allocated
const MIN_TABLE_CAPACITY: u64 = 16;

/// Memory-model constants consulted by `EstimatedSize` implementations
///
/// None of the container methods align their result; only the outermost
/// `estimated_size` call aligns, via `align`.
pub trait MemorySizer {
    /// Size of a bare object header
    fn object_header(&self) -> u64;

    /// Summed size of declared fields, bucketed by primitive kind
    ///
    /// Buckets: booleans, bytes, chars, ints (and floats), longs or
    /// references, doubles.
    fn primitive_sizes(
        &self,
        bool_n: u64,
        byte_n: u64,
        char_n: u64,
        int_n: u64,
        long_or_ref_n: u64,
        double_n: u64,
    ) -> u64;

    /// Size of an array holding `len` references
    fn size_of_array(&self, len: usize) -> u64;

    /// Overhead of a hash map with `len` entries, excluding keys and values
    fn size_of_map(&self, len: usize) -> u64;

    /// Overhead of a hash set with `len` entries, excluding the elements
    fn size_of_set(&self, len: usize) -> u64;

    /// Size of a string object including its character storage
    fn size_of_string(&self, s: &str) -> u64;

    /// Round `size` up to the alignment boundary
    fn align(&self, size: u64) -> u64;
}

/// Predefined memory models
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SizerProfile {
    /// 32-bit heap, 4 byte references
    #[serde(rename = "bits32")]
    Bits32,

    /// 64-bit heap, 8 byte references
    #[serde(rename = "bits64")]
    Bits64,

    /// 64-bit heap with compressed 4 byte references
    #[default]
    #[serde(rename = "bits64-compressed")]
    Bits64Compressed,
}

/// Stock `MemorySizer` with tunable constants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectSizes {
    /// Bytes in an object header
    pub object_header: u64,

    /// Bytes in a reference held inside an array
    pub reference_size: u64,

    /// Bytes in an array header, length field included
    pub array_header: u64,

    /// Alignment boundary in bytes
    pub alignment: u64,
}

impl ObjectSizes {
    /// Constants for one of the predefined memory models
    pub fn for_profile(profile: SizerProfile) -> Self {
        match profile {
            SizerProfile::Bits32 => Self {
                object_header: 8,
                reference_size: 4,
                array_header: 12,
                alignment: 8,
            },
            SizerProfile::Bits64 => Self {
                object_header: 16,
                reference_size: 8,
                array_header: 24,
                alignment: 8,
            },
            SizerProfile::Bits64Compressed => Self {
                object_header: 12,
                reference_size: 4,
                array_header: 16,
                alignment: 8,
            },
        }
    }

    /// Table capacity a hash map grows to for `len` entries
    fn table_capacity(len: usize) -> u64 {
        let needed = (len as u64 * LOAD_FACTOR_DEN).div_ceil(LOAD_FACTOR_NUM);
        needed.next_power_of_two().max(MIN_TABLE_CAPACITY)
    }
}

impl Default for ObjectSizes {
    fn default() -> Self {
        Self::for_profile(SizerProfile::default())
    }
}

impl MemorySizer for ObjectSizes {
    fn object_header(&self) -> u64 {
        self.object_header
    }

    fn primitive_sizes(
        &self,
        bool_n: u64,
        byte_n: u64,
        char_n: u64,
        int_n: u64,
        long_or_ref_n: u64,
        double_n: u64,
    ) -> u64 {
        bool_n + byte_n + char_n * 2 + int_n * 4 + long_or_ref_n * WIDE_SLOT + double_n * WIDE_SLOT
    }

    fn size_of_array(&self, len: usize) -> u64 {
        self.array_header + len as u64 * self.reference_size
    }

    fn size_of_map(&self, len: usize) -> u64 {
        // size, modCount, threshold, loadFactor + table, entrySet, keySet
        let mut size = self.object_header + self.primitive_sizes(0, 0, 0, 4, 3, 0);
        if len > 0 {
            let capacity = Self::table_capacity(len);
            size += self.array_header + capacity * self.reference_size;
            // hash + key, value, next
            let entry = self.object_header + self.primitive_sizes(0, 0, 0, 1, 3, 0);
            size += len as u64 * entry;
        }
        size
    }

    fn size_of_set(&self, len: usize) -> u64 {
        self.object_header + self.primitive_sizes(0, 0, 0, 0, 1, 0) + self.size_of_map(len)
    }

    fn size_of_string(&self, s: &str) -> u64 {
        // hash + value
        let object = self.object_header + self.primitive_sizes(0, 0, 0, 1, 1, 0);
        let chars = s.encode_utf16().count() as u64;
        object + self.array_header + self.primitive_sizes(0, 0, chars, 0, 0, 0)
    }

    fn align(&self, size: u64) -> u64 {
        if self.alignment == 0 {
            return size;
        }
        size.div_ceil(self.alignment) * self.alignment
    }
}
