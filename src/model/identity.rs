//! Identity fields shared by every record.

use crate::sizing::{self, EstimatedSize, MemorySizer};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Who produced a record, for which method, and when
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SampleIdentity {
    /// Record id, 0 for records not yet persisted (and for aggregates)
    #[serde(default)]
    pub id: u64,

    /// Agent/platform that produced the record
    #[serde(default)]
    pub platform_ident: u64,

    /// Sensor type that produced the record
    #[serde(default)]
    pub sensor_type_ident: u64,

    /// Instrumented method
    #[serde(default)]
    pub method_ident: u64,

    /// Time the record was taken
    #[serde(default = "Utc::now")]
    pub timestamp: DateTime<Utc>,
}

impl SampleIdentity {
    pub fn new(platform_ident: u64, sensor_type_ident: u64, method_ident: u64) -> Self {
        Self {
            id: 0,
            platform_ident,
            sensor_type_ident,
            method_ident,
            timestamp: Utc::now(),
        }
    }

    /// Builder-style id setter
    pub fn with_id(mut self, id: u64) -> Self {
        self.id = id;
        self
    }

    /// Builder-style timestamp setter
    pub fn at(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }

    /// Identity an aggregate inherits from its first sample: same origin, no id
    pub fn for_aggregate(&self) -> Self {
        Self {
            id: 0,
            ..self.clone()
        }
    }
}

impl EstimatedSize for SampleIdentity {
    fn estimated_size(&self, sizer: &dyn MemorySizer, align: bool) -> u64 {
        // id, platform, sensor type, method + timestamp reference
        let mut size = sizer.object_header() + sizer.primitive_sizes(0, 0, 0, 0, 5, 0);
        // timestamp object: millis + nanos
        size += sizer.object_header() + sizer.primitive_sizes(0, 0, 0, 1, 1, 0);
        sizing::finish(sizer, size, align)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sizing::ObjectSizes;

    #[test]
    fn test_for_aggregate_drops_id() {
        let identity = SampleIdentity::new(1, 2, 3).with_id(42);
        let aggregate = identity.for_aggregate();
        assert_eq!(aggregate.id, 0);
        assert_eq!(aggregate.method_ident, 3);
        assert_eq!(aggregate.timestamp, identity.timestamp);
    }

    #[test]
    fn test_identity_size() {
        let sizes = ObjectSizes::default();
        let identity = SampleIdentity::new(1, 2, 3);
        // 12 + 40 + 12 + 12
        assert_eq!(identity.estimated_size(&sizes, false), 76);
        assert_eq!(identity.estimated_size(&sizes, true), 80);
    }
}
