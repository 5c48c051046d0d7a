//! Timing samples: count, total duration and extremes of a measured method.
//!
//! Values that were never measured are `None` rather than a magic number.
//! The sentinel encoding older producers use lives in `model::legacy`.

use super::identity::SampleIdentity;
use super::invocation_aware::InvocationAwareData;
use crate::sizing::{self, EstimatedSize, MemorySizer};
use serde::{Deserialize, Serialize};
use std::hash::{Hash, Hasher};

/// Smaller of two optional extremes, ignoring unmeasured operands
pub(crate) fn min_of(a: Option<f64>, b: Option<f64>) -> Option<f64> {
    match (a, b) {
        (Some(a), Some(b)) => Some(a.min(b)),
        (a, b) => a.or(b),
    }
}

/// Larger of two optional extremes, ignoring unmeasured operands
pub(crate) fn max_of(a: Option<f64>, b: Option<f64>) -> Option<f64> {
    match (a, b) {
        (Some(a), Some(b)) => Some(a.max(b)),
        (a, b) => a.or(b),
    }
}

fn bits(value: Option<f64>) -> Option<u64> {
    value.map(f64::to_bits)
}

/// Running totals of CPU time
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct CpuStats {
    /// Summed CPU duration
    pub duration: f64,

    pub min: f64,

    pub max: f64,

    /// Set by `finalize`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub average: Option<f64>,
}

impl CpuStats {
    /// Stats for a single CPU measurement
    pub fn single(value: f64) -> Self {
        Self {
            duration: value,
            min: value,
            max: value,
            average: None,
        }
    }

    fn observe(&mut self, value: f64) {
        self.duration += value;
        self.min = self.min.min(value);
        self.max = self.max.max(value);
        self.average = None;
    }

    fn merge(&mut self, other: &CpuStats) {
        self.duration += other.duration;
        self.min = self.min.min(other.min);
        self.max = self.max.max(other.max);
        self.average = None;
    }
}

impl PartialEq for CpuStats {
    fn eq(&self, other: &Self) -> bool {
        self.duration.to_bits() == other.duration.to_bits()
            && self.min.to_bits() == other.min.to_bits()
            && self.max.to_bits() == other.max.to_bits()
            && bits(self.average) == bits(other.average)
    }
}

impl Eq for CpuStats {}

impl Hash for CpuStats {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.duration.to_bits().hash(state);
        self.min.to_bits().hash(state);
        self.max.to_bits().hash(state);
        bits(self.average).hash(state);
    }
}

/// Running totals of exclusive time (own time minus nested calls)
///
/// Exclusive values may be negative when parent and child clocks disagree.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct ExclusiveStats {
    pub count: u64,

    /// Summed exclusive duration
    pub duration: f64,

    pub min: f64,

    pub max: f64,

    /// Set by `finalize`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub average: Option<f64>,
}

impl ExclusiveStats {
    /// Stats for a single exclusive measurement
    pub fn single(value: f64) -> Self {
        Self {
            count: 1,
            duration: value,
            min: value,
            max: value,
            average: None,
        }
    }

    fn observe(&mut self, value: f64) {
        self.count += 1;
        self.duration += value;
        self.min = self.min.min(value);
        self.max = self.max.max(value);
        self.average = None;
    }

    fn merge(&mut self, other: &ExclusiveStats) {
        self.count += other.count;
        self.duration += other.duration;
        self.min = self.min.min(other.min);
        self.max = self.max.max(other.max);
        self.average = None;
    }
}

impl PartialEq for ExclusiveStats {
    fn eq(&self, other: &Self) -> bool {
        self.count == other.count
            && self.duration.to_bits() == other.duration.to_bits()
            && self.min.to_bits() == other.min.to_bits()
            && self.max.to_bits() == other.max.to_bits()
            && bits(self.average) == bits(other.average)
    }
}

impl Eq for ExclusiveStats {}

impl Hash for ExclusiveStats {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.count.hash(state);
        self.duration.to_bits().hash(state);
        self.min.to_bits().hash(state);
        self.max.to_bits().hash(state);
        bits(self.average).hash(state);
    }
}

/// Timing sample for one method, possibly pre-aggregated by the agent
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimerSample {
    pub identity: SampleIdentity,

    /// Number of measurements folded into this sample
    #[serde(default)]
    pub count: u64,

    /// Summed duration
    #[serde(default)]
    pub duration: f64,

    #[serde(default)]
    pub min: Option<f64>,

    #[serde(default)]
    pub max: Option<f64>,

    /// Set by `finalize`, never maintained incrementally
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub average: Option<f64>,

    /// CPU timing, absent when the agent does not measure it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cpu: Option<CpuStats>,

    /// Exclusive timing, absent when never computed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exclusive: Option<ExclusiveStats>,

    #[serde(default)]
    pub invocation: InvocationAwareData,

    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    finalized: bool,
}

impl TimerSample {
    /// Empty sample: nothing measured yet
    pub fn new(identity: SampleIdentity) -> Self {
        Self {
            identity,
            count: 0,
            duration: 0.0,
            min: None,
            max: None,
            average: None,
            cpu: None,
            exclusive: None,
            invocation: InvocationAwareData::default(),
            finalized: false,
        }
    }

    /// Sample holding a single measurement
    pub fn single(identity: SampleIdentity, duration: f64) -> Self {
        let mut sample = Self::new(identity);
        sample.add_measurement(duration);
        sample
    }

    /// Sample holding pre-aggregated totals
    pub fn with_totals(identity: SampleIdentity, count: u64, duration: f64, min: f64, max: f64) -> Self {
        let mut sample = Self::new(identity);
        sample.count = count;
        sample.duration = duration;
        if count > 0 {
            sample.min = Some(min);
            sample.max = Some(max);
        }
        sample
    }

    /// Builder-style CPU measurement
    pub fn with_cpu(mut self, cpu_duration: f64) -> Self {
        self.add_cpu_measurement(cpu_duration);
        self
    }

    /// Fold one wall-clock measurement into this sample
    pub fn add_measurement(&mut self, duration: f64) {
        self.count += 1;
        self.duration += duration;
        self.min = min_of(self.min, Some(duration));
        self.max = max_of(self.max, Some(duration));
        self.clear_finalized();
    }

    /// Fold one CPU measurement into this sample
    pub fn add_cpu_measurement(&mut self, cpu_duration: f64) {
        match &mut self.cpu {
            Some(cpu) => cpu.observe(cpu_duration),
            None => self.cpu = Some(CpuStats::single(cpu_duration)),
        }
        self.clear_finalized();
    }

    /// Fold one exclusive-time measurement into this sample
    pub fn add_exclusive_measurement(&mut self, exclusive: f64) {
        match &mut self.exclusive {
            Some(stats) => stats.observe(exclusive),
            None => self.exclusive = Some(ExclusiveStats::single(exclusive)),
        }
        self.clear_finalized();
    }

    pub fn is_cpu_available(&self) -> bool {
        self.cpu.is_some()
    }

    pub fn is_exclusive_available(&self) -> bool {
        self.exclusive.is_some()
    }

    /// Whether `finalize` ran since the last change
    pub fn is_finalized(&self) -> bool {
        self.finalized
    }

    /// Add another sample's totals to this one
    ///
    /// Additive: folding the same sample twice counts it twice. CPU and
    /// exclusive totals are only touched when `other` carries them.
    pub fn merge(&mut self, other: &TimerSample) {
        self.count += other.count;
        self.duration += other.duration;
        self.min = min_of(self.min, other.min);
        self.max = max_of(self.max, other.max);

        if let Some(other_cpu) = &other.cpu {
            match &mut self.cpu {
                Some(cpu) => cpu.merge(other_cpu),
                None => {
                    self.cpu = Some(CpuStats {
                        average: None,
                        ..*other_cpu
                    })
                }
            }
        }

        if let Some(other_exclusive) = &other.exclusive {
            match &mut self.exclusive {
                Some(exclusive) => exclusive.merge(other_exclusive),
                None => {
                    self.exclusive = Some(ExclusiveStats {
                        average: None,
                        ..*other_exclusive
                    })
                }
            }
        }

        self.invocation.merge(&other.invocation);
        self.clear_finalized();
    }

    /// Compute the derived averages
    ///
    /// A zero count leaves the average unset instead of dividing by zero.
    pub fn finalize(&mut self) {
        self.average = if self.count > 0 {
            Some(self.duration / self.count as f64)
        } else {
            None
        };

        let count = self.count;
        if let Some(cpu) = &mut self.cpu {
            cpu.average = (count > 0).then(|| cpu.duration / count as f64);
        }
        if let Some(exclusive) = &mut self.exclusive {
            exclusive.average =
                (exclusive.count > 0).then(|| exclusive.duration / exclusive.count as f64);
        }

        self.finalized = true;
    }

    fn clear_finalized(&mut self) {
        self.finalized = false;
        self.average = None;
    }
}

impl PartialEq for TimerSample {
    fn eq(&self, other: &Self) -> bool {
        self.identity == other.identity
            && self.count == other.count
            && self.duration.to_bits() == other.duration.to_bits()
            && bits(self.min) == bits(other.min)
            && bits(self.max) == bits(other.max)
            && bits(self.average) == bits(other.average)
            && self.cpu == other.cpu
            && self.exclusive == other.exclusive
            && self.invocation == other.invocation
    }
}

impl Eq for TimerSample {}

impl Hash for TimerSample {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.identity.hash(state);
        self.count.hash(state);
        self.duration.to_bits().hash(state);
        bits(self.min).hash(state);
        bits(self.max).hash(state);
        bits(self.average).hash(state);
        self.cpu.hash(state);
        self.exclusive.hash(state);
        self.invocation.hash(state);
    }
}

impl EstimatedSize for TimerSample {
    fn estimated_size(&self, sizer: &dyn MemorySizer, align: bool) -> u64 {
        let mut size = self.identity.estimated_size(sizer, false);
        size += self.invocation.estimated_size(sizer, false);
        // finalized flag; count, exclusive count; duration/min/max/average
        // for wall, cpu and exclusive time
        size += sizer.primitive_sizes(1, 0, 0, 0, 2, 12);
        sizing::finish(sizer, size, align)
    }
}
