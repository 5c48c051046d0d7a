//! Sentinel-encoded timer fields used by older producers.
//!
//! Legacy producers send flat doubles where "never measured" is encoded
//! in-band: `min` starts at `f64::MAX`, `max` at `0`, and a finalized
//! aggregate that never saw CPU or exclusive data reports `-1` for those
//! fields. Averages that could not be computed are `NaN`. This module is
//! the only place those sentinels exist; everything else uses `Option`.

use super::identity::SampleIdentity;
use super::invocation_aware::InvocationAwareData;
use super::timer::{CpuStats, ExclusiveStats, TimerSample};
use crate::utils::config::NOT_APPLICABLE;
use serde::{Deserialize, Serialize};

/// `min` of a value that was never updated
pub const UNMEASURED_MIN: f64 = f64::MAX;

/// `max` of a value that was never updated
pub const UNMEASURED_MAX: f64 = 0.0;

/// Flat, sentinel-encoded timer fields
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LegacyTimerFields {
    pub count: u64,
    pub duration: f64,
    pub min: f64,
    pub max: f64,
    pub average: f64,
    pub cpu_duration: f64,
    pub cpu_min: f64,
    pub cpu_max: f64,
    pub cpu_average: f64,
    pub exclusive_count: u64,
    pub exclusive_duration: f64,
    pub exclusive_min: f64,
    pub exclusive_max: f64,
    pub exclusive_average: f64,
}

impl LegacyTimerFields {
    /// Whether the CPU fields hold real measurements
    pub fn is_cpu_available(&self) -> bool {
        self.cpu_duration >= 0.0 && self.cpu_min != UNMEASURED_MIN
    }

    /// Whether the exclusive fields hold real measurements
    ///
    /// Exclusive values may legitimately be negative, so only the count
    /// tells measured data apart from sentinels.
    pub fn is_exclusive_available(&self) -> bool {
        self.exclusive_count > 0
    }

    /// Whether `min`/`max` were ever updated
    pub fn is_measured(&self) -> bool {
        self.min != UNMEASURED_MIN
    }
}

fn average_or_nan(average: Option<f64>) -> f64 {
    average.unwrap_or(f64::NAN)
}

fn finite(value: f64) -> Option<f64> {
    value.is_finite().then_some(value)
}

impl TimerSample {
    /// Encode this sample the way sentinel-speaking consumers expect
    pub fn to_legacy(&self) -> LegacyTimerFields {
        let unavailable = |unmeasured: f64| {
            if self.is_finalized() {
                NOT_APPLICABLE
            } else {
                unmeasured
            }
        };

        let (cpu_duration, cpu_min, cpu_max, cpu_average) = match &self.cpu {
            Some(cpu) => (cpu.duration, cpu.min, cpu.max, average_or_nan(cpu.average)),
            None => (
                unavailable(0.0),
                unavailable(UNMEASURED_MIN),
                unavailable(UNMEASURED_MAX),
                unavailable(f64::NAN),
            ),
        };

        let (exclusive_count, exclusive_duration, exclusive_min, exclusive_max, exclusive_average) =
            match &self.exclusive {
                Some(ex) => (ex.count, ex.duration, ex.min, ex.max, average_or_nan(ex.average)),
                None => (
                    0,
                    unavailable(0.0),
                    unavailable(UNMEASURED_MIN),
                    unavailable(UNMEASURED_MAX),
                    unavailable(f64::NAN),
                ),
            };

        LegacyTimerFields {
            count: self.count,
            duration: self.duration,
            min: self.min.unwrap_or(UNMEASURED_MIN),
            max: self.max.unwrap_or(UNMEASURED_MAX),
            average: average_or_nan(self.average),
            cpu_duration,
            cpu_min,
            cpu_max,
            cpu_average,
            exclusive_count,
            exclusive_duration,
            exclusive_min,
            exclusive_max,
            exclusive_average,
        }
    }

    /// Decode sentinel-encoded fields received from a legacy producer
    pub fn from_legacy(identity: SampleIdentity, fields: &LegacyTimerFields) -> Self {
        let measured = fields.is_measured();

        let cpu = fields.is_cpu_available().then(|| CpuStats {
            duration: fields.cpu_duration,
            min: fields.cpu_min,
            max: fields.cpu_max,
            average: finite(fields.cpu_average),
        });

        let exclusive = fields.is_exclusive_available().then(|| ExclusiveStats {
            count: fields.exclusive_count,
            duration: fields.exclusive_duration,
            min: fields.exclusive_min,
            max: fields.exclusive_max,
            average: finite(fields.exclusive_average),
        });

        let mut sample = TimerSample::with_totals(identity, 0, fields.duration, 0.0, 0.0);
        sample.count = fields.count;
        sample.min = measured.then_some(fields.min);
        sample.max = measured.then_some(fields.max);
        sample.cpu = cpu;
        sample.exclusive = exclusive;
        sample.invocation = InvocationAwareData::default();

        // a legacy average is only meaningful once computed
        if let Some(average) = finite(fields.average) {
            sample.finalize();
            sample.average = Some(average);
        }
        sample
    }
}
