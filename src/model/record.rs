//! The closed set of raw measurement kinds.

use super::exception::ExceptionEvent;
use super::http::HttpSample;
use super::identity::SampleIdentity;
use super::invocation_aware::InvocationAwareData;
use super::sql::SqlSample;
use super::timer::TimerSample;
use crate::sizing::{EstimatedSize, MemorySizer};
use serde::{Deserialize, Serialize};

/// One raw observation produced by an agent
///
/// Two records are equal only when they are the same variant with equal
/// payloads.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MeasurementRecord {
    Timer(TimerSample),
    Sql(SqlSample),
    Http(HttpSample),
    Exception(ExceptionEvent),
}

impl MeasurementRecord {
    pub fn identity(&self) -> &SampleIdentity {
        match self {
            MeasurementRecord::Timer(timer) => &timer.identity,
            MeasurementRecord::Sql(sql) => &sql.timer.identity,
            MeasurementRecord::Http(http) => &http.timer.identity,
            MeasurementRecord::Exception(event) => &event.identity,
        }
    }

    pub fn invocation(&self) -> &InvocationAwareData {
        match self {
            MeasurementRecord::Timer(timer) => &timer.invocation,
            MeasurementRecord::Sql(sql) => &sql.timer.invocation,
            MeasurementRecord::Http(http) => &http.timer.invocation,
            MeasurementRecord::Exception(event) => &event.invocation,
        }
    }

    pub fn invocation_mut(&mut self) -> &mut InvocationAwareData {
        match self {
            MeasurementRecord::Timer(timer) => &mut timer.invocation,
            MeasurementRecord::Sql(sql) => &mut sql.timer.invocation,
            MeasurementRecord::Http(http) => &mut http.timer.invocation,
            MeasurementRecord::Exception(event) => &mut event.invocation,
        }
    }

    /// Short name of the variant, for logs and reports
    pub fn kind_name(&self) -> &'static str {
        match self {
            MeasurementRecord::Timer(_) => "timer",
            MeasurementRecord::Sql(_) => "sql",
            MeasurementRecord::Http(_) => "http",
            MeasurementRecord::Exception(_) => "exception",
        }
    }
}

impl EstimatedSize for MeasurementRecord {
    fn estimated_size(&self, sizer: &dyn MemorySizer, align: bool) -> u64 {
        match self {
            MeasurementRecord::Timer(timer) => timer.estimated_size(sizer, align),
            MeasurementRecord::Sql(sql) => sql.estimated_size(sizer, align),
            MeasurementRecord::Http(http) => http.estimated_size(sizer, align),
            MeasurementRecord::Exception(event) => event.estimated_size(sizer, align),
        }
    }
}

impl From<TimerSample> for MeasurementRecord {
    fn from(sample: TimerSample) -> Self {
        MeasurementRecord::Timer(sample)
    }
}

impl From<SqlSample> for MeasurementRecord {
    fn from(sample: SqlSample) -> Self {
        MeasurementRecord::Sql(sample)
    }
}

impl From<HttpSample> for MeasurementRecord {
    fn from(sample: HttpSample) -> Self {
        MeasurementRecord::Http(sample)
    }
}

impl From<ExceptionEvent> for MeasurementRecord {
    fn from(event: ExceptionEvent) -> Self {
        MeasurementRecord::Exception(event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::EventKind;

    #[test]
    fn test_variant_tag_takes_part_in_equality() {
        let identity = SampleIdentity::new(1, 2, 3);
        let timer = TimerSample::single(identity.clone(), 5.0);
        let sql = SqlSample::new(timer.clone(), "SELECT 1");

        let a = MeasurementRecord::from(timer.clone());
        let b = MeasurementRecord::from(sql);
        assert_ne!(a, b);
        assert_eq!(a, MeasurementRecord::Timer(timer));
    }

    #[test]
    fn test_invocation_mut_reaches_payload() {
        let identity = SampleIdentity::new(1, 2, 3);
        let mut record = MeasurementRecord::from(ExceptionEvent::new(identity, "E", EventKind::Created));
        record.invocation_mut().record_parent(11);
        assert_eq!(record.invocation().in_invocation_count, 1);
        assert_eq!(record.kind_name(), "exception");
    }
}
