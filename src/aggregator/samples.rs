//! Aggregation of timer, SQL and HTTP samples.
//!
//! All three fold the embedded timer totals; they differ in how samples
//! are grouped.

use super::merge::Aggregatable;
use crate::model::{HttpSample, SqlSample, TimerSample};
use serde::{Deserialize, Serialize};

/// Grouping key for SQL aggregates
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SqlKey {
    pub sql: String,
    pub prepared_statement: bool,
}

/// Grouping key for HTTP aggregates
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct HttpKey {
    pub uri: String,
    pub request_method: String,
}

impl Aggregatable for TimerSample {
    type Sample = TimerSample;
    type Key = u64;

    /// Timers are grouped by method
    fn key_of(sample: &TimerSample) -> u64 {
        sample.identity.method_ident
    }

    fn empty_like(sample: &TimerSample) -> Self {
        TimerSample::new(sample.identity.for_aggregate())
    }

    fn sample_id(sample: &TimerSample) -> u64 {
        sample.identity.id
    }

    fn fold(&mut self, sample: &TimerSample) {
        self.merge(sample);
    }

    fn combine(&mut self, other: &Self) {
        self.merge(other);
    }

    fn finalize(&mut self) {
        TimerSample::finalize(self);
    }

    fn count(&self) -> u64 {
        self.count
    }
}

impl Aggregatable for SqlSample {
    type Sample = SqlSample;
    type Key = SqlKey;

    fn key_of(sample: &SqlSample) -> SqlKey {
        SqlKey {
            sql: sample.sql.clone(),
            prepared_statement: sample.prepared_statement,
        }
    }

    /// Bound parameter values differ per execution and are not carried over
    fn empty_like(sample: &SqlSample) -> Self {
        let mut empty = SqlSample::new(
            TimerSample::new(sample.timer.identity.for_aggregate()),
            sample.sql.clone(),
        );
        empty.prepared_statement = sample.prepared_statement;
        empty
    }

    fn sample_id(sample: &SqlSample) -> u64 {
        sample.timer.identity.id
    }

    fn fold(&mut self, sample: &SqlSample) {
        self.timer.merge(&sample.timer);
    }

    fn combine(&mut self, other: &Self) {
        self.timer.merge(&other.timer);
    }

    fn finalize(&mut self) {
        self.timer.finalize();
    }

    fn count(&self) -> u64 {
        self.timer.count
    }
}

impl Aggregatable for HttpSample {
    type Sample = HttpSample;
    type Key = HttpKey;

    fn key_of(sample: &HttpSample) -> HttpKey {
        HttpKey {
            uri: sample.uri().to_string(),
            request_method: sample.request_method.clone(),
        }
    }

    /// Request context maps are per request and are not carried over
    fn empty_like(sample: &HttpSample) -> Self {
        HttpSample::new(
            TimerSample::new(sample.timer.identity.for_aggregate()),
            sample.uri(),
            sample.request_method.clone(),
        )
    }

    fn sample_id(sample: &HttpSample) -> u64 {
        sample.timer.identity.id
    }

    fn fold(&mut self, sample: &HttpSample) {
        self.timer.merge(&sample.timer);
    }

    fn combine(&mut self, other: &Self) {
        self.timer.merge(&other.timer);
    }

    fn finalize(&mut self) {
        self.timer.finalize();
    }

    fn count(&self) -> u64 {
        self.timer.count
    }
}
