//! Aggregation of exception lifecycle events.
//!
//! Events are counted per lifecycle stage. Kinds this version does not
//! know (`EventKind::Unknown`) are skipped without error so that older
//! collectors keep working when producers add new kinds.

use super::merge::{Aggregatable, Aggregate};
use crate::model::{EventKind, ExceptionEvent, ExceptionOverviewKey, InvocationAwareData, SampleIdentity};
use crate::sizing::{self, EstimatedSize, MemorySizer};
use serde::{Deserialize, Serialize};

/// Per-throwable counters of lifecycle events
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ExceptionSummary {
    pub identity: SampleIdentity,

    #[serde(default)]
    pub invocation: InvocationAwareData,

    pub throwable_type: String,

    /// Message of the first event folded in
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cause: Option<String>,

    pub created: u64,

    pub passed_or_rethrown: u64,

    pub handled: u64,
}

impl ExceptionSummary {
    /// Overview-mode key: throwable type and message
    pub fn overview_key_of(event: &ExceptionEvent) -> ExceptionOverviewKey {
        event.overview_key()
    }

    fn count_event(&mut self, event: &ExceptionEvent) {
        let counter = match event.event_kind {
            EventKind::Created => &mut self.created,
            EventKind::Passed | EventKind::Rethrown => &mut self.passed_or_rethrown,
            EventKind::Handled => &mut self.handled,
            EventKind::Unknown => return,
        };
        *counter += 1;

        self.invocation.merge(&event.invocation);
        if self.error_message.is_none() {
            self.error_message = event.error_message.clone();
        }
        if self.cause.is_none() {
            self.cause = event.cause.clone();
        }
    }
}

impl Aggregatable for ExceptionSummary {
    type Sample = ExceptionEvent;
    type Key = ExceptionOverviewKey;

    /// Grouped by throwable type alone
    fn key_of(event: &ExceptionEvent) -> ExceptionOverviewKey {
        ExceptionOverviewKey {
            throwable_type: event.throwable_type.clone(),
            error_message: None,
        }
    }

    fn empty_like(event: &ExceptionEvent) -> Self {
        Self {
            identity: event.identity.for_aggregate(),
            invocation: InvocationAwareData::default(),
            throwable_type: event.throwable_type.clone(),
            error_message: None,
            cause: None,
            created: 0,
            passed_or_rethrown: 0,
            handled: 0,
        }
    }

    fn sample_id(event: &ExceptionEvent) -> u64 {
        event.identity.id
    }

    fn accepts(event: &ExceptionEvent) -> bool {
        event.event_kind != EventKind::Unknown
    }

    fn fold(&mut self, event: &ExceptionEvent) {
        self.count_event(event);
    }

    fn combine(&mut self, other: &Self) {
        self.created += other.created;
        self.passed_or_rethrown += other.passed_or_rethrown;
        self.handled += other.handled;
        self.invocation.merge(&other.invocation);
        if self.error_message.is_none() {
            self.error_message = other.error_message.clone();
        }
        if self.cause.is_none() {
            self.cause = other.cause.clone();
        }
    }

    /// Counters need no derived values
    fn finalize(&mut self) {}

    fn count(&self) -> u64 {
        self.created + self.passed_or_rethrown + self.handled
    }
}

impl Aggregate<ExceptionSummary> {
    /// Fold `event` and every later event of its throwable
    pub fn merge_chain(&mut self, event: &ExceptionEvent) {
        for link in event.lifecycle() {
            self.merge(link);
        }
    }
}

impl EstimatedSize for ExceptionSummary {
    fn estimated_size(&self, sizer: &dyn MemorySizer, align: bool) -> u64 {
        let mut size = self.identity.estimated_size(sizer, false);
        size += self.invocation.estimated_size(sizer, false);
        // three counters; type, message, cause
        size += sizer.primitive_sizes(0, 0, 0, 0, 6, 0);
        size += sizer.size_of_string(&self.throwable_type);
        size += sizing::opt_string(sizer, self.error_message.as_deref());
        size += sizing::opt_string(sizer, self.cause.as_deref());
        sizing::finish(sizer, size, align)
    }
}
