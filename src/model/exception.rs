//! Exception lifecycle events.
//!
//! A throwable produces a chain of events: it is created, passed up or
//! rethrown through frames, and eventually handled. Each event owns the
//! next one in its `child` link.

use super::identity::SampleIdentity;
use super::invocation_aware::InvocationAwareData;
use crate::sizing::{self, EstimatedSize, MemorySizer};
use serde::{Deserialize, Serialize};
use std::hash::{Hash, Hasher};

/// Stage of a throwable's lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    Created,
    Passed,
    Rethrown,
    Handled,
    /// Kind introduced by a newer producer
    #[serde(other)]
    Unknown,
}

/// One event in a throwable's lifecycle
///
/// Clone, equality and hashing walk the `child` chain in a loop, so chain
/// length is bounded by memory rather than by the call stack.
#[derive(Debug, Serialize, Deserialize)]
pub struct ExceptionEvent {
    pub identity: SampleIdentity,

    #[serde(default)]
    pub invocation: InvocationAwareData,

    /// Fully qualified throwable class name
    pub throwable_type: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stack_trace: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cause: Option<String>,

    pub event_kind: EventKind,

    /// Identity hash of the throwable object, shared by its whole chain
    #[serde(default)]
    pub identity_hash: u32,

    /// Next event for the same throwable
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub child: Option<Box<ExceptionEvent>>,
}

/// Grouping key for the exception overview: type and message only
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ExceptionOverviewKey {
    pub throwable_type: String,
    pub error_message: Option<String>,
}

impl ExceptionEvent {
    pub fn new(identity: SampleIdentity, throwable_type: impl Into<String>, event_kind: EventKind) -> Self {
        Self {
            identity,
            invocation: InvocationAwareData::default(),
            throwable_type: throwable_type.into(),
            error_message: None,
            stack_trace: None,
            cause: None,
            event_kind,
            identity_hash: 0,
            child: None,
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.error_message = Some(message.into());
        self
    }

    pub fn with_stack_trace(mut self, stack_trace: impl Into<String>) -> Self {
        self.stack_trace = Some(stack_trace.into());
        self
    }

    pub fn with_cause(mut self, cause: impl Into<String>) -> Self {
        self.cause = Some(cause.into());
        self
    }

    /// Attach `child` as the next event of this throwable
    pub fn with_child(mut self, child: ExceptionEvent) -> Self {
        self.child = Some(Box::new(child));
        self
    }

    /// This event followed by every later event of the same throwable
    pub fn lifecycle(&self) -> Lifecycle<'_> {
        Lifecycle { next: Some(self) }
    }

    /// Overview grouping key
    pub fn overview_key(&self) -> ExceptionOverviewKey {
        ExceptionOverviewKey {
            throwable_type: self.throwable_type.clone(),
            error_message: self.error_message.clone(),
        }
    }

    /// Equality used by the exception overview
    ///
    /// Narrower than `==`: two events are the same overview
    /// row when throwable type and message match, whatever their ids,
    /// kinds, stack traces or chains.
    pub fn overview_eq(&self, other: &ExceptionEvent) -> bool {
        self.throwable_type == other.throwable_type && self.error_message == other.error_message
    }

    /// Copy of this event alone, without the child chain
    fn shallow_clone(&self) -> Self {
        Self {
            identity: self.identity.clone(),
            invocation: self.invocation.clone(),
            throwable_type: self.throwable_type.clone(),
            error_message: self.error_message.clone(),
            stack_trace: self.stack_trace.clone(),
            cause: self.cause.clone(),
            event_kind: self.event_kind,
            identity_hash: self.identity_hash,
            child: None,
        }
    }

    fn shallow_eq(&self, other: &Self) -> bool {
        self.identity == other.identity
            && self.invocation == other.invocation
            && self.throwable_type == other.throwable_type
            && self.error_message == other.error_message
            && self.stack_trace == other.stack_trace
            && self.cause == other.cause
            && self.event_kind == other.event_kind
            && self.identity_hash == other.identity_hash
    }

    fn shallow_hash<H: Hasher>(&self, state: &mut H) {
        self.identity.hash(state);
        self.invocation.hash(state);
        self.throwable_type.hash(state);
        self.error_message.hash(state);
        self.stack_trace.hash(state);
        self.cause.hash(state);
        self.event_kind.hash(state);
        self.identity_hash.hash(state);
    }

    /// Size of this event alone, without the child chain
    fn shallow_size(&self, sizer: &dyn MemorySizer) -> u64 {
        let mut size = self.identity.estimated_size(sizer, false);
        size += self.invocation.estimated_size(sizer, false);
        // identity hash; type, message, stack trace, cause, kind, child
        size += sizer.primitive_sizes(0, 0, 0, 1, 6, 0);
        size += sizer.size_of_string(&self.throwable_type);
        size += sizing::opt_string(sizer, self.error_message.as_deref());
        size += sizing::opt_string(sizer, self.stack_trace.as_deref());
        size += sizing::opt_string(sizer, self.cause.as_deref());
        size
    }
}

impl Clone for ExceptionEvent {
    // rebuild from the tail so every link is boxed before its parent
    fn clone(&self) -> Self {
        let links: Vec<&ExceptionEvent> = self.lifecycle().collect();
        let mut next: Option<Box<ExceptionEvent>> = None;
        for link in links.iter().skip(1).rev() {
            let mut copy = link.shallow_clone();
            copy.child = next;
            next = Some(Box::new(copy));
        }
        let mut head = self.shallow_clone();
        head.child = next;
        head
    }
}

impl PartialEq for ExceptionEvent {
    fn eq(&self, other: &Self) -> bool {
        let mut left = self.lifecycle();
        let mut right = other.lifecycle();
        loop {
            match (left.next(), right.next()) {
                (Some(a), Some(b)) if a.shallow_eq(b) => continue,
                (None, None) => return true,
                _ => return false,
            }
        }
    }
}

impl Eq for ExceptionEvent {}

impl Hash for ExceptionEvent {
    fn hash<H: Hasher>(&self, state: &mut H) {
        let mut links = 0usize;
        for link in self.lifecycle() {
            link.shallow_hash(state);
            links += 1;
        }
        links.hash(state);
    }
}

impl Drop for ExceptionEvent {
    // unlink the chain iteratively so long chains cannot exhaust the stack
    fn drop(&mut self) {
        let mut next = self.child.take();
        while let Some(mut event) = next {
            next = event.child.take();
        }
    }
}

/// Iterator over a throwable's lifecycle chain
pub struct Lifecycle<'a> {
    next: Option<&'a ExceptionEvent>,
}

impl<'a> Iterator for Lifecycle<'a> {
    type Item = &'a ExceptionEvent;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next?;
        self.next = current.child.as_deref();
        Some(current)
    }
}

impl EstimatedSize for ExceptionEvent {
    fn estimated_size(&self, sizer: &dyn MemorySizer, align: bool) -> u64 {
        let size = self.lifecycle().map(|event| event.shallow_size(sizer)).sum();
        sizing::finish(sizer, size, align)
    }
}
