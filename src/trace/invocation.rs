//! Invocation trace nodes.
//!
//! A trace is the call tree recorded for one request. Every node owns its
//! nested calls; the upward link is the parent's id only. Nothing in here
//! recurses over the tree, so depth is bounded by memory rather than by
//! the call stack.

use crate::model::{ExceptionEvent, SampleIdentity, SqlSample, TimerSample};
use crate::sizing::{self, EstimatedSize, MemorySizer};
use crate::utils::error::TraceError;
use serde::{Deserialize, Serialize};
use std::hash::{Hash, Hasher};

/// One call in an invocation tree
#[derive(Debug, Serialize, Deserialize)]
pub struct InvocationTrace {
    pub identity: SampleIdentity,

    /// Id of the enclosing call, `None` for a root
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<u64>,

    #[serde(default)]
    pub start: f64,

    #[serde(default)]
    pub end: f64,

    /// Measured wall time of this call
    #[serde(default)]
    pub duration: f64,

    /// Index among the parent's nested calls
    #[serde(default)]
    pub position: u32,

    /// Total number of descendants
    #[serde(default)]
    pub child_count: u64,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub nested: Vec<InvocationTrace>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timer_sample: Option<TimerSample>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sql_sample: Option<SqlSample>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exceptions: Option<Vec<ExceptionEvent>>,
}

impl InvocationTrace {
    /// Root call measured at `duration`
    pub fn new(identity: SampleIdentity, duration: f64) -> Self {
        Self {
            identity,
            parent_id: None,
            start: 0.0,
            end: duration,
            duration,
            position: 0,
            child_count: 0,
            nested: Vec::new(),
            timer_sample: None,
            sql_sample: None,
            exceptions: None,
        }
    }

    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }

    /// Builder-style start/end, updating the measured duration
    pub fn spanning(mut self, start: f64, end: f64) -> Self {
        self.start = start;
        self.end = end;
        self.duration = end - start;
        self
    }

    pub fn with_timer(mut self, timer: TimerSample) -> Self {
        self.timer_sample = Some(timer);
        self
    }

    pub fn with_sql(mut self, sql: SqlSample) -> Self {
        self.sql_sample = Some(sql);
        self
    }

    pub fn with_exception(mut self, event: ExceptionEvent) -> Self {
        self.exceptions.get_or_insert_with(Vec::new).push(event);
        self
    }

    /// Builder-style `push_child`
    pub fn with_child(mut self, child: InvocationTrace) -> Self {
        self.push_child(child);
        self
    }

    /// Append `child` as the last nested call
    ///
    /// Sets the child's parent link and position and adds its subtree to
    /// `child_count`.
    pub fn push_child(&mut self, mut child: InvocationTrace) {
        child.parent_id = Some(self.identity.id);
        child.position = self.nested.len() as u32;
        self.child_count += 1 + child.child_count;
        self.nested.push(child);
    }

    /// Pre-order walk of this node and every descendant, with depths
    ///
    /// The node itself is at depth 0.
    pub fn descendants(&self) -> Descendants<'_> {
        Descendants {
            stack: vec![(0, self)],
        }
    }

    /// Pre-order nodes, failing when the tree is deeper than `max_depth`
    pub fn checked_nodes(&self, max_depth: usize) -> Result<Vec<&InvocationTrace>, TraceError> {
        let mut nodes = Vec::new();
        for (depth, node) in self.descendants() {
            if depth > max_depth {
                return Err(TraceError::TraceTooDeep { limit: max_depth });
            }
            nodes.push(node);
        }
        Ok(nodes)
    }

    /// Deepest nesting level below this node
    pub fn depth(&self) -> usize {
        self.descendants().map(|(depth, _)| depth).max().unwrap_or(0)
    }

    /// Number of nodes in this tree, counted by walking it
    pub fn node_count(&self) -> usize {
        self.descendants().count()
    }

    /// Size of this node alone, without the nested list or any descendant
    pub fn shallow_size(&self, sizer: &dyn MemorySizer) -> u64 {
        let mut size = self.identity.estimated_size(sizer, false);
        // position; child count, parent id, nested, timer, sql, exceptions;
        // start, end, duration
        size += sizer.primitive_sizes(0, 0, 0, 1, 6, 3);
        if let Some(timer) = &self.timer_sample {
            size += timer.estimated_size(sizer, false);
        }
        if let Some(sql) = &self.sql_sample {
            size += sql.estimated_size(sizer, false);
        }
        if let Some(exceptions) = &self.exceptions {
            size += sizer.size_of_array(exceptions.len());
            size += exceptions
                .iter()
                .map(|event| event.estimated_size(sizer, false))
                .sum::<u64>();
        }
        size
    }

    /// Copy of this node alone, with no nested calls
    fn shallow_clone(&self) -> Self {
        Self {
            identity: self.identity.clone(),
            parent_id: self.parent_id,
            start: self.start,
            end: self.end,
            duration: self.duration,
            position: self.position,
            child_count: self.child_count,
            nested: Vec::new(),
            timer_sample: self.timer_sample.clone(),
            sql_sample: self.sql_sample.clone(),
            exceptions: self.exceptions.clone(),
        }
    }

    /// Field-wise comparison of this node alone
    fn shallow_eq(&self, other: &Self) -> bool {
        self.identity == other.identity
            && self.parent_id == other.parent_id
            && self.start.to_bits() == other.start.to_bits()
            && self.end.to_bits() == other.end.to_bits()
            && self.duration.to_bits() == other.duration.to_bits()
            && self.position == other.position
            && self.child_count == other.child_count
            && self.nested.len() == other.nested.len()
            && self.timer_sample == other.timer_sample
            && self.sql_sample == other.sql_sample
            && self.exceptions == other.exceptions
    }

    fn shallow_hash<H: Hasher>(&self, state: &mut H) {
        self.identity.hash(state);
        self.parent_id.hash(state);
        self.start.to_bits().hash(state);
        self.end.to_bits().hash(state);
        self.duration.to_bits().hash(state);
        self.position.hash(state);
        self.child_count.hash(state);
        self.nested.len().hash(state);
        self.timer_sample.hash(state);
        self.sql_sample.hash(state);
        self.exceptions.hash(state);
    }
}

/// Iterator over a subtree in pre-order, yielding `(depth, node)`
pub struct Descendants<'a> {
    stack: Vec<(usize, &'a InvocationTrace)>,
}

impl<'a> Iterator for Descendants<'a> {
    type Item = (usize, &'a InvocationTrace);

    fn next(&mut self) -> Option<Self::Item> {
        let (depth, node) = self.stack.pop()?;
        self.stack
            .extend(node.nested.iter().rev().map(|child| (depth + 1, child)));
        Some((depth, node))
    }
}

impl Clone for InvocationTrace {
    fn clone(&self) -> Self {
        let mut root = self.shallow_clone();

        // pre-order copies of every descendant with the slot of their parent,
        // `None` standing for the root
        let mut copies: Vec<InvocationTrace> = Vec::new();
        let mut parents: Vec<Option<usize>> = Vec::new();
        let mut pending: Vec<(Option<usize>, &InvocationTrace)> =
            self.nested.iter().rev().map(|child| (None, child)).collect();
        while let Some((parent, node)) = pending.pop() {
            let slot = copies.len();
            copies.push(node.shallow_clone());
            parents.push(parent);
            pending.extend(node.nested.iter().rev().map(|child| (Some(slot), child)));
        }

        // popping visits children before parents and siblings last to first
        while let (Some(mut copy), Some(parent)) = (copies.pop(), parents.pop()) {
            copy.nested.reverse();
            match parent {
                Some(slot) => copies[slot].nested.push(copy),
                None => root.nested.push(copy),
            }
        }
        root.nested.reverse();
        root
    }
}

impl PartialEq for InvocationTrace {
    fn eq(&self, other: &Self) -> bool {
        let mut pending = vec![(self, other)];
        while let Some((a, b)) = pending.pop() {
            if !a.shallow_eq(b) {
                return false;
            }
            pending.extend(a.nested.iter().zip(b.nested.iter()));
        }
        true
    }
}

impl Eq for InvocationTrace {}

impl Hash for InvocationTrace {
    fn hash<H: Hasher>(&self, state: &mut H) {
        for (_, node) in self.descendants() {
            node.shallow_hash(state);
        }
    }
}

impl Drop for InvocationTrace {
    // flatten the subtree first so dropping never recurses
    fn drop(&mut self) {
        let mut pending = std::mem::take(&mut self.nested);
        while let Some(mut node) = pending.pop() {
            pending.append(&mut node.nested);
        }
    }
}

impl EstimatedSize for InvocationTrace {
    fn estimated_size(&self, sizer: &dyn MemorySizer, align: bool) -> u64 {
        let size = self
            .descendants()
            .map(|(_, node)| {
                let nested = if node.nested.is_empty() {
                    0
                } else {
                    sizer.size_of_array(node.nested.len())
                };
                node.shallow_size(sizer) + nested
            })
            .sum();
        sizing::finish(sizer, size, align)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::EventKind;
    use crate::sizing::ObjectSizes;
    use std::collections::hash_map::DefaultHasher;

    fn node(id: u64, duration: f64) -> InvocationTrace {
        InvocationTrace::new(SampleIdentity::new(1, 2, 3).with_id(id), duration)
    }

    fn hash_of(trace: &InvocationTrace) -> u64 {
        let mut hasher = DefaultHasher::new();
        trace.hash(&mut hasher);
        hasher.finish()
    }

    #[test]
    fn test_push_child_links_and_counts() {
        let root = node(1, 10.0)
            .with_child(node(2, 4.0).with_child(node(3, 1.0)))
            .with_child(node(4, 2.0));

        assert!(root.is_root());
        assert_eq!(root.child_count, 3);
        assert_eq!(root.nested[0].parent_id, Some(1));
        assert_eq!(root.nested[1].position, 1);
        assert_eq!(root.nested[0].nested[0].parent_id, Some(2));
        assert_eq!(root.node_count(), 4);
        assert_eq!(root.depth(), 2);
    }

    #[test]
    fn test_descendants_pre_order() {
        let root = node(1, 10.0)
            .with_child(node(2, 4.0).with_child(node(3, 1.0)))
            .with_child(node(4, 2.0));

        let ids: Vec<u64> = root.descendants().map(|(_, n)| n.identity.id).collect();
        assert_eq!(ids, vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_checked_nodes_depth_limit() {
        let root = node(1, 1.0).with_child(node(2, 1.0).with_child(node(3, 1.0)));
        assert_eq!(root.checked_nodes(2).unwrap().len(), 3);
        assert_eq!(
            root.checked_nodes(1).unwrap_err(),
            TraceError::TraceTooDeep { limit: 1 }
        );
    }

    #[test]
    fn test_equality_and_hash_follow_structure() {
        let build = || node(1, 10.0).with_child(node(2, 4.0));
        let a = build();
        let b = a.clone();
        assert_eq!(a, b);
        assert_eq!(hash_of(&a), hash_of(&b));

        let mut c = a.clone();
        c.nested[0].duration = 5.0;
        assert_ne!(a, c);
    }

    #[test]
    fn test_size_composability() {
        let sizes = ObjectSizes::default();
        let child1 = node(2, 4.0);
        let child2 = node(3, 2.0).with_exception(ExceptionEvent::new(
            SampleIdentity::new(1, 2, 3),
            "E",
            EventKind::Created,
        ));
        let c1 = child1.estimated_size(&sizes, false);
        let c2 = child2.estimated_size(&sizes, false);

        let parent = node(1, 10.0).with_child(child1).with_child(child2);

        assert_eq!(
            parent.estimated_size(&sizes, true),
            sizes.align(parent.shallow_size(&sizes) + sizes.size_of_array(2) + c1 + c2)
        );
    }

    #[test]
    fn test_deep_tree_is_safe() {
        let mut trace = node(0, 1.0);
        for id in 1..100_000 {
            trace = node(id, 1.0).with_child(trace);
        }
        assert_eq!(trace.depth(), 99_999);
        let sizes = ObjectSizes::default();
        assert!(trace.estimated_size(&sizes, true) > 0);
        drop(trace);
    }

    #[test]
    fn test_clone_keeps_sibling_order() {
        let root = node(1, 10.0)
            .with_child(node(2, 4.0).with_child(node(3, 1.0)).with_child(node(4, 1.0)))
            .with_child(node(5, 2.0));
        let copy = root.clone();

        let ids: Vec<u64> = copy.descendants().map(|(_, n)| n.identity.id).collect();
        assert_eq!(ids, vec![1, 2, 3, 4, 5]);
        assert_eq!(copy, root);
        assert_eq!(copy.nested[0].nested[1].position, 1);
        assert_eq!(copy.child_count, 4);
    }

    #[test]
    fn test_deep_tree_clone_and_compare() {
        let mut trace = node(0, 1.0);
        for id in 1..100_000 {
            trace = node(id, 1.0).with_child(trace);
        }
        let copy = trace.clone();

        assert_eq!(copy.node_count(), 100_000);
        assert!(copy == trace);
        assert_eq!(hash_of(&copy), hash_of(&trace));
    }
}
