//! Assemble invocation trees from flat records.
//!
//! Agents ship each call as its own record carrying the id of the calling
//! record. Assembly links them into owned trees and rejects input that
//! cannot form a forest: duplicate ids, references to missing parents,
//! parent cycles and trees deeper than the configured limit.
//!
//! Nested calls keep the order in which their records arrived.

use super::invocation::InvocationTrace;
use crate::utils::error::TraceError;
use log::{debug, warn};
use std::collections::HashMap;

/// Link flat records into invocation trees
///
/// Returns the roots in input order.
///
/// # Errors
/// * `TraceError::DuplicateId` - two records share an id
/// * `TraceError::UnknownParent` - a record names a parent that is not in the input
/// * `TraceError::CyclicTrace` - records are linked in a loop and reach no root
/// * `TraceError::TraceTooDeep` - a tree nests deeper than `max_depth`
pub fn assemble(records: Vec<InvocationTrace>, max_depth: usize) -> Result<Vec<InvocationTrace>, TraceError> {
    debug!("Assembling {} invocation records", records.len());

    let mut index: HashMap<u64, usize> = HashMap::with_capacity(records.len());
    for (slot, record) in records.iter().enumerate() {
        if index.insert(record.identity.id, slot).is_some() {
            return Err(TraceError::DuplicateId {
                id: record.identity.id,
            });
        }
    }

    let mut children: Vec<Vec<usize>> = vec![Vec::new(); records.len()];
    let mut roots: Vec<usize> = Vec::new();
    for (slot, record) in records.iter().enumerate() {
        match record.parent_id {
            None => roots.push(slot),
            Some(parent_id) if parent_id == record.identity.id => {
                return Err(TraceError::CyclicTrace { id: parent_id });
            }
            Some(parent_id) => match index.get(&parent_id) {
                Some(&parent_slot) => children[parent_slot].push(slot),
                None => {
                    return Err(TraceError::UnknownParent {
                        id: record.identity.id,
                        parent_id,
                    })
                }
            },
        }
    }

    // pre-order from every root; whatever stays unvisited hangs off a cycle
    let mut order: Vec<usize> = Vec::with_capacity(records.len());
    let mut visited = vec![false; records.len()];
    for &root in &roots {
        let mut pending = vec![(0usize, root)];
        while let Some((depth, slot)) = pending.pop() {
            if depth > max_depth {
                warn!(
                    "Invocation tree rooted at {} exceeds depth limit {}",
                    records[root].identity.id, max_depth
                );
                return Err(TraceError::TraceTooDeep { limit: max_depth });
            }
            visited[slot] = true;
            order.push(slot);
            pending.extend(children[slot].iter().map(|&child| (depth + 1, child)));
        }
    }

    if let Some(id) = visited
        .iter()
        .enumerate()
        .filter(|(_, seen)| !**seen)
        .map(|(slot, _)| records[slot].identity.id)
        .min()
    {
        return Err(TraceError::CyclicTrace { id });
    }

    // children come after their parent in pre-order, so the reverse order
    // builds every subtree before the node that owns it
    let mut slots: Vec<Option<InvocationTrace>> = records.into_iter().map(Some).collect();
    for &slot in order.iter().rev() {
        let Some(mut node) = slots[slot].take() else {
            continue;
        };
        node.child_count = node.nested.iter().map(|n| 1 + n.child_count).sum();
        for &child_slot in &children[slot] {
            if let Some(child) = slots[child_slot].take() {
                node.push_child(child);
            }
        }
        slots[slot] = Some(node);
    }

    let trees: Vec<InvocationTrace> = roots
        .into_iter()
        .filter_map(|slot| slots[slot].take())
        .collect();

    debug!("Assembled {} invocation trees", trees.len());
    Ok(trees)
}

/// Recompute the links of a tree read in nested form
///
/// Sets every nested call's `parent_id` and `position` and every node's
/// `child_count` from the actual structure, the way `push_child` does.
/// The root keeps its own `parent_id`.
///
/// # Errors
/// * `TraceError::TraceTooDeep` - the tree nests deeper than `max_depth`
pub fn relink(tree: InvocationTrace, max_depth: usize) -> Result<InvocationTrace, TraceError> {
    let mut root = tree;

    // detach every descendant in pre-order, remembering its parent slot
    let mut nodes: Vec<InvocationTrace> = Vec::new();
    let mut parents: Vec<Option<usize>> = Vec::new();
    let mut pending: Vec<(usize, Option<usize>, InvocationTrace)> = std::mem::take(&mut root.nested)
        .into_iter()
        .rev()
        .map(|child| (1, None, child))
        .collect();
    while let Some((depth, parent, mut node)) = pending.pop() {
        if depth > max_depth {
            warn!(
                "Invocation tree rooted at {} exceeds depth limit {}",
                root.identity.id, max_depth
            );
            return Err(TraceError::TraceTooDeep { limit: max_depth });
        }
        let slot = nodes.len();
        pending.extend(
            std::mem::take(&mut node.nested)
                .into_iter()
                .rev()
                .map(|child| (depth + 1, Some(slot), child)),
        );
        node.child_count = 0;
        nodes.push(node);
        parents.push(parent);
    }

    // children sit after their parent, so popping finishes every subtree
    // before the node that owns it; siblings come off last to first
    let mut finished: Vec<Vec<InvocationTrace>> = (0..nodes.len()).map(|_| Vec::new()).collect();
    let mut top: Vec<InvocationTrace> = Vec::new();
    while let (Some(mut node), Some(parent)) = (nodes.pop(), parents.pop()) {
        if let Some(mut children) = finished.pop() {
            while let Some(child) = children.pop() {
                node.push_child(child);
            }
        }
        match parent {
            Some(slot) => finished[slot].push(node),
            None => top.push(node),
        }
    }

    root.child_count = 0;
    while let Some(child) = top.pop() {
        root.push_child(child);
    }
    Ok(root)
}
