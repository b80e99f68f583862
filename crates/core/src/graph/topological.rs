use alloc::collections::VecDeque;
use alloc::vec;
use alloc::vec::Vec;

use crate::graph::precedence::PrecedenceGraph;
use crate::schedule::types::TransactionId;

/// Depth-first topological sort over the vertices `1..=V`.
///
/// Roots are taken in ascending order, skipping visited vertices; each
/// vertex is pushed to the front of the result once all of its descendants
/// are finished. The output covers every vertex reachable from a root (all of
/// `1..=V`, plus `0` when an edge enters it), not only the transactions of a
/// schedule.
///
/// The caller must establish acyclicity first: on a cyclic graph this still
/// terminates, but the order is not consistent with every edge.
#[must_use]
pub fn topological_sort(graph: &PrecedenceGraph) -> Vec<TransactionId> {
    let size = graph.max_id().index() + 1;
    let mut visited = vec![false; size];
    let mut order = VecDeque::with_capacity(size);
    let mut stack: Vec<(TransactionId, usize)> = Vec::new();

    for root in (1..=graph.max_id().0).map(TransactionId) {
        if visited[root.index()] {
            continue;
        }
        visited[root.index()] = true;
        stack.push((root, 0));

        while let Some(frame) = stack.last_mut() {
            let vertex = frame.0;
            if let Some(&neighbour) = graph.neighbours(vertex).get(frame.1) {
                frame.1 += 1;
                if !visited[neighbour.index()] {
                    visited[neighbour.index()] = true;
                    stack.push((neighbour, 0));
                }
            } else {
                stack.pop();
                order.push_front(vertex);
            }
        }
    }

    order.into()
}
