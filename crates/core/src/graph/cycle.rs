//! Cycle detection on the precedence graph.
//!
//! A depth-first search over every vertex, roots taken in ascending order
//! from `0` up to (excluding) the largest vertex, with `visited` and
//! `on_stack` marks. Reaching a neighbour that is still on the recursion
//! stack is a back edge and proves a cycle.
//!
//! The search uses an explicit stack of `(vertex, next neighbour)` frames so
//! that deep graphs cannot exhaust the call stack, while visiting vertices in
//! exactly the order a recursive search would.

use alloc::vec;
use alloc::vec::Vec;

use crate::graph::precedence::PrecedenceGraph;
use crate::schedule::types::TransactionId;

/// Which vertex set to report when a cycle is found.
#[cfg_attr(feature = "serde", derive(::serde::Serialize, ::serde::Deserialize))]
#[cfg_attr(feature = "schemars", derive(::schemars::JsonSchema))]
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub enum CycleReport {
    /// Every vertex on the recursion stack when the first back edge was
    /// found. May include vertices that are on the DFS path but not on the
    /// cycle itself.
    #[default]
    RecursionStack,
    /// Only the vertices of the cycle closed by the first back edge.
    Exact,
}

/// A cycle found by [`detect_cycle`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetectedCycle {
    /// Vertices marked `on_stack` at detection time, ascending.
    pub stack_snapshot: Vec<TransactionId>,
    /// The cycle closed by the back edge, in traversal order starting at the
    /// back edge's target.
    pub cycle: Vec<TransactionId>,
}

impl DetectedCycle {
    /// The vertex set selected by `report`, ascending.
    #[must_use]
    pub fn participants(&self, report: CycleReport) -> Vec<TransactionId> {
        match report {
            CycleReport::RecursionStack => self.stack_snapshot.clone(),
            CycleReport::Exact => {
                let mut members = self.cycle.clone();
                members.sort_unstable();
                members
            }
        }
    }
}

/// Runs the depth-first search and returns the first cycle found, if any.
///
/// Time complexity: O(V+E).
#[must_use]
pub fn detect_cycle(graph: &PrecedenceGraph) -> Option<DetectedCycle> {
    let size = graph.max_id().index() + 1;
    let mut visited = vec![false; size];
    let mut on_stack = vec![false; size];
    let mut stack: Vec<(TransactionId, usize)> = Vec::new();

    for root in (0..graph.max_id().0).map(TransactionId) {
        if visited[root.index()] {
            continue;
        }
        visited[root.index()] = true;
        on_stack[root.index()] = true;
        stack.push((root, 0));

        while let Some(frame) = stack.last_mut() {
            let vertex = frame.0;
            let Some(&neighbour) = graph.neighbours(vertex).get(frame.1) else {
                on_stack[vertex.index()] = false;
                stack.pop();
                continue;
            };
            frame.1 += 1;

            if !visited[neighbour.index()] {
                visited[neighbour.index()] = true;
                on_stack[neighbour.index()] = true;
                stack.push((neighbour, 0));
            } else if on_stack[neighbour.index()] {
                return Some(snapshot(&stack, &on_stack, neighbour));
            }
        }
    }

    None
}

fn snapshot(
    stack: &[(TransactionId, usize)],
    on_stack: &[bool],
    target: TransactionId,
) -> DetectedCycle {
    #[allow(clippy::cast_possible_truncation)]
    let stack_snapshot = on_stack
        .iter()
        .enumerate()
        .filter(|(_, &marked)| marked)
        .map(|(index, _)| TransactionId(index as u32))
        .collect();
    let start = stack
        .iter()
        .position(|(vertex, _)| *vertex == target)
        .unwrap_or(0);
    let cycle = stack[start..].iter().map(|(vertex, _)| *vertex).collect();

    tracing::trace!(?stack_snapshot, ?cycle, "back edge found");

    DetectedCycle {
        stack_snapshot,
        cycle,
    }
}
