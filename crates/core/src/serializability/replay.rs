//! Incremental replay of a schedule into a precedence graph.
//!
//! Operations are appended one at a time. Each read or write is compared
//! against the earlier reads and writes of the same item:
//!
//! - a write conflicts with every earlier read or write by another
//!   transaction (`rw` and `ww`), adding `T_prev -> T_cur`;
//! - a read conflicts only with earlier writes (`wr`).
//!
//! Under [`CommitPolicy::Prune`] a commit removes every edge incident to
//! the committing transaction and its operations up to that commit leave the
//! conflict scan for good. The precedence graph therefore only relates
//! transactions that are still live, which is narrower than the textbook
//! definition where the graph spans the whole schedule.
//! [`CommitPolicy::Retain`] keeps the textbook graph.
//!
//! After every operation the cycle detector runs on the current graph; the
//! first detected cycle ends the replay.

use alloc::collections::BTreeSet;
use alloc::vec::Vec;

use hashbrown::{HashMap, HashSet};

use crate::graph::cycle::detect_cycle;
use crate::graph::precedence::PrecedenceGraph;
use crate::graph::topological::topological_sort;
use crate::schedule::types::{DataItem, Operation, TransactionId};
use crate::serializability::verdict::Violation;
use crate::serializability::AnalyzerOptions;

/// How commits affect the precedence graph.
#[cfg_attr(feature = "serde", derive(::serde::Serialize, ::serde::Deserialize))]
#[cfg_attr(feature = "schemars", derive(::schemars::JsonSchema))]
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub enum CommitPolicy {
    /// A commit drops the transaction's edges and excludes its operations
    /// from later conflict checks.
    #[default]
    Prune,
    /// Commits leave the graph untouched.
    Retain,
}

/// Replay state for one schedule. Owns its precedence graph; nothing is
/// shared between replays.
#[derive(Debug, Clone)]
pub struct Replay {
    options: AnalyzerOptions,
    graph: PrecedenceGraph,
    operations: Vec<Operation>,
    accesses: HashMap<DataItem, Vec<usize>>,
    last_commit: HashMap<TransactionId, usize>,
    active: HashSet<TransactionId>,
    participants: BTreeSet<TransactionId>,
    violation: Option<Violation>,
}

impl Replay {
    /// Starts an empty replay whose graph covers `0..=max_id`.
    ///
    /// Larger identifiers may still be pushed; the graph grows to fit them.
    #[must_use]
    pub fn new(max_id: TransactionId, options: AnalyzerOptions) -> Self {
        Self {
            options,
            graph: PrecedenceGraph::with_max_id(max_id),
            operations: Vec::new(),
            accesses: HashMap::new(),
            last_commit: HashMap::new(),
            active: HashSet::new(),
            participants: BTreeSet::new(),
            violation: None,
        }
    }

    #[must_use]
    pub const fn graph(&self) -> &PrecedenceGraph {
        &self.graph
    }

    /// Number of operations replayed so far.
    #[must_use]
    pub fn position(&self) -> usize {
        self.operations.len()
    }

    #[must_use]
    pub const fn participants(&self) -> &BTreeSet<TransactionId> {
        &self.participants
    }

    /// The violation that ended the replay, if any.
    #[must_use]
    pub const fn violation(&self) -> Option<&Violation> {
        self.violation.as_ref()
    }

    /// Transactions whose last operation so far is a commit, ascending.
    #[must_use]
    pub fn committed(&self) -> Vec<TransactionId> {
        self.participants
            .iter()
            .filter(|tx| !self.active.contains(*tx))
            .copied()
            .collect()
    }

    /// Appends one operation and checks the graph for a cycle.
    ///
    /// # Errors
    ///
    /// Returns the [`Violation`] when this operation closes a cycle. Once a
    /// violation has been reported the replay ignores further operations and
    /// keeps returning it.
    pub fn push(&mut self, op: Operation) -> Result<(), Violation> {
        if let Some(violation) = &self.violation {
            return Err(violation.clone());
        }

        let position = self.operations.len();
        let tx = op.transaction();
        self.participants.insert(tx);
        self.graph.grow_to(tx);

        match op.item() {
            None => {
                if self.options.commit_policy == CommitPolicy::Prune {
                    self.graph.prune_on_commit(tx);
                }
                self.last_commit.insert(tx, position);
                self.active.remove(&tx);
            }
            Some(item) => {
                // A transaction reappearing after its commit is live again.
                self.active.insert(tx);
                let earlier = self.accesses.entry(item).or_default();
                for &j in earlier.iter() {
                    let prev = self.operations[j];
                    let prev_tx = prev.transaction();
                    if prev_tx == tx {
                        continue;
                    }
                    if self.options.commit_policy == CommitPolicy::Prune
                        && self.last_commit.get(&prev_tx).is_some_and(|&c| j <= c)
                    {
                        continue;
                    }
                    if op.is_write() || prev.is_write() {
                        self.graph.add_edge(prev_tx, tx);
                    }
                }
                earlier.push(position);
            }
        }
        self.operations.push(op);

        tracing::trace!(
            position = position + 1,
            %op,
            edges = self.graph.edge_count(),
            "replayed operation"
        );

        if let Some(cycle) = detect_cycle(&self.graph) {
            let violation = Violation {
                position: position + 1,
                operation: op,
                cycle_participants: cycle.participants(self.options.cycle_report),
            };
            tracing::debug!(
                position = violation.position,
                %op,
                cycle = ?violation.cycle_participants,
                "conflict cycle detected"
            );
            self.violation = Some(violation.clone());
            return Err(violation);
        }

        Ok(())
    }

    /// Ends the replay and produces the serialization order.
    ///
    /// Committed transactions come first in ascending order, followed by the
    /// topological order of the graph restricted to the remaining
    /// participants. Vertex `0` is not a topological root, so a participant
    /// the sort never reaches is appended last, ascending.
    ///
    /// # Errors
    ///
    /// Returns the [`Violation`] if the replay was ended by a cycle.
    pub fn finish(self) -> Result<Vec<TransactionId>, Violation> {
        if let Some(violation) = self.violation {
            return Err(violation);
        }

        let mut order = self.committed();
        let mut listed: HashSet<TransactionId> = order.iter().copied().collect();
        for tx in topological_sort(&self.graph) {
            if self.participants.contains(&tx) && listed.insert(tx) {
                order.push(tx);
            }
        }
        for tx in &self.participants {
            if listed.insert(*tx) {
                order.push(*tx);
            }
        }
        Ok(order)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(id: u32) -> TransactionId {
        TransactionId(id)
    }

    fn replay(ops: &[Operation]) -> Replay {
        let max = ops.iter().map(Operation::transaction).max().unwrap_or_default();
        let mut replay = Replay::new(max, AnalyzerOptions::default());
        for op in ops {
            if replay.push(*op).is_err() {
                break;
            }
        }
        replay
    }

    #[test]
    fn test_write_write_edge() {
        let r = replay(&[Operation::write(1, 'A'), Operation::write(2, 'A')]);
        assert!(r.graph().has_edge(t(1), t(2)));
        assert_eq!(r.graph().edge_count(), 1);
    }

    #[test]
    fn test_read_write_edge() {
        let r = replay(&[Operation::read(1, 'A'), Operation::write(2, 'A')]);
        assert!(r.graph().has_edge(t(1), t(2)));
    }

    #[test]
    fn test_write_read_edge() {
        let r = replay(&[Operation::write(1, 'A'), Operation::read(2, 'A')]);
        assert!(r.graph().has_edge(t(1), t(2)));
    }

    #[test]
    fn test_read_read_no_edge() {
        let r = replay(&[Operation::read(1, 'A'), Operation::read(2, 'A')]);
        assert_eq!(r.graph().edge_count(), 0);
    }

    #[test]
    fn test_different_items_no_edge() {
        let r = replay(&[Operation::write(1, 'A'), Operation::write(2, 'B')]);
        assert_eq!(r.graph().edge_count(), 0);
    }

    #[test]
    fn test_commit_prunes_edges() {
        let r = replay(&[
            Operation::write(1, 'A'),
            Operation::write(2, 'A'),
            Operation::commit(1),
        ]);
        assert_eq!(r.graph().edge_count(), 0);
        assert_eq!(r.committed(), vec![t(1)]);
    }

    #[test]
    fn test_committed_operations_leave_the_scan() {
        let r = replay(&[
            Operation::write(1, 'A'),
            Operation::commit(1),
            Operation::read(2, 'A'),
        ]);
        assert_eq!(r.graph().edge_count(), 0);
    }

    #[test]
    fn test_retain_keeps_textbook_graph() {
        let options = AnalyzerOptions {
            commit_policy: CommitPolicy::Retain,
            ..AnalyzerOptions::default()
        };
        let mut r = Replay::new(t(2), options);
        for op in [
            Operation::write(1, 'A'),
            Operation::commit(1),
            Operation::read(2, 'A'),
        ] {
            r.push(op).unwrap();
        }
        assert!(r.graph().has_edge(t(1), t(2)));
    }

    #[test]
    fn test_reactivated_transaction() {
        // T1 commits, then reappears: only its new operations count.
        let r = replay(&[
            Operation::write(1, 'A'),
            Operation::commit(1),
            Operation::write(1, 'B'),
            Operation::read(2, 'A'),
            Operation::read(2, 'B'),
        ]);
        assert_eq!(r.graph().edges(), vec![(t(1), t(2))]);
        assert!(r.committed().is_empty());
    }

    #[test]
    fn test_push_after_violation_is_ignored() {
        let mut r = Replay::new(t(2), AnalyzerOptions::default());
        r.push(Operation::write(1, 'A')).unwrap();
        r.push(Operation::read(2, 'A')).unwrap();
        r.push(Operation::write(2, 'B')).unwrap();
        let violation = r.push(Operation::read(1, 'B')).unwrap_err();
        assert_eq!(violation.position, 4);

        assert_eq!(r.push(Operation::commit(1)), Err(violation.clone()));
        assert_eq!(r.position(), 4);
        assert_eq!(r.finish(), Err(violation));
    }

    #[test]
    fn test_grows_for_unseen_identifier() {
        let mut r = Replay::new(t(1), AnalyzerOptions::default());
        r.push(Operation::write(1, 'A')).unwrap();
        r.push(Operation::write(7, 'A')).unwrap();
        assert!(r.graph().has_edge(t(1), t(7)));
        assert_eq!(r.finish().unwrap(), vec![t(1), t(7)]);
    }

    #[test]
    fn test_finish_includes_vertex_zero() {
        let mut r = Replay::new(t(1), AnalyzerOptions::default());
        r.push(Operation::write(0, 'A')).unwrap();
        r.push(Operation::write(1, 'B')).unwrap();
        assert_eq!(r.finish().unwrap(), vec![t(1), t(0)]);
    }
}
