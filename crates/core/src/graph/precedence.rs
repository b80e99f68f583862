use alloc::vec;
use alloc::vec::Vec;

use crate::schedule::types::TransactionId;

/// Precedence graph over transaction identifiers.
///
/// Vertices are the identifiers `0..=max_id`; the graph is sized by the
/// largest identifier rather than by the number of distinct transactions, so
/// any vertex-indexed array of length `max_id + 1` is valid for every
/// transaction of the schedule. An edge `Ti -> Tj` records that an operation
/// of `Ti` precedes a conflicting operation of `Tj`.
///
/// Each adjacency list keeps insertion order. Depth-first traversals visit
/// neighbours in that order, which makes cycle reports reproducible.
#[cfg_attr(feature = "serde", derive(::serde::Serialize, ::serde::Deserialize))]
#[derive(Default, Debug, Clone, PartialEq, Eq)]
pub struct PrecedenceGraph {
    adjacency: Vec<Vec<TransactionId>>,
}

impl PrecedenceGraph {
    /// Creates an edgeless graph with vertices `0..=max_id`.
    #[must_use]
    pub fn with_max_id(max_id: TransactionId) -> Self {
        Self {
            adjacency: vec![Vec::new(); max_id.index() + 1],
        }
    }

    /// Largest vertex of the graph, `V` in the vertex range `0..=V`.
    #[must_use]
    pub fn max_id(&self) -> TransactionId {
        #[allow(clippy::cast_possible_truncation)]
        TransactionId(self.adjacency.len().saturating_sub(1) as u32)
    }

    /// Extends the vertex range so that `id` is a vertex. Never shrinks.
    pub fn grow_to(&mut self, id: TransactionId) {
        if id.index() >= self.adjacency.len() {
            self.adjacency.resize_with(id.index() + 1, Vec::new);
        }
    }

    /// Inserts the edge `from -> to` unless it is already present.
    ///
    /// Self-loops are ignored: a transaction never conflicts with itself.
    pub fn add_edge(&mut self, from: TransactionId, to: TransactionId) {
        if from == to {
            return;
        }
        self.grow_to(from.max(to));
        let targets = &mut self.adjacency[from.index()];
        if !targets.contains(&to) {
            targets.push(to);
        }
    }

    /// Removes every edge incident to `tx`, in either direction.
    ///
    /// The vertex itself stays in the graph.
    pub fn prune_on_commit(&mut self, tx: TransactionId) {
        if let Some(targets) = self.adjacency.get_mut(tx.index()) {
            targets.clear();
        }
        for targets in &mut self.adjacency {
            targets.retain(|target| *target != tx);
        }
    }

    /// Returns `true` if the edge `from -> to` exists.
    #[must_use]
    pub fn has_edge(&self, from: TransactionId, to: TransactionId) -> bool {
        self.adjacency
            .get(from.index())
            .is_some_and(|targets| targets.contains(&to))
    }

    /// Outgoing neighbours of `v` in insertion order.
    #[must_use]
    pub fn neighbours(&self, v: TransactionId) -> &[TransactionId] {
        self.adjacency.get(v.index()).map_or(&[][..], Vec::as_slice)
    }

    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.adjacency.iter().map(Vec::len).sum()
    }

    /// Returns all edges as `(source, target)` pairs, ascending by source.
    #[must_use]
    pub fn edges(&self) -> Vec<(TransactionId, TransactionId)> {
        let mut edges = Vec::new();
        for (source, targets) in self.adjacency.iter().enumerate() {
            #[allow(clippy::cast_possible_truncation)]
            let source = TransactionId(source as u32);
            edges.extend(targets.iter().map(|target| (source, *target)));
        }
        edges
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(id: u32) -> TransactionId {
        TransactionId(id)
    }

    #[test]
    fn test_sized_by_max_id() {
        let graph = PrecedenceGraph::with_max_id(t(5));
        assert_eq!(graph.max_id(), t(5));
        assert!(graph.neighbours(t(5)).is_empty());
        assert_eq!(graph.edge_count(), 0);
    }

    #[test]
    fn test_add_edge_collapses_duplicates() {
        let mut graph = PrecedenceGraph::with_max_id(t(3));
        graph.add_edge(t(1), t(2));
        graph.add_edge(t(1), t(2));
        graph.add_edge(t(1), t(3));

        assert!(graph.has_edge(t(1), t(2)));
        assert!(!graph.has_edge(t(2), t(1)));
        assert_eq!(graph.neighbours(t(1)), &[t(2), t(3)]);
        assert_eq!(graph.edge_count(), 2);
    }

    #[test]
    fn test_self_loop_is_ignored() {
        let mut graph = PrecedenceGraph::with_max_id(t(2));
        graph.add_edge(t(2), t(2));
        assert_eq!(graph.edge_count(), 0);
    }

    #[test]
    fn test_prune_on_commit_removes_both_directions() {
        let mut graph = PrecedenceGraph::with_max_id(t(3));
        graph.add_edge(t(1), t(2));
        graph.add_edge(t(2), t(3));
        graph.add_edge(t(3), t(1));
        graph.add_edge(t(3), t(2));

        graph.prune_on_commit(t(2));

        assert_eq!(graph.edges(), vec![(t(3), t(1))]);
        assert_eq!(graph.max_id(), t(3));
    }

    #[test]
    fn test_edge_beyond_range_grows_graph() {
        let mut graph = PrecedenceGraph::with_max_id(t(1));
        graph.add_edge(t(1), t(4));
        assert_eq!(graph.max_id(), t(4));
        assert!(graph.has_edge(t(1), t(4)));

        graph.grow_to(t(2));
        assert_eq!(graph.max_id(), t(4));
    }

    #[test]
    fn test_edges_listing_order() {
        let mut graph = PrecedenceGraph::with_max_id(t(3));
        graph.add_edge(t(3), t(1));
        graph.add_edge(t(1), t(3));
        graph.add_edge(t(1), t(2));
        assert_eq!(graph.edges(), vec![(t(1), t(3)), (t(1), t(2)), (t(3), t(1))]);
    }
}
