use alloc::vec::Vec;

use crate::schedule::types::{Operation, TransactionId};

/// The operation whose replay closed a cycle in the precedence graph.
#[cfg_attr(feature = "serde", derive(::serde::Serialize, ::serde::Deserialize))]
#[cfg_attr(feature = "schemars", derive(::schemars::JsonSchema))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    /// 1-based position of the operation in the schedule.
    pub position: usize,
    pub operation: Operation,
    /// Transactions reported as taking part in the cycle, ascending.
    /// Depending on [`CycleReport`] this is either the DFS recursion stack
    /// at detection time or the exact cycle.
    ///
    /// [`CycleReport`]: crate::graph::cycle::CycleReport
    pub cycle_participants: Vec<TransactionId>,
}

/// Outcome of replaying a schedule.
#[cfg_attr(feature = "serde", derive(::serde::Serialize, ::serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "result", rename_all = "snake_case"))]
#[cfg_attr(feature = "schemars", derive(::schemars::JsonSchema))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    /// No cycle was ever detected. `order` lists every participant once:
    /// transactions committed at the end of the replay in ascending order,
    /// then the remaining ones in topological order.
    Serializable { order: Vec<TransactionId> },
    /// Replay stopped at the first detected cycle.
    NotSerializable(Violation),
}

/// Full result of analyzing one schedule.
#[cfg_attr(feature = "serde", derive(::serde::Serialize, ::serde::Deserialize))]
#[cfg_attr(feature = "schemars", derive(::schemars::JsonSchema))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Analysis {
    /// Distinct transactions of the schedule, ascending.
    pub participants: Vec<TransactionId>,
    pub verdict: Verdict,
}

impl Analysis {
    #[must_use]
    pub const fn is_serializable(&self) -> bool {
        matches!(self.verdict, Verdict::Serializable { .. })
    }

    /// The serialization order, if the schedule is conflict serializable.
    #[must_use]
    pub fn order(&self) -> Option<&[TransactionId]> {
        match &self.verdict {
            Verdict::Serializable { order } => Some(order),
            Verdict::NotSerializable(_) => None,
        }
    }

    #[must_use]
    pub const fn violation(&self) -> Option<&Violation> {
        match &self.verdict {
            Verdict::Serializable { .. } => None,
            Verdict::NotSerializable(violation) => Some(violation),
        }
    }
}
