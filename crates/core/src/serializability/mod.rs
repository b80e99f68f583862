use alloc::vec::Vec;

use crate::graph::cycle::CycleReport;
use crate::schedule::types::Schedule;

pub mod replay;
pub mod verdict;

pub use replay::{CommitPolicy, Replay};
pub use verdict::{Analysis, Verdict, Violation};

/// Knobs of the serializability check. The defaults reproduce the
/// commit-pruning replay and report the DFS recursion stack.
#[cfg_attr(feature = "serde", derive(::serde::Serialize, ::serde::Deserialize))]
#[cfg_attr(feature = "schemars", derive(::schemars::JsonSchema))]
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub struct AnalyzerOptions {
    pub cycle_report: CycleReport,
    pub commit_policy: CommitPolicy,
}

/// Conflict-serializability checker.
#[derive(Debug, Default, Copy, Clone)]
pub struct Analyzer {
    options: AnalyzerOptions,
}

impl Analyzer {
    #[must_use]
    pub const fn new(options: AnalyzerOptions) -> Self {
        Self { options }
    }

    #[must_use]
    pub const fn with_cycle_report(mut self, cycle_report: CycleReport) -> Self {
        self.options.cycle_report = cycle_report;
        self
    }

    #[must_use]
    pub const fn with_commit_policy(mut self, commit_policy: CommitPolicy) -> Self {
        self.options.commit_policy = commit_policy;
        self
    }

    #[must_use]
    pub const fn options(&self) -> AnalyzerOptions {
        self.options
    }

    /// Replays `schedule` and reports whether it is conflict serializable.
    ///
    /// The replay stops at the first operation after which the precedence
    /// graph has a cycle. An empty schedule has no participants and is
    /// trivially serializable with an empty order.
    #[must_use]
    pub fn analyze(&self, schedule: &Schedule) -> Analysis {
        let participants: Vec<_> = schedule.participants().into_iter().collect();
        tracing::debug!(
            operations = schedule.len(),
            participants = participants.len(),
            options = ?self.options,
            "analyzing schedule"
        );

        let verdict = match self.replay(schedule).and_then(Replay::finish) {
            Ok(order) => Verdict::Serializable { order },
            Err(violation) => Verdict::NotSerializable(violation),
        };

        Analysis {
            participants,
            verdict,
        }
    }

    /// Same decision as [`analyze`](Self::analyze) without building the
    /// serialization order.
    #[must_use]
    pub fn is_conflict_serializable(&self, schedule: &Schedule) -> bool {
        self.replay(schedule).is_ok()
    }

    fn replay(&self, schedule: &Schedule) -> Result<Replay, Violation> {
        let max_id = schedule.max_transaction_id().unwrap_or_default();
        let mut replay = Replay::new(max_id, self.options);
        for op in schedule {
            replay.push(*op)?;
        }
        Ok(replay)
    }
}

/// Analyzes `schedule` with the default [`AnalyzerOptions`].
#[must_use]
pub fn analyze(schedule: &Schedule) -> Analysis {
    Analyzer::default().analyze(schedule)
}

/// Returns `true` if `schedule` replays without a conflict cycle under the
/// default [`AnalyzerOptions`].
#[must_use]
pub fn is_conflict_serializable(schedule: &Schedule) -> bool {
    Analyzer::default().is_conflict_serializable(schedule)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schedule::types::{Operation, TransactionId};

    fn t(id: u32) -> TransactionId {
        TransactionId(id)
    }

    #[test]
    fn test_empty_schedule() {
        let analysis = analyze(&Schedule::default());
        assert!(analysis.participants.is_empty());
        assert_eq!(analysis.verdict, Verdict::Serializable { order: vec![] });
    }

    #[test]
    fn test_two_writers_commit_in_order() {
        let schedule: Schedule = vec![
            Operation::write(1, 'A'),
            Operation::write(2, 'A'),
            Operation::commit(1),
            Operation::commit(2),
        ]
        .into();
        let analysis = analyze(&schedule);
        assert_eq!(analysis.participants, vec![t(1), t(2)]);
        assert_eq!(analysis.order(), Some(&[t(1), t(2)][..]));
    }

    #[test]
    fn test_crossing_conflicts() {
        let schedule: Schedule = vec![
            Operation::write(1, 'A'),
            Operation::read(2, 'A'),
            Operation::write(2, 'B'),
            Operation::read(1, 'B'),
        ]
        .into();
        let analysis = analyze(&schedule);
        let violation = analysis.violation().expect("cycle");
        assert_eq!(violation.position, 4);
        assert_eq!(violation.operation, Operation::read(1, 'B'));
        assert_eq!(violation.cycle_participants, vec![t(1), t(2)]);
        assert!(!is_conflict_serializable(&schedule));
    }

    #[test]
    fn test_uncommitted_ordered_topologically() {
        // 3 -> 2 via item A; 1 commits.
        let schedule: Schedule = vec![
            Operation::write(3, 'A'),
            Operation::read(2, 'A'),
            Operation::write(1, 'B'),
            Operation::commit(1),
        ]
        .into();
        let analysis = analyze(&schedule);
        assert_eq!(analysis.order(), Some(&[t(1), t(3), t(2)][..]));
    }

    #[test]
    fn test_builder_options() {
        let analyzer = Analyzer::default()
            .with_cycle_report(CycleReport::Exact)
            .with_commit_policy(CommitPolicy::Retain);
        assert_eq!(
            analyzer.options(),
            AnalyzerOptions {
                cycle_report: CycleReport::Exact,
                commit_policy: CommitPolicy::Retain,
            }
        );
    }
}
