//! Conflict-serializability checking for transaction schedules.
//!
//! `schedcop_core` replays a schedule -- an ordered log of reads, writes and
//! commits issued by numbered transactions -- into a precedence graph and
//! decides whether the schedule is conflict serializable:
//!
//! 1. **Schedule model** -- [`Operation`], [`Schedule`] and the
//!    per-transaction [`TransactionSet`].
//! 2. **Precedence graph** -- an edge `Ti -> Tj` whenever an operation of
//!    `Ti` precedes a conflicting operation of `Tj` (`wr`, `rw` or `ww` on
//!    the same item).
//! 3. **Cycle detection** -- a depth-first search run after every replayed
//!    operation; the first cycle ends the replay.
//! 4. **Topological sort** -- linearizes the final graph into a
//!    serialization order.
//!
//! A commit prunes the committing transaction from the graph and removes its
//! operations from later conflict checks (see [`CommitPolicy`]). This keeps
//! the graph small but is narrower than the textbook definition, which
//! builds one graph over the whole schedule; [`CommitPolicy::Retain`] gives
//! the textbook behaviour.
//!
//! # Entry point
//!
//! ```rust,ignore
//! use schedcop_core::{analyze, Operation, Schedule};
//!
//! let schedule: Schedule = vec![
//!     Operation::write(1, 'A'),
//!     Operation::read(2, 'A'),
//!     Operation::commit(1),
//!     Operation::commit(2),
//! ]
//! .into();
//! let analysis = analyze(&schedule);
//! assert_eq!(analysis.order().map(<[_]>::len), Some(2));
//! ```
//!
//! # Crate features
//!
//! - **`serde`** -- enables `Serialize`/`Deserialize` derives on the schedule
//!   model, the graph and the analysis results.
//! - **`schemars`** -- derives `JsonSchema` for the analysis results.
//!
//! This crate is `no_std` compatible (requires `alloc`). The text parser
//! lives in the separate `schedcop_parser` crate.

#![cfg_attr(not(any(test, feature = "schemars")), no_std)]
extern crate alloc;

pub mod graph;
pub mod schedule;
pub mod serializability;

pub use graph::cycle::CycleReport;
pub use schedule::{format_schedule, DataItem, Operation, Schedule, TransactionId, TransactionSet};
pub use serializability::{
    analyze, is_conflict_serializable, Analysis, Analyzer, AnalyzerOptions, CommitPolicy, Verdict,
    Violation,
};
