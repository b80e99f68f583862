pub mod cycle;
pub mod precedence;
pub mod topological;

pub use cycle::{detect_cycle, CycleReport, DetectedCycle};
pub use precedence::PrecedenceGraph;
pub use topological::topological_sort;
