pub mod display;
pub mod types;

pub use display::format_schedule;
pub use types::{DataItem, Operation, Schedule, TransactionId, TransactionSet};
