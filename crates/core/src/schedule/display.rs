use alloc::string::String;
use core::fmt::Write;

use crate::schedule::types::Schedule;

/// Format a schedule in the line-oriented operation format.
///
/// One operation per line in canonical form (`r1 A`, `w2 B`, `c1`). The
/// output always ends with a trailing newline so that it round-trips through
/// `parse_schedule` unchanged.
#[must_use]
pub fn format_schedule(schedule: &Schedule) -> String {
    let mut output = String::new();
    for op in schedule {
        let _ = writeln!(output, "{op}");
    }
    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schedule::types::Operation;

    #[test]
    fn test_format_schedule() {
        let schedule: Schedule = vec![
            Operation::write(1, 'A'),
            Operation::read(2, 'A'),
            Operation::commit(1),
            Operation::commit(2),
        ]
        .into();
        assert_eq!(format_schedule(&schedule), "w1 A\nr2 A\nc1\nc2\n");
    }

    #[test]
    fn test_format_empty_schedule() {
        assert_eq!(format_schedule(&Schedule::default()), "");
    }
}
