pub mod parser;

pub use parser::{
    parse_operation, parse_schedule, parse_schedule_lenient, parse_schedule_text, ParseError,
};
