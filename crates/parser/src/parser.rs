//! Winnow-based parser for the line-oriented schedule format.
//!
//! Grammar (one operation per line, surrounding whitespace ignored):
//! ```text
//! operation = op id SPACE* item?
//! op        = "r" | "w" | "c"        -- case-insensitive
//! id        = DIGIT+                 -- fits in u32
//! item      = LETTER                 -- required for r/w, absent for c
//! ```
//!
//! Examples: `r1 A`, `W2   B`, `w3C`, `c1`.

use schedcop_core::{Operation, Schedule};
use winnow::ascii::dec_uint;
use winnow::combinator::{eof, opt};
use winnow::error::{ErrMode, StrContext, StrContextValue};
use winnow::prelude::*;
use winnow::token::{one_of, take_while};
use winnow::ModalResult;

// ---------------------------------------------------------------------------
// Public error type
// ---------------------------------------------------------------------------

/// A malformed operation line, with human-readable location information.
#[cfg_attr(feature = "serde", derive(::serde::Serialize, ::serde::Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    pub message: String,
    /// 1-based line number within the parsed input.
    pub line: usize,
    /// 1-based column of the offending character.
    pub column: usize,
    /// The trimmed line that failed to parse.
    pub text: String,
}

impl core::fmt::Display for ParseError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(
            f,
            "malformed operation `{}` at line {}, column {}: {}",
            self.text, self.line, self.column, self.message
        )
    }
}

impl std::error::Error for ParseError {}

// ---------------------------------------------------------------------------
// Public entry points
// ---------------------------------------------------------------------------

/// Parse a single operation such as `r1 A` or `c2`.
///
/// # Errors
///
/// Returns a [`ParseError`] (reported as line 1) when `text` does not match
/// the grammar.
pub fn parse_operation(text: &str) -> Result<Operation, ParseError> {
    parse_line(text, 1)
}

/// Parse already-read lines into a [`Schedule`]. Blank lines are skipped.
///
/// # Errors
///
/// Returns the [`ParseError`] of the first malformed line. Malformed lines are
/// never coerced into operations.
pub fn parse_schedule<I, S>(lines: I) -> Result<Schedule, ParseError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut operations = Vec::new();
    for (index, line) in lines.into_iter().enumerate() {
        let line = line.as_ref();
        if line.trim().is_empty() {
            continue;
        }
        operations.push(parse_line(line, index + 1)?);
    }
    Ok(Schedule::new(operations))
}

/// Parse a whole schedule file.
///
/// # Errors
///
/// See [`parse_schedule`].
pub fn parse_schedule_text(input: &str) -> Result<Schedule, ParseError> {
    parse_schedule(input.lines())
}

/// Parse lines into a [`Schedule`], dropping every line that does not match
/// the grammar. Returns the schedule together with the dropped lines' errors.
pub fn parse_schedule_lenient<I, S>(lines: I) -> (Schedule, Vec<ParseError>)
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut operations = Vec::new();
    let mut dropped = Vec::new();
    for (index, line) in lines.into_iter().enumerate() {
        let line = line.as_ref();
        if line.trim().is_empty() {
            continue;
        }
        match parse_line(line, index + 1) {
            Ok(op) => operations.push(op),
            Err(err) => dropped.push(err),
        }
    }
    (Schedule::new(operations), dropped)
}

// ---------------------------------------------------------------------------
// Line parser
// ---------------------------------------------------------------------------

fn parse_line(raw: &str, line: usize) -> Result<Operation, ParseError> {
    let text = raw.trim();
    let indent = raw.len() - raw.trim_start().len();
    let error = |column: usize, message: String| ParseError {
        message,
        line,
        column: indent + column,
        text: text.to_string(),
    };

    let mut stream: &str = text;
    let (kind, tx, item) = match raw_operation.parse_next(&mut stream) {
        Ok(parts) => parts,
        Err(e) => {
            let consumed = text.len() - stream.len();
            let message = match e {
                ErrMode::Backtrack(e) | ErrMode::Cut(e) => e.to_string(),
                ErrMode::Incomplete(_) => "incomplete operation".to_string(),
            };
            return Err(error(consumed + 1, message));
        }
    };

    match (kind, item) {
        ('r', Some(item)) => Ok(Operation::read(tx, item)),
        ('w', Some(item)) => Ok(Operation::write(tx, item)),
        ('c', None) => Ok(Operation::commit(tx)),
        ('c', Some(_)) => Err(error(text.len(), "a commit takes no data item".to_string())),
        _ => Err(error(
            text.len() + 1,
            "reads and writes need a single-letter data item".to_string(),
        )),
    }
}

/// `op id SPACE* item? EOF`, returning the lowercased op letter.
fn raw_operation(input: &mut &str) -> ModalResult<(char, u32, Option<char>)> {
    let kind = one_of(['r', 'w', 'c', 'R', 'W', 'C'])
        .context(StrContext::Label("operation"))
        .context(StrContext::Expected(StrContextValue::Description(
            "`r`, `w` or `c`",
        )))
        .parse_next(input)?;
    let tx = dec_uint::<_, u32, _>
        .context(StrContext::Label("transaction id"))
        .context(StrContext::Expected(StrContextValue::Description(
            "an unsigned 32-bit integer",
        )))
        .parse_next(input)?;
    take_while(0.., ' ').void().parse_next(input)?;
    let item = opt(one_of(|c: char| c.is_ascii_alphabetic())).parse_next(input)?;
    eof.context(StrContext::Label("end of operation"))
        .context(StrContext::Expected(StrContextValue::Description(
            "a single-letter data item",
        )))
        .parse_next(input)?;
    Ok((kind.to_ascii_lowercase(), tx, item))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
