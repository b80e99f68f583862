//! schedcop CLI -- check schedules for conflict serializability and
//! estimate how often random interleavings are serializable.

use core::fmt::{Display, Formatter};
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use std::{fs, io};

use clap::{Parser, Subcommand};
use derive_more::From;
use schedcop_core::{
    Analysis, AnalyzerOptions, CommitPolicy, CycleReport, Schedule, TransactionId, Verdict,
};
use schedcop_parser::{parse_schedule, parse_schedule_lenient, ParseError};
use schedcop_testgen::{ChunkBounds, Experiment};

#[derive(Debug, Parser)]
#[command(
    name = "schedcop",
    about = "Conflict-serializability verification for transaction schedules"
)]
pub struct App {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Decide whether a schedule (.sch) is conflict serializable
    Analyze(AnalyzeArgs),
    /// Replay random interleavings of a transaction set (.set)
    Experiment(ExperimentArgs),
    /// Print the JSON Schema of `analyze --json` output to stdout
    Schema,
}

#[derive(Debug, Parser)]
pub struct AnalyzeArgs {
    /// Schedule file, one operation per line
    #[arg(value_parser = schedule_file)]
    pub file: PathBuf,
    /// Fail on the first malformed line instead of dropping it
    #[arg(long)]
    pub strict: bool,
    /// Report only the vertices of the detected cycle, not the whole DFS stack
    #[arg(long)]
    pub exact_cycle: bool,
    /// Keep committed transactions in the precedence graph
    #[arg(long)]
    pub retain_committed: bool,
    /// Output the analysis as JSON
    #[arg(long)]
    pub json: bool,
}

impl AnalyzeArgs {
    #[must_use]
    pub const fn options(&self) -> AnalyzerOptions {
        AnalyzerOptions {
            cycle_report: if self.exact_cycle {
                CycleReport::Exact
            } else {
                CycleReport::RecursionStack
            },
            commit_policy: if self.retain_committed {
                CommitPolicy::Retain
            } else {
                CommitPolicy::Prune
            },
        }
    }
}

#[derive(Debug, Parser)]
pub struct ExperimentArgs {
    /// Transaction set file, one operation per line
    #[arg(value_parser = transaction_set_file)]
    pub file: PathBuf,
    /// Number of random schedules to generate
    pub trials: u64,
    /// Inclusive chunk-size range `A-B`, with 1 <= A <= B
    #[arg(value_parser = parse_chunk_bounds)]
    pub bounds: ChunkBounds,
    /// Base seed for reproducible runs
    #[arg(long)]
    pub seed: Option<u64>,
    /// Run the trials on all cores
    #[arg(long)]
    pub parallel: bool,
    /// Output the experiment record as JSON
    #[arg(long)]
    pub json: bool,
}

/// Parses `A-B` into validated [`ChunkBounds`].
///
/// # Errors
///
/// Returns a message for clap to print when either bound is not a positive
/// integer or `A > B`.
pub fn parse_chunk_bounds(text: &str) -> Result<ChunkBounds, String> {
    let (lower, upper) = text
        .split_once('-')
        .ok_or_else(|| format!("expected `A-B`, got `{text}`"))?;
    let lower: usize = lower
        .trim()
        .parse()
        .map_err(|_| format!("the lower bound `{lower}` should be a positive integer"))?;
    let upper: usize = upper
        .trim()
        .parse()
        .map_err(|_| format!("the upper bound `{upper}` should be a positive integer"))?;
    ChunkBounds::new(lower, upper).map_err(|e| e.to_string())
}

fn with_extension(text: &str, extension: &str) -> Result<PathBuf, String> {
    let path = PathBuf::from(text);
    if path.extension().is_some_and(|ext| ext == extension) {
        Ok(path)
    } else {
        Err(format!("only .{extension} files are accepted"))
    }
}

fn schedule_file(text: &str) -> Result<PathBuf, String> {
    with_extension(text, "sch")
}

fn transaction_set_file(text: &str) -> Result<PathBuf, String> {
    with_extension(text, "set")
}

/// Failure of a CLI command. Printed to stderr before exiting with status 1.
#[derive(Debug, From)]
pub enum Error {
    Read(PathBuf, io::Error),
    Parse(ParseError),
    Json(serde_json::Error),
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Read(path, e) => write!(f, "failed to read {}: {e}", path.display()),
            Self::Parse(e) => write!(f, "{e}"),
            Self::Json(e) => write!(f, "failed to encode JSON: {e}"),
        }
    }
}

impl std::error::Error for Error {}

/// Reads and parses a schedule file.
///
/// Without `strict`, malformed lines are dropped with a warning.
///
/// # Errors
///
/// Returns [`Error::Read`] when the file cannot be read, and with `strict`
/// [`Error::Parse`] for the first malformed line.
pub fn load_schedule(path: &Path, strict: bool) -> Result<Schedule, Error> {
    let text = fs::read_to_string(path).map_err(|e| (path.to_path_buf(), e))?;
    if strict {
        return Ok(parse_schedule(text.lines())?);
    }
    let (schedule, dropped) = parse_schedule_lenient(text.lines());
    for e in &dropped {
        tracing::warn!(file = %path.display(), "{e}");
    }
    Ok(schedule)
}

fn bracketed<'a>(ids: impl IntoIterator<Item = &'a TransactionId>) -> String {
    let ids: Vec<String> = ids.into_iter().map(ToString::to_string).collect();
    format!("[{}]", ids.join(","))
}

/// Human-readable report of one analysis.
#[must_use]
pub fn render_analysis(analysis: &Analysis) -> String {
    let mut out = format!(
        "Schedule involves the following transactions: {}\n",
        bracketed(&analysis.participants)
    );
    match &analysis.verdict {
        Verdict::Serializable { order } => {
            out.push_str("The schedule is conflict serializable.\n");
            let _ = writeln!(
                out,
                "The transactions can be serialized in this order: {}",
                bracketed(order)
            );
        }
        Verdict::NotSerializable(violation) => {
            let _ = writeln!(
                out,
                "Instruction {} ({}) created a conflict cycle.",
                violation.position, violation.operation
            );
            let _ = writeln!(
                out,
                "These are the transactions participating in cycles: {}",
                bracketed(&violation.cycle_participants)
            );
        }
    }
    out
}

/// Human-readable report of one experiment over `participants`.
#[must_use]
pub fn render_experiment(experiment: &Experiment, participants: &[TransactionId]) -> String {
    let params = experiment.get_params();
    let outcome = experiment.get_outcome();
    let mut out = format!(
        "{} {} {}-{}\n",
        params.source,
        params.trials,
        params.bounds.lower(),
        params.bounds.upper()
    );
    let Some(rate) = outcome.rate_percent else {
        out.push_str("The number of trials is 0. No results to print.\n");
        return out;
    };
    let _ = writeln!(
        out,
        "Schedule involves the following transactions: {}",
        bracketed(participants)
    );
    let _ = writeln!(
        out,
        "{} out of {} schedules for the transactions were conflict serializable",
        outcome.serializable_count, outcome.trial_count
    );
    let _ = writeln!(out, "{rate:.1}% conflict serializable rate");
    out
}
