use chrono::{DateTime, Duration, Local};
use rand::rngs::StdRng;
use rand::{RngExt, SeedableRng};
use rayon::iter::{IntoParallelIterator, ParallelIterator};
use schedcop_core::{Analyzer, AnalyzerOptions, TransactionSet};
use serde::{Deserialize, Serialize};
use typed_builder::TypedBuilder;

use crate::error::Error;
use crate::generator::{generate_schedule, ChunkBounds};

/// Parameters of one Monte Carlo run, echoed in its report.
#[derive(Clone, Debug, Deserialize, Serialize, TypedBuilder)]
pub struct ExperimentParams {
    /// Where the transaction set came from, e.g. the `.set` file name.
    #[builder(default, setter(into))]
    pub source: String,
    pub trials: u64,
    pub bounds: ChunkBounds,
    /// Base seed. Trial `i` draws from `StdRng::seed_from_u64(seed + i)`.
    /// A random seed is drawn (and recorded) when absent.
    #[builder(default, setter(strip_option))]
    pub seed: Option<u64>,
    /// Fan the trials out over the rayon thread pool.
    #[builder(default)]
    pub parallel: bool,
    #[builder(default)]
    pub options: AnalyzerOptions,
}

/// Counters folded over all trials.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize, Serialize)]
pub struct ExperimentOutcome {
    pub serializable_count: u64,
    pub trial_count: u64,
    /// `serializable_count / trial_count * 100`; `None` when no trial ran.
    pub rate_percent: Option<f64>,
}

impl ExperimentOutcome {
    #[must_use]
    pub fn new(serializable_count: u64, trial_count: u64) -> Self {
        #[allow(clippy::cast_precision_loss)]
        let rate_percent = (trial_count > 0)
            .then(|| serializable_count as f64 / trial_count as f64 * 100.0);
        Self {
            serializable_count,
            trial_count,
            rate_percent,
        }
    }
}

/// A finished experiment: parameters, the seed actually used, timing and
/// outcome.
#[derive(Deserialize, Serialize, Debug)]
pub struct Experiment {
    params: ExperimentParams,
    seed: u64,
    start: DateTime<Local>,
    end: DateTime<Local>,
    outcome: ExperimentOutcome,
}

impl Experiment {
    /// Runs `params.trials` independent trials over `template`.
    ///
    /// Each trial generates a fresh interleaving and replays it with a fresh
    /// precedence graph. Results do not depend on `params.parallel`: trials
    /// are seeded individually from the base seed.
    #[must_use]
    pub fn run(template: &TransactionSet, params: ExperimentParams) -> Self {
        let seed = params.seed.unwrap_or_else(|| rand::rng().random());
        let analyzer = Analyzer::new(params.options);
        let bounds = params.bounds;

        tracing::debug!(
            source = %params.source,
            trials = params.trials,
            lower = bounds.lower(),
            upper = bounds.upper(),
            seed,
            parallel = params.parallel,
            "starting experiment"
        );

        let trial = |i: u64| {
            let mut rng = StdRng::seed_from_u64(seed.wrapping_add(i));
            let schedule = generate_schedule(template, bounds, &mut rng);
            analyzer.is_conflict_serializable(&schedule)
        };

        let start = Local::now();
        let serializable_count = if params.parallel {
            (0..params.trials).into_par_iter().filter(|&i| trial(i)).count() as u64
        } else {
            (0..params.trials).filter(|&i| trial(i)).count() as u64
        };
        let end = Local::now();

        let outcome = ExperimentOutcome::new(serializable_count, params.trials);
        tracing::debug!(
            serializable = outcome.serializable_count,
            trials = outcome.trial_count,
            rate = ?outcome.rate_percent,
            "experiment finished"
        );

        Self {
            params,
            seed,
            start,
            end,
            outcome,
        }
    }

    #[must_use]
    pub const fn get_params(&self) -> &ExperimentParams {
        &self.params
    }

    #[must_use]
    pub const fn get_seed(&self) -> u64 {
        self.seed
    }

    #[must_use]
    pub const fn get_outcome(&self) -> &ExperimentOutcome {
        &self.outcome
    }

    #[must_use]
    pub fn get_duration(&self) -> Duration {
        self.end - self.start
    }
}

/// Runs `trials` trials drawing every interleaving from one injected `rng`.
///
/// # Errors
///
/// Returns [`Error::InvalidChunkBounds`] unless `1 <= lower <= upper`.
pub fn run_trials<R: RngExt>(
    template: &TransactionSet,
    trials: u64,
    lower: usize,
    upper: usize,
    rng: &mut R,
) -> Result<ExperimentOutcome, Error> {
    let bounds = ChunkBounds::new(lower, upper)?;
    let analyzer = Analyzer::default();
    let mut serializable_count = 0;
    for _ in 0..trials {
        let schedule = generate_schedule(template, bounds, rng);
        if analyzer.is_conflict_serializable(&schedule) {
            serializable_count += 1;
        }
    }
    Ok(ExperimentOutcome::new(serializable_count, trials))
}

/// Estimates the fraction of random interleavings of `template` that are
/// conflict serializable, using the thread-local random generator.
///
/// # Errors
///
/// Returns [`Error::InvalidChunkBounds`] unless `1 <= lower <= upper`.
pub fn run_experiment(
    template: &TransactionSet,
    trials: u64,
    lower: usize,
    upper: usize,
) -> Result<ExperimentOutcome, Error> {
    run_trials(template, trials, lower, upper, &mut rand::rng())
}

#[cfg(test)]
mod tests {
    use schedcop_core::{Operation, Schedule};

    use super::*;

    fn disjoint_template() -> TransactionSet {
        let schedule: Schedule = vec![
            Operation::write(1, 'A'),
            Operation::commit(1),
            Operation::write(2, 'B'),
            Operation::commit(2),
        ]
        .into();
        schedule.split_by_transaction()
    }

    #[test]
    fn test_outcome_rate() {
        assert_eq!(ExperimentOutcome::new(0, 0).rate_percent, None);
        assert_eq!(ExperimentOutcome::new(1, 4).rate_percent, Some(25.0));
        assert_eq!(ExperimentOutcome::new(4, 4).rate_percent, Some(100.0));
    }

    #[test]
    fn test_builder_defaults() {
        let params = ExperimentParams::builder()
            .trials(10)
            .bounds(ChunkBounds::new(1, 2).unwrap())
            .build();
        assert_eq!(params.source, "");
        assert_eq!(params.seed, None);
        assert!(!params.parallel);
        assert_eq!(params.options, AnalyzerOptions::default());
    }

    #[test]
    fn test_seed_is_recorded() {
        let params = ExperimentParams::builder()
            .source("disjoint.set")
            .trials(3)
            .bounds(ChunkBounds::new(1, 1).unwrap())
            .seed(99)
            .build();
        let experiment = Experiment::run(&disjoint_template(), params);
        assert_eq!(experiment.get_seed(), 99);
        assert_eq!(experiment.get_params().source, "disjoint.set");
        assert_eq!(experiment.get_outcome().serializable_count, 3);
        assert!(experiment.get_duration() >= Duration::zero());
    }

    #[test]
    fn test_invalid_bounds() {
        assert_eq!(
            run_experiment(&disjoint_template(), 5, 3, 2),
            Err(Error::InvalidChunkBounds { lower: 3, upper: 2 })
        );
    }
}
