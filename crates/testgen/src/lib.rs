//! Random interleavings of a fixed transaction set, and the Monte Carlo
//! experiment estimating how often such interleavings are conflict
//! serializable.

pub mod error;
pub mod experiment;
pub mod generator;

pub use error::Error;
pub use experiment::{run_experiment, Experiment, ExperimentOutcome, ExperimentParams};
pub use generator::{generate_schedule, ChunkBounds};
