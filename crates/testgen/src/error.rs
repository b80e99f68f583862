use core::fmt::{Display, Formatter, Result};

use serde::{Deserialize, Serialize};

/// Error raised by the schedule generator and the experiment harness.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub enum Error {
    /// Chunk bounds must satisfy `1 <= lower <= upper`. They are never clamped.
    InvalidChunkBounds { lower: usize, upper: usize },
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        match self {
            Self::InvalidChunkBounds { lower, upper } => write!(
                f,
                "invalid chunk bounds {lower}-{upper}: both must be positive and lower <= upper"
            ),
        }
    }
}

impl std::error::Error for Error {}
