use rand::RngExt;
use schedcop_core::{Operation, Schedule, TransactionId, TransactionSet};
use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Inclusive bounds on how many consecutive operations one transaction
/// contributes each time it is picked.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(try_from = "RawChunkBounds")]
pub struct ChunkBounds {
    lower: usize,
    upper: usize,
}

#[derive(Deserialize)]
struct RawChunkBounds {
    lower: usize,
    upper: usize,
}

impl TryFrom<RawChunkBounds> for ChunkBounds {
    type Error = Error;

    fn try_from(raw: RawChunkBounds) -> Result<Self, Self::Error> {
        Self::new(raw.lower, raw.upper)
    }
}

impl ChunkBounds {
    /// # Errors
    ///
    /// Returns [`Error::InvalidChunkBounds`] unless `1 <= lower <= upper`.
    pub const fn new(lower: usize, upper: usize) -> Result<Self, Error> {
        if lower == 0 || upper == 0 || lower > upper {
            return Err(Error::InvalidChunkBounds { lower, upper });
        }
        Ok(Self { lower, upper })
    }

    #[must_use]
    pub const fn lower(&self) -> usize {
        self.lower
    }

    #[must_use]
    pub const fn upper(&self) -> usize {
        self.upper
    }
}

/// Generate one random interleaving of the transactions in `template`.
///
/// Until every transaction is exhausted: pick a transaction with remaining
/// operations uniformly at random, pick a chunk size uniformly in
/// `[lower, upper]`, and append that many of its next operations (fewer if
/// fewer remain).
///
/// # Order-preservation
///
/// Each transaction's operations appear in the output in their template
/// order, so the result is always a legal interleaving. Grouping the output
/// by transaction gives back `template` exactly.
pub fn generate_schedule<R: RngExt>(
    template: &TransactionSet,
    bounds: ChunkBounds,
    rng: &mut R,
) -> Schedule {
    let mut cursors: Vec<(TransactionId, &[Operation], usize)> = template
        .0
        .iter()
        .filter(|(_, ops)| !ops.is_empty())
        .map(|(tx, ops)| (*tx, ops.as_slice(), 0))
        .collect();
    let mut schedule = Vec::with_capacity(template.operation_count());

    while !cursors.is_empty() {
        let picked = rng.random_range(0..cursors.len());
        let chunk = rng.random_range(bounds.lower..=bounds.upper);

        let (_, ops, cursor) = &mut cursors[picked];
        let end = (*cursor + chunk).min(ops.len());
        schedule.extend_from_slice(&ops[*cursor..end]);
        *cursor = end;

        if end == ops.len() {
            cursors.remove(picked);
        }
    }

    schedule.into()
}
