use alloc::collections::{BTreeMap, BTreeSet};
use alloc::vec::Vec;
use core::fmt::{Display, Formatter, Result};

use derive_more::From;

/// Identifier of a transaction participating in a schedule.
///
/// Transactions are never declared up front; they are inferred from the
/// distinct identifiers appearing in operations. The numeric value doubles
/// as the vertex index in the precedence graph.
#[cfg_attr(feature = "serde", derive(::serde::Serialize, ::serde::Deserialize))]
#[cfg_attr(feature = "schemars", derive(::schemars::JsonSchema))]
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, From)]
pub struct TransactionId(pub u32);

impl TransactionId {
    /// Vertex index of this transaction in vertex-indexed arrays.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl Display for TransactionId {
    fn fmt(&self, f: &mut Formatter) -> Result {
        write!(f, "{}", self.0)
    }
}

/// A single-character data item name. Case-sensitive.
#[cfg_attr(feature = "serde", derive(::serde::Serialize, ::serde::Deserialize))]
#[cfg_attr(feature = "schemars", derive(::schemars::JsonSchema))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, From)]
pub struct DataItem(pub char);

impl Display for DataItem {
    fn fmt(&self, f: &mut Formatter) -> Result {
        write!(f, "{}", self.0)
    }
}

/// One event of a schedule.
///
/// Operations carry no timestamp; their position in the [`Schedule`] is the
/// only ordering key.
#[cfg_attr(feature = "serde", derive(::serde::Serialize, ::serde::Deserialize))]
#[cfg_attr(feature = "schemars", derive(::schemars::JsonSchema))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Read { tx: TransactionId, item: DataItem },
    Write { tx: TransactionId, item: DataItem },
    Commit { tx: TransactionId },
}

impl Operation {
    #[must_use]
    pub const fn read(tx: u32, item: char) -> Self {
        Self::Read {
            tx: TransactionId(tx),
            item: DataItem(item),
        }
    }

    #[must_use]
    pub const fn write(tx: u32, item: char) -> Self {
        Self::Write {
            tx: TransactionId(tx),
            item: DataItem(item),
        }
    }

    #[must_use]
    pub const fn commit(tx: u32) -> Self {
        Self::Commit {
            tx: TransactionId(tx),
        }
    }

    #[must_use]
    pub const fn transaction(&self) -> TransactionId {
        match self {
            Self::Read { tx, .. } | Self::Write { tx, .. } | Self::Commit { tx } => *tx,
        }
    }

    /// The data item touched by a read or write; `None` for commits.
    #[must_use]
    pub const fn item(&self) -> Option<DataItem> {
        match self {
            Self::Read { item, .. } | Self::Write { item, .. } => Some(*item),
            Self::Commit { .. } => None,
        }
    }

    #[must_use]
    pub const fn is_write(&self) -> bool {
        matches!(self, Self::Write { .. })
    }

    #[must_use]
    pub const fn is_commit(&self) -> bool {
        matches!(self, Self::Commit { .. })
    }

    /// Two operations conflict when they belong to different transactions,
    /// touch the same item and at least one of them is a write.
    #[must_use]
    pub fn conflicts_with(&self, other: &Self) -> bool {
        match (self.item(), other.item()) {
            (Some(a), Some(b)) => {
                a == b
                    && self.transaction() != other.transaction()
                    && (self.is_write() || other.is_write())
            }
            _ => false,
        }
    }
}

impl Display for Operation {
    fn fmt(&self, f: &mut Formatter) -> Result {
        match self {
            Self::Read { tx, item } => write!(f, "r{tx} {item}"),
            Self::Write { tx, item } => write!(f, "w{tx} {item}"),
            Self::Commit { tx } => write!(f, "c{tx}"),
        }
    }
}

/// An ordered, immutable log of operations.
#[cfg_attr(feature = "serde", derive(::serde::Serialize, ::serde::Deserialize))]
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Schedule {
    operations: Vec<Operation>,
}

impl Schedule {
    #[must_use]
    pub const fn new(operations: Vec<Operation>) -> Self {
        Self { operations }
    }

    #[must_use]
    pub fn operations(&self) -> &[Operation] {
        &self.operations
    }

    pub fn iter(&self) -> core::slice::Iter<'_, Operation> {
        self.operations.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.operations.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    /// Distinct transaction identifiers, ascending.
    #[must_use]
    pub fn participants(&self) -> BTreeSet<TransactionId> {
        self.operations.iter().map(Operation::transaction).collect()
    }

    /// Largest transaction identifier, or `None` for an empty schedule.
    /// The precedence graph is sized by this value.
    #[must_use]
    pub fn max_transaction_id(&self) -> Option<TransactionId> {
        self.operations.iter().map(Operation::transaction).max()
    }

    /// Groups the operations by transaction, keeping each transaction's
    /// relative order.
    #[must_use]
    pub fn split_by_transaction(&self) -> TransactionSet {
        let mut by_transaction: BTreeMap<TransactionId, Vec<Operation>> = BTreeMap::new();
        for op in &self.operations {
            by_transaction.entry(op.transaction()).or_default().push(*op);
        }
        TransactionSet(by_transaction)
    }
}

impl From<Vec<Operation>> for Schedule {
    fn from(operations: Vec<Operation>) -> Self {
        Self::new(operations)
    }
}

impl FromIterator<Operation> for Schedule {
    fn from_iter<I: IntoIterator<Item = Operation>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a Schedule {
    type Item = &'a Operation;
    type IntoIter = core::slice::Iter<'a, Operation>;

    fn into_iter(self) -> Self::IntoIter {
        self.operations.iter()
    }
}

/// Operation lists keyed by transaction, each in its original order
/// (commit included). This is the template random interleavings are drawn from.
#[cfg_attr(feature = "serde", derive(::serde::Serialize, ::serde::Deserialize))]
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct TransactionSet(pub BTreeMap<TransactionId, Vec<Operation>>);

impl TransactionSet {
    #[must_use]
    pub fn transactions(&self) -> BTreeSet<TransactionId> {
        self.0.keys().copied().collect()
    }

    #[must_use]
    pub fn operations_of(&self, tx: TransactionId) -> &[Operation] {
        self.0.get(&tx).map_or(&[][..], Vec::as_slice)
    }

    /// Total number of operations over all transactions.
    #[must_use]
    pub fn operation_count(&self) -> usize {
        self.0.values().map(Vec::len).sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.operation_count() == 0
    }

    /// The serial schedule running every transaction to completion in
    /// ascending id order.
    #[must_use]
    pub fn interleave_serially(&self) -> Schedule {
        self.0.values().flatten().copied().collect()
    }
}

impl From<&Schedule> for TransactionSet {
    fn from(schedule: &Schedule) -> Self {
        schedule.split_by_transaction()
    }
}
