use crate::domain::account::AccountId;
use crate::domain::money::{Money, MoneyError};
use thiserror::Error;

pub type Result<T, E = LedgerError> = std::result::Result<T, E>;

/// Coarse classification of a [`LedgerError`], used by callers to decide how to react.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    NotFound,
    InsufficientFunds,
    Conflict,
    Storage,
}

#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("validation error: {0}")]
    Validation(String),
    #[error("invalid balance: {0}")]
    InvalidBalance(String),
    #[error("account {0} already exists")]
    DuplicateAccount(AccountId),
    #[error("account {0} not found")]
    AccountNotFound(AccountId),
    #[error("source account {0} not found")]
    SourceNotFound(AccountId),
    #[error("destination account {0} not found")]
    DestinationNotFound(AccountId),
    #[error("insufficient funds in account {account}: balance {balance}, requested {requested}")]
    InsufficientFunds {
        account: AccountId,
        balance: Money,
        requested: Money,
    },
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl LedgerError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) | Self::InvalidBalance(_) | Self::Csv(_) => ErrorKind::Validation,
            Self::AccountNotFound(_) | Self::SourceNotFound(_) | Self::DestinationNotFound(_) => {
                ErrorKind::NotFound
            }
            Self::InsufficientFunds { .. } => ErrorKind::InsufficientFunds,
            Self::DuplicateAccount(_) => ErrorKind::Conflict,
            Self::Storage(_) | Self::Io(_) => ErrorKind::Storage,
        }
    }

    /// Only storage failures may succeed when resubmitted unchanged.
    pub fn is_retriable(&self) -> bool {
        self.kind() == ErrorKind::Storage
    }
}

impl From<MoneyError> for LedgerError {
    fn from(err: MoneyError) -> Self {
        Self::Validation(err.to_string())
    }
}

/// Failures raised by a persistence backend.
///
/// Whenever one of these aborts a transfer, the atomic unit is discarded and no balance
/// change is visible.
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("timed out waiting for the lock on account {0}")]
    LockTimeout(AccountId),
    #[error("account {0} was not locked by this unit of work")]
    NotLocked(AccountId),
    #[error("unit of work is already closed")]
    Closed,
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("corrupted record: {0}")]
    Corrupted(String),
    #[error("backend unavailable: {0}")]
    Backend(String),
    #[cfg(feature = "storage-rocksdb")]
    #[error("RocksDB error: {0}")]
    RocksDb(#[from] rocksdb::Error),
}
