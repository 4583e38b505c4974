use crate::domain::account::AccountId;
use crate::domain::money::Money;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A funds movement that has passed validation but is not yet part of the ledger.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct NewTransfer {
    pub source: AccountId,
    pub destination: AccountId,
    pub amount: Money,
}

/// An immutable ledger entry. Written once, in the same atomic unit as the two balance
/// updates it describes.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone)]
pub struct TransferRecord {
    /// Monotonic ordinal assigned by the store. Gaps are possible after rollbacks.
    pub id: u64,
    pub source_account_id: AccountId,
    pub destination_account_id: AccountId,
    pub amount: Money,
    pub created_at: DateTime<Utc>,
}

impl TransferRecord {
    pub fn new(id: u64, transfer: NewTransfer) -> Self {
        Self {
            id,
            source_account_id: transfer.source,
            destination_account_id: transfer.destination,
            amount: transfer.amount,
            created_at: Utc::now(),
        }
    }
}

/// Progress of a single transfer attempt.
///
/// `Aborted` is reachable from every stage before `Committed`.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Default)]
pub enum TransferStage {
    #[default]
    Validated,
    BalanceChecked,
    Debited,
    Credited,
    Logged,
    Committed,
    Aborted,
}

impl TransferStage {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Committed | Self::Aborted)
    }
}

impl fmt::Display for TransferStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Validated => "validated",
            Self::BalanceChecked => "balance_checked",
            Self::Debited => "debited",
            Self::Credited => "credited",
            Self::Logged => "logged",
            Self::Committed => "committed",
            Self::Aborted => "aborted",
        };
        f.write_str(name)
    }
}
