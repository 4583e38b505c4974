use super::account::{Account, AccountId};
use super::money::Money;
use super::transaction::{NewTransfer, TransferRecord};
use crate::error::Result;
use async_trait::async_trait;
use std::sync::Arc;

/// Read access to accounts, plus creation. Balances change only through an [`AtomicUnit`].
#[async_trait]
pub trait AccountStore: Send + Sync {
    /// Inserts a new account. Fails with `DuplicateAccount` if the id is taken.
    async fn create(&self, account: Account) -> Result<()>;
    /// Reads the last committed state of an account.
    async fn get(&self, account_id: AccountId) -> Result<Option<Account>>;
    async fn get_all(&self) -> Result<Vec<Account>>;
}

/// Access to the ledger: the append-only transfer log and the atomic units that write it.
#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// Starts a unit of work. Nothing done through it is visible until `commit`.
    async fn begin(&self) -> Result<Box<dyn AtomicUnit>>;
    /// All committed transfer records, ordered by id.
    async fn transfers(&self) -> Result<Vec<TransferRecord>>;
}

/// A unit of work spanning account locks, balance updates and one ledger insert.
///
/// Locks taken through `lock_account` are held until the unit is dropped. Dropping a unit
/// without calling `commit` discards every staged change.
#[async_trait]
pub trait AtomicUnit: Send {
    /// Acquires the exclusive lock for `account_id` and reads the account under it.
    ///
    /// Returns `Ok(None)` if the account does not exist; the lock is held either way.
    async fn lock_account(&mut self, account_id: AccountId) -> Result<Option<Account>>;
    /// Stages a new balance for an account previously locked by this unit.
    async fn update_balance(&mut self, account_id: AccountId, balance: Money) -> Result<()>;
    /// Stages a ledger insert and returns the record as it will be committed.
    async fn append_transfer(&mut self, transfer: NewTransfer) -> Result<TransferRecord>;
    /// Makes every staged change visible at once.
    async fn commit(&mut self) -> Result<()>;
    /// Discards staged changes and releases the locks.
    async fn rollback(&mut self) -> Result<()>;
}

pub type AccountStoreRef = Arc<dyn AccountStore>;
pub type LedgerStoreRef = Arc<dyn LedgerStore>;
