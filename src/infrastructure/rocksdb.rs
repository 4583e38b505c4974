use crate::domain::account::{Account, AccountId};
use crate::domain::money::Money;
use crate::domain::ports::{AccountStore, AtomicUnit, LedgerStore};
use crate::domain::transaction::{NewTransfer, TransferRecord};
use crate::error::{LedgerError, Result, StorageError};
use crate::infrastructure::locks::{AccountGuard, AccountLocks};
use async_trait::async_trait;
use rocksdb::{ColumnFamily, ColumnFamilyDescriptor, DB, IteratorMode, Options, WriteBatch};
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Column Family for storing account rows.
pub const CF_ACCOUNTS: &str = "accounts";
/// Column Family for storing the transfer log.
pub const CF_TRANSACTIONS: &str = "transactions";

/// A persistent store implementation using RocksDB.
///
/// Accounts and transfer records live in separate Column Families, keyed by big-endian
/// ids and stored as JSON with money as decimal text. A commit writes every staged row in a
/// single `WriteBatch`, so balance updates and the ledger entry become durable together.
///
/// This struct is thread-safe (`Clone` shares the underlying `Arc<DB>` and lock registry).
#[derive(Clone)]
pub struct RocksDBStore {
    db: Arc<DB>,
    locks: AccountLocks,
    next_transfer_id: Arc<AtomicU64>,
}

impl RocksDBStore {
    /// Opens or creates a RocksDB instance at the specified path.
    ///
    /// Ensures that the required column families exist and resumes transfer ids after the
    /// highest one already stored.
    pub fn open<P: AsRef<Path>>(path: P, lock_timeout: Duration) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let cf_accounts = ColumnFamilyDescriptor::new(CF_ACCOUNTS, Options::default());
        let cf_transactions = ColumnFamilyDescriptor::new(CF_TRANSACTIONS, Options::default());

        let db = DB::open_cf_descriptors(&opts, path, vec![cf_accounts, cf_transactions])
            .map_err(StorageError::from)?;

        let store = Self {
            db: Arc::new(db),
            locks: AccountLocks::new(lock_timeout),
            next_transfer_id: Arc::new(AtomicU64::new(1)),
        };
        let last_id = store.last_transfer_id()?;
        store.next_transfer_id.store(last_id + 1, Ordering::SeqCst);
        tracing::debug!(last_transfer_id = last_id, "opened RocksDB ledger");

        Ok(store)
    }

    fn cf(&self, name: &str) -> Result<&ColumnFamily> {
        self.db.cf_handle(name).ok_or_else(|| {
            StorageError::Backend(format!("{name} column family not found")).into()
        })
    }

    fn last_transfer_id(&self) -> Result<u64> {
        let cf = self.cf(CF_TRANSACTIONS)?;
        match self.db.iterator_cf(cf, IteratorMode::End).next() {
            Some(item) => {
                let (key, _value) = item.map_err(StorageError::from)?;
                let bytes = <[u8; 8]>::try_from(&key[..]).map_err(|_| {
                    StorageError::Corrupted(format!("transfer key has {} bytes", key.len()))
                })?;
                Ok(u64::from_be_bytes(bytes))
            }
            None => Ok(0),
        }
    }

    fn read_account(&self, account_id: AccountId) -> Result<Option<Account>> {
        let cf = self.cf(CF_ACCOUNTS)?;
        let result = self
            .db
            .get_cf(cf, account_id.to_key())
            .map_err(StorageError::from)?;

        match result {
            Some(bytes) => {
                let account = serde_json::from_slice(&bytes).map_err(StorageError::from)?;
                Ok(Some(account))
            }
            None => Ok(None),
        }
    }
}

#[async_trait]
impl AccountStore for RocksDBStore {
    async fn create(&self, account: Account) -> Result<()> {
        let _guard = self.locks.acquire(account.account_id).await?;
        if self.read_account(account.account_id)?.is_some() {
            return Err(LedgerError::DuplicateAccount(account.account_id));
        }

        let cf = self.cf(CF_ACCOUNTS)?;
        let value = serde_json::to_vec(&account).map_err(StorageError::from)?;
        self.db
            .put_cf(cf, account.account_id.to_key(), value)
            .map_err(StorageError::from)?;

        Ok(())
    }

    async fn get(&self, account_id: AccountId) -> Result<Option<Account>> {
        self.read_account(account_id)
    }

    async fn get_all(&self) -> Result<Vec<Account>> {
        let cf = self.cf(CF_ACCOUNTS)?;

        let mut accounts = Vec::new();
        for item in self.db.iterator_cf(cf, IteratorMode::Start) {
            let (_key, value) = item.map_err(StorageError::from)?;
            let account: Account = serde_json::from_slice(&value).map_err(StorageError::from)?;
            accounts.push(account);
        }

        Ok(accounts)
    }
}

#[async_trait]
impl LedgerStore for RocksDBStore {
    async fn begin(&self) -> Result<Box<dyn AtomicUnit>> {
        Ok(Box::new(RocksDBUnit {
            store: self.clone(),
            guards: HashMap::new(),
            staged_accounts: BTreeMap::new(),
            staged_transfers: Vec::new(),
            closed: false,
        }))
    }

    async fn transfers(&self) -> Result<Vec<TransferRecord>> {
        let cf = self.cf(CF_TRANSACTIONS)?;

        let mut transfers = Vec::new();
        for item in self.db.iterator_cf(cf, IteratorMode::Start) {
            let (_key, value) = item.map_err(StorageError::from)?;
            let record: TransferRecord =
                serde_json::from_slice(&value).map_err(StorageError::from)?;
            transfers.push(record);
        }

        Ok(transfers)
    }
}

/// Unit of work over a [`RocksDBStore`]. Staged rows are flushed in one `WriteBatch`.
pub struct RocksDBUnit {
    store: RocksDBStore,
    guards: HashMap<AccountId, AccountGuard>,
    staged_accounts: BTreeMap<AccountId, Account>,
    staged_transfers: Vec<TransferRecord>,
    closed: bool,
}

impl RocksDBUnit {
    fn ensure_open(&self) -> Result<()> {
        if self.closed {
            return Err(StorageError::Closed.into());
        }
        Ok(())
    }
}

#[async_trait]
impl AtomicUnit for RocksDBUnit {
    async fn lock_account(&mut self, account_id: AccountId) -> Result<Option<Account>> {
        self.ensure_open()?;
        if !self.guards.contains_key(&account_id) {
            let guard = self.store.locks.acquire(account_id).await?;
            self.guards.insert(account_id, guard);
        }

        if let Some(staged) = self.staged_accounts.get(&account_id) {
            return Ok(Some(staged.clone()));
        }
        self.store.read_account(account_id)
    }

    async fn update_balance(&mut self, account_id: AccountId, balance: Money) -> Result<()> {
        self.ensure_open()?;
        if !self.guards.contains_key(&account_id) {
            return Err(StorageError::NotLocked(account_id).into());
        }

        let mut account = match self.staged_accounts.remove(&account_id) {
            Some(account) => account,
            None => self.store.read_account(account_id)?.ok_or_else(|| {
                StorageError::Corrupted(format!("account {account_id} vanished while locked"))
            })?,
        };
        account.balance = balance;
        self.staged_accounts.insert(account_id, account);
        Ok(())
    }

    async fn append_transfer(&mut self, transfer: NewTransfer) -> Result<TransferRecord> {
        self.ensure_open()?;
        let id = self.store.next_transfer_id.fetch_add(1, Ordering::SeqCst);
        let record = TransferRecord::new(id, transfer);
        self.staged_transfers.push(record.clone());
        Ok(record)
    }

    async fn commit(&mut self) -> Result<()> {
        self.ensure_open()?;
        let cf_accounts = self.store.cf(CF_ACCOUNTS)?;
        let cf_transactions = self.store.cf(CF_TRANSACTIONS)?;

        let mut batch = WriteBatch::default();
        for (account_id, account) in &self.staged_accounts {
            let value = serde_json::to_vec(account).map_err(StorageError::from)?;
            batch.put_cf(cf_accounts, account_id.to_key(), value);
        }
        for record in &self.staged_transfers {
            let value = serde_json::to_vec(record).map_err(StorageError::from)?;
            batch.put_cf(cf_transactions, record.id.to_be_bytes(), value);
        }

        self.store.db.write(batch).map_err(StorageError::from)?;

        self.staged_accounts.clear();
        self.staged_transfers.clear();
        self.guards.clear();
        self.closed = true;
        Ok(())
    }

    async fn rollback(&mut self) -> Result<()> {
        self.staged_accounts.clear();
        self.staged_transfers.clear();
        self.guards.clear();
        self.closed = true;
        Ok(())
    }
}
