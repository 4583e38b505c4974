#![allow(dead_code)]

use async_trait::async_trait;
use std::fs::File;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use tempfile::NamedTempFile;
use transfer_ledger::application::context::{AppContext, Backend};
use transfer_ledger::config::Config;
use transfer_ledger::domain::account::{Account, AccountId};
use transfer_ledger::domain::money::Money;
use transfer_ledger::domain::ports::{AccountStore, AtomicUnit, LedgerStore};
use transfer_ledger::domain::transaction::{NewTransfer, TransferRecord};
use transfer_ledger::error::{Result, StorageError};
use transfer_ledger::infrastructure::in_memory::InMemoryStore;

pub fn id(value: i64) -> AccountId {
    AccountId::new(value).unwrap()
}

pub fn money(text: &str) -> Money {
    Money::parse(text).unwrap()
}

/// In-memory store pre-populated with `(id, balance)` pairs.
pub async fn seeded_store(accounts: &[(i64, &str)]) -> InMemoryStore {
    let store = InMemoryStore::default();
    for (account_id, balance) in accounts {
        store
            .create(Account::open(id(*account_id), money(balance)).unwrap())
            .await
            .unwrap();
    }
    store
}

pub fn context_for(store: InMemoryStore) -> AppContext {
    AppContext::from_stores(
        Config::default(),
        Backend::InMemory,
        Arc::new(store.clone()),
        Arc::new(store),
    )
}

pub async fn balance_of(store: &InMemoryStore, account_id: i64) -> Money {
    store.get(id(account_id)).await.unwrap().unwrap().balance
}

/// Writes a command CSV (header included) to a temp file.
pub fn command_file(rows: &[&str]) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "type, account, destination, amount").unwrap();
    for row in rows {
        writeln!(file, "{row}").unwrap();
    }
    file
}

/// Generates `accounts` create rows followed by `transfers` transfer rows cycling over them.
pub fn generate_csv(path: &Path, accounts: usize, transfers: usize) -> std::io::Result<()> {
    let file = File::create(path)?;
    let mut wtr = csv::WriterBuilder::new().from_writer(file);

    wtr.write_record(["type", "account", "destination", "amount"])?;
    for account in 1..=accounts {
        wtr.write_record(["create", &account.to_string(), "", "1000.00"])?;
    }
    for i in 0..transfers {
        let source = i % accounts + 1;
        let destination = (i + 1) % accounts + 1;
        wtr.write_record([
            "transfer",
            &source.to_string(),
            &destination.to_string(),
            "0.01",
        ])?;
    }

    wtr.flush()?;
    Ok(())
}

/// Where a [`FaultyStore`] unit breaks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailPoint {
    /// Fails the credit after the debit was staged.
    SecondBalanceUpdate,
    AppendTransfer,
    Commit,
}

/// In-memory store whose units fail at a chosen step, standing in for a backend that goes
/// away mid-transfer.
#[derive(Clone)]
pub struct FaultyStore {
    pub inner: InMemoryStore,
    fail_at: FailPoint,
}

impl FaultyStore {
    pub fn new(inner: InMemoryStore, fail_at: FailPoint) -> Self {
        Self { inner, fail_at }
    }
}

#[async_trait]
impl LedgerStore for FaultyStore {
    async fn begin(&self) -> Result<Box<dyn AtomicUnit>> {
        Ok(Box::new(FaultyUnit {
            inner: self.inner.begin().await?,
            fail_at: self.fail_at,
            updates: 0,
        }))
    }

    async fn transfers(&self) -> Result<Vec<TransferRecord>> {
        self.inner.transfers().await
    }
}

struct FaultyUnit {
    inner: Box<dyn AtomicUnit>,
    fail_at: FailPoint,
    updates: usize,
}

fn unavailable() -> transfer_ledger::error::LedgerError {
    StorageError::Backend("connection reset".to_string()).into()
}

#[async_trait]
impl AtomicUnit for FaultyUnit {
    async fn lock_account(&mut self, account_id: AccountId) -> Result<Option<Account>> {
        self.inner.lock_account(account_id).await
    }

    async fn update_balance(&mut self, account_id: AccountId, balance: Money) -> Result<()> {
        self.updates += 1;
        if self.fail_at == FailPoint::SecondBalanceUpdate && self.updates == 2 {
            return Err(unavailable());
        }
        self.inner.update_balance(account_id, balance).await
    }

    async fn append_transfer(&mut self, transfer: NewTransfer) -> Result<TransferRecord> {
        if self.fail_at == FailPoint::AppendTransfer {
            return Err(unavailable());
        }
        self.inner.append_transfer(transfer).await
    }

    async fn commit(&mut self) -> Result<()> {
        if self.fail_at == FailPoint::Commit {
            return Err(unavailable());
        }
        self.inner.commit().await
    }

    async fn rollback(&mut self) -> Result<()> {
        self.inner.rollback().await
    }
}
