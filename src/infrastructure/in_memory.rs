use crate::domain::account::{Account, AccountId};
use crate::domain::money::Money;
use crate::domain::ports::{AccountStore, AtomicUnit, LedgerStore};
use crate::domain::transaction::{NewTransfer, TransferRecord};
use crate::error::{LedgerError, Result, StorageError};
use crate::infrastructure::locks::{AccountGuard, AccountLocks};
use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::RwLock;

#[derive(Default)]
struct LedgerState {
    accounts: HashMap<AccountId, Account>,
    transfers: BTreeMap<u64, TransferRecord>,
}

/// A thread-safe in-memory ledger.
///
/// Accounts and transfer records live behind one `RwLock` so that a commit can publish
/// both balance updates and the ledger entry under a single write guard. Per-account
/// exclusivity during a transfer comes from [`AccountLocks`].
///
/// Used for tests and for runs that do not need persistence.
#[derive(Clone)]
pub struct InMemoryStore {
    state: Arc<RwLock<LedgerState>>,
    locks: AccountLocks,
    next_transfer_id: Arc<AtomicU64>,
}

impl InMemoryStore {
    pub fn new(lock_timeout: Duration) -> Self {
        Self {
            state: Arc::new(RwLock::new(LedgerState::default())),
            locks: AccountLocks::new(lock_timeout),
            next_transfer_id: Arc::new(AtomicU64::new(1)),
        }
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new(Duration::from_secs(5))
    }
}

#[async_trait]
impl AccountStore for InMemoryStore {
    async fn create(&self, account: Account) -> Result<()> {
        let _guard = self.locks.acquire(account.account_id).await?;
        let mut state = self.state.write().await;
        if state.accounts.contains_key(&account.account_id) {
            return Err(LedgerError::DuplicateAccount(account.account_id));
        }
        state.accounts.insert(account.account_id, account);
        Ok(())
    }

    async fn get(&self, account_id: AccountId) -> Result<Option<Account>> {
        let state = self.state.read().await;
        Ok(state.accounts.get(&account_id).cloned())
    }

    async fn get_all(&self) -> Result<Vec<Account>> {
        let state = self.state.read().await;
        let mut accounts: Vec<Account> = state.accounts.values().cloned().collect();
        accounts.sort_by_key(|a| a.account_id);
        Ok(accounts)
    }
}

#[async_trait]
impl LedgerStore for InMemoryStore {
    async fn begin(&self) -> Result<Box<dyn AtomicUnit>> {
        Ok(Box::new(InMemoryUnit {
            store: self.clone(),
            guards: HashMap::new(),
            staged_balances: BTreeMap::new(),
            staged_transfers: Vec::new(),
            closed: false,
        }))
    }

    async fn transfers(&self) -> Result<Vec<TransferRecord>> {
        let state = self.state.read().await;
        Ok(state.transfers.values().cloned().collect())
    }
}

/// Unit of work over an [`InMemoryStore`]. Writes are staged locally and only reach the
/// shared state in `commit`.
pub struct InMemoryUnit {
    store: InMemoryStore,
    guards: HashMap<AccountId, AccountGuard>,
    staged_balances: BTreeMap<AccountId, Money>,
    staged_transfers: Vec<TransferRecord>,
    closed: bool,
}

impl InMemoryUnit {
    fn ensure_open(&self) -> Result<()> {
        if self.closed {
            return Err(StorageError::Closed.into());
        }
        Ok(())
    }
}

#[async_trait]
impl AtomicUnit for InMemoryUnit {
    async fn lock_account(&mut self, account_id: AccountId) -> Result<Option<Account>> {
        self.ensure_open()?;
        if !self.guards.contains_key(&account_id) {
            let guard = self.store.locks.acquire(account_id).await?;
            self.guards.insert(account_id, guard);
        }

        let state = self.store.state.read().await;
        let account = state.accounts.get(&account_id).cloned().map(|mut account| {
            if let Some(balance) = self.staged_balances.get(&account_id) {
                account.balance = *balance;
            }
            account
        });
        Ok(account)
    }

    async fn update_balance(&mut self, account_id: AccountId, balance: Money) -> Result<()> {
        self.ensure_open()?;
        if !self.guards.contains_key(&account_id) {
            return Err(StorageError::NotLocked(account_id).into());
        }
        self.staged_balances.insert(account_id, balance);
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
        let mut state = self.store.state.write().await;

        for account_id in self.staged_balances.keys() {
            if !state.accounts.contains_key(account_id) {
                return Err(StorageError::Corrupted(format!(
                    "account {account_id} vanished before commit"
                ))
                .into());
            }
        }
        for (account_id, balance) in std::mem::take(&mut self.staged_balances) {
            if let Some(account) = state.accounts.get_mut(&account_id) {
                account.balance = balance;
            }
        }
        // Ids are handed out before commit, so concurrent units may publish out of order.
        for record in self.staged_transfers.drain(..) {
            state.transfers.insert(record.id, record);
        }
        drop(state);

        self.guards.clear();
        self.closed = true;
        Ok(())
    }

    async fn rollback(&mut self) -> Result<()> {
        self.staged_balances.clear();
        self.staged_transfers.clear();
        self.guards.clear();
        self.closed = true;
        Ok(())
    }
}
