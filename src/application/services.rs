use crate::application::engine::TransferEngine;
use crate::domain::account::{Account, AccountId};
use crate::domain::money::Money;
use crate::domain::ports::{AccountStoreRef, LedgerStoreRef};
use crate::domain::transaction::TransferRecord;
use crate::error::{LedgerError, Result};

fn parse_account_id(raw: i64, field: &str) -> Result<AccountId> {
    AccountId::new(raw)
        .map_err(|_| LedgerError::Validation(format!("{field} must be a positive integer")))
}

/// Creates and reads accounts.
#[derive(Clone)]
pub struct AccountService {
    store: AccountStoreRef,
}

impl AccountService {
    pub fn new(store: AccountStoreRef) -> Self {
        Self { store }
    }

    /// Opens `account_id` with `initial_balance`, given as decimal text.
    pub async fn create_account(&self, account_id: i64, initial_balance: &str) -> Result<Account> {
        let account_id = parse_account_id(account_id, "account_id")?;
        if initial_balance.trim().is_empty() {
            return Err(LedgerError::InvalidBalance(
                "initial_balance is required".to_string(),
            ));
        }
        let balance =
            Money::parse(initial_balance).map_err(|e| LedgerError::InvalidBalance(e.to_string()))?;
        let account = Account::open(account_id, balance)?;

        self.store.create(account.clone()).await?;
        tracing::info!(account_id = %account_id, balance = %balance, "account created");
        Ok(account)
    }

    pub async fn get_account(&self, account_id: i64) -> Result<Account> {
        let account_id = parse_account_id(account_id, "account_id")?;
        self.store
            .get(account_id)
            .await?
            .ok_or(LedgerError::AccountNotFound(account_id))
    }

    /// All accounts, ordered by id.
    pub async fn list_accounts(&self) -> Result<Vec<Account>> {
        let mut accounts = self.store.get_all().await?;
        accounts.sort_by_key(|a| a.account_id);
        Ok(accounts)
    }
}

/// Submits transfers to the engine and reads the ledger.
#[derive(Clone)]
pub struct TransactionService {
    engine: TransferEngine,
    ledger: LedgerStoreRef,
}

impl TransactionService {
    pub fn new(ledger: LedgerStoreRef) -> Self {
        Self {
            engine: TransferEngine::new(ledger.clone()),
            ledger,
        }
    }

    pub async fn submit_transfer(
        &self,
        source_id: i64,
        destination_id: i64,
        amount: &str,
    ) -> Result<TransferRecord> {
        let source = parse_account_id(source_id, "source_account_id")?;
        let destination = parse_account_id(destination_id, "destination_account_id")?;
        if amount.trim().is_empty() {
            return Err(LedgerError::Validation("amount is required".to_string()));
        }
        let amount = Money::parse(amount)?;

        self.engine.transfer(source, destination, amount).await
    }

    /// Every committed transfer, ordered by id.
    pub async fn list_transfers(&self) -> Result<Vec<TransferRecord>> {
        self.ledger.transfers().await
    }
}
