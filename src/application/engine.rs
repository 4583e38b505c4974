use crate::domain::account::AccountId;
use crate::domain::money::Money;
use crate::domain::ports::{AtomicUnit, LedgerStoreRef};
use crate::domain::transaction::{NewTransfer, TransferRecord, TransferStage};
use crate::error::{LedgerError, Result};

/// Moves funds between two accounts as one all-or-nothing unit.
///
/// Every transfer runs inside an [`AtomicUnit`]: both accounts are locked in ascending id
/// order, the source balance is checked and debited under its lock, the destination is
/// credited, the ledger entry is appended, and only then is the unit committed. Any error
/// on the way rolls the unit back, so no partial debit or credit is ever visible.
///
/// The engine keeps no state of its own; every check reads the store's committed value.
#[derive(Clone)]
pub struct TransferEngine {
    ledger: LedgerStoreRef,
}

impl TransferEngine {
    pub fn new(ledger: LedgerStoreRef) -> Self {
        Self { ledger }
    }

    /// Executes a transfer and returns the committed ledger record.
    ///
    /// # Errors
    ///
    /// * `Validation` if source equals destination or the amount is not strictly positive.
    /// * `SourceNotFound` / `DestinationNotFound` if either account is missing.
    /// * `InsufficientFunds` if the source balance does not cover the amount.
    /// * `Storage` if the unit could not be completed; nothing was applied.
    pub async fn transfer(
        &self,
        source: AccountId,
        destination: AccountId,
        amount: Money,
    ) -> Result<TransferRecord> {
        if source == destination {
            return Err(LedgerError::Validation(
                "source and destination accounts must not be the same".to_string(),
            ));
        }
        if !amount.is_positive() {
            return Err(LedgerError::Validation(format!(
                "amount must be a positive number, got {amount}"
            )));
        }

        let transfer = NewTransfer {
            source,
            destination,
            amount,
        };
        let mut unit = self.ledger.begin().await?;
        let mut stage = TransferStage::Validated;

        match Self::apply(&mut *unit, transfer, &mut stage).await {
            Ok(record) => {
                Self::advance(&mut stage, TransferStage::Committed);
                tracing::info!(
                    transfer_id = record.id,
                    source = %source,
                    destination = %destination,
                    amount = %amount,
                    "transfer committed"
                );
                Ok(record)
            }
            Err(err) => {
                let failed_at = stage;
                Self::advance(&mut stage, TransferStage::Aborted);
                if let Err(rollback_err) = unit.rollback().await {
                    tracing::error!(error = %rollback_err, "rollback failed");
                }
                tracing::warn!(
                    source = %source,
                    destination = %destination,
                    amount = %amount,
                    failed_at = %failed_at,
                    error = %err,
                    "transfer aborted"
                );
                Err(err)
            }
        }
    }

    async fn apply(
        unit: &mut dyn AtomicUnit,
        transfer: NewTransfer,
        stage: &mut TransferStage,
    ) -> Result<TransferRecord> {
        let NewTransfer {
            source,
            destination,
            amount,
        } = transfer;

        // Canonical order: lower id first, so opposite transfers cannot deadlock.
        let (first, second) = if source < destination {
            (source, destination)
        } else {
            (destination, source)
        };
        let first_account = unit.lock_account(first).await?;
        let second_account = unit.lock_account(second).await?;
        let (source_account, destination_account) = if first == source {
            (first_account, second_account)
        } else {
            (second_account, first_account)
        };

        let mut source_account = source_account.ok_or(LedgerError::SourceNotFound(source))?;
        let mut destination_account =
            destination_account.ok_or(LedgerError::DestinationNotFound(destination))?;

        if source_account.balance < amount {
            return Err(LedgerError::InsufficientFunds {
                account: source,
                balance: source_account.balance,
                requested: amount,
            });
        }
        Self::advance(stage, TransferStage::BalanceChecked);

        source_account.debit(amount)?;
        unit.update_balance(source, source_account.balance).await?;
        Self::advance(stage, TransferStage::Debited);

        destination_account.credit(amount)?;
        unit.update_balance(destination, destination_account.balance)
            .await?;
        Self::advance(stage, TransferStage::Credited);

        let record = unit.append_transfer(transfer).await?;
        Self::advance(stage, TransferStage::Logged);

        unit.commit().await?;
        Ok(record)
    }

    fn advance(stage: &mut TransferStage, next: TransferStage) {
        tracing::debug!(from = %stage, to = %next, "transfer stage");
        *stage = next;
    }
}
