use crate::domain::money::Money;
use crate::error::{LedgerError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Caller-assigned account identifier. Always strictly positive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub struct AccountId(i64);

impl AccountId {
    pub fn new(value: i64) -> Result<Self> {
        if value > 0 {
            Ok(Self(value))
        } else {
            Err(LedgerError::Validation(format!(
                "account id must be a positive integer, got {value}"
            )))
        }
    }

    pub fn value(&self) -> i64 {
        self.0
    }

    /// Big-endian key bytes; byte order matches numeric order for positive ids.
    pub fn to_key(&self) -> [u8; 8] {
        self.0.to_be_bytes()
    }
}

impl TryFrom<i64> for AccountId {
    type Error = LedgerError;

    fn try_from(value: i64) -> Result<Self> {
        Self::new(value)
    }
}

impl From<AccountId> for i64 {
    fn from(id: AccountId) -> Self {
        id.0
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An account and its current balance.
///
/// The balance is only ever changed through [`Account::debit`] and [`Account::credit`],
/// which the transfer engine calls inside an atomic unit.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone)]
pub struct Account {
    pub account_id: AccountId,
    pub balance: Money,
}

impl Account {
    /// Opens an account with the given initial balance, which must not be negative.
    pub fn open(account_id: AccountId, initial_balance: Money) -> Result<Self> {
        if !initial_balance.is_non_negative() {
            return Err(LedgerError::InvalidBalance(format!(
                "initial balance must be non-negative, got {initial_balance}"
            )));
        }
        Ok(Self {
            account_id,
            balance: initial_balance,
        })
    }

    /// Removes `amount` from the balance if it covers it. Leaves the account untouched otherwise.
    pub fn debit(&mut self, amount: Money) -> Result<()> {
        if self.balance < amount {
            return Err(LedgerError::InsufficientFunds {
                account: self.account_id,
                balance: self.balance,
                requested: amount,
            });
        }
        self.balance = self.balance.checked_sub(amount)?;
        Ok(())
    }

    pub fn credit(&mut self, amount: Money) -> Result<()> {
        self.balance = self.balance.checked_add(amount)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use rust_decimal_macros::dec;

    fn id(value: i64) -> AccountId {
        AccountId::new(value).unwrap()
    }

    #[test]
    fn test_account_id_must_be_positive() {
        assert!(AccountId::new(1).is_ok());
        assert!(matches!(AccountId::new(0), Err(LedgerError::Validation(_))));
        assert!(matches!(AccountId::new(-3), Err(LedgerError::Validation(_))));
    }

    #[test]
    fn test_account_id_key_order_matches_numeric_order() {
        assert!(id(2).to_key() < id(256).to_key());
        assert!(id(255).to_key() < id(256).to_key());
    }

    #[test]
    fn test_open_rejects_negative_balance() {
        let result = Account::open(id(1), Money::new(dec!(-0.01)));
        assert!(matches!(result, Err(LedgerError::InvalidBalance(_))));

        let account = Account::open(id(1), Money::ZERO).unwrap();
        assert_eq!(account.balance, Money::ZERO);
    }

    #[test]
    fn test_account_debit_success() {
        let mut account = Account::open(id(1), Money::new(dec!(10.00))).unwrap();
        account.debit(Money::new(dec!(10.00))).unwrap();
        assert_eq!(account.balance, Money::ZERO);
    }

    #[test]
    fn test_account_debit_insufficient() {
        let mut account = Account::open(id(1), Money::new(dec!(10.00))).unwrap();
        let err = account.debit(Money::new(dec!(10.01))).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InsufficientFunds);
        assert_eq!(account.balance, Money::new(dec!(10.00)));
    }

    #[test]
    fn test_account_credit() {
        let mut account = Account::open(id(2), Money::new(dec!(0.00))).unwrap();
        account.credit(Money::new(dec!(30.00))).unwrap();
        assert_eq!(account.balance.to_string(), "30.00");
    }

    #[test]
    fn test_account_json_shape() {
        let account = Account::open(id(1), Money::new(dec!(70.00))).unwrap();
        let json = serde_json::to_string(&account).unwrap();
        assert_eq!(json, r#"{"account_id":1,"balance":"70.00"}"#);

        let back: Account = serde_json::from_str(&json).unwrap();
        assert_eq!(back, account);
        assert!(serde_json::from_str::<Account>(r#"{"account_id":0,"balance":"1"}"#).is_err());
    }
}
