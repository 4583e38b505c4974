use crate::domain::account::AccountId;
use crate::error::{Result, StorageError};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

type Registry = Arc<Mutex<HashMap<AccountId, Arc<AsyncMutex<()>>>>>;

/// Guard proving exclusive access to one account. The lock is released on drop, and the
/// registry entry with it once no one else holds or waits for that account.
pub struct AccountGuard {
    guard: Option<OwnedMutexGuard<()>>,
    account_id: AccountId,
    registry: Registry,
}

impl Drop for AccountGuard {
    fn drop(&mut self) {
        self.guard.take();
        evict_if_unused(&self.registry, self.account_id);
    }
}

// Waiters clone the entry's `Arc` under the registry lock, so a count of one means only
// the map still refers to it.
fn evict_if_unused(registry: &Registry, account_id: AccountId) {
    let mut locks = registry.lock().unwrap_or_else(PoisonError::into_inner);
    if locks
        .get(&account_id)
        .is_some_and(|mutex| Arc::strong_count(mutex) == 1)
    {
        locks.remove(&account_id);
    }
}

/// One async mutex per account id.
///
/// Two transfers touching the same account serialize on its mutex, transfers on disjoint
/// accounts never contend. Callers that need several accounts must acquire them in
/// ascending id order. Entries live only while the account is held or awaited.
#[derive(Clone)]
pub struct AccountLocks {
    locks: Registry,
    timeout: Duration,
}

impl AccountLocks {
    pub fn new(timeout: Duration) -> Self {
        Self {
            locks: Arc::new(Mutex::new(HashMap::new())),
            timeout,
        }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Number of accounts currently held or awaited.
    pub fn len(&self) -> usize {
        self.locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Waits for the lock on `account_id`, giving up with `LockTimeout` after the
    /// configured timeout.
    pub async fn acquire(&self, account_id: AccountId) -> Result<AccountGuard> {
        let mutex = {
            let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
            locks.entry(account_id).or_default().clone()
        };

        let acquired = tokio::time::timeout(self.timeout, mutex.lock_owned()).await;
        match acquired {
            Ok(guard) => Ok(AccountGuard {
                guard: Some(guard),
                account_id,
                registry: self.locks.clone(),
            }),
            Err(_) => {
                evict_if_unused(&self.locks, account_id);
                Err(StorageError::LockTimeout(account_id).into())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LedgerError;

    fn id(value: i64) -> AccountId {
        AccountId::new(value).unwrap()
    }

    #[tokio::test]
    async fn test_same_account_times_out_while_held() {
        let locks = AccountLocks::new(Duration::from_millis(20));
        let _guard = locks.acquire(id(1)).await.unwrap();

        let second = locks.acquire(id(1)).await;
        assert!(matches!(
            second,
            Err(LedgerError::Storage(StorageError::LockTimeout(a))) if a == id(1)
        ));
    }

    #[tokio::test]
    async fn test_distinct_accounts_do_not_contend() {
        let locks = AccountLocks::new(Duration::from_millis(20));
        let _a = locks.acquire(id(1)).await.unwrap();
        let _b = locks.acquire(id(2)).await.unwrap();
    }

    #[tokio::test]
    async fn test_lock_released_on_drop() {
        let locks = AccountLocks::new(Duration::from_millis(20));
        let guard = locks.acquire(id(1)).await.unwrap();
        drop(guard);
        assert!(locks.acquire(id(1)).await.is_ok());
    }

    #[tokio::test]
    async fn test_waiter_proceeds_once_released() {
        let locks = AccountLocks::new(Duration::from_secs(5));
        let guard = locks.acquire(id(1)).await.unwrap();

        let waiter = {
            let locks = locks.clone();
            tokio::spawn(async move { locks.acquire(id(1)).await.map(|_| ()) })
        };
        tokio::time::sleep(Duration::from_millis(10)).await;
        drop(guard);

        assert!(waiter.await.unwrap().is_ok());
    }

    #[tokio::test]
    async fn test_registry_forgets_released_accounts() {
        let locks = AccountLocks::new(Duration::from_millis(20));
        for value in 1..=100 {
            drop(locks.acquire(id(value)).await.unwrap());
        }
        assert!(locks.is_empty());

        let held = locks.acquire(id(1)).await.unwrap();
        assert_eq!(locks.len(), 1);
        assert!(locks.acquire(id(1)).await.is_err());
        // The timed-out waiter must not evict the entry the holder still uses.
        assert_eq!(locks.len(), 1);
        drop(held);
        assert!(locks.is_empty());
    }

    #[tokio::test]
    async fn test_entry_survives_while_a_waiter_is_queued() {
        let locks = AccountLocks::new(Duration::from_secs(5));
        let held = locks.acquire(id(1)).await.unwrap();

        let waiter = {
            let locks = locks.clone();
            tokio::spawn(async move {
                let guard = locks.acquire(id(1)).await.unwrap();
                tokio::time::sleep(Duration::from_millis(10)).await;
                drop(guard);
            })
        };
        tokio::time::sleep(Duration::from_millis(10)).await;
        drop(held);
        assert_eq!(locks.len(), 1);

        waiter.await.unwrap();
        assert!(locks.is_empty());
    }
}
