use crate::application::services::{AccountService, TransactionService};
use crate::config::Config;
use crate::domain::ports::{AccountStoreRef, LedgerStoreRef};
use crate::error::Result;
use crate::infrastructure::in_memory::InMemoryStore;
use std::sync::Arc;

/// Which storage backend a context was built with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    InMemory,
    RocksDb,
}

/// Everything a command needs, assembled once from [`Config`] and passed down explicitly.
#[derive(Clone)]
pub struct AppContext {
    pub config: Config,
    pub backend: Backend,
    pub accounts: AccountService,
    pub transactions: TransactionService,
}

impl AppContext {
    /// Opens the configured store and wires the services to it.
    ///
    /// A `db_path` selects RocksDB when the `storage-rocksdb` feature is enabled. Without the
    /// feature the path is ignored with a warning and the in-memory store is used.
    pub fn build(config: Config) -> Result<Self> {
        let (backend, account_store, ledger_store) = Self::open_store(&config)?;
        tracing::debug!(?backend, "storage ready");
        Ok(Self::from_stores(config, backend, account_store, ledger_store))
    }

    /// Wires services to caller-supplied stores.
    pub fn from_stores(
        config: Config,
        backend: Backend,
        account_store: AccountStoreRef,
        ledger_store: LedgerStoreRef,
    ) -> Self {
        Self {
            config,
            backend,
            accounts: AccountService::new(account_store),
            transactions: TransactionService::new(ledger_store),
        }
    }

    fn in_memory(config: &Config) -> (Backend, AccountStoreRef, LedgerStoreRef) {
        let store = InMemoryStore::new(config.lock_timeout);
        (Backend::InMemory, Arc::new(store.clone()), Arc::new(store))
    }

    #[cfg(feature = "storage-rocksdb")]
    fn open_store(config: &Config) -> Result<(Backend, AccountStoreRef, LedgerStoreRef)> {
        use crate::infrastructure::rocksdb::RocksDBStore;

        match &config.db_path {
            Some(path) => {
                let store = RocksDBStore::open(path, config.lock_timeout)?;
                Ok((Backend::RocksDb, Arc::new(store.clone()), Arc::new(store)))
            }
            None => Ok(Self::in_memory(config)),
        }
    }

    #[cfg(not(feature = "storage-rocksdb"))]
    fn open_store(config: &Config) -> Result<(Backend, AccountStoreRef, LedgerStoreRef)> {
        if let Some(path) = &config.db_path {
            tracing::warn!(
                db_path = %path.display(),
                "persistent storage requested but the 'storage-rocksdb' feature is not enabled, falling back to in-memory storage"
            );
        }
        Ok(Self::in_memory(config))
    }
}
