use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_LOCK_TIMEOUT_MS: u64 = 5_000;
pub const DEFAULT_WORKERS: usize = 8;

/// Runtime settings, built once at startup and handed to [`AppContext`](crate::application::context::AppContext).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// RocksDB directory. `None` selects the in-memory store.
    pub db_path: Option<PathBuf>,
    /// How long a transfer waits for an account lock before failing with a retriable error.
    pub lock_timeout: Duration,
    /// Maximum number of transfers in flight while processing a command file.
    pub workers: usize,
    pub log_json: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            db_path: None,
            lock_timeout: Duration::from_millis(DEFAULT_LOCK_TIMEOUT_MS),
            workers: DEFAULT_WORKERS,
            log_json: false,
        }
    }
}

impl Config {
    pub fn with_db_path(mut self, db_path: Option<PathBuf>) -> Self {
        self.db_path = db_path;
        self
    }

    pub fn with_lock_timeout(mut self, lock_timeout: Duration) -> Self {
        self.lock_timeout = lock_timeout;
        self
    }

    /// Sets the worker count; zero is treated as one.
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    pub fn with_log_json(mut self, log_json: bool) -> Self {
        self.log_json = log_json;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.db_path, None);
        assert_eq!(config.lock_timeout, Duration::from_secs(5));
        assert_eq!(config.workers, 8);
        assert!(!config.log_json);
    }

    #[test]
    fn test_zero_workers_clamped() {
        assert_eq!(Config::default().with_workers(0).workers, 1);
    }
}
