//! An account ledger whose transfer engine moves funds between accounts atomically,
//! with exact decimal arithmetic and per-account locking under concurrent access.

pub mod application;
pub mod config;
pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod interfaces;
pub mod telemetry;
