//! Application layer: the transfer engine and the services that front it.
//!
//! `TransferEngine` owns the atomic transfer protocol. `AccountService` and
//! `TransactionService` validate raw input and forward to the store or the engine.
//! `AppContext` wires them to a storage backend, and `Dispatcher` runs batches of
//! commands on concurrent tokio tasks.

pub mod command;
pub mod context;
pub mod dispatcher;
pub mod engine;
pub mod services;
