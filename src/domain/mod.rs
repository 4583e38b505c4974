//! Domain types and the ports the application layer talks to.

pub mod account;
pub mod money;
pub mod ports;
pub mod transaction;
