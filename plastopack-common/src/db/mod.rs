//! Database access layer
//!
//! SQLite schema initialization plus the three query modules: the rate
//! store, the rate-history ledger, and the user store.

pub mod history;
pub mod init;
pub mod models;
pub mod rates;
pub mod users;

pub use init::init_database;
