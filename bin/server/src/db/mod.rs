//! Database repositories for the mon ledger.

pub mod ledger;

pub use ledger::PgLedgerStore;
