//! The mon personal-finance ledger.
//!
//! A ledger is a set of [`Account`]s, each with a history of [`Balance`]s.
//! Storage is abstracted behind [`LedgerStore`]. The [`Ledger`] type checks
//! each entity's details and the store checks the rules that span an account
//! and its balances as part of the write:
//!
//! - an account may not close before it opens
//! - a balance must be dated inside its account's open window
//! - updating an account must keep every existing balance valid
//!
//! # Example
//!
//! ```
//! use chrono::NaiveDate;
//! use mon_ledger::{AccountDetails, BalanceDetails, InMemoryLedgerStore, Ledger};
//! use std::sync::Arc;
//!
//! # tokio_test(async {
//! let ledger = Ledger::new(Arc::new(InMemoryLedgerStore::new()));
//! let opened = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
//! let account = ledger
//!     .create_account(AccountDetails::new("Current", "GBP".parse().unwrap(), opened))
//!     .await
//!     .unwrap();
//!
//! let balance = BalanceDetails::new(opened, 12_345);
//! ledger.add_balance(account.id, balance).await.unwrap();
//! assert_eq!(ledger.balances(account.id).await.unwrap().len(), 1);
//! # });
//! # fn tokio_test<F: std::future::Future>(f: F) {
//! #     tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(f);
//! # }
//! ```

pub mod account;
pub mod balance;
pub mod error;
pub mod memory;
pub mod model;
pub mod store;

pub use account::{Account, AccountDetails, Currency};
pub use balance::{Balance, BalanceDetails, balance_at, sort_balances};
pub use error::LedgerError;
pub use memory::InMemoryLedgerStore;
pub use model::Ledger;
pub use store::LedgerStore;
