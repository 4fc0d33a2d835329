//! Core types shared by the mon ledger service and its command line client.
//!
//! This crate holds the `Result` alias used across the workspace and the
//! strongly-typed identifiers of ledger entities.

pub mod error;
pub mod id;

pub use error::Result;
pub use id::{AccountId, BalanceId, ParseIdError};
