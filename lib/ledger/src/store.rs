//! Storage abstraction for the ledger.

use crate::account::{Account, AccountDetails};
use crate::balance::{Balance, BalanceDetails};
use crate::error::LedgerError;
use async_trait::async_trait;
use mon_core::{AccountId, BalanceId, Result};

/// Persistence for accounts and balances.
///
/// Rules on a single entity's details are enforced by [`crate::Ledger`]
/// before the store is called. Rules spanning an account and its balances
/// are checked by the store itself, atomically with the write, so that
/// concurrent updates cannot leave a balance outside its account's window.
/// Lookups of a single entity return `Ok(None)` when it does not exist,
/// while updates and deletes of a missing entity fail with the matching
/// `*NotFound` error.
#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// Stores a new account under a freshly allocated id.
    async fn insert_account(&self, details: AccountDetails) -> Result<Account, LedgerError>;

    async fn select_account(&self, id: AccountId) -> Result<Option<Account>, LedgerError>;

    /// Lists all accounts, oldest first.
    async fn select_accounts(&self) -> Result<Vec<Account>, LedgerError>;

    /// Replaces an account's details.
    ///
    /// Fails with `InvalidAccount` if a recorded balance would fall outside
    /// the new open window.
    async fn update_account(
        &self,
        id: AccountId,
        details: AccountDetails,
    ) -> Result<Account, LedgerError>;

    /// Deletes an account together with its balances.
    async fn delete_account(&self, id: AccountId) -> Result<(), LedgerError>;

    /// Stores a new balance under a freshly allocated id.
    ///
    /// Fails with `InvalidBalance` if the date is outside the account's open
    /// window.
    async fn insert_balance(
        &self,
        account_id: AccountId,
        details: BalanceDetails,
    ) -> Result<Balance, LedgerError>;

    async fn select_balance(&self, id: BalanceId) -> Result<Option<Balance>, LedgerError>;

    /// Lists an account's balances sorted by date, then by id.
    async fn select_account_balances(
        &self,
        account_id: AccountId,
    ) -> Result<Vec<Balance>, LedgerError>;

    async fn delete_balance(&self, id: BalanceId) -> Result<(), LedgerError>;
}
