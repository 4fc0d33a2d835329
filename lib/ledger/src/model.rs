//! Ledger operations that enforce consistency between accounts and balances.

use crate::account::{Account, AccountDetails};
use crate::balance::{Balance, BalanceDetails};
use crate::error::LedgerError;
use crate::store::LedgerStore;
use mon_core::{AccountId, BalanceId, Result};
use std::sync::Arc;
use tracing::{debug, instrument};

/// The ledger, backed by any [`LedgerStore`].
#[derive(Clone)]
pub struct Ledger {
    store: Arc<dyn LedgerStore>,
}

impl Ledger {
    #[must_use]
    pub fn new(store: Arc<dyn LedgerStore>) -> Self {
        Self { store }
    }

    /// # Errors
    ///
    /// Returns `InvalidAccount` if the details are inconsistent, or a
    /// storage error.
    #[instrument(skip(self, details), fields(name = %details.name))]
    pub async fn create_account(&self, details: AccountDetails) -> Result<Account, LedgerError> {
        details.validate()?;
        let account = self.store.insert_account(details).await?;
        debug!(account_id = %account.id, "account created");
        Ok(account)
    }

    /// # Errors
    ///
    /// Returns `AccountNotFound` if there is no such account.
    pub async fn account(&self, id: AccountId) -> Result<Account, LedgerError> {
        self.store
            .select_account(id)
            .await?
            .ok_or_else(|| LedgerError::AccountNotFound { id }.into())
    }

    /// # Errors
    ///
    /// Returns a storage error if the accounts cannot be listed.
    pub async fn accounts(&self) -> Result<Vec<Account>, LedgerError> {
        self.store.select_accounts().await
    }

    /// Replaces an account's details.
    ///
    /// The update is refused if any balance already recorded against the
    /// account would fall outside the updated open window.
    ///
    /// # Errors
    ///
    /// Returns `AccountNotFound`, `InvalidAccount` or a storage error.
    #[instrument(skip(self, updates))]
    pub async fn update_account(
        &self,
        id: AccountId,
        updates: AccountDetails,
    ) -> Result<Account, LedgerError> {
        updates.validate()?;
        self.store.update_account(id, updates).await
    }

    /// Deletes an account and all of its balances.
    ///
    /// # Errors
    ///
    /// Returns `AccountNotFound` if there is no such account.
    #[instrument(skip(self))]
    pub async fn delete_account(&self, id: AccountId) -> Result<(), LedgerError> {
        self.account(id).await?;
        self.store.delete_account(id).await
    }

    /// Records a balance against an account.
    ///
    /// # Errors
    ///
    /// Returns `AccountNotFound` if there is no such account, or
    /// `InvalidBalance` if the balance is dated outside the account's
    /// open window.
    #[instrument(skip(self, details), fields(date = %details.date))]
    pub async fn add_balance(
        &self,
        account_id: AccountId,
        details: BalanceDetails,
    ) -> Result<Balance, LedgerError> {
        details.validate()?;
        self.store.insert_balance(account_id, details).await
    }

    /// # Errors
    ///
    /// Returns `BalanceNotFound` if there is no such balance.
    pub async fn balance(&self, id: BalanceId) -> Result<Balance, LedgerError> {
        self.store
            .select_balance(id)
            .await?
            .ok_or_else(|| LedgerError::BalanceNotFound { id }.into())
    }

    /// Lists an account's balances sorted by date, then by id.
    ///
    /// # Errors
    ///
    /// Returns `AccountNotFound` if there is no such account.
    pub async fn balances(&self, account_id: AccountId) -> Result<Vec<Balance>, LedgerError> {
        self.account(account_id).await?;
        self.store.select_account_balances(account_id).await
    }

    /// # Errors
    ///
    /// Returns `BalanceNotFound` if there is no such balance.
    pub async fn delete_balance(&self, id: BalanceId) -> Result<(), LedgerError> {
        self.store.delete_balance(id).await
    }
}
