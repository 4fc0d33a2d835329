//! An in-process [`LedgerStore`], used by tests and local tooling.

use crate::account::{Account, AccountDetails};
use crate::balance::{Balance, BalanceDetails, sort_balances};
use crate::error::LedgerError;
use crate::store::LedgerStore;
use async_trait::async_trait;
use mon_core::{AccountId, BalanceId, Result};
use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

#[derive(Default)]
struct Tables {
    accounts: BTreeMap<AccountId, Account>,
    balances: BTreeMap<BalanceId, Balance>,
}

/// Ledger storage held in memory behind a mutex.
#[derive(Default)]
pub struct InMemoryLedgerStore {
    tables: Mutex<Tables>,
}

impl InMemoryLedgerStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn tables(&self) -> MutexGuard<'_, Tables> {
        // A panic while holding the lock cannot leave the maps half-updated,
        // every mutation below is a single insert or retain.
        self.tables.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl LedgerStore for InMemoryLedgerStore {
    async fn insert_account(&self, details: AccountDetails) -> Result<Account, LedgerError> {
        let account = Account::new(AccountId::new(), details);
        self.tables().accounts.insert(account.id, account.clone());
        Ok(account)
    }

    async fn select_account(&self, id: AccountId) -> Result<Option<Account>, LedgerError> {
        Ok(self.tables().accounts.get(&id).cloned())
    }

    async fn select_accounts(&self) -> Result<Vec<Account>, LedgerError> {
        Ok(self.tables().accounts.values().cloned().collect())
    }

    async fn update_account(
        &self,
        id: AccountId,
        details: AccountDetails,
    ) -> Result<Account, LedgerError> {
        let mut tables = self.tables();
        if !tables.accounts.contains_key(&id) {
            return Err(LedgerError::AccountNotFound { id }.into());
        }
        details.validate_balances(tables.balances.values().filter(|b| b.account_id == id))?;

        let account = Account::new(id, details);
        tables.accounts.insert(id, account.clone());
        Ok(account)
    }

    async fn delete_account(&self, id: AccountId) -> Result<(), LedgerError> {
        let mut tables = self.tables();
        if tables.accounts.remove(&id).is_none() {
            return Err(LedgerError::AccountNotFound { id }.into());
        }
        tables.balances.retain(|_, b| b.account_id != id);
        Ok(())
    }

    async fn insert_balance(
        &self,
        account_id: AccountId,
        details: BalanceDetails,
    ) -> Result<Balance, LedgerError> {
        let mut tables = self.tables();
        let account = tables
            .accounts
            .get(&account_id)
            .ok_or(LedgerError::AccountNotFound { id: account_id })?;
        account.details.validate_balance_date(details.date)?;

        let balance = Balance::new(BalanceId::new(), account_id, details);
        tables.balances.insert(balance.id, balance.clone());
        Ok(balance)
    }

    async fn select_balance(&self, id: BalanceId) -> Result<Option<Balance>, LedgerError> {
        Ok(self.tables().balances.get(&id).cloned())
    }

    async fn select_account_balances(
        &self,
        account_id: AccountId,
    ) -> Result<Vec<Balance>, LedgerError> {
        let mut balances: Vec<Balance> = self
            .tables()
            .balances
            .values()
            .filter(|b| b.account_id == account_id)
            .cloned()
            .collect();
        sort_balances(&mut balances);
        Ok(balances)
    }

    async fn delete_balance(&self, id: BalanceId) -> Result<(), LedgerError> {
        match self.tables().balances.remove(&id) {
            Some(_) => Ok(()),
            None => Err(LedgerError::BalanceNotFound { id }.into()),
        }
    }
}
