//! Balances recorded against an account.

use crate::error::LedgerError;
use chrono::NaiveDate;
use mon_core::{AccountId, BalanceId};
use rootcause::Report;
use serde::{Deserialize, Serialize};

/// Longest note a balance may carry, in characters.
pub const MAX_NOTE_LEN: usize = 240;

/// The caller-supplied part of a balance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceDetails {
    pub date: NaiveDate,
    /// Amount in the minor unit of the account's currency.
    pub amount: i64,
    #[serde(default)]
    pub note: String,
}

impl BalanceDetails {
    #[must_use]
    pub fn new(date: NaiveDate, amount: i64) -> Self {
        Self {
            date,
            amount,
            note: String::new(),
        }
    }

    #[must_use]
    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = note.into();
        self
    }

    /// # Errors
    ///
    /// Returns `InvalidBalance` if the note is too long.
    pub fn validate(&self) -> Result<(), Report<LedgerError>> {
        let len = self.note.chars().count();
        if len > MAX_NOTE_LEN {
            return Err(LedgerError::InvalidBalance {
                reason: format!("note is {len} characters, limit is {MAX_NOTE_LEN}"),
            }
            .into());
        }
        Ok(())
    }
}

/// A stored balance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Balance {
    pub id: BalanceId,
    pub account_id: AccountId,
    #[serde(flatten)]
    pub details: BalanceDetails,
}

impl Balance {
    #[must_use]
    pub fn new(id: BalanceId, account_id: AccountId, details: BalanceDetails) -> Self {
        Self {
            id,
            account_id,
            details,
        }
    }
}

/// Sorts balances chronologically, breaking ties by id.
pub fn sort_balances(balances: &mut [Balance]) {
    balances.sort_by(|a, b| a.details.date.cmp(&b.details.date).then(a.id.cmp(&b.id)));
}

/// Returns the most recent balance dated on or before `date`.
///
/// `balances` must already be sorted with [`sort_balances`].
#[must_use]
pub fn balance_at(balances: &[Balance], date: NaiveDate) -> Option<&Balance> {
    balances.iter().rev().find(|b| b.details.date <= date)
}
