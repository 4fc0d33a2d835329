//! Ledger accounts.

use crate::balance::Balance;
use crate::error::LedgerError;
use chrono::NaiveDate;
use mon_core::AccountId;
use rootcause::Report;
use rootcause::prelude::ResultExt;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A three letter currency code such as `GBP`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Currency(String);

impl Currency {
    /// Returns the code as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for Currency {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() == 3 && s.bytes().all(|b| b.is_ascii_uppercase()) {
            Ok(Self(s.to_string()))
        } else {
            Err(LedgerError::InvalidAccount {
                reason: format!("currency must be three upper-case letters, got {s:?}"),
            })
        }
    }
}

impl TryFrom<String> for Currency {
    type Error = LedgerError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Currency> for String {
    fn from(currency: Currency) -> Self {
        currency.0
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The caller-supplied part of an account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountDetails {
    pub name: String,
    pub currency: Currency,
    pub opened: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub closed: Option<NaiveDate>,
}

impl AccountDetails {
    /// Creates details for an account that is still open.
    #[must_use]
    pub fn new(name: impl Into<String>, currency: Currency, opened: NaiveDate) -> Self {
        Self {
            name: name.into(),
            currency,
            opened,
            closed: None,
        }
    }

    /// Sets the closing date.
    #[must_use]
    pub fn closed_on(mut self, closed: NaiveDate) -> Self {
        self.closed = Some(closed);
        self
    }

    /// Checks the details are self-consistent.
    ///
    /// # Errors
    ///
    /// Returns `InvalidAccount` if the name is blank or the account closes
    /// before it opens.
    pub fn validate(&self) -> Result<(), Report<LedgerError>> {
        if self.name.trim().is_empty() {
            return Err(LedgerError::InvalidAccount {
                reason: "name must not be empty".to_string(),
            }
            .into());
        }
        if let Some(closed) = self.closed
            && closed < self.opened
        {
            return Err(LedgerError::InvalidAccount {
                reason: format!("closed {closed} is before opened {}", self.opened),
            }
            .into());
        }
        Ok(())
    }

    /// Checks that a balance dated `date` would fall inside this account's
    /// open window.
    ///
    /// # Errors
    ///
    /// Returns `InvalidBalance` if the date is outside the window.
    pub fn validate_balance_date(&self, date: NaiveDate) -> Result<(), Report<LedgerError>> {
        if date < self.opened {
            return Err(LedgerError::InvalidBalance {
                reason: format!("balance date {date} is before account opened {}", self.opened),
            }
            .into());
        }
        if let Some(closed) = self.closed
            && date > closed
        {
            return Err(LedgerError::InvalidBalance {
                reason: format!("balance date {date} is after account closed {closed}"),
            }
            .into());
        }
        Ok(())
    }

    /// Checks that every one of `balances` is dated inside the window.
    ///
    /// # Errors
    ///
    /// Returns `InvalidAccount` naming the first balance that falls outside.
    pub fn validate_balances<'a>(
        &self,
        balances: impl IntoIterator<Item = &'a Balance>,
    ) -> Result<(), Report<LedgerError>> {
        for balance in balances {
            self.validate_balance_date(balance.details.date)
                .context(LedgerError::InvalidAccount {
                    reason: format!("update would make balance {} invalid", balance.id),
                })?;
        }
        Ok(())
    }

    /// Returns true if the account had been opened by `date`.
    #[must_use]
    pub fn existed_at(&self, date: NaiveDate) -> bool {
        self.opened <= date
    }

    /// Returns true if the account was open on `date`.
    #[must_use]
    pub fn open_at(&self, date: NaiveDate) -> bool {
        self.existed_at(date) && self.closed.is_none_or(|closed| closed > date)
    }
}

/// A stored account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub id: AccountId,
    #[serde(flatten)]
    pub details: AccountDetails,
}

impl Account {
    #[must_use]
    pub fn new(id: AccountId, details: AccountDetails) -> Self {
        Self { id, details }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    fn gbp() -> Currency {
        "GBP".parse().expect("valid currency")
    }

    #[test]
    fn currency_requires_three_upper_case_letters() {
        assert!("GBP".parse::<Currency>().is_ok());
        assert!("gbp".parse::<Currency>().is_err());
        assert!("GBPX".parse::<Currency>().is_err());
        assert!("".parse::<Currency>().is_err());
    }

    #[test]
    fn currency_deserialization_is_validated() {
        let err = serde_json::from_str::<Currency>("\"pounds\"");
        assert!(err.is_err());
        let ok: Currency = serde_json::from_str("\"EUR\"").expect("valid");
        assert_eq!(ok.as_str(), "EUR");
    }

    #[test]
    fn closing_before_opening_is_invalid() {
        let details = AccountDetails::new("Savings", gbp(), date(2024, 2, 1)).closed_on(date(2024, 1, 1));
        let report = details.validate().expect_err("should be invalid");
        assert!(report.current_context().is_invalid_input());
    }

    #[test]
    fn blank_name_is_invalid() {
        let details = AccountDetails::new("  ", gbp(), date(2024, 1, 1));
        assert!(details.validate().is_err());
    }

    #[test]
    fn closing_on_opening_day_is_valid() {
        let details = AccountDetails::new("Savings", gbp(), date(2024, 1, 1)).closed_on(date(2024, 1, 1));
        assert!(details.validate().is_ok());
    }

    #[test]
    fn balance_dates_must_fall_inside_open_window() {
        let details = AccountDetails::new("Current", gbp(), date(2024, 1, 10)).closed_on(date(2024, 3, 1));

        assert!(details.validate_balance_date(date(2024, 1, 9)).is_err());
        assert!(details.validate_balance_date(date(2024, 1, 10)).is_ok());
        assert!(details.validate_balance_date(date(2024, 3, 1)).is_ok());
        assert!(details.validate_balance_date(date(2024, 3, 2)).is_err());
    }

    #[test]
    fn open_and_existed_filters() {
        let details = AccountDetails::new("Current", gbp(), date(2024, 1, 10)).closed_on(date(2024, 3, 1));

        assert!(!details.existed_at(date(2024, 1, 9)));
        assert!(details.existed_at(date(2024, 4, 1)));
        assert!(details.open_at(date(2024, 2, 1)));
        assert!(!details.open_at(date(2024, 3, 1)));
        assert!(!details.open_at(date(2024, 1, 9)));
    }

    #[test]
    fn account_serializes_flat() {
        let account = Account::new(AccountId::new(), AccountDetails::new("Current", gbp(), date(2024, 1, 1)));
        let json = serde_json::to_value(&account).expect("serialize");
        assert_eq!(json["name"], "Current");
        assert_eq!(json["currency"], "GBP");
        assert_eq!(json["opened"], "2024-01-01");
        assert!(json.get("closed").is_none());
    }
}
