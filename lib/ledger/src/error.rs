//! Error types for the ledger crate.

use mon_core::{AccountId, BalanceId};
use std::fmt;

/// Errors from ledger operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    /// No account exists with the given id.
    AccountNotFound { id: AccountId },
    /// No balance exists with the given id.
    BalanceNotFound { id: BalanceId },
    /// Account details break a ledger rule.
    InvalidAccount { reason: String },
    /// Balance details break a ledger rule.
    InvalidBalance { reason: String },
    /// The backing store failed.
    Storage { details: String },
}

impl LedgerError {
    /// Returns true when the error names a missing entity.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::AccountNotFound { .. } | Self::BalanceNotFound { .. }
        )
    }

    /// Returns true when the error was caused by the caller's input.
    #[must_use]
    pub fn is_invalid_input(&self) -> bool {
        matches!(
            self,
            Self::InvalidAccount { .. } | Self::InvalidBalance { .. }
        )
    }
}

impl fmt::Display for LedgerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AccountNotFound { id } => write!(f, "account not found: {id}"),
            Self::BalanceNotFound { id } => write!(f, "balance not found: {id}"),
            Self::InvalidAccount { reason } => write!(f, "invalid account: {reason}"),
            Self::InvalidBalance { reason } => write!(f, "invalid balance: {reason}"),
            Self::Storage { details } => write!(f, "ledger storage error: {details}"),
        }
    }
}

impl std::error::Error for LedgerError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_classification() {
        assert!(LedgerError::AccountNotFound { id: AccountId::new() }.is_not_found());
        assert!(LedgerError::BalanceNotFound { id: BalanceId::new() }.is_not_found());
        assert!(
            !LedgerError::Storage {
                details: "gone".to_string()
            }
            .is_not_found()
        );
    }

    #[test]
    fn invalid_input_display_includes_reason() {
        let err = LedgerError::InvalidBalance {
            reason: "dated before account opened".to_string(),
        };
        assert!(err.is_invalid_input());
        assert!(err.to_string().contains("dated before account opened"));
    }
}
