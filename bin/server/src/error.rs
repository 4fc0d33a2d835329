//! HTTP mapping of ledger errors.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use mon_core::ParseIdError;
use mon_ledger::LedgerError;
use rootcause::prelude::Report;

/// Errors returned by the ledger API handlers.
#[derive(Debug)]
pub enum ApiError {
    /// A path segment is not a valid id.
    InvalidId(ParseIdError),
    /// The ledger refused or failed the operation.
    Ledger(Report<LedgerError>),
}

impl From<Report<LedgerError>> for ApiError {
    fn from(report: Report<LedgerError>) -> Self {
        Self::Ledger(report)
    }
}

impl From<ParseIdError> for ApiError {
    fn from(err: ParseIdError) -> Self {
        Self::InvalidId(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            Self::InvalidId(err) => (StatusCode::BAD_REQUEST, err.to_string()).into_response(),
            Self::Ledger(report) => {
                let err = report.current_context();
                if err.is_not_found() {
                    (StatusCode::NOT_FOUND, err.to_string()).into_response()
                } else if err.is_invalid_input() {
                    tracing::debug!(error = %report, "rejected ledger input");
                    (StatusCode::BAD_REQUEST, err.to_string()).into_response()
                } else {
                    tracing::error!(error = %report, "ledger operation failed");
                    (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error").into_response()
                }
            }
        }
    }
}
