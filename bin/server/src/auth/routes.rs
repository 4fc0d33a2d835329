//! Login routes for the OAuth2 authorization code flow.

use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use mon_auth::LoginError;
use mon_auth::login::{CallbackParams, LoginFlow};
use rootcause::prelude::Report;
use serde::Serialize;
use std::sync::Arc;

/// Body of `GET /loginurl`.
#[derive(Debug, Serialize)]
pub struct LoginUrlResponse {
    pub login_url: String,
}

/// Body of a completed `GET /logincallback`.
#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub token: String,
}

/// Issues a provider login URL bound to a fresh CSRF state.
pub async fn login_url(
    State(flow): State<Arc<LoginFlow>>,
) -> Result<Json<LoginUrlResponse>, LoginFailure> {
    let login_url = flow.issue_login_url()?;
    Ok(Json(LoginUrlResponse { login_url }))
}

/// Completes a login and returns the identity token.
pub async fn login_callback(
    State(flow): State<Arc<LoginFlow>>,
    Query(params): Query<CallbackParams>,
) -> Result<Json<TokenResponse>, LoginFailure> {
    let token = flow.handle_callback(&params).await?;
    Ok(Json(TokenResponse {
        token: token.into_inner(),
    }))
}

/// A failed login step.
#[derive(Debug)]
pub struct LoginFailure(Report<LoginError>);

impl From<Report<LoginError>> for LoginFailure {
    fn from(report: Report<LoginError>) -> Self {
        Self(report)
    }
}

impl IntoResponse for LoginFailure {
    fn into_response(self) -> Response {
        let report = self.0;
        let err = report.current_context();
        match err {
            LoginError::CsrfMismatch => {
                tracing::warn!(error = %report, "login callback with invalid state");
                (StatusCode::BAD_REQUEST, err.to_string()).into_response()
            }
            LoginError::MissingCode => {
                tracing::debug!("login callback without code");
                (StatusCode::BAD_REQUEST, err.to_string()).into_response()
            }
            LoginError::StateGeneration | LoginError::StateNotIssued => {
                tracing::error!(error = %report, "login failed");
                (StatusCode::INTERNAL_SERVER_ERROR, err.to_string()).into_response()
            }
            LoginError::Exchange | LoginError::MissingIdToken => {
                tracing::error!(error = %report, "login failed");
                (StatusCode::INTERNAL_SERVER_ERROR, "Authentication failed").into_response()
            }
        }
    }
}
