//! Authorisation middleware for protected routes.

use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
};
use mon_auth::RequestAuthError;
use rootcause::prelude::Report;

use crate::AppState;
use std::sync::Arc;

/// Authorises the request before it reaches the handler.
///
/// The authorised [`Identity`](mon_auth::Identity) is added to the request
/// extensions.
pub async fn require_authorisation(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Result<Response, AuthRejection> {
    let (mut parts, body) = request.into_parts();
    let identity = state.authoriser.authorise(&parts).await?;
    parts.extensions.insert(identity);
    Ok(next.run(Request::from_parts(parts, body)).await)
}

/// Rejection for requests that failed authorisation.
#[derive(Debug)]
pub struct AuthRejection(Report<RequestAuthError>);

impl From<Report<RequestAuthError>> for AuthRejection {
    fn from(report: Report<RequestAuthError>) -> Self {
        Self(report)
    }
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        let report = self.0;
        match report.current_context() {
            RequestAuthError::Unauthenticated => {
                tracing::debug!(error = %report, "unauthenticated request");
                (StatusCode::UNAUTHORIZED, "Unauthorised request").into_response()
            }
            RequestAuthError::InvalidClaims => {
                tracing::warn!(error = %report, "token claims could not be decoded");
                (StatusCode::BAD_REQUEST, "Unable to extract claims").into_response()
            }
            RequestAuthError::Denied => {
                tracing::warn!(error = %report, "identity denied");
                (StatusCode::UNAUTHORIZED, "Unauthorised token").into_response()
            }
        }
    }
}
