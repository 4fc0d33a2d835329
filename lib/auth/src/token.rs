//! Bearer token validation, the first stage of request authorisation.

use crate::error::TokenError;
use async_trait::async_trait;
use http::header::AUTHORIZATION;
use http::request::Parts;
use http::HeaderMap;
use mon_core::Result;
use serde_json::{Map, Value};

/// A token whose signature, expiry and issuer have been verified.
///
/// Holding one says nothing about who the caller is allowed to be; that is
/// decided by the claims stages that follow.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedToken {
    claims: Map<String, Value>,
}

impl ValidatedToken {
    /// Wraps claims that a validator has already verified.
    #[must_use]
    pub fn new(claims: Map<String, Value>) -> Self {
        Self { claims }
    }

    #[must_use]
    pub fn claims(&self) -> &Map<String, Value> {
        &self.claims
    }

    #[must_use]
    pub fn claim(&self, name: &str) -> Option<&Value> {
        self.claims.get(name)
    }
}

/// Verifies the bearer token carried by a request.
#[async_trait]
pub trait TokenValidator: Send + Sync {
    /// # Errors
    ///
    /// Returns a `TokenError` if the request has no usable token or the
    /// token fails verification.
    async fn validate(&self, request: &Parts) -> Result<ValidatedToken, TokenError>;
}

/// Extracts the token from an `Authorization: Bearer <token>` header.
///
/// The scheme is matched case-insensitively.
///
/// # Errors
///
/// Returns `MissingAuthorization` without the header and
/// `MalformedAuthorization` when it is not a bearer credential.
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, TokenError> {
    let value = headers
        .get(AUTHORIZATION)
        .ok_or(TokenError::MissingAuthorization)?
        .to_str()
        .map_err(|_| TokenError::MalformedAuthorization)?;

    let (scheme, token) = value
        .split_once(' ')
        .ok_or(TokenError::MalformedAuthorization)?;
    let token = token.trim();
    if !scheme.eq_ignore_ascii_case("bearer") || token.is_empty() {
        return Err(TokenError::MalformedAuthorization.into());
    }
    Ok(token)
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::HeaderValue;

    fn headers(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_str(value).expect("header"));
        headers
    }

    #[test]
    fn scheme_is_case_insensitive() {
        assert_eq!(bearer_token(&headers("BEARER abc")).expect("token"), "abc");
        assert_eq!(bearer_token(&headers("Bearer abc")).expect("token"), "abc");
        assert_eq!(bearer_token(&headers("bearer abc")).expect("token"), "abc");
    }

    #[test]
    fn missing_header() {
        let report = bearer_token(&HeaderMap::new()).expect_err("no header");
        assert_eq!(report.current_context(), &TokenError::MissingAuthorization);
    }

    #[test]
    fn other_schemes_are_rejected() {
        for value in ["Basic dXNlcjpwYXNz", "Bearer", "Bearer ", "abc"] {
            let report = bearer_token(&headers(value)).expect_err(value);
            assert_eq!(report.current_context(), &TokenError::MalformedAuthorization);
        }
    }
}
