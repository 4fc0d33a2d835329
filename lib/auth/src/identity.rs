//! Identities decoded from tokens and the identity allowed to use the API.

use serde::{Deserialize, Serialize};

/// The caller identity carried in a token's claims.
///
/// Built per request and never persisted. A missing `email_verified` claim
/// decodes as unverified.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub email: String,
    #[serde(default)]
    pub email_verified: bool,
}

impl Identity {
    #[must_use]
    pub fn new(email: impl Into<String>, email_verified: bool) -> Self {
        Self {
            email: email.into(),
            email_verified,
        }
    }
}

/// The single identity permitted to call protected endpoints.
///
/// Configured once at startup. When `email_verified` is set, callers must
/// present a token whose email has been verified by the provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorisedIdentity {
    email: String,
    email_verified: bool,
}

impl AuthorisedIdentity {
    #[must_use]
    pub fn new(email: impl Into<String>, require_verified_email: bool) -> Self {
        Self {
            email: email.into(),
            email_verified: require_verified_email,
        }
    }

    #[must_use]
    pub fn email(&self) -> &str {
        &self.email
    }

    /// Returns true if the caller's email must be verified.
    #[must_use]
    pub fn requires_verified_email(&self) -> bool {
        self.email_verified
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_email_verified_claim_is_unverified() {
        let identity: Identity =
            serde_json::from_str(r#"{"email":"me@example.com"}"#).expect("deserialize");
        assert_eq!(identity, Identity::new("me@example.com", false));
    }

    #[test]
    fn email_is_required() {
        let result = serde_json::from_str::<Identity>(r#"{"email_verified":true}"#);
        assert!(result.is_err());
    }
}
