//! Claims extraction and identity authorisation.

use crate::error::{AuthorisationDenied, ClaimsError};
use crate::identity::{AuthorisedIdentity, Identity};
use crate::token::ValidatedToken;
use http::request::Parts;
use mon_core::Result;
use serde_json::Value;

/// Decodes the caller's [`Identity`] from a validated token.
pub trait ClaimsExtractor: Send + Sync {
    /// # Errors
    ///
    /// Returns `ClaimsError` if the claims cannot be decoded.
    fn extract(
        &self,
        request: &Parts,
        token: &ValidatedToken,
    ) -> Result<Identity, ClaimsError>;
}

/// Decides whether an identity may use the API.
pub trait ClaimsAuthoriser: Send + Sync {
    /// # Errors
    ///
    /// Returns `AuthorisationDenied` when the identity is not permitted.
    fn authorise(&self, identity: &Identity) -> Result<(), AuthorisationDenied>;
}

/// Reads the standard OIDC `email` and `email_verified` claims.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmailClaimsExtractor;

impl ClaimsExtractor for EmailClaimsExtractor {
    fn extract(
        &self,
        _request: &Parts,
        token: &ValidatedToken,
    ) -> Result<Identity, ClaimsError> {
        serde_json::from_value(Value::Object(token.claims().clone())).map_err(|e| {
            ClaimsError::Undecodable {
                reason: e.to_string(),
            }
            .into()
        })
    }
}

/// Permits exactly one configured identity.
#[derive(Debug, Clone)]
pub struct IdentityClaimsAuthoriser {
    authorised: AuthorisedIdentity,
}

impl IdentityClaimsAuthoriser {
    #[must_use]
    pub fn new(authorised: AuthorisedIdentity) -> Self {
        Self { authorised }
    }
}

impl ClaimsAuthoriser for IdentityClaimsAuthoriser {
    fn authorise(&self, identity: &Identity) -> Result<(), AuthorisationDenied> {
        if identity.email != self.authorised.email() {
            return Err(AuthorisationDenied::EmailMismatch {
                email: identity.email.clone(),
            }
            .into());
        }
        if self.authorised.requires_verified_email() && !identity.email_verified {
            return Err(AuthorisationDenied::EmailNotVerified {
                email: identity.email.clone(),
            }
            .into());
        }
        Ok(())
    }
}
