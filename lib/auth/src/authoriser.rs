//! The composed request authorisation chain.

use crate::claims::{ClaimsAuthoriser, ClaimsExtractor};
use crate::error::RequestAuthError;
use crate::identity::Identity;
use crate::token::TokenValidator;
use async_trait::async_trait;
use http::request::Parts;
use mon_core::Result;
use tracing::debug;

/// Decides whether an HTTP request may reach a protected handler.
#[async_trait]
pub trait RequestAuthoriser: Send + Sync {
    /// Returns the authorised caller's identity.
    ///
    /// # Errors
    ///
    /// Returns a report whose current context is the `RequestAuthError`
    /// naming the stage that refused the request.
    async fn authorise(&self, request: &Parts) -> Result<Identity, RequestAuthError>;
}

/// Runs a [`TokenValidator`], a [`ClaimsExtractor`] and a
/// [`ClaimsAuthoriser`] in order, stopping at the first failure.
#[derive(Debug, Clone)]
pub struct RequestTokenAuthoriser<V, E, A> {
    validator: V,
    extractor: E,
    authoriser: A,
}

impl<V, E, A> RequestTokenAuthoriser<V, E, A> {
    pub fn new(validator: V, extractor: E, authoriser: A) -> Self {
        Self {
            validator,
            extractor,
            authoriser,
        }
    }
}

#[async_trait]
impl<V, E, A> RequestAuthoriser for RequestTokenAuthoriser<V, E, A>
where
    V: TokenValidator,
    E: ClaimsExtractor,
    A: ClaimsAuthoriser,
{
    async fn authorise(&self, request: &Parts) -> Result<Identity, RequestAuthError> {
        let token = self
            .validator
            .validate(request)
            .await
            .map_err(|report| report.context(RequestAuthError::Unauthenticated))?;

        let identity = self
            .extractor
            .extract(request, &token)
            .map_err(|report| report.context(RequestAuthError::InvalidClaims))?;

        self.authoriser
            .authorise(&identity)
            .map_err(|report| report.context(RequestAuthError::Denied))?;

        debug!(email = %identity.email, "request authorised");
        Ok(identity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::claims::{EmailClaimsExtractor, IdentityClaimsAuthoriser};
    use crate::error::{AuthorisationDenied, ClaimsError, TokenError};
    use crate::identity::AuthorisedIdentity;
    use crate::token::ValidatedToken;
    use rootcause::prelude::Report;
    use serde_json::json;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct Calls {
        validate: AtomicUsize,
        extract: AtomicUsize,
        authorise: AtomicUsize,
    }

    struct FakeValidator {
        failure: Option<TokenError>,
        calls: Arc<Calls>,
    }

    #[async_trait]
    impl TokenValidator for FakeValidator {
        async fn validate(&self, _request: &Parts) -> Result<ValidatedToken, TokenError> {
            self.calls.validate.fetch_add(1, Ordering::SeqCst);
            match &self.failure {
                Some(err) => Err(err.clone().into()),
                None => Ok(ValidatedToken::new(serde_json::Map::new())),
            }
        }
    }

    struct FakeExtractor {
        result: std::result::Result<Identity, ClaimsError>,
        calls: Arc<Calls>,
    }

    impl ClaimsExtractor for FakeExtractor {
        fn extract(
            &self,
            _request: &Parts,
            _token: &ValidatedToken,
        ) -> Result<Identity, ClaimsError> {
            self.calls.extract.fetch_add(1, Ordering::SeqCst);
            self.result.clone().map_err(Report::from)
        }
    }

    struct CountingAuthoriser {
        inner: IdentityClaimsAuthoriser,
        calls: Arc<Calls>,
    }

    impl ClaimsAuthoriser for CountingAuthoriser {
        fn authorise(&self, identity: &Identity) -> Result<(), AuthorisationDenied> {
            self.calls.authorise.fetch_add(1, Ordering::SeqCst);
            self.inner.authorise(identity)
        }
    }

    fn chain(
        validator_failure: Option<TokenError>,
        extracted: std::result::Result<Identity, ClaimsError>,
        authorised: AuthorisedIdentity,
    ) -> (
        RequestTokenAuthoriser<FakeValidator, FakeExtractor, CountingAuthoriser>,
        Arc<Calls>,
    ) {
        let calls = Arc::new(Calls::default());
        let authoriser = RequestTokenAuthoriser::new(
            FakeValidator {
                failure: validator_failure,
                calls: Arc::clone(&calls),
            },
            FakeExtractor {
                result: extracted,
                calls: Arc::clone(&calls),
            },
            CountingAuthoriser {
                inner: IdentityClaimsAuthoriser::new(authorised),
                calls: Arc::clone(&calls),
            },
        );
        (authoriser, calls)
    }

    fn parts() -> Parts {
        http::Request::new(()).into_parts().0
    }

    fn me() -> AuthorisedIdentity {
        AuthorisedIdentity::new("me@example.com", true)
    }

    #[tokio::test]
    async fn validator_failure_is_unauthenticated_and_stops_the_chain() {
        let (authoriser, calls) = chain(
            Some(TokenError::Expired),
            Ok(Identity::new("me@example.com", true)),
            me(),
        );

        let report = authoriser.authorise(&parts()).await.expect_err("denied");

        assert_eq!(report.current_context(), &RequestAuthError::Unauthenticated);
        assert_eq!(calls.extract.load(Ordering::SeqCst), 0);
        assert_eq!(calls.authorise.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn extractor_failure_is_invalid_claims_and_stops_the_chain() {
        let (authoriser, calls) = chain(
            None,
            Err(ClaimsError::Undecodable {
                reason: "missing field `email`".to_string(),
            }),
            me(),
        );

        let report = authoriser.authorise(&parts()).await.expect_err("denied");

        assert_eq!(report.current_context(), &RequestAuthError::InvalidClaims);
        assert_eq!(calls.validate.load(Ordering::SeqCst), 1);
        assert_eq!(calls.authorise.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn mismatched_email_is_denied() {
        let (authoriser, _) = chain(None, Ok(Identity::new("other@example.com", true)), me());

        let report = authoriser.authorise(&parts()).await.expect_err("denied");

        assert_eq!(report.current_context(), &RequestAuthError::Denied);
    }

    #[tokio::test]
    async fn unverified_email_is_denied_when_verification_required() {
        let (authoriser, _) = chain(None, Ok(Identity::new("me@example.com", false)), me());

        let report = authoriser.authorise(&parts()).await.expect_err("denied");

        assert_eq!(report.current_context(), &RequestAuthError::Denied);
    }

    #[tokio::test]
    async fn permits_only_when_every_stage_succeeds() {
        let (authoriser, calls) = chain(None, Ok(Identity::new("me@example.com", true)), me());

        let identity = authoriser.authorise(&parts()).await.expect("permitted");

        assert_eq!(identity, Identity::new("me@example.com", true));
        assert_eq!(calls.validate.load(Ordering::SeqCst), 1);
        assert_eq!(calls.extract.load(Ordering::SeqCst), 1);
        assert_eq!(calls.authorise.load(Ordering::SeqCst), 1);
    }

    struct ClaimsValidator(serde_json::Value);

    #[async_trait]
    impl TokenValidator for ClaimsValidator {
        async fn validate(&self, _request: &Parts) -> Result<ValidatedToken, TokenError> {
            match &self.0 {
                serde_json::Value::Object(map) => Ok(ValidatedToken::new(map.clone())),
                _ => Err(TokenError::Malformed {
                    reason: "claims are not an object".to_string(),
                }
                .into()),
            }
        }
    }

    #[tokio::test]
    async fn composes_with_the_email_claims_stages() {
        let authoriser = RequestTokenAuthoriser::new(
            ClaimsValidator(json!({"email": "me@example.com", "email_verified": true})),
            EmailClaimsExtractor,
            IdentityClaimsAuthoriser::new(me()),
        );
        assert!(authoriser.authorise(&parts()).await.is_ok());

        let unverified = RequestTokenAuthoriser::new(
            ClaimsValidator(json!({"email": "me@example.com"})),
            EmailClaimsExtractor,
            IdentityClaimsAuthoriser::new(me()),
        );
        let report = unverified.authorise(&parts()).await.expect_err("unverified");
        assert_eq!(report.current_context(), &RequestAuthError::Denied);
    }
}
