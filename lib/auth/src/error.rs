//! Error types for the auth crate.
//!
//! Each stage has its own context type so a report's current context
//! names the stage that failed:
//! - `ConfigurationError`: bad settings, fatal at startup
//! - `LoginError`: login callback failures, wrapping `ExchangeError`
//! - `TokenError`: the bearer token could not be verified
//! - `ClaimsError`: a verified token's claims could not be decoded
//! - `AuthorisationDenied`: the identity is not the authorised one
//! - `RequestAuthError`: the classification added by the composed chain

use std::fmt;
use std::time::Duration;

/// Missing or invalid authentication settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigurationError {
    /// A required setting was not provided.
    Missing { setting: &'static str },
    /// A setting was provided but cannot be used.
    Invalid { setting: &'static str, reason: String },
}

impl fmt::Display for ConfigurationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Missing { setting } => write!(f, "no {setting} given"),
            Self::Invalid { setting, reason } => write!(f, "invalid {setting}: {reason}"),
        }
    }
}

impl std::error::Error for ConfigurationError {}

/// Failures of the login flow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginError {
    /// Secure random state could not be generated.
    StateGeneration,
    /// A callback arrived but no login URL has been issued.
    StateNotIssued,
    /// The callback's `state` parameter is absent or does not match.
    CsrfMismatch,
    /// The callback has no `code` parameter.
    MissingCode,
    /// Exchanging the code with the provider failed.
    Exchange,
    /// The provider's token response carried no identity token.
    MissingIdToken,
}

impl LoginError {
    /// Returns true when the caller sent a bad request, false when the
    /// failure is on the server or provider side.
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::CsrfMismatch | Self::MissingCode)
    }
}

impl fmt::Display for LoginError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::StateGeneration => write!(f, "error generating state value"),
            Self::StateNotIssued => write!(f, "no login state has been issued"),
            Self::CsrfMismatch => write!(f, "invalid state parameter"),
            Self::MissingCode => write!(f, "code parameter not set"),
            Self::Exchange => write!(f, "error exchanging authorization code"),
            Self::MissingIdToken => write!(f, "no id_token field in token response"),
        }
    }
}

impl std::error::Error for LoginError {}

/// Failures talking to the OAuth2 provider's token endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExchangeError {
    /// The provider did not answer within the exchange timeout.
    Timeout { after: Duration },
    /// The provider rejected the request or could not be reached.
    Provider { details: String },
}

impl fmt::Display for ExchangeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Timeout { after } => {
                write!(f, "token exchange timed out after {}ms", after.as_millis())
            }
            Self::Provider { details } => write!(f, "token exchange failed: {details}"),
        }
    }
}

impl std::error::Error for ExchangeError {}

/// The bearer token on a request could not be verified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenError {
    /// No `Authorization` header.
    MissingAuthorization,
    /// The `Authorization` header is not `Bearer <token>`.
    MalformedAuthorization,
    /// The token is not a decodable JWT.
    Malformed { reason: String },
    /// No key in the key set matches the token.
    UnknownKey { kid: Option<String> },
    /// The token's algorithm cannot be used with the matching key.
    UnsupportedAlgorithm { algorithm: String },
    /// The key set could not be fetched or parsed.
    KeySet { details: String },
    /// The token has expired.
    Expired,
    /// Signature, issuer or audience verification failed.
    Invalid { reason: String },
}

impl fmt::Display for TokenError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingAuthorization => write!(f, "no authorization header"),
            Self::MalformedAuthorization => {
                write!(f, "authorization header is not a bearer token")
            }
            Self::Malformed { reason } => write!(f, "malformed token: {reason}"),
            Self::UnknownKey { kid: Some(kid) } => write!(f, "no signing key with id {kid}"),
            Self::UnknownKey { kid: None } => {
                write!(f, "token has no key id and key set is ambiguous")
            }
            Self::UnsupportedAlgorithm { algorithm } => {
                write!(f, "unsupported signing algorithm: {algorithm}")
            }
            Self::KeySet { details } => write!(f, "key set unavailable: {details}"),
            Self::Expired => write!(f, "token has expired"),
            Self::Invalid { reason } => write!(f, "invalid token: {reason}"),
        }
    }
}

impl std::error::Error for TokenError {}

/// Claims of a verified token could not be decoded into an identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClaimsError {
    Undecodable { reason: String },
}

impl fmt::Display for ClaimsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Undecodable { reason } => write!(f, "unable to decode claims: {reason}"),
        }
    }
}

impl std::error::Error for ClaimsError {}

/// A decoded identity does not satisfy the authorisation policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthorisationDenied {
    /// The email is not the authorised one.
    EmailMismatch { email: String },
    /// The email matches but has not been verified.
    EmailNotVerified { email: String },
}

impl fmt::Display for AuthorisationDenied {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmailMismatch { email } => write!(f, "email {email:?} is not authorised"),
            Self::EmailNotVerified { email } => {
                write!(f, "authorised user requires verified email but {email:?} is unverified")
            }
        }
    }
}

impl std::error::Error for AuthorisationDenied {}

/// Which stage of the request authorisation chain refused a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestAuthError {
    /// The bearer token failed validation.
    Unauthenticated,
    /// The token was valid but its claims could not be extracted.
    InvalidClaims,
    /// The identity was extracted but is not authorised.
    Denied,
}

impl fmt::Display for RequestAuthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unauthenticated => write!(f, "unauthorised request"),
            Self::InvalidClaims => write!(f, "unable to extract claims"),
            Self::Denied => write!(f, "unauthorised token"),
        }
    }
}

impl std::error::Error for RequestAuthError {}
