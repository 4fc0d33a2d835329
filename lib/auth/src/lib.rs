//! Authentication and authorisation for the mon ledger service.
//!
//! Two independent pieces live here:
//!
//! - The **login flow** ([`login`]): issues an OAuth2 authorization URL bound
//!   to a CSRF state value, then verifies that state on the provider's
//!   callback and exchanges the authorization code for an identity token.
//! - The **request authorisation chain**: a [`TokenValidator`] verifies the
//!   bearer token, a [`ClaimsExtractor`] decodes an [`Identity`] from it and a
//!   [`ClaimsAuthoriser`] checks that identity against policy.
//!   [`RequestTokenAuthoriser`] composes the three stages and stops at the
//!   first failure.
//!
//! Every failure is reported as a rootcause `Report` whose current context
//! says which stage failed; the HTTP layer decides status codes from that.

pub mod authoriser;
pub mod claims;
pub mod config;
pub mod error;
pub mod identity;
pub mod jwks;
pub mod login;
pub mod token;

pub use authoriser::{RequestAuthoriser, RequestTokenAuthoriser};
pub use claims::{ClaimsAuthoriser, ClaimsExtractor, EmailClaimsExtractor, IdentityClaimsAuthoriser};
pub use config::{AuthorisationConfig, LoginConfig};
pub use error::{
    AuthorisationDenied, ClaimsError, ConfigurationError, ExchangeError, LoginError,
    RequestAuthError, TokenError,
};
pub use identity::{AuthorisedIdentity, Identity};
pub use jwks::JwksTokenValidator;
pub use token::{TokenValidator, ValidatedToken, bearer_token};
