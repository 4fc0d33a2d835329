//! Authentication for the mon server.
//!
//! This module provides:
//! - The login endpoints that drive the OAuth2 authorization code flow
//! - Middleware that runs every protected request through a
//!   [`RequestAuthoriser`](mon_auth::RequestAuthoriser)
//!
//! There are no server-side sessions. A completed login hands the identity
//! token back to the caller, who presents it as a bearer token on each
//! request.

pub mod middleware;
pub mod routes;

pub use middleware::{AuthRejection, require_authorisation};
pub use routes::{login_callback, login_url};
