//! REST server for the mon personal-finance ledger.
//!
//! Every ledger route sits behind [`auth::require_authorisation`]. The
//! login routes are only mounted when a [`LoginFlow`] is configured.

pub mod api;
pub mod auth;
pub mod config;
pub mod db;
pub mod error;

use axum::{Router, middleware, routing::get};
use mon_auth::RequestAuthoriser;
use mon_auth::login::LoginFlow;
use mon_ledger::Ledger;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

/// Shared application state.
pub struct AppState {
    /// The ledger the API serves.
    pub ledger: Ledger,
    /// Gate for the protected routes.
    pub authoriser: Arc<dyn RequestAuthoriser>,
}

impl AppState {
    /// Creates a new application state.
    pub fn new(ledger: Ledger, authoriser: Arc<dyn RequestAuthoriser>) -> Self {
        Self { ledger, authoriser }
    }
}

/// Builds the application router.
pub fn router(state: Arc<AppState>, login: Option<Arc<LoginFlow>>) -> Router {
    let protected = api::protected_routes().route_layer(middleware::from_fn_with_state(
        Arc::clone(&state),
        auth::require_authorisation,
    ));

    let mut app = Router::new()
        .route("/health", get(api::health::health))
        .merge(protected)
        .with_state(state);

    if let Some(flow) = login {
        app = app.merge(
            Router::new()
                .route("/loginurl", get(auth::login_url))
                .route("/logincallback", get(auth::login_callback))
                .with_state(flow),
        );
    }

    app.layer(TraceLayer::new_for_http())
}
