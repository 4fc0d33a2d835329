//! The ledger REST API.

pub mod accounts;
pub mod balances;
pub mod health;

use crate::AppState;
use axum::{Router, routing::get};
use std::sync::Arc;

/// Routes that require an authorised caller.
pub fn protected_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/accounts",
            get(accounts::list_accounts).post(accounts::create_account),
        )
        .route(
            "/accounts/{id}",
            get(accounts::get_account)
                .put(accounts::update_account)
                .delete(accounts::delete_account),
        )
        .route(
            "/accounts/{id}/balances",
            get(balances::list_balances).post(balances::add_balance),
        )
        .route(
            "/balances/{id}",
            get(balances::get_balance).delete(balances::delete_balance),
        )
}
