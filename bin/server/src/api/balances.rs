//! Balance handlers.

use crate::AppState;
use crate::error::ApiError;
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use mon_core::{AccountId, BalanceId};
use mon_ledger::{Balance, BalanceDetails};
use std::sync::Arc;

/// Lists an account's balances, oldest first.
pub async fn list_balances(
    State(state): State<Arc<AppState>>,
    Path(account_id): Path<String>,
) -> Result<Json<Vec<Balance>>, ApiError> {
    let account_id: AccountId = account_id.parse()?;
    Ok(Json(state.ledger.balances(account_id).await?))
}

pub async fn add_balance(
    State(state): State<Arc<AppState>>,
    Path(account_id): Path<String>,
    Json(details): Json<BalanceDetails>,
) -> Result<(StatusCode, Json<Balance>), ApiError> {
    let account_id: AccountId = account_id.parse()?;
    let balance = state.ledger.add_balance(account_id, details).await?;
    Ok((StatusCode::CREATED, Json(balance)))
}

pub async fn get_balance(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Balance>, ApiError> {
    let id: BalanceId = id.parse()?;
    Ok(Json(state.ledger.balance(id).await?))
}

pub async fn delete_balance(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let id: BalanceId = id.parse()?;
    state.ledger.delete_balance(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
