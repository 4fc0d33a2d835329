//! Account handlers.

use crate::AppState;
use crate::error::ApiError;
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use mon_core::AccountId;
use mon_ledger::{Account, AccountDetails};
use std::sync::Arc;

pub async fn list_accounts(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<Account>>, ApiError> {
    Ok(Json(state.ledger.accounts().await?))
}

pub async fn create_account(
    State(state): State<Arc<AppState>>,
    Json(details): Json<AccountDetails>,
) -> Result<(StatusCode, Json<Account>), ApiError> {
    let account = state.ledger.create_account(details).await?;
    Ok((StatusCode::CREATED, Json(account)))
}

pub async fn get_account(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Account>, ApiError> {
    let id: AccountId = id.parse()?;
    Ok(Json(state.ledger.account(id).await?))
}

pub async fn update_account(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(details): Json<AccountDetails>,
) -> Result<Json<Account>, ApiError> {
    let id: AccountId = id.parse()?;
    Ok(Json(state.ledger.update_account(id, details).await?))
}

pub async fn delete_account(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let id: AccountId = id.parse()?;
    state.ledger.delete_account(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
