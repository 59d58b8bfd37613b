use axum::{extract::State, response::Json, routing::{get, post}, Router};

use crate::api::AppState;
use crate::auth::AuthUser;
use crate::errors::ServiceError;
use crate::models::{CoinAccount, CoinRequest, CoinTransaction, LedgerReceipt};

pub fn coin_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(balance))
        .route("/add", post(add_coins))
        .route("/spend", post(spend_coins))
        .route("/transactions", get(transactions))
}

async fn balance(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<CoinAccount>, ServiceError> {
    Ok(Json(state.coins.get_balance(user.user_id).await?))
}

#[tracing::instrument(skip(state, request))]
async fn add_coins(
    State(state): State<AppState>,
    user: AuthUser,
    Json(request): Json<CoinRequest>,
) -> Result<Json<LedgerReceipt>, ServiceError> {
    Ok(Json(state.coins.credit(user.user_id, &request).await?))
}

#[tracing::instrument(skip(state, request))]
async fn spend_coins(
    State(state): State<AppState>,
    user: AuthUser,
    Json(request): Json<CoinRequest>,
) -> Result<Json<LedgerReceipt>, ServiceError> {
    Ok(Json(state.coins.debit(user.user_id, &request).await?))
}

async fn transactions(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<Vec<CoinTransaction>>, ServiceError> {
    Ok(Json(state.coins.history(user.user_id).await?))
}
