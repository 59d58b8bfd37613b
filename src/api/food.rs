use axum::{
    extract::State,
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Router,
};

use crate::api::AppState;
use crate::auth::AuthUser;
use crate::errors::ServiceError;
use crate::models::{FoodAnalysis, FoodAnalysisRequest, FoodLog, FoodLogRequest};

pub fn food_routes() -> Router<AppState> {
    Router::new()
        .route("/logs", get(list_food_logs).post(log_food))
        .route("/analyze", post(analyze_food))
}

#[tracing::instrument(skip(state, request))]
async fn log_food(
    State(state): State<AppState>,
    user: AuthUser,
    Json(request): Json<FoodLogRequest>,
) -> Result<(StatusCode, Json<FoodLog>), ServiceError> {
    let log = state.food.log_food(user.user_id, request).await?;
    Ok((StatusCode::CREATED, Json(log)))
}

async fn list_food_logs(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<Vec<FoodLog>>, ServiceError> {
    Ok(Json(state.food.food_logs(user.user_id).await?))
}

/// Nutrition estimate for a food photo sent as a base64 data URL
#[tracing::instrument(skip(state, request))]
async fn analyze_food(
    State(state): State<AppState>,
    user: AuthUser,
    Json(request): Json<FoodAnalysisRequest>,
) -> Result<Json<FoodAnalysis>, ServiceError> {
    Ok(Json(state.food.analyze(user.user_id, request).await?))
}
