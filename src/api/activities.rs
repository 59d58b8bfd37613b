use axum::{extract::State, http::StatusCode, response::Json, routing::get, Router};

use crate::api::AppState;
use crate::auth::AuthUser;
use crate::errors::ServiceError;
use crate::models::{ActivityLog, ActivityLogRequest, ActivityRecommendation};

pub fn activity_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_activities).post(log_activity))
        .route("/recommendations", get(recommendations))
}

/// Log an activity; the coin reward is applied as a side effect
#[tracing::instrument(skip(state, request))]
async fn log_activity(
    State(state): State<AppState>,
    user: AuthUser,
    Json(request): Json<ActivityLogRequest>,
) -> Result<(StatusCode, Json<ActivityLog>), ServiceError> {
    let log = state.activities.log_activity(user.user_id, request).await?;
    Ok((StatusCode::CREATED, Json(log)))
}

async fn list_activities(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<Vec<ActivityLog>>, ServiceError> {
    Ok(Json(state.activities.activities(user.user_id).await?))
}

async fn recommendations(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<Vec<ActivityRecommendation>>, ServiceError> {
    Ok(Json(state.activities.recommendations(user.user_id).await?))
}
