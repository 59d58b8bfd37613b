use axum::{extract::State, http::StatusCode, response::Json, routing::{get, post}, Router};

use crate::api::AppState;
use crate::auth::AuthUser;
use crate::errors::ServiceError;
use crate::models::{AssessmentHistoryEntry, AssessmentRequest, AssessmentResponse};

pub fn assessment_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(submit_assessment))
        .route("/latest", get(latest_assessment))
        .route("/history", get(assessment_history))
}

/// Score a questionnaire and store the result
#[tracing::instrument(skip(state, request))]
async fn submit_assessment(
    State(state): State<AppState>,
    user: AuthUser,
    Json(request): Json<AssessmentRequest>,
) -> Result<(StatusCode, Json<AssessmentResponse>), ServiceError> {
    let response = state.assessments.submit(user.user_id, request).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

async fn latest_assessment(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<AssessmentHistoryEntry>, ServiceError> {
    Ok(Json(state.assessments.latest(user.user_id).await?))
}

async fn assessment_history(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<Vec<AssessmentHistoryEntry>>, ServiceError> {
    Ok(Json(state.assessments.history(user.user_id).await?))
}
