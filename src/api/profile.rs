use axum::{extract::State, response::Json, routing::get, Router};

use crate::api::AppState;
use crate::auth::AuthUser;
use crate::errors::ServiceError;
use crate::models::{HealthProfile, ProfileUpdateRequest};

pub fn profile_routes() -> Router<AppState> {
    Router::new().route("/", get(get_profile).put(update_profile))
}

async fn get_profile(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<HealthProfile>, ServiceError> {
    Ok(Json(state.profiles.get_profile(user.user_id).await?))
}

#[tracing::instrument(skip(state, request))]
async fn update_profile(
    State(state): State<AppState>,
    user: AuthUser,
    Json(request): Json<ProfileUpdateRequest>,
) -> Result<Json<HealthProfile>, ServiceError> {
    Ok(Json(state.profiles.update_profile(user.user_id, request).await?))
}
