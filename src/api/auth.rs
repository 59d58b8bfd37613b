use axum::{extract::State, http::StatusCode, response::Json, routing::post, Router};

use crate::api::AppState;
use crate::auth::AuthError;
use crate::models::{AuthResponse, GoogleLoginRequest, LoginRequest, SignupRequest};

/// Public routes: signup, password login and Google login
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/signup", post(signup))
        .route("/login", post(login))
        .route("/google", post(google_login))
}

#[tracing::instrument(skip(state, request))]
async fn signup(
    State(state): State<AppState>,
    Json(request): Json<SignupRequest>,
) -> Result<(StatusCode, Json<AuthResponse>), AuthError> {
    let response = state.auth.register(request).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

#[tracing::instrument(skip(state, request))]
async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, AuthError> {
    let response = state.auth.login(request).await?;
    Ok(Json(response))
}

#[tracing::instrument(skip(state, request))]
async fn google_login(
    State(state): State<AppState>,
    Json(request): Json<GoogleLoginRequest>,
) -> Result<Json<AuthResponse>, AuthError> {
    let response = state.auth.google_login(request).await?;
    Ok(Json(response))
}
