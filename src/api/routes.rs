use axum::{routing::get, Router};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use super::activities::activity_routes;
use super::assessment::assessment_routes;
use super::auth::auth_routes;
use super::chatbot::chatbot_routes;
use super::coins::coin_routes;
use super::food::food_routes;
use super::health::health_check;
use super::profile::profile_routes;
use super::AppState;

/// Full application router. Everything under `/api` except `/api/auth`
/// requires a bearer token, enforced by the `AuthUser` extractor.
pub fn create_routes(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_check))
        .nest("/api/auth", auth_routes())
        .nest("/api/profile", profile_routes())
        .nest("/api/assessment", assessment_routes())
        .nest("/api/activities", activity_routes())
        .nest("/api/coins", coin_routes())
        .nest("/api/chatbot", chatbot_routes())
        .nest("/api/food", food_routes())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
