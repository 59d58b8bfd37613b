use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

use sigap_health::api::{create_routes, AppState};
use sigap_health::auth::JwtService;
use sigap_health::oracle::DisabledOracle;
use sigap_health::repository::Repositories;

fn app() -> Router {
    let state = AppState::new(
        Repositories::in_memory(),
        Arc::new(DisabledOracle),
        JwtService::new("test_secret"),
    )
    .with_hash_cost(4);
    create_routes(state)
}

async fn call(
    app: &Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, value)
}

async fn signup(app: &Router, email: &str) -> String {
    let (status, body) = call(
        app,
        Method::POST,
        "/api/auth/signup",
        None,
        Some(json!({"username": "tester", "email": email, "password": "secret123"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    body["token"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn health_check_is_public() {
    let app = app();
    let (status, body) = call(&app, Method::GET, "/health", None, None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
async fn signup_login_and_duplicate_email() {
    let app = app();
    signup(&app, "user@example.com").await;

    let (status, body) = call(
        &app,
        Method::POST,
        "/api/auth/login",
        None,
        Some(json!({"email": "user@example.com", "password": "secret123"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["email"], "user@example.com");
    assert!(body["user"].get("password_hash").is_none());

    let (status, _) = call(
        &app,
        Method::POST,
        "/api/auth/signup",
        None,
        Some(json!({"username": "again", "email": "user@example.com", "password": "secret123"})),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = call(
        &app,
        Method::POST,
        "/api/auth/login",
        None,
        Some(json!({"email": "user@example.com", "password": "wrong-pass"})),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn protected_routes_require_a_valid_token() {
    let app = app();

    let (status, body) = call(&app, Method::GET, "/api/coins", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Missing authorization header");

    let (status, _) = call(&app, Method::GET, "/api/coins", Some("not-a-jwt"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn profile_update_and_read() {
    let app = app();
    let token = signup(&app, "user@example.com").await;

    let (status, body) = call(
        &app,
        Method::PUT,
        "/api/profile",
        Some(&token),
        Some(json!({"age": 52, "height": 165.0, "weight": 68.5})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["age"], 52);

    let (status, body) = call(&app, Method::GET, "/api/profile", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["weight"], 68.5);

    let (status, body) = call(
        &app,
        Method::PUT,
        "/api/profile",
        Some(&token),
        Some(json!({"age": 200, "height": 165.0, "weight": 68.5})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Validation failed");
}

#[tokio::test]
async fn assessment_submit_and_latest() {
    let app = app();
    let token = signup(&app, "user@example.com").await;

    let (status, _) = call(&app, Method::GET, "/api/assessment/latest", Some(&token), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let answers = json!({
        "screen_time_hours": 4,
        "exercise_hours": 1,
        "late_night_frequency": 4,
        "diet_quality": 4
    });
    let (status, body) =
        call(&app, Method::POST, "/api/assessment", Some(&token), Some(answers)).await;
    assert_eq!(status, StatusCode::CREATED);
    // unset age: 30 + 15 + 0 + 15 + 15
    assert_eq!(body["result"]["risk_percentage"], 75);
    assert_eq!(body["result"]["risk_factors"].as_array().unwrap().len(), 3);

    let (status, body) = call(&app, Method::GET, "/api/assessment/latest", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["result"]["risk_percentage"], 75);

    let (status, body) = call(&app, Method::GET, "/api/assessment/history", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn activity_rewards_flow_into_the_coin_endpoints() {
    let app = app();
    let token = signup(&app, "user@example.com").await;

    let (status, body) = call(
        &app,
        Method::POST,
        "/api/activities",
        Some(&token),
        Some(json!({"activity_type": "Jogging", "duration_minutes": 60})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["coins_earned"], 34);
    assert_eq!(body["calories_burned"], 490);

    let (_, body) = call(&app, Method::GET, "/api/coins", Some(&token), None).await;
    assert_eq!(body["total_coins"], 34);

    let (status, body) = call(
        &app,
        Method::POST,
        "/api/coins/spend",
        Some(&token),
        Some(json!({"amount": 100, "transaction_type": "Reward"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Insufficient coins");

    let (status, body) = call(
        &app,
        Method::POST,
        "/api/coins/spend",
        Some(&token),
        Some(json!({"amount": 4, "transaction_type": "Reward"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["account"]["total_coins"], 30);
    assert_eq!(body["transaction"]["amount"], -4);

    let (status, _) = call(
        &app,
        Method::POST,
        "/api/coins/add",
        Some(&token),
        Some(json!({"amount": 0, "transaction_type": "Bonus"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, body) = call(&app, Method::GET, "/api/coins/transactions", Some(&token), None).await;
    let amounts: Vec<i64> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["amount"].as_i64().unwrap())
        .collect();
    assert_eq!(amounts, vec![-4, 34]);
}

#[tokio::test]
async fn chatbot_conversation_lifecycle() {
    let app = app();
    let token = signup(&app, "user@example.com").await;

    let (status, body) =
        call(&app, Method::POST, "/api/chatbot/conversations", Some(&token), None).await;
    assert_eq!(status, StatusCode::CREATED);
    let id = body["conversation"]["id"].as_i64().unwrap();

    let (status, body) = call(
        &app,
        Method::POST,
        &format!("/api/chatbot/conversations/{}/messages", id),
        Some(&token),
        Some(json!({"content": "Is coffee bad for me?"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user_message"]["sender_type"], "user");
    assert_eq!(body["bot_message"]["sender_type"], "bot");

    let (_, body) = call(
        &app,
        Method::GET,
        &format!("/api/chatbot/conversations/{}/messages", id),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(body["messages"].as_array().unwrap().len(), 3);

    let other = signup(&app, "other@example.com").await;
    let (status, _) = call(
        &app,
        Method::GET,
        &format!("/api/chatbot/conversations/{}", id),
        Some(&other),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = call(
        &app,
        Method::DELETE,
        &format!("/api/chatbot/conversations/{}", id),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = call(
        &app,
        Method::GET,
        &format!("/api/chatbot/conversations/{}", id),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn food_log_and_analysis() {
    let app = app();
    let token = signup(&app, "user@example.com").await;

    let (status, body) = call(
        &app,
        Method::POST,
        "/api/food/logs",
        Some(&token),
        Some(json!({"food_name": "Gado-gado"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let log_id = body["id"].as_i64().unwrap();

    let (status, body) = call(
        &app,
        Method::POST,
        "/api/food/analyze",
        Some(&token),
        Some(json!({"food_log_id": log_id, "image_data": "data:image/png;base64,aGVsbG8="})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["calories"], 275);
    assert_eq!(body["detected_items"], json!(["Unknown food item"]));

    let (status, _) = call(
        &app,
        Method::POST,
        "/api/food/analyze",
        Some(&token),
        Some(json!({"food_log_id": log_id + 100, "image_data": "data:image/png;base64,aGVsbG8="})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, body) = call(&app, Method::GET, "/api/food/logs", Some(&token), None).await;
    assert_eq!(body[0]["analysis"]["calories"], 275);
}
