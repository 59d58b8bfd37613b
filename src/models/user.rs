use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: i32,
    pub username: String,
    pub email: String,
    #[serde(skip)]
    pub password_hash: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub google_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub age: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weight: Option<f64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn vitals(&self) -> UserVitals {
        UserVitals {
            age: self.age,
            height: self.height,
            weight: self.weight,
        }
    }
}

/// Body measurements consumed by the risk scorer, the reward engine and the
/// chatbot. Unset profile fields stay `None`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct UserVitals {
    pub age: Option<i32>,
    pub height: Option<f64>,
    pub weight: Option<f64>,
}

impl UserVitals {
    pub const DEFAULT_AGE: i32 = 30;
    pub const DEFAULT_HEIGHT_CM: f64 = 170.0;
    pub const DEFAULT_WEIGHT_KG: f64 = 70.0;

    pub fn age_or_default(&self) -> i32 {
        self.age.filter(|a| *a > 0).unwrap_or(Self::DEFAULT_AGE)
    }

    pub fn height_or_default(&self) -> f64 {
        self.height.filter(|h| *h > 0.0).unwrap_or(Self::DEFAULT_HEIGHT_CM)
    }

    pub fn weight_or_default(&self) -> f64 {
        self.weight.filter(|w| *w > 0.0).unwrap_or(Self::DEFAULT_WEIGHT_KG)
    }
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password_hash: Option<String>,
    pub google_id: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SignupRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct GoogleLoginRequest {
    pub google_id: String,
    pub email: String,
    pub username: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: User,
}
