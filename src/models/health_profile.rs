use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::User;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthProfile {
    pub user_id: i32,
    pub age: Option<i32>,
    pub height: Option<f64>,
    pub weight: Option<f64>,
    pub updated_at: DateTime<Utc>,
}

impl From<&User> for HealthProfile {
    fn from(user: &User) -> Self {
        Self {
            user_id: user.id,
            age: user.age,
            height: user.height,
            weight: user.weight,
            updated_at: user.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileUpdateRequest {
    pub age: i32,
    pub height: f64,
    pub weight: f64,
}
