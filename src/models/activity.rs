use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityLog {
    pub id: i32,
    pub user_id: i32,
    pub activity_type: String,
    pub duration_minutes: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distance_km: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub calories_burned: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub heart_rate_avg: Option<i32>,
    pub activity_date: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weather_condition: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location_data: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avg_pace: Option<f64>,
    pub coins_earned: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub music_played: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ActivityLogRequest {
    pub activity_type: String,
    pub duration_minutes: i32,
    #[serde(default)]
    pub distance_km: Option<f64>,
    #[serde(default)]
    pub calories_burned: Option<i32>,
    #[serde(default)]
    pub heart_rate_avg: Option<i32>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub weather_condition: Option<String>,
    #[serde(default)]
    pub location_data: Option<serde_json::Value>,
    #[serde(default)]
    pub avg_pace: Option<f64>,
    #[serde(default)]
    pub music_played: Option<String>,
}

/// Activity log with derived values resolved, ready to be stored.
#[derive(Debug, Clone, PartialEq)]
pub struct NewActivityLog {
    pub user_id: i32,
    pub activity_type: String,
    pub duration_minutes: i32,
    pub distance_km: Option<f64>,
    pub calories_burned: Option<i32>,
    pub heart_rate_avg: Option<i32>,
    pub notes: Option<String>,
    pub weather_condition: Option<String>,
    pub location_data: Option<serde_json::Value>,
    pub avg_pace: Option<f64>,
    pub coins_earned: i32,
    pub music_played: Option<String>,
}

impl NewActivityLog {
    pub fn from_request(user_id: i32, req: ActivityLogRequest, calories: Option<i32>, coins: i32) -> Self {
        Self {
            user_id,
            activity_type: req.activity_type,
            duration_minutes: req.duration_minutes,
            distance_km: req.distance_km,
            calories_burned: calories,
            heart_rate_avg: req.heart_rate_avg,
            notes: req.notes,
            weather_condition: req.weather_condition,
            location_data: req.location_data,
            avg_pace: req.avg_pace,
            coins_earned: coins,
            music_played: req.music_played,
        }
    }
}

/// Known activity types. Anything else is `Other` and gets default rates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActivityKind {
    Jogging,
    Running,
    Yoga,
    Badminton,
    Other,
}

impl ActivityKind {
    pub fn parse(activity_type: &str) -> Self {
        match activity_type {
            "Jogging" => Self::Jogging,
            "Running" => Self::Running,
            "Yoga" => Self::Yoga,
            "Badminton" => Self::Badminton,
            _ => Self::Other,
        }
    }

    /// Metabolic equivalent of task.
    pub fn met(self) -> f64 {
        match self {
            Self::Jogging => 7.0,
            Self::Running => 9.8,
            Self::Yoga => 3.0,
            Self::Badminton => 5.5,
            Self::Other => 5.0,
        }
    }

    pub fn coins_per_minute(self) -> f64 {
        match self {
            Self::Running => 0.5,
            Self::Jogging | Self::Badminton => 0.4,
            Self::Yoga | Self::Other => 0.3,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Jogging => "Jogging",
            Self::Running => "Running",
            Self::Yoga => "Yoga",
            Self::Badminton => "Badminton",
            Self::Other => "Other",
        }
    }
}

impl fmt::Display for ActivityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityRecommendation {
    pub id: i32,
    pub user_id: i32,
    pub activity_type: String,
    pub recommendation_reason: String,
    pub priority_order: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
