use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FoodLog {
    pub id: i32,
    pub user_id: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub food_name: Option<String>,
    pub log_date: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub photo_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub analysis: Option<FoodAnalysis>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FoodAnalysis {
    pub id: i32,
    pub food_log_id: i32,
    pub protein_grams: f64,
    pub carbs_grams: f64,
    pub fat_grams: f64,
    pub fiber_grams: f64,
    pub calories: i32,
    pub detected_items: Vec<String>,
    pub healthiness_score: i32,
    pub ai_confidence: f64,
    pub analyzed_at: DateTime<Utc>,
}

/// Nutrition values produced by the vision oracle or the mock fallback,
/// before they are attached to a food log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NutritionEstimate {
    pub protein_grams: f64,
    pub carbs_grams: f64,
    pub fat_grams: f64,
    pub fiber_grams: f64,
    pub calories: i32,
    pub detected_items: Vec<String>,
    pub healthiness_score: i32,
    pub ai_confidence: f64,
}

impl NutritionEstimate {
    /// Fixed analysis used when the vision oracle gives nothing usable.
    pub fn mock() -> Self {
        Self {
            protein_grams: 15.0,
            carbs_grams: 30.0,
            fat_grams: 10.0,
            fiber_grams: 5.0,
            calories: 275,
            detected_items: vec!["Unknown food item".to_string()],
            healthiness_score: 6,
            ai_confidence: 0.5,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FoodLogRequest {
    #[serde(default)]
    pub food_name: Option<String>,
    #[serde(default)]
    pub photo_url: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FoodAnalysisRequest {
    pub food_log_id: i32,
    /// `data:image/<type>;base64,<payload>`
    pub image_data: String,
}
