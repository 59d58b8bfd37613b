use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One answered lifestyle questionnaire. Immutable once stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assessment {
    pub id: i32,
    pub user_id: i32,
    pub screen_time_hours: i32,
    pub exercise_hours: i32,
    pub late_night_frequency: i32,
    pub diet_quality: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskResult {
    pub id: i32,
    pub user_id: i32,
    pub assessment_id: i32,
    pub risk_percentage: i32,
    pub risk_factors: Vec<String>,
    pub recommendations: Vec<String>,
    pub created_at: DateTime<Utc>,
}

/// The four questionnaire answers, each on a 1 (best) to 4 (worst) scale,
/// except exercise where 4 means the most exercise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssessmentRequest {
    pub screen_time_hours: i32,
    pub exercise_hours: i32,
    pub late_night_frequency: i32,
    pub diet_quality: i32,
}

/// Validated scorer output: a percentage in [0, 100] and exactly three
/// factors and three recommendations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskOutcome {
    pub risk_percentage: i32,
    pub risk_factors: Vec<String>,
    pub recommendations: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssessmentResponse {
    pub assessment: Assessment,
    pub result: RiskResult,
}

/// An assessment joined with its result; `result` is `None` when no result
/// was ever recorded for it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssessmentHistoryEntry {
    pub assessment: Assessment,
    pub result: Option<RiskResult>,
}
