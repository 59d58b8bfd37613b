//! Stroke-risk scoring: oracle first, deterministic heuristic as fallback.
//!
//! Whatever the oracle returns, the outcome always carries a percentage in
//! [0, 100] and exactly three risk factors and three recommendations.

use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::models::{AssessmentRequest, RiskOutcome, UserVitals};
use crate::oracle::{extract_json_object, Oracle, OracleRequest};

const SLOTS: usize = 3;

const FACTOR_FILLER: &str = "Other lifestyle factors";
const NO_FACTOR: &str = "Lifestyle factors";

const GENERIC_RECOMMENDATIONS: [&str; 5] = [
    "Maintain a healthy weight",
    "Stay hydrated throughout the day",
    "Practice stress-reduction techniques",
    "Schedule regular health check-ups",
    "Monitor blood pressure regularly",
];

const ORACLE_RECOMMENDATION_FILLERS: [&str; 3] = [
    "Maintain a healthy diet",
    "Exercise regularly",
    "Get adequate sleep",
];
const LAST_RESORT_RECOMMENDATION: &str = "Consult with a healthcare professional";

pub struct RiskScorer {
    oracle: Arc<dyn Oracle>,
}

impl RiskScorer {
    pub fn new(oracle: Arc<dyn Oracle>) -> Self {
        Self { oracle }
    }

    /// Score an assessment. Oracle failures never surface; they degrade to
    /// the heuristic.
    pub async fn assess(&self, vitals: &UserVitals, req: &AssessmentRequest) -> RiskOutcome {
        let prompt = build_prompt(vitals, req);

        match self.oracle.generate(OracleRequest::text(prompt)).await {
            Ok(raw) => match parse_payload(&raw) {
                Some(payload) => repair(payload, vitals, req),
                None => {
                    warn!("Oracle risk payload unusable, using heuristic");
                    debug!("Raw oracle reply: {}", raw);
                    heuristic(vitals, req)
                }
            },
            Err(e) => {
                warn!("Risk oracle failed, using heuristic: {}", e);
                heuristic(vitals, req)
            }
        }
    }
}

// ============================================================================
// Heuristic
// ============================================================================

/// `30 + age bonus + 5 per step of each answer`, exercise counting down.
pub fn heuristic_score(age: Option<i32>, req: &AssessmentRequest) -> i32 {
    let age_bonus = match age.unwrap_or(0) {
        a if a > 60 => 20,
        a if a > 45 => 10,
        _ => 0,
    };

    let score = 30 + age_bonus + 5 * (req.screen_time_hours - 1) - 5 * (req.exercise_hours - 1)
        + 5 * (req.late_night_frequency - 1)
        + 5 * (req.diet_quality - 1);

    score.clamp(0, 100)
}

pub fn heuristic_risk_factors(req: &AssessmentRequest) -> Vec<String> {
    let mut factors: Vec<String> = triggered(req)
        .into_iter()
        .map(|(factor, _)| factor.to_string())
        .collect();

    if factors.is_empty() {
        factors.push(NO_FACTOR.to_string());
    }
    pad(&mut factors, std::iter::repeat(FACTOR_FILLER));
    factors.truncate(SLOTS);
    factors
}

pub fn heuristic_recommendations(req: &AssessmentRequest) -> Vec<String> {
    let mut recommendations: Vec<String> = triggered(req)
        .into_iter()
        .map(|(_, recommendation)| recommendation.to_string())
        .collect();

    pad(&mut recommendations, GENERIC_RECOMMENDATIONS.into_iter());
    recommendations.truncate(SLOTS);
    recommendations
}

pub fn heuristic(vitals: &UserVitals, req: &AssessmentRequest) -> RiskOutcome {
    RiskOutcome {
        risk_percentage: heuristic_score(vitals.age, req),
        risk_factors: heuristic_risk_factors(req),
        recommendations: heuristic_recommendations(req),
    }
}

/// Triggered (factor, recommendation) pairs, in questionnaire order.
fn triggered(req: &AssessmentRequest) -> Vec<(&'static str, &'static str)> {
    let rules = [
        (
            req.screen_time_hours >= 3,
            "Excessive screen time",
            "Reduce daily screen time to less than 4 hours",
        ),
        (
            req.exercise_hours <= 2,
            "Insufficient physical activity",
            "Increase physical activity to at least 30 minutes daily",
        ),
        (
            req.late_night_frequency >= 3,
            "Irregular sleep patterns",
            "Establish regular sleep schedule",
        ),
        (
            req.diet_quality >= 3,
            "Poor dietary habits",
            "Improve diet with more fruits and vegetables",
        ),
    ];

    rules
        .into_iter()
        .filter(|(hit, _, _)| *hit)
        .map(|(_, factor, recommendation)| (factor, recommendation))
        .collect()
}

fn pad<'a>(items: &mut Vec<String>, fillers: impl Iterator<Item = &'a str>) {
    for filler in fillers {
        if items.len() >= SLOTS {
            break;
        }
        items.push(filler.to_string());
    }
}

// ============================================================================
// Oracle prompt and parse-or-fallback
// ============================================================================

pub fn screen_time_description(answer: i32) -> &'static str {
    match answer {
        1 => "just an hour",
        2 => "around 2-4 hours",
        3 => "around 5-8 hours",
        _ => "more than 9 hours per day",
    }
}

pub fn exercise_description(answer: i32) -> &'static str {
    screen_time_description(answer)
}

pub fn late_night_description(answer: i32) -> &'static str {
    match answer {
        1 => "never",
        2 => "once a week when tomorrow is a vacation day",
        3 => "about 2-4 times a week",
        _ => "every day without pause and continuously",
    }
}

pub fn diet_description(answer: i32) -> &'static str {
    match answer {
        1 => "a regular diet with plenty of vegetables and fruit",
        2 => "a little messy but still consuming vegetables",
        3 => "messy diet and sometimes eat fast and high-fat foods",
        _ => "no vegetables, no fruits, only eat something like junk food",
    }
}

pub fn build_prompt(vitals: &UserVitals, req: &AssessmentRequest) -> String {
    format!(
        r#"You are a stroke risk assessment AI. Analyze this user profile:
Age: {}, Height: {:.2} cm, Weight: {:.2} kg
Screen time: {}
Exercise: {}
Late night habits: {}
Diet: {}

Return ONLY a JSON object with these fields:
- risk_percentage: an integer from 0-100
- risk_factors: array of 3 risk factors identified
- recommendations: array of 3 recommendations to reduce risk

Example response format:
{{"risk_percentage": 65, "risk_factors": ["factor1", "factor2", "factor3"], "recommendations": ["recommendation1", "recommendation2", "recommendation3"]}}
"#,
        vitals.age_or_default(),
        vitals.height_or_default(),
        vitals.weight_or_default(),
        screen_time_description(req.screen_time_hours),
        exercise_description(req.exercise_hours),
        late_night_description(req.late_night_frequency),
        diet_description(req.diet_quality),
    )
}

/// Expected oracle shape. `risk_percentage` must be present and integral;
/// the arrays may be missing.
#[derive(Debug, Deserialize)]
struct OraclePayload {
    risk_percentage: i64,
    #[serde(default)]
    risk_factors: Option<Vec<String>>,
    #[serde(default)]
    recommendations: Option<Vec<String>>,
}

/// Strict decode of the oracle text; `None` means "use the heuristic".
fn parse_payload(raw: &str) -> Option<OraclePayload> {
    let json = extract_json_object(raw)?;
    serde_json::from_str(json)
        .map_err(|e| debug!("Risk payload decode failed: {}", e))
        .ok()
}

fn repair(payload: OraclePayload, vitals: &UserVitals, req: &AssessmentRequest) -> RiskOutcome {
    let risk_percentage = match i32::try_from(payload.risk_percentage) {
        Ok(p) if (0..=100).contains(&p) => p,
        _ => {
            warn!(
                "Oracle risk percentage {} out of range, using heuristic score",
                payload.risk_percentage
            );
            heuristic_score(vitals.age, req)
        }
    };

    let mut risk_factors = non_empty(payload.risk_factors).unwrap_or_else(|| heuristic_risk_factors(req));
    risk_factors.truncate(SLOTS);
    pad(&mut risk_factors, std::iter::repeat(FACTOR_FILLER));

    let mut recommendations =
        non_empty(payload.recommendations).unwrap_or_else(|| heuristic_recommendations(req));
    recommendations.truncate(SLOTS);
    pad(
        &mut recommendations,
        ORACLE_RECOMMENDATION_FILLERS
            .into_iter()
            .chain(std::iter::repeat(LAST_RESORT_RECOMMENDATION)),
    );

    RiskOutcome {
        risk_percentage,
        risk_factors,
        recommendations,
    }
}

fn non_empty(items: Option<Vec<String>>) -> Option<Vec<String>> {
    items.filter(|v| !v.is_empty())
}
