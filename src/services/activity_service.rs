use chrono::Utc;
use std::sync::Arc;
use tracing::{error, info, instrument, warn};

use crate::errors::ServiceError;
use crate::models::validation::validate_activity;
use crate::models::{
    ActivityKind, ActivityLog, ActivityLogRequest, ActivityRecommendation, Assessment, CoinRequest,
    NewActivityLog, UserVitals,
};
use crate::repository::{ActivityRepository, AssessmentRepository, UserRepository};
use crate::services::CoinService;

pub const ACTIVITY_TRANSACTION_TYPE: &str = "Activity";
pub const ACTIVITY_REFERENCE_TYPE: &str = "activity_logs";

pub struct ActivityService {
    activities: Arc<dyn ActivityRepository>,
    users: Arc<dyn UserRepository>,
    assessments: Arc<dyn AssessmentRepository>,
    coins: CoinService,
}

impl ActivityService {
    pub fn new(
        activities: Arc<dyn ActivityRepository>,
        users: Arc<dyn UserRepository>,
        assessments: Arc<dyn AssessmentRepository>,
        coins: CoinService,
    ) -> Self {
        Self {
            activities,
            users,
            assessments,
            coins,
        }
    }

    /// Log an activity and award coins for it. The coin award is best-effort:
    /// a ledger failure is logged and the stored activity is still returned.
    #[instrument(skip(self, request), fields(activity = %request.activity_type))]
    pub async fn log_activity(
        &self,
        user_id: i32,
        request: ActivityLogRequest,
    ) -> Result<ActivityLog, ServiceError> {
        validate_activity(&request)?;

        let kind = ActivityKind::parse(&request.activity_type);
        let calories = match request.calories_burned {
            Some(c) if c > 0 => c,
            _ => {
                let weight = self.weight_kg(user_id).await;
                calculate_calories(kind, request.duration_minutes, weight)
            }
        };
        let coins = calculate_coins(kind, request.duration_minutes);

        let log = self
            .activities
            .create(NewActivityLog::from_request(user_id, request, Some(calories), coins))
            .await?;

        if coins > 0 {
            let award = CoinRequest::new(i64::from(coins), ACTIVITY_TRANSACTION_TYPE)
                .with_reference(log.id, ACTIVITY_REFERENCE_TYPE);
            if let Err(e) = self.coins.credit(user_id, &award).await {
                error!("Failed to award {} coins for activity {}: {}", coins, log.id, e);
            }
        }

        info!(
            "Activity {} logged: {} kcal, {} coins",
            log.id, calories, log.coins_earned
        );
        Ok(log)
    }

    async fn weight_kg(&self, user_id: i32) -> f64 {
        match self.users.get_by_id(user_id).await {
            Ok(Some(user)) => user.vitals().weight_or_default(),
            Ok(None) => {
                warn!("User {} not found for calorie estimate, using default weight", user_id);
                UserVitals::DEFAULT_WEIGHT_KG
            }
            Err(e) => {
                warn!("Error loading user {} for calorie estimate: {}", user_id, e);
                UserVitals::DEFAULT_WEIGHT_KG
            }
        }
    }

    /// Activity logs, newest first
    pub async fn activities(&self, user_id: i32) -> Result<Vec<ActivityLog>, ServiceError> {
        Ok(self.activities.list_for_user(user_id).await?)
    }

    /// Stored recommendations, or fresh ones derived from the latest assessment
    pub async fn recommendations(
        &self,
        user_id: i32,
    ) -> Result<Vec<ActivityRecommendation>, ServiceError> {
        match self.activities.recommendations(user_id).await {
            Ok(existing) if !existing.is_empty() => return Ok(existing),
            Ok(_) => {}
            Err(e) => warn!("Failed to load stored recommendations: {}", e),
        }

        let latest = self
            .assessments
            .latest(user_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Assessment"))?;

        let generated = generate_recommendations(user_id, &latest.assessment);
        let mut saved = Vec::with_capacity(generated.len());
        for recommendation in generated {
            match self.activities.save_recommendation(&recommendation).await {
                Ok(stored) => saved.push(stored),
                Err(e) => {
                    warn!("Error saving recommendation {}: {}", recommendation.activity_type, e);
                    saved.push(recommendation);
                }
            }
        }
        Ok(saved)
    }
}

/// `MET * weight * hours`, rounded.
pub fn calculate_calories(kind: ActivityKind, duration_minutes: i32, weight_kg: f64) -> i32 {
    let hours = f64::from(duration_minutes) / 60.0;
    (kind.met() * weight_kg * hours).round() as i32
}

pub fn duration_bonus(duration_minutes: i32) -> f64 {
    match duration_minutes {
        d if d >= 60 => 10.0,
        d if d >= 45 => 5.0,
        d if d >= 30 => 3.0,
        _ => 0.0,
    }
}

pub fn calculate_coins(kind: ActivityKind, duration_minutes: i32) -> i32 {
    let base = kind.coins_per_minute() * f64::from(duration_minutes);
    (base + duration_bonus(duration_minutes)).round() as i32
}

/// Yoga for screen-heavy or late-night habits, Running for poor diet or
/// little exercise, then Jogging and Badminton for everyone.
pub fn generate_recommendations(user_id: i32, assessment: &Assessment) -> Vec<ActivityRecommendation> {
    let mut picks: Vec<(ActivityKind, &str)> = Vec::new();

    if assessment.screen_time_hours >= 3 || assessment.late_night_frequency >= 3 {
        picks.push((
            ActivityKind::Yoga,
            "Help reduce stress from high screen time and improve sleep quality",
        ));
    }

    if assessment.diet_quality >= 3 || assessment.exercise_hours <= 2 {
        picks.push((ActivityKind::Running, "Boost metabolism and improve cardiovascular health"));
    }

    if assessment.exercise_hours <= 1 {
        picks.push((ActivityKind::Jogging, "Great starting exercise for beginners with low impact"));
    } else {
        picks.push((ActivityKind::Jogging, "Maintain fitness with regular moderate exercise"));
    }

    picks.push((
        ActivityKind::Badminton,
        "Enjoy social exercise with friends while improving reflexes",
    ));

    let now = Utc::now();
    picks
        .into_iter()
        .zip(1..)
        .map(|((kind, reason), priority)| ActivityRecommendation {
            id: 0,
            user_id,
            activity_type: kind.to_string(),
            recommendation_reason: reason.to_string(),
            priority_order: priority,
            created_at: now,
            updated_at: now,
        })
        .collect()
}
