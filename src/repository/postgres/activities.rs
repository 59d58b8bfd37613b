use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{types::Json, FromRow, PgPool};

use crate::models::{ActivityLog, ActivityRecommendation, NewActivityLog};
use crate::repository::{ActivityRepository, RepoResult};

const ACTIVITY_COLUMNS: &str = "id, user_id, activity_type, duration_minutes, distance_km, \
     calories_burned, heart_rate_avg, activity_date, notes, weather_condition, location_data, \
     avg_pace, coins_earned, music_played";

#[derive(Debug, FromRow)]
struct ActivityLogRow {
    id: i32,
    user_id: i32,
    activity_type: String,
    duration_minutes: i32,
    distance_km: Option<f64>,
    calories_burned: Option<i32>,
    heart_rate_avg: Option<i32>,
    activity_date: DateTime<Utc>,
    notes: Option<String>,
    weather_condition: Option<String>,
    location_data: Option<Json<serde_json::Value>>,
    avg_pace: Option<f64>,
    coins_earned: i32,
    music_played: Option<String>,
}

impl From<ActivityLogRow> for ActivityLog {
    fn from(row: ActivityLogRow) -> Self {
        ActivityLog {
            id: row.id,
            user_id: row.user_id,
            activity_type: row.activity_type,
            duration_minutes: row.duration_minutes,
            distance_km: row.distance_km,
            calories_burned: row.calories_burned,
            heart_rate_avg: row.heart_rate_avg,
            activity_date: row.activity_date,
            notes: row.notes,
            weather_condition: row.weather_condition,
            location_data: row.location_data.map(|j| j.0),
            avg_pace: row.avg_pace,
            coins_earned: row.coins_earned,
            music_played: row.music_played,
        }
    }
}

#[derive(Debug, FromRow)]
struct RecommendationRow {
    id: i32,
    user_id: i32,
    activity_type: String,
    recommendation_reason: String,
    priority_order: i32,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<RecommendationRow> for ActivityRecommendation {
    fn from(row: RecommendationRow) -> Self {
        ActivityRecommendation {
            id: row.id,
            user_id: row.user_id,
            activity_type: row.activity_type,
            recommendation_reason: row.recommendation_reason,
            priority_order: row.priority_order,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Clone)]
pub struct PgActivityRepository {
    db: PgPool,
}

impl PgActivityRepository {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl ActivityRepository for PgActivityRepository {
    async fn create(&self, log: NewActivityLog) -> RepoResult<ActivityLog> {
        let sql = format!(
            r#"
            INSERT INTO activity_logs
                (user_id, activity_type, duration_minutes, distance_km, calories_burned,
                 heart_rate_avg, notes, weather_condition, location_data, avg_pace,
                 coins_earned, music_played)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            RETURNING {}
            "#,
            ACTIVITY_COLUMNS
        );

        let row = sqlx::query_as::<_, ActivityLogRow>(&sql)
            .bind(log.user_id)
            .bind(&log.activity_type)
            .bind(log.duration_minutes)
            .bind(log.distance_km)
            .bind(log.calories_burned)
            .bind(log.heart_rate_avg)
            .bind(&log.notes)
            .bind(&log.weather_condition)
            .bind(log.location_data.as_ref().map(Json))
            .bind(log.avg_pace)
            .bind(log.coins_earned)
            .bind(&log.music_played)
            .fetch_one(&self.db)
            .await?;

        Ok(row.into())
    }

    async fn list_for_user(&self, user_id: i32) -> RepoResult<Vec<ActivityLog>> {
        let sql = format!(
            "SELECT {} FROM activity_logs WHERE user_id = $1 ORDER BY activity_date DESC, id DESC",
            ACTIVITY_COLUMNS
        );
        let rows = sqlx::query_as::<_, ActivityLogRow>(&sql)
            .bind(user_id)
            .fetch_all(&self.db)
            .await?;
        Ok(rows.into_iter().map(ActivityLog::from).collect())
    }

    async fn recommendations(&self, user_id: i32) -> RepoResult<Vec<ActivityRecommendation>> {
        let rows = sqlx::query_as::<_, RecommendationRow>(
            r#"
            SELECT id, user_id, activity_type, recommendation_reason, priority_order,
                   created_at, updated_at
            FROM activity_recommendations
            WHERE user_id = $1
            ORDER BY priority_order ASC, id ASC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.db)
        .await?;
        Ok(rows.into_iter().map(ActivityRecommendation::from).collect())
    }

    async fn save_recommendation(
        &self,
        recommendation: &ActivityRecommendation,
    ) -> RepoResult<ActivityRecommendation> {
        let row = sqlx::query_as::<_, RecommendationRow>(
            r#"
            INSERT INTO activity_recommendations
                (user_id, activity_type, recommendation_reason, priority_order)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (user_id, activity_type) DO UPDATE SET
                recommendation_reason = EXCLUDED.recommendation_reason,
                priority_order = EXCLUDED.priority_order,
                updated_at = NOW()
            RETURNING id, user_id, activity_type, recommendation_reason, priority_order,
                      created_at, updated_at
            "#,
        )
        .bind(recommendation.user_id)
        .bind(&recommendation.activity_type)
        .bind(&recommendation.recommendation_reason)
        .bind(recommendation.priority_order)
        .fetch_one(&self.db)
        .await?;
        Ok(row.into())
    }
}
