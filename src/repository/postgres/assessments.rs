use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{types::Json, FromRow, PgPool};

use crate::models::{
    Assessment, AssessmentHistoryEntry, AssessmentRequest, RiskOutcome, RiskResult,
};
use crate::repository::{AssessmentRepository, RepoResult};

#[derive(Debug, FromRow)]
struct AssessmentRow {
    id: i32,
    user_id: i32,
    screen_time_hours: i32,
    exercise_hours: i32,
    late_night_frequency: i32,
    diet_quality: i32,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<AssessmentRow> for Assessment {
    fn from(row: AssessmentRow) -> Self {
        Assessment {
            id: row.id,
            user_id: row.user_id,
            screen_time_hours: row.screen_time_hours,
            exercise_hours: row.exercise_hours,
            late_night_frequency: row.late_night_frequency,
            diet_quality: row.diet_quality,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, FromRow)]
struct RiskResultRow {
    id: i32,
    user_id: i32,
    assessment_id: i32,
    risk_percentage: i32,
    risk_factors: Json<Vec<String>>,
    recommendations: Json<Vec<String>>,
    created_at: DateTime<Utc>,
}

impl From<RiskResultRow> for RiskResult {
    fn from(row: RiskResultRow) -> Self {
        RiskResult {
            id: row.id,
            user_id: row.user_id,
            assessment_id: row.assessment_id,
            risk_percentage: row.risk_percentage,
            risk_factors: row.risk_factors.0,
            recommendations: row.recommendations.0,
            created_at: row.created_at,
        }
    }
}

/// Assessment left-joined with its result; every result column is nullable.
#[derive(Debug, FromRow)]
struct HistoryRow {
    id: i32,
    user_id: i32,
    screen_time_hours: i32,
    exercise_hours: i32,
    late_night_frequency: i32,
    diet_quality: i32,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    result_id: Option<i32>,
    risk_percentage: Option<i32>,
    risk_factors: Option<Json<Vec<String>>>,
    recommendations: Option<Json<Vec<String>>>,
    result_created_at: Option<DateTime<Utc>>,
}

impl From<HistoryRow> for AssessmentHistoryEntry {
    fn from(row: HistoryRow) -> Self {
        let result = match (row.result_id, row.risk_percentage, row.result_created_at) {
            (Some(result_id), Some(risk_percentage), Some(created_at)) => Some(RiskResult {
                id: result_id,
                user_id: row.user_id,
                assessment_id: row.id,
                risk_percentage,
                risk_factors: row.risk_factors.map(|j| j.0).unwrap_or_default(),
                recommendations: row.recommendations.map(|j| j.0).unwrap_or_default(),
                created_at,
            }),
            _ => None,
        };

        AssessmentHistoryEntry {
            assessment: Assessment {
                id: row.id,
                user_id: row.user_id,
                screen_time_hours: row.screen_time_hours,
                exercise_hours: row.exercise_hours,
                late_night_frequency: row.late_night_frequency,
                diet_quality: row.diet_quality,
                created_at: row.created_at,
                updated_at: row.updated_at,
            },
            result,
        }
    }
}

const HISTORY_SELECT: &str = r#"
    SELECT a.id, a.user_id, a.screen_time_hours, a.exercise_hours,
           a.late_night_frequency, a.diet_quality, a.created_at, a.updated_at,
           r.id AS result_id, r.risk_percentage, r.risk_factors, r.recommendations,
           r.created_at AS result_created_at
    FROM user_assessments a
    LEFT JOIN risk_assessment_results r ON r.assessment_id = a.id
    WHERE a.user_id = $1
    ORDER BY a.created_at DESC, a.id DESC
"#;

#[derive(Clone)]
pub struct PgAssessmentRepository {
    db: PgPool,
}

impl PgAssessmentRepository {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl AssessmentRepository for PgAssessmentRepository {
    async fn create_with_result(
        &self,
        user_id: i32,
        request: &AssessmentRequest,
        outcome: &RiskOutcome,
    ) -> RepoResult<(Assessment, RiskResult)> {
        let mut tx = self.db.begin().await?;

        let assessment = sqlx::query_as::<_, AssessmentRow>(
            r#"
            INSERT INTO user_assessments
                (user_id, screen_time_hours, exercise_hours, late_night_frequency, diet_quality)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, user_id, screen_time_hours, exercise_hours, late_night_frequency,
                      diet_quality, created_at, updated_at
            "#,
        )
        .bind(user_id)
        .bind(request.screen_time_hours)
        .bind(request.exercise_hours)
        .bind(request.late_night_frequency)
        .bind(request.diet_quality)
        .fetch_one(&mut *tx)
        .await?;

        let result = sqlx::query_as::<_, RiskResultRow>(
            r#"
            INSERT INTO risk_assessment_results
                (user_id, assessment_id, risk_percentage, risk_factors, recommendations)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, user_id, assessment_id, risk_percentage, risk_factors,
                      recommendations, created_at
            "#,
        )
        .bind(user_id)
        .bind(assessment.id)
        .bind(outcome.risk_percentage)
        .bind(Json(&outcome.risk_factors))
        .bind(Json(&outcome.recommendations))
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok((assessment.into(), result.into()))
    }

    async fn latest(&self, user_id: i32) -> RepoResult<Option<AssessmentHistoryEntry>> {
        let sql = format!("{} LIMIT 1", HISTORY_SELECT);
        let row = sqlx::query_as::<_, HistoryRow>(&sql)
            .bind(user_id)
            .fetch_optional(&self.db)
            .await?;
        Ok(row.map(AssessmentHistoryEntry::from))
    }

    async fn history(&self, user_id: i32) -> RepoResult<Vec<AssessmentHistoryEntry>> {
        let rows = sqlx::query_as::<_, HistoryRow>(HISTORY_SELECT)
            .bind(user_id)
            .fetch_all(&self.db)
            .await?;
        Ok(rows.into_iter().map(AssessmentHistoryEntry::from).collect())
    }
}
