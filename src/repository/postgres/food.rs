use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{types::Json, FromRow, PgPool};

use crate::models::{FoodAnalysis, FoodLog, NutritionEstimate};
use crate::repository::{FoodRepository, RepoResult};

#[derive(Debug, FromRow)]
struct FoodLogRow {
    id: i32,
    user_id: i32,
    food_name: Option<String>,
    log_date: DateTime<Utc>,
    photo_url: Option<String>,
    notes: Option<String>,
}

impl From<FoodLogRow> for FoodLog {
    fn from(row: FoodLogRow) -> Self {
        FoodLog {
            id: row.id,
            user_id: row.user_id,
            food_name: row.food_name,
            log_date: row.log_date,
            photo_url: row.photo_url,
            notes: row.notes,
            analysis: None,
        }
    }
}

#[derive(Debug, FromRow)]
struct FoodAnalysisRow {
    id: i32,
    food_log_id: i32,
    protein_grams: f64,
    carbs_grams: f64,
    fat_grams: f64,
    fiber_grams: f64,
    calories: i32,
    detected_items: Json<Vec<String>>,
    healthiness_score: i32,
    ai_confidence: f64,
    analyzed_at: DateTime<Utc>,
}

impl From<FoodAnalysisRow> for FoodAnalysis {
    fn from(row: FoodAnalysisRow) -> Self {
        FoodAnalysis {
            id: row.id,
            food_log_id: row.food_log_id,
            protein_grams: row.protein_grams,
            carbs_grams: row.carbs_grams,
            fat_grams: row.fat_grams,
            fiber_grams: row.fiber_grams,
            calories: row.calories,
            detected_items: row.detected_items.0,
            healthiness_score: row.healthiness_score,
            ai_confidence: row.ai_confidence,
            analyzed_at: row.analyzed_at,
        }
    }
}

/// Food log left-joined with its analysis.
#[derive(Debug, FromRow)]
struct FoodLogWithAnalysisRow {
    #[sqlx(flatten)]
    log: FoodLogRow,
    analysis_id: Option<i32>,
    protein_grams: Option<f64>,
    carbs_grams: Option<f64>,
    fat_grams: Option<f64>,
    fiber_grams: Option<f64>,
    calories: Option<i32>,
    detected_items: Option<Json<Vec<String>>>,
    healthiness_score: Option<i32>,
    ai_confidence: Option<f64>,
    analyzed_at: Option<DateTime<Utc>>,
}

impl From<FoodLogWithAnalysisRow> for FoodLog {
    fn from(row: FoodLogWithAnalysisRow) -> Self {
        let analysis = match (row.analysis_id, row.analyzed_at) {
            (Some(id), Some(analyzed_at)) => Some(FoodAnalysis {
                id,
                food_log_id: row.log.id,
                protein_grams: row.protein_grams.unwrap_or_default(),
                carbs_grams: row.carbs_grams.unwrap_or_default(),
                fat_grams: row.fat_grams.unwrap_or_default(),
                fiber_grams: row.fiber_grams.unwrap_or_default(),
                calories: row.calories.unwrap_or_default(),
                detected_items: row.detected_items.map(|j| j.0).unwrap_or_default(),
                healthiness_score: row.healthiness_score.unwrap_or_default(),
                ai_confidence: row.ai_confidence.unwrap_or_default(),
                analyzed_at,
            }),
            _ => None,
        };

        let mut log = FoodLog::from(row.log);
        log.analysis = analysis;
        log
    }
}

const ANALYSIS_COLUMNS: &str = "id, food_log_id, protein_grams, carbs_grams, fat_grams, \
     fiber_grams, calories, detected_items, healthiness_score, ai_confidence, analyzed_at";

#[derive(Clone)]
pub struct PgFoodRepository {
    db: PgPool,
}

impl PgFoodRepository {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl FoodRepository for PgFoodRepository {
    async fn create_log(
        &self,
        user_id: i32,
        food_name: Option<String>,
        photo_url: Option<String>,
        notes: Option<String>,
    ) -> RepoResult<FoodLog> {
        let row = sqlx::query_as::<_, FoodLogRow>(
            r#"
            INSERT INTO food_logs (user_id, food_name, photo_url, notes)
            VALUES ($1, $2, $3, $4)
            RETURNING id, user_id, food_name, log_date, photo_url, notes
            "#,
        )
        .bind(user_id)
        .bind(food_name)
        .bind(photo_url)
        .bind(notes)
        .fetch_one(&self.db)
        .await?;
        Ok(row.into())
    }

    async fn get_log(&self, id: i32) -> RepoResult<Option<FoodLog>> {
        let row = sqlx::query_as::<_, FoodLogRow>(
            "SELECT id, user_id, food_name, log_date, photo_url, notes FROM food_logs WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await?;
        Ok(row.map(FoodLog::from))
    }

    async fn logs_for_user(&self, user_id: i32) -> RepoResult<Vec<FoodLog>> {
        let rows = sqlx::query_as::<_, FoodLogWithAnalysisRow>(
            r#"
            SELECT f.id, f.user_id, f.food_name, f.log_date, f.photo_url, f.notes,
                   a.id AS analysis_id, a.protein_grams, a.carbs_grams, a.fat_grams,
                   a.fiber_grams, a.calories, a.detected_items, a.healthiness_score,
                   a.ai_confidence, a.analyzed_at
            FROM food_logs f
            LEFT JOIN food_analysis a ON a.food_log_id = f.id
            WHERE f.user_id = $1
            ORDER BY f.log_date DESC, f.id DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.db)
        .await?;
        Ok(rows.into_iter().map(FoodLog::from).collect())
    }

    async fn get_analysis(&self, food_log_id: i32) -> RepoResult<Option<FoodAnalysis>> {
        let sql = format!("SELECT {} FROM food_analysis WHERE food_log_id = $1", ANALYSIS_COLUMNS);
        let row = sqlx::query_as::<_, FoodAnalysisRow>(&sql)
            .bind(food_log_id)
            .fetch_optional(&self.db)
            .await?;
        Ok(row.map(FoodAnalysis::from))
    }

    async fn save_analysis(
        &self,
        food_log_id: i32,
        estimate: &NutritionEstimate,
    ) -> RepoResult<FoodAnalysis> {
        let sql = format!(
            r#"
            INSERT INTO food_analysis
                (food_log_id, protein_grams, carbs_grams, fat_grams, fiber_grams, calories,
                 detected_items, healthiness_score, ai_confidence)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            ON CONFLICT (food_log_id) DO UPDATE SET
                protein_grams = EXCLUDED.protein_grams,
                carbs_grams = EXCLUDED.carbs_grams,
                fat_grams = EXCLUDED.fat_grams,
                fiber_grams = EXCLUDED.fiber_grams,
                calories = EXCLUDED.calories,
                detected_items = EXCLUDED.detected_items,
                healthiness_score = EXCLUDED.healthiness_score,
                ai_confidence = EXCLUDED.ai_confidence,
                analyzed_at = NOW()
            RETURNING {}
            "#,
            ANALYSIS_COLUMNS
        );
        let row = sqlx::query_as::<_, FoodAnalysisRow>(&sql)
            .bind(food_log_id)
            .bind(estimate.protein_grams)
            .bind(estimate.carbs_grams)
            .bind(estimate.fat_grams)
            .bind(estimate.fiber_grams)
            .bind(estimate.calories)
            .bind(Json(&estimate.detected_items))
            .bind(estimate.healthiness_score)
            .bind(estimate.ai_confidence)
            .fetch_one(&self.db)
            .await?;
        Ok(row.into())
    }
}
