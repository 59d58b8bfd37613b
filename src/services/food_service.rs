use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::Deserialize;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{info, instrument, warn};

use crate::errors::{ServiceError, ValidationError};
use crate::models::{FoodAnalysis, FoodAnalysisRequest, FoodLog, FoodLogRequest, NutritionEstimate};
use crate::oracle::{extract_json_object, InlineImage, Oracle, OracleRequest};
use crate::repository::FoodRepository;

pub const VISION_PROMPT: &str = "Analyze this food image and provide nutritional information. \
Return JSON with protein_grams, carbs_grams, fat_grams, fiber_grams, and calories. Identify the \
food items in the image and provide a healthiness score from 1-10.";

const PARSED_CONFIDENCE: f64 = 0.9;

pub struct FoodService {
    food: Arc<dyn FoodRepository>,
    oracle: Arc<dyn Oracle>,
}

impl FoodService {
    pub fn new(food: Arc<dyn FoodRepository>, oracle: Arc<dyn Oracle>) -> Self {
        Self { food, oracle }
    }

    pub async fn log_food(&self, user_id: i32, request: FoodLogRequest) -> Result<FoodLog, ServiceError> {
        let log = self
            .food
            .create_log(user_id, request.food_name, request.photo_url, request.notes)
            .await?;
        info!("Food log {} created for user {}", log.id, user_id);
        Ok(log)
    }

    /// Food logs, newest first, with their analyses
    pub async fn food_logs(&self, user_id: i32) -> Result<Vec<FoodLog>, ServiceError> {
        Ok(self.food.logs_for_user(user_id).await?)
    }

    /// Analyse a food photo. An existing analysis is returned as is; oracle
    /// failures fall back to a fixed mock estimate.
    #[instrument(skip(self, request), fields(food_log_id = request.food_log_id))]
    pub async fn analyze(
        &self,
        user_id: i32,
        request: FoodAnalysisRequest,
    ) -> Result<FoodAnalysis, ServiceError> {
        let log = self
            .food
            .get_log(request.food_log_id)
            .await?
            .filter(|log| log.user_id == user_id)
            .ok_or_else(|| ServiceError::not_found("Food log"))?;

        if let Some(existing) = self.food.get_analysis(log.id).await? {
            return Ok(existing);
        }

        let image = parse_image_data(&request.image_data)?;
        let estimate = self.estimate(image).await;

        let analysis = self.food.save_analysis(log.id, &estimate).await?;
        info!(
            "Food log {} analysed: {} kcal, confidence {}",
            log.id, analysis.calories, analysis.ai_confidence
        );
        Ok(analysis)
    }

    async fn estimate(&self, image: InlineImage) -> NutritionEstimate {
        match self.oracle.generate(OracleRequest::vision(VISION_PROMPT, image)).await {
            Ok(raw) => parse_estimate(&raw).unwrap_or_else(|| {
                warn!("Unusable vision reply, using mock analysis");
                NutritionEstimate::mock()
            }),
            Err(e) => {
                warn!("AI analysis failed, using mock data: {}", e);
                NutritionEstimate::mock()
            }
        }
    }
}

/// Validate a `data:image/<type>;base64,<payload>` URL and split it into
/// the MIME type and the payload.
pub fn parse_image_data(image_data: &str) -> Result<InlineImage, ValidationError> {
    let invalid = |message: &str| ValidationError::new("image_data", message);

    let rest = image_data
        .strip_prefix("data:")
        .ok_or_else(|| invalid("Image must be a base64 data URL"))?;
    let (header, payload) = rest
        .split_once(',')
        .ok_or_else(|| invalid("Invalid image data format"))?;
    let mime_type = header
        .strip_suffix(";base64")
        .ok_or_else(|| invalid("Image must be base64 encoded"))?;

    let mime = mime::Mime::from_str(mime_type).map_err(|_| invalid("Invalid image MIME type"))?;
    if mime.type_() != mime::IMAGE {
        return Err(invalid("Data URL is not an image"));
    }

    let payload = payload.trim();
    let bytes = STANDARD
        .decode(payload)
        .map_err(|_| invalid("Failed to decode image"))?;
    if bytes.is_empty() {
        return Err(invalid("Image is empty"));
    }

    Ok(InlineImage {
        mime_type: mime.essence_str().to_string(),
        data: payload.to_string(),
    })
}

#[derive(Debug, Deserialize)]
struct VisionPayload {
    #[serde(default)]
    protein_grams: f64,
    #[serde(default)]
    carbs_grams: f64,
    #[serde(default)]
    fat_grams: f64,
    #[serde(default)]
    fiber_grams: f64,
    #[serde(default)]
    calories: i32,
    #[serde(default)]
    detected_items: Vec<String>,
    #[serde(default)]
    healthiness_score: i32,
}

/// Strict decode of the vision reply; `None` means "use the mock".
pub fn parse_estimate(raw: &str) -> Option<NutritionEstimate> {
    let json = extract_json_object(raw)?;
    let payload: VisionPayload = serde_json::from_str(json).ok()?;

    Some(NutritionEstimate {
        protein_grams: payload.protein_grams,
        carbs_grams: payload.carbs_grams,
        fat_grams: payload.fat_grams,
        fiber_grams: payload.fiber_grams,
        calories: payload.calories,
        detected_items: payload.detected_items,
        healthiness_score: payload.healthiness_score,
        ai_confidence: PARSED_CONFIDENCE,
    })
}
