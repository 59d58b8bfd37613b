mod common;

use assert_matches::assert_matches;
use pretty_assertions::assert_eq;
use std::sync::Arc;

use common::{create_user, ScriptedOracle};
use sigap_health::models::{FoodAnalysisRequest, FoodLogRequest, NutritionEstimate};
use sigap_health::oracle::{DisabledOracle, Oracle, OraclePurpose};
use sigap_health::repository::MemoryStore;
use sigap_health::services::FoodService;
use sigap_health::ServiceError;

const JPEG: &str = "data:image/jpeg;base64,/9j/4AAQSkZJRgABAQAAAQABAAD/2wBDAA==";

fn service(store: &Arc<MemoryStore>, oracle: Arc<dyn Oracle>) -> FoodService {
    FoodService::new(store.clone(), oracle)
}

fn lunch() -> FoodLogRequest {
    FoodLogRequest {
        food_name: Some("Nasi goreng".to_string()),
        ..Default::default()
    }
}

#[tokio::test]
async fn vision_reply_is_parsed_and_stored() {
    let store = Arc::new(MemoryStore::new());
    let user = create_user(&store, "joko@example.com").await;
    let oracle = ScriptedOracle::replying(&[
        r#"{"protein_grams": 18, "carbs_grams": 65.5, "fat_grams": 14, "fiber_grams": 3,
            "calories": 470, "detected_items": ["fried rice", "fried egg"], "healthiness_score": 5}"#,
    ]);
    let food = service(&store, oracle.clone());
    let log = food.log_food(user.id, lunch()).await.unwrap();

    let analysis = food
        .analyze(user.id, FoodAnalysisRequest { food_log_id: log.id, image_data: JPEG.to_string() })
        .await
        .unwrap();

    assert_eq!(analysis.food_log_id, log.id);
    assert_eq!(analysis.calories, 470);
    assert_eq!(analysis.carbs_grams, 65.5);
    assert_eq!(analysis.detected_items, vec!["fried rice", "fried egg"]);
    assert_eq!(analysis.ai_confidence, 0.9);

    let requests = oracle.requests();
    assert_eq!(requests[0].purpose, OraclePurpose::Vision);
    let image = requests[0].image.as_ref().unwrap();
    assert_eq!(image.mime_type, "image/jpeg");
    assert_eq!(image.data, "/9j/4AAQSkZJRgABAQAAAQABAAD/2wBDAA==");

    let logs = food.food_logs(user.id).await.unwrap();
    assert_eq!(logs[0].analysis.as_ref().map(|a| a.id), Some(analysis.id));
}

#[tokio::test]
async fn oracle_failure_stores_mock_analysis() {
    let store = Arc::new(MemoryStore::new());
    let user = create_user(&store, "joko@example.com").await;
    let food = service(&store, Arc::new(DisabledOracle));
    let log = food.log_food(user.id, lunch()).await.unwrap();

    let analysis = food
        .analyze(user.id, FoodAnalysisRequest { food_log_id: log.id, image_data: JPEG.to_string() })
        .await
        .unwrap();

    let mock = NutritionEstimate::mock();
    assert_eq!(analysis.calories, mock.calories);
    assert_eq!(analysis.detected_items, vec!["Unknown food item"]);
    assert_eq!(analysis.ai_confidence, 0.5);
}

#[tokio::test]
async fn prose_reply_stores_mock_analysis() {
    let store = Arc::new(MemoryStore::new());
    let user = create_user(&store, "joko@example.com").await;
    let food = service(&store, ScriptedOracle::replying(&["Looks like a tasty plate of rice."]));
    let log = food.log_food(user.id, lunch()).await.unwrap();

    let analysis = food
        .analyze(user.id, FoodAnalysisRequest { food_log_id: log.id, image_data: JPEG.to_string() })
        .await
        .unwrap();

    assert_eq!(analysis.calories, 275);
}

#[tokio::test]
async fn existing_analysis_is_returned_without_calling_the_oracle() {
    let store = Arc::new(MemoryStore::new());
    let user = create_user(&store, "joko@example.com").await;
    let oracle = ScriptedOracle::new();
    let food = service(&store, oracle.clone());
    let log = food.log_food(user.id, lunch()).await.unwrap();
    let request = FoodAnalysisRequest { food_log_id: log.id, image_data: JPEG.to_string() };

    let first = food.analyze(user.id, request.clone()).await.unwrap();
    let second = food.analyze(user.id, request).await.unwrap();

    assert_eq!(first, second);
    assert_eq!(oracle.requests().len(), 1);
}

#[tokio::test]
async fn foreign_or_missing_log_is_not_found() {
    let store = Arc::new(MemoryStore::new());
    let owner = create_user(&store, "joko@example.com").await;
    let other = create_user(&store, "tini@example.com").await;
    let food = service(&store, Arc::new(DisabledOracle));
    let log = food.log_food(owner.id, lunch()).await.unwrap();

    assert_matches!(
        food.analyze(other.id, FoodAnalysisRequest { food_log_id: log.id, image_data: JPEG.to_string() })
            .await,
        Err(ServiceError::NotFound(_))
    );
    assert_matches!(
        food.analyze(owner.id, FoodAnalysisRequest { food_log_id: 999, image_data: JPEG.to_string() })
            .await,
        Err(ServiceError::NotFound(_))
    );
}

#[tokio::test]
async fn malformed_image_is_a_validation_error() {
    let store = Arc::new(MemoryStore::new());
    let user = create_user(&store, "joko@example.com").await;
    let oracle = ScriptedOracle::new();
    let food = service(&store, oracle.clone());
    let log = food.log_food(user.id, lunch()).await.unwrap();

    let result = food
        .analyze(
            user.id,
            FoodAnalysisRequest { food_log_id: log.id, image_data: "not-a-data-url".to_string() },
        )
        .await;

    assert_matches!(result, Err(ServiceError::Validation(e)) if e.field == "image_data");
    assert!(oracle.requests().is_empty());
    assert!(food.food_logs(user.id).await.unwrap()[0].analysis.is_none());
}
