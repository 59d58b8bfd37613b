mod common;

use assert_matches::assert_matches;
use pretty_assertions::assert_eq;
use std::sync::Arc;

use common::{answers, create_user, create_user_with_vitals, ScriptedOracle};
use sigap_health::models::UserVitals;
use sigap_health::oracle::{DisabledOracle, Oracle, OracleError};
use sigap_health::repository::MemoryStore;
use sigap_health::services::{AssessmentService, RiskScorer};
use sigap_health::ServiceError;

fn service(store: &Arc<MemoryStore>, oracle: Arc<dyn Oracle>) -> AssessmentService {
    AssessmentService::new(store.clone(), store.clone(), RiskScorer::new(oracle))
}

fn vitals(age: i32) -> UserVitals {
    UserVitals {
        age: Some(age),
        height: Some(168.0),
        weight: Some(72.5),
    }
}

#[tokio::test]
async fn disabled_oracle_falls_back_to_heuristic() {
    let store = Arc::new(MemoryStore::new());
    let user = create_user_with_vitals(&store, "ani@example.com", vitals(50)).await;
    let assessments = service(&store, Arc::new(DisabledOracle));

    let response = assessments.submit(user.id, answers(4, 1, 4, 4)).await.unwrap();

    // 30 + 10 (age) + 15 + 0 + 15 + 15
    assert_eq!(response.result.risk_percentage, 85);
    assert_eq!(
        response.result.risk_factors,
        vec![
            "Excessive screen time",
            "Insufficient physical activity",
            "Irregular sleep patterns"
        ]
    );
    assert_eq!(response.result.recommendations.len(), 3);
    assert_eq!(response.result.assessment_id, response.assessment.id);
}

#[tokio::test]
async fn oracle_answer_is_used_and_repaired() {
    let store = Arc::new(MemoryStore::new());
    let user = create_user_with_vitals(&store, "ani@example.com", vitals(35)).await;
    let oracle = ScriptedOracle::replying(&[
        "```json\n{\"risk_percentage\": 42, \"risk_factors\": [\"Sedentary work\"], \
         \"recommendations\": [\"Walk\", \"Sleep\", \"Hydrate\", \"Stretch\"]}\n```",
    ]);
    let assessments = service(&store, oracle.clone());

    let response = assessments.submit(user.id, answers(2, 2, 2, 2)).await.unwrap();

    assert_eq!(response.result.risk_percentage, 42);
    assert_eq!(
        response.result.risk_factors,
        vec!["Sedentary work", "Other lifestyle factors", "Other lifestyle factors"]
    );
    assert_eq!(response.result.recommendations, vec!["Walk", "Sleep", "Hydrate"]);
    assert_eq!(oracle.requests().len(), 1);
}

#[tokio::test]
async fn out_of_range_percentage_uses_heuristic_score_only() {
    let store = Arc::new(MemoryStore::new());
    let user = create_user_with_vitals(&store, "ani@example.com", vitals(65)).await;
    let oracle = ScriptedOracle::replying(&[
        r#"{"risk_percentage": 150, "risk_factors": ["a", "b", "c"], "recommendations": ["x", "y", "z"]}"#,
    ]);
    let assessments = service(&store, oracle);

    let response = assessments.submit(user.id, answers(1, 4, 1, 1)).await.unwrap();

    // 30 + 20 (age) - 15
    assert_eq!(response.result.risk_percentage, 35);
    assert_eq!(response.result.risk_factors, vec!["a", "b", "c"]);
    assert_eq!(response.result.recommendations, vec!["x", "y", "z"]);
}

#[tokio::test]
async fn missing_percentage_means_full_heuristic() {
    let store = Arc::new(MemoryStore::new());
    let user = create_user(&store, "ani@example.com").await;
    let oracle = ScriptedOracle::replying(&[r#"{"risk_factors": ["a"]}"#]);
    let assessments = service(&store, oracle);

    let response = assessments.submit(user.id, answers(1, 4, 1, 1)).await.unwrap();

    // unset age gives no bonus: 30 - 15
    assert_eq!(response.result.risk_percentage, 15);
    assert_eq!(
        response.result.risk_factors,
        vec!["Lifestyle factors", "Other lifestyle factors", "Other lifestyle factors"]
    );
}

#[tokio::test]
async fn oracle_timeout_falls_back() {
    let store = Arc::new(MemoryStore::new());
    let user = create_user_with_vitals(&store, "ani@example.com", vitals(30)).await;
    let oracle = ScriptedOracle::new();
    oracle.push_error(OracleError::Timeout(std::time::Duration::from_secs(10)));
    let assessments = service(&store, oracle);

    let response = assessments.submit(user.id, answers(3, 3, 3, 3)).await.unwrap();

    // 30 + 10 - 10 + 10 + 10
    assert_eq!(response.result.risk_percentage, 50);
}

#[tokio::test]
async fn prompt_describes_unset_vitals_with_defaults() {
    let store = Arc::new(MemoryStore::new());
    let user = create_user(&store, "ani@example.com").await;
    let oracle = ScriptedOracle::new();
    let assessments = service(&store, oracle.clone());

    assessments.submit(user.id, answers(1, 1, 1, 1)).await.unwrap();

    let requests = oracle.requests();
    assert_eq!(requests.len(), 1);
    assert!(requests[0].turns[0]
        .text
        .contains("Age: 30, Height: 170.00 cm, Weight: 70.00 kg"));
}

#[tokio::test]
async fn invalid_answers_are_rejected_before_any_side_effect() {
    let store = Arc::new(MemoryStore::new());
    let user = create_user(&store, "ani@example.com").await;
    let oracle = ScriptedOracle::new();
    let assessments = service(&store, oracle.clone());

    let result = assessments.submit(user.id, answers(1, 5, 1, 1)).await;

    assert_matches!(result, Err(ServiceError::Validation(e)) if e.field == "exercise_hours");
    assert!(oracle.requests().is_empty());
    assert!(assessments.history(user.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn unknown_user_is_not_found() {
    let store = Arc::new(MemoryStore::new());
    let assessments = service(&store, Arc::new(DisabledOracle));

    assert_matches!(
        assessments.submit(404, answers(1, 1, 1, 1)).await,
        Err(ServiceError::NotFound(_))
    );
}

#[tokio::test]
async fn latest_and_history() {
    let store = Arc::new(MemoryStore::new());
    let user = create_user(&store, "ani@example.com").await;
    let assessments = service(&store, Arc::new(DisabledOracle));

    assert_matches!(assessments.latest(user.id).await, Err(ServiceError::NotFound(_)));

    let orphan = store.seed_assessment(user.id, &answers(2, 2, 2, 2)).await;
    let scored = assessments.submit(user.id, answers(3, 1, 3, 3)).await.unwrap();

    let latest = assessments.latest(user.id).await.unwrap();
    assert_eq!(latest.assessment.id, scored.assessment.id);
    assert_eq!(latest.result.map(|r| r.id), Some(scored.result.id));

    let history = assessments.history(user.id).await.unwrap();
    let ids: Vec<i32> = history.iter().map(|e| e.assessment.id).collect();
    assert_eq!(ids, vec![scored.assessment.id, orphan.id]);
    assert!(history[1].result.is_none());
}
