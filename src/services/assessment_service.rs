use std::sync::Arc;
use tracing::{info, instrument};

use crate::errors::ServiceError;
use crate::models::validation::validate_assessment;
use crate::models::{AssessmentHistoryEntry, AssessmentRequest, AssessmentResponse};
use crate::repository::{AssessmentRepository, UserRepository};
use crate::services::RiskScorer;

pub struct AssessmentService {
    users: Arc<dyn UserRepository>,
    assessments: Arc<dyn AssessmentRepository>,
    scorer: RiskScorer,
}

impl AssessmentService {
    pub fn new(
        users: Arc<dyn UserRepository>,
        assessments: Arc<dyn AssessmentRepository>,
        scorer: RiskScorer,
    ) -> Self {
        Self {
            users,
            assessments,
            scorer,
        }
    }

    /// Score a questionnaire and store it together with its result
    #[instrument(skip(self, request))]
    pub async fn submit(
        &self,
        user_id: i32,
        request: AssessmentRequest,
    ) -> Result<AssessmentResponse, ServiceError> {
        validate_assessment(&request)?;

        let user = self
            .users
            .get_by_id(user_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("User"))?;

        let outcome = self.scorer.assess(&user.vitals(), &request).await;

        let (assessment, result) = self
            .assessments
            .create_with_result(user_id, &request, &outcome)
            .await?;

        info!(
            "Assessment {} stored with risk {}%",
            assessment.id, result.risk_percentage
        );
        Ok(AssessmentResponse { assessment, result })
    }

    /// Most recent assessment and its result
    pub async fn latest(&self, user_id: i32) -> Result<AssessmentHistoryEntry, ServiceError> {
        self.assessments
            .latest(user_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Assessment"))
    }

    /// All assessments, newest first, including any without a result
    pub async fn history(&self, user_id: i32) -> Result<Vec<AssessmentHistoryEntry>, ServiceError> {
        Ok(self.assessments.history(user_id).await?)
    }
}
