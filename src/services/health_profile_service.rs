use std::sync::Arc;
use tracing::info;

use crate::errors::ServiceError;
use crate::models::validation::validate_profile;
use crate::models::{HealthProfile, ProfileUpdateRequest, UserVitals};
use crate::repository::UserRepository;

pub struct HealthProfileService {
    users: Arc<dyn UserRepository>,
}

impl HealthProfileService {
    pub fn new(users: Arc<dyn UserRepository>) -> Self {
        Self { users }
    }

    pub async fn get_profile(&self, user_id: i32) -> Result<HealthProfile, ServiceError> {
        let user = self
            .users
            .get_by_id(user_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("User"))?;
        Ok(HealthProfile::from(&user))
    }

    /// Replace age, height and weight after range checks
    pub async fn update_profile(
        &self,
        user_id: i32,
        request: ProfileUpdateRequest,
    ) -> Result<HealthProfile, ServiceError> {
        validate_profile(&request)?;

        let vitals = UserVitals {
            age: Some(request.age),
            height: Some(request.height),
            weight: Some(request.weight),
        };
        let user = self.users.update_profile(user_id, vitals).await?;

        info!("Health profile updated for user {}", user_id);
        Ok(HealthProfile::from(&user))
    }
}
