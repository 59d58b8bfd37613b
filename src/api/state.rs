use axum::extract::FromRef;
use std::sync::Arc;

use crate::auth::{AuthService, JwtService};
use crate::oracle::Oracle;
use crate::repository::Repositories;
use crate::services::{
    ActivityService, AssessmentService, ChatResponder, ChatbotService, CoinService, FoodService,
    HealthProfileService, RiskScorer,
};

/// Services shared by every handler
#[derive(Clone)]
pub struct AppState {
    pub auth: AuthService,
    pub jwt: JwtService,
    pub profiles: Arc<HealthProfileService>,
    pub assessments: Arc<AssessmentService>,
    pub activities: Arc<ActivityService>,
    pub coins: CoinService,
    pub chatbot: Arc<ChatbotService>,
    pub food: Arc<FoodService>,
}

impl AppState {
    /// Wire every service onto one set of repositories and one oracle
    pub fn new(repos: Repositories, oracle: Arc<dyn Oracle>, jwt: JwtService) -> Self {
        let coins = CoinService::new(repos.coins.clone());

        Self {
            auth: AuthService::new(repos.users.clone(), jwt.clone()),
            jwt,
            profiles: Arc::new(HealthProfileService::new(repos.users.clone())),
            assessments: Arc::new(AssessmentService::new(
                repos.users.clone(),
                repos.assessments.clone(),
                RiskScorer::new(oracle.clone()),
            )),
            activities: Arc::new(ActivityService::new(
                repos.activities.clone(),
                repos.users.clone(),
                repos.assessments.clone(),
                coins.clone(),
            )),
            coins,
            chatbot: Arc::new(ChatbotService::new(
                repos.chatbot.clone(),
                repos.users.clone(),
                ChatResponder::new(oracle.clone()),
            )),
            food: Arc::new(FoodService::new(repos.food, oracle)),
        }
    }

    /// Lower the bcrypt cost, for tests.
    pub fn with_hash_cost(mut self, cost: u32) -> Self {
        self.auth = self.auth.with_hash_cost(cost);
        self
    }
}

impl FromRef<AppState> for JwtService {
    fn from_ref(state: &AppState) -> Self {
        state.jwt.clone()
    }
}
