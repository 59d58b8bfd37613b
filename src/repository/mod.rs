//! Persistence seams. Every entity gets an async trait with a Postgres
//! implementation for production and an in-memory one for local runs and
//! tests. Multi-row writes (ledger entries, assessment plus result) are one
//! atomic unit in both implementations.

pub mod errors;
pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use sqlx::PgPool;
use std::sync::Arc;

use crate::models::{
    ActivityLog, ActivityRecommendation, Assessment, AssessmentHistoryEntry, AssessmentRequest,
    ChatMessage, CoinAccount, CoinTransaction, Conversation, FoodAnalysis, FoodLog,
    LedgerEntry, NewActivityLog, NewChatMessage, NewUser, NutritionEstimate, RiskOutcome,
    RiskResult, User, UserVitals,
};

pub use errors::{RepoResult, RepositoryError};
pub use memory::MemoryStore;

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn create_user(&self, user: NewUser) -> RepoResult<User>;
    async fn get_by_id(&self, id: i32) -> RepoResult<Option<User>>;
    async fn get_by_email(&self, email: &str) -> RepoResult<Option<User>>;
    async fn get_by_google_id(&self, google_id: &str) -> RepoResult<Option<User>>;
    async fn link_google_id(&self, user_id: i32, google_id: &str) -> RepoResult<User>;
    /// Fails with `NotFound` when the user does not exist.
    async fn update_profile(&self, user_id: i32, vitals: UserVitals) -> RepoResult<User>;
}

#[async_trait]
pub trait AssessmentRepository: Send + Sync {
    /// Store the assessment, then its result referencing the generated id,
    /// in one transaction.
    async fn create_with_result(
        &self,
        user_id: i32,
        request: &AssessmentRequest,
        outcome: &RiskOutcome,
    ) -> RepoResult<(Assessment, RiskResult)>;
    async fn latest(&self, user_id: i32) -> RepoResult<Option<AssessmentHistoryEntry>>;
    /// Newest assessment first, each left-joined with its result.
    async fn history(&self, user_id: i32) -> RepoResult<Vec<AssessmentHistoryEntry>>;
}

#[async_trait]
pub trait CoinRepository: Send + Sync {
    /// Create a zero-balance account if none exists. Idempotent.
    async fn ensure_account(&self, user_id: i32) -> RepoResult<CoinAccount>;
    async fn get_account(&self, user_id: i32) -> RepoResult<Option<CoinAccount>>;
    /// Apply `entry.amount` to the balance and append the transaction row as
    /// one atomic unit. A negative amount that would take the balance below
    /// zero fails with `InsufficientFunds` and changes nothing.
    async fn record(&self, entry: LedgerEntry) -> RepoResult<(CoinAccount, CoinTransaction)>;
    /// Newest first.
    async fn transactions(&self, user_id: i32) -> RepoResult<Vec<CoinTransaction>>;
}

#[async_trait]
pub trait ActivityRepository: Send + Sync {
    async fn create(&self, log: NewActivityLog) -> RepoResult<ActivityLog>;
    /// Newest activity date first.
    async fn list_for_user(&self, user_id: i32) -> RepoResult<Vec<ActivityLog>>;
    /// Ordered by priority.
    async fn recommendations(&self, user_id: i32) -> RepoResult<Vec<ActivityRecommendation>>;
    /// Upsert keyed on (user, activity type).
    async fn save_recommendation(
        &self,
        recommendation: &ActivityRecommendation,
    ) -> RepoResult<ActivityRecommendation>;
}

#[async_trait]
pub trait ChatbotRepository: Send + Sync {
    async fn create_conversation(&self, user_id: i32, title: &str) -> RepoResult<Conversation>;
    /// Returns the conversation without messages, or `None` when it is
    /// missing or owned by someone else.
    async fn get_conversation(&self, id: i32, user_id: i32) -> RepoResult<Option<Conversation>>;
    /// Most recently updated first.
    async fn conversations(&self, user_id: i32) -> RepoResult<Vec<Conversation>>;
    /// Fails with `NotFound` when the conversation is not the caller's.
    async fn add_message(&self, message: NewChatMessage) -> RepoResult<ChatMessage>;
    /// Oldest first.
    async fn messages(&self, conversation_id: i32, user_id: i32) -> RepoResult<Vec<ChatMessage>>;
    async fn touch_conversation(&self, id: i32) -> RepoResult<()>;
    /// Removes the conversation and its messages. `NotFound` when not owned.
    async fn delete_conversation(&self, id: i32, user_id: i32) -> RepoResult<()>;
}

#[async_trait]
pub trait FoodRepository: Send + Sync {
    async fn create_log(
        &self,
        user_id: i32,
        food_name: Option<String>,
        photo_url: Option<String>,
        notes: Option<String>,
    ) -> RepoResult<FoodLog>;
    async fn get_log(&self, id: i32) -> RepoResult<Option<FoodLog>>;
    /// Newest first, each with its analysis when one exists.
    async fn logs_for_user(&self, user_id: i32) -> RepoResult<Vec<FoodLog>>;
    async fn get_analysis(&self, food_log_id: i32) -> RepoResult<Option<FoodAnalysis>>;
    async fn save_analysis(
        &self,
        food_log_id: i32,
        estimate: &NutritionEstimate,
    ) -> RepoResult<FoodAnalysis>;
}

/// Every repository the services need, behind trait objects.
#[derive(Clone)]
pub struct Repositories {
    pub users: Arc<dyn UserRepository>,
    pub assessments: Arc<dyn AssessmentRepository>,
    pub coins: Arc<dyn CoinRepository>,
    pub activities: Arc<dyn ActivityRepository>,
    pub chatbot: Arc<dyn ChatbotRepository>,
    pub food: Arc<dyn FoodRepository>,
}

impl Repositories {
    pub fn postgres(pool: PgPool) -> Self {
        Self {
            users: Arc::new(postgres::PgUserRepository::new(pool.clone())),
            assessments: Arc::new(postgres::PgAssessmentRepository::new(pool.clone())),
            coins: Arc::new(postgres::PgCoinRepository::new(pool.clone())),
            activities: Arc::new(postgres::PgActivityRepository::new(pool.clone())),
            chatbot: Arc::new(postgres::PgChatbotRepository::new(pool.clone())),
            food: Arc::new(postgres::PgFoodRepository::new(pool)),
        }
    }

    pub fn in_memory() -> Self {
        Self::from_store(Arc::new(MemoryStore::new()))
    }

    /// Share one store across every repository so tests can inspect it.
    pub fn from_store(store: Arc<MemoryStore>) -> Self {
        Self {
            users: store.clone(),
            assessments: store.clone(),
            coins: store.clone(),
            activities: store.clone(),
            chatbot: store.clone(),
            food: store,
        }
    }
}
