#![allow(dead_code)]

use async_trait::async_trait;
use mockall::mock;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use sigap_health::models::{
    AssessmentRequest, CoinAccount, CoinTransaction, LedgerEntry, NewUser, User, UserVitals,
};
use sigap_health::oracle::{Oracle, OracleError, OracleRequest};
use sigap_health::repository::{
    CoinRepository, MemoryStore, RepoResult, RepositoryError, UserRepository,
};

/// Oracle that replays queued replies in order and records every request.
/// Once the queue is empty every call fails as if the oracle were down.
#[derive(Default)]
pub struct ScriptedOracle {
    replies: Mutex<VecDeque<Result<String, OracleError>>>,
    requests: Mutex<Vec<OracleRequest>>,
}

impl ScriptedOracle {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn replying(replies: &[&str]) -> Arc<Self> {
        let oracle = Self::default();
        oracle
            .replies
            .lock()
            .unwrap()
            .extend(replies.iter().map(|r| Ok(r.to_string())));
        Arc::new(oracle)
    }

    pub fn push_error(&self, error: OracleError) {
        self.replies.lock().unwrap().push_back(Err(error));
    }

    pub fn requests(&self) -> Vec<OracleRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl Oracle for ScriptedOracle {
    async fn generate(&self, request: OracleRequest) -> Result<String, OracleError> {
        self.requests.lock().unwrap().push(request);
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(OracleError::Unavailable("script exhausted".to_string())))
    }
}

mock! {
    pub Ledger {}

    #[async_trait]
    impl CoinRepository for Ledger {
        async fn ensure_account(&self, user_id: i32) -> RepoResult<CoinAccount>;
        async fn get_account(&self, user_id: i32) -> RepoResult<Option<CoinAccount>>;
        async fn record(&self, entry: LedgerEntry) -> RepoResult<(CoinAccount, CoinTransaction)>;
        async fn transactions(&self, user_id: i32) -> RepoResult<Vec<CoinTransaction>>;
    }
}

/// Ledger whose writes fail like a lost database connection, and which
/// expects exactly `attempts` of them.
pub fn failing_ledger(attempts: usize) -> MockLedger {
    let mut ledger = MockLedger::new();
    ledger
        .expect_record()
        .times(attempts)
        .returning(|_| Err(RepositoryError::Database(sqlx::Error::PoolTimedOut)));
    ledger
}

pub async fn create_user(store: &MemoryStore, email: &str) -> User {
    store
        .create_user(NewUser {
            username: email.split('@').next().unwrap().to_string(),
            email: email.to_string(),
            password_hash: None,
            google_id: None,
        })
        .await
        .unwrap()
}

pub async fn create_user_with_vitals(store: &MemoryStore, email: &str, vitals: UserVitals) -> User {
    let user = create_user(store, email).await;
    store.update_profile(user.id, vitals).await.unwrap()
}

pub fn answers(screen: i32, exercise: i32, late_night: i32, diet: i32) -> AssessmentRequest {
    AssessmentRequest {
        screen_time_hours: screen,
        exercise_hours: exercise,
        late_night_frequency: late_night,
        diet_quality: diet,
    }
}
