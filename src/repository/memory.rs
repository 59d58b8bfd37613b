//! In-memory repositories. One `tokio::sync::Mutex` guards the whole store,
//! so every multi-row write is applied atomically with respect to readers.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use tokio::sync::Mutex;

use super::{
    ActivityRepository, AssessmentRepository, ChatbotRepository, CoinRepository, FoodRepository,
    RepoResult, RepositoryError, UserRepository,
};
use crate::models::{
    ActivityLog, ActivityRecommendation, Assessment, AssessmentHistoryEntry, AssessmentRequest,
    ChatMessage, CoinAccount, CoinTransaction, Conversation, FoodAnalysis, FoodLog, LedgerEntry,
    NewActivityLog, NewChatMessage, NewUser, NutritionEstimate, RiskOutcome, RiskResult, User,
    UserVitals,
};

#[derive(Default)]
struct Tables {
    next_id: i32,
    users: Vec<User>,
    assessments: Vec<Assessment>,
    results: Vec<RiskResult>,
    accounts: HashMap<i32, CoinAccount>,
    transactions: Vec<CoinTransaction>,
    activities: Vec<ActivityLog>,
    recommendations: Vec<ActivityRecommendation>,
    conversations: Vec<Conversation>,
    messages: Vec<ChatMessage>,
    food_logs: Vec<FoodLog>,
    analyses: Vec<FoodAnalysis>,
}

impl Tables {
    fn next_id(&mut self) -> i32 {
        self.next_id += 1;
        self.next_id
    }

    fn history_entry(&self, assessment: &Assessment) -> AssessmentHistoryEntry {
        AssessmentHistoryEntry {
            assessment: assessment.clone(),
            result: self
                .results
                .iter()
                .find(|r| r.assessment_id == assessment.id)
                .cloned(),
        }
    }

    fn owns_conversation(&self, id: i32, user_id: i32) -> bool {
        self.conversations
            .iter()
            .any(|c| c.id == id && c.user_id == user_id)
    }

    fn ensure_account(&mut self, user_id: i32) -> CoinAccount {
        if let Some(account) = self.accounts.get(&user_id) {
            return account.clone();
        }
        let account = CoinAccount {
            id: self.next_id(),
            user_id,
            total_coins: 0,
            updated_at: Utc::now(),
        };
        self.accounts.insert(user_id, account.clone());
        account
    }
}

#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store an assessment with no result, as left behind by an interrupted
    /// submission in older data.
    pub async fn seed_assessment(&self, user_id: i32, request: &AssessmentRequest) -> Assessment {
        let mut tables = self.tables.lock().await;
        let now = Utc::now();
        let assessment = Assessment {
            id: tables.next_id(),
            user_id,
            screen_time_hours: request.screen_time_hours,
            exercise_hours: request.exercise_hours,
            late_night_frequency: request.late_night_frequency,
            diet_quality: request.diet_quality,
            created_at: now,
            updated_at: now,
        };
        tables.assessments.push(assessment.clone());
        assessment
    }
}

fn newest_first<T>(items: &mut [T], key: impl Fn(&T) -> (chrono::DateTime<Utc>, i32)) {
    items.sort_by(|a, b| key(b).cmp(&key(a)));
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn create_user(&self, user: NewUser) -> RepoResult<User> {
        let mut tables = self.tables.lock().await;
        if tables.users.iter().any(|u| u.email == user.email) {
            return Err(RepositoryError::Conflict("User already exists".to_string()));
        }
        if let Some(google_id) = &user.google_id {
            if tables.users.iter().any(|u| u.google_id.as_ref() == Some(google_id)) {
                return Err(RepositoryError::Conflict("Google account already exists".to_string()));
            }
        }

        let now = Utc::now();
        let created = User {
            id: tables.next_id(),
            username: user.username,
            email: user.email,
            password_hash: user.password_hash,
            google_id: user.google_id,
            age: None,
            height: None,
            weight: None,
            created_at: now,
            updated_at: now,
        };
        tables.users.push(created.clone());
        Ok(created)
    }

    async fn get_by_id(&self, id: i32) -> RepoResult<Option<User>> {
        let tables = self.tables.lock().await;
        Ok(tables.users.iter().find(|u| u.id == id).cloned())
    }

    async fn get_by_email(&self, email: &str) -> RepoResult<Option<User>> {
        let tables = self.tables.lock().await;
        Ok(tables.users.iter().find(|u| u.email == email).cloned())
    }

    async fn get_by_google_id(&self, google_id: &str) -> RepoResult<Option<User>> {
        let tables = self.tables.lock().await;
        Ok(tables
            .users
            .iter()
            .find(|u| u.google_id.as_deref() == Some(google_id))
            .cloned())
    }

    async fn link_google_id(&self, user_id: i32, google_id: &str) -> RepoResult<User> {
        let mut tables = self.tables.lock().await;
        let user = tables
            .users
            .iter_mut()
            .find(|u| u.id == user_id)
            .ok_or_else(|| RepositoryError::not_found("User"))?;
        user.google_id = Some(google_id.to_string());
        user.updated_at = Utc::now();
        Ok(user.clone())
    }

    async fn update_profile(&self, user_id: i32, vitals: UserVitals) -> RepoResult<User> {
        let mut tables = self.tables.lock().await;
        let user = tables
            .users
            .iter_mut()
            .find(|u| u.id == user_id)
            .ok_or_else(|| RepositoryError::not_found("User"))?;
        user.age = vitals.age;
        user.height = vitals.height;
        user.weight = vitals.weight;
        user.updated_at = Utc::now();
        Ok(user.clone())
    }
}

#[async_trait]
impl AssessmentRepository for MemoryStore {
    async fn create_with_result(
        &self,
        user_id: i32,
        request: &AssessmentRequest,
        outcome: &RiskOutcome,
    ) -> RepoResult<(Assessment, RiskResult)> {
        let mut tables = self.tables.lock().await;
        let now = Utc::now();

        let assessment = Assessment {
            id: tables.next_id(),
            user_id,
            screen_time_hours: request.screen_time_hours,
            exercise_hours: request.exercise_hours,
            late_night_frequency: request.late_night_frequency,
            diet_quality: request.diet_quality,
            created_at: now,
            updated_at: now,
        };
        let result = RiskResult {
            id: tables.next_id(),
            user_id,
            assessment_id: assessment.id,
            risk_percentage: outcome.risk_percentage,
            risk_factors: outcome.risk_factors.clone(),
            recommendations: outcome.recommendations.clone(),
            created_at: now,
        };

        tables.assessments.push(assessment.clone());
        tables.results.push(result.clone());
        Ok((assessment, result))
    }

    async fn latest(&self, user_id: i32) -> RepoResult<Option<AssessmentHistoryEntry>> {
        let tables = self.tables.lock().await;
        Ok(tables
            .assessments
            .iter()
            .filter(|a| a.user_id == user_id)
            .max_by_key(|a| (a.created_at, a.id))
            .map(|a| tables.history_entry(a)))
    }

    async fn history(&self, user_id: i32) -> RepoResult<Vec<AssessmentHistoryEntry>> {
        let tables = self.tables.lock().await;
        let mut owned: Vec<&Assessment> = tables
            .assessments
            .iter()
            .filter(|a| a.user_id == user_id)
            .collect();
        newest_first(&mut owned, |a| (a.created_at, a.id));
        Ok(owned.into_iter().map(|a| tables.history_entry(a)).collect())
    }
}

#[async_trait]
impl CoinRepository for MemoryStore {
    async fn ensure_account(&self, user_id: i32) -> RepoResult<CoinAccount> {
        let mut tables = self.tables.lock().await;
        Ok(tables.ensure_account(user_id))
    }

    async fn get_account(&self, user_id: i32) -> RepoResult<Option<CoinAccount>> {
        let tables = self.tables.lock().await;
        Ok(tables.accounts.get(&user_id).cloned())
    }

    async fn record(&self, entry: LedgerEntry) -> RepoResult<(CoinAccount, CoinTransaction)> {
        let mut tables = self.tables.lock().await;
        let balance = tables.ensure_account(entry.user_id).total_coins;

        let new_balance = balance.checked_add(entry.amount).ok_or(RepositoryError::BalanceOverflow {
            balance,
            amount: entry.amount,
        })?;
        if new_balance < 0 {
            return Err(RepositoryError::InsufficientFunds {
                balance,
                requested: -entry.amount,
            });
        }

        let now = Utc::now();
        let transaction = CoinTransaction {
            id: tables.next_id(),
            user_id: entry.user_id,
            amount: entry.amount,
            transaction_type: entry.transaction_type,
            reference_id: entry.reference_id,
            reference_type: entry.reference_type,
            created_at: now,
        };

        let account = tables
            .accounts
            .get_mut(&entry.user_id)
            .ok_or_else(|| RepositoryError::not_found("Coin account"))?;
        account.total_coins = new_balance;
        account.updated_at = now;
        let account = account.clone();

        tables.transactions.push(transaction.clone());
        Ok((account, transaction))
    }

    async fn transactions(&self, user_id: i32) -> RepoResult<Vec<CoinTransaction>> {
        let tables = self.tables.lock().await;
        let mut owned: Vec<CoinTransaction> = tables
            .transactions
            .iter()
            .filter(|t| t.user_id == user_id)
            .cloned()
            .collect();
        newest_first(&mut owned, |t| (t.created_at, t.id));
        Ok(owned)
    }
}

#[async_trait]
impl ActivityRepository for MemoryStore {
    async fn create(&self, log: NewActivityLog) -> RepoResult<ActivityLog> {
        let mut tables = self.tables.lock().await;
        let created = ActivityLog {
            id: tables.next_id(),
            user_id: log.user_id,
            activity_type: log.activity_type,
            duration_minutes: log.duration_minutes,
            distance_km: log.distance_km,
            calories_burned: log.calories_burned,
            heart_rate_avg: log.heart_rate_avg,
            activity_date: Utc::now(),
            notes: log.notes,
            weather_condition: log.weather_condition,
            location_data: log.location_data,
            avg_pace: log.avg_pace,
            coins_earned: log.coins_earned,
            music_played: log.music_played,
        };
        tables.activities.push(created.clone());
        Ok(created)
    }

    async fn list_for_user(&self, user_id: i32) -> RepoResult<Vec<ActivityLog>> {
        let tables = self.tables.lock().await;
        let mut owned: Vec<ActivityLog> = tables
            .activities
            .iter()
            .filter(|a| a.user_id == user_id)
            .cloned()
            .collect();
        newest_first(&mut owned, |a| (a.activity_date, a.id));
        Ok(owned)
    }

    async fn recommendations(&self, user_id: i32) -> RepoResult<Vec<ActivityRecommendation>> {
        let tables = self.tables.lock().await;
        let mut owned: Vec<ActivityRecommendation> = tables
            .recommendations
            .iter()
            .filter(|r| r.user_id == user_id)
            .cloned()
            .collect();
        owned.sort_by_key(|r| (r.priority_order, r.id));
        Ok(owned)
    }

    async fn save_recommendation(
        &self,
        recommendation: &ActivityRecommendation,
    ) -> RepoResult<ActivityRecommendation> {
        let mut tables = self.tables.lock().await;
        let now = Utc::now();

        if let Some(existing) = tables.recommendations.iter_mut().find(|r| {
            r.user_id == recommendation.user_id && r.activity_type == recommendation.activity_type
        }) {
            existing.recommendation_reason = recommendation.recommendation_reason.clone();
            existing.priority_order = recommendation.priority_order;
            existing.updated_at = now;
            return Ok(existing.clone());
        }

        let saved = ActivityRecommendation {
            id: tables.next_id(),
            created_at: now,
            updated_at: now,
            ..recommendation.clone()
        };
        tables.recommendations.push(saved.clone());
        Ok(saved)
    }
}

#[async_trait]
impl ChatbotRepository for MemoryStore {
    async fn create_conversation(&self, user_id: i32, title: &str) -> RepoResult<Conversation> {
        let mut tables = self.tables.lock().await;
        let now = Utc::now();
        let conversation = Conversation {
            id: tables.next_id(),
            user_id,
            title: title.to_string(),
            created_at: now,
            updated_at: now,
            is_active: true,
            messages: Vec::new(),
        };
        tables.conversations.push(conversation.clone());
        Ok(conversation)
    }

    async fn get_conversation(&self, id: i32, user_id: i32) -> RepoResult<Option<Conversation>> {
        let tables = self.tables.lock().await;
        Ok(tables
            .conversations
            .iter()
            .find(|c| c.id == id && c.user_id == user_id)
            .cloned())
    }

    async fn conversations(&self, user_id: i32) -> RepoResult<Vec<Conversation>> {
        let tables = self.tables.lock().await;
        let mut owned: Vec<Conversation> = tables
            .conversations
            .iter()
            .filter(|c| c.user_id == user_id)
            .cloned()
            .collect();
        newest_first(&mut owned, |c| (c.updated_at, c.id));
        Ok(owned)
    }

    async fn add_message(&self, message: NewChatMessage) -> RepoResult<ChatMessage> {
        let mut tables = self.tables.lock().await;
        if !tables.owns_conversation(message.conversation_id, message.user_id) {
            return Err(RepositoryError::not_found("Conversation"));
        }

        let stored = ChatMessage {
            id: tables.next_id(),
            conversation_id: message.conversation_id,
            user_id: message.user_id,
            content: message.content,
            sender_type: message.sender_type,
            created_at: Utc::now(),
            metadata: message.metadata,
        };
        tables.messages.push(stored.clone());
        Ok(stored)
    }

    async fn messages(&self, conversation_id: i32, user_id: i32) -> RepoResult<Vec<ChatMessage>> {
        let tables = self.tables.lock().await;
        if !tables.owns_conversation(conversation_id, user_id) {
            return Ok(Vec::new());
        }
        let mut owned: Vec<ChatMessage> = tables
            .messages
            .iter()
            .filter(|m| m.conversation_id == conversation_id)
            .cloned()
            .collect();
        owned.sort_by_key(|m| (m.created_at, m.id));
        Ok(owned)
    }

    async fn touch_conversation(&self, id: i32) -> RepoResult<()> {
        let mut tables = self.tables.lock().await;
        if let Some(conversation) = tables.conversations.iter_mut().find(|c| c.id == id) {
            conversation.updated_at = Utc::now();
        }
        Ok(())
    }

    async fn delete_conversation(&self, id: i32, user_id: i32) -> RepoResult<()> {
        let mut tables = self.tables.lock().await;
        if !tables.owns_conversation(id, user_id) {
            return Err(RepositoryError::not_found("Conversation"));
        }
        tables.conversations.retain(|c| c.id != id);
        tables.messages.retain(|m| m.conversation_id != id);
        Ok(())
    }
}

#[async_trait]
impl FoodRepository for MemoryStore {
    async fn create_log(
        &self,
        user_id: i32,
        food_name: Option<String>,
        photo_url: Option<String>,
        notes: Option<String>,
    ) -> RepoResult<FoodLog> {
        let mut tables = self.tables.lock().await;
        let log = FoodLog {
            id: tables.next_id(),
            user_id,
            food_name,
            log_date: Utc::now(),
            photo_url,
            notes,
            analysis: None,
        };
        tables.food_logs.push(log.clone());
        Ok(log)
    }

    async fn get_log(&self, id: i32) -> RepoResult<Option<FoodLog>> {
        let tables = self.tables.lock().await;
        Ok(tables.food_logs.iter().find(|l| l.id == id).cloned())
    }

    async fn logs_for_user(&self, user_id: i32) -> RepoResult<Vec<FoodLog>> {
        let tables = self.tables.lock().await;
        let mut owned: Vec<FoodLog> = tables
            .food_logs
            .iter()
            .filter(|l| l.user_id == user_id)
            .map(|l| FoodLog {
                analysis: tables
                    .analyses
                    .iter()
                    .find(|a| a.food_log_id == l.id)
                    .cloned(),
                ..l.clone()
            })
            .collect();
        newest_first(&mut owned, |l| (l.log_date, l.id));
        Ok(owned)
    }

    async fn get_analysis(&self, food_log_id: i32) -> RepoResult<Option<FoodAnalysis>> {
        let tables = self.tables.lock().await;
        Ok(tables
            .analyses
            .iter()
            .find(|a| a.food_log_id == food_log_id)
            .cloned())
    }

    async fn save_analysis(
        &self,
        food_log_id: i32,
        estimate: &NutritionEstimate,
    ) -> RepoResult<FoodAnalysis> {
        let mut tables = self.tables.lock().await;
        if !tables.food_logs.iter().any(|l| l.id == food_log_id) {
            return Err(RepositoryError::not_found("Food log"));
        }

        let id = match tables.analyses.iter().position(|a| a.food_log_id == food_log_id) {
            Some(index) => tables.analyses.remove(index).id,
            None => tables.next_id(),
        };
        let analysis = FoodAnalysis {
            id,
            food_log_id,
            protein_grams: estimate.protein_grams,
            carbs_grams: estimate.carbs_grams,
            fat_grams: estimate.fat_grams,
            fiber_grams: estimate.fiber_grams,
            calories: estimate.calories,
            detected_items: estimate.detected_items.clone(),
            healthiness_score: estimate.healthiness_score,
            ai_confidence: estimate.ai_confidence,
            analyzed_at: Utc::now(),
        };
        tables.analyses.push(analysis.clone());
        Ok(analysis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CoinRequest;

    #[tokio::test]
    async fn rejected_debit_leaves_no_trace() {
        let store = MemoryStore::new();
        store
            .record(LedgerEntry::credit(1, &CoinRequest::new(10, "Reward")))
            .await
            .unwrap();

        let err = store
            .record(LedgerEntry::debit(1, &CoinRequest::new(11, "Purchase")))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            RepositoryError::InsufficientFunds { balance: 10, requested: 11 }
        ));
        assert_eq!(store.get_account(1).await.unwrap().unwrap().total_coins, 10);
        assert_eq!(store.transactions(1).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn messages_hidden_from_other_users() {
        let store = MemoryStore::new();
        let conversation = store.create_conversation(1, "Mine").await.unwrap();

        let err = store
            .add_message(NewChatMessage {
                conversation_id: conversation.id,
                user_id: 2,
                content: "hi".to_string(),
                sender_type: crate::models::SenderType::User,
                metadata: None,
            })
            .await
            .unwrap_err();

        assert!(matches!(err, RepositoryError::NotFound(_)));
        assert!(store.messages(conversation.id, 2).await.unwrap().is_empty());
    }
}
