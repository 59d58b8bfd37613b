use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{types::Json, FromRow, PgPool};

use crate::models::{ChatMessage, Conversation, NewChatMessage, SenderType};
use crate::repository::{ChatbotRepository, RepoResult, RepositoryError};

#[derive(Debug, FromRow)]
struct ConversationRow {
    id: i32,
    user_id: i32,
    title: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    is_active: bool,
}

impl From<ConversationRow> for Conversation {
    fn from(row: ConversationRow) -> Self {
        Conversation {
            id: row.id,
            user_id: row.user_id,
            title: row.title,
            created_at: row.created_at,
            updated_at: row.updated_at,
            is_active: row.is_active,
            messages: Vec::new(),
        }
    }
}

#[derive(Debug, FromRow)]
struct MessageRow {
    id: i32,
    conversation_id: i32,
    user_id: i32,
    content: String,
    sender_type: String,
    created_at: DateTime<Utc>,
    metadata: Option<Json<serde_json::Value>>,
}

impl TryFrom<MessageRow> for ChatMessage {
    type Error = RepositoryError;

    fn try_from(row: MessageRow) -> Result<Self, Self::Error> {
        let sender_type = SenderType::parse(&row.sender_type).ok_or_else(|| {
            RepositoryError::Database(sqlx::Error::Decode(
                format!("unknown sender type {:?}", row.sender_type).into(),
            ))
        })?;

        Ok(ChatMessage {
            id: row.id,
            conversation_id: row.conversation_id,
            user_id: row.user_id,
            content: row.content,
            sender_type,
            created_at: row.created_at,
            metadata: row.metadata.map(|j| j.0),
        })
    }
}

const CONVERSATION_COLUMNS: &str = "id, user_id, title, created_at, updated_at, is_active";
const MESSAGE_COLUMNS: &str =
    "id, conversation_id, user_id, content, sender_type, created_at, metadata";

#[derive(Clone)]
pub struct PgChatbotRepository {
    db: PgPool,
}

impl PgChatbotRepository {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl ChatbotRepository for PgChatbotRepository {
    async fn create_conversation(&self, user_id: i32, title: &str) -> RepoResult<Conversation> {
        let sql = format!(
            "INSERT INTO chatbot_conversations (user_id, title) VALUES ($1, $2) RETURNING {}",
            CONVERSATION_COLUMNS
        );
        let row = sqlx::query_as::<_, ConversationRow>(&sql)
            .bind(user_id)
            .bind(title)
            .fetch_one(&self.db)
            .await?;
        Ok(row.into())
    }

    async fn get_conversation(&self, id: i32, user_id: i32) -> RepoResult<Option<Conversation>> {
        let sql = format!(
            "SELECT {} FROM chatbot_conversations WHERE id = $1 AND user_id = $2",
            CONVERSATION_COLUMNS
        );
        let row = sqlx::query_as::<_, ConversationRow>(&sql)
            .bind(id)
            .bind(user_id)
            .fetch_optional(&self.db)
            .await?;
        Ok(row.map(Conversation::from))
    }

    async fn conversations(&self, user_id: i32) -> RepoResult<Vec<Conversation>> {
        let sql = format!(
            "SELECT {} FROM chatbot_conversations WHERE user_id = $1 ORDER BY updated_at DESC, id DESC",
            CONVERSATION_COLUMNS
        );
        let rows = sqlx::query_as::<_, ConversationRow>(&sql)
            .bind(user_id)
            .fetch_all(&self.db)
            .await?;
        Ok(rows.into_iter().map(Conversation::from).collect())
    }

    async fn add_message(&self, message: NewChatMessage) -> RepoResult<ChatMessage> {
        // Ownership check and insert in one statement
        let sql = format!(
            r#"
            INSERT INTO chat_messages (conversation_id, user_id, content, sender_type, metadata)
            SELECT c.id, $2, $3, $4, $5
            FROM chatbot_conversations c
            WHERE c.id = $1 AND c.user_id = $2
            RETURNING {}
            "#,
            MESSAGE_COLUMNS
        );
        let row = sqlx::query_as::<_, MessageRow>(&sql)
            .bind(message.conversation_id)
            .bind(message.user_id)
            .bind(&message.content)
            .bind(message.sender_type.as_str())
            .bind(message.metadata.as_ref().map(Json))
            .fetch_optional(&self.db)
            .await?
            .ok_or_else(|| RepositoryError::not_found("Conversation"))?;
        row.try_into()
    }

    async fn messages(&self, conversation_id: i32, user_id: i32) -> RepoResult<Vec<ChatMessage>> {
        let rows = sqlx::query_as::<_, MessageRow>(
            r#"
            SELECT m.id, m.conversation_id, m.user_id, m.content, m.sender_type,
                   m.created_at, m.metadata
            FROM chat_messages m
            JOIN chatbot_conversations c ON c.id = m.conversation_id
            WHERE m.conversation_id = $1 AND c.user_id = $2
            ORDER BY m.created_at ASC, m.id ASC
            "#,
        )
        .bind(conversation_id)
        .bind(user_id)
        .fetch_all(&self.db)
        .await?;
        rows.into_iter().map(ChatMessage::try_from).collect()
    }

    async fn touch_conversation(&self, id: i32) -> RepoResult<()> {
        sqlx::query("UPDATE chatbot_conversations SET updated_at = NOW() WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await?;
        Ok(())
    }

    async fn delete_conversation(&self, id: i32, user_id: i32) -> RepoResult<()> {
        // Messages cascade with the conversation row
        let deleted = sqlx::query("DELETE FROM chatbot_conversations WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(&self.db)
            .await?;

        if deleted.rows_affected() == 0 {
            return Err(RepositoryError::not_found("Conversation"));
        }
        Ok(())
    }
}
