use chrono::Utc;
use serde_json::json;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, instrument, warn};

use crate::errors::{ServiceError, ValidationError};
use crate::models::{ChatExchange, ChatMessage, Conversation, NewChatMessage, SenderType};
use crate::repository::{ChatbotRepository, UserRepository};
use crate::services::ChatResponder;

pub const GREETING: &str = "Hello! I'm the AI Health Assistant for the SIGAP app. I can help you \
with questions about health, physical activity, and lifestyle. How can I assist you today?";

pub struct ChatbotService {
    chatbot: Arc<dyn ChatbotRepository>,
    users: Arc<dyn UserRepository>,
    responder: ChatResponder,
}

impl ChatbotService {
    pub fn new(
        chatbot: Arc<dyn ChatbotRepository>,
        users: Arc<dyn UserRepository>,
        responder: ChatResponder,
    ) -> Self {
        Self {
            chatbot,
            users,
            responder,
        }
    }

    /// Start a conversation, titled by date when no title is given, and
    /// greet the user
    pub async fn create_conversation(
        &self,
        user_id: i32,
        title: Option<String>,
    ) -> Result<Conversation, ServiceError> {
        let title = title
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .unwrap_or_else(default_title);

        let conversation = self.chatbot.create_conversation(user_id, &title).await?;

        let greeting = NewChatMessage {
            conversation_id: conversation.id,
            user_id,
            content: GREETING.to_string(),
            sender_type: SenderType::Bot,
            metadata: None,
        };
        if let Err(e) = self.chatbot.add_message(greeting).await {
            warn!("Could not add greeting to conversation {}: {}", conversation.id, e);
        }

        info!("Conversation {} created for user {}", conversation.id, user_id);
        Ok(conversation)
    }

    /// Conversation with its messages
    pub async fn get_conversation(&self, id: i32, user_id: i32) -> Result<Conversation, ServiceError> {
        let mut conversation = self.owned_conversation(id, user_id).await?;
        conversation.messages = self.chatbot.messages(id, user_id).await?;
        Ok(conversation)
    }

    pub async fn conversations(&self, user_id: i32) -> Result<Vec<Conversation>, ServiceError> {
        Ok(self.chatbot.conversations(user_id).await?)
    }

    /// Messages, oldest first
    pub async fn messages(&self, id: i32, user_id: i32) -> Result<Vec<ChatMessage>, ServiceError> {
        self.owned_conversation(id, user_id).await?;
        Ok(self.chatbot.messages(id, user_id).await?)
    }

    pub async fn delete_conversation(&self, id: i32, user_id: i32) -> Result<(), ServiceError> {
        self.chatbot.delete_conversation(id, user_id).await?;
        info!("Conversation {} deleted", id);
        Ok(())
    }

    /// Store the user's message, ask the responder for a reply and store
    /// that too. The user's message stays stored even if the reply cannot be.
    #[instrument(skip(self, content))]
    pub async fn send_message(
        &self,
        user_id: i32,
        conversation_id: i32,
        content: String,
    ) -> Result<ChatExchange, ServiceError> {
        if content.trim().is_empty() {
            return Err(ValidationError::new("content", "Message cannot be empty").into());
        }

        let started = Instant::now();

        // Read history first so the new message is not sent twice
        let history = match self.chatbot.messages(conversation_id, user_id).await {
            Ok(history) => history,
            Err(e) => {
                warn!("Could not load conversation history: {}", e);
                Vec::new()
            }
        };

        let user_message = self
            .chatbot
            .add_message(NewChatMessage {
                conversation_id,
                user_id,
                content: content.clone(),
                sender_type: SenderType::User,
                metadata: None,
            })
            .await?;
        self.touch(conversation_id).await;

        let vitals = match self.users.get_by_id(user_id).await {
            Ok(user) => user.map(|u| u.vitals()),
            Err(e) => {
                warn!("Could not load user info for chat context: {}", e);
                None
            }
        };

        let reply = self
            .responder
            .reply(&content, vitals.as_ref(), &history)
            .await;

        let elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
        let bot_message = self
            .chatbot
            .add_message(NewChatMessage {
                conversation_id,
                user_id,
                content: reply,
                sender_type: SenderType::Bot,
                metadata: Some(json!({ "time_ms": elapsed_ms })),
            })
            .await?;
        self.touch(conversation_id).await;

        Ok(ChatExchange {
            user_message,
            bot_message,
        })
    }

    async fn owned_conversation(&self, id: i32, user_id: i32) -> Result<Conversation, ServiceError> {
        self.chatbot
            .get_conversation(id, user_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Conversation"))
    }

    async fn touch(&self, id: i32) {
        if let Err(e) = self.chatbot.touch_conversation(id).await {
            warn!("Could not update conversation {} timestamp: {}", id, e);
        }
    }
}

/// Title such as `Conversation Mar 5, 2025`.
pub fn default_title() -> String {
    format!("Conversation {}", Utc::now().format("%b %-d, %Y"))
}
