use std::sync::Arc;
use tracing::{debug, warn};

use crate::models::{ChatMessage, SenderType, UserVitals};
use crate::oracle::{Oracle, OracleRequest, Turn};

pub const SYSTEM_INSTRUCTION: &str = "You are the AI Health Assistant for the SIGAP app, focused on \
healthy lifestyles and stroke prevention. Give advice on exercise, nutrition and stress management. \
Answer politely, informatively and briefly in English, and never use bold formatting. \
Occasionally remind the user how important physical activity, a healthy diet and enough rest are.";

pub const FALLBACK_REPLY: &str =
    "Sorry, I'm having trouble processing your request right now. Please try again.";

/// Prior turns sent along with a new message.
pub const HISTORY_LIMIT: usize = 5;

/// Turns a user message plus context into a displayable bot reply.
pub struct ChatResponder {
    oracle: Arc<dyn Oracle>,
}

impl ChatResponder {
    pub fn new(oracle: Arc<dyn Oracle>) -> Self {
        Self { oracle }
    }

    /// Always returns text; any oracle failure becomes `FALLBACK_REPLY`.
    pub async fn reply(
        &self,
        user_message: &str,
        vitals: Option<&UserVitals>,
        history: &[ChatMessage],
    ) -> String {
        let turns = build_turns(user_message, vitals, history);
        debug!("Sending {} turns to chat oracle", turns.len());

        match self.oracle.generate(OracleRequest::chat(turns)).await {
            Ok(text) => text,
            Err(e) => {
                warn!("Chat oracle failed, sending fallback reply: {}", e);
                FALLBACK_REPLY.to_string()
            }
        }
    }
}

pub fn user_context(vitals: &UserVitals) -> String {
    format!(
        "User information: Age: {}, Height: {:.1} cm, Weight: {:.1} kg.",
        vitals.age_or_default(),
        vitals.height_or_default(),
        vitals.weight_or_default()
    )
}

/// System instruction, optional user context, the last few history turns,
/// then the new message.
pub fn build_turns(
    user_message: &str,
    vitals: Option<&UserVitals>,
    history: &[ChatMessage],
) -> Vec<Turn> {
    let mut turns = vec![Turn::user(SYSTEM_INSTRUCTION)];

    if let Some(vitals) = vitals {
        turns.push(Turn::user(user_context(vitals)));
    }

    let start = history.len().saturating_sub(HISTORY_LIMIT);
    turns.extend(history[start..].iter().map(|message| match message.sender_type {
        SenderType::User => Turn::user(message.content.clone()),
        SenderType::Bot => Turn::model(message.content.clone()),
    }));

    turns.push(Turn::user(user_message));
    turns
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oracle::{DisabledOracle, TurnRole};
    use chrono::Utc;

    fn message(id: i32, sender_type: SenderType, content: &str) -> ChatMessage {
        ChatMessage {
            id,
            conversation_id: 1,
            user_id: 1,
            content: content.to_string(),
            sender_type,
            created_at: Utc::now(),
            metadata: None,
        }
    }

    #[test]
    fn keeps_only_last_five_history_turns() {
        let history: Vec<ChatMessage> = (1..=8)
            .map(|i| {
                let sender = if i % 2 == 0 { SenderType::Bot } else { SenderType::User };
                message(i, sender, &format!("m{}", i))
            })
            .collect();

        let turns = build_turns("new question", None, &history);

        // system + 5 history + new message
        assert_eq!(turns.len(), 7);
        assert_eq!(turns[1].text, "m4");
        assert_eq!(turns[1].role, TurnRole::Model);
        assert_eq!(turns[5].text, "m8");
        assert_eq!(turns[6], Turn::user("new question"));
    }

    #[test]
    fn includes_user_context_when_known() {
        let vitals = UserVitals { age: Some(52), height: Some(165.0), weight: Some(60.5) };
        let turns = build_turns("hi", Some(&vitals), &[]);
        assert_eq!(turns.len(), 3);
        assert_eq!(
            turns[1].text,
            "User information: Age: 52, Height: 165.0 cm, Weight: 60.5 kg."
        );
    }

    #[tokio::test]
    async fn failing_oracle_yields_fallback() {
        let responder = ChatResponder::new(Arc::new(DisabledOracle));
        assert_eq!(responder.reply("hello", None, &[]).await, FALLBACK_REPLY);
    }
}
