mod common;

use assert_matches::assert_matches;
use pretty_assertions::assert_eq;
use std::sync::Arc;

use common::{create_user, create_user_with_vitals, ScriptedOracle};
use sigap_health::models::{SenderType, UserVitals};
use sigap_health::oracle::{DisabledOracle, Oracle, TurnRole};
use sigap_health::repository::MemoryStore;
use sigap_health::services::chat_responder::{FALLBACK_REPLY, SYSTEM_INSTRUCTION};
use sigap_health::services::chatbot_service::GREETING;
use sigap_health::services::{ChatResponder, ChatbotService};
use sigap_health::ServiceError;

fn service(store: &Arc<MemoryStore>, oracle: Arc<dyn Oracle>) -> ChatbotService {
    ChatbotService::new(store.clone(), store.clone(), ChatResponder::new(oracle))
}

#[tokio::test]
async fn new_conversation_gets_default_title_and_greeting() {
    let store = Arc::new(MemoryStore::new());
    let user = create_user(&store, "rina@example.com").await;
    let chatbot = service(&store, Arc::new(DisabledOracle));

    let conversation = chatbot.create_conversation(user.id, None).await.unwrap();
    assert!(conversation.title.starts_with("Conversation "));

    let full = chatbot.get_conversation(conversation.id, user.id).await.unwrap();
    assert_eq!(full.messages.len(), 1);
    assert_eq!(full.messages[0].sender_type, SenderType::Bot);
    assert_eq!(full.messages[0].content, GREETING);
}

#[tokio::test]
async fn blank_title_falls_back_to_default() {
    let store = Arc::new(MemoryStore::new());
    let user = create_user(&store, "rina@example.com").await;
    let chatbot = service(&store, Arc::new(DisabledOracle));

    let named = chatbot
        .create_conversation(user.id, Some("Sleep tips".to_string()))
        .await
        .unwrap();
    let blank = chatbot
        .create_conversation(user.id, Some("   ".to_string()))
        .await
        .unwrap();

    assert_eq!(named.title, "Sleep tips");
    assert!(blank.title.starts_with("Conversation "));
}

#[tokio::test]
async fn failing_oracle_still_yields_a_reply() {
    let store = Arc::new(MemoryStore::new());
    let user = create_user(&store, "rina@example.com").await;
    let chatbot = service(&store, Arc::new(DisabledOracle));
    let conversation = chatbot.create_conversation(user.id, None).await.unwrap();

    let exchange = chatbot
        .send_message(user.id, conversation.id, "How much should I walk?".to_string())
        .await
        .unwrap();

    assert_eq!(exchange.user_message.sender_type, SenderType::User);
    assert_eq!(exchange.user_message.content, "How much should I walk?");
    assert_eq!(exchange.bot_message.sender_type, SenderType::Bot);
    assert_eq!(exchange.bot_message.content, FALLBACK_REPLY);
    assert!(exchange.bot_message.metadata.as_ref().unwrap()["time_ms"].is_u64());

    let messages = chatbot.messages(conversation.id, user.id).await.unwrap();
    assert_eq!(messages.len(), 3);
}

#[tokio::test]
async fn oracle_sees_context_history_and_the_new_message_once() {
    let store = Arc::new(MemoryStore::new());
    let vitals = UserVitals { age: Some(41), height: Some(160.0), weight: Some(55.0) };
    let user = create_user_with_vitals(&store, "rina@example.com", vitals).await;
    let oracle = ScriptedOracle::replying(&["Try a 30 minute walk after dinner."]);
    let chatbot = service(&store, oracle.clone());
    let conversation = chatbot.create_conversation(user.id, None).await.unwrap();

    let exchange = chatbot
        .send_message(user.id, conversation.id, "Any exercise tips?".to_string())
        .await
        .unwrap();
    assert_eq!(exchange.bot_message.content, "Try a 30 minute walk after dinner.");

    let requests = oracle.requests();
    assert_eq!(requests.len(), 1);
    let turns = &requests[0].turns;
    // system, user context, greeting, new message
    assert_eq!(turns.len(), 4);
    assert_eq!(turns[0].text, SYSTEM_INSTRUCTION);
    assert_eq!(
        turns[1].text,
        "User information: Age: 41, Height: 160.0 cm, Weight: 55.0 kg."
    );
    assert_eq!(turns[2].role, TurnRole::Model);
    assert_eq!(turns[2].text, GREETING);
    assert_eq!(turns[3].role, TurnRole::User);
    assert_eq!(turns[3].text, "Any exercise tips?");
}

#[tokio::test]
async fn foreign_conversation_is_not_found() {
    let store = Arc::new(MemoryStore::new());
    let owner = create_user(&store, "rina@example.com").await;
    let intruder = create_user(&store, "eko@example.com").await;
    let chatbot = service(&store, Arc::new(DisabledOracle));
    let conversation = chatbot.create_conversation(owner.id, None).await.unwrap();

    assert_matches!(
        chatbot
            .send_message(intruder.id, conversation.id, "hi".to_string())
            .await,
        Err(ServiceError::NotFound(_))
    );
    assert_matches!(
        chatbot.get_conversation(conversation.id, intruder.id).await,
        Err(ServiceError::NotFound(_))
    );
    assert_matches!(
        chatbot.delete_conversation(conversation.id, intruder.id).await,
        Err(ServiceError::NotFound(_))
    );
    assert_eq!(chatbot.messages(conversation.id, owner.id).await.unwrap().len(), 1);
}

#[tokio::test]
async fn empty_message_is_rejected() {
    let store = Arc::new(MemoryStore::new());
    let user = create_user(&store, "rina@example.com").await;
    let chatbot = service(&store, Arc::new(DisabledOracle));
    let conversation = chatbot.create_conversation(user.id, None).await.unwrap();

    assert_matches!(
        chatbot.send_message(user.id, conversation.id, "  ".to_string()).await,
        Err(ServiceError::Validation(e)) if e.field == "content"
    );
}

#[tokio::test]
async fn delete_removes_conversation_and_messages() {
    let store = Arc::new(MemoryStore::new());
    let user = create_user(&store, "rina@example.com").await;
    let chatbot = service(&store, Arc::new(DisabledOracle));
    let conversation = chatbot.create_conversation(user.id, None).await.unwrap();

    chatbot.delete_conversation(conversation.id, user.id).await.unwrap();

    assert_matches!(
        chatbot.get_conversation(conversation.id, user.id).await,
        Err(ServiceError::NotFound(_))
    );
    assert!(chatbot.conversations(user.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn conversations_are_ordered_by_last_activity() {
    let store = Arc::new(MemoryStore::new());
    let user = create_user(&store, "rina@example.com").await;
    let chatbot = service(&store, Arc::new(DisabledOracle));

    let older = chatbot.create_conversation(user.id, Some("older".to_string())).await.unwrap();
    tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    let newer = chatbot.create_conversation(user.id, Some("newer".to_string())).await.unwrap();
    tokio::time::sleep(std::time::Duration::from_millis(5)).await;

    chatbot
        .send_message(user.id, older.id, "bump".to_string())
        .await
        .unwrap();

    let ids: Vec<i32> = chatbot
        .conversations(user.id)
        .await
        .unwrap()
        .iter()
        .map(|c| c.id)
        .collect();
    assert_eq!(ids, vec![older.id, newer.id]);
}
