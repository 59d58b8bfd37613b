use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
    routing::get,
    Router,
};

use crate::api::AppState;
use crate::auth::AuthUser;
use crate::errors::ServiceError;
use crate::models::{
    ChatExchange, ChatMessageRequest, Conversation, ConversationResponse, MessagesResponse,
    NewConversationRequest,
};

pub fn chatbot_routes() -> Router<AppState> {
    Router::new()
        .route("/conversations", get(list_conversations).post(create_conversation))
        .route(
            "/conversations/:id",
            get(get_conversation).delete(delete_conversation),
        )
        .route(
            "/conversations/:id/messages",
            get(list_messages).post(send_message),
        )
}

#[tracing::instrument(skip(state, request))]
async fn create_conversation(
    State(state): State<AppState>,
    user: AuthUser,
    request: Option<Json<NewConversationRequest>>,
) -> Result<(StatusCode, Json<ConversationResponse>), ServiceError> {
    let title = request.and_then(|Json(r)| r.title);
    let conversation = state.chatbot.create_conversation(user.user_id, title).await?;
    Ok((StatusCode::CREATED, Json(ConversationResponse { conversation })))
}

async fn list_conversations(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<Vec<Conversation>>, ServiceError> {
    Ok(Json(state.chatbot.conversations(user.user_id).await?))
}

async fn get_conversation(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<i32>,
) -> Result<Json<ConversationResponse>, ServiceError> {
    let conversation = state.chatbot.get_conversation(id, user.user_id).await?;
    Ok(Json(ConversationResponse { conversation }))
}

async fn delete_conversation(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<i32>,
) -> Result<StatusCode, ServiceError> {
    state.chatbot.delete_conversation(id, user.user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn list_messages(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<i32>,
) -> Result<Json<MessagesResponse>, ServiceError> {
    let messages = state.chatbot.messages(id, user.user_id).await?;
    Ok(Json(MessagesResponse { messages }))
}

#[tracing::instrument(skip(state, request))]
async fn send_message(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<i32>,
    Json(request): Json<ChatMessageRequest>,
) -> Result<Json<ChatExchange>, ServiceError> {
    Ok(Json(state.chatbot.send_message(user.user_id, id, request.content).await?))
}
