use axum::{
    extract::State,
    middleware,
    routing::{get, post},
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};
use pawmart_core::chat::{ChatMessage, ChatReply};

use crate::error::AppError;
use crate::middleware::auth::{shopper_auth_middleware, SessionClaims};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
struct ChatRequest {
    message: String,
}

#[derive(Debug, Serialize)]
struct HistoryResponse {
    greeting: ChatReply,
    messages: Vec<ChatMessage>,
}

pub fn routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/v1/chat", post(send_message))
        .route("/v1/chat/history", get(history))
        .route_layer(middleware::from_fn_with_state(state, shopper_auth_middleware))
}

async fn send_message(
    State(state): State<AppState>,
    Extension(claims): Extension<SessionClaims>,
    Json(req): Json<ChatRequest>,
) -> Result<Json<ChatReply>, AppError> {
    let reply = state.store.write().await.chat(&claims.sub, &req.message)?;
    state.persist().await;
    Ok(Json(reply))
}

async fn history(
    State(state): State<AppState>,
    Extension(claims): Extension<SessionClaims>,
) -> Json<HistoryResponse> {
    let store = state.store.read().await;
    Json(HistoryResponse {
        greeting: store.chat_greeting(),
        messages: store.chat_history(&claims.sub),
    })
}
