//! Chatbot endpoints
//!
//! The website widget posts every visitor message to `POST /api/chat`.
//! Conversations are stored so the back-office can read them back.

use axum::{extract::State, http::HeaderMap, response::IntoResponse, Json};
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use std::sync::Arc;
use uuid::Uuid;

use crate::api::{
    DataResponse, Paginated, PaginationParams, ValidJson, ValidPath, ValidQuery,
};
use crate::app::AppState;
use crate::auth::RequireAdmin;
use crate::domain::chat::{
    ChatMessage, ChatRequest, ChatResponse, ChatRole, ChatSessionResponse, ChatSessionSummary,
    ChatTurn,
};
use crate::error::{ApiError, ApiResult};
use crate::middleware::RequestIdExt;
use crate::services::chatbot::{self, ReplySource, AI_SYSTEM_PROMPT, FALLBACK_REPLY};

/// Earlier messages sent to the model as context
const AI_HISTORY_MESSAGES: i64 = 10;

#[derive(Debug, sqlx::FromRow)]
struct ChatMessageRow {
    id: Uuid,
    session_id: Uuid,
    role: String,
    content: String,
    source: Option<String>,
    created_at: DateTime<Utc>,
}

impl TryFrom<ChatMessageRow> for ChatMessage {
    type Error = ApiError;

    fn try_from(row: ChatMessageRow) -> Result<Self, Self::Error> {
        let role = row
            .role
            .parse::<ChatRole>()
            .map_err(|e| ApiError::internal(format!("Corrupt chat message {}: {}", row.id, e)))?;

        Ok(Self {
            id: row.id,
            session_id: row.session_id,
            role,
            content: row.content,
            source: row.source,
            created_at: row.created_at,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct ChatSessionRow {
    session_id: Uuid,
    message_count: i64,
    started_at: DateTime<Utc>,
    last_message_at: DateTime<Utc>,
}

impl From<ChatSessionRow> for ChatSessionSummary {
    fn from(row: ChatSessionRow) -> Self {
        Self {
            session_id: row.session_id,
            message_count: row.message_count,
            started_at: row.started_at,
            last_message_at: row.last_message_at,
        }
    }
}

/// Persist the visitor message and the reply in one transaction.
async fn store_exchange(
    db: &PgPool,
    session_id: Uuid,
    message: &str,
    reply: &str,
    source: ReplySource,
) -> Result<(), sqlx::Error> {
    let mut tx = db.begin().await?;
    let now = Utc::now();

    sqlx::query(
        r#"
        INSERT INTO chat_messages (id, session_id, role, content, source, created_at)
        VALUES ($1, $2, $3, $4, NULL, $5)
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(session_id)
    .bind(ChatRole::User.as_str())
    .bind(message)
    .bind(now)
    .execute(&mut *tx)
    .await?;

    sqlx::query(
        r#"
        INSERT INTO chat_messages (id, session_id, role, content, source, created_at)
        VALUES ($1, $2, $3, $4, $5, $6)
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(session_id)
    .bind(ChatRole::Assistant.as_str())
    .bind(reply)
    .bind(source.as_str())
    .bind(now + chrono::Duration::milliseconds(1))
    .execute(&mut *tx)
    .await?;

    tx.commit().await
}

/// Most recent messages of a session, oldest first.
async fn recent_turns(db: &PgPool, session_id: Uuid) -> Result<Vec<ChatTurn>, sqlx::Error> {
    let rows: Vec<(String, String)> = sqlx::query_as(
        r#"
        SELECT role, content FROM (
            SELECT role, content, created_at
            FROM chat_messages
            WHERE session_id = $1
            ORDER BY created_at DESC
            LIMIT $2
        ) recent
        ORDER BY created_at ASC
        "#,
    )
    .bind(session_id)
    .bind(AI_HISTORY_MESSAGES)
    .fetch_all(db)
    .await?;

    Ok(rows
        .into_iter()
        .filter_map(|(role, text)| role.parse().ok().map(|role| ChatTurn { role, text }))
        .collect())
}

/// Ask Gemini when configured; any failure degrades to the fallback reply.
async fn ai_or_fallback(
    state: &AppState,
    session_id: Uuid,
    message: &str,
    request_id: Option<&str>,
) -> (String, ReplySource) {
    let Some(gemini) = &state.gemini else {
        return (FALLBACK_REPLY.to_string(), ReplySource::Fallback);
    };

    let mut turns = recent_turns(&state.db, session_id).await.unwrap_or_else(|e| {
        tracing::warn!(session_id = %session_id, error = %e, "Failed to load chat history");
        Vec::new()
    });
    turns.push(ChatTurn {
        role: ChatRole::User,
        text: message.to_string(),
    });

    match gemini.generate_reply(AI_SYSTEM_PROMPT, &turns, request_id).await {
        Ok(reply) => (reply, ReplySource::Ai),
        Err(e) => {
            tracing::warn!(session_id = %session_id, error = %e, "AI reply failed, using fallback");
            (FALLBACK_REPLY.to_string(), ReplySource::Fallback)
        }
    }
}

/// POST /api/chat
pub async fn send_message(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    ValidJson(req): ValidJson<ChatRequest>,
) -> ApiResult<Json<ChatResponse>> {
    let message = chatbot::validate_message(&req.message).map_err(ApiError::BadRequest)?;
    let session_id = req.session_id.unwrap_or_else(Uuid::new_v4);

    let (reply, source) = match chatbot::keyword_reply(message) {
        Some(reply) => (reply.to_string(), ReplySource::Keyword),
        None => ai_or_fallback(&state, session_id, message, headers.request_id()).await,
    };

    tracing::info!(session_id = %session_id, source = source.as_str(), "Chat reply");

    // History is best effort; the visitor still gets an answer
    if let Err(e) = store_exchange(&state.db, session_id, message, &reply, source).await {
        tracing::warn!(session_id = %session_id, error = %e, "Failed to store chat messages");
    }

    Ok(Json(ChatResponse {
        success: true,
        session_id,
        reply,
        source,
    }))
}

/// GET /api/admin/chat/sessions
pub async fn list_sessions(
    _admin: RequireAdmin,
    State(state): State<Arc<AppState>>,
    ValidQuery(pagination): ValidQuery<PaginationParams>,
) -> ApiResult<impl IntoResponse> {
    let total: i64 = sqlx::query_scalar("SELECT COUNT(DISTINCT session_id) FROM chat_messages")
        .fetch_one(&state.db)
        .await?;

    let rows = sqlx::query_as::<_, ChatSessionRow>(
        r#"
        SELECT session_id,
               COUNT(*) AS message_count,
               MIN(created_at) AS started_at,
               MAX(created_at) AS last_message_at
        FROM chat_messages
        GROUP BY session_id
        ORDER BY last_message_at DESC
        LIMIT $1 OFFSET $2
        "#,
    )
    .bind(pagination.limit())
    .bind(pagination.offset())
    .fetch_all(&state.db)
    .await?;

    let sessions: Vec<ChatSessionSummary> = rows.into_iter().map(Into::into).collect();

    Ok(Paginated::new(sessions, &pagination, total.max(0) as u64))
}

/// GET /api/admin/chat/sessions/:session_id
pub async fn get_session(
    _admin: RequireAdmin,
    State(state): State<Arc<AppState>>,
    ValidPath(session_id): ValidPath<Uuid>,
) -> ApiResult<impl IntoResponse> {
    let rows = sqlx::query_as::<_, ChatMessageRow>(
        r#"
        SELECT id, session_id, role, content, source, created_at
        FROM chat_messages
        WHERE session_id = $1
        ORDER BY created_at ASC, id ASC
        "#,
    )
    .bind(session_id)
    .fetch_all(&state.db)
    .await?;

    if rows.is_empty() {
        return Err(ApiError::NotFound(format!(
            "Chat session {} not found",
            session_id
        )));
    }

    let messages = rows
        .into_iter()
        .map(ChatMessage::try_from)
        .collect::<Result<Vec<_>, _>>()?;

    Ok(DataResponse::new(ChatSessionResponse {
        session_id,
        messages,
    }))
}

#[cfg(test)]
mod tests {
    use crate::app::test_support::test_app;
    use axum::{
        body::{to_bytes, Body},
        http::{header, Request, StatusCode},
    };
    use tower::ServiceExt;

    async fn chat(body: &str) -> (StatusCode, serde_json::Value) {
        let req = Request::builder()
            .method("POST")
            .uri("/api/chat")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();

        let resp = test_app().oneshot(req).await.unwrap();
        let status = resp.status();
        let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn keyword_reply_survives_storage_failure() {
        let (status, body) = chat(r#"{"message":"Hoeveel kost dakisolatie?"}"#).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert_eq!(body["source"], "keyword");
        assert!(body["reply"].as_str().unwrap().contains("offertetool"));
        assert!(body["sessionId"].is_string());
    }

    #[tokio::test]
    async fn session_id_is_echoed() {
        let (_, body) = chat(
            r#"{"sessionId":"0b7d8a53-3c8e-4a57-8c1a-2c5d7e9f0a11","message":"Hallo"}"#,
        )
        .await;

        assert_eq!(body["sessionId"], "0b7d8a53-3c8e-4a57-8c1a-2c5d7e9f0a11");
    }

    #[tokio::test]
    async fn unmatched_message_without_ai_gets_fallback() {
        let (status, body) = chat(r#"{"message":"Plaatsen jullie zonnepanelen?"}"#).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["source"], "fallback");
    }

    #[tokio::test]
    async fn blank_message_is_rejected() {
        let (status, body) = chat(r#"{"message":"   "}"#).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);
    }

    #[tokio::test]
    async fn admin_session_view_requires_token() {
        let req = Request::builder()
            .uri("/api/admin/chat/sessions/0b7d8a53-3c8e-4a57-8c1a-2c5d7e9f0a11")
            .header(header::AUTHORIZATION, "Token abc")
            .body(Body::empty())
            .unwrap();

        let resp = test_app().oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }
}
