pub mod admin;
pub mod chat;
pub mod health;
pub mod me;
pub mod quotes;

use axum::{
    routing::{get, patch, post},
    Router,
};
use std::sync::Arc;

use crate::app::AppState;

/// Build the API router with all routes
pub fn api_router() -> Router<Arc<AppState>> {
    Router::new()
        // Public routes
        .route("/health", get(health::health_check))
        .route("/api/ai-tools/generate-quote", post(quotes::generate_quote))
        .route("/api/quotes", post(quotes::create_quote))
        .route("/api/chat", post(chat::send_message))
        // Back-office
        .route("/api/me", get(me::get_me))
        .route("/api/admin/stats", get(admin::get_stats))
        .route("/api/admin/quotes", get(quotes::list_quotes))
        .route("/api/admin/quotes/:quote_id", get(quotes::get_quote))
        .route(
            "/api/admin/quotes/:quote_id/status",
            patch(quotes::update_quote_status),
        )
        .route("/api/admin/chat/sessions", get(chat::list_sessions))
        .route(
            "/api/admin/chat/sessions/:session_id",
            get(chat::get_session),
        )
}
