use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;
use std::sync::Arc;

use crate::app::AppState;
use crate::db;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub services: ServiceHealth,
}

#[derive(Debug, Serialize)]
pub struct ServiceHealth {
    pub database: String,
    pub gemini: String,
}

/// Health check endpoint - public
pub async fn health_check(
    State(state): State<Arc<AppState>>,
) -> (StatusCode, Json<HealthResponse>) {
    let gemini_check = async {
        match &state.gemini {
            Some(client) => Some(client.health_check().await.is_ok()),
            None => None,
        }
    };

    let (db_ok, gemini_ok) = tokio::join!(db::health_check(&state.db), gemini_check);

    let gemini_status = match gemini_ok {
        Some(true) => "ok",
        Some(false) => "error",
        None => "disabled",
    };

    // Database is critical; Gemini only degrades the chatbot
    let status = match (db_ok, gemini_ok) {
        (false, _) => "unhealthy",
        (true, Some(false)) => "degraded",
        (true, _) => "healthy",
    };

    let status_code = if db_ok {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        status_code,
        Json(HealthResponse {
            status: status.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            services: ServiceHealth {
                database: if db_ok { "ok" } else { "error" }.to_string(),
                gemini: gemini_status.to_string(),
            },
        }),
    )
}
