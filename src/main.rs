mod api;
mod app;
mod auth;
mod config;
mod db;
mod domain;
mod error;
mod logging;
mod middleware;
mod routes;
mod services;

use anyhow::Result;

use services::GeminiClient;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let settings = config::Settings::from_env()?;

    logging::init_logging(&settings.env);

    tracing::info!(
        env = ?settings.env,
        server_addr = %settings.server_addr,
        ai_enabled = settings.gemini.is_some(),
        "Starting RenoBouw backend"
    );

    let pool = db::create_pool(&settings).await?;
    if settings.database_run_migrations {
        db::run_migrations(&pool).await?;
    }

    let gemini = match &settings.gemini {
        Some(g) => Some(GeminiClient::new(
            &g.base_url,
            &g.api_key,
            &g.model,
            g.timeout_seconds,
            g.max_retry_seconds,
        )?),
        None => {
            tracing::warn!("GEMINI_API_KEY not set - chatbot will only use keyword replies");
            None
        }
    };

    // Check Gemini in the background so startup is not blocked
    if let Some(client) = gemini.clone() {
        tokio::spawn(async move {
            match client.health_check().await {
                Ok(()) => tracing::info!("Gemini is reachable"),
                Err(e) => tracing::warn!(error = %e, "Gemini health check failed - chatbot will fall back"),
            }
        });
    }

    let jwks_cache = auth::JwksCache::new(
        settings.supabase_jwt_jwks_url.clone(),
        settings.supabase_jwt_issuer.clone(),
        settings.supabase_jwt_audience.clone(),
        settings.jwks_cache_ttl_seconds,
    )?;

    if let Err(e) = jwks_cache.warm_cache().await {
        tracing::warn!(error = %e, "Failed to warm JWKS cache - will fetch on first request");
    }

    let state = app::AppState::new(pool, settings.clone(), jwks_cache, gemini);
    let app = app::create_app(state);

    let listener = tokio::net::TcpListener::bind(&settings.server_addr).await?;
    tracing::info!("Listening on {}", settings.server_addr);

    axum::serve(listener, app).await?;

    Ok(())
}
