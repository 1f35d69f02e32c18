//! Tracing setup
//!
//! `RUST_LOG` wins when set. Otherwise each environment gets its own default
//! directives. Production writes one JSON object per line for the log
//! collector; dev and staging use the multi-line pretty format.

use crate::config::Environment;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn default_directives(env: &Environment) -> &'static str {
    match env {
        Environment::Dev => "renobouw_backend=debug,tower_http=debug,sqlx=warn,info",
        Environment::Staging => "renobouw_backend=debug,tower_http=info,sqlx=warn,info",
        Environment::Prod => "renobouw_backend=info,tower_http=info,sqlx=warn,warn",
    }
}

pub fn init_logging(env: &Environment) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives(env)));

    // Source locations only help locally
    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_file(env.is_dev())
        .with_line_number(env.is_dev());

    let registry = tracing_subscriber::registry().with(filter);
    match env {
        Environment::Prod => registry.with(fmt_layer.json()).init(),
        Environment::Dev | Environment::Staging => registry.with(fmt_layer.pretty()).init(),
    }

    tracing::info!(env = ?env, "Logging initialized");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_environment_has_valid_default_directives() {
        for env in [Environment::Dev, Environment::Staging, Environment::Prod] {
            assert!(EnvFilter::try_new(default_directives(&env)).is_ok());
        }
    }

    #[test]
    fn production_keeps_crate_logs_at_info() {
        assert!(default_directives(&Environment::Prod).starts_with("renobouw_backend=info"));
    }
}
