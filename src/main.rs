//! Lucra+: margin and pricing calculator.
//!
//! Entry point. Loads configuration, initialises structured logging,
//! builds the authenticator and the in-memory session, then serves the
//! API until Ctrl+C.

use anyhow::Result;
use std::sync::Arc;
use tracing::info;

use lucra::api::{self, SessionState};
use lucra::config::AppConfig;

const BANNER: &str = r#"
  _                              _
 | |   _   _  ___ _ __ __ _    _| |_
 | |  | | | |/ __| '__/ _` |  |_   _|
 | |__| |_| | (__| | | (_| |    |_|
 |_____\__,_|\___|_|  \__,_|

  Controle de Margem e Lucro
  v0.6.0
"#;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (non-fatal if missing)
    let _ = dotenv::dotenv();

    let config_path = std::env::var("LUCRA_CONFIG").unwrap_or_else(|_| "config.toml".to_string());
    let cfg = AppConfig::load(&config_path)?;

    init_logging();

    println!("{BANNER}");
    info!(
        app = %cfg.app.name,
        currency = %cfg.app.currency,
        default_margin = cfg.pricing.default_target_margin_percent,
        max_fixed_costs = cfg.pricing.max_fixed_costs,
        auth_mode = ?cfg.auth.mode,
        "Lucra+ starting up"
    );

    let authenticator = cfg.build_authenticator()?;
    let state = Arc::new(SessionState::new(authenticator, cfg.pricing.clone()));
    {
        let products = state.products.read().await;
        info!(session = %products.session_id(), "Session opened");
    }

    let addr = format!("{}:{}", cfg.server.host, cfg.server.port);
    api::serve(state, &addr, async {
        let _ = tokio::signal::ctrl_c().await;
        info!("Shutdown signal received.");
    })
    .await?;

    info!("Lucra+ shut down cleanly. Session data discarded.");
    Ok(())
}

/// Initialise the `tracing` subscriber.
fn init_logging() {
    use tracing_subscriber::{fmt, EnvFilter};

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("lucra=info"));

    let json_logging = std::env::var("LUCRA_LOG_JSON").is_ok();

    if json_logging {
        fmt()
            .json()
            .with_env_filter(env_filter)
            .with_target(true)
            .with_thread_ids(true)
            .init();
    } else {
        fmt().with_env_filter(env_filter).with_target(true).init();
    }
}
