mod config;
mod errors;
mod layout;
mod models;
mod render;
mod resume;
mod routes;
mod sanitize;
mod session;
mod state;
mod validation;

use anyhow::{Context, Result};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::render::{RenderSet, ThemeAssets};
use crate::routes::build_router;
use crate::session::{MemorySessionStore, RedisSessionStore, SessionStore};
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on malformed values)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "{}={}",
                env!("CARGO_PKG_NAME").replace('-', "_"),
                &config.rust_log
            ))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting cvforge API v{}", env!("CARGO_PKG_VERSION"));

    // Session store: Redis when configured, in-process otherwise
    let sessions: Arc<dyn SessionStore> = match &config.redis_url {
        Some(url) => {
            let client = redis::Client::open(url.as_str()).context("REDIS_URL is not a valid Redis URL")?;
            info!("Redis session store initialized");
            Arc::new(RedisSessionStore::new(client, config.session_ttl_secs))
        }
        None => {
            info!("In-memory session store initialized");
            Arc::new(MemorySessionStore::new(config.session_ttl_secs))
        }
    };
    info!(ttl_secs = config.session_ttl_secs, "Session TTL");

    // Theme stylesheets and the HTML template feed every renderer
    let themes = ThemeAssets::load(&config.theme_dir);
    let renderers = RenderSet::new(themes, config.template_dir.as_deref());
    info!(
        theme_dir = %config.theme_dir.display(),
        template_override = config.template_dir.is_some(),
        "Renderers initialized"
    );

    // Build app state
    let state = AppState {
        sessions,
        renderers,
        config: config.clone(),
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: restrict origins once the form host is fixed

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
