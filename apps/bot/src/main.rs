mod config;
mod errors;
mod extract;
mod matching;
mod models;
mod oracle;
mod pipeline;
mod router;
mod routes;
mod scheduler;
mod sources;
mod state;
mod store;
mod supervisor;
mod telegram;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::extract::PdfExtractor;
use crate::matching::MatchEngine;
use crate::oracle::GroqClient;
use crate::routes::build_router;
use crate::scheduler::Scheduler;
use crate::sources::arbeitnow::ArbeitnowSource;
use crate::sources::remotive::RemotiveSource;
use crate::sources::SourceAggregator;
use crate::state::AppState;
use crate::store::UserStore;
use crate::supervisor::Supervisor;
use crate::telegram::TelegramClient;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails fast on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting JobMatchBot v{}", env!("CARGO_PKG_VERSION"));

    // User snapshot (missing file starts empty)
    let store = Arc::new(UserStore::load(&config.users_file));
    info!("User store ready ({} user(s))", store.user_count());

    // Messaging channel
    let telegram = TelegramClient::new(config.telegram_bot_token.clone());
    info!("Telegram client initialized");

    // Scoring oracle
    let oracle = GroqClient::new(config.groq_api_key.clone(), config.groq_model.clone());
    info!("Oracle client initialized (model: {})", config.groq_model);

    // Job sources in declared priority order
    let sources = Arc::new(SourceAggregator::new(vec![
        Arc::new(RemotiveSource::new()),
        Arc::new(ArbeitnowSource::new()),
    ]));

    let state = AppState {
        store,
        messenger: Arc::new(telegram.clone()),
        sources,
        engine: MatchEngine::new(Arc::new(oracle)),
        extractor: Arc::new(PdfExtractor),
        config: config.clone(),
    };

    // Health surface for external monitoring
    let app = build_router(state.clone())
        .layer(tower_http::trace::TraceLayer::new_for_http());
    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Health endpoint listening on {addr}");
    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            tracing::error!("Health server exited: {e}");
        }
    });

    // Initial schedule grouping, then the control loop (never returns)
    let scheduler = Scheduler::new(state.clone());
    Supervisor::new(state, telegram, scheduler).run().await
}
