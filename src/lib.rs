use anyhow::{Context, Result};
use clap::Parser;
use dotenvy::dotenv;

pub mod ai;
pub mod codec;
pub mod commands;
pub mod config;
pub mod db;
pub mod handlers;
pub mod history;
pub mod merge;
pub mod messages;
pub mod model;
pub mod prompt;
pub mod sse;
pub mod state;
pub mod store;
pub mod system_info;
pub mod text_utils;

pub mod tests {
    pub mod util;
}

pub use ai::{ApiConfig, BackendClient};
pub use codec::Dialect;
pub use commands::{Cli, Command};
pub use config::Config;
pub use db::{prepare_sqlite_url, CredentialKind, Credentials, Database};
pub use handlers::App;
pub use history::HistoryRing;
pub use merge::RemoteModule;
pub use model::{EngineType, GeneratedImage, GenerationResult, Module, ModuleName, Tag, TagId};
pub use sse::{SseDecoder, StreamEvent, StreamProgress};
pub use state::{AppState, EngineSettings};
pub use store::ModuleStore;

// ──────────────────────────────────────────────────────────────
// Main application setup
// ──────────────────────────────────────────────────────────────

pub async fn run() -> Result<()> {
    // Load .env file if it exists (for local development)
    dotenv().ok();

    // Initialize tracing subscriber for logging
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = Config::from_env();
    let session_path = cli.session.clone().unwrap_or(config.session_path.clone());

    tracing::debug!(db_url = %config.db_url, session = %session_path.display(), "Starting voidweaver");

    let db = db::open(&config.db_url)
        .await
        .context("failed to open credential store")?;
    let state = AppState::load(&session_path, config.defaults.clone())?;
    let mut app = App::new(state, db, BackendClient::new(config.api.clone()));
    if cli.comma {
        app.dialect = Dialect::Comma;
    }

    let mutates = cli.command.mutates_state();
    let output = cli.command.dispatch(&mut app).await?;
    if mutates {
        app.state.save(&session_path)?;
    }
    app.db.close().await;

    println!("{output}");
    Ok(())
}
