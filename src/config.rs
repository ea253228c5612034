use std::env;
use std::path::PathBuf;

use tracing::warn;

use crate::ai::config::ApiConfig;
use crate::state::EngineSettings;

pub const DEFAULT_DB_URL: &str = "sqlite:voidweaver.db";
pub const DEFAULT_SESSION_PATH: &str = "voidweaver-session.json";

#[derive(Clone, Debug)]
pub struct Config {
    pub db_url: String,
    pub session_path: PathBuf,
    pub api: ApiConfig,
    /// Engine settings for a fresh session.
    pub defaults: EngineSettings,
}

impl Config {
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();
        let db_url = env::var("VOIDWEAVER_DB_URL").unwrap_or_else(|_| DEFAULT_DB_URL.to_string());
        let session_path = env::var("VOIDWEAVER_SESSION")
            .unwrap_or_else(|_| DEFAULT_SESSION_PATH.to_string())
            .into();
        Self {
            db_url,
            session_path,
            api: ApiConfig::from_env(),
            defaults: settings_from_env(),
        }
    }
}

fn settings_from_env() -> EngineSettings {
    let mut settings = EngineSettings::default();
    if let Ok(raw) = env::var("VOIDWEAVER_ENGINE") {
        match raw.parse() {
            Ok(engine) => settings.engine = engine,
            Err(err) => warn!(error = %err, "Ignoring VOIDWEAVER_ENGINE"),
        }
    }
    if let Ok(resolution) = env::var("VOIDWEAVER_RESOLUTION") {
        settings.resolution = resolution;
    }
    if let Some(steps) = env_parse("VOIDWEAVER_STEPS") {
        settings.steps = steps;
    }
    if let Some(scale) = env_parse("VOIDWEAVER_SCALE") {
        settings.scale = scale;
    }
    settings
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    let raw = env::var(key).ok()?;
    let parsed = raw.trim().parse().ok();
    if parsed.is_none() {
        warn!(key, raw, "Ignoring unparsable setting");
    }
    parsed
}
