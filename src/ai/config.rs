use std::env;
use std::time::Duration;

pub const DEFAULT_API_URL: &str = "http://localhost:8080/api";

#[derive(Clone, Debug, PartialEq)]
pub struct ApiConfig {
    pub base_url: String,
    /// Extra attempts after a connection-level failure.
    pub retries: u32,
    pub retry_delay: Duration,
    pub analyze_timeout: Duration,
    pub generate_timeout: Duration,
    pub refine_timeout: Duration,
    pub stream_timeout: Duration,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self::with_base_url(DEFAULT_API_URL)
    }
}

impl ApiConfig {
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            retries: 2,
            retry_delay: Duration::from_millis(1000),
            analyze_timeout: Duration::from_secs(60),
            generate_timeout: Duration::from_secs(120),
            refine_timeout: Duration::from_secs(60),
            stream_timeout: Duration::from_secs(300),
        }
    }

    pub fn from_env() -> Self {
        let mut config =
            Self::with_base_url(env::var("VOIDWEAVER_API_URL").unwrap_or_else(|_| DEFAULT_API_URL.to_string()));
        if let Some(retries) = env::var("VOIDWEAVER_API_RETRIES")
            .ok()
            .and_then(|r| r.parse().ok())
        {
            config.retries = retries;
        }
        config
    }
}
