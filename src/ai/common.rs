use std::future::Future;
use std::time::Duration;

use anyhow::{anyhow, Result};
use reqwest::{Response, StatusCode};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tracing::{debug, instrument, trace, warn};

use crate::ai::config::ApiConfig;

/// Error body returned by the backend.
#[derive(Deserialize, Debug, Default)]
struct ErrorBody {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    code: Option<String>,
}

/// HTTP client for the analysis, generation and refinement backend.
#[derive(Clone, Debug)]
pub struct BackendClient {
    http: reqwest::Client,
    config: ApiConfig,
}

impl BackendClient {
    pub fn new(config: ApiConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            config,
        }
    }

    pub fn config(&self) -> &ApiConfig {
        &self.config
    }

    pub(crate) fn url(&self, path: &str) -> String {
        format!("{}/{}", self.config.base_url, path.trim_start_matches('/'))
    }

    /// POST a JSON body and return the successful response.
    #[instrument(level = "trace", skip(self, body))]
    pub(crate) async fn send<B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
        timeout: Duration,
    ) -> Result<Response> {
        let url = self.url(path);
        debug!(url, "sending backend request");
        let resp = self
            .http
            .post(&url)
            .timeout(timeout)
            .json(body)
            .send()
            .await?;
        check_status(resp).await
    }

    /// POST a JSON body and decode the JSON reply, retrying connection
    /// failures.
    pub(crate) async fn post_json<B, R>(&self, path: &str, body: &B, timeout: Duration) -> Result<R>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        self.with_retry(path, move || async move {
            let resp = self.send(path, body, timeout).await?;
            let raw = resp.text().await?;
            let snippet: String = raw.chars().take(200).collect();
            debug!(snippet = %snippet, "backend response body");
            trace!(raw = %raw, "backend response");
            Ok(serde_json::from_str(&raw)?)
        })
        .await
    }

    /// Run `op`, retrying with growing delays while it fails before any
    /// response arrived.
    pub(crate) async fn with_retry<T, F, Fut>(&self, label: &str, mut op: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut remaining = self.config.retries;
        let mut delay = self.config.retry_delay;
        loop {
            match op().await {
                Ok(value) => return Ok(value),
                Err(err) if remaining > 0 && is_retryable(&err) => {
                    warn!(label, error = %err, remaining, delay_ms = delay.as_millis() as u64, "Retrying backend request");
                    tokio::time::sleep(delay).await;
                    delay = delay.mul_f64(1.5);
                    remaining -= 1;
                }
                Err(err) => return Err(err),
            }
        }
    }
}

/// Whether the error happened before the backend answered.
///
/// Status errors and timeouts are never retried.
pub fn is_retryable(err: &anyhow::Error) -> bool {
    err.chain()
        .filter_map(|cause| cause.downcast_ref::<reqwest::Error>())
        .any(|e| e.is_connect() && !e.is_timeout())
}

async fn check_status(resp: Response) -> Result<Response> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    let message = describe_status(status, &body);
    warn!(%status, message, "Backend error");
    Err(anyhow!("HTTP {}: {message}", status.as_u16()))
}

/// Human-readable reason for a failed status.
pub fn describe_status(status: StatusCode, body: &str) -> String {
    let parsed: ErrorBody = serde_json::from_str(body).unwrap_or_default();
    if let Some(code) = &parsed.code {
        trace!(code, "backend error code");
    }
    let server_message = parsed.message.filter(|m| !m.trim().is_empty());
    match status.as_u16() {
        400 => server_message.unwrap_or_else(|| "invalid request parameters".to_string()),
        401 => "API key invalid or expired".to_string(),
        403 => "access to this resource is forbidden".to_string(),
        404 => "API endpoint not found".to_string(),
        429 => "API rate limit exceeded, try again later".to_string(),
        500 => server_message.unwrap_or_else(|| "internal server error".to_string()),
        503 => "service temporarily unavailable, try again later".to_string(),
        other => server_message.unwrap_or_else(|| format!("server error ({other})")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[test]
    fn describe_status_prefers_server_message() {
        let body = r#"{"error":true,"message":"Prompt is required","code":"VALIDATION"}"#;
        assert_eq!(
            describe_status(StatusCode::BAD_REQUEST, body),
            "Prompt is required"
        );
        assert_eq!(
            describe_status(StatusCode::UNAUTHORIZED, body),
            "API key invalid or expired"
        );
        assert_eq!(
            describe_status(StatusCode::BAD_GATEWAY, "not json"),
            "server error (502)"
        );
    }

    #[test]
    fn url_joins_paths() {
        let client = BackendClient::new(ApiConfig::with_base_url("http://host/api/"));
        assert_eq!(client.url("/analyze"), "http://host/api/analyze");
        assert_eq!(client.url("generate/stream"), "http://host/api/generate/stream");
    }

    #[tokio::test]
    async fn status_errors_are_not_retried() {
        let client = BackendClient::new(ApiConfig::with_base_url("http://unused"));
        let calls = &AtomicU32::new(0);
        let result: Result<()> = client
            .with_retry("test", move || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(anyhow!("HTTP 500: internal server error"))
            })
            .await;
        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn connection_failures_are_retried() {
        let mut config = ApiConfig::with_base_url("http://127.0.0.1:9");
        config.retries = 2;
        config.retry_delay = Duration::from_millis(5);
        let client = &BackendClient::new(config);
        let calls = &AtomicU32::new(0);
        let result: Result<serde_json::Value> = client
            .with_retry("test", move || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                client.post_once().await
            })
            .await;
        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    impl BackendClient {
        async fn post_once(&self) -> Result<serde_json::Value> {
            let resp = self
                .send("analyze", &serde_json::json!({}), Duration::from_secs(2))
                .await?;
            Ok(resp.json().await?)
        }
    }
}
