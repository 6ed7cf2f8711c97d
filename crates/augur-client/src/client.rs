//! Report backend REST client.
//!
//! Production-grade client with:
//! - HTTP client tuning (pooling, timeouts)
//! - Bearer token capability with a single retry on 401
//! - Exponential backoff with jitter for idempotent reads
//! - Observability (tracing spans, metrics)

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, info_span, Instrument};
use url::Url;
use uuid::Uuid;

use augur_models::{ConfigRow, JobId, ServiceType, UsageRecord, UserProfile};

use crate::api::{AccountApi, ConfigRowsBody, ReportApi, SubmitResponse};
use crate::auth::TokenProvider;
use crate::error::{ClientError, ClientResult};
use crate::metrics::record_request;
use crate::retry::{with_retry, RetryConfig};

/// Header carrying a per-request correlation id.
pub const REQUEST_ID_HEADER: &str = "X-Request-Id";

// =============================================================================
// Configuration
// =============================================================================

/// API client configuration.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Backend base URL, always ending in `/`
    pub base_url: Url,
    /// Request timeout
    pub timeout: Duration,
    /// Connect timeout
    pub connect_timeout: Duration,
    /// Retry configuration for idempotent reads
    pub retry: RetryConfig,
}

impl ApiConfig {
    /// Config with default timeouts and retry policy.
    pub fn new(base_url: &str) -> ClientResult<Self> {
        Ok(Self {
            base_url: normalize_base_url(base_url)?,
            timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(5),
            retry: RetryConfig::default(),
        })
    }

    /// Create config from environment variables.
    pub fn from_env() -> ClientResult<Self> {
        let base_url = std::env::var("AUGUR_API_BASE_URL")
            .map_err(|_| ClientError::config("AUGUR_API_BASE_URL must be set"))?;

        if base_url.trim().is_empty() {
            return Err(ClientError::config("AUGUR_API_BASE_URL cannot be empty"));
        }

        let timeout_secs: u64 = std::env::var("AUGUR_HTTP_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(30);

        let connect_timeout_secs: u64 = std::env::var("AUGUR_HTTP_CONNECT_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(5);

        Ok(Self {
            base_url: normalize_base_url(&base_url)?,
            timeout: Duration::from_secs(timeout_secs),
            connect_timeout: Duration::from_secs(connect_timeout_secs),
            retry: RetryConfig::from_env(),
        })
    }

    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }
}

fn normalize_base_url(raw: &str) -> ClientResult<Url> {
    let trimmed = raw.trim();
    let with_slash = if trimmed.ends_with('/') {
        trimmed.to_string()
    } else {
        format!("{}/", trimmed)
    };
    Url::parse(&with_slash).map_err(|e| ClientError::InvalidUrl(format!("{}: {}", trimmed, e)))
}

// =============================================================================
// Client
// =============================================================================

/// REST client for the report backend.
#[derive(Clone)]
pub struct ApiClient {
    http: Client,
    config: ApiConfig,
    tokens: Arc<dyn TokenProvider>,
}

impl ApiClient {
    /// Create a new API client.
    pub fn new(config: ApiConfig, tokens: Arc<dyn TokenProvider>) -> ClientResult<Self> {
        let http = Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .pool_idle_timeout(Duration::from_secs(90))
            .pool_max_idle_per_host(4)
            .user_agent(concat!("augur-client/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(ClientError::Network)?;

        Ok(Self { http, config, tokens })
    }

    pub fn config(&self) -> &ApiConfig {
        &self.config
    }

    /// Resolve an API path against the base URL.
    fn endpoint(&self, path: &str) -> ClientResult<Url> {
        self.config
            .base_url
            .join(path.trim_start_matches('/'))
            .map_err(|e| ClientError::InvalidUrl(format!("{}: {}", path, e)))
    }

    // =========================================================================
    // Request plumbing
    // =========================================================================

    /// Send a request built by `build`, retrying once after a 401.
    async fn send_authorized<F>(&self, build: F) -> ClientResult<Response>
    where
        F: Fn() -> RequestBuilder,
    {
        let response = self.send_once(&build).await?;
        if response.status() != StatusCode::UNAUTHORIZED {
            return Ok(response);
        }

        debug!("Access token rejected, invalidating and retrying once");
        self.tokens.invalidate().await;
        self.send_once(&build).await
    }

    async fn send_once<F>(&self, build: &F) -> ClientResult<Response>
    where
        F: Fn() -> RequestBuilder,
    {
        let mut request = build().header(REQUEST_ID_HEADER, Uuid::new_v4().to_string());
        if let Some(token) = self.tokens.access_token().await? {
            request = request.bearer_auth(token);
        }
        Ok(request.send().await?)
    }

    /// Decode a response, mapping non-success statuses to errors.
    async fn decode<T: DeserializeOwned>(url: &Url, response: Response) -> ClientResult<T> {
        let status = response.status();
        if !status.is_success() {
            return Err(Self::handle_error_response(status, url, response).await);
        }

        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| {
            ClientError::invalid_response(format!("{} returned unexpected body: {}", url, e))
        })
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> ClientResult<T> {
        let url = self.endpoint(path)?;
        let response = self.send_authorized(|| self.http.get(url.clone())).await?;
        Self::decode(&url, response).await
    }

    async fn post_json<T: DeserializeOwned>(&self, path: &str, body: &Value) -> ClientResult<T> {
        let url = self.endpoint(path)?;
        let response = self
            .send_authorized(|| self.http.post(url.clone()).json(body))
            .await?;
        Self::decode(&url, response).await
    }

    /// Run `fut` inside a request span and record metrics.
    async fn execute_request<T, F>(&self, operation: &'static str, path: &str, fut: F) -> ClientResult<T>
    where
        F: std::future::Future<Output = ClientResult<T>>,
    {
        let span = info_span!("augur_request", operation = %operation, path = %path);

        let start = Instant::now();
        let result = fut.instrument(span).await;

        let status = match &result {
            Ok(_) => Some(200),
            Err(e) => e.http_status(),
        };
        record_request(operation, status, start.elapsed());

        result
    }

    async fn handle_error_response(status: StatusCode, url: &Url, response: Response) -> ClientError {
        let retry_after_ms = response
            .headers()
            .get(reqwest::header::RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse::<u64>().ok())
            .map(|secs| secs * 1000);

        let body = response.text().await.unwrap_or_default();
        match (status, retry_after_ms) {
            (StatusCode::TOO_MANY_REQUESTS, Some(ms)) => ClientError::RateLimited(ms),
            _ => ClientError::from_http_status(status.as_u16(), format!("{} failed: {}", url, body)),
        }
    }
}

// =============================================================================
// Backend operations
// =============================================================================

const CURRENT_USER_PATH: &str = "v1/users/me";
const CONFIGS_PATH: &str = "v1/configs";

#[async_trait]
impl AccountApi for ApiClient {
    async fn fetch_current_user(&self) -> ClientResult<UserProfile> {
        with_retry(&self.config.retry, "fetch_current_user", move || {
            self.execute_request("fetch_current_user", CURRENT_USER_PATH, self.get_json(CURRENT_USER_PATH))
        })
        .await
    }

    async fn fetch_configs(&self) -> ClientResult<Vec<ConfigRow>> {
        let body: ConfigRowsBody = with_retry(&self.config.retry, "fetch_configs", move || {
            self.execute_request("fetch_configs", CONFIGS_PATH, self.get_json(CONFIGS_PATH))
        })
        .await?;
        Ok(body.into_rows())
    }
}

#[async_trait]
impl ReportApi for ApiClient {
    async fn submit_report(&self, service: &ServiceType, payload: &Value) -> ClientResult<SubmitResponse> {
        let path = service
            .submit_path()
            .ok_or_else(|| ClientError::UnsupportedService(service.key().to_string()))?;

        self.execute_request("submit_report", path, self.post_json(path, payload))
            .await
    }

    async fn fetch_usage_history(&self, job_id: &JobId) -> ClientResult<UsageRecord> {
        let path = format!("v1/usage-histories/{}", urlencoding::encode(job_id.as_str()));
        self.execute_request("fetch_usage_history", &path, self.get_json(&path))
            .await
    }
}
