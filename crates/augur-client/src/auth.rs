//! Bearer token capability.
//!
//! Token issuance and refresh belong to the host application. The client
//! only asks for the current token and signals when the server rejected it.

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;

use crate::error::ClientResult;

/// Source of the bearer token attached to every request.
#[async_trait]
pub trait TokenProvider: Send + Sync {
    /// Current access token, or `None` for anonymous requests.
    async fn access_token(&self) -> ClientResult<Option<String>>;

    /// Called once when the server answers 401, before the single retry.
    async fn invalidate(&self) {}
}

/// Fixed token, e.g. read from `AUGUR_API_TOKEN`.
#[derive(Debug, Default)]
pub struct StaticToken {
    token: RwLock<Option<String>>,
}

impl StaticToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: RwLock::new(Some(token.into())),
        }
    }

    pub fn anonymous() -> Self {
        Self::default()
    }

    /// Token from `AUGUR_API_TOKEN`, anonymous when unset or empty.
    pub fn from_env() -> Self {
        match std::env::var("AUGUR_API_TOKEN") {
            Ok(token) if !token.trim().is_empty() => Self::new(token.trim()),
            _ => Self::anonymous(),
        }
    }

    /// Replace the token after the host refreshed it.
    pub async fn replace(&self, token: impl Into<String>) {
        *self.token.write().await = Some(token.into());
    }
}

#[async_trait]
impl TokenProvider for StaticToken {
    async fn access_token(&self) -> ClientResult<Option<String>> {
        Ok(self.token.read().await.clone())
    }

    async fn invalidate(&self) {
        debug!("Static token rejected by server; keeping it until replaced");
    }
}
