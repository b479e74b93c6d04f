//! Session-lifetime cache for the weather provider key.
//!
//! The key is fetched at most once from the config endpoint. A failed fetch latches: later
//! callers get [`LookupError::KeyUnavailable`] without another request. There is no reset short
//! of starting a new session, so a transient config outage disables lookups until then.

use std::{fmt::Debug, sync::Arc, time::Duration};

use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tokio::{sync::Mutex, task::JoinHandle};
use tracing::{debug, info, warn};

use crate::error::LookupError;

/// Source of the provider key.
#[async_trait]
pub trait ConfigProvider: Send + Sync + Debug {
    async fn fetch_api_key(&self) -> Result<String>;
}

/// Fetches `{ "apiKey": "..." }` from a config endpoint.
#[derive(Debug, Clone)]
pub struct HttpConfigProvider {
    http: Client,
    url: String,
    timeout: Duration,
}

#[derive(Debug, Deserialize)]
struct ConfigBody {
    #[serde(rename = "apiKey")]
    api_key: Option<String>,
    error: Option<String>,
}

impl HttpConfigProvider {
    pub fn new(http: Client, url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            http,
            url: url.into(),
            timeout,
        }
    }

    async fn request(&self) -> Result<String> {
        let res = self
            .http
            .get(&self.url)
            .send()
            .await
            .context("Failed to send request to config endpoint")?;

        let status = res.status();
        let body = res
            .text()
            .await
            .context("Failed to read config endpoint response body")?;

        let parsed: Option<ConfigBody> = serde_json::from_str(&body).ok();

        if !status.is_success() {
            let reason = parsed
                .and_then(|b| b.error)
                .unwrap_or_else(|| "no error message".to_string());
            return Err(anyhow!("Config endpoint returned status {status}: {reason}"));
        }

        parsed
            .and_then(|b| b.api_key)
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| anyhow!("Config endpoint response has no apiKey field"))
    }
}

#[async_trait]
impl ConfigProvider for HttpConfigProvider {
    async fn fetch_api_key(&self) -> Result<String> {
        debug!(url = %self.url, "fetching weather API key");
        tokio::time::timeout(self.timeout, self.request())
            .await
            .map_err(|_| anyhow!("Config endpoint did not answer within {:?}", self.timeout))?
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyStatus {
    Empty,
    Ready,
    Failed,
}

#[derive(Debug)]
enum KeyState {
    Empty,
    Ready(String),
    Failed,
}

/// Holds the key for the session. Concurrent callers share one in-flight fetch: the state lock
/// is held for the whole request, so waiters observe its outcome instead of fetching again.
#[derive(Debug)]
pub struct KeyCache {
    provider: Box<dyn ConfigProvider>,
    state: Mutex<KeyState>,
}

impl KeyCache {
    pub fn new(provider: Box<dyn ConfigProvider>) -> Self {
        Self {
            provider,
            state: Mutex::new(KeyState::Empty),
        }
    }

    pub async fn get_key(&self) -> Result<String, LookupError> {
        let mut state = self.state.lock().await;

        match &*state {
            KeyState::Ready(key) => return Ok(key.clone()),
            KeyState::Failed => return Err(LookupError::KeyUnavailable),
            KeyState::Empty => {}
        }

        match self.provider.fetch_api_key().await {
            Ok(key) => {
                info!("weather API key loaded");
                *state = KeyState::Ready(key.clone());
                Ok(key)
            }
            Err(err) => {
                warn!("weather API key fetch failed, lookups disabled for this session: {err:#}");
                *state = KeyState::Failed;
                Err(LookupError::KeyUnavailable)
            }
        }
    }

    /// The background attempt made at session start. Failure is logged, never shown.
    pub fn spawn_prefetch(self: &Arc<Self>) -> JoinHandle<()> {
        let cache = Arc::clone(self);
        tokio::spawn(async move {
            if let Err(err) = cache.get_key().await {
                warn!(error = %err, "background key prefetch failed");
            }
        })
    }

    /// Current state without triggering a fetch. Reports `Empty` while a fetch is in flight.
    pub fn status(&self) -> KeyStatus {
        match self.state.try_lock() {
            Ok(state) => match &*state {
                KeyState::Empty => KeyStatus::Empty,
                KeyState::Ready(_) => KeyStatus::Ready,
                KeyState::Failed => KeyStatus::Failed,
            },
            Err(_) => KeyStatus::Empty,
        }
    }
}
