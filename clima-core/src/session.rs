//! Session-scoped context: the state a page holds for its lifetime (key cache, rate limiter,
//! weather client, optional history endpoint), owned in one place.

use std::sync::Arc;

use anyhow::{Context, Result};
use parking_lot::Mutex;
use reqwest::Client;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::{
    client::WeatherClient,
    config::Config,
    error::LookupError,
    history::HistoryClient,
    key_cache::{HttpConfigProvider, KeyCache},
    model::{SearchRequest, WeatherResult},
    provider::provider_from_config,
    rate_limit::RateLimiter,
};

const USER_AGENT: &str = concat!("clima/", env!("CARGO_PKG_VERSION"));

#[derive(Debug)]
pub struct Session {
    keys: Arc<KeyCache>,
    limiter: RateLimiter,
    client: WeatherClient,
    history: Option<HistoryClient>,
    prefetch: Option<JoinHandle<()>>,
    pending_records: Mutex<Vec<JoinHandle<()>>>,
}

impl Session {
    /// Build a session from config without touching the network.
    pub fn new(config: &Config) -> Result<Self> {
        let http = Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .context("Failed to build HTTP client")?;

        let timeout = config.request_timeout();

        let keys = KeyCache::new(Box::new(HttpConfigProvider::new(
            http.clone(),
            &config.config_url,
            timeout,
        )));

        let client = WeatherClient::new(provider_from_config(http.clone(), config))
            .with_stage_timeout(timeout)
            .with_forecast_limit(config.forecast_limit);

        let history = config
            .save_city_url
            .as_deref()
            .map(|url| HistoryClient::new(http, url, config.save_city_timeout()));

        Ok(Self::from_parts(
            Arc::new(keys),
            RateLimiter::new(config.min_search_interval()),
            client,
            history,
        ))
    }

    pub fn from_parts(
        keys: Arc<KeyCache>,
        limiter: RateLimiter,
        client: WeatherClient,
        history: Option<HistoryClient>,
    ) -> Self {
        Self {
            keys,
            limiter,
            client,
            history,
            prefetch: None,
            pending_records: Mutex::new(Vec::new()),
        }
    }

    /// Build a session and kick off the background key fetch, as a page does on load.
    /// Must be called from within a Tokio runtime.
    pub fn start(config: &Config) -> Result<Self> {
        let mut session = Self::new(config)?;
        session.prefetch_key();
        Ok(session)
    }

    /// Start the one automatic key fetch. Later calls do nothing.
    pub fn prefetch_key(&mut self) {
        if self.prefetch.is_none() {
            self.prefetch = Some(self.keys.spawn_prefetch());
        }
    }

    pub fn keys(&self) -> &KeyCache {
        &self.keys
    }

    /// Handle one form submission end to end.
    ///
    /// Validation and the rate limit are checked before any request is made. A rejected
    /// submission does not consume the rate-limit window. Recording the search runs in the
    /// background and never delays the result; see [`Session::flush_history`].
    pub async fn search(&self, raw_city: &str) -> Result<WeatherResult, LookupError> {
        let request = SearchRequest::new(raw_city)?;
        self.limiter.check()?;

        debug!(city = request.city(), "search accepted");

        let api_key = self.keys.get_key().await?;
        let result = self.client.fetch_weather(request.city(), &api_key).await?;

        if let Some(history) = &self.history {
            let history = history.clone();
            let handle = tokio::spawn(async move {
                match history.save(&request).await {
                    Ok(message) => info!(city = request.city(), %message, "search recorded"),
                    Err(err) => {
                        warn!(city = request.city(), error = %err, "failed to record search")
                    }
                }
            });

            let mut pending = self.pending_records.lock();
            pending.retain(|h| !h.is_finished());
            pending.push(handle);
        }

        Ok(result)
    }

    /// Wait for searches still being recorded. Each is bounded by the `saveCity` timeout.
    pub async fn flush_history(&self) {
        let pending = std::mem::take(&mut *self.pending_records.lock());
        for handle in pending {
            if let Err(err) = handle.await {
                warn!(error = %err, "search recording task failed");
            }
        }
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        if let Some(handle) = self.prefetch.take() {
            handle.abort();
        }
        for handle in self.pending_records.get_mut().drain(..) {
            handle.abort();
        }
    }
}
