//! Client for the legacy `saveCity` endpoint, which records each searched city with the time
//! of the search.

use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::{model::SearchRequest, validate::validate_city};

#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("refusing to record invalid city: {0}")]
    InvalidCity(String),

    #[error("persistence request failed: {0}")]
    Request(String),

    #[error("persistence endpoint rejected the record: {0}")]
    Rejected(String),

    #[error("persistence request timed out")]
    Timeout,
}

#[derive(Debug, Serialize)]
struct SaveCityBody<'a> {
    city: &'a str,
    date: String,
}

#[derive(Debug, Deserialize)]
struct SaveCityReply {
    message: Option<String>,
    error: Option<String>,
}

#[derive(Debug, Clone)]
pub struct HistoryClient {
    http: Client,
    url: String,
    timeout: Duration,
}

impl HistoryClient {
    pub fn new(http: Client, url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            http,
            url: url.into(),
            timeout,
        }
    }

    /// POST `{ city, date }` for a search. Returns the endpoint's confirmation message.
    pub async fn save(&self, request: &SearchRequest) -> Result<String, PersistenceError> {
        // Same policy the endpoint enforces.
        validate_city(request.city())
            .map_err(|_| PersistenceError::InvalidCity(request.city().to_string()))?;

        let body = SaveCityBody {
            city: request.city(),
            date: request.issued_at().to_rfc3339(),
        };

        tokio::time::timeout(self.timeout, self.post(&body))
            .await
            .map_err(|_| PersistenceError::Timeout)?
    }

    async fn post(&self, body: &SaveCityBody<'_>) -> Result<String, PersistenceError> {
        debug!(city = body.city, "recording search");

        let res = self
            .http
            .post(&self.url)
            .json(body)
            .send()
            .await
            .map_err(|e| PersistenceError::Request(e.to_string()))?;

        let status = res.status();
        let reply: Option<SaveCityReply> = res.json().await.ok();

        match reply {
            Some(SaveCityReply { error: Some(error), .. }) => Err(PersistenceError::Rejected(error)),
            _ if !status.is_success() => Err(PersistenceError::Rejected(format!("status {status}"))),
            Some(SaveCityReply { message: Some(message), .. }) => Ok(message),
            _ => Err(PersistenceError::Rejected("response has no message".to_string())),
        }
    }
}
