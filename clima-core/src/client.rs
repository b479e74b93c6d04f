//! The two-stage lookup: current conditions, then forecast.
//!
//! Each stage runs under its own deadline. Stage one failing ends the lookup with an error;
//! stage two failing yields [`WeatherResult::Partial`] so current conditions are kept.

use std::time::Duration;

use tracing::{info, warn};

use crate::{
    error::LookupError,
    model::{WeatherReport, WeatherResult},
    provider::WeatherProvider,
};

pub const DEFAULT_STAGE_TIMEOUT: Duration = Duration::from_secs(8);
pub const DEFAULT_FORECAST_LIMIT: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    Current,
    Forecast,
}

impl Stage {
    fn as_str(self) -> &'static str {
        match self {
            Stage::Current => "current",
            Stage::Forecast => "forecast",
        }
    }
}

#[derive(Debug)]
pub struct WeatherClient {
    provider: Box<dyn WeatherProvider>,
    stage_timeout: Duration,
    forecast_limit: usize,
}

impl WeatherClient {
    pub fn new(provider: Box<dyn WeatherProvider>) -> Self {
        Self {
            provider,
            stage_timeout: DEFAULT_STAGE_TIMEOUT,
            forecast_limit: DEFAULT_FORECAST_LIMIT,
        }
    }

    pub fn with_stage_timeout(mut self, timeout: Duration) -> Self {
        self.stage_timeout = timeout;
        self
    }

    /// Keep at most `limit` forecast entries, capped at 16 (48 hours of 3-hour steps).
    pub fn with_forecast_limit(mut self, limit: usize) -> Self {
        self.forecast_limit = limit.min(DEFAULT_FORECAST_LIMIT);
        self
    }

    pub fn forecast_limit(&self) -> usize {
        self.forecast_limit
    }

    /// Run both stages for an already validated `city`.
    pub async fn fetch_weather(
        &self,
        city: &str,
        api_key: &str,
    ) -> Result<WeatherResult, LookupError> {
        let current = self
            .run_stage(Stage::Current, self.provider.current(city, api_key))
            .await?;

        info!(city = %current.city_name, "current conditions received");

        let forecast = self
            .run_stage(
                Stage::Forecast,
                self.provider.forecast(city, api_key, self.forecast_limit),
            )
            .await;

        Ok(match forecast {
            Ok(forecast) => {
                info!(entries = forecast.entries.len(), "forecast received");
                WeatherResult::Complete(WeatherReport { current, forecast })
            }
            Err(error) => WeatherResult::Partial { current, error },
        })
    }

    /// Drive one stage under a fresh deadline. Dropping the future on expiry aborts the
    /// in-flight request.
    async fn run_stage<T>(
        &self,
        stage: Stage,
        fut: impl Future<Output = Result<T, LookupError>>,
    ) -> Result<T, LookupError> {
        let outcome = match tokio::time::timeout(self.stage_timeout, fut).await {
            Ok(result) => result,
            Err(_) => Err(LookupError::Timeout),
        };

        if let Err(err) = &outcome {
            warn!(stage = stage.as_str(), error = %err, "weather stage failed");
        }
        outcome
    }
}
