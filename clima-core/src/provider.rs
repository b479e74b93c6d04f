use crate::{
    Config,
    error::LookupError,
    model::{Forecast, WeatherSnapshot},
    provider::openweather::OpenWeatherProvider,
};
use async_trait::async_trait;
use reqwest::Client;
use std::fmt::Debug;

pub mod openweather;

/// Upstream weather source. Implementations map transport and provider-level failures onto
/// [`LookupError`]; timeouts are applied by the caller.
#[async_trait]
pub trait WeatherProvider: Send + Sync + Debug {
    async fn current(&self, city: &str, api_key: &str) -> Result<WeatherSnapshot, LookupError>;

    /// Forecast for `city`, keeping at most `limit` entries in response order.
    async fn forecast(
        &self,
        city: &str,
        api_key: &str,
        limit: usize,
    ) -> Result<Forecast, LookupError>;
}

/// Construct the provider described by `config`.
pub fn provider_from_config(http: Client, config: &Config) -> Box<dyn WeatherProvider> {
    Box::new(OpenWeatherProvider::new(
        http,
        &config.weather_base_url,
        &config.units,
        &config.lang,
    ))
}
