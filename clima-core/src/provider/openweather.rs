use async_trait::async_trait;
use chrono::DateTime;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::{
    error::{LookupError, from_transport},
    model::{Coordinates, Forecast, ForecastEntry, WeatherSnapshot},
};

use super::WeatherProvider;

#[derive(Debug, Clone)]
pub struct OpenWeatherProvider {
    http: Client,
    base_url: String,
    units: String,
    lang: String,
}

impl OpenWeatherProvider {
    pub fn new(http: Client, base_url: &str, units: &str, lang: &str) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            units: units.to_string(),
            lang: lang.to_string(),
        }
    }

    /// GET `{base_url}/{endpoint}` for `city`; the query string is URL-escaped by reqwest.
    async fn get(
        &self,
        endpoint: &str,
        city: &str,
        api_key: &str,
    ) -> Result<(StatusCode, String), LookupError> {
        let url = format!("{}/{}", self.base_url, endpoint);
        debug!(endpoint, city, "requesting OpenWeather");

        let res = self
            .http
            .get(&url)
            .query(&[
                ("q", city),
                ("units", self.units.as_str()),
                ("lang", self.lang.as_str()),
                ("appid", api_key),
            ])
            .send()
            .await
            .map_err(from_transport)?;

        let status = res.status();
        let body = res.text().await.map_err(from_transport)?;

        debug!(endpoint, %status, "OpenWeather responded");
        Ok((status, body))
    }
}

#[derive(Debug, Deserialize)]
struct OwEnvelope {
    cod: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct OwMain {
    temp: f64,
    humidity: u8,
}

#[derive(Debug, Deserialize)]
struct OwWeather {
    description: String,
    icon: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OwWind {
    speed: f64,
}

#[derive(Debug, Deserialize)]
struct OwCoord {
    lat: f64,
    lon: f64,
}

#[derive(Debug, Deserialize)]
struct OwCurrentResponse {
    name: String,
    main: OwMain,
    weather: Vec<OwWeather>,
    wind: OwWind,
    #[serde(default)]
    timezone: i32,
    coord: OwCoord,
}

#[derive(Debug, Deserialize)]
struct OwForecastMain {
    temp: f64,
}

#[derive(Debug, Deserialize)]
struct OwForecastEntry {
    dt: i64,
    main: OwForecastMain,
    weather: Vec<OwWeather>,
}

#[derive(Debug, Deserialize)]
struct OwCity {
    #[serde(default)]
    timezone: i32,
}

#[derive(Debug, Deserialize)]
struct OwForecastResponse {
    city: OwCity,
    list: Vec<Value>,
}

/// The provider-level status embedded in the body. `weather` sends a number, `forecast` a
/// string; both shapes are accepted.
fn body_code(body: &str) -> Option<u16> {
    let envelope: OwEnvelope = serde_json::from_str(body).ok()?;
    match envelope.cod? {
        Value::Number(n) => n.as_u64().and_then(|n| u16::try_from(n).ok()),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn malformed(context: &str, err: impl std::fmt::Display) -> LookupError {
    LookupError::MalformedResponse(format!("{context}: {err}"))
}

fn parse_current(body: &str) -> Result<WeatherSnapshot, LookupError> {
    let parsed: OwCurrentResponse =
        serde_json::from_str(body).map_err(|e| malformed("current conditions", e))?;

    let condition = parsed
        .weather
        .into_iter()
        .next()
        .ok_or_else(|| malformed("current conditions", "empty weather list"))?;

    Ok(WeatherSnapshot {
        city_name: parsed.name,
        temperature_c: parsed.main.temp,
        description: condition.description,
        icon_code: condition.icon,
        wind_speed_mps: parsed.wind.speed,
        humidity_pct: parsed.main.humidity,
        timezone_offset_seconds: parsed.timezone,
        coordinates: Coordinates {
            lat: parsed.coord.lat,
            lon: parsed.coord.lon,
        },
    })
}

fn parse_forecast(body: &str, limit: usize) -> Result<Forecast, LookupError> {
    let parsed: OwForecastResponse =
        serde_json::from_str(body).map_err(|e| malformed("forecast", e))?;

    // Entries past `limit` are never rendered, so they are not validated either.
    let entries = parsed
        .list
        .into_iter()
        .take(limit)
        .map(parse_forecast_entry)
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Forecast {
        timezone_offset_seconds: parsed.city.timezone,
        entries,
    })
}

fn parse_forecast_entry(raw: Value) -> Result<ForecastEntry, LookupError> {
    let entry: OwForecastEntry =
        serde_json::from_value(raw).map_err(|e| malformed("forecast entry", e))?;

    let timestamp_utc = DateTime::from_timestamp(entry.dt, 0)
        .ok_or_else(|| malformed("forecast entry", format!("timestamp {} out of range", entry.dt)))?;

    let condition = entry
        .weather
        .into_iter()
        .next()
        .ok_or_else(|| malformed("forecast entry", "empty weather list"))?;

    Ok(ForecastEntry {
        timestamp_utc,
        temperature_c: entry.main.temp,
        description: condition.description,
        icon_code: condition.icon.unwrap_or_default(),
    })
}

#[async_trait]
impl WeatherProvider for OpenWeatherProvider {
    async fn current(&self, city: &str, api_key: &str) -> Result<WeatherSnapshot, LookupError> {
        let (status, body) = self.get("weather", city, api_key).await?;

        match status {
            StatusCode::UNAUTHORIZED => return Err(LookupError::InvalidKey),
            StatusCode::NOT_FOUND => return Err(LookupError::CityNotFound),
            s if !s.is_success() => return Err(LookupError::UpstreamError(s.as_u16())),
            _ => {}
        }

        match body_code(&body) {
            Some(200) => parse_current(&body),
            Some(401) => Err(LookupError::InvalidKey),
            code => {
                debug!(?code, "current conditions carried a provider-level error");
                Err(LookupError::CityNotFound)
            }
        }
    }

    async fn forecast(
        &self,
        city: &str,
        api_key: &str,
        limit: usize,
    ) -> Result<Forecast, LookupError> {
        let (status, body) = self.get("forecast", city, api_key).await?;

        if !status.is_success() {
            return Err(LookupError::ForecastUnavailable);
        }

        match body_code(&body) {
            Some(200) => parse_forecast(&body, limit),
            code => {
                debug!(?code, "forecast carried a provider-level error");
                Err(LookupError::ForecastUnavailable)
            }
        }
    }
}
