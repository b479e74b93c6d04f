use chrono::{DateTime, FixedOffset, Offset, Utc};

use crate::{error::LookupError, validate::validate_city};

/// One form submission. Only constructible from input that passed validation.
#[derive(Debug, Clone)]
pub struct SearchRequest {
    city: String,
    issued_at: DateTime<Utc>,
}

impl SearchRequest {
    pub fn new(raw_city: &str) -> Result<Self, LookupError> {
        Ok(Self {
            city: validate_city(raw_city)?,
            issued_at: Utc::now(),
        })
    }

    pub fn city(&self) -> &str {
        &self.city
    }

    pub fn issued_at(&self) -> DateTime<Utc> {
        self.issued_at
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinates {
    pub lat: f64,
    pub lon: f64,
}

/// Current conditions as parsed from the provider's `weather` endpoint.
#[derive(Debug, Clone)]
pub struct WeatherSnapshot {
    pub city_name: String,
    pub temperature_c: f64,
    pub description: String,
    pub icon_code: Option<String>,
    pub wind_speed_mps: f64,
    pub humidity_pct: u8,
    pub timezone_offset_seconds: i32,
    pub coordinates: Coordinates,
}

#[derive(Debug, Clone)]
pub struct ForecastEntry {
    pub timestamp_utc: DateTime<Utc>,
    pub temperature_c: f64,
    pub description: String,
    pub icon_code: String,
}

/// Forecast entries in response (chronological) order.
#[derive(Debug, Clone)]
pub struct Forecast {
    /// UTC offset of the searched city, from `city.timezone`.
    pub timezone_offset_seconds: i32,
    pub entries: Vec<ForecastEntry>,
}

impl Forecast {
    /// Timestamp of `entry` in the searched city's local time. Falls back to UTC when the
    /// provider sends an offset outside ±24h.
    pub fn local_time(&self, entry: &ForecastEntry) -> DateTime<FixedOffset> {
        let offset =
            FixedOffset::east_opt(self.timezone_offset_seconds).unwrap_or_else(|| Utc.fix());
        entry.timestamp_utc.with_timezone(&offset)
    }
}

#[derive(Debug, Clone)]
pub struct WeatherReport {
    pub current: WeatherSnapshot,
    pub forecast: Forecast,
}

/// Outcome of the two-stage pipeline once the first stage has succeeded.
///
/// A failed forecast stage never discards current conditions that were already obtained.
#[derive(Debug)]
pub enum WeatherResult {
    Complete(WeatherReport),
    Partial {
        current: WeatherSnapshot,
        error: LookupError,
    },
}

impl WeatherResult {
    pub fn current(&self) -> &WeatherSnapshot {
        match self {
            Self::Complete(report) => &report.current,
            Self::Partial { current, .. } => current,
        }
    }

    pub fn forecast(&self) -> Option<&Forecast> {
        match self {
            Self::Complete(report) => Some(&report.forecast),
            Self::Partial { .. } => None,
        }
    }

    /// The forecast-stage failure, if any.
    pub fn error(&self) -> Option<&LookupError> {
        match self {
            Self::Complete(_) => None,
            Self::Partial { error, .. } => Some(error),
        }
    }
}
