//! Core library for the `clima` weather lookup.
//!
//! This crate defines:
//! - Configuration handling
//! - The session-scoped key cache and search rate limiter
//! - The two-stage OpenWeather pipeline (current conditions, then forecast)
//! - Input validation and output sanitization for rendered results
//!
//! It is used by `clima-cli`, but can also be reused by other binaries or services.

pub mod client;
pub mod config;
pub mod error;
pub mod history;
pub mod key_cache;
pub mod model;
pub mod provider;
pub mod rate_limit;
pub mod render;
pub mod sanitize;
pub mod session;
pub mod validate;

pub use client::WeatherClient;
pub use config::Config;
pub use error::LookupError;
pub use history::{HistoryClient, PersistenceError};
pub use key_cache::{ConfigProvider, HttpConfigProvider, KeyCache, KeyStatus};
pub use model::{
    Coordinates, Forecast, ForecastEntry, SearchRequest, WeatherReport, WeatherResult,
    WeatherSnapshot,
};
pub use provider::WeatherProvider;
pub use rate_limit::RateLimiter;
pub use session::Session;
