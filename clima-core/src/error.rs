//! Failure kinds of a single user-initiated lookup.

use std::time::Duration;

use thiserror::Error;

/// Every way a search can fail. Each variant maps to exactly one notice shown to the user.
#[derive(Debug, Error)]
pub enum LookupError {
    #[error("invalid city input: {0}")]
    InvalidInput(String),

    #[error("rate limited, next search allowed in {}ms", .0.as_millis())]
    RateLimited(Duration),

    #[error("weather API key is unavailable")]
    KeyUnavailable,

    #[error("weather provider rejected the API key")]
    InvalidKey,

    #[error("city not found")]
    CityNotFound,

    #[error("weather provider returned unexpected status {0}")]
    UpstreamError(u16),

    #[error("forecast unavailable")]
    ForecastUnavailable,

    #[error("request timed out")]
    Timeout,

    #[error("malformed provider response: {0}")]
    MalformedResponse(String),

    #[error("network error: {0}")]
    Network(String),
}

impl LookupError {
    /// Human-readable notice for display. Upstream details stay in the logs.
    pub fn user_message(&self) -> String {
        match self {
            Self::InvalidInput(_) => {
                "Introduce un nombre de ciudad válido (solo letras, espacios, guiones y comas)."
                    .to_string()
            }
            Self::RateLimited(wait) => format!(
                "Demasiadas búsquedas seguidas. Espera {:.1} s e inténtalo de nuevo.",
                wait.as_secs_f64()
            ),
            Self::KeyUnavailable => {
                "El servicio del clima no está disponible: no se pudo cargar la configuración."
                    .to_string()
            }
            Self::InvalidKey => "La clave de la API del clima no es válida.".to_string(),
            Self::CityNotFound => "Ciudad no encontrada".to_string(),
            Self::UpstreamError(status) => {
                format!("Hubo un error al obtener los datos del clima (HTTP {status}).")
            }
            Self::ForecastUnavailable => "Error al obtener el pronóstico".to_string(),
            Self::Timeout => "El servicio del clima tardó demasiado en responder.".to_string(),
            Self::MalformedResponse(_) => {
                "El servicio del clima devolvió una respuesta inesperada.".to_string()
            }
            Self::Network(_) => "Hubo un error al obtener los datos del clima".to_string(),
        }
    }

    /// Whether the failure was decided locally, before any request was sent.
    pub fn is_local(&self) -> bool {
        matches!(self, Self::InvalidInput(_) | Self::RateLimited(_))
    }
}

/// Maps a transport failure, dropping the URL so the `appid` query never reaches a log line.
pub(crate) fn from_transport(err: reqwest::Error) -> LookupError {
    if err.is_timeout() {
        LookupError::Timeout
    } else {
        LookupError::Network(err.without_url().to_string())
    }
}
