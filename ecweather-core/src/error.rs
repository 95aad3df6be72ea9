use thiserror::Error;

/// Failures surfaced by station lookup and the weather provider.
#[derive(Debug, Error)]
pub enum WeatherError {
    /// The identifier is syntactically unusable; no request was sent.
    #[error("Invalid station identifier '{input}': {reason}")]
    InvalidStation { input: String, reason: String },

    /// The identifier is well formed but no such station exists.
    #[error("Unknown station '{0}'")]
    UnknownStation(String),

    #[error("Weather provider unavailable: {0}")]
    Unavailable(String),

    #[error("Weather provider did not respond in time")]
    Timeout,

    /// The provider answered, but the payload is missing required fields.
    #[error("Malformed provider response: {0}")]
    Malformed(String),

    #[error("No climate station with current daily data near {0}")]
    NoClimateStation(String),
}

impl WeatherError {
    pub(crate) fn invalid(input: &str, reason: impl Into<String>) -> Self {
        Self::InvalidStation { input: input.to_string(), reason: reason.into() }
    }

    /// Short machine-readable name of the error kind.
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidStation { .. } => "invalid_station",
            Self::UnknownStation(_) => "unknown_station",
            Self::Unavailable(_) => "provider_unavailable",
            Self::Timeout => "provider_timeout",
            Self::Malformed(_) => "malformed_response",
            Self::NoClimateStation(_) => "no_climate_station",
        }
    }
}

impl From<reqwest::Error> for WeatherError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else {
            Self::Unavailable(err.to_string())
        }
    }
}
