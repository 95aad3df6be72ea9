//! API error handling

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use ecweather_core::WeatherError;
use serde::Serialize;
use thiserror::Error;
use tracing::{error, warn};

use crate::render::RenderError;

/// HTTP status for a provider or lookup failure.
pub fn status_for(err: &WeatherError) -> StatusCode {
    match err {
        WeatherError::InvalidStation { .. } => StatusCode::BAD_REQUEST,
        WeatherError::UnknownStation(_) | WeatherError::NoClimateStation(_) => {
            StatusCode::NOT_FOUND
        }
        WeatherError::Unavailable(_) | WeatherError::Malformed(_) => StatusCode::BAD_GATEWAY,
        WeatherError::Timeout => StatusCode::GATEWAY_TIMEOUT,
    }
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Weather(#[from] WeatherError),

    #[error(transparent)]
    Render(#[from] RenderError),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Error response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            Self::Weather(e) => {
                warn!(error = %e, "Weather request failed");
                (status_for(e), e.code())
            }
            Self::Render(e) => {
                error!(error = %e, "Rendering failed");
                (StatusCode::INTERNAL_SERVER_ERROR, "render_error")
            }
            Self::Internal(msg) => {
                error!(error = %msg, "Internal error");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error")
            }
        };

        let body = ErrorResponse { error: self.to_string(), code: code.to_string() };
        (status, Json(body)).into_response()
    }
}
