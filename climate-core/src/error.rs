use thiserror::Error;

pub type Result<T> = std::result::Result<T, ClimateError>;

/// Errors produced by the fetch → predict pipeline.
///
/// Every variant is recoverable: a failure for one city is reported to the
/// caller and must not stop the rest of the dashboard from rendering.
#[derive(Debug, Error)]
pub enum ClimateError {
    /// The API answered, but there is no forecast data for the city.
    #[error("No forecast data found for city '{city}'")]
    NotFound { city: String },

    #[error("Network request failed for city '{city}'")]
    Network {
        city: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Forecast request for city '{city}' failed with status {status}: {body}")]
    HttpStatus {
        city: String,
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("Unexpected forecast payload for city '{city}': {message}")]
    MalformedResponse { city: String, message: String },

    #[error("Insufficient data for prediction: need at least {needed} observations, got {got}")]
    InsufficientData { needed: usize, got: usize },
}

/// Coarse classification used by the presentation layer to pick a notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    Network,
    MalformedResponse,
    InsufficientData,
}

impl ClimateError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ClimateError::NotFound { .. } => ErrorKind::NotFound,
            ClimateError::Network { .. } | ClimateError::HttpStatus { .. } => ErrorKind::Network,
            ClimateError::MalformedResponse { .. } => ErrorKind::MalformedResponse,
            ClimateError::InsufficientData { .. } => ErrorKind::InsufficientData,
        }
    }

    pub(crate) fn malformed(city: &str, message: impl Into<String>) -> Self {
        ClimateError::MalformedResponse {
            city: city.to_string(),
            message: message.into(),
        }
    }
}
