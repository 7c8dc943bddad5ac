use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LookupError {
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Configuration error in '{field}': {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value '{value}' for '{field}': {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration '{field}'")]
    MissingConfigError { field: String },

    #[error("{message}")]
    MissingParameter { name: String, message: String },

    #[error("{message}")]
    NotFound { message: String },

    #[error("{message}")]
    Unavailable { message: String },

    #[error("{source_name} returned HTTP {status}")]
    UpstreamStatus { source_name: String, status: u16 },

    #[error("Unexpected response payload: {0}")]
    ParseError(#[from] crate::core::normalizer::ParseFailure),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Input,
    Configuration,
    Data,
    Upstream,
    System,
}

impl LookupError {
    pub fn missing_parameter(name: &str, message: &str) -> Self {
        LookupError::MissingParameter {
            name: name.to_string(),
            message: message.to_string(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        LookupError::NotFound {
            message: message.into(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            LookupError::MissingParameter { .. } | LookupError::NotFound { .. } => {
                ErrorCategory::Input
            }
            LookupError::ConfigError { .. }
            | LookupError::ConfigValidationError { .. }
            | LookupError::InvalidConfigValueError { .. }
            | LookupError::MissingConfigError { .. } => ErrorCategory::Configuration,
            LookupError::CsvError(_)
            | LookupError::SerializationError(_)
            | LookupError::Unavailable { .. } => ErrorCategory::Data,
            LookupError::HttpError(_)
            | LookupError::UpstreamStatus { .. }
            | LookupError::ParseError(_) => ErrorCategory::Upstream,
            LookupError::IoError(_) => ErrorCategory::System,
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            LookupError::MissingParameter { .. } => StatusCode::BAD_REQUEST,
            LookupError::NotFound { .. } => StatusCode::NOT_FOUND,
            LookupError::Unavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message suitable for a terminal user, without internal detail.
    pub fn user_friendly_message(&self) -> String {
        match self.category() {
            ErrorCategory::Configuration => format!("Invalid configuration: {}", self),
            ErrorCategory::System => format!("System error: {}", self),
            ErrorCategory::Upstream => "An upstream service could not be reached".to_string(),
            _ => self.to_string(),
        }
    }
}

impl IntoResponse for LookupError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!("Request failed: {}", self);
            "Internal server error".to_string()
        } else {
            self.to_string()
        };

        (status, Json(serde_json::json!({ "error": message }))).into_response()
    }
}

pub type Result<T> = std::result::Result<T, LookupError>;
