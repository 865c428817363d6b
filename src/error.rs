use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

/// Application-level errors
#[derive(thiserror::Error, Debug)]
pub enum AppError {
    #[error("{0}")]
    Config(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Method not allowed")]
    MethodNotAllowed,

    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),

    #[error("External API error: {0}")]
    ExternalApi(String),

    #[error("Could not parse recommendations from model output")]
    Parse { snippet: Option<String> },

    #[error("No recommendations could be produced")]
    NoRecommendations,

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl AppError {
    /// Machine-readable classification sent as the `error` field
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Config(_) => "configuration_error",
            AppError::InvalidInput(_) => "invalid_input",
            AppError::MethodNotAllowed => "method_not_allowed",
            AppError::HttpClient(e) if e.is_timeout() => "upstream_timeout",
            AppError::HttpClient(_) | AppError::ExternalApi(_) => "upstream_error",
            AppError::Parse { .. } => "parse_error",
            AppError::NoRecommendations => "no_recommendations",
            AppError::Serialization(_) | AppError::Internal(_) => "internal_error",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Config(_) | AppError::Serialization(_) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            AppError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            AppError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            AppError::HttpClient(e) if e.is_timeout() => StatusCode::GATEWAY_TIMEOUT,
            AppError::HttpClient(_) | AppError::ExternalApi(_) | AppError::Parse { .. } => {
                StatusCode::BAD_GATEWAY
            }
            AppError::NoRecommendations => StatusCode::UNPROCESSABLE_ENTITY,
        }
    }

    /// Short human-readable message. Transport and serialization details stay
    /// in the logs.
    pub fn public_message(&self) -> String {
        match self {
            AppError::HttpClient(e) if e.is_timeout() => {
                "The recommendation service timed out".to_string()
            }
            AppError::HttpClient(_) => "The recommendation service could not be reached".to_string(),
            AppError::Parse {
                snippet: Some(snippet),
            } => format!("{}: {}", self, snippet),
            AppError::NoRecommendations => {
                "No recommendations were found. Try different books or genres.".to_string()
            }
            AppError::Serialization(_) | AppError::Internal(_) => {
                "Error getting recommendations".to_string()
            }
            _ => self.to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        if status.is_server_error() {
            tracing::error!(error = %self, code = self.code(), "Request failed");
        } else {
            tracing::warn!(error = %self, code = self.code(), "Request rejected");
        }

        let body = Json(json!({
            "error": self.code(),
            "message": self.public_message(),
        }));

        (status, body).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;
