// src/error.rs
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use thiserror::Error;

use crate::post::Platform;

pub type Result<T> = std::result::Result<T, AgentError>;

#[derive(Debug, Error)]
pub enum AgentError {
    #[error("Invalid URL format.")]
    InvalidUrl,

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("unknown platform: {0}")]
    UnknownPlatform(String),

    #[error("fetch failed for {url}: {message}")]
    Fetch { url: String, message: String },

    #[error("oauth error ({platform}): {message}")]
    OAuth { platform: Platform, message: String },

    #[error("{platform} API error (status {status}): {message}")]
    Platform {
        platform: Platform,
        status: u16,
        message: String,
    },

    #[error("{0} is not configured")]
    NotConfigured(Platform),

    #[error("config error: {0}")]
    Config(String),

    #[error("feed error: {0}")]
    Feed(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error("network error: {0}")]
    Http(String),
}

impl From<reqwest::Error> for AgentError {
    fn from(err: reqwest::Error) -> Self {
        AgentError::Http(err.to_string())
    }
}

impl AgentError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AgentError::InvalidUrl | AgentError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            AgentError::UnknownPlatform(_) | AgentError::NotFound(_) => StatusCode::NOT_FOUND,
            AgentError::OAuth { .. } => StatusCode::BAD_REQUEST,
            AgentError::NotConfigured(_) => StatusCode::SERVICE_UNAVAILABLE,
            AgentError::Fetch { .. } | AgentError::Platform { .. } | AgentError::Http(_) => {
                StatusCode::BAD_GATEWAY
            }
            AgentError::Config(_) | AgentError::Feed(_) | AgentError::Io(_) | AgentError::Json(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for AgentError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        } else {
            tracing::warn!(error = %self, "request rejected");
        }
        (status, Json(serde_json::json!({ "error": self.to_string() }))).into_response()
    }
}
