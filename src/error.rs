//! Error types and their HTTP mapping.

use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use thiserror::Error;

/// A failed call to one of the reputation APIs.
#[derive(Error, Debug)]
pub enum UpstreamError {
    #[error("{service} request failed: {source}")]
    Transport {
        service: &'static str,
        #[source]
        source: reqwest::Error,
    },

    #[error("{service} request failed: HTTP {status}: {message}")]
    Status {
        service: &'static str,
        status: u16,
        message: String,
    },

    #[error("{service} request failed: unexpected response: {detail}")]
    Decode {
        service: &'static str,
        detail: String,
    },
}

impl UpstreamError {
    pub fn service(&self) -> &'static str {
        match self {
            UpstreamError::Transport { service, .. }
            | UpstreamError::Status { service, .. }
            | UpstreamError::Decode { service, .. } => service,
        }
    }
}

/// Errors surfaced to clients of `/check-url`.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Missing URL")]
    MissingUrl,

    #[error("Invalid URL")]
    InvalidUrl,

    #[error("{0}")]
    BadRequest(String),

    #[error(transparent)]
    Upstream(#[from] UpstreamError),
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::MissingUrl | ApiError::InvalidUrl | ApiError::BadRequest(_) => {
                StatusCode::BAD_REQUEST
            }
            ApiError::Upstream(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(serde_json::json!({
            "error": self.to_string()
        }))
    }
}
