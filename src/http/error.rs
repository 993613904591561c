//! Forwarding errors and their client-facing responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use crate::config::origin::OriginError;

#[derive(Debug, thiserror::Error)]
pub enum ProxyError {
    /// Deployment defect: there is no usable upstream origin.
    #[error("proxy is misconfigured: {0}")]
    Misconfigured(#[from] OriginError),

    #[error("request path must not contain dot segments")]
    InvalidPath,

    #[error("request body exceeds {limit} bytes")]
    BodyTooLarge { limit: usize },

    #[error("failed to read request body: {0}")]
    BodyRead(String),

    #[error("upstream did not respond within {secs}s")]
    UpstreamTimeout { secs: u64 },

    #[error("upstream request failed: {0}")]
    UpstreamUnavailable(#[source] reqwest::Error),
}

impl ProxyError {
    pub fn status(&self) -> StatusCode {
        match self {
            ProxyError::Misconfigured(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ProxyError::InvalidPath => StatusCode::BAD_REQUEST,
            ProxyError::BodyTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            ProxyError::BodyRead(_) => StatusCode::BAD_REQUEST,
            ProxyError::UpstreamTimeout { .. } => StatusCode::GATEWAY_TIMEOUT,
            ProxyError::UpstreamUnavailable(_) => StatusCode::BAD_GATEWAY,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            ProxyError::Misconfigured(_) => "proxy_misconfigured",
            ProxyError::InvalidPath => "invalid_path",
            ProxyError::BodyTooLarge { .. } => "payload_too_large",
            ProxyError::BodyRead(_) => "invalid_request_body",
            ProxyError::UpstreamTimeout { .. } => "upstream_timeout",
            ProxyError::UpstreamUnavailable(_) => "upstream_unavailable",
        }
    }

    /// Text safe to show clients. Transport details stay in the logs.
    fn public_message(&self) -> String {
        match self {
            ProxyError::UpstreamUnavailable(_) => "the upstream service could not be reached".to_string(),
            other => other.to_string(),
        }
    }
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        let body = Json(json!({
            "error": self.code(),
            "message": self.public_message(),
        }));
        (self.status(), body).into_response()
    }
}
