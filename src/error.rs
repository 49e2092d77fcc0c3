// src/error.rs
//! Error types for the upstream fetchers and their HTTP mapping.
//!
//! Everything an external API can do wrong is caught at the fetcher boundary
//! as an [`UpstreamError`]; handlers wrap that in [`ApiError`], which renders
//! a structured `{"error": ...}` body instead of hanging the request.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Failure raised while talking to one of the external services.
#[derive(Debug, Error)]
pub enum UpstreamError {
    /// Network/transport failure, including timeouts and non-auth HTTP
    /// status errors, whether at request time or while a body streams.
    #[error("{service}: request failed: {source}")]
    Transport {
        service: &'static str,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// The upstream rejected our credentials (401/403).
    #[error("{service}: credentials rejected (status {status})")]
    Auth { service: &'static str, status: u16 },

    /// Response arrived but did not have the expected shape.
    #[error("{service}: unexpected response shape: {detail}")]
    Shape { service: &'static str, detail: String },

    /// The syndication feed body was not parseable XML.
    #[error("{service}: invalid XML: {detail}")]
    Xml { service: &'static str, detail: String },
}

impl UpstreamError {
    pub fn transport(
        service: &'static str,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        Self::Transport {
            service,
            source: source.into(),
        }
    }

    pub fn shape(service: &'static str, detail: impl Into<String>) -> Self {
        Self::Shape {
            service,
            detail: detail.into(),
        }
    }

    pub fn xml(service: &'static str, detail: impl Into<String>) -> Self {
        Self::Xml {
            service,
            detail: detail.into(),
        }
    }

    /// Short label for logs and metrics.
    pub fn category(&self) -> &'static str {
        match self {
            Self::Transport { .. } => "transport",
            Self::Auth { .. } => "auth",
            Self::Shape { .. } => "shape",
            Self::Xml { .. } => "xml",
        }
    }
}

/// Handler-level error; the only thing the HTTP layer knows how to fail with.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Upstream(#[from] UpstreamError),

    #[error("internal error: {0}")]
    Internal(String),
}

/// Error response body: `{"error": "..."}` per the frontend contract.
#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error) = match &self {
            ApiError::Upstream(e) => {
                tracing::warn!(category = e.category(), error = %e, "upstream failure");
                (StatusCode::BAD_GATEWAY, e.to_string())
            }
            ApiError::Internal(msg) => {
                tracing::error!(error = %msg, "internal error");
                // Internal detail stays in the logs.
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal server error".to_string(),
                )
            }
        };
        (status, Json(ErrorBody { error })).into_response()
    }
}
