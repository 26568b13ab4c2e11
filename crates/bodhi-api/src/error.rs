//! HTTP error mapping.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

/// Handler error rendered as `(status, {"error": message})`.
///
/// Backend failures carry a fixed, caller-facing message; the underlying
/// error is logged and never returned.
#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    Forbidden(String),
    Backend {
        message: &'static str,
        source: bodhi_core::Error,
    },
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        ApiError::BadRequest(message.into())
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        ApiError::Forbidden(message.into())
    }

    /// Adapter for `map_err`: wrap a backend error under a public message.
    pub fn backend(message: &'static str) -> impl FnOnce(bodhi_core::Error) -> Self {
        move |source| ApiError::Backend { message, source }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::Backend { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match self {
            ApiError::BadRequest(msg) | ApiError::Forbidden(msg) => msg,
            ApiError::Backend { message, source } => {
                tracing::error!(
                    subsystem = "api",
                    error = %source,
                    "{}",
                    message
                );
                message.to_string()
            }
        };

        (status, Json(serde_json::json!({ "error": message }))).into_response()
    }
}
