//! Request-scoped error responses.
//!
//! Nothing in here crashes the server: every variant maps to an HTTP
//! response for the one request that hit it. Startup-time failures take a
//! different path (stderr and a non-zero exit, see `main.rs`).

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

use crate::compiler::CompileError;

/// Error type for request handling.
#[derive(Debug, Error)]
pub enum ApiError {
    /// A required query parameter was not supplied.
    #[error("missing required query parameter: {0}")]
    MissingParam(&'static str),

    /// The request referenced an id no config was registered under.
    #[error("unknown config id: {0}")]
    UnknownConfig(String),

    /// The request asked for an input the config does not declare.
    #[error("config {id} declares no input named {name:?}")]
    UnknownInput { id: String, name: String },

    /// No successful compilation has recorded a source map yet.
    #[error("no source map recorded for config {0}; compile it first")]
    SourceMapAbsent(String),

    /// The compiler collaborator failed.
    #[error(transparent)]
    Compile(#[from] CompileError),

    /// Anything else; details stay in the log.
    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::MissingParam(_) => StatusCode::BAD_REQUEST,
            ApiError::UnknownConfig(_)
            | ApiError::UnknownInput { .. }
            | ApiError::SourceMapAbsent(_) => StatusCode::NOT_FOUND,
            ApiError::Compile(CompileError::Failed(_)) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Compile(CompileError::Timeout(_)) => StatusCode::GATEWAY_TIMEOUT,
            ApiError::Compile(_) | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(status = %status, error = %self, "Request failed");
        } else {
            tracing::debug!(status = %status, error = %self, "Request rejected");
        }
        (status, self.to_string()).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::Diagnostic;
    use std::time::Duration;

    #[test]
    fn test_status_mapping() {
        assert_eq!(ApiError::MissingParam("id").status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            ApiError::UnknownConfig("x".into()).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::Compile(CompileError::Failed(vec![Diagnostic::message("boom")])).status(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            ApiError::Compile(CompileError::Timeout(Duration::from_secs(1))).status(),
            StatusCode::GATEWAY_TIMEOUT
        );
    }
}
