//! Gateway error types

use crate::respond;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use tablegate_kernel::{BackendError, ValidationFailures};
use thiserror::Error;
use tracing::error;

/// Caller-facing errors raised by the record handlers.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Caller input failed validation; nothing was sent to the backend.
    #[error("{message}")]
    BadRequest {
        message: &'static str,
        failures: ValidationFailures,
    },

    /// The backend call failed.  The cause is logged, never returned.
    #[error("{message}: {source}")]
    Backend {
        message: &'static str,
        request_id: String,
        #[source]
        source: BackendError,
    },
}

impl ApiError {
    pub fn bad_request(message: &'static str, failures: ValidationFailures) -> Self {
        Self::BadRequest { message, failures }
    }

    pub fn backend(
        message: &'static str,
        request_id: impl Into<String>,
        source: BackendError,
    ) -> Self {
        Self::Backend {
            message,
            request_id: request_id.into(),
            source,
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest { .. } => StatusCode::BAD_REQUEST,
            Self::Backend { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match &self {
            Self::BadRequest { message, failures } => respond::bad_request(message, failures),
            Self::Backend {
                message,
                request_id,
                source,
            } => {
                error!(request_id = %request_id, error = %source, "{message}");
                respond::error(message, self.status())
            }
        }
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
