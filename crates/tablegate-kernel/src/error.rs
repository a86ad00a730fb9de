//! Error types for `tablegate-kernel`.
//!
//! [`BackendError`] covers every failure a [`RecordBackend`](crate::backend::RecordBackend)
//! call can produce.  None of these variants carry field-level detail for the
//! caller: the HTTP layer answers all of them with an opaque `500` and logs
//! the cause.  Caller-input problems never reach a backend; they are reported
//! through [`ValidationFailures`](crate::validation::ValidationFailures).

use thiserror::Error;

/// Failure of a single backend operation.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum BackendError {
    // ── Transport ────────────────────────────────────────────────────────────
    /// The outbound request could not be built, sent, or its body read.
    #[error("transport error: {0}")]
    Transport(String),

    /// The remote body could not be decoded onto the expected response shape.
    #[error("failed to decode remote response: {0}")]
    Decode(String),

    /// The remote service answered with a non-success status.
    #[error("remote service returned status {status}: {message}")]
    Upstream { status: u16, message: String },

    // ── Call context ─────────────────────────────────────────────────────────
    /// The caller's cancellation token fired before the call completed.
    #[error("call cancelled")]
    Cancelled,

    /// The call context deadline elapsed before the call completed.
    #[error("call deadline exceeded")]
    DeadlineExceeded,

    // ── Capability ───────────────────────────────────────────────────────────
    /// The backend does not implement this operation.
    #[error("backend '{backend}' does not support {operation}")]
    Unsupported { backend: String, operation: String },

    /// The backend was constructed with unusable configuration.
    #[error("invalid backend configuration: {0}")]
    InvalidConfig(String),
}

impl BackendError {
    /// Shorthand for [`BackendError::Unsupported`].
    pub fn unsupported(backend: impl Into<String>, operation: impl Into<String>) -> Self {
        Self::Unsupported {
            backend: backend.into(),
            operation: operation.into(),
        }
    }
}

/// Result alias for backend operations.
pub type BackendResult<T> = Result<T, BackendError>;

/// Settings loading / validation error.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SettingsError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("settings parsing error: {0}")]
    Parse(String),

    #[error("unsupported settings format: {0}")]
    UnsupportedFormat(String),

    #[error("invalid setting '{key}': {reason}")]
    Invalid { key: String, reason: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unsupported_names_backend_and_operation() {
        let err = BackendError::unsupported("in-memory", "create");
        assert_eq!(err.to_string(), "backend 'in-memory' does not support create");
    }

    #[test]
    fn upstream_display_includes_status() {
        let err = BackendError::Upstream {
            status: 429,
            message: "rate limited".into(),
        };
        assert!(err.to_string().contains("429"));
    }
}
