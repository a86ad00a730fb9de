//! Shared application state for the record handlers

use std::sync::Arc;
use std::time::Duration;
use tablegate_kernel::{CallContext, RecordBackend};
use tokio_util::sync::{CancellationToken, DropGuard};
use uuid::Uuid;

/// State shared across all request handlers.  Immutable after startup.
#[derive(Clone)]
pub struct AppState {
    /// Backend every record operation is forwarded to
    pub backend: Arc<dyn RecordBackend>,
    /// Deadline applied to each backend call; zero disables it
    pub request_timeout: Duration,
}

impl AppState {
    pub fn new(backend: Arc<dyn RecordBackend>, request_timeout: Duration) -> Self {
        Self {
            backend,
            request_timeout,
        }
    }

    /// Build the call context for one inbound request.
    ///
    /// The returned guard cancels the context when dropped, so a handler
    /// future dropped on client disconnect aborts its backend call.
    pub fn call_context(&self) -> (CallContext, DropGuard) {
        let token = CancellationToken::new();
        let ctx = CallContext::new(Uuid::new_v4().to_string())
            .with_cancellation(token.clone())
            .with_timeout(self.request_timeout);
        (ctx, token.drop_guard())
    }
}
