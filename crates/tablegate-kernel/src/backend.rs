//! Backend contract.
//!
//! [`RecordBackend`] is the single seam between the translation layer and
//! whatever actually stores the records: the remote record service, a local
//! persistence engine, or a test double.  Handlers only ever talk to
//! `Arc<dyn RecordBackend>`.
//!
//! Every operation is mandatory.  A backend that cannot serve one returns
//! [`BackendError::Unsupported`] instead of leaving it out.  The contract
//! promises nothing about idempotency, retries or rate limiting.

use crate::error::{BackendError, BackendResult};
use crate::model::{
    CreateRecordsRequest, CreateRecordsResponse, DeleteRecordsRequest, DeleteRecordsResponse,
    ListRecordsRequest, ListRecordsResponse,
};
use async_trait::async_trait;
use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

// ─────────────────────────────────────────────────────────────────────────────
// CallContext
// ─────────────────────────────────────────────────────────────────────────────

/// Execution context handed to every backend call.
///
/// Cancelling the token, or reaching the deadline, aborts the in-flight
/// operation: [`run`](Self::run) drops the backend future and returns a
/// failure instead of waiting.
#[derive(Debug, Clone)]
pub struct CallContext {
    request_id: String,
    cancel: CancellationToken,
    deadline: Option<Instant>,
}

impl CallContext {
    /// A context with a fresh cancellation token and no deadline.
    pub fn new(request_id: impl Into<String>) -> Self {
        Self {
            request_id: request_id.into(),
            cancel: CancellationToken::new(),
            deadline: None,
        }
    }

    /// Builder: share an existing cancellation token.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// Builder: set the deadline `timeout` from now.  A zero timeout leaves
    /// the context unbounded.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.deadline = (!timeout.is_zero()).then(|| Instant::now() + timeout);
        self
    }

    pub fn request_id(&self) -> &str {
        &self.request_id
    }

    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.cancel
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Drive `operation` to completion unless the context is cancelled or
    /// its deadline passes first.
    pub async fn run<F, T>(&self, operation: F) -> BackendResult<T>
    where
        F: Future<Output = BackendResult<T>>,
    {
        let deadline = async {
            match self.deadline {
                Some(at) => tokio::time::sleep_until(at).await,
                None => std::future::pending::<()>().await,
            }
        };

        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(BackendError::Cancelled),
            _ = deadline => Err(BackendError::DeadlineExceeded),
            result = operation => result,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// RecordBackend trait
// ─────────────────────────────────────────────────────────────────────────────

/// Capability interface every record store must provide.
///
/// Requests are taken by value: each one is built for exactly one call.
#[async_trait]
pub trait RecordBackend: Send + Sync {
    /// Stable name used in logs and [`BackendError::Unsupported`].
    fn name(&self) -> &str;

    /// Return one page of records.
    async fn list(
        &self,
        ctx: &CallContext,
        request: ListRecordsRequest,
    ) -> BackendResult<ListRecordsResponse>;

    /// Create one record or a batch, mirroring the payload cardinality in
    /// the response.
    async fn create(
        &self,
        ctx: &CallContext,
        request: CreateRecordsRequest,
    ) -> BackendResult<CreateRecordsResponse>;

    /// Delete the records named in the request.
    async fn delete_multiple(
        &self,
        ctx: &CallContext,
        request: DeleteRecordsRequest,
    ) -> BackendResult<DeleteRecordsResponse>;
}
