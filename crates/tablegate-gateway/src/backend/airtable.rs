//! Airtable-compatible remote backend.
//!
//! [`AirtableBackend`] maps each typed request onto exactly one call against
//! the remote REST API (`{base_url}/{baseID}/{tableIDOrName}`) and decodes
//! the JSON body back onto the typed response.  The bearer token is backend
//! configuration; it never comes from the inbound request.
//!
//! No retries, no backoff.  The only bound on a call is the
//! [`CallContext`] deadline and cancellation token.

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Url, header};
use serde::de::DeserializeOwned;
use tablegate_kernel::codec::{QueryPairs, encode_delete_request, encode_list_request};
use tablegate_kernel::{
    BackendError, BackendResult, CallContext, CreateRecordsRequest, CreateRecordsResponse,
    DeleteRecordsRequest, DeleteRecordsResponse, ListRecordsRequest, ListRecordsResponse,
    RecordBackend, RemoteSettings,
};
use tracing::{debug, instrument, warn};

/// Backend that proxies record operations to an Airtable-style REST API.
pub struct AirtableBackend {
    base_url: Url,
    api_key: String,
    client: Client,
}

impl AirtableBackend {
    /// Create a backend for `base_url` (e.g. `https://api.airtable.com/v0`)
    /// authenticating with `api_key`.
    pub fn new(base_url: &str, api_key: impl Into<String>) -> BackendResult<Self> {
        Self::with_client(Client::new(), base_url, api_key)
    }

    /// Like [`new`](Self::new) with a caller-supplied reqwest client.
    pub fn with_client(
        client: Client,
        base_url: &str,
        api_key: impl Into<String>,
    ) -> BackendResult<Self> {
        let base_url = Url::parse(base_url)
            .map_err(|e| BackendError::InvalidConfig(format!("base url '{base_url}': {e}")))?;
        if base_url.cannot_be_a_base() {
            return Err(BackendError::InvalidConfig(format!(
                "base url '{base_url}' cannot carry path segments"
            )));
        }
        Ok(Self {
            base_url,
            api_key: api_key.into(),
            client,
        })
    }

    pub fn from_settings(settings: &RemoteSettings) -> BackendResult<Self> {
        Self::new(&settings.base_url, settings.api_key.clone())
    }

    /// `{base_url}/{base_id}/{table_id_or_name}` with both identifiers
    /// path-escaped.
    pub fn table_url(&self, base_id: &str, table_id_or_name: &str) -> BackendResult<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| BackendError::InvalidConfig("base url cannot carry path segments".into()))?
            .pop_if_empty()
            .push(base_id)
            .push(table_id_or_name);
        Ok(url)
    }

    fn request(&self, method: Method, mut url: Url, query: &QueryPairs) -> RequestBuilder {
        if !query.is_empty() {
            url.query_pairs_mut().extend_pairs(query.iter());
        }
        debug!(method = %method, url = %url, "sending request");
        self.client
            .request(method, url)
            .bearer_auth(&self.api_key)
    }

    /// Send, reject non-success statuses, decode the body onto `T`.
    async fn send<T: DeserializeOwned>(&self, builder: RequestBuilder) -> BackendResult<T> {
        let response = builder
            .send()
            .await
            .map_err(|e| BackendError::Transport(e.to_string()))?;
        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|e| BackendError::Transport(e.to_string()))?;

        debug!(status = status.as_u16(), bytes = body.len(), "received response");

        if !status.is_success() {
            let message = String::from_utf8_lossy(&body).into_owned();
            warn!(status = status.as_u16(), body = %message, "remote service rejected request");
            return Err(BackendError::Upstream {
                status: status.as_u16(),
                message,
            });
        }

        serde_json::from_slice(&body).map_err(|e| BackendError::Decode(e.to_string()))
    }
}

#[async_trait]
impl RecordBackend for AirtableBackend {
    fn name(&self) -> &str {
        "airtable"
    }

    #[instrument(skip(self, ctx, request), fields(request_id = %ctx.request_id(), base_id = %request.base_id, table = %request.table_id_or_name))]
    async fn list(
        &self,
        ctx: &CallContext,
        request: ListRecordsRequest,
    ) -> BackendResult<ListRecordsResponse> {
        let url = self.table_url(&request.base_id, &request.table_id_or_name)?;
        let query = encode_list_request(&request);
        let builder = self.request(Method::GET, url, &query);
        ctx.run(self.send(builder)).await
    }

    #[instrument(skip(self, ctx, request), fields(request_id = %ctx.request_id(), base_id = %request.base_id, table = %request.table_id_or_name))]
    async fn create(
        &self,
        ctx: &CallContext,
        request: CreateRecordsRequest,
    ) -> BackendResult<CreateRecordsResponse> {
        let url = self.table_url(&request.base_id, &request.table_id_or_name)?;
        let body = serde_json::to_vec(&request)
            .map_err(|e| BackendError::Transport(format!("failed to encode body: {e}")))?;
        debug!(body = %String::from_utf8_lossy(&body), "create body");
        let builder = self
            .request(Method::POST, url, &QueryPairs::new())
            .header(header::CONTENT_TYPE, "application/json")
            .body(body);
        ctx.run(self.send(builder)).await
    }

    #[instrument(skip(self, ctx, request), fields(request_id = %ctx.request_id(), base_id = %request.base_id, table = %request.table_id_or_name))]
    async fn delete_multiple(
        &self,
        ctx: &CallContext,
        request: DeleteRecordsRequest,
    ) -> BackendResult<DeleteRecordsResponse> {
        let url = self.table_url(&request.base_id, &request.table_id_or_name)?;
        let query = encode_delete_request(&request);
        let builder = self.request(Method::DELETE, url, &query);
        ctx.run(self.send(builder)).await
    }
}
