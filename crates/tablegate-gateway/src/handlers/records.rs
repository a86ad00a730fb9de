//! Record endpoints
//!
//! GET    /{baseID}/{tableIDOrName}  - list one page of records
//! POST   /{baseID}/{tableIDOrName}  - create one record or a batch
//! DELETE /{baseID}/{tableIDOrName}  - delete records named by `records[]`
//!
//! `/{baseID}/` (empty table segment) reaches the same handlers so that the
//! missing identifier is reported as a validation failure instead of a 404.

use axum::{
    Router,
    body::Bytes,
    extract::{Path, RawQuery, State},
    http::StatusCode,
    response::Response,
    routing::get,
};
use serde::Deserialize;
use tablegate_kernel::codec::{QueryPairs, decode_delete_request, decode_list_request};
use tablegate_kernel::{CreatePayload, CreateRecordsRequest};
use tracing::{debug, info};

use crate::error::{ApiError, ApiResult};
use crate::respond;
use crate::state::AppState;

/// Path identifiers of a record table.
#[derive(Debug, Deserialize)]
pub struct TablePath {
    pub base_id: String,
    #[serde(default)]
    pub table_id_or_name: String,
}

fn query_pairs(raw: Option<String>) -> QueryPairs {
    QueryPairs::parse(raw.as_deref().unwrap_or_default())
}

/// GET /{baseID}/{tableIDOrName}
pub async fn list_records(
    State(state): State<AppState>,
    Path(path): Path<TablePath>,
    RawQuery(raw): RawQuery,
) -> ApiResult<Response> {
    let query = query_pairs(raw);
    let (request, failures) = decode_list_request(&path.base_id, &path.table_id_or_name, &query);
    if !failures.is_empty() {
        return Err(ApiError::bad_request("failed to evaluate query strings", failures));
    }

    let (ctx, _cancel_on_drop) = state.call_context();
    debug!(
        request_id = %ctx.request_id(),
        backend = state.backend.name(),
        base_id = %request.base_id,
        table = %request.table_id_or_name,
        "listing records"
    );

    let response = state
        .backend
        .list(&ctx, request)
        .await
        .map_err(|e| ApiError::backend("failed to list records", ctx.request_id(), e))?;

    Ok(respond::with_json(&response, StatusCode::OK))
}

/// POST /{baseID}/{tableIDOrName}
pub async fn create_records(
    State(state): State<AppState>,
    Path(path): Path<TablePath>,
    body: Bytes,
) -> ApiResult<Response> {
    let (request, failures) =
        CreateRecordsRequest::decode(&path.base_id, &path.table_id_or_name, &body);
    if !failures.is_empty() {
        return Err(ApiError::bad_request("bad request", failures));
    }

    let (ctx, _cancel_on_drop) = state.call_context();
    let count = match &request.payload {
        CreatePayload::Single(_) => 1,
        CreatePayload::Multiple(records) => records.len(),
    };

    let response = state
        .backend
        .create(&ctx, request)
        .await
        .map_err(|e| ApiError::backend("failed to create records", ctx.request_id(), e))?;

    info!(
        request_id = %ctx.request_id(),
        base_id = %path.base_id,
        table = %path.table_id_or_name,
        count,
        "records created"
    );
    Ok(respond::with_json(&response, StatusCode::OK))
}

/// DELETE /{baseID}/{tableIDOrName}
pub async fn delete_records(
    State(state): State<AppState>,
    Path(path): Path<TablePath>,
    RawQuery(raw): RawQuery,
) -> ApiResult<Response> {
    let query = query_pairs(raw);
    let (request, failures) =
        decode_delete_request(&path.base_id, &path.table_id_or_name, &query);
    if !failures.is_empty() {
        return Err(ApiError::bad_request("bad request", failures));
    }

    let (ctx, _cancel_on_drop) = state.call_context();
    let response = state
        .backend
        .delete_multiple(&ctx, request)
        .await
        .map_err(|e| ApiError::backend("failed to delete records", ctx.request_id(), e))?;

    info!(
        request_id = %ctx.request_id(),
        base_id = %path.base_id,
        table = %path.table_id_or_name,
        count = response.records.len(),
        "records deleted"
    );
    Ok(respond::with_json(&response, StatusCode::OK))
}

/// Build the records router sub-tree
pub fn records_router() -> Router<AppState> {
    Router::new()
        .route(
            "/{base_id}/{table_id_or_name}",
            get(list_records).post(create_records).delete(delete_records),
        )
        .route(
            "/{base_id}/",
            get(list_records).post(create_records).delete(delete_records),
        )
}
