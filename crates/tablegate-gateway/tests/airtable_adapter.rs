//! Drives [`AirtableBackend`] against a stub remote bound to an ephemeral
//! port and checks what actually goes over the wire.

use axum::Router;
use axum::body::{Body, Bytes, to_bytes};
use axum::extract::State;
use axum::http::{HeaderMap, Method, Request, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use serde_json::{Value, json};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tablegate_gateway::backend::AirtableBackend;
use tablegate_gateway::server::build_router;
use tablegate_gateway::state::AppState;
use tablegate_kernel::codec::{QueryPairs, decode_list_request};
use tablegate_kernel::{
    BackendError, CallContext, CreateRecordsRequest, CreateRecordsResponse, DeleteRecordsRequest,
    RecordBackend,
};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower::ServiceExt;

#[derive(Debug, Clone)]
struct Captured {
    method: Method,
    path: String,
    query: QueryPairs,
    authorization: Option<String>,
    body: Bytes,
}

type Log = Arc<Mutex<Vec<Captured>>>;

const RECORD: &str = r#"{"id":"rec001","createdTime":"2024-01-01T00:00:00.000Z","fields":{"Name":"Ada"}}"#;

async fn remote(
    State(log): State<Log>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    log.lock().unwrap().push(Captured {
        method: method.clone(),
        path: uri.path().to_string(),
        query: QueryPairs::parse(uri.query().unwrap_or_default()),
        authorization: headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string),
        body,
    });

    match (method, uri.path()) {
        (_, "/v0/app1/Locked") => (
            StatusCode::UNPROCESSABLE_ENTITY,
            r#"{"error":{"type":"INVALID_PERMISSIONS"}}"#,
        )
            .into_response(),
        (_, "/v0/app1/Garbled") => (StatusCode::OK, "<html>").into_response(),
        (_, "/v0/app1/Slow") => {
            tokio::time::sleep(Duration::from_secs(30)).await;
            (StatusCode::OK, "{}").into_response()
        }
        (Method::GET, _) => (
            StatusCode::OK,
            format!(r#"{{"offset":"itr2/rec001","records":[{RECORD}]}}"#),
        )
            .into_response(),
        (Method::POST, _) => (StatusCode::OK, RECORD).into_response(),
        (Method::DELETE, _) => (
            StatusCode::OK,
            r#"{"records":[{"id":"rec001","deleted":true},{"id":"rec002","deleted":true}]}"#,
        )
            .into_response(),
        _ => StatusCode::METHOD_NOT_ALLOWED.into_response(),
    }
}

/// Spawn the stub remote; returns its `/v0` root and the request log.
async fn spawn_remote() -> (String, Log) {
    let log: Log = Arc::default();
    let app = Router::new().fallback(remote).with_state(log.clone());
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (format!("http://{addr}/v0"), log)
}

fn ctx() -> CallContext {
    CallContext::new("test-request").with_timeout(Duration::from_secs(5))
}

#[tokio::test]
async fn list_encodes_query_and_bearer_token() {
    let (base_url, log) = spawn_remote().await;
    let backend = AirtableBackend::new(&base_url, "pat-secret").unwrap();

    let (request, failures) = decode_list_request(
        "app1",
        "People",
        &QueryPairs::parse("sort[0][field]=Name&sort[0][direction]=desc&pageSize=20&view=Grid&fields=Name&fields=Age"),
    );
    assert!(failures.is_empty());

    let response = backend.list(&ctx(), request).await.unwrap();
    assert_eq!(response.offset, "itr2/rec001");
    assert_eq!(response.records.len(), 1);
    assert_eq!(response.records[0].fields["Name"], json!("Ada"));

    let captured = log.lock().unwrap()[0].clone();
    assert_eq!(captured.method, Method::GET);
    assert_eq!(captured.path, "/v0/app1/People");
    assert_eq!(captured.authorization.as_deref(), Some("Bearer pat-secret"));
    assert_eq!(captured.query.get("pageSize"), Some("20"));
    assert_eq!(captured.query.get("cellFormat"), Some("json"));
    assert_eq!(captured.query.get("view"), Some("Grid"));
    assert_eq!(captured.query.get("sort[0][field]"), Some("Name"));
    assert_eq!(captured.query.get("sort[0][direction]"), Some("desc"));
    assert_eq!(captured.query.get_all("fields"), vec!["Name", "Age"]);
    assert!(!captured.query.contains("maxRecords"));
    assert!(!captured.query.contains("returnFieldsByFieldId"));
}

#[tokio::test]
async fn table_name_is_path_escaped() {
    let (base_url, log) = spawn_remote().await;
    let backend = AirtableBackend::new(&base_url, "pat").unwrap();

    let (request, _) = decode_list_request("app1", "My Table", &QueryPairs::new());
    backend.list(&ctx(), request).await.unwrap();

    assert_eq!(log.lock().unwrap()[0].path, "/v0/app1/My%20Table");
}

#[tokio::test]
async fn create_sends_json_body() {
    let (base_url, log) = spawn_remote().await;
    let backend = AirtableBackend::new(&base_url, "pat").unwrap();

    let mut fields = serde_json::Map::new();
    fields.insert("Name".to_string(), json!("Ada"));
    let mut request = CreateRecordsRequest::single("app1", "People", fields);
    request.typecast = true;

    let response = backend.create(&ctx(), request).await.unwrap();
    assert!(matches!(response, CreateRecordsResponse::Single(ref r) if r.id == "rec001"));

    let captured = log.lock().unwrap()[0].clone();
    assert_eq!(captured.method, Method::POST);
    let body: Value = serde_json::from_slice(&captured.body).unwrap();
    assert_eq!(
        body,
        json!({
            "fields": { "Name": "Ada" },
            "returnFieldsByFieldId": false,
            "typecast": true
        })
    );
}

#[tokio::test]
async fn delete_sends_record_ids_as_query() {
    let (base_url, log) = spawn_remote().await;
    let backend = AirtableBackend::new(&base_url, "pat").unwrap();

    let request = DeleteRecordsRequest {
        base_id: "app1".to_string(),
        table_id_or_name: "People".to_string(),
        record_ids: vec!["rec001".to_string(), "rec002".to_string()],
    };
    let response = backend.delete_multiple(&ctx(), request).await.unwrap();
    assert_eq!(response.records.len(), 2);
    assert!(response.records.iter().all(|r| r.deleted));

    let captured = log.lock().unwrap()[0].clone();
    assert_eq!(captured.method, Method::DELETE);
    assert_eq!(captured.query.get_all("records[]"), vec!["rec001", "rec002"]);
}

#[tokio::test]
async fn non_success_status_is_upstream_error() {
    let (base_url, _log) = spawn_remote().await;
    let backend = AirtableBackend::new(&base_url, "pat").unwrap();

    let (request, _) = decode_list_request("app1", "Locked", &QueryPairs::new());
    let err = backend.list(&ctx(), request).await.unwrap_err();
    match err {
        BackendError::Upstream { status, message } => {
            assert_eq!(status, 422);
            assert!(message.contains("INVALID_PERMISSIONS"));
        }
        other => panic!("expected upstream error, got {other:?}"),
    }
}

#[tokio::test]
async fn undecodable_body_is_decode_error() {
    let (base_url, _log) = spawn_remote().await;
    let backend = AirtableBackend::new(&base_url, "pat").unwrap();

    let (request, _) = decode_list_request("app1", "Garbled", &QueryPairs::new());
    let err = backend.list(&ctx(), request).await.unwrap_err();
    assert!(matches!(err, BackendError::Decode(_)));
}

#[tokio::test]
async fn cancellation_aborts_in_flight_call() {
    let (base_url, _log) = spawn_remote().await;
    let backend = AirtableBackend::new(&base_url, "pat").unwrap();

    let token = CancellationToken::new();
    let ctx = CallContext::new("cancelled").with_cancellation(token.clone());
    let canceller = token.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        canceller.cancel();
    });

    let (request, _) = decode_list_request("app1", "Slow", &QueryPairs::new());
    let err = backend.list(&ctx, request).await.unwrap_err();
    assert!(matches!(err, BackendError::Cancelled));
}

#[tokio::test]
async fn deadline_aborts_slow_remote() {
    let (base_url, _log) = spawn_remote().await;
    let backend = AirtableBackend::new(&base_url, "pat").unwrap();

    let ctx = CallContext::new("slow").with_timeout(Duration::from_millis(50));
    let (request, _) = decode_list_request("app1", "Slow", &QueryPairs::new());
    let err = backend.list(&ctx, request).await.unwrap_err();
    assert!(matches!(err, BackendError::DeadlineExceeded));
}

#[tokio::test]
async fn unreachable_remote_answers_500_through_router() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let backend = AirtableBackend::new(&format!("http://{addr}/v0"), "pat").unwrap();
    let app = build_router(AppState::new(Arc::new(backend), Duration::from_secs(5)));

    let response = app
        .oneshot(
            Request::builder()
                .uri("/app1/People")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body, json!({ "error": "failed to list records", "status": 500 }));
}
