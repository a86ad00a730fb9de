//! `tablegate-kernel`: translation core of the tablegate record gateway.
//!
//! This crate defines the *typed record model, the query codec and the backend
//! contract*.  No HTTP server or HTTP client lives here; those belong in
//! `tablegate-gateway`.
//!
//! # Architecture mapping
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │              tablegate-kernel  (this crate)                 │
//! │  QueryPairs + codec      ListRecordsRequest / Create / Del  │
//! │  ValidationFailures      RecordBackend trait + CallContext  │
//! │  BackendError            GatewaySettings loader             │
//! └──────────────────────────┬──────────────────────────────────┘
//!                            │  depends on
//! ┌──────────────────────────▼──────────────────────────────────┐
//! │              tablegate-gateway  (runtime crate)             │
//! │  AirtableBackend (reqwest)   InMemoryBackend                │
//! │  respond::with_json          axum handlers + server         │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Quick start
//!
//! ```rust
//! use tablegate_kernel::codec::{decode_list_request, QueryPairs};
//! use tablegate_kernel::model::SortDirection;
//!
//! let query = QueryPairs::parse("sort[0][field]=Name&sort[0][direction]=desc&pageSize=20");
//! let (request, failures) = decode_list_request("app123", "Contacts", &query);
//!
//! assert!(failures.is_empty());
//! assert_eq!(request.page_size, 20);
//! assert_eq!(request.sort[0].direction, SortDirection::Descending);
//! ```

pub mod backend;
pub mod codec;
pub mod error;
pub mod model;
pub mod settings;
pub mod validation;

// ── Flat re-exports ────────────────────────────────────────────────────────

pub use backend::{CallContext, RecordBackend};
pub use codec::{QueryPairs, decode_list_request, encode_list_request};
pub use error::{BackendError, BackendResult, SettingsError};
pub use model::{
    CellFormat, CreatePayload, CreateRecordsRequest, CreateRecordsResponse, DeleteRecordsRequest,
    DeleteRecordsResponse, DeletedRecord, ListRecordsRequest, ListRecordsResponse, Record, Sort,
    SortDirection,
};
pub use settings::{BackendKind, CoordinatorSettings, GatewaySettings, RemoteSettings};
pub use validation::ValidationFailures;
