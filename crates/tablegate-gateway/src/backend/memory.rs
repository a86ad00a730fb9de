//! In-memory [`RecordBackend`] implementation.
//!
//! Keeps tables in a process-local map keyed by `(base_id, table_id_or_name)`.
//! Suitable for local development and as a test double; nothing is
//! persisted across restarts.
//!
//! Offset tokens are the decimal index of the next record.  Formula
//! filtering is not evaluated: a request carrying `filterByFormula` fails
//! with [`BackendError::Unsupported`].

use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value;
use std::cmp::Ordering;
use std::collections::HashMap;
use tablegate_kernel::model::FieldMap;
use tablegate_kernel::{
    BackendError, BackendResult, CallContext, CreatePayload, CreateRecordsRequest,
    CreateRecordsResponse, DeleteRecordsRequest, DeleteRecordsResponse, DeletedRecord,
    ListRecordsRequest, ListRecordsResponse, Record, RecordBackend, Sort, SortDirection,
};
use tokio::sync::RwLock;
use uuid::Uuid;

type TableKey = (String, String);

/// [`RecordBackend`] backed by a `HashMap` of tables.
#[derive(Default)]
pub struct InMemoryBackend {
    tables: RwLock<HashMap<TableKey, Vec<Record>>>,
    read_only: bool,
}

impl InMemoryBackend {
    /// Create an empty, writable backend.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder: reject create and delete with [`BackendError::Unsupported`].
    pub fn read_only(mut self) -> Self {
        self.read_only = true;
        self
    }

    /// Builder: seed a table.
    pub fn with_records(
        mut self,
        base_id: impl Into<String>,
        table_id_or_name: impl Into<String>,
        records: Vec<Record>,
    ) -> Self {
        self.tables
            .get_mut()
            .insert((base_id.into(), table_id_or_name.into()), records);
        self
    }

    /// Number of records currently stored in a table.
    pub async fn len(&self, base_id: &str, table_id_or_name: &str) -> usize {
        self.tables
            .read()
            .await
            .get(&(base_id.to_string(), table_id_or_name.to_string()))
            .map_or(0, Vec::len)
    }

    fn ensure_writable(&self, operation: &str) -> BackendResult<()> {
        if self.read_only {
            return Err(BackendError::unsupported(self.name(), operation));
        }
        Ok(())
    }
}

fn new_record(fields: FieldMap) -> Record {
    let id = Uuid::new_v4().simple().to_string();
    Record {
        id: format!("rec{}", &id[..14]),
        created_time: Utc::now(),
        fields,
        comment_count: None,
    }
}

/// Batch elements use the `{"fields": {...}}` wrapper of the remote API; a
/// bare map is taken as the field map itself.
fn batch_fields(mut element: FieldMap) -> FieldMap {
    match element.remove("fields") {
        Some(Value::Object(fields)) => fields,
        Some(other) => {
            element.insert("fields".to_string(), other);
            element
        }
        None => element,
    }
}

/// Total order over JSON cell values: missing < null < bool < number < string
/// < anything else (compared by its JSON text).
fn compare_cells(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    fn rank(v: Option<&Value>) -> u8 {
        match v {
            None => 0,
            Some(Value::Null) => 1,
            Some(Value::Bool(_)) => 2,
            Some(Value::Number(_)) => 3,
            Some(Value::String(_)) => 4,
            Some(_) => 5,
        }
    }

    match (a, b) {
        (Some(Value::Bool(x)), Some(Value::Bool(y))) => x.cmp(y),
        (Some(Value::Number(x)), Some(Value::Number(y))) => {
            let (x, y) = (x.as_f64().unwrap_or(0.0), y.as_f64().unwrap_or(0.0));
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
        (Some(x), Some(y)) if rank(a) == rank(b) => x.to_string().cmp(&y.to_string()),
        _ => rank(a).cmp(&rank(b)),
    }
}

fn sort_records(records: &mut [Record], sort: &[Sort]) {
    records.sort_by(|a, b| {
        sort.iter()
            .map(|entry| {
                let ord = compare_cells(a.fields.get(&entry.field), b.fields.get(&entry.field));
                match entry.direction {
                    SortDirection::Ascending => ord,
                    SortDirection::Descending => ord.reverse(),
                }
            })
            .find(|ord| ord.is_ne())
            .unwrap_or(Ordering::Equal)
    });
}

#[async_trait]
impl RecordBackend for InMemoryBackend {
    fn name(&self) -> &str {
        "in-memory"
    }

    async fn list(
        &self,
        ctx: &CallContext,
        request: ListRecordsRequest,
    ) -> BackendResult<ListRecordsResponse> {
        if !request.filter_by_formula.is_empty() {
            return Err(BackendError::unsupported(self.name(), "filterByFormula"));
        }
        if ctx.is_cancelled() {
            return Err(BackendError::Cancelled);
        }

        let mut records = self
            .tables
            .read()
            .await
            .get(&(request.base_id.clone(), request.table_id_or_name.clone()))
            .cloned()
            .unwrap_or_default();

        sort_records(&mut records, &request.sort);
        if let Ok(max) = usize::try_from(request.max_records) {
            records.truncate(max);
        }

        let start: usize = if request.offset.is_empty() {
            0
        } else {
            request
                .offset
                .parse()
                .map_err(|_| BackendError::Decode(format!("invalid offset '{}'", request.offset)))?
        };
        let page_size = usize::try_from(request.page_size)
            .ok()
            .filter(|n| *n > 0)
            .unwrap_or(ListRecordsRequest::DEFAULT_PAGE_SIZE as usize);
        let end = start.saturating_add(page_size).min(records.len());
        let offset = if end < records.len() {
            end.to_string()
        } else {
            String::new()
        };

        let with_comments = request.record_metadata.iter().any(|m| m == "commentCount");
        let page = records
            .into_iter()
            .skip(start)
            .take(end.saturating_sub(start))
            .map(|mut record| {
                if !request.fields.is_empty() {
                    record.fields.retain(|name, _| request.fields.contains(name));
                }
                let comments = record.comment_count.unwrap_or(0);
                record.comment_count = with_comments.then_some(comments);
                record
            })
            .collect();

        Ok(ListRecordsResponse {
            offset,
            records: page,
        })
    }

    async fn create(
        &self,
        ctx: &CallContext,
        request: CreateRecordsRequest,
    ) -> BackendResult<CreateRecordsResponse> {
        self.ensure_writable("create")?;
        if ctx.is_cancelled() {
            return Err(BackendError::Cancelled);
        }

        let key = (request.base_id, request.table_id_or_name);
        let mut tables = self.tables.write().await;
        let table = tables.entry(key).or_default();

        let response = match request.payload {
            CreatePayload::Single(fields) => {
                let record = new_record(fields);
                table.push(record.clone());
                CreateRecordsResponse::Single(record)
            }
            CreatePayload::Multiple(elements) => {
                let records: Vec<Record> = elements
                    .into_iter()
                    .map(|element| new_record(batch_fields(element)))
                    .collect();
                table.extend(records.iter().cloned());
                CreateRecordsResponse::Multiple { records }
            }
        };
        Ok(response)
    }

    async fn delete_multiple(
        &self,
        ctx: &CallContext,
        request: DeleteRecordsRequest,
    ) -> BackendResult<DeleteRecordsResponse> {
        self.ensure_writable("delete")?;
        if ctx.is_cancelled() {
            return Err(BackendError::Cancelled);
        }

        let key = (request.base_id, request.table_id_or_name);
        let mut tables = self.tables.write().await;
        let mut table = tables.get_mut(&key);

        let records = request
            .record_ids
            .into_iter()
            .map(|id| {
                let deleted = table.as_deref_mut().is_some_and(|table| {
                    let before = table.len();
                    table.retain(|record| record.id != id);
                    table.len() < before
                });
                DeletedRecord { id, deleted }
            })
            .collect();
        Ok(DeleteRecordsResponse { records })
    }
}
