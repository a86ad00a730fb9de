//! Typed record requests and responses.
//!
//! The wire vocabulary (camelCase keys, `asc`/`desc`, `json`/`string`) matches
//! the remote record service so the same types serialize onto both the
//! inbound and outbound HTTP surfaces.

use crate::validation::ValidationFailures;
use chrono::{DateTime, Utc};
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value};

/// Open field-name (or field-id) → value mapping of a record.
pub type FieldMap = Map<String, Value>;

// ─────────────────────────────────────────────────────────────────────────────
// Enumerations
// ─────────────────────────────────────────────────────────────────────────────

/// Sort direction for one [`Sort`] entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SortDirection {
    #[default]
    #[serde(rename = "asc")]
    Ascending,
    #[serde(rename = "desc")]
    Descending,
}

impl SortDirection {
    /// Total parse: `"desc"` is descending, everything else ascending.
    pub fn parse(raw: &str) -> Self {
        match raw {
            "desc" => Self::Descending,
            _ => Self::Ascending,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ascending => "asc",
            Self::Descending => "desc",
        }
    }
}

/// Encoding of cell values in list responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CellFormat {
    #[default]
    Json,
    String,
}

impl CellFormat {
    /// Total parse: unrecognized or absent input falls back to [`CellFormat::Json`].
    pub fn parse(raw: &str) -> Self {
        match raw {
            "string" => Self::String,
            _ => Self::Json,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::String => "string",
        }
    }
}

/// One entry of a sort specification.  Position in the enclosing `Vec`
/// is the sort priority.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sort {
    pub field: String,
    #[serde(default)]
    pub direction: SortDirection,
}

impl Sort {
    pub fn new(field: impl Into<String>, direction: SortDirection) -> Self {
        Self {
            field: field.into(),
            direction,
        }
    }

    pub fn ascending(field: impl Into<String>) -> Self {
        Self::new(field, SortDirection::Ascending)
    }

    pub fn descending(field: impl Into<String>) -> Self {
        Self::new(field, SortDirection::Descending)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Record
// ─────────────────────────────────────────────────────────────────────────────

/// A single row of a remote table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Record {
    pub id: String,
    pub created_time: DateTime<Utc>,
    #[serde(default)]
    pub fields: FieldMap,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment_count: Option<u64>,
}

// ─────────────────────────────────────────────────────────────────────────────
// List
// ─────────────────────────────────────────────────────────────────────────────

/// Typed input of the list operation.
///
/// Built once per inbound call by
/// [`decode_list_request`](crate::codec::decode_list_request); `page_size`
/// and `max_records` are always concrete after decoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListRecordsRequest {
    // Path parameters
    pub base_id: String,
    pub table_id_or_name: String,

    // Query parameters
    pub time_zone: String,
    pub user_locale: String,
    pub page_size: i64,
    /// [`Self::UNBOUNDED`] means no limit.
    pub max_records: i64,
    pub offset: String,
    pub view: String,
    pub sort: Vec<Sort>,
    pub filter_by_formula: String,
    pub cell_format: CellFormat,
    pub fields: Vec<String>,
    pub return_fields_by_field_id: bool,
    pub record_metadata: Vec<String>,
}

impl ListRecordsRequest {
    pub const DEFAULT_PAGE_SIZE: i64 = 100;
    pub const UNBOUNDED: i64 = -1;

    /// A request for `base_id`/`table_id_or_name` with every query
    /// parameter at its default.
    pub fn new(base_id: impl Into<String>, table_id_or_name: impl Into<String>) -> Self {
        Self {
            base_id: base_id.into(),
            table_id_or_name: table_id_or_name.into(),
            time_zone: String::new(),
            user_locale: String::new(),
            page_size: Self::DEFAULT_PAGE_SIZE,
            max_records: Self::UNBOUNDED,
            offset: String::new(),
            view: String::new(),
            sort: Vec::new(),
            filter_by_formula: String::new(),
            cell_format: CellFormat::Json,
            fields: Vec::new(),
            return_fields_by_field_id: false,
            record_metadata: Vec::new(),
        }
    }
}

/// One page of records.  `offset` is empty on the last page.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ListRecordsResponse {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub offset: String,
    #[serde(default)]
    pub records: Vec<Record>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Create
// ─────────────────────────────────────────────────────────────────────────────

/// Body of a create call: one record or many.
#[derive(Debug, Clone, PartialEq)]
pub enum CreatePayload {
    /// `{"fields": {...}}`
    Single(FieldMap),
    /// `{"records": [{...}, ...]}`; each element is forwarded verbatim.
    Multiple(Vec<FieldMap>),
}

impl Default for CreatePayload {
    fn default() -> Self {
        Self::Single(FieldMap::new())
    }
}

/// Typed input of the create operation.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CreateRecordsRequest {
    // Path parameters
    pub base_id: String,
    pub table_id_or_name: String,

    // Body parameters
    pub payload: CreatePayload,
    pub return_fields_by_field_id: bool,
    pub typecast: bool,
}

/// Raw body as it arrives on the wire, before the one-of check.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateRecordsBody {
    #[serde(default)]
    fields: Option<FieldMap>,
    #[serde(default)]
    records: Option<Vec<FieldMap>>,
    #[serde(default)]
    return_fields_by_field_id: bool,
    #[serde(default)]
    typecast: bool,
}

impl CreateRecordsRequest {
    pub fn single(
        base_id: impl Into<String>,
        table_id_or_name: impl Into<String>,
        fields: FieldMap,
    ) -> Self {
        Self {
            base_id: base_id.into(),
            table_id_or_name: table_id_or_name.into(),
            payload: CreatePayload::Single(fields),
            ..Self::default()
        }
    }

    pub fn multiple(
        base_id: impl Into<String>,
        table_id_or_name: impl Into<String>,
        records: Vec<FieldMap>,
    ) -> Self {
        Self {
            base_id: base_id.into(),
            table_id_or_name: table_id_or_name.into(),
            payload: CreatePayload::Multiple(records),
            ..Self::default()
        }
    }

    /// Decode path identifiers and a JSON body.
    ///
    /// Every failure is recorded: missing `baseID`, missing `tableIDOrName`,
    /// and an undecodable or ambiguous `body` can all be reported together.
    /// When failures are present the returned request is partial and must
    /// not be forwarded.
    pub fn decode(
        base_id: &str,
        table_id_or_name: &str,
        body: &[u8],
    ) -> (Self, ValidationFailures) {
        let mut failures = ValidationFailures::new();
        failures.require_non_empty("baseID", base_id);
        failures.require_non_empty("tableIDOrName", table_id_or_name);

        let mut request = Self {
            base_id: base_id.to_string(),
            table_id_or_name: table_id_or_name.to_string(),
            ..Self::default()
        };

        let raw: CreateRecordsBody = match serde_json::from_slice(body) {
            Ok(raw) => raw,
            Err(_) => {
                failures.record("body", "invalid json");
                return (request, failures);
            }
        };

        request.return_fields_by_field_id = raw.return_fields_by_field_id;
        request.typecast = raw.typecast;
        match (raw.fields, raw.records) {
            (Some(fields), None) => request.payload = CreatePayload::Single(fields),
            (None, Some(records)) => request.payload = CreatePayload::Multiple(records),
            _ => failures.record("body", "exactly one of fields or records must be provided"),
        }

        (request, failures)
    }
}

/// Serializes the outbound body only; path identifiers travel in the URL.
impl Serialize for CreateRecordsRequest {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(3))?;
        match &self.payload {
            CreatePayload::Single(fields) => map.serialize_entry("fields", fields)?,
            CreatePayload::Multiple(records) => map.serialize_entry("records", records)?,
        }
        map.serialize_entry("returnFieldsByFieldId", &self.return_fields_by_field_id)?;
        map.serialize_entry("typecast", &self.typecast)?;
        map.end()
    }
}

/// Result of a create call, mirroring the request's cardinality.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CreateRecordsResponse {
    Multiple { records: Vec<Record> },
    Single(Record),
}

// ─────────────────────────────────────────────────────────────────────────────
// Delete
// ─────────────────────────────────────────────────────────────────────────────

/// Typed input of the delete operation.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DeleteRecordsRequest {
    pub base_id: String,
    pub table_id_or_name: String,
    pub record_ids: Vec<String>,
}

/// One entry of a deletion confirmation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeletedRecord {
    pub id: String,
    #[serde(default)]
    pub deleted: bool,
}

/// Deletion confirmation returned by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DeleteRecordsResponse {
    #[serde(default)]
    pub records: Vec<DeletedRecord>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn unrecognized_cell_format_falls_back_to_json() {
        assert_eq!(CellFormat::parse("xml"), CellFormat::Json);
        assert_eq!(CellFormat::parse(""), CellFormat::Json);
        assert_eq!(CellFormat::parse("string"), CellFormat::String);
    }

    #[test]
    fn sort_direction_defaults_to_ascending() {
        assert_eq!(SortDirection::parse("desc"), SortDirection::Descending);
        assert_eq!(SortDirection::parse("DESC"), SortDirection::Ascending);
        assert_eq!(SortDirection::parse(""), SortDirection::Ascending);
    }

    #[test]
    fn decode_single_record_body() {
        let (req, failures) =
            CreateRecordsRequest::decode("base1", "table1", br#"{"fields": {"Name": "x"}}"#);
        assert!(failures.is_empty());
        assert_eq!(req.base_id, "base1");
        assert_eq!(req.table_id_or_name, "table1");
        match req.payload {
            CreatePayload::Single(fields) => assert_eq!(fields["Name"], json!("x")),
            other => panic!("expected single payload, got {other:?}"),
        }
    }

    #[test]
    fn decode_multi_record_body_with_flags() {
        let body = br#"{"records": [{"fields": {"a": 1}}, {"fields": {"a": 2}}], "typecast": true, "returnFieldsByFieldId": true}"#;
        let (req, failures) = CreateRecordsRequest::decode("b", "t", body);
        assert!(failures.is_empty());
        assert!(req.typecast);
        assert!(req.return_fields_by_field_id);
        assert!(matches!(req.payload, CreatePayload::Multiple(ref r) if r.len() == 2));
    }

    #[test]
    fn empty_table_fails_even_with_valid_body() {
        let (_, failures) = CreateRecordsRequest::decode("base1", "", br#"{"fields": {}}"#);
        assert_eq!(failures.len(), 1);
        assert!(failures.contains("tableIDOrName"));
    }

    #[test]
    fn path_and_body_failures_accumulate() {
        let (_, failures) = CreateRecordsRequest::decode("", "", b"{not json");
        assert!(failures.contains("baseID"));
        assert!(failures.contains("tableIDOrName"));
        assert_eq!(failures.reason("body"), Some("invalid json"));
    }

    #[test]
    fn body_must_carry_exactly_one_form() {
        let (_, neither) = CreateRecordsRequest::decode("b", "t", br#"{"typecast": true}"#);
        assert!(neither.contains("body"));

        let (_, both) =
            CreateRecordsRequest::decode("b", "t", br#"{"fields": {}, "records": []}"#);
        assert!(both.contains("body"));
    }

    #[test]
    fn create_request_serializes_body_only() {
        let mut fields = FieldMap::new();
        fields.insert("Name".into(), json!("x"));
        let mut req = CreateRecordsRequest::single("base1", "table1", fields);
        req.typecast = true;

        let value = serde_json::to_value(&req).unwrap();
        assert_eq!(
            value,
            json!({ "fields": { "Name": "x" }, "returnFieldsByFieldId": false, "typecast": true })
        );
    }

    #[test]
    fn create_response_accepts_both_shapes() {
        let single: CreateRecordsResponse = serde_json::from_value(json!({
            "id": "rec1",
            "createdTime": "2024-01-02T03:04:05.000Z",
            "fields": { "Name": "x" }
        }))
        .unwrap();
        assert!(matches!(single, CreateRecordsResponse::Single(ref r) if r.id == "rec1"));

        let multiple: CreateRecordsResponse = serde_json::from_value(json!({
            "records": [
                { "id": "rec1", "createdTime": "2024-01-02T03:04:05.000Z", "fields": {} },
                { "id": "rec2", "createdTime": "2024-01-02T03:04:05.000Z", "fields": {} }
            ]
        }))
        .unwrap();
        assert!(matches!(multiple, CreateRecordsResponse::Multiple { ref records } if records.len() == 2));
    }

    #[test]
    fn list_response_omits_empty_offset() {
        let value = serde_json::to_value(ListRecordsResponse::default()).unwrap();
        assert_eq!(value, json!({ "records": [] }));
    }
}
