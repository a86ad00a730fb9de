//! Query-string codec.
//!
//! Decodes the loosely-typed query vocabulary of the record service into
//! typed requests and encodes typed requests back onto that vocabulary for
//! outbound calls.
//!
//! Two classes of parse helper exist and are kept apart on purpose:
//!
//! | Helper | Fails? | Used for |
//! |--------|--------|----------|
//! | [`parse_int_or`], [`CellFormat::parse`], [`SortDirection::parse`] | never | lenient fields that fall back to a default |
//! | [`parse_bool`] | yes (`None`) | strict fields that record a validation failure |
//!
//! The sort sub-language uses indexed bracket keys:
//!
//! ```text
//! sort[0][field]=Name
//! sort[0][direction]=desc
//! sort[1][field]=Age          → direction defaults to asc
//! ```

use crate::model::{
    CellFormat, DeleteRecordsRequest, ListRecordsRequest, Sort, SortDirection,
};
use crate::validation::ValidationFailures;
use std::collections::BTreeMap;
use url::form_urlencoded;

// ─────────────────────────────────────────────────────────────────────────────
// QueryPairs
// ─────────────────────────────────────────────────────────────────────────────

/// Ordered multi-map of query keys to values.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryPairs {
    pairs: Vec<(String, String)>,
}

impl QueryPairs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a raw `application/x-www-form-urlencoded` query string (without
    /// the leading `?`).
    pub fn parse(raw: &str) -> Self {
        Self {
            pairs: form_urlencoded::parse(raw.as_bytes())
                .map(|(k, v)| (k.into_owned(), v.into_owned()))
                .collect(),
        }
    }

    /// Append a key/value pair, keeping earlier values for the same key.
    pub fn append(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.pairs.push((key.into(), value.into()));
    }

    /// First value of `key`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Every value of `key`, in order of appearance.
    pub fn get_all(&self, key: &str) -> Vec<String> {
        self.pairs
            .iter()
            .filter(|(k, _)| k == key)
            .map(|(_, v)| v.clone())
            .collect()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.pairs.iter().any(|(k, _)| k == key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.pairs.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Serialize back to a percent-encoded query string.
    pub fn to_query_string(&self) -> String {
        form_urlencoded::Serializer::new(String::new())
            .extend_pairs(self.iter())
            .finish()
    }
}

impl FromIterator<(String, String)> for QueryPairs {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self {
            pairs: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for QueryPairs {
    type Item = (String, String);
    type IntoIter = std::vec::IntoIter<(String, String)>;

    fn into_iter(self) -> Self::IntoIter {
        self.pairs.into_iter()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Parse helpers
// ─────────────────────────────────────────────────────────────────────────────

/// Integer parse with silent fallback on absent or unparsable input.
pub fn parse_int_or(raw: Option<&str>, default: i64) -> i64 {
    raw.and_then(|s| s.parse().ok()).unwrap_or(default)
}

/// Strict boolean parse: only the literals `true` and `false` are accepted.
pub fn parse_bool(raw: &str) -> Option<bool> {
    match raw {
        "true" => Some(true),
        "false" => Some(false),
        _ => None,
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Sort sub-language
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SortPart {
    Field,
    Direction,
}

/// Parse `sort[<int>][field]` / `sort[<int>][direction]`.  Any other shape,
/// including trailing characters, yields `None`.
fn parse_sort_key(key: &str) -> Option<(i64, SortPart)> {
    let rest = key.strip_prefix("sort[")?;
    let (index, rest) = rest.split_once("][")?;
    let part = match rest.strip_suffix(']')? {
        "field" => SortPart::Field,
        "direction" => SortPart::Direction,
        _ => return None,
    };
    Some((index.parse().ok()?, part))
}

/// Rebuild the sort specification from indexed bracket keys.
///
/// Entries are emitted in ascending numeric index order.  An index carrying a
/// direction but no field is dropped; a field without a direction is
/// ascending.  For a repeated key the first value wins.
pub fn decode_sort(query: &QueryPairs) -> Vec<Sort> {
    let mut fields: BTreeMap<i64, &str> = BTreeMap::new();
    let mut directions: BTreeMap<i64, SortDirection> = BTreeMap::new();

    for (key, value) in query.iter() {
        match parse_sort_key(key) {
            Some((index, SortPart::Field)) => {
                fields.entry(index).or_insert(value);
            }
            Some((index, SortPart::Direction)) => {
                directions
                    .entry(index)
                    .or_insert_with(|| SortDirection::parse(value));
            }
            None => {}
        }
    }

    fields
        .into_iter()
        .map(|(index, field)| Sort {
            field: field.to_string(),
            direction: directions.get(&index).copied().unwrap_or_default(),
        })
        .collect()
}

/// Expand a sort specification into bracket pairs indexed by position.
pub fn encode_sort(sort: &[Sort], out: &mut QueryPairs) {
    for (i, entry) in sort.iter().enumerate() {
        out.append(format!("sort[{i}][field]"), entry.field.as_str());
        out.append(format!("sort[{i}][direction]"), entry.direction.as_str());
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// List
// ─────────────────────────────────────────────────────────────────────────────

/// Decode a list request from path identifiers and the query multi-map.
///
/// Empty path identifiers are recorded as failures alongside any query
/// failure.
pub fn decode_list_request(
    base_id: &str,
    table_id_or_name: &str,
    query: &QueryPairs,
) -> (ListRecordsRequest, ValidationFailures) {
    let mut failures = ValidationFailures::new();
    failures.require_non_empty("baseID", base_id);
    failures.require_non_empty("tableIDOrName", table_id_or_name);
    let text = |key: &str| query.get(key).unwrap_or_default().to_string();

    let mut request = ListRecordsRequest::new(base_id, table_id_or_name);
    request.time_zone = text("timeZone");
    request.user_locale = text("userLocale");
    request.page_size = parse_int_or(query.get("pageSize"), ListRecordsRequest::DEFAULT_PAGE_SIZE);
    request.max_records = parse_int_or(query.get("maxRecords"), ListRecordsRequest::UNBOUNDED);
    request.offset = text("offset");
    request.view = text("view");
    request.sort = decode_sort(query);
    request.filter_by_formula = text("filterByFormula");
    request.cell_format = CellFormat::parse(query.get("cellFormat").unwrap_or_default());
    request.fields = query.get_all("fields");
    if let Some(raw) = query.get("returnFieldsByFieldId") {
        match parse_bool(raw) {
            Some(flag) => request.return_fields_by_field_id = flag,
            None => failures.record("returnFieldsByFieldId", "invalid boolean"),
        }
    }
    request.record_metadata = query.get_all("recordMetadata");

    (request, failures)
}

/// Encode a list request onto the outbound query vocabulary.
///
/// Optional text fields are skipped when empty, `maxRecords` when unbounded
/// and `returnFieldsByFieldId` when false; `pageSize` and `cellFormat` are
/// always present.
pub fn encode_list_request(request: &ListRecordsRequest) -> QueryPairs {
    let mut out = QueryPairs::new();
    let non_empty = |out: &mut QueryPairs, key: &str, value: &str| {
        if !value.is_empty() {
            out.append(key, value);
        }
    };

    non_empty(&mut out, "timeZone", &request.time_zone);
    non_empty(&mut out, "userLocale", &request.user_locale);
    out.append("pageSize", request.page_size.to_string());
    if request.max_records != ListRecordsRequest::UNBOUNDED {
        out.append("maxRecords", request.max_records.to_string());
    }
    non_empty(&mut out, "offset", &request.offset);
    non_empty(&mut out, "view", &request.view);
    encode_sort(&request.sort, &mut out);
    non_empty(&mut out, "filterByFormula", &request.filter_by_formula);
    out.append("cellFormat", request.cell_format.as_str());
    for field in &request.fields {
        out.append("fields", field.as_str());
    }
    if request.return_fields_by_field_id {
        out.append("returnFieldsByFieldId", "true");
    }
    for metadata in &request.record_metadata {
        out.append("recordMetadata", metadata.as_str());
    }
    out
}

// ─────────────────────────────────────────────────────────────────────────────
// Delete
// ─────────────────────────────────────────────────────────────────────────────

/// Decode a delete request.  Record ids come from `records[]`, then `records`.
pub fn decode_delete_request(
    base_id: &str,
    table_id_or_name: &str,
    query: &QueryPairs,
) -> (DeleteRecordsRequest, ValidationFailures) {
    let mut failures = ValidationFailures::new();
    failures.require_non_empty("baseID", base_id);
    failures.require_non_empty("tableIDOrName", table_id_or_name);

    let mut record_ids = query.get_all("records[]");
    record_ids.extend(query.get_all("records"));

    let request = DeleteRecordsRequest {
        base_id: base_id.to_string(),
        table_id_or_name: table_id_or_name.to_string(),
        record_ids,
    };
    (request, failures)
}

/// Encode the record ids of a delete request as repeated `records[]` pairs.
pub fn encode_delete_request(request: &DeleteRecordsRequest) -> QueryPairs {
    request
        .record_ids
        .iter()
        .map(|id| ("records[]".to_string(), id.clone()))
        .collect()
}
