//! Accumulated per-field validation failures.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Field name → human-readable reason.
///
/// Decoders record every offending field before returning; nothing
/// short-circuits.  A non-empty set gates the request: the caller must answer
/// `400` and must not read any value from the partially decoded request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ValidationFailures(BTreeMap<String, String>);

impl ValidationFailures {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a failure.  A second failure for the same field replaces the
    /// first reason.
    pub fn record(&mut self, field: impl Into<String>, reason: impl Into<String>) {
        self.0.insert(field.into(), reason.into());
    }

    /// Record `field` as missing when `value` is empty.
    pub fn require_non_empty(&mut self, field: &str, value: &str) {
        if value.is_empty() {
            self.record(field, "missing or invalid");
        }
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    pub fn reason(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}
