//! Untyped documents, merge rules and bulk-read queries

use serde_json::{Map, Value};
use std::cmp::Ordering;

/// Raw document body: field name → JSON value
pub type Document = Map<String, Value>;

/// Document body together with its id, as delivered by a backend
#[derive(Debug, Clone, PartialEq)]
pub struct RawDocument {
    /// Document id (unique within its collection)
    pub id: String,
    /// Document body
    pub data: Document,
}

impl RawDocument {
    /// Create raw document
    #[inline]
    pub fn new(id: impl Into<String>, data: Document) -> Self {
        Self {
            id: id.into(),
            data,
        }
    }

    /// Body with the synthesized `id` field merged in
    #[must_use]
    pub fn into_value(self) -> Value {
        let mut data = self.data;
        data.insert("id".to_string(), Value::String(self.id));
        Value::Object(data)
    }
}

/// Merge `patch` into `target` field by field.
///
/// Nested objects merge recursively; every other value (arrays included)
/// replaces the existing one.
pub fn merge_into(target: &mut Document, patch: Document) {
    for (key, value) in patch {
        match (target.get_mut(&key), value) {
            (Some(Value::Object(existing)), Value::Object(incoming)) => {
                merge_into(existing, incoming);
            }
            (_, value) => {
                target.insert(key, value);
            }
        }
    }
}

/// Overwrite the top-level fields named in `patch`
pub fn overwrite_fields(target: &mut Document, patch: Document) {
    for (key, value) in patch {
        target.insert(key, value);
    }
}

/// Sort direction for [`Query::order_by`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    /// Smallest first
    #[default]
    Ascending,
    /// Largest first
    Descending,
}

/// Field constraint for bulk reads
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    /// Field equals value
    Eq(String, Value),
}

impl Filter {
    fn matches(&self, doc: &RawDocument) -> bool {
        match self {
            Self::Eq(field, expected) => field_value(doc, field) == Some(expected),
        }
    }
}

/// Bulk-read constraints evaluated by the backend
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
    /// Equality filters (all must match)
    pub filters: Vec<Filter>,
    /// Optional ordering
    pub order_by: Option<(String, Direction)>,
    /// Optional result cap, applied after ordering
    pub limit: Option<usize>,
}

impl Query {
    /// Unconstrained query
    #[inline]
    #[must_use]
    pub fn all() -> Self {
        Self::default()
    }

    /// Add an equality filter
    #[must_use]
    pub fn where_eq(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.filters.push(Filter::Eq(field.into(), value.into()));
        self
    }

    /// Order results by a field
    #[must_use]
    pub fn order_by(mut self, field: impl Into<String>, direction: Direction) -> Self {
        self.order_by = Some((field.into(), direction));
        self
    }

    /// Cap the number of results
    #[must_use]
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Check if a document passes every filter
    #[must_use]
    pub fn matches(&self, doc: &RawDocument) -> bool {
        self.filters.iter().all(|f| f.matches(doc))
    }

    /// Filter, order and truncate `docs`
    #[must_use]
    pub fn apply(&self, docs: Vec<RawDocument>) -> Vec<RawDocument> {
        let mut out: Vec<RawDocument> = docs.into_iter().filter(|d| self.matches(d)).collect();

        if let Some((field, direction)) = &self.order_by {
            out.sort_by(|a, b| {
                let ord = compare_values(field_value(a, field), field_value(b, field));
                match direction {
                    Direction::Ascending => ord,
                    Direction::Descending => ord.reverse(),
                }
            });
        }

        if let Some(limit) = self.limit {
            out.truncate(limit);
        }
        out
    }
}

fn field_value<'a>(doc: &'a RawDocument, field: &str) -> Option<&'a Value> {
    doc.data.get(field)
}

/// Total order over optional JSON values used for ordering.
///
/// Missing < null < bool < number < string; arrays and objects compare equal.
fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    fn rank(v: Option<&Value>) -> u8 {
        match v {
            None => 0,
            Some(Value::Null) => 1,
            Some(Value::Bool(_)) => 2,
            Some(Value::Number(_)) => 3,
            Some(Value::String(_)) => 4,
            Some(Value::Array(_) | Value::Object(_)) => 5,
        }
    }

    match (a, b) {
        (Some(Value::Bool(x)), Some(Value::Bool(y))) => x.cmp(y),
        (Some(Value::Number(x)), Some(Value::Number(y))) => {
            let x = x.as_f64().unwrap_or(0.0);
            let y = y.as_f64().unwrap_or(0.0);
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
        _ => rank(a).cmp(&rank(b)),
    }
}
