//! Query-string construction for the location search endpoint.

use poimap_core::{BoxBound, SearchForm};
use serde_json::Value;

/// What to ask the search endpoint for.
#[derive(Debug, Clone, PartialEq)]
pub enum LocationQuery {
    /// Every location, no query string.
    All,
    /// Fields of the search form.
    Form(SearchForm),
    /// Locations inside a map viewport.
    Bound(BoxBound),
}

impl LocationQuery {
    /// Query pairs to append to the search URL, in order.
    #[must_use]
    pub fn pairs(&self) -> Vec<(String, String)> {
        match self {
            LocationQuery::All => Vec::new(),
            LocationQuery::Form(form) => build_search_query(form),
            LocationQuery::Bound(bound) => build_bound_query(bound),
        }
    }
}

/// Encodes a search form as query pairs.
///
/// Fields are emitted in name order. `null`, blank strings and empty arrays
/// are dropped; arrays become comma-joined lists.
#[must_use]
pub fn build_search_query(form: &SearchForm) -> Vec<(String, String)> {
    form.iter()
        .filter_map(|(key, value)| param_value(value).map(|v| (key.clone(), v)))
        .collect()
}

/// Encodes a viewport as `ne=lng,lat` and `sw=lng,lat`.
#[must_use]
pub fn build_bound_query(bound: &BoxBound) -> Vec<(String, String)> {
    vec![
        ("ne".to_string(), bound.ne.to_string()),
        ("sw".to_string(), bound.sw.to_string()),
    ]
}

fn param_value(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) if s.trim().is_empty() => None,
        Value::String(s) => Some(s.clone()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Array(items) => {
            let parts: Vec<String> = items.iter().filter_map(param_value).collect();
            if parts.is_empty() {
                None
            } else {
                Some(parts.join(","))
            }
        }
        Value::Object(_) => Some(value.to_string()),
    }
}
