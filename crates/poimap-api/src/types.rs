//! Wire shapes that differ from the domain types in `poimap-core`.

use std::cmp::Ordering;

use poimap_core::LocationType;
use serde::Deserialize;
use serde_json::{Map, Value};

/// Body of the type catalog endpoint.
///
/// Depending on the backend version the catalog is either a plain array or an
/// object keyed by type id; both are accepted.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum TypeCatalog {
    List(Vec<LocationType>),
    /// Entries in the order the backend sent them.
    Keyed(Map<String, Value>),
}

impl TypeCatalog {
    /// Flattens the catalog into a list.
    ///
    /// Keyed catalogs follow JavaScript object key order: integer keys first in
    /// ascending order (`"2"` before `"10"`), then every other key in the
    /// order it appeared in the body.
    ///
    /// # Errors
    ///
    /// Returns the [`serde_json::Error`] of the first keyed entry that is not
    /// a type record.
    pub fn into_types(self) -> Result<Vec<LocationType>, serde_json::Error> {
        match self {
            TypeCatalog::List(types) => Ok(types),
            TypeCatalog::Keyed(map) => {
                let mut entries: Vec<(String, Value)> = map.into_iter().collect();
                // Stable sort: non-integer keys keep their relative order.
                entries.sort_by(|(a, _), (b, _)| match (index_key(a), index_key(b)) {
                    (Some(x), Some(y)) => x.cmp(&y),
                    (Some(_), None) => Ordering::Less,
                    (None, Some(_)) => Ordering::Greater,
                    (None, None) => Ordering::Equal,
                });
                entries
                    .into_iter()
                    .map(|(_, v)| serde_json::from_value(v))
                    .collect()
            }
        }
    }
}

/// Numeric value of a canonical integer key (`"7"`, not `"07"`).
fn index_key(key: &str) -> Option<u32> {
    key.parse::<u32>().ok().filter(|n| n.to_string() == key)
}
