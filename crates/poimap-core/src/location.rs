use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::type_id::{parse_type_id, TypeId, TypeIdError};

/// A `[longitude, latitude]` pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LngLat(pub f64, pub f64);

impl LngLat {
    #[must_use]
    pub fn lng(self) -> f64 {
        self.0
    }

    #[must_use]
    pub fn lat(self) -> f64 {
        self.1
    }
}

impl fmt::Display for LngLat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.0, self.1)
    }
}

/// Rectangular map viewport given by its north-east and south-west corners.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoxBound {
    pub ne: LngLat,
    pub sw: LngLat,
}

/// A point of interest as returned by the backend.
///
/// Only the fields the browser reasons about are typed; everything else the
/// backend sends is kept in `extra` and written back out unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub id: i64,
    /// URL of the location's category, e.g. `.../types/5/`.
    #[serde(rename = "type", default)]
    pub type_url: String,
    /// Numeric category id, when the backend supplies one directly.
    #[serde(rename = "type_id", default, skip_serializing_if = "Option::is_none")]
    pub structured_type_id: Option<TypeId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl Location {
    /// Category id of this location.
    ///
    /// Prefers the structured `type_id` field and falls back to parsing the
    /// `type` URL.
    ///
    /// # Errors
    ///
    /// Returns [`TypeIdError`] when there is no structured id and the URL is
    /// malformed.
    pub fn type_id(&self) -> Result<TypeId, TypeIdError> {
        match self.structured_type_id {
            Some(id) => Ok(id),
            None => parse_type_id(&self.type_url),
        }
    }
}

/// A category record from the type catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocationType {
    pub id: TypeId,
    pub name: String,
}

/// A `{value, text}` option for the type filter controls.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeOption {
    pub value: TypeId,
    pub text: String,
}

impl From<&LocationType> for TypeOption {
    fn from(t: &LocationType) -> Self {
        Self {
            value: t.id,
            text: t.name.clone(),
        }
    }
}

/// Search-form fields keyed by name.
pub type SearchForm = BTreeMap<String, serde_json::Value>;
