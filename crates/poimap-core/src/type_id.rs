//! Category ids encoded in the trailing path of a location's `type` URL.
//!
//! The backend links each location to its category with a URL such as
//! `https://maps.example.org/api/types/5/`; the numeric id is the
//! second-to-last `/`-delimited segment.

use thiserror::Error;

/// Identifier of a location category.
pub type TypeId = i64;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TypeIdError {
    #[error("type url \"{0}\" has no id segment")]
    MissingSegment(String),

    #[error("type url \"{url}\" has non-numeric id segment \"{segment}\"")]
    NotNumeric { url: String, segment: String },
}

/// Extracts the category id from a `type` URL.
///
/// # Errors
///
/// Returns [`TypeIdError::MissingSegment`] when the string has fewer than two
/// `/`-delimited segments, or [`TypeIdError::NotNumeric`] when the
/// second-to-last segment is empty or not an integer.
pub fn parse_type_id(type_url: &str) -> Result<TypeId, TypeIdError> {
    let mut segments = type_url.rsplit('/');
    let _last = segments.next();
    let Some(segment) = segments.next() else {
        return Err(TypeIdError::MissingSegment(type_url.to_string()));
    };

    segment
        .trim()
        .parse::<TypeId>()
        .map_err(|_| TypeIdError::NotNumeric {
            url: type_url.to_string(),
            segment: segment.to_string(),
        })
}
