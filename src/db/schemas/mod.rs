//! Database schemas for the snippet store
//!
//! Defines the MongoDB document structure for pictures and the typed pieces
//! it is built from.

mod annotation;
pub(crate) mod annotator;
mod flag;
mod picture;

pub use annotation::{Annotation, Meta, Region, ValueEntry};
pub use annotator::{
    is_recognizer_marker, Annotator, RECOGNIZER_MARKER, RECOGNIZER_PATTERN, UNSPECIFIED_ANNOTATOR,
};
pub use flag::Flag;
pub use picture::{PictureDoc, PICTURE_COLLECTION};

use bson::oid::ObjectId;
use serde::{Deserialize, Deserializer};

use crate::types::{Result, SnippetError};

/// Parse a hex identifier supplied by a caller
pub fn parse_id(raw: &str) -> Result<ObjectId> {
    ObjectId::parse_str(raw.trim())
        .map_err(|e| SnippetError::Validation(format!("Invalid identifier '{}': {}", raw, e)))
}

/// Deserialize an `ObjectId` from its hex string form (request payloads)
pub(crate) fn hex_object_id<'de, D>(deserializer: D) -> std::result::Result<ObjectId, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    ObjectId::parse_str(&raw).map_err(serde::de::Error::custom)
}
