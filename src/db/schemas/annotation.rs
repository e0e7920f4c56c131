//! Annotation payload (PiFF) carried by every picture
//!
//! Field names match the legacy document layout. Regions and value entries
//! are only linked by convention through `LocationId`; nothing here checks
//! that a referenced region exists.

use serde::{Deserialize, Deserializer, Serialize};

/// Metadata block of an annotation
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct Meta {
    #[serde(rename = "Type", default)]
    pub kind: String,

    #[serde(rename = "URL", default)]
    pub url: String,
}

/// Region descriptor: a polygon on the source image
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct Region {
    #[serde(rename = "Type", default)]
    pub kind: String,

    #[serde(rename = "Polygon", default, deserialize_with = "null_as_empty")]
    pub polygon: Vec<[i32; 2]>,

    #[serde(rename = "Id", default)]
    pub id: String,
}

/// Transcription value attached to a region
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct ValueEntry {
    #[serde(rename = "Type", default)]
    pub kind: String,

    #[serde(rename = "LocationId", default)]
    pub location_id: String,

    #[serde(rename = "Value", default)]
    pub value: String,

    #[serde(rename = "Id", default)]
    pub id: String,
}

/// Full annotation payload
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct Annotation {
    #[serde(rename = "Meta", default)]
    pub meta: Meta,

    #[serde(rename = "Location", default, deserialize_with = "null_as_empty")]
    pub regions: Vec<Region>,

    #[serde(rename = "Data", default, deserialize_with = "null_as_empty")]
    pub values: Vec<ValueEntry>,

    /// Child record references
    #[serde(rename = "Children", default, deserialize_with = "null_as_empty")]
    pub children: Vec<i64>,

    /// Parent record reference
    #[serde(rename = "Parent", default)]
    pub parent: i64,
}

impl Annotation {
    /// Single-line annotation with one empty value entry bound to one region
    pub fn line(region_id: &str) -> Self {
        Self {
            meta: Meta {
                kind: "line".to_string(),
                url: String::new(),
            },
            regions: vec![Region {
                kind: "line".to_string(),
                polygon: vec![[0, 0]; 4],
                id: region_id.to_string(),
            }],
            values: vec![ValueEntry {
                kind: "line".to_string(),
                location_id: region_id.to_string(),
                value: String::new(),
                id: "0".to_string(),
            }],
            children: Vec::new(),
            parent: 0,
        }
    }

    /// Text of the first value entry, if any
    pub fn first_value(&self) -> Option<&str> {
        self.values.first().map(|entry| entry.value.as_str())
    }

    /// Overwrite the first value entry's text, creating the entry if the
    /// payload has none yet
    pub fn set_first_value(&mut self, text: &str) {
        match self.values.first_mut() {
            Some(entry) => entry.value = text.to_string(),
            None => self.values.push(ValueEntry {
                value: text.to_string(),
                ..Default::default()
            }),
        }
    }
}

/// Legacy producers write absent lists as `null`
fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}
