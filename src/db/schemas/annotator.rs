//! Annotation attribution
//!
//! Storage keeps attribution as a free-text `Annotator` string with a
//! reserved marker for the automatic recognizer. Inside the crate it is a
//! tagged variant; conversion to and from the string happens only at the
//! storage boundary.
//!
//! Marker variants such as `$recognizer-v2` all decode as
//! [`Annotator::Recognizer`] and are written back as the canonical
//! `$recognizer`. Reads therefore show the canonical marker, and the next
//! write of the field normalizes the stored value.

use std::fmt;
use std::sync::LazyLock;

use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Reserved annotator value written for recognizer proposals
pub const RECOGNIZER_MARKER: &str = "$recognizer";

/// Pattern recognizing the marker and its variants (`$recognizer-v2`, ...)
pub const RECOGNIZER_PATTERN: &str = r"^\$recognizer";

/// Annotator value for updates that carry no attribution
pub const UNSPECIFIED_ANNOTATOR: &str = "unspecified";

static RECOGNIZER_RE: LazyLock<Regex> = LazyLock::new(|| {
    RegexBuilder::new(RECOGNIZER_PATTERN)
        .case_insensitive(true)
        .build()
        .expect("valid regex")
});

/// Whether a stored annotator string denotes the recognizer
pub fn is_recognizer_marker(raw: &str) -> bool {
    RECOGNIZER_RE.is_match(raw)
}

/// Who produced a record's current annotation
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Annotator {
    /// A named human annotator
    Human(String),
    /// The automatic recognizer (proposal awaiting human confirmation)
    Recognizer,
    /// An update submitted without attribution
    Unspecified,
}

impl Annotator {
    /// Decode a stored annotator string. The empty string means the record
    /// was never annotated.
    pub fn from_stored(raw: &str) -> Option<Self> {
        if raw.is_empty() {
            None
        } else if is_recognizer_marker(raw) {
            Some(Self::Recognizer)
        } else if raw == UNSPECIFIED_ANNOTATOR {
            Some(Self::Unspecified)
        } else {
            Some(Self::Human(raw.to_string()))
        }
    }

    /// Build from a caller-supplied attribution. A name that looks like the
    /// recognizer marker is read as the recognizer.
    pub fn from_name(name: &str) -> Self {
        Self::from_stored(name.trim()).unwrap_or(Self::Unspecified)
    }

    /// Storage representation
    pub fn as_stored(&self) -> &str {
        match self {
            Self::Human(name) => name,
            Self::Recognizer => RECOGNIZER_MARKER,
            Self::Unspecified => UNSPECIFIED_ANNOTATOR,
        }
    }

    pub fn is_recognizer(&self) -> bool {
        matches!(self, Self::Recognizer)
    }
}

impl fmt::Display for Annotator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_stored())
    }
}

/// Serde adapter for `Option<Annotator>` stored as a plain string
pub(crate) mod stored {
    use super::*;

    pub fn serialize<S>(value: &Option<Annotator>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(annotator) => annotator.as_stored().serialize(serializer),
            None => "".serialize(serializer),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Annotator>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Option::<String>::deserialize(deserializer)?.unwrap_or_default();
        Ok(Annotator::from_stored(&raw))
    }
}
