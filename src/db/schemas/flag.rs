//! Workflow flags carried by every picture

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::types::SnippetError;

/// Named boolean workflow state on a picture.
///
/// This is a closed set: a flag name outside it never reaches the store.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[serde(try_from = "String", into = "String")]
pub enum Flag {
    Annotated,
    Corrected,
    SentToReco,
    Unreadable,
}

impl Flag {
    pub const ALL: [Flag; 4] = [
        Flag::Annotated,
        Flag::Corrected,
        Flag::SentToReco,
        Flag::Unreadable,
    ];

    /// Field name in the stored document
    pub fn field(&self) -> &'static str {
        match self {
            Self::Annotated => "Annotated",
            Self::Corrected => "Corrected",
            Self::SentToReco => "SentToReco",
            Self::Unreadable => "Unreadable",
        }
    }
}

impl fmt::Display for Flag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.field())
    }
}

impl FromStr for Flag {
    type Err = SnippetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|flag| flag.field() == s)
            .ok_or_else(|| SnippetError::Validation(format!("Unknown flag '{}'", s)))
    }
}

impl TryFrom<String> for Flag {
    type Error = SnippetError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Flag> for String {
    fn from(flag: Flag) -> Self {
        flag.field().to_string()
    }
}
