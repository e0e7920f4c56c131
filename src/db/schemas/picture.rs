//! Picture document schema
//!
//! One annotatable unit of work: an image reference, its transcription
//! payload, and the workflow flags that drive sample selection.

use bson::{doc, oid::ObjectId, Document};
use mongodb::options::IndexOptions;
use serde::{Deserialize, Serialize};

use crate::db::mongo::IntoIndexes;
use crate::db::schemas::{annotator, Annotation, Annotator, Flag};

/// Default collection name for pictures
pub const PICTURE_COLLECTION: &str = "pictures";

/// Picture document stored in MongoDB
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct PictureDoc {
    /// MongoDB document ID, assigned by the store on insert
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none", default)]
    pub id: Option<ObjectId>,

    /// Transcription payload
    #[serde(rename = "PiFF", default)]
    pub annotation: Annotation,

    /// Storage location of the image on the file server
    #[serde(rename = "Url", default)]
    pub url: String,

    /// Original filename of the image
    #[serde(rename = "Filename", default)]
    pub filename: String,

    #[serde(rename = "Annotated", default)]
    pub annotated: bool,

    #[serde(rename = "Corrected", default)]
    pub corrected: bool,

    /// Once true, never reset: the record has been handed to the recognizer
    #[serde(rename = "SentToReco", default)]
    pub sent_to_reco: bool,

    #[serde(rename = "Unreadable", default)]
    pub unreadable: bool,

    /// Attribution of the current annotation, `None` until annotated
    #[serde(rename = "Annotator", default, with = "annotator::stored")]
    pub annotator: Option<Annotator>,
}

impl PictureDoc {
    /// Create a fresh, unannotated picture
    pub fn new(annotation: Annotation, url: impl Into<String>, filename: impl Into<String>) -> Self {
        Self {
            id: None,
            annotation,
            url: url.into(),
            filename: filename.into(),
            ..Default::default()
        }
    }

    pub fn flag(&self, flag: Flag) -> bool {
        match flag {
            Flag::Annotated => self.annotated,
            Flag::Corrected => self.corrected,
            Flag::SentToReco => self.sent_to_reco,
            Flag::Unreadable => self.unreadable,
        }
    }

    pub fn set_flag(&mut self, flag: Flag, value: bool) {
        match flag {
            Flag::Annotated => self.annotated = value,
            Flag::Corrected => self.corrected = value,
            Flag::SentToReco => self.sent_to_reco = value,
            Flag::Unreadable => self.unreadable = value,
        }
    }

    /// Annotated by the recognizer and not yet confirmed by a human
    pub fn is_recognizer_proposal(&self) -> bool {
        self.annotated && self.annotator.as_ref().is_some_and(Annotator::is_recognizer)
    }

    /// Annotated, and not by the recognizer
    pub fn is_human_annotated(&self) -> bool {
        self.annotated && !self.annotator.as_ref().is_some_and(Annotator::is_recognizer)
    }
}

impl IntoIndexes for PictureDoc {
    fn into_indices() -> Vec<(Document, Option<IndexOptions>)> {
        vec![
            // Unused / for-recognizer sampling
            (
                doc! { "Annotated": 1, "Unreadable": 1, "SentToReco": 1 },
                Some(
                    IndexOptions::builder()
                        .name("workflow_flags_index".to_string())
                        .build(),
                ),
            ),
            // Suggestion sampling and human progress counts
            (
                doc! { "Annotated": 1, "Annotator": 1 },
                Some(
                    IndexOptions::builder()
                        .name("annotator_index".to_string())
                        .build(),
                ),
            ),
        ]
    }
}
