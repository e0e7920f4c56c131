//! Flag and value mutation
//!
//! Batched updates keyed by picture id. Items are committed one at a time
//! with single-document atomicity; the first failure stops the batch and
//! earlier items stay committed.

use bson::oid::ObjectId;
use serde::Deserialize;
use tracing::{debug, info};

use crate::db::schemas::{hex_object_id, Annotator, Flag};
use crate::repository::PictureRepository;
use crate::store::PictureUpdate;
use crate::types::{Result, SnippetError};

/// Set one named flag on one picture
#[derive(Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct FlagChange {
    #[serde(rename = "Id", deserialize_with = "hex_object_id")]
    pub id: ObjectId,

    #[serde(rename = "flag", alias = "Flag")]
    pub flag: Flag,

    #[serde(rename = "value", alias = "Value")]
    pub value: bool,
}

impl FlagChange {
    pub fn new(id: ObjectId, flag: Flag, value: bool) -> Self {
        Self { id, flag, value }
    }

    /// `SentToReco` is monotonic: it may be set but never cleared
    fn validate(&self) -> Result<()> {
        if self.flag == Flag::SentToReco && !self.value {
            return Err(SnippetError::Validation(format!(
                "SentToReco cannot be reset on picture {}",
                self.id
            )));
        }
        Ok(())
    }
}

/// Transcription text for one picture
#[derive(Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct AnnotationValue {
    #[serde(rename = "Id", deserialize_with = "hex_object_id")]
    pub id: ObjectId,

    #[serde(rename = "value", alias = "Value")]
    pub value: String,
}

impl AnnotationValue {
    pub fn new(id: ObjectId, value: impl Into<String>) -> Self {
        Self {
            id,
            value: value.into(),
        }
    }
}

#[derive(Clone)]
pub struct Mutator {
    repo: PictureRepository,
}

impl Mutator {
    pub fn new(repo: PictureRepository) -> Self {
        Self { repo }
    }

    /// Apply flag changes in order.
    ///
    /// The whole batch is validated before the first write. After that, the
    /// first store failure (including an unknown id) is returned and changes
    /// already applied are kept.
    pub async fn apply_flag_changes(&self, changes: &[FlagChange]) -> Result<()> {
        changes.iter().try_for_each(FlagChange::validate)?;

        for change in changes {
            let update = PictureUpdate::new().set_flag(change.flag, change.value);
            self.repo.update(change.id, &update).await?;
            debug!("Set {}={} on {}", change.flag, change.value, change.id);
        }

        info!("Applied {} flag changes", changes.len());
        Ok(())
    }

    /// Record transcriptions: set the first value entry's text, mark the
    /// picture annotated and attribute it to `annotator`.
    ///
    /// Same partial-failure policy as [`Mutator::apply_flag_changes`].
    pub async fn apply_annotation_values(
        &self,
        entries: &[AnnotationValue],
        annotator: &Annotator,
    ) -> Result<()> {
        for entry in entries {
            let update = PictureUpdate::new()
                .set_first_value(entry.value.as_str())
                .set_flag(Flag::Annotated, true)
                .set_annotator(annotator.clone());
            self.repo.update(entry.id, &update).await?;
            debug!("Annotated {} by {}", entry.id, annotator);
        }

        info!("Applied {} annotation values by {}", entries.len(), annotator);
        Ok(())
    }
}
