//! Query and update descriptions shared by all store backends
//!
//! A filter renders to a BSON document for MongoDB and is evaluated directly
//! against a [`PictureDoc`] by the in-memory backend, so both agree on what
//! a predicate selects.

use bson::{doc, Bson, Document, Regex};

use crate::db::schemas::{Annotator, Flag, PictureDoc, RECOGNIZER_PATTERN};

/// Predicate on the `Annotator` field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnnotatorMatch {
    /// Annotator matches the recognizer marker pattern
    IsRecognizer,
    /// Annotator does not match the recognizer marker pattern
    NotRecognizer,
}

/// Conjunction of flag equalities and an optional annotator predicate
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PictureFilter {
    flags: Vec<(Flag, bool)>,
    annotator: Option<AnnotatorMatch>,
}

impl PictureFilter {
    /// Filter matching every picture
    pub fn all() -> Self {
        Self::default()
    }

    /// Require `flag == value`
    pub fn flag(mut self, flag: Flag, value: bool) -> Self {
        self.flags.retain(|(f, _)| *f != flag);
        self.flags.push((flag, value));
        self
    }

    pub fn annotator(mut self, predicate: AnnotatorMatch) -> Self {
        self.annotator = Some(predicate);
        self
    }

    /// Fresh work for a human: not annotated, not unreadable
    pub fn unused() -> Self {
        Self::all()
            .flag(Flag::Annotated, false)
            .flag(Flag::Unreadable, false)
    }

    /// Recognizer proposals awaiting human confirmation
    pub fn with_suggestion() -> Self {
        Self::all()
            .flag(Flag::Annotated, true)
            .flag(Flag::Unreadable, false)
            .annotator(AnnotatorMatch::IsRecognizer)
    }

    /// Candidates never handed to the recognizer
    pub fn for_recognizer() -> Self {
        Self::unused().flag(Flag::SentToReco, false)
    }

    /// Annotated, excluding recognizer-only proposals
    pub fn annotated_by_humans() -> Self {
        Self::all()
            .flag(Flag::Annotated, true)
            .annotator(AnnotatorMatch::NotRecognizer)
    }

    pub fn unreadable() -> Self {
        Self::all().flag(Flag::Unreadable, true)
    }

    /// Render as a MongoDB query document
    pub fn to_filter(&self) -> Document {
        let mut filter = doc! {};

        for (flag, value) in &self.flags {
            filter.insert(flag.field(), *value);
        }

        let pattern = || {
            Bson::RegularExpression(Regex {
                pattern: RECOGNIZER_PATTERN.to_string(),
                options: "i".to_string(),
            })
        };

        match self.annotator {
            Some(AnnotatorMatch::IsRecognizer) => {
                filter.insert("Annotator", pattern());
            }
            Some(AnnotatorMatch::NotRecognizer) => {
                filter.insert("Annotator", doc! { "$not": pattern() });
            }
            None => {}
        }

        filter
    }

    /// Evaluate against a decoded picture
    pub fn matches(&self, pic: &PictureDoc) -> bool {
        let flags_match = self
            .flags
            .iter()
            .all(|(flag, value)| pic.flag(*flag) == *value);

        let is_recognizer = pic.annotator.as_ref().is_some_and(Annotator::is_recognizer);
        let annotator_match = match self.annotator {
            Some(AnnotatorMatch::IsRecognizer) => is_recognizer,
            Some(AnnotatorMatch::NotRecognizer) => !is_recognizer,
            None => true,
        };

        flags_match && annotator_match
    }
}

/// Field assignments applied to a single picture
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PictureUpdate {
    flags: Vec<(Flag, bool)>,
    first_value: Option<String>,
    annotator: Option<Annotator>,
}

impl PictureUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_flag(mut self, flag: Flag, value: bool) -> Self {
        self.flags.retain(|(f, _)| *f != flag);
        self.flags.push((flag, value));
        self
    }

    /// Overwrite the first value entry's text
    pub fn set_first_value(mut self, text: impl Into<String>) -> Self {
        self.first_value = Some(text.into());
        self
    }

    pub fn set_annotator(mut self, annotator: Annotator) -> Self {
        self.annotator = Some(annotator);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.flags.is_empty() && self.first_value.is_none() && self.annotator.is_none()
    }

    /// Render as a MongoDB update pipeline.
    ///
    /// The first value entry is rebuilt from `PiFF.Data` with `$ifNull`, so a
    /// missing or `null` list gains its first entry instead of failing. Every
    /// assigned value is wrapped in `$literal`: annotator names and texts may
    /// start with `$`.
    pub fn to_pipeline(&self) -> Vec<Document> {
        let mut set = doc! {};

        for (flag, value) in &self.flags {
            set.insert(flag.field(), doc! { "$literal": *value });
        }
        if let Some(ref text) = self.first_value {
            set.insert(
                "PiFF.Data",
                doc! {
                    "$let": {
                        "vars": { "data": { "$ifNull": ["$PiFF.Data", []] } },
                        "in": {
                            "$concatArrays": [
                                [{
                                    "$mergeObjects": [
                                        { "$ifNull": [{ "$arrayElemAt": ["$$data", 0] }, {}] },
                                        { "Value": { "$literal": text.as_str() } }
                                    ]
                                }],
                                { "$slice": ["$$data", 1, { "$max": [{ "$size": "$$data" }, 1] }] }
                            ]
                        }
                    }
                },
            );
        }
        if let Some(ref annotator) = self.annotator {
            set.insert("Annotator", doc! { "$literal": annotator.as_stored() });
        }

        vec![doc! { "$set": set }]
    }

    /// Apply to a decoded picture
    pub fn apply(&self, pic: &mut PictureDoc) {
        for (flag, value) in &self.flags {
            pic.set_flag(*flag, *value);
        }
        if let Some(ref text) = self.first_value {
            pic.annotation.set_first_value(text);
        }
        if let Some(ref annotator) = self.annotator {
            pic.annotator = Some(annotator.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unused_filter_document() {
        let filter = PictureFilter::unused().to_filter();
        assert!(!filter.get_bool("Annotated").unwrap());
        assert!(!filter.get_bool("Unreadable").unwrap());
        assert!(!filter.contains_key("SentToReco"));
    }

    #[test]
    fn test_for_recognizer_adds_sent_flag() {
        let filter = PictureFilter::for_recognizer().to_filter();
        assert!(!filter.get_bool("SentToReco").unwrap());
        assert_eq!(filter.len(), 3);
    }

    #[test]
    fn test_repeated_flag_keeps_last_value() {
        let filter = PictureFilter::all()
            .flag(Flag::Annotated, true)
            .flag(Flag::Annotated, false);
        assert!(!filter.to_filter().get_bool("Annotated").unwrap());
    }

    #[test]
    fn test_annotator_predicates() {
        let mut proposal = PictureDoc::default();
        proposal.annotated = true;
        proposal.annotator = Some(Annotator::Recognizer);

        let mut human = PictureDoc::default();
        human.annotated = true;
        human.annotator = Some(Annotator::Human("alice".into()));

        assert!(PictureFilter::with_suggestion().matches(&proposal));
        assert!(!PictureFilter::with_suggestion().matches(&human));
        assert!(PictureFilter::annotated_by_humans().matches(&human));
        assert!(!PictureFilter::annotated_by_humans().matches(&proposal));

        let rendered = PictureFilter::annotated_by_humans().to_filter();
        assert!(rendered.get_document("Annotator").unwrap().contains_key("$not"));
    }

    #[test]
    fn test_update_document_and_apply() {
        let update = PictureUpdate::new()
            .set_first_value("hello")
            .set_flag(Flag::Annotated, true)
            .set_annotator(Annotator::Unspecified);

        let pipeline = update.to_pipeline();
        assert_eq!(pipeline.len(), 1);
        let set = pipeline[0].get_document("$set").unwrap();
        assert_eq!(
            set.get_document("Annotator").unwrap().get_str("$literal").unwrap(),
            "unspecified"
        );
        assert!(set
            .get_document("Annotated")
            .unwrap()
            .get_bool("$literal")
            .unwrap());
        assert!(set.get_document("PiFF.Data").unwrap().contains_key("$let"));

        let mut pic = PictureDoc::default();
        update.apply(&mut pic);
        assert_eq!(pic.annotation.first_value(), Some("hello"));
        assert!(pic.annotated);
        assert_eq!(pic.annotator, Some(Annotator::Unspecified));
    }

    #[test]
    fn test_recognizer_marker_assigned_literally() {
        let pipeline = PictureUpdate::new()
            .set_annotator(Annotator::Recognizer)
            .to_pipeline();
        let set = pipeline[0].get_document("$set").unwrap();
        assert_eq!(
            set.get_document("Annotator").unwrap().get_str("$literal").unwrap(),
            "$recognizer"
        );
        assert!(!set.contains_key("PiFF.Data"));
    }

    #[test]
    fn test_value_created_when_list_missing() {
        let mut pic = PictureDoc::default();
        assert!(pic.annotation.values.is_empty());
        PictureUpdate::new().set_first_value("hello").apply(&mut pic);
        assert_eq!(pic.annotation.values.len(), 1);
        assert_eq!(pic.annotation.first_value(), Some("hello"));
    }
}
