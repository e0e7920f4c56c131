//! snippet-store
//!
//! Record store and sample selection for a crowd-annotation pipeline.
//! Pictures of text lines are handed to human annotators and to an
//! automatic recognizer; this crate keeps their workflow flags and
//! transcriptions.
//!
//! ## Components
//!
//! - [`repository::PictureRepository`] - persistence with per-call timeouts
//! - [`selector::Selector`] - random work batches, recognizer claims
//! - [`mutator::Mutator`] - batched flag and transcription updates
//! - [`status::StatusAggregator`] - progress counters and health
//!
//! Storage sits behind [`store::PictureStore`], with MongoDB and in-memory
//! backends.

pub mod config;
pub mod db;
pub mod logging;
pub mod mutator;
pub mod repository;
pub mod selector;
pub mod status;
pub mod store;
pub mod types;

pub use config::{Args, Command};
pub use db::{Annotation, Annotator, Flag, MongoClient, PictureDoc};
pub use mutator::{AnnotationValue, FlagChange, Mutator};
pub use repository::PictureRepository;
pub use selector::Selector;
pub use status::{HealthReport, Status, StatusAggregator};
pub use store::{MemoryPictureStore, MongoPictureStore, PictureFilter, PictureStore, PictureUpdate};
pub use types::{Result, SnippetError};
