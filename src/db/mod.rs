//! Database layer
//!
//! MongoDB connection lifecycle and the picture document schema.

pub mod mongo;
pub mod schemas;

pub use mongo::{IntoIndexes, MongoClient};
pub use schemas::{Annotation, Annotator, Flag, PictureDoc};
