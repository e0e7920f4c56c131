//! Store collaborator
//!
//! The raw document operations the rest of the crate is built on. The
//! repository holds one shared `Arc<dyn PictureStore>`; all serialization
//! between concurrent requests is left to the backend's per-document
//! atomicity.

mod filter;
mod memory;
mod mongo;

pub use filter::{AnnotatorMatch, PictureFilter, PictureUpdate};
pub use memory::MemoryPictureStore;
pub use mongo::MongoPictureStore;

use async_trait::async_trait;
use bson::oid::ObjectId;

use crate::db::schemas::PictureDoc;
use crate::types::Result;

/// Document CRUD, counting and sampling over the picture collection
#[async_trait]
pub trait PictureStore: Send + Sync {
    /// Check the backend is reachable
    async fn ping(&self) -> Result<()>;

    /// Insert a batch, returning assigned ids in input order
    async fn insert_many(&self, pictures: Vec<PictureDoc>) -> Result<Vec<ObjectId>>;

    async fn find_by_id(&self, id: ObjectId) -> Result<Option<PictureDoc>>;

    /// Every picture, in insertion order where the backend keeps one
    async fn find_all(&self) -> Result<Vec<PictureDoc>>;

    /// Remove every picture, returning how many were removed
    async fn delete_all(&self) -> Result<u64>;

    async fn count(&self, filter: &PictureFilter) -> Result<u64>;

    /// Random sample without replacement of at most `amount` matching pictures
    async fn sample(&self, filter: &PictureFilter, amount: usize) -> Result<Vec<PictureDoc>>;

    /// Apply `update` to one picture. Returns false when no picture has `id`.
    async fn update(&self, id: ObjectId, update: &PictureUpdate) -> Result<bool>;

    /// Set `SentToReco` only while the picture is still a recognizer
    /// candidate (see [`PictureFilter::for_recognizer`]).
    ///
    /// Returns the claimed picture, or `None` when it does not exist or was
    /// already claimed.
    async fn claim_for_recognizer(&self, id: ObjectId) -> Result<Option<PictureDoc>>;
}
