//! Record repository
//!
//! Owns the picture document shape and the raw persistence operations. Every
//! store call goes through [`PictureRepository::guarded`], which bounds it
//! with the configured timeout so a degraded store surfaces as an error
//! instead of a hung request.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use bson::oid::ObjectId;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::db::schemas::PictureDoc;
use crate::store::{PictureFilter, PictureStore, PictureUpdate};
use crate::types::{Result, SnippetError};

/// Default bound on a single store call
pub const DEFAULT_STORE_TIMEOUT: Duration = Duration::from_secs(5);

/// Keys a caller may send for an identifier; ids are always store-assigned
const CLIENT_ID_KEYS: [&str; 2] = ["_id", "Id"];

/// Shared handle over the picture store
#[derive(Clone)]
pub struct PictureRepository {
    store: Arc<dyn PictureStore>,
    timeout: Duration,
}

impl PictureRepository {
    pub fn new(store: Arc<dyn PictureStore>) -> Self {
        Self::with_timeout(store, DEFAULT_STORE_TIMEOUT)
    }

    pub fn with_timeout(store: Arc<dyn PictureStore>, timeout: Duration) -> Self {
        Self { store, timeout }
    }

    /// Run one store call under the repository timeout
    async fn guarded<T, F>(&self, op: &'static str, call: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        match tokio::time::timeout(self.timeout, call).await {
            Ok(result) => result,
            Err(_) => {
                warn!("Store call '{}' timed out after {:?}", op, self.timeout);
                Err(SnippetError::Database(format!(
                    "{} timed out after {:?}",
                    op, self.timeout
                )))
            }
        }
    }

    /// Decode a batch of untyped documents and insert them.
    ///
    /// Every element must decode into a picture; if any does not, nothing is
    /// inserted. Returned ids follow input order.
    pub async fn insert_batch(&self, documents: Vec<Value>) -> Result<Vec<ObjectId>> {
        let pictures = documents
            .into_iter()
            .enumerate()
            .map(|(index, document)| decode_picture(index, document))
            .collect::<Result<Vec<_>>>()?;

        self.insert_docs(pictures).await
    }

    /// Insert already-typed pictures. Any id they carry is discarded.
    pub async fn insert_docs(&self, pictures: Vec<PictureDoc>) -> Result<Vec<ObjectId>> {
        let expected = pictures.len();
        let pictures: Vec<PictureDoc> = pictures
            .into_iter()
            .map(|pic| PictureDoc { id: None, ..pic })
            .collect();

        let ids = self
            .guarded("insert", self.store.insert_many(pictures))
            .await?;

        if ids.len() != expected {
            return Err(SnippetError::Database(format!(
                "Store assigned {} ids for {} pictures",
                ids.len(),
                expected
            )));
        }

        info!("Inserted {} pictures", ids.len());
        Ok(ids)
    }

    pub async fn find_by_id(&self, id: ObjectId) -> Result<PictureDoc> {
        self.guarded("find_by_id", self.store.find_by_id(id))
            .await?
            .ok_or_else(|| SnippetError::NotFound(format!("No picture with id {}", id)))
    }

    /// Every picture. Meant for small collections: there is no pagination.
    pub async fn find_all(&self) -> Result<Vec<PictureDoc>> {
        self.guarded("find_all", self.store.find_all()).await
    }

    /// Flush the whole collection. Irreversible.
    pub async fn delete_all(&self) -> Result<u64> {
        let deleted = self.guarded("delete_all", self.store.delete_all()).await?;
        info!("Deleted {} pictures", deleted);
        Ok(deleted)
    }

    pub async fn count(&self, filter: &PictureFilter) -> Result<u64> {
        self.guarded("count", self.store.count(filter)).await
    }

    /// Random sample of at most `amount` pictures matching `filter`
    pub async fn sample(&self, filter: &PictureFilter, amount: usize) -> Result<Vec<PictureDoc>> {
        if amount == 0 {
            return Ok(Vec::new());
        }
        self.guarded("sample", self.store.sample(filter, amount)).await
    }

    /// Apply `update` to the picture at `id`
    pub async fn update(&self, id: ObjectId, update: &PictureUpdate) -> Result<()> {
        let matched = self.guarded("update", self.store.update(id, update)).await?;
        if !matched {
            return Err(SnippetError::NotFound(format!("No picture with id {}", id)));
        }
        debug!("Updated picture {}", id);
        Ok(())
    }

    /// Conditionally mark a picture as sent to the recognizer.
    ///
    /// `None` means another caller claimed it first (or it vanished).
    pub async fn claim_for_recognizer(&self, id: ObjectId) -> Result<Option<PictureDoc>> {
        self.guarded("claim", self.store.claim_for_recognizer(id))
            .await
    }

    /// Reachability check bounded by `timeout` rather than the store timeout
    pub async fn ping(&self, timeout: Duration) -> Result<()> {
        match tokio::time::timeout(timeout, self.store.ping()).await {
            Ok(result) => result,
            Err(_) => Err(SnippetError::Database(format!(
                "ping timed out after {:?}",
                timeout
            ))),
        }
    }
}

fn decode_picture(index: usize, document: Value) -> Result<PictureDoc> {
    let Value::Object(mut fields) = document else {
        return Err(SnippetError::Validation(format!(
            "Document {} is not an object",
            index
        )));
    };

    for key in CLIENT_ID_KEYS {
        fields.remove(key);
    }

    serde_json::from_value(Value::Object(fields))
        .map_err(|e| SnippetError::Validation(format!("Document {}: {}", index, e)))
}
