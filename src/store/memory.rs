//! In-memory picture store
//!
//! Development and test backend. Entries live in a `DashMap`; each entry's
//! shard lock gives the same per-document atomicity MongoDB provides, which
//! is all the claim operation needs.

use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use bson::oid::ObjectId;
use dashmap::DashMap;
use rand::seq::SliceRandom;
use tracing::{debug, warn};

use super::{PictureFilter, PictureStore, PictureUpdate};
use crate::db::schemas::PictureDoc;
use crate::types::Result;

/// Stored picture plus its insertion sequence number
#[derive(Debug, Clone)]
struct Entry {
    seq: u64,
    doc: PictureDoc,
}

/// Picture store backed by process memory
#[derive(Debug, Default)]
pub struct MemoryPictureStore {
    entries: DashMap<ObjectId, Entry>,
    next_seq: AtomicU64,
}

impl MemoryPictureStore {
    pub fn new() -> Self {
        warn!("Picture store running in memory-only mode (no MongoDB)");
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn matching(&self, filter: &PictureFilter) -> Vec<PictureDoc> {
        self.entries
            .iter()
            .filter(|entry| filter.matches(&entry.doc))
            .map(|entry| entry.doc.clone())
            .collect()
    }
}

#[async_trait]
impl PictureStore for MemoryPictureStore {
    async fn ping(&self) -> Result<()> {
        Ok(())
    }

    async fn insert_many(&self, pictures: Vec<PictureDoc>) -> Result<Vec<ObjectId>> {
        let mut ids = Vec::with_capacity(pictures.len());

        for mut doc in pictures {
            let id = ObjectId::new();
            doc.id = Some(id);
            let seq = self.next_seq.fetch_add(1, Ordering::SeqCst);
            self.entries.insert(id, Entry { seq, doc });
            ids.push(id);
        }

        debug!("Inserted {} pictures in memory", ids.len());
        Ok(ids)
    }

    async fn find_by_id(&self, id: ObjectId) -> Result<Option<PictureDoc>> {
        Ok(self.entries.get(&id).map(|entry| entry.doc.clone()))
    }

    async fn find_all(&self) -> Result<Vec<PictureDoc>> {
        let mut entries: Vec<Entry> = self.entries.iter().map(|e| e.value().clone()).collect();
        entries.sort_by_key(|entry| entry.seq);
        Ok(entries.into_iter().map(|entry| entry.doc).collect())
    }

    async fn delete_all(&self) -> Result<u64> {
        let count = self.entries.len() as u64;
        self.entries.clear();
        Ok(count)
    }

    async fn count(&self, filter: &PictureFilter) -> Result<u64> {
        let count = self
            .entries
            .iter()
            .filter(|entry| filter.matches(&entry.doc))
            .count();
        Ok(count as u64)
    }

    async fn sample(&self, filter: &PictureFilter, amount: usize) -> Result<Vec<PictureDoc>> {
        let candidates = self.matching(filter);
        let mut rng = rand::thread_rng();
        Ok(candidates
            .choose_multiple(&mut rng, amount)
            .cloned()
            .collect())
    }

    async fn update(&self, id: ObjectId, update: &PictureUpdate) -> Result<bool> {
        match self.entries.get_mut(&id) {
            Some(mut entry) => {
                update.apply(&mut entry.doc);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn claim_for_recognizer(&self, id: ObjectId) -> Result<Option<PictureDoc>> {
        // get_mut holds the shard write lock across the check and the set
        let Some(mut entry) = self.entries.get_mut(&id) else {
            return Ok(None);
        };

        if !PictureFilter::for_recognizer().matches(&entry.doc) {
            return Ok(None);
        }

        entry.doc.sent_to_reco = true;
        Ok(Some(entry.doc.clone()))
    }
}
