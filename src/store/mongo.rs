//! MongoDB picture store

use async_trait::async_trait;
use bson::{doc, oid::ObjectId, Bson, Document};
use futures_util::TryStreamExt;
use mongodb::{options::ReturnDocument, Collection};
use tracing::{debug, info};

use super::{PictureFilter, PictureStore, PictureUpdate};
use crate::db::schemas::PictureDoc;
use crate::db::MongoClient;
use crate::types::{Result, SnippetError};

/// Picture store backed by a MongoDB collection
#[derive(Clone, Debug)]
pub struct MongoPictureStore {
    mongo: MongoClient,
    collection: Collection<PictureDoc>,
}

impl MongoPictureStore {
    /// Open the collection on an established client, creating its indexes
    pub async fn new(mongo: MongoClient, collection_name: &str) -> Result<Self> {
        let collection = mongo.collection::<PictureDoc>(collection_name).await?;

        info!(
            "Picture store initialized on '{}.{}'",
            mongo.db_name(),
            collection_name
        );

        Ok(Self { mongo, collection })
    }

    /// Run an aggregation pipeline and decode every resulting document
    async fn aggregate_pictures(&self, pipeline: Vec<Document>) -> Result<Vec<PictureDoc>> {
        let cursor = self
            .collection
            .aggregate(pipeline)
            .await
            .map_err(|e| SnippetError::Database(format!("Aggregate failed: {}", e)))?;

        let docs: Vec<Document> = cursor
            .try_collect()
            .await
            .map_err(|e| SnippetError::Database(format!("Cursor failed: {}", e)))?;

        docs.into_iter()
            .map(|d| bson::from_document(d).map_err(SnippetError::from))
            .collect()
    }
}

#[async_trait]
impl PictureStore for MongoPictureStore {
    async fn ping(&self) -> Result<()> {
        self.mongo.ping().await
    }

    async fn insert_many(&self, pictures: Vec<PictureDoc>) -> Result<Vec<ObjectId>> {
        if pictures.is_empty() {
            return Ok(Vec::new());
        }

        let expected = pictures.len();
        let result = self
            .collection
            .insert_many(pictures)
            .await
            .map_err(|e| SnippetError::Database(format!("Insert failed: {}", e)))?;

        // inserted_ids is keyed by input position
        let ids = (0..expected)
            .map(|index| match result.inserted_ids.get(&index) {
                Some(Bson::ObjectId(id)) => Ok(*id),
                other => Err(SnippetError::Database(format!(
                    "Unexpected inserted id at position {}: {:?}",
                    index, other
                ))),
            })
            .collect::<Result<Vec<_>>>()?;

        debug!("Inserted {} pictures", ids.len());
        Ok(ids)
    }

    async fn find_by_id(&self, id: ObjectId) -> Result<Option<PictureDoc>> {
        self.collection
            .find_one(doc! { "_id": id })
            .await
            .map_err(|e| SnippetError::Database(format!("Find failed: {}", e)))
    }

    async fn find_all(&self) -> Result<Vec<PictureDoc>> {
        let cursor = self
            .collection
            .find(doc! {})
            .await
            .map_err(|e| SnippetError::Database(format!("Find failed: {}", e)))?;

        cursor
            .try_collect()
            .await
            .map_err(|e| SnippetError::Database(format!("Cursor failed: {}", e)))
    }

    async fn delete_all(&self) -> Result<u64> {
        let result = self
            .collection
            .delete_many(doc! {})
            .await
            .map_err(|e| SnippetError::Database(format!("Delete failed: {}", e)))?;
        Ok(result.deleted_count)
    }

    async fn count(&self, filter: &PictureFilter) -> Result<u64> {
        self.collection
            .count_documents(filter.to_filter())
            .await
            .map_err(|e| SnippetError::Database(format!("Count failed: {}", e)))
    }

    async fn sample(&self, filter: &PictureFilter, amount: usize) -> Result<Vec<PictureDoc>> {
        // $sample rejects a zero size
        if amount == 0 {
            return Ok(Vec::new());
        }

        let pipeline = sample_pipeline(filter, amount);
        self.aggregate_pictures(pipeline).await
    }

    async fn update(&self, id: ObjectId, update: &PictureUpdate) -> Result<bool> {
        // An empty $set is rejected by the server
        if update.is_empty() {
            return Ok(self.find_by_id(id).await?.is_some());
        }

        let result = self
            .collection
            .update_one(doc! { "_id": id }, update.to_pipeline())
            .await
            .map_err(|e| SnippetError::Database(format!("Update failed: {}", e)))?;

        debug!(
            "Matched {} and updated {} pictures for {}",
            result.matched_count, result.modified_count, id
        );
        Ok(result.matched_count > 0)
    }

    async fn claim_for_recognizer(&self, id: ObjectId) -> Result<Option<PictureDoc>> {
        self.collection
            .find_one_and_update(
                claim_filter(id),
                doc! { "$set": { "SentToReco": true } },
            )
            .return_document(ReturnDocument::After)
            .await
            .map_err(|e| SnippetError::Database(format!("Claim failed: {}", e)))
    }
}

/// `$match` then `$sample`; sizes past `i64::MAX` saturate
fn sample_pipeline(filter: &PictureFilter, amount: usize) -> Vec<Document> {
    let size = i64::try_from(amount).unwrap_or(i64::MAX);
    vec![
        doc! { "$match": filter.to_filter() },
        doc! { "$sample": { "size": size } },
    ]
}

/// The picture at `id`, only while it is still a recognizer candidate
fn claim_filter(id: ObjectId) -> Document {
    let mut filter = PictureFilter::for_recognizer().to_filter();
    filter.insert("_id", id);
    filter
}

#[cfg(test)]
mod tests {
    //! These need a running MongoDB; run with
    //! `MONGODB_URI=mongodb://localhost:27017 cargo test -- --ignored`

    use super::*;
    use crate::db::schemas::{Annotation, Annotator, Flag};

    async fn open(collection: &str) -> MongoPictureStore {
        let uri = std::env::var("MONGODB_URI")
            .unwrap_or_else(|_| "mongodb://localhost:27017".to_string());
        let mongo = MongoClient::connect(&uri, "snippet_store_test").await.unwrap();
        let store = MongoPictureStore::new(mongo, collection).await.unwrap();
        store.delete_all().await.unwrap();
        store
    }

    #[tokio::test]
    #[ignore]
    async fn test_insert_and_find() {
        let store = open("test_insert_and_find").await;
        let pic = PictureDoc::new(Annotation::line("loc_0"), "/temp/none0", "none0.png");

        let ids = store.insert_many(vec![pic.clone()]).await.unwrap();
        let found = store.find_by_id(ids[0]).await.unwrap().unwrap();

        assert_eq!(found.id, Some(ids[0]));
        assert_eq!(PictureDoc { id: None, ..found }, pic);
    }

    #[tokio::test]
    #[ignore]
    async fn test_claim_is_conditional() {
        let store = open("test_claim_is_conditional").await;
        let pic = PictureDoc::new(Annotation::default(), "/temp/none0", "none0.png");
        let ids = store.insert_many(vec![pic]).await.unwrap();

        assert!(store.claim_for_recognizer(ids[0]).await.unwrap().is_some());
        assert!(store.claim_for_recognizer(ids[0]).await.unwrap().is_none());
        assert_eq!(
            store.count(&PictureFilter::for_recognizer()).await.unwrap(),
            0
        );
    }

    #[tokio::test]
    #[ignore]
    async fn test_sample_respects_filter() {
        let store = open("test_sample_respects_filter").await;
        let mut unreadable = PictureDoc::new(Annotation::default(), "/temp/u", "u.png");
        unreadable.unreadable = true;
        let fresh = PictureDoc::new(Annotation::default(), "/temp/f", "f.png");
        store.insert_many(vec![unreadable, fresh]).await.unwrap();

        let sample = store.sample(&PictureFilter::unused(), 5).await.unwrap();
        assert_eq!(sample.len(), 1);
        assert_eq!(sample[0].url, "/temp/f");
    }

    #[test]
    fn test_sample_size_saturates() {
        let pipeline = sample_pipeline(&PictureFilter::unused(), usize::MAX);
        let size = pipeline[1]
            .get_document("$sample")
            .unwrap()
            .get_i64("size")
            .unwrap();
        assert_eq!(size, i64::MAX);
    }

    #[test]
    fn test_claim_filter_requires_candidate() {
        let id = ObjectId::new();
        let filter = claim_filter(id);
        assert_eq!(filter.get_object_id("_id").unwrap(), id);
        assert!(!filter.get_bool("SentToReco").unwrap());
        assert!(!filter.get_bool("Annotated").unwrap());
        assert!(!filter.get_bool("Unreadable").unwrap());
    }

    #[tokio::test]
    #[ignore]
    async fn test_claim_skips_unreadable() {
        let store = open("test_claim_skips_unreadable").await;
        let mut pic = PictureDoc::new(Annotation::default(), "/temp/u", "u.png");
        pic.unreadable = true;
        let ids = store.insert_many(vec![pic]).await.unwrap();

        assert!(store.claim_for_recognizer(ids[0]).await.unwrap().is_none());
    }

    #[tokio::test]
    #[ignore]
    async fn test_value_on_null_data_list() {
        let store = open("test_value_on_null_data_list").await;
        let raw = store.collection.clone_with_type::<Document>();
        let id = ObjectId::new();
        raw.insert_one(doc! {
            "_id": id,
            "PiFF": { "Meta": { "Type": "line", "URL": "" }, "Location": null, "Data": null },
            "Url": "/temp/legacy",
            "Annotator": "",
        })
        .await
        .unwrap();
        let bare = ObjectId::new();
        raw.insert_one(doc! { "_id": bare, "Url": "/temp/bare" })
            .await
            .unwrap();

        let update = PictureUpdate::new()
            .set_first_value("$hello")
            .set_flag(Flag::Annotated, true)
            .set_annotator(Annotator::Recognizer);
        assert!(store.update(id, &update).await.unwrap());
        assert!(store.update(bare, &update).await.unwrap());

        for target in [id, bare] {
            let pic = store.find_by_id(target).await.unwrap().unwrap();
            assert_eq!(pic.annotation.values.len(), 1);
            assert_eq!(pic.annotation.first_value(), Some("$hello"));
            assert!(pic.is_recognizer_proposal());
        }
    }

    #[tokio::test]
    #[ignore]
    async fn test_value_keeps_other_entries() {
        let store = open("test_value_keeps_other_entries").await;
        let mut annotation = Annotation::line("loc_0");
        annotation.values.push(annotation.values[0].clone());
        let ids = store
            .insert_many(vec![PictureDoc::new(annotation, "/temp/two", "two.png")])
            .await
            .unwrap();

        let update = PictureUpdate::new().set_first_value("first");
        assert!(store.update(ids[0], &update).await.unwrap());

        let pic = store.find_by_id(ids[0]).await.unwrap().unwrap();
        assert_eq!(pic.annotation.values.len(), 2);
        assert_eq!(pic.annotation.values[0].value, "first");
        assert_eq!(pic.annotation.values[0].location_id, "loc_0");
        assert_eq!(pic.annotation.values[1].value, "");
    }

    #[tokio::test]
    #[ignore]
    async fn test_ping() {
        let store = open("test_ping").await;
        store.ping().await.unwrap();
    }
}
