//! MongoDB client wrapper
//!
//! The connection is process-wide: opened once at startup, shared by every
//! request through cheap clones, and closed at process exit.

use std::time::Duration;

use bson::{doc, Document};
use mongodb::{options::IndexOptions, Client, Collection, IndexModel};
use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, info};

use crate::types::{Result, SnippetError};

/// Bound on the ping issued while connecting
const CONNECT_PING_TIMEOUT: Duration = Duration::from_secs(3);

/// Trait for schemas that provide index definitions
pub trait IntoIndexes {
    fn into_indices() -> Vec<(Document, Option<IndexOptions>)>;
}

/// MongoDB client wrapper
#[derive(Clone, Debug)]
pub struct MongoClient {
    client: Client,
    db_name: String,
}

impl MongoClient {
    /// Connect and verify the server answers a ping
    pub async fn connect(uri: &str, db_name: &str) -> Result<Self> {
        info!("Connecting to MongoDB at {}", uri);

        // Use serverSelectionTimeoutMS to avoid hanging on unreachable MongoDB
        let timeout_uri = if uri.contains('?') {
            format!("{}&serverSelectionTimeoutMS=3000&connectTimeoutMS=3000", uri)
        } else {
            format!("{}?serverSelectionTimeoutMS=3000&connectTimeoutMS=3000", uri)
        };

        let client = Client::with_uri_str(&timeout_uri)
            .await
            .map_err(|e| SnippetError::Database(format!("Failed to connect to MongoDB: {}", e)))?;

        let mongo = Self {
            client,
            db_name: db_name.to_string(),
        };
        match tokio::time::timeout(CONNECT_PING_TIMEOUT, mongo.ping()).await {
            Ok(result) => result?,
            Err(_) => {
                return Err(SnippetError::Database(format!(
                    "MongoDB ping timed out after {:?}",
                    CONNECT_PING_TIMEOUT
                )))
            }
        }

        info!("Connected to MongoDB database '{}'", db_name);
        Ok(mongo)
    }

    /// Ping the primary. Callers bound the wait themselves.
    pub async fn ping(&self) -> Result<()> {
        let db = self.client.database(&self.db_name);
        db.run_command(doc! { "ping": 1 })
            .await
            .map(|_| ())
            .map_err(|e| SnippetError::Database(format!("MongoDB ping failed: {}", e)))
    }

    /// Get a typed collection, creating its schema indexes
    pub async fn collection<T>(&self, name: &str) -> Result<Collection<T>>
    where
        T: Serialize + DeserializeOwned + Unpin + Send + Sync + IntoIndexes,
    {
        let collection = self.client.database(&self.db_name).collection::<T>(name);
        apply_indexes(&collection).await?;
        Ok(collection)
    }

    /// Close the connection pool
    pub async fn close(self) {
        self.client.shutdown().await;
        info!("Connection to MongoDB closed");
    }

    /// Get the database name
    pub fn db_name(&self) -> &str {
        &self.db_name
    }
}

/// Apply schema-defined indexes
async fn apply_indexes<T>(collection: &Collection<T>) -> Result<()>
where
    T: Send + Sync + IntoIndexes,
{
    let schema_indices = T::into_indices();

    if schema_indices.is_empty() {
        return Ok(());
    }

    let indices: Vec<IndexModel> = schema_indices
        .into_iter()
        .map(|(keys, opts)| IndexModel::builder().keys(keys).options(opts).build())
        .collect();

    collection
        .create_indexes(indices)
        .await
        .map_err(|e| SnippetError::Database(format!("Failed to create indexes: {}", e)))?;

    debug!("Indexes applied on '{}'", collection.name());
    Ok(())
}
