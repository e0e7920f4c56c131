//! Configuration for snippet-store
//!
//! CLI arguments and environment variable handling using clap.

use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand};

use crate::db::schemas::PICTURE_COLLECTION;
use crate::types::{Result, SnippetError};

/// snippet-store - picture records for the annotation pipeline
#[derive(Parser, Debug, Clone)]
#[command(name = "snippet-store")]
#[command(about = "Record store and sample selection for crowd annotation")]
pub struct Args {
    /// MongoDB connection URI
    #[arg(long, env = "MONGODB_URI", default_value = "mongodb://localhost:27017")]
    pub mongodb_uri: String,

    /// MongoDB database name
    #[arg(long, env = "MONGODB_DB", default_value = "snippets")]
    pub mongodb_db: String,

    /// Collection holding the pictures
    #[arg(long, env = "SNIPPET_COLLECTION", default_value = PICTURE_COLLECTION)]
    pub collection: String,

    /// Bound on every store call, in milliseconds
    #[arg(long, env = "STORE_TIMEOUT_MS", default_value = "5000")]
    pub store_timeout_ms: u64,

    /// Bound on the health ping, in milliseconds
    #[arg(long, env = "HEALTH_TIMEOUT_MS", default_value = "3000")]
    pub health_timeout_ms: u64,

    /// Use the in-memory store instead of MongoDB (development mode)
    #[arg(long, env = "MEMORY_STORE", default_value = "false")]
    pub memory: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// Emit logs as JSON lines
    #[arg(long, env = "LOG_JSON", default_value = "false")]
    pub log_json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Print collection counters and store reachability
    Status,
    /// Insert pictures from a JSON array file
    Insert { file: PathBuf },
    /// Print one picture
    Get { id: String },
    /// Print every picture
    List,
    /// Sample pictures nobody has annotated yet
    Unused { amount: usize },
    /// Sample recognizer proposals awaiting confirmation
    Suggested { amount: usize },
    /// Fill an annotator page, suggestions first
    Page { amount: usize },
    /// Claim pictures for the recognizer
    Recognizer { amount: usize },
    /// Apply flag changes from a JSON array file
    Flags { file: PathBuf },
    /// Apply transcriptions from a JSON array file
    Values {
        file: PathBuf,
        /// Annotator name; omitted means unspecified
        #[arg(long)]
        annotator: Option<String>,
    },
    /// Delete every picture
    Flush,
}

impl Args {
    pub fn store_timeout(&self) -> Duration {
        Duration::from_millis(self.store_timeout_ms)
    }

    pub fn health_timeout(&self) -> Duration {
        Duration::from_millis(self.health_timeout_ms)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.store_timeout_ms == 0 {
            return Err(SnippetError::Config(
                "STORE_TIMEOUT_MS must be greater than zero".to_string(),
            ));
        }
        if self.health_timeout_ms == 0 {
            return Err(SnippetError::Config(
                "HEALTH_TIMEOUT_MS must be greater than zero".to_string(),
            ));
        }
        if !self.memory && self.mongodb_db.trim().is_empty() {
            return Err(SnippetError::Config("MONGODB_DB must not be empty".to_string()));
        }
        if self.collection.trim().is_empty() {
            return Err(SnippetError::Config(
                "SNIPPET_COLLECTION must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}
