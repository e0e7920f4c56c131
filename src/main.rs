//! snippet-store operator CLI

use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use tracing::{error, info};

use snippet_store::{
    config::{Args, Command},
    db::schemas::parse_id,
    logging, AnnotationValue, Annotator, FlagChange, MemoryPictureStore, MongoClient,
    MongoPictureStore, Mutator, PictureRepository, PictureStore, Selector, StatusAggregator,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file if present
    let _ = dotenvy::dotenv();

    let args = Args::parse();
    logging::init(&args.log_level, args.log_json);

    if let Err(e) = args.validate() {
        error!("Configuration error: {}", e);
        std::process::exit(1);
    }

    let (store, mongo): (Arc<dyn PictureStore>, Option<MongoClient>) = if args.memory {
        (Arc::new(MemoryPictureStore::new()), None)
    } else {
        let mongo = match MongoClient::connect(&args.mongodb_uri, &args.mongodb_db).await {
            Ok(client) => client,
            Err(e) => {
                error!("MongoDB connection failed: {}", e);
                std::process::exit(1);
            }
        };
        let store = MongoPictureStore::new(mongo.clone(), &args.collection).await?;
        (Arc::new(store), Some(mongo))
    };

    let repo = PictureRepository::with_timeout(store, args.store_timeout());
    let outcome = run(&args, repo).await;

    if let Some(mongo) = mongo {
        mongo.close().await;
    }

    match outcome {
        Ok(output) => {
            println!("{}", serde_json::to_string_pretty(&output)?);
            Ok(())
        }
        Err(e) => {
            error!("{:#}", e);
            std::process::exit(1);
        }
    }
}

async fn run(args: &Args, repo: PictureRepository) -> anyhow::Result<Value> {
    let selector = Selector::new(repo.clone());
    let mutator = Mutator::new(repo.clone());

    let output = match &args.command {
        Command::Status => {
            let status = StatusAggregator::with_health_timeout(repo, args.health_timeout());
            serde_json::to_value(status.health().await)?
        }
        Command::Insert { file } => {
            let documents: Vec<Value> = read_json(file).await?;
            let ids = repo.insert_batch(documents).await?;
            json!({ "inserted": ids.iter().map(|id| id.to_hex()).collect::<Vec<_>>() })
        }
        Command::Get { id } => serde_json::to_value(repo.find_by_id(parse_id(id)?).await?)?,
        Command::List => serde_json::to_value(repo.find_all().await?)?,
        Command::Unused { amount } => serde_json::to_value(selector.unused(*amount).await?)?,
        Command::Suggested { amount } => {
            serde_json::to_value(selector.with_suggestion(*amount).await?)?
        }
        Command::Page { amount } => serde_json::to_value(selector.annotator_page(*amount).await?)?,
        Command::Recognizer { amount } => {
            serde_json::to_value(selector.for_recognizer(*amount).await?)?
        }
        Command::Flags { file } => {
            let changes: Vec<FlagChange> = read_json(file).await?;
            mutator.apply_flag_changes(&changes).await?;
            json!({ "applied": changes.len() })
        }
        Command::Values { file, annotator } => {
            let entries: Vec<AnnotationValue> = read_json(file).await?;
            let annotator = annotator
                .as_deref()
                .map(Annotator::from_name)
                .unwrap_or(Annotator::Unspecified);
            mutator.apply_annotation_values(&entries, &annotator).await?;
            json!({ "applied": entries.len(), "annotator": annotator.as_stored() })
        }
        Command::Flush => {
            let deleted = repo.delete_all().await?;
            info!("Collection flushed");
            json!({ "deleted": deleted })
        }
    };

    Ok(output)
}

async fn read_json<T: DeserializeOwned>(path: &Path) -> anyhow::Result<T> {
    let raw = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("Invalid JSON in {}", path.display()))
}
