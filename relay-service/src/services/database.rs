//! Database operations for the relay service.
//!
//! History records live in a single MongoDB collection.

use crate::models::HistoryRecord;
use crate::services::history_store::HistoryStore;
use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::{
    bson::doc,
    options::{FindOptions, IndexOptions},
    Client as MongoClient, Collection, Database, IndexModel,
};
use service_core::error::AppError;

/// Collection name Mongoose derives for the `History` model.
pub const HISTORY_COLLECTION: &str = "histories";

#[derive(Clone)]
pub struct HistoryDb {
    client: MongoClient,
    db: Database,
}

impl HistoryDb {
    /// Build a client for `uri`.
    ///
    /// The driver connects lazily, so this only fails on an unusable
    /// connection string. The database named in the URI wins over `database`.
    pub async fn connect(uri: &str, database: &str) -> Result<Self, AppError> {
        tracing::info!("Connecting to MongoDB");
        let client = MongoClient::with_uri_str(uri).await.map_err(|e| {
            tracing::error!("Failed to create MongoDB client: {}", e);
            AppError::DatabaseError(anyhow::anyhow!(e.to_string()))
        })?;
        let db = client
            .default_database()
            .unwrap_or_else(|| client.database(database));
        tracing::info!(database = %db.name(), "MongoDB client ready");
        Ok(Self { client, db })
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    pub async fn initialize_indexes(&self) -> Result<(), AppError> {
        tracing::info!("Creating MongoDB indexes for relay-service");

        let date_index = IndexModel::builder()
            .keys(doc! { "date": -1 })
            .options(IndexOptions::builder().name("date_idx".to_string()).build())
            .build();

        self.histories()
            .create_index(date_index, None)
            .await
            .map_err(|e| {
                tracing::error!("Failed to create date index: {}", e);
                AppError::DatabaseError(anyhow::anyhow!(e.to_string()))
            })?;

        tracing::info!("Successfully created all MongoDB indexes");
        Ok(())
    }

    // Collection accessors

    pub fn histories(&self) -> Collection<HistoryRecord> {
        self.db.collection(HISTORY_COLLECTION)
    }
}

#[async_trait]
impl HistoryStore for HistoryDb {
    async fn append(&self, mut record: HistoryRecord) -> Result<HistoryRecord, AppError> {
        let result = self
            .histories()
            .insert_one(&record, None)
            .await
            .map_err(|e| {
                tracing::error!("Failed to insert history record: {}", e);
                AppError::DatabaseError(anyhow::anyhow!(e.to_string()))
            })?;

        record.id = result.inserted_id.as_object_id();
        Ok(record)
    }

    async fn recent(&self, limit: i64) -> Result<Vec<HistoryRecord>, AppError> {
        let options = FindOptions::builder()
            .sort(doc! { "date": -1, "_id": -1 })
            .limit(limit)
            .build();

        let cursor = self.histories().find(doc! {}, options).await.map_err(|e| {
            tracing::error!("Failed to query history: {}", e);
            AppError::DatabaseError(anyhow::anyhow!(e.to_string()))
        })?;

        let records: Vec<HistoryRecord> = cursor.try_collect().await.map_err(|e| {
            tracing::error!("Failed to collect history records: {}", e);
            AppError::DatabaseError(anyhow::anyhow!(e.to_string()))
        })?;

        Ok(records)
    }

    async fn health_check(&self) -> Result<(), AppError> {
        self.client
            .database("admin")
            .run_command(doc! { "ping": 1 }, None)
            .await
            .map_err(|e| {
                tracing::error!("MongoDB health check failed: {}", e);
                AppError::DatabaseError(anyhow::anyhow!(e.to_string()))
            })?;
        Ok(())
    }

    async fn prepare(&self) -> Result<(), AppError> {
        self.health_check().await?;
        self.initialize_indexes().await
    }
}
