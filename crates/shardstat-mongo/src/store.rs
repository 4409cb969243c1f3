use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::bson::{doc, Bson, Document};
use mongodb::{Client, Database};
use serde::Deserialize;

use shardstat_core::error::{ShardError, ShardResult};
use shardstat_core::store::{
    CollectionEntry, DatabaseEntry, MetadataStore, ShardChunkCount, VersionRecord,
};

use crate::error::classify;

/// Sharding catalog read from the `config` database of a router.
pub struct MongoMetadataStore {
    db: Database,
}

#[derive(Debug, Deserialize)]
struct CollectionDoc {
    #[serde(rename = "_id")]
    namespace: String,
    #[serde(default)]
    dropped: bool,
    #[serde(default)]
    uuid: Option<mongodb::bson::Uuid>,
}

impl From<CollectionDoc> for CollectionEntry {
    fn from(doc: CollectionDoc) -> Self {
        Self {
            namespace: doc.namespace,
            dropped: doc.dropped,
            uuid: doc.uuid.map(|u| u.to_string()),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ChunkGroup {
    #[serde(rename = "_id")]
    shard: String,
    #[serde(rename = "nChunks")]
    chunks: i64,
}

impl MongoMetadataStore {
    pub fn new(client: &Client, config_database: &str) -> Self {
        Self {
            db: client.database(config_database),
        }
    }
}

/// `_id` anchored on `<database>.`, with the database name taken literally.
pub fn collection_filter(database: &str) -> Document {
    let pattern = format!("^{}\\.", regex::escape(database));
    doc! { "_id": { "$regex": pattern } }
}

/// Chunks owned by the collection, keyed by namespace or, on newer servers,
/// by collection uuid.
pub fn chunk_filter(collection: &CollectionEntry) -> ShardResult<Document> {
    let Some(uuid) = collection.uuid.as_deref() else {
        return Ok(doc! { "ns": collection.namespace.as_str() });
    };
    let uuid = mongodb::bson::Uuid::parse_str(uuid).map_err(|e| {
        ShardError::MalformedMetadata(format!("{}: bad collection uuid: {e}", collection.namespace))
    })?;
    Ok(doc! {
        "$or": [
            { "ns": collection.namespace.as_str() },
            { "uuid": uuid },
        ]
    })
}

#[async_trait]
impl MetadataStore for MongoMetadataStore {
    async fn version(&self) -> ShardResult<Option<VersionRecord>> {
        let version = self
            .db
            .collection::<Document>("version")
            .find_one(doc! {})
            .await
            .map_err(|e| classify("config.version", e))?;

        Ok(version.map(|d| VersionRecord::new(Bson::Document(d).into_relaxed_extjson())))
    }

    async fn databases(&self) -> ShardResult<Vec<DatabaseEntry>> {
        let cursor = self
            .db
            .collection::<DatabaseEntry>("databases")
            .find(doc! {})
            .sort(doc! { "_id": 1 })
            .await
            .map_err(|e| classify("config.databases", e))?;

        cursor
            .try_collect()
            .await
            .map_err(|e| classify("config.databases", e))
    }

    async fn collections(&self, database: &str) -> ShardResult<Vec<CollectionEntry>> {
        let cursor = self
            .db
            .collection::<CollectionDoc>("collections")
            .find(collection_filter(database))
            .sort(doc! { "_id": 1 })
            .await
            .map_err(|e| classify("config.collections", e))?;

        let docs: Vec<CollectionDoc> = cursor
            .try_collect()
            .await
            .map_err(|e| classify("config.collections", e))?;
        Ok(docs.into_iter().map(CollectionEntry::from).collect())
    }

    async fn chunk_counts(
        &self,
        collection: &CollectionEntry,
    ) -> ShardResult<Vec<ShardChunkCount>> {
        let filter = chunk_filter(collection)?;
        let pipeline = vec![
            doc! { "$match": filter },
            doc! { "$group": { "_id": "$shard", "nChunks": { "$sum": 1 } } },
        ];

        let rows: Vec<Document> = self
            .db
            .collection::<Document>("chunks")
            .aggregate(pipeline)
            .await
            .map_err(|e| classify("config.chunks", e))?
            .try_collect()
            .await
            .map_err(|e| classify("config.chunks", e))?;

        rows.into_iter()
            .map(|row| {
                let g: ChunkGroup = mongodb::bson::from_document(row).map_err(|e| {
                    ShardError::MalformedMetadata(format!(
                        "{}: unexpected chunk group: {e}",
                        collection.namespace
                    ))
                })?;
                let chunks = u64::try_from(g.chunks).map_err(|_| {
                    ShardError::MalformedMetadata(format!(
                        "{}: negative chunk count for {}",
                        collection.namespace, g.shard
                    ))
                })?;
                Ok(ShardChunkCount {
                    shard: g.shard,
                    chunks,
                })
            })
            .collect()
    }
}
