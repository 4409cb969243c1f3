use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::ShardResult;

/// The single document in `config.version`.
#[derive(Debug, Clone, PartialEq)]
pub struct VersionRecord {
    /// Relaxed extended JSON rendering of the stored document.
    pub document: serde_json::Value,
}

impl VersionRecord {
    pub fn new(document: serde_json::Value) -> Self {
        Self { document }
    }
}

/// One row of `config.databases`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseEntry {
    #[serde(rename = "_id")]
    pub name: String,
    #[serde(default)]
    pub partitioned: bool,
}

/// One row of `config.collections`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionEntry {
    /// Full namespace, `<database>.<collection>`.
    #[serde(rename = "_id")]
    pub namespace: String,
    #[serde(default)]
    pub dropped: bool,
    /// Newer servers key `config.chunks` by this instead of `ns`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uuid: Option<String>,
}

impl CollectionEntry {
    pub fn new(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            dropped: false,
            uuid: None,
        }
    }

    /// The namespace must be `<database>.` followed by the collection name.
    /// `abc.x` does not belong to `ab`.
    pub fn belongs_to(&self, database: &str) -> bool {
        self.namespace
            .strip_prefix(database)
            .is_some_and(|rest| rest.starts_with('.'))
    }
}

/// Prefix used to select a database's collections.
pub fn namespace_prefix(database: &str) -> String {
    format!("{database}.")
}

/// One grouped row from `config.chunks`: a shard and how many chunks of a
/// collection it holds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShardChunkCount {
    pub shard: String,
    #[serde(rename = "nChunks")]
    pub chunks: u64,
}

/// Per-shard chunk counts for one collection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShardChunkTally {
    counts: BTreeMap<String, u64>,
}

impl ShardChunkTally {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, shard: impl Into<String>, chunks: u64) {
        *self.counts.entry(shard.into()).or_insert(0) += chunks;
    }

    /// Iterates shards in ascending identifier order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, u64)> {
        self.counts.iter().map(|(shard, n)| (shard.as_str(), *n))
    }

    pub fn get(&self, shard: &str) -> Option<u64> {
        self.counts.get(shard).copied()
    }

    pub fn total(&self) -> u64 {
        self.counts.values().sum()
    }

    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }
}

impl FromIterator<ShardChunkCount> for ShardChunkTally {
    fn from_iter<I: IntoIterator<Item = ShardChunkCount>>(iter: I) -> Self {
        let mut tally = Self::new();
        for row in iter {
            tally.add(row.shard, row.chunks);
        }
        tally
    }
}

/// Read-only view over a cluster's sharding catalog.
///
/// Implementations issue one query per call; callers await each before
/// issuing the next.
#[async_trait]
pub trait MetadataStore: Send + Sync {
    /// The version document, or `None` on a deployment that is not sharded.
    async fn version(&self) -> ShardResult<Option<VersionRecord>>;

    /// All databases, sorted ascending by name.
    async fn databases(&self) -> ShardResult<Vec<DatabaseEntry>>;

    /// Collections whose namespace starts with `<database>.`, sorted
    /// ascending by namespace.
    async fn collections(&self, database: &str) -> ShardResult<Vec<CollectionEntry>>;

    /// Chunks of `collection` grouped by owning shard.
    async fn chunk_counts(&self, collection: &CollectionEntry)
        -> ShardResult<Vec<ShardChunkCount>>;
}
