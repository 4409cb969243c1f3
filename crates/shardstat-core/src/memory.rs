//! In-memory stand-ins for a cluster, used to exercise the reporter and the
//! setup runner without a live deployment. Built for unit tests and behind
//! the `testing` feature for integration tests.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;

use crate::error::{ShardError, ShardResult};
use crate::setup::SetupTarget;
use crate::store::{
    namespace_prefix, CollectionEntry, DatabaseEntry, MetadataStore, ShardChunkCount,
    VersionRecord,
};

/// Error kind injected into a chosen query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fault {
    Unavailable,
    Malformed,
}

impl Fault {
    fn into_error(self, query: &str) -> ShardError {
        match self {
            Self::Unavailable => ShardError::StoreUnavailable(anyhow::anyhow!(
                "connection reset during {query} query"
            )),
            Self::Malformed => {
                ShardError::MalformedMetadata(format!("config.{query}: missing field `_id`"))
            }
        }
    }
}

/// Catalog held in vectors. Chunk groups come back in first-seen order,
/// like an unsorted server-side grouping.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    version: Option<serde_json::Value>,
    databases: Vec<DatabaseEntry>,
    collections: Vec<CollectionEntry>,
    /// (owner, shard) per chunk; the owner is a namespace or a collection uuid.
    chunks: Vec<(String, String)>,
    fail_on: Option<(String, Fault)>,
    calls: Mutex<Vec<String>>,
}

impl InMemoryStore {
    pub fn sharded(version: serde_json::Value) -> Self {
        Self {
            version: Some(version),
            ..Self::default()
        }
    }

    pub fn add_database(&mut self, entry: DatabaseEntry) {
        self.databases.push(entry);
    }

    pub fn add_collection(&mut self, entry: CollectionEntry) {
        self.collections.push(entry);
    }

    pub fn add_chunk(&mut self, namespace: &str, shard: &str) {
        self.chunks.push((namespace.to_string(), shard.to_string()));
    }

    /// A chunk keyed by collection uuid instead of namespace.
    pub fn add_chunk_by_uuid(&mut self, uuid: &str, shard: &str) {
        self.chunks.push((uuid.to_string(), shard.to_string()));
    }

    /// Make the named query (`version`, `databases`, `collections`, `chunks`)
    /// fail as if the store went away.
    pub fn failing_on(self, query: &str) -> Self {
        self.faulting_on(query, Fault::Unavailable)
    }

    pub fn faulting_on(mut self, query: &str, fault: Fault) -> Self {
        self.fail_on = Some((query.to_string(), fault));
        self
    }

    /// Queries issued so far, in order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    fn record(&self, query: &str) -> ShardResult<()> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(query.to_string());
        }
        match &self.fail_on {
            Some((failing, fault)) if failing == query => Err(fault.into_error(query)),
            _ => Ok(()),
        }
    }
}

#[async_trait]
impl MetadataStore for InMemoryStore {
    async fn version(&self) -> ShardResult<Option<VersionRecord>> {
        self.record("version")?;
        Ok(self.version.clone().map(VersionRecord::new))
    }

    async fn databases(&self) -> ShardResult<Vec<DatabaseEntry>> {
        self.record("databases")?;
        let mut dbs = self.databases.clone();
        dbs.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(dbs)
    }

    async fn collections(&self, database: &str) -> ShardResult<Vec<CollectionEntry>> {
        self.record("collections")?;
        let prefix = namespace_prefix(database);
        let mut colls: Vec<CollectionEntry> = self
            .collections
            .iter()
            .filter(|c| c.namespace.starts_with(&prefix))
            .cloned()
            .collect();
        colls.sort_by(|a, b| a.namespace.cmp(&b.namespace));
        Ok(colls)
    }

    async fn chunk_counts(
        &self,
        collection: &CollectionEntry,
    ) -> ShardResult<Vec<ShardChunkCount>> {
        self.record("chunks")?;
        let mut groups: Vec<ShardChunkCount> = Vec::new();
        for (owner, shard) in &self.chunks {
            let owned = owner == &collection.namespace
                || collection.uuid.as_deref() == Some(owner.as_str());
            if !owned {
                continue;
            }
            match groups.iter_mut().find(|g| &g.shard == shard) {
                Some(group) => group.chunks += 1,
                None => groups.push(ShardChunkCount {
                    shard: shard.clone(),
                    chunks: 1,
                }),
            }
        }
        Ok(groups)
    }
}

/// Records setup commands and fails selected ones a fixed number of times.
#[derive(Debug, Default)]
pub struct RecordingTarget {
    calls: Mutex<Vec<String>>,
    failures: Mutex<HashMap<String, u32>>,
}

impl RecordingTarget {
    /// Fail the command labelled `label` (`drop <db>.<coll>` or
    /// `index <db>.<coll>.<field>`) for its next `times` invocations.
    pub fn failing(self, label: &str, times: u32) -> Self {
        if let Ok(mut failures) = self.failures.lock() {
            failures.insert(label.to_string(), times);
        }
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    fn record(&self, label: String) -> ShardResult<()> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(label.clone());
        }
        let mut failures = self
            .failures
            .lock()
            .map_err(|_| ShardError::Other(anyhow::anyhow!("failure table poisoned")))?;
        match failures.get_mut(&label) {
            Some(remaining) if *remaining > 0 => {
                *remaining -= 1;
                Err(ShardError::StoreUnavailable(anyhow::anyhow!(
                    "{label}: server selection timeout"
                )))
            }
            _ => Ok(()),
        }
    }
}

#[async_trait]
impl SetupTarget for RecordingTarget {
    async fn drop_collection(&self, database: &str, collection: &str) -> ShardResult<()> {
        self.record(format!("drop {database}.{collection}"))
    }

    async fn create_index(
        &self,
        database: &str,
        collection: &str,
        field: &str,
    ) -> ShardResult<String> {
        self.record(format!("index {database}.{collection}.{field}"))?;
        Ok(format!("{field}_1"))
    }
}
