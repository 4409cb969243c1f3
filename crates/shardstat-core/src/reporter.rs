use std::fmt;

use crate::error::ShardResult;
use crate::store::{MetadataStore, ShardChunkTally, VersionRecord};

/// Printed in place of a report when `config.version` is empty.
pub const NOT_SHARDED_MESSAGE: &str = "not a shard deployment";

/// Chunk distribution of one collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionSection {
    pub namespace: String,
    pub tally: ShardChunkTally,
}

/// A partitioned database and its live collections.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseSection {
    pub name: String,
    pub collections: Vec<CollectionSection>,
}

/// Fully materialized sharding status, rendered only once complete.
#[derive(Debug, Clone, PartialEq)]
pub struct ShardingReport {
    pub version: VersionRecord,
    pub databases: Vec<DatabaseSection>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ReportOutcome {
    NotSharded,
    Report(ShardingReport),
}

impl ReportOutcome {
    pub fn is_sharded(&self) -> bool {
        matches!(self, Self::Report(_))
    }
}

impl fmt::Display for ShardingReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "  sharding version: {}", self.version.document)?;
        writeln!(f, "  shards:")?;
        for db in &self.databases {
            for coll in &db.collections {
                writeln!(f, "\t\t{} chunks:", coll.namespace)?;
                for (shard, chunks) in coll.tally.iter() {
                    writeln!(f, "\t\t\t\t{shard}\t{chunks}")?;
                }
            }
        }
        Ok(())
    }
}

impl fmt::Display for ReportOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotSharded => f.write_str(NOT_SHARDED_MESSAGE),
            Self::Report(report) => write!(f, "{report}"),
        }
    }
}

/// Walk the sharding catalog and build the status report.
///
/// `verbose` is accepted for compatibility and does not change the output.
pub async fn generate_report(
    store: &dyn MetadataStore,
    verbose: bool,
) -> ShardResult<ReportOutcome> {
    let Some(version) = store.version().await? else {
        tracing::info!("No version record, deployment is not sharded");
        return Ok(ReportOutcome::NotSharded);
    };

    tracing::debug!(verbose, "Building sharding report");

    let mut databases = Vec::new();
    for db in store.databases().await? {
        if !db.partitioned {
            continue;
        }

        let mut collections = Vec::new();
        for coll in store.collections(&db.name).await? {
            if coll.dropped || !coll.belongs_to(&db.name) {
                continue;
            }

            let tally: ShardChunkTally = store.chunk_counts(&coll).await?.into_iter().collect();
            tracing::debug!(
                namespace = %coll.namespace,
                shards = tally.len(),
                total_chunks = tally.total(),
                "Tallied chunks"
            );
            collections.push(CollectionSection {
                namespace: coll.namespace,
                tally,
            });
        }

        databases.push(DatabaseSection {
            name: db.name,
            collections,
        });
    }

    tracing::info!(partitioned_databases = databases.len(), "Sharding report ready");

    Ok(ReportOutcome::Report(ShardingReport { version, databases }))
}
