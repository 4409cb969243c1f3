use async_trait::async_trait;
use mongodb::bson::Document;
use mongodb::{Client, IndexModel};

use shardstat_core::error::{ShardError, ShardResult};
use shardstat_core::setup::SetupTarget;

/// Runs setup steps through the driver's admin helpers.
pub struct MongoSetupTarget {
    client: Client,
}

impl MongoSetupTarget {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

fn command_failed(action: &str, namespace: &str, e: mongodb::error::Error) -> ShardError {
    ShardError::StoreUnavailable(anyhow::anyhow!("{action} on {namespace} failed: {e}"))
}

#[async_trait]
impl SetupTarget for MongoSetupTarget {
    async fn drop_collection(&self, database: &str, collection: &str) -> ShardResult<()> {
        // The driver reports a missing namespace as success.
        self.client
            .database(database)
            .collection::<Document>(collection)
            .drop()
            .await
            .map_err(|e| command_failed("drop", &format!("{database}.{collection}"), e))
    }

    async fn create_index(
        &self,
        database: &str,
        collection: &str,
        field: &str,
    ) -> ShardResult<String> {
        let mut keys = Document::new();
        keys.insert(field, 1);
        let index = IndexModel::builder().keys(keys).build();
        let result = self
            .client
            .database(database)
            .collection::<Document>(collection)
            .create_index(index)
            .await
            .map_err(|e| command_failed("createIndexes", &format!("{database}.{collection}"), e))?;
        Ok(result.index_name)
    }
}
