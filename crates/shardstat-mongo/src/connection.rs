use mongodb::bson::doc;
use mongodb::Client;

use shardstat_core::error::{ShardError, ShardResult};

use crate::mongo_config::MongoTargetConfig;

/// Connect and verify the deployment answers a ping.
pub async fn connect(config: &MongoTargetConfig) -> ShardResult<Client> {
    let client = Client::with_uri_str(&config.connection_url)
        .await
        .map_err(|e| {
            ShardError::StoreUnavailable(anyhow::anyhow!("MongoDB connection failed: {e}"))
        })?;

    client
        .database("admin")
        .run_command(doc! { "ping": 1 })
        .await
        .map_err(|e| ShardError::StoreUnavailable(anyhow::anyhow!("MongoDB ping failed: {e}")))?;

    tracing::info!("MongoDB connection verified");
    Ok(client)
}
