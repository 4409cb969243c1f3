use mongodb::error::ErrorKind;

use shardstat_core::error::ShardError;

/// Documents that do not decode into the expected shape are metadata
/// problems; every other driver failure means the store is unreachable.
pub fn classify(context: &str, err: mongodb::error::Error) -> ShardError {
    match err.kind.as_ref() {
        ErrorKind::BsonDeserialization(_) | ErrorKind::BsonSerialization(_) => {
            ShardError::MalformedMetadata(format!("{context}: {err}"))
        }
        _ => ShardError::StoreUnavailable(anyhow::anyhow!("{context}: {err}")),
    }
}
