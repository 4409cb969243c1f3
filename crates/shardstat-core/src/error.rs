use thiserror::Error;

#[derive(Error, Debug)]
pub enum ShardError {
    #[error("Metadata store unavailable: {0}")]
    StoreUnavailable(#[source] anyhow::Error),

    #[error("Malformed metadata: {0}")]
    MalformedMetadata(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Setup step failed: {step} -- {source}")]
    SetupStep {
        step: String,
        #[source]
        source: anyhow::Error,
    },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type ShardResult<T> = Result<T, ShardError>;
