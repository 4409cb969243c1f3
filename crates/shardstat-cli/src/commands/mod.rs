use std::path::PathBuf;

use clap::{Args, Subcommand};

use shardstat_core::config::ShardstatConfig;
use shardstat_mongo::mongo_config::MongoTargetConfig;

pub mod guide;
pub mod init;
pub mod status;
pub mod validate;

#[derive(Subcommand)]
pub enum Commands {
    /// Print databases, collections and chunk counts per shard
    Status(status::StatusArgs),
    /// Drop and re-create the configured collection and its indexes
    Init(init::InitArgs),
    /// Print the manual procedure for standing up sharding
    Guide(guide::GuideArgs),
    /// Validate a config file without connecting
    Validate(validate::ValidateArgs),
}

/// Connection flags shared by commands that talk to a cluster.
#[derive(Args)]
pub struct TargetArgs {
    /// Path to a YAML config file
    #[arg(short, long)]
    pub config: Option<PathBuf>,
    /// MongoDB connection string, overriding the config file
    #[arg(long, env = "SHARDSTAT_URL")]
    pub url: Option<String>,
}

impl TargetArgs {
    pub fn load(&self) -> anyhow::Result<(ShardstatConfig, MongoTargetConfig)> {
        let config = ShardstatConfig::load(self.config.as_deref())?;
        let target =
            MongoTargetConfig::from_yaml(&config.target)?.with_overrides(self.url.clone(), None);
        Ok((config, target))
    }
}
