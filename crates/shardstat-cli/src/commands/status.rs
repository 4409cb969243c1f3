use clap::Args;

use shardstat_core::reporter::generate_report;
use shardstat_mongo::connection::connect;
use shardstat_mongo::store::MongoMetadataStore;

use super::TargetArgs;

#[derive(Args)]
pub struct StatusArgs {
    #[command(flatten)]
    pub target: TargetArgs,
    /// Database holding the sharding catalog
    #[arg(long)]
    pub config_db: Option<String>,
    /// Accepted for compatibility; output is unchanged
    #[arg(long)]
    pub verbose_report: bool,
}

pub async fn execute(args: StatusArgs) -> anyhow::Result<()> {
    let (config, target) = args.target.load()?;
    let target = target.with_overrides(None, args.config_db);

    let client = connect(&target).await?;
    let store = MongoMetadataStore::new(&client, &target.config_database);

    let verbose = args.verbose_report || config.report.verbose;
    let outcome = generate_report(&store, verbose).await?;
    println!("{outcome}");

    Ok(())
}
