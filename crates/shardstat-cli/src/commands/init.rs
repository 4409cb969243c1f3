use clap::Args;

use shardstat_core::setup::run_setup;
use shardstat_mongo::connection::connect;
use shardstat_mongo::setup_target::MongoSetupTarget;

use super::TargetArgs;

#[derive(Args)]
pub struct InitArgs {
    #[command(flatten)]
    pub target: TargetArgs,
    /// Print the plan without touching the cluster
    #[arg(long)]
    pub dry_run: bool,
}

pub async fn execute(args: InitArgs) -> anyhow::Result<()> {
    let (config, target) = args.target.load()?;
    let plan = config.setup;
    plan.validate()?;

    tracing::info!(database = %plan.database, steps = plan.steps.len(), "Loaded setup plan");

    if args.dry_run {
        println!("Setup plan for {}:", plan.database);
        for (i, step) in plan.steps.iter().enumerate() {
            println!("  {}. {step}", i + 1);
        }
        println!(
            "Retries: up to {} attempts, {:?} apart",
            plan.retry.max_attempts, plan.retry.backoff
        );
        return Ok(());
    }

    let client = connect(&target).await?;
    let report = run_setup(&MongoSetupTarget::new(client), &plan).await;
    println!("{report}");

    if let Some(failed) = report.failed_step() {
        anyhow::bail!("setup stopped at '{}'", failed.step);
    }
    Ok(())
}
