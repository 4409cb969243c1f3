use std::path::PathBuf;

use clap::Args;

use shardstat_core::config::ShardstatConfig;
use shardstat_core::runbook::render_runbook;

#[derive(Args)]
pub struct GuideArgs {
    /// Path to a YAML config file with a `runbook` section
    #[arg(short, long)]
    pub config: Option<PathBuf>,
}

pub async fn execute(args: GuideArgs) -> anyhow::Result<()> {
    let config = ShardstatConfig::load(args.config.as_deref())?;
    let problems = config.runbook.problems();
    for problem in &problems {
        tracing::warn!(%problem, "Runbook topology looks wrong");
    }
    print!("{}", render_runbook(&config.runbook));
    Ok(())
}
