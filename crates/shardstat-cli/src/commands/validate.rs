use std::path::PathBuf;

use clap::Args;

use shardstat_core::config::ShardstatConfig;
use shardstat_mongo::mongo_config::MongoTargetConfig;

#[derive(Args)]
pub struct ValidateArgs {
    /// Path to config file to validate
    pub config: PathBuf,
}

pub async fn execute(args: ValidateArgs) -> anyhow::Result<()> {
    println!("Validating {}...", args.config.display());

    let config = ShardstatConfig::from_file(&args.config)?;
    println!("  YAML parsing: OK");

    let mut errors = Vec::new();

    match MongoTargetConfig::from_yaml(&config.target) {
        Ok(target) => {
            let problems = target.problems();
            if problems.is_empty() {
                println!("  Target: OK (catalog in '{}')", target.config_database);
            } else {
                println!("  Target: INVALID");
                errors.extend(problems.into_iter().map(|p| format!("target: {p}")));
            }
        }
        Err(e) => {
            println!("  Target: INVALID - {e}");
            errors.push(format!("target: {e}"));
        }
    }

    let setup_problems = config.setup.problems();
    if setup_problems.is_empty() {
        println!(
            "  Setup plan: OK ({} steps on {})",
            config.setup.steps.len(),
            config.setup.database
        );
    } else {
        println!("  Setup plan: INVALID");
        errors.extend(setup_problems.into_iter().map(|p| format!("setup: {p}")));
    }

    let runbook_problems = config.runbook.problems();
    if runbook_problems.is_empty() {
        println!(
            "  Runbook: OK ({} shards, {} config servers)",
            config.runbook.shards.len(),
            config.runbook.config_servers.len()
        );
    } else {
        println!("  Runbook: INVALID");
        errors.extend(runbook_problems.into_iter().map(|p| format!("runbook: {p}")));
    }

    println!();
    if errors.is_empty() {
        println!("Validation PASSED");
    } else {
        println!("Validation FAILED with {} error(s):", errors.len());
        for err in &errors {
            eprintln!("  - {err}");
        }
        std::process::exit(1);
    }

    Ok(())
}
