use clap::Parser;

mod commands;

#[derive(Parser)]
#[command(
    name = "shardstat",
    about = "Sharding status and schema setup for MongoDB clusters",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: commands::Commands,

    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    // stdout carries only command output.
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        commands::Commands::Status(args) => commands::status::execute(args).await,
        commands::Commands::Init(args) => commands::init::execute(args).await,
        commands::Commands::Guide(args) => commands::guide::execute(args).await,
        commands::Commands::Validate(args) => commands::validate::execute(args).await,
    }
}
