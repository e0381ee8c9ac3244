mod sweep_commands;

use std::path::PathBuf;

use {
    clap::{Parser, Subcommand},
    tracing::info,
    tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt},
};

#[derive(Parser)]
#[command(name = "prunebot", about = "prunebot, time-based message retention for Discord")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Config file, or a directory holding prunebot.{toml,yaml,yml,json}.
    /// Defaults to the first such file in the working directory or the user
    /// config directory.
    #[arg(long, global = true, env = "PRUNEBOT_CONFIG")]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    /// Output logs as JSON instead of human-readable.
    #[arg(long, global = true, default_value_t = false)]
    json_logs: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Connect and sweep on the configured interval until interrupted.
    Run,
    /// Connect, run a single sweep, print the summary and exit.
    SweepOnce {
        /// Count eligible messages without deleting anything.
        #[arg(long, default_value_t = false)]
        dry_run: bool,
    },
    /// Validate the config and print the resolved targets.
    CheckConfig,
}

fn init_telemetry(cli: &Cli) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));

    if cli.json_logs {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_target(true).with_thread_ids(false))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_thread_ids(false)
                    .with_ansi(true),
            )
            .init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_telemetry(&cli);

    info!(version = env!("CARGO_PKG_VERSION"), "prunebot starting");

    let config = cli.config.as_deref();
    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => sweep_commands::run(config).await,
        Commands::SweepOnce { dry_run } => sweep_commands::sweep_once(config, dry_run).await,
        Commands::CheckConfig => sweep_commands::check_config(config),
    }
}
