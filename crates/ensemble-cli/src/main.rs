use anyhow::Result;
use clap::{Parser, Subcommand};
use ensemble_core::config::RootConfig;
use ensemble_infrastructure::ConfigService;
use std::path::PathBuf;

mod commands;

#[derive(Parser)]
#[command(name = "ensemble")]
#[command(about = "Ensemble - execution state synchronizer for multi-agent runs", long_about = None)]
struct Cli {
    /// Read configuration from this file instead of the default location
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Replay a JSON-lines event log and print the final state
    Replay {
        /// Path to the event log (one JSON event per line)
        log: PathBuf,
        /// Approve every plan as soon as it awaits approval
        #[arg(long)]
        approve: bool,
        /// Route every proposal through the approval gate
        #[arg(long)]
        require_approval: bool,
    },
    /// Restore a persisted session and print the resulting state
    Restore {
        session_id: String,
        /// Snapshot directory (defaults to the configured one)
        #[arg(long)]
        dir: Option<PathBuf>,
    },
    /// List persisted sessions
    Sessions {
        #[arg(long)]
        dir: Option<PathBuf>,
    },
}

fn load_config(path: Option<PathBuf>) -> Result<RootConfig> {
    let service = match path {
        Some(path) => ConfigService::with_path(path),
        None => ConfigService::new(),
    };
    Ok(service.get_config()?)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = load_config(cli.config)?.synchronizer;
    ensemble_execution::init_logging(&config.log_filter);

    match cli.command {
        Commands::Replay {
            log,
            approve,
            require_approval,
        } => {
            let mut config = config;
            config.require_plan_approval |= require_approval;
            commands::replay::run(&log, config, approve).await?
        }
        Commands::Restore { session_id, dir } => {
            commands::restore::run(&session_id, dir, config).await?
        }
        Commands::Sessions { dir } => commands::sessions::run(dir, &config).await?,
    }

    Ok(())
}
