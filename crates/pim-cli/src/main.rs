//! pim-sched CLI - adaptive PIM/CPU job placement

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use pim_config::PimConfig;
use pim_telemetry::LogLevel;
use std::path::PathBuf;

mod commands;

#[derive(Parser)]
#[command(name = "pim-sched")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Configuration file (TOML)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run batches of a workload file through the reference engine
    Run {
        /// Workload file with [[resources]] and [[jobs]] tables
        #[arg(short, long)]
        workload: PathBuf,
        /// Number of times to submit the job list
        #[arg(short, long, default_value = "1")]
        batches: u32,
        /// Write every batch's rows to this CSV file
        #[arg(short, long)]
        report: Option<PathBuf>,
        /// Selection policy override (first-match, lowest-energy)
        #[arg(long)]
        policy: Option<String>,
    },
    /// Classify a single job without placing it
    Classify {
        /// RAM requirement in MB
        #[arg(long)]
        ram: u64,
        /// Job length in instructions
        #[arg(long)]
        length: u64,
        /// Deadline in seconds
        #[arg(long)]
        deadline: f64,
        /// Threshold to classify against (defaults to the configured initial value)
        #[arg(long)]
        threshold: Option<f64>,
    },
    /// Run the built-in six-resource, three-job scenario
    Demo {
        /// Number of batches
        #[arg(short, long, default_value = "1")]
        batches: u32,
    },
}

fn load_config(path: Option<&PathBuf>) -> Result<PimConfig> {
    let mut config = match path {
        Some(path) => PimConfig::load(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => PimConfig::default(),
    };
    config
        .apply_env_overrides()
        .context("Invalid PIM_* environment override")?;
    Ok(config)
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = load_config(cli.config.as_ref())?;
    if cli.verbose > 0 {
        config.logging.level = LogLevel::from_verbosity(cli.verbose);
    }
    pim_telemetry::init_logging(&config.logging).context("Failed to initialize logging")?;

    match cli.command {
        Commands::Run { workload, batches, report, policy } => {
            commands::run::execute(&config, &workload, batches, report.as_deref(), policy.as_deref())
        }
        Commands::Classify { ram, length, deadline, threshold } => {
            commands::classify::execute(&config, ram, length, deadline, threshold)
        }
        Commands::Demo { batches } => commands::demo::execute(&config, batches),
    }
}
