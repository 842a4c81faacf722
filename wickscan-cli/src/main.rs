//! WickScan CLI: scan, monitor and inspect setups from the command line.
//!
//! Commands:
//! - `scan`: look for new wickless setups and store them
//! - `monitor`: advance stored setups and resolve open signals
//! - `stats`: count setups and signals in the state journal
//! - `check-config`: validate a scanner TOML file and print it resolved
//!
//! Results go to stdout as JSON; logs go to stderr.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use serde_json::json;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use wickscan_runner::{
    CsvCandleProvider, JournalRepository, ScanSummary, Scanner, ScannerConfig, SetupRepository,
    Stats,
};

#[derive(Parser)]
#[command(
    name = "wickscan",
    version,
    about = "WickScan: wickless-candle setup scanner for FX pairs"
)]
struct Cli {
    /// Emit logs as JSON lines.
    #[arg(long, global = true, default_value_t = false)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct RunArgs {
    /// Scanner TOML config.
    #[arg(long, default_value = "wickscan.toml")]
    config: PathBuf,

    /// Directory of `<PAIR>_<TF>.csv` candle files.
    #[arg(long, default_value = "data")]
    data_dir: PathBuf,

    /// JSONL state journal. Locked while the command runs; a second command
    /// on the same journal fails instead of waiting.
    #[arg(long, default_value = "state/journal.jsonl")]
    state: PathBuf,
}

#[derive(Subcommand)]
enum Commands {
    /// Scan every configured pair and timeframe for new setups.
    Scan(RunArgs),
    /// Advance waiting setups and resolve open signals.
    Monitor(RunArgs),
    /// Count setups and signals in the state journal.
    Stats {
        /// JSONL state journal (locked while read).
        #[arg(long, default_value = "state/journal.jsonl")]
        state: PathBuf,
    },
    /// Validate a scanner config and print it with presets applied.
    CheckConfig {
        /// Scanner TOML config.
        #[arg(long, default_value = "wickscan.toml")]
        config: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.json_logs);

    match cli.command {
        Commands::Scan(args) => {
            let summary = build_scanner(&args)?.scan();
            finish(&summary)
        }
        Commands::Monitor(args) => {
            let summary = build_scanner(&args)?.monitor();
            finish(&summary)
        }
        Commands::Stats { state } => run_stats(&state),
        Commands::CheckConfig { config } => run_check_config(&config),
    }
}

fn init_logging(json: bool) {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(env_filter);

    if json {
        registry
            .with(fmt::layer().json().with_target(true).with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
            .init();
    }
}

fn build_scanner(args: &RunArgs) -> Result<Scanner> {
    let config = ScannerConfig::from_file(&args.config)
        .with_context(|| format!("loading {}", args.config.display()))?;
    let repository = JournalRepository::open(&args.state)
        .with_context(|| format!("opening journal {}", args.state.display()))?;
    let provider = CsvCandleProvider::new(&args.data_dir);

    info!(
        config = %args.config.display(),
        data_dir = %args.data_dir.display(),
        state = %args.state.display(),
        "scanner ready"
    );
    Ok(Scanner::from_config(
        config,
        Arc::new(provider),
        Arc::new(repository),
    ))
}

fn finish(summary: &ScanSummary) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(summary)?);
    if !summary.is_clean() {
        std::process::exit(1);
    }
    Ok(())
}

fn run_stats(state: &Path) -> Result<()> {
    let repository = JournalRepository::open(state)
        .with_context(|| format!("opening journal {}", state.display()))?;
    let stats = Stats::from_records(&repository.setups()?, &repository.signals()?);
    let out = json!({
        "stats": stats,
        "win_rate": stats.win_rate(),
    });
    println!("{}", serde_json::to_string_pretty(&out)?);
    Ok(())
}

fn run_check_config(path: &Path) -> Result<()> {
    let config = ScannerConfig::from_file(path)
        .with_context(|| format!("loading {}", path.display()))?;
    let out = json!({
        "strategy": config.strategy,
        "timeframes": config.timeframes,
        "instruments": config.resolved_instruments(),
        "ids": config.ids,
        "jobs": config.jobs().len(),
    });
    println!("{}", serde_json::to_string_pretty(&out)?);
    Ok(())
}
