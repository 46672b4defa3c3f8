//! InsiderWatch CLI — daily insider-trading snapshot job.
//!
//! Commands:
//! - `run` (default) — fetch transactions and candles, write all artifacts
//! - `summarize` — rebuild `summary.json` from an existing `insider.json`
//! - `symbols` — print the symbol universe

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use insiderwatch_core::data::{FinnhubProvider, ThreadSleeper, TracingProgress, YahooProvider};
use insiderwatch_core::pipeline::{load_registry, rebuild_summary};
use insiderwatch_core::{api_key_from_env, ArtifactWriter, Pipeline, PipelineConfig, RunReport};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info};

#[derive(Parser)]
#[command(
    name = "insiderwatch",
    about = "InsiderWatch — insider trading snapshots for a static dashboard"
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Args, Clone, Default)]
struct CommonArgs {
    /// TOML config file. Defaults are used for anything it omits.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Output directory for the JSON artifacts. Overrides the config file.
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// TOML universe file replacing the built-in symbol list.
    #[arg(long)]
    universe: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch insider transactions and candles, then write every artifact.
    Run(CommonArgs),
    /// Rebuild summary.json from the insider.json already on disk (no network).
    Summarize(CommonArgs),
    /// List the symbols, names and sectors in the universe.
    Symbols(CommonArgs),
}

fn main() -> Result<()> {
    dotenv::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let cli = Cli::parse();

    match cli.command.unwrap_or(Commands::Run(CommonArgs::default())) {
        Commands::Run(args) => run_pipeline(&args),
        Commands::Summarize(args) => run_summarize(&args),
        Commands::Symbols(args) => run_symbols(&args),
    }
}

fn load_config(args: &CommonArgs) -> Result<PipelineConfig> {
    let mut config = match &args.config {
        Some(path) => PipelineConfig::from_file(path)?,
        None => PipelineConfig::default(),
    };
    if let Some(dir) = &args.data_dir {
        config.data_dir = dir.clone();
    }
    if let Some(universe) = &args.universe {
        config.universe = Some(universe.clone());
    }
    Ok(config)
}

fn run_pipeline(args: &CommonArgs) -> Result<()> {
    let config = load_config(args)?;

    let api_key = match api_key_from_env() {
        Ok(key) => key,
        Err(e) => {
            error!("{e}; aborting before any request");
            return Err(e.into());
        }
    };

    let registry = load_registry(&config)?;
    let sleeper = Arc::new(ThreadSleeper);
    let insiders = FinnhubProvider::new(api_key, config.retry_policy(), sleeper.clone())
        .context("failed to set up insider-transaction provider")?;
    let prices = YahooProvider::new().context("failed to set up price provider")?;
    let writer = ArtifactWriter::new(&config.data_dir);

    info!(
        "{} symbols, writing to {}",
        registry.len(),
        config.data_dir.display()
    );

    let pipeline = Pipeline {
        config: &config,
        registry: &registry,
        insiders: &insiders,
        prices: &prices,
        writer: &writer,
        sleeper: sleeper.as_ref(),
        progress: &TracingProgress,
    };
    let report = pipeline.run(chrono::Utc::now())?;

    print_report(&report);
    Ok(())
}

fn run_summarize(args: &CommonArgs) -> Result<()> {
    let config = load_config(args)?;
    let registry = load_registry(&config)?;
    let writer = ArtifactWriter::new(&config.data_dir);

    let summary = rebuild_summary(&writer, &registry, chrono::Utc::now())
        .with_context(|| format!("failed to rebuild summary in {}", config.data_dir.display()))?;

    info!(
        "buys: {}, sells: {}, buy value: ${:.0}, sell value: ${:.0}",
        summary.buy_count, summary.sell_count, summary.buy_val, summary.sell_val
    );
    Ok(())
}

fn run_symbols(args: &CommonArgs) -> Result<()> {
    let config = load_config(args)?;
    let registry = load_registry(&config)?;

    println!("{:<8} {:<20} {:<12}", "Symbol", "Name", "Sector");
    println!("{}", "-".repeat(42));
    for entry in registry.entries() {
        println!("{:<8} {:<20} {:<12}", entry.ticker, entry.name, entry.sector);
    }
    println!();
    println!(
        "{} symbols across {} sectors",
        registry.len(),
        registry.sector_names().len()
    );
    Ok(())
}

fn print_report(report: &RunReport) {
    let s = &report.summary;
    info!("{}", "=".repeat(60));
    info!("DONE");
    info!("  Transactions: {}", report.transaction_count);
    info!("  Buys: {}, Sells: {}", s.buy_count, s.sell_count);
    info!("  Buy value: ${:.0}", s.buy_val);
    info!("  Sell value: ${:.0}", s.sell_val);
    info!(
        "  Candles fetched: {}/{} symbols",
        report.candles.fetched(),
        report.active_symbols.len()
    );
    for (sym, reason) in report.transactions.failures() {
        info!("  transactions failed for {sym}: {reason}");
    }
    for (sym, reason) in report.candles.failures() {
        info!("  candles failed for {sym}: {reason}");
    }
    info!("{}", "=".repeat(60));
}
