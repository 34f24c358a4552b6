//! Command-line interface for arsip-audit.
//!
//! One subcommand per audit operation; the library stays callable
//! without any of this.

use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use tracing::Level;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod anomaly;
mod census;
mod config_cmd;
mod family_card;
mod funding;
mod index;
mod info;
mod reconcile;
mod scan;
mod utils;

/// Audit an OwnCloud-synced member archive against the membership workbook
#[derive(Parser)]
#[command(name = "arsip-audit")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging (sets log level to DEBUG)
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Check which standard archive folders exist under a root
    Info(info::InfoArgs),

    /// Emit the structural report (one sheet per category)
    Scan(scan::ScanArgs),

    /// Count files per folder across the whole tree
    Census(census::CensusArgs),

    /// Reconcile scanned member folders against the membership workbook
    Reconcile(reconcile::ReconcileArgs),

    /// Find oversize or non-document files
    Anomalies(anomaly::AnomalyArgs),

    /// Discover funding-request workbooks and extract their fields
    Funding(funding::FundingArgs),

    /// OCR family-card numbers from member document scans
    FamilyCard(family_card::FamilyCardArgs),

    /// Maintain the persistent universal index
    #[command(subcommand)]
    Index(index::IndexCommand),

    /// Show or change persisted settings
    #[command(subcommand)]
    Config(config_cmd::ConfigCommand),

    /// Generate shell completions
    Completions { shell: clap_complete::Shell },
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();

    // Wire verbose flag to the tracing log level.
    // RUST_LOG in the environment always takes precedence; --verbose falls back to DEBUG.
    let filter = if cli.verbose {
        EnvFilter::from_default_env().add_directive(Level::DEBUG.into())
    } else {
        EnvFilter::from_default_env().add_directive(Level::WARN.into())
    };
    let _ = tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .try_init();

    match cli.command {
        Commands::Info(args) => info::run(args),
        Commands::Scan(args) => scan::run(args),
        Commands::Census(args) => census::run(args),
        Commands::Reconcile(args) => reconcile::run(args),
        Commands::Anomalies(args) => anomaly::run(args),
        Commands::Funding(args) => funding::run(args),
        Commands::FamilyCard(args) => family_card::run(args),
        Commands::Index(command) => index::run(command),
        Commands::Config(command) => config_cmd::run(command),
        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            let name = cmd.get_name().to_string();
            clap_complete::generate(shell, &mut cmd, name, &mut std::io::stdout());
            Ok(())
        }
    }
}
