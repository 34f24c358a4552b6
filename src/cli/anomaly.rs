//! `anomalies`: oversize and non-document file scans.

use super::utils::{load_config, resolve_root, CliProgress};
use crate::anomaly::{scan_anomalies, AnomalyMode};
use crate::render::write_anomaly_report;
use anyhow::{Context, Result};
use clap::Args;
use console::style;
use std::path::PathBuf;

#[derive(Args)]
pub struct AnomalyArgs {
    /// Archive root (defaults to the persisted default folder)
    #[arg(short, long, value_name = "PATH")]
    pub path: Option<PathBuf>,

    /// Flag files at or above this size in MB
    #[arg(long, value_name = "MB", default_value_t = 10.0, conflicts_with = "non_document")]
    pub min_size_mb: f64,

    /// Flag files whose extension is outside the document allow-list
    #[arg(long)]
    pub non_document: bool,

    /// Output workbook
    #[arg(short, long, value_name = "FILE")]
    pub output: PathBuf,
}

pub fn run(args: AnomalyArgs) -> Result<()> {
    let config = load_config()?;
    let root = resolve_root(args.path, &config)?;
    let mode = if args.non_document {
        AnomalyMode::NonDocument
    } else {
        AnomalyMode::LargeFiles {
            min_size_mb: args.min_size_mb,
        }
    };

    let progress = CliProgress::new();
    let results = scan_anomalies(&root, mode, &progress)
        .with_context(|| format!("scanning {}", root.display()))?;
    write_anomaly_report(&args.output, mode, &results)
        .with_context(|| format!("writing {}", args.output.display()))?;

    let total_mb: f64 = results.iter().map(|r| r.size_mb()).sum();
    println!(
        "{} {} files flagged ({:.2} MB), report written to {}",
        style("Done:").green().bold(),
        results.len(),
        total_mb,
        args.output.display()
    );
    Ok(())
}
