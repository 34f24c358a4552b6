//! `census`: per-folder file counts across the archive.

use super::utils::{load_config, resolve_root, CliProgress};
use crate::render::write_census_report;
use crate::scan::folder_census;
use anyhow::{Context, Result};
use clap::Args;
use console::style;
use std::path::PathBuf;

#[derive(Args)]
pub struct CensusArgs {
    /// Archive root (defaults to the persisted default folder)
    #[arg(short, long, value_name = "PATH")]
    pub path: Option<PathBuf>,

    /// Stop descending below this depth (root is depth 0)
    #[arg(long, value_name = "DEPTH")]
    pub max_depth: Option<usize>,

    /// Output workbook
    #[arg(short, long, value_name = "FILE")]
    pub output: PathBuf,
}

pub fn run(args: CensusArgs) -> Result<()> {
    let config = load_config()?;
    let root = resolve_root(args.path, &config)?;

    let progress = CliProgress::new();
    let census = folder_census(&root, args.max_depth, &progress)
        .with_context(|| format!("counting files under {}", root.display()))?;
    write_census_report(&args.output, &census)
        .with_context(|| format!("writing {}", args.output.display()))?;

    println!(
        "{} {} folders, {} files, report written to {}",
        style("Done:").green().bold(),
        census.records.len(),
        census.total_files,
        args.output.display()
    );
    Ok(())
}
