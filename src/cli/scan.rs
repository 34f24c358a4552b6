//! `scan`: structural report over the eight standard categories.

use super::utils::{load_config, resolve_root, CliProgress};
use crate::paths;
use crate::render::write_structure_report;
use crate::scan::scan_categories;
use anyhow::{Context, Result};
use clap::Args;
use console::style;
use std::path::PathBuf;

#[derive(Args)]
pub struct ScanArgs {
    /// Archive root (defaults to the persisted default folder)
    #[arg(short, long, value_name = "PATH")]
    pub path: Option<PathBuf>,

    /// Output workbook (defaults to database.xlsx in the app data dir)
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,
}

pub fn run(args: ScanArgs) -> Result<()> {
    let config = load_config()?;
    let root = resolve_root(args.path, &config)?;
    let output = match args.output {
        Some(path) => path,
        None => paths::database_path()?,
    };

    let progress = CliProgress::new();
    let scan = scan_categories(&root, &progress)
        .with_context(|| format!("scanning {}", root.display()))?;
    write_structure_report(&output, &scan)
        .with_context(|| format!("writing {}", output.display()))?;

    let present = scan.categories.iter().filter(|c| c.exists).count();
    println!(
        "{} {} categories present, report written to {}",
        style("Done:").green().bold(),
        present,
        output.display()
    );
    Ok(())
}
