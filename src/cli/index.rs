//! `index`: maintain the persistent universal index.

use super::utils::{load_config, resolve_root, CliProgress};
use crate::index::UniversalIndex;
use crate::paths;
use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use console::style;
use std::path::PathBuf;

#[derive(Subcommand)]
pub enum IndexCommand {
    /// Walk a folder, appending new paths and refreshing changed ones
    Scan(IndexScanArgs),

    /// Re-stat every indexed path and flag vanished entries
    Sync(IndexStoreArgs),

    /// Export the index with derived columns and a summary sheet
    Export(IndexExportArgs),
}

#[derive(Args)]
pub struct IndexScanArgs {
    /// Folder to scan (defaults to the persisted default folder)
    #[arg(short, long, value_name = "PATH")]
    pub path: Option<PathBuf>,

    /// Index store (defaults to universal_scan.xlsx in the app data dir)
    #[arg(long, value_name = "FILE")]
    pub store: Option<PathBuf>,
}

#[derive(Args)]
pub struct IndexStoreArgs {
    /// Index store (defaults to universal_scan.xlsx in the app data dir)
    #[arg(long, value_name = "FILE")]
    pub store: Option<PathBuf>,
}

#[derive(Args)]
pub struct IndexExportArgs {
    /// Index store (defaults to universal_scan.xlsx in the app data dir)
    #[arg(long, value_name = "FILE")]
    pub store: Option<PathBuf>,

    /// Output workbook
    #[arg(short, long, value_name = "FILE")]
    pub output: PathBuf,
}

fn store_path(store: Option<PathBuf>) -> Result<PathBuf> {
    match store {
        Some(path) => Ok(path),
        None => Ok(paths::universal_index_path()?),
    }
}

pub fn run(command: IndexCommand) -> Result<()> {
    match command {
        IndexCommand::Scan(args) => {
            let config = load_config()?;
            let root = resolve_root(args.path, &config)?;
            let store = store_path(args.store)?;
            let mut index = UniversalIndex::load(&store)
                .with_context(|| format!("loading index {}", store.display()))?;

            let progress = CliProgress::new();
            let counters = index
                .scan_and_update(&root, &progress)
                .with_context(|| format!("scanning {}", root.display()))?;
            println!(
                "{} {} new records, {} updated, {} total in {}",
                style("Done:").green().bold(),
                counters.new,
                counters.updated,
                index.records.len(),
                store.display()
            );
        }
        IndexCommand::Sync(args) => {
            let store = store_path(args.store)?;
            let mut index = UniversalIndex::load(&store)
                .with_context(|| format!("loading index {}", store.display()))?;

            let progress = CliProgress::new();
            let counters = index.synchronize(&progress).context("synchronizing index")?;
            println!(
                "{} {} records updated, {} missing, {} total",
                style("Done:").green().bold(),
                counters.updated,
                counters.missing,
                index.records.len()
            );
        }
        IndexCommand::Export(args) => {
            let store = store_path(args.store)?;
            let index = UniversalIndex::load(&store)
                .with_context(|| format!("loading index {}", store.display()))?;
            index
                .export(&args.output)
                .with_context(|| format!("writing {}", args.output.display()))?;
            println!(
                "{} {} records exported to {}",
                style("Done:").green().bold(),
                index.records.len(),
                args.output.display()
            );
        }
    }
    Ok(())
}
