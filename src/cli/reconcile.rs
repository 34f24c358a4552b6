//! `reconcile`: join scanned member folders against the membership
//! workbook and emit the four-sheet result.

use super::utils::{load_config, resolve_root, CliProgress};
use crate::membership::load_membership;
use crate::paths;
use crate::reconcile::reconcile;
use crate::render::write_reconciliation_workbook;
use crate::scan::scan_members;
use anyhow::{Context, Result};
use clap::Args;
use console::style;
use std::path::PathBuf;

#[derive(Args)]
pub struct ReconcileArgs {
    /// Archive root or a center/member folder inside `02.DATA_ANGGOTA`
    #[arg(short, long, value_name = "PATH")]
    pub path: Option<PathBuf>,

    /// Membership workbook (fixed window: header row 3, columns B:Y)
    #[arg(short, long, value_name = "FILE")]
    pub membership: PathBuf,

    /// Output workbook (defaults to file_export.xlsx in the app data dir)
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,
}

pub fn run(args: ReconcileArgs) -> Result<()> {
    let config = load_config()?;
    let root = resolve_root(args.path, &config)?;
    let output = match args.output {
        Some(path) => path,
        None => paths::export_path()?,
    };

    let membership = load_membership(&args.membership)
        .with_context(|| format!("loading membership {}", args.membership.display()))?;
    let progress = CliProgress::new();
    let scan = scan_members(&root, &progress)
        .with_context(|| format!("scanning member folders under {}", root.display()))?;

    let result = reconcile(&membership, &scan);
    write_reconciliation_workbook(&output, &result, &scan)
        .with_context(|| format!("writing {}", output.display()))?;

    println!(
        "{} {} matched, {} not archived (of {} membership rows); {} scanned member folders",
        style("Done:").green().bold(),
        result.stats.matched_rows,
        result.stats.not_archived_rows,
        result.stats.membership_rows,
        result.stats.scan_rows,
    );
    if !result.stats.duplicate_scan.is_empty() {
        println!(
            "{} {} duplicate member folders kept out of the join (see Summary sheet)",
            style("Warning:").yellow().bold(),
            result.stats.duplicate_scan.len()
        );
    }
    if !scan.invalid_folders.is_empty() {
        println!(
            "{} {} folders matched no naming grammar (see Summary sheet)",
            style("Warning:").yellow().bold(),
            scan.invalid_folders.len()
        );
    }
    println!("Report written to {}", output.display());
    Ok(())
}
