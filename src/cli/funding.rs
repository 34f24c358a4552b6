//! `funding`: discover request workbooks and extract their fields.

use super::utils::{load_config, resolve_root, CliProgress};
use crate::extract::funding::analyze_requests;
use crate::extract::scan_funding_requests;
use crate::render::write_funding_report;
use anyhow::{Context, Result};
use clap::Args;
use console::style;
use std::path::PathBuf;

#[derive(Args)]
pub struct FundingArgs {
    /// Archive root (defaults to the persisted default folder)
    #[arg(short, long, value_name = "PATH")]
    pub path: Option<PathBuf>,

    /// Output workbook
    #[arg(short, long, value_name = "FILE")]
    pub output: PathBuf,

    /// Only list the workbooks; skip reading cells from each file
    #[arg(long)]
    pub no_analyze: bool,
}

pub fn run(args: FundingArgs) -> Result<()> {
    let config = load_config()?;
    let root = resolve_root(args.path, &config)?;

    let progress = CliProgress::new();
    let mut requests = scan_funding_requests(&root, &progress)
        .with_context(|| format!("scanning funding requests under {}", root.display()))?;
    if !args.no_analyze {
        analyze_requests(&mut requests, &progress);
    }
    write_funding_report(&args.output, &requests)
        .with_context(|| format!("writing {}", args.output.display()))?;

    let succeeded = requests
        .iter()
        .filter(|r| r.analysis_status == "SUCCESS")
        .count();
    println!(
        "{} {} request workbooks found, {} analyzed, report written to {}",
        style("Done:").green().bold(),
        requests.len(),
        succeeded,
        args.output.display()
    );
    Ok(())
}
