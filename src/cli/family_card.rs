//! `family-card`: OCR the card number out of every `02*` member scan.

use super::utils::{load_config, resolve_root, CliProgress};
use crate::extract::{check_family_cards, OcrTools};
use crate::progress::RunControl;
use crate::render::write_family_card_report;
use crate::scan::scan_members;
use anyhow::{Context, Result};
use clap::Args;
use console::style;
use std::path::PathBuf;

#[derive(Args)]
pub struct FamilyCardArgs {
    /// Archive root or a center/member folder inside `02.DATA_ANGGOTA`
    #[arg(short, long, value_name = "PATH")]
    pub path: Option<PathBuf>,

    /// Output workbook
    #[arg(short, long, value_name = "FILE")]
    pub output: PathBuf,

    /// Poppler binary directory (overrides the persisted poppler_path)
    #[arg(long, value_name = "DIR")]
    pub poppler_path: Option<PathBuf>,
}

pub fn run(args: FamilyCardArgs) -> Result<()> {
    let config = load_config()?;
    let root = resolve_root(args.path, &config)?;
    let tools = OcrTools {
        poppler_path: args.poppler_path.or_else(|| config.config.poppler_path()),
    };

    let progress = CliProgress::new();
    let scan = scan_members(&root, &progress)
        .with_context(|| format!("scanning member folders under {}", root.display()))?;

    let control = RunControl::new();
    let checks = check_family_cards(&scan, &tools, &control, &progress);
    write_family_card_report(&args.output, &checks)
        .with_context(|| format!("writing {}", args.output.display()))?;

    let valid = checks.iter().filter(|c| c.validation.valid).count();
    let failed = checks.iter().filter(|c| !c.error.is_empty()).count();
    println!(
        "{} {} card scans checked, {} valid numbers, {} OCR failures; report written to {}",
        style("Done:").green().bold(),
        checks.len(),
        valid,
        failed,
        args.output.display()
    );
    Ok(())
}
