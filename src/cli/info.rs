//! `info`: standard-folder presence check.

use super::utils::{load_config, resolve_root};
use crate::classify::FolderKind;
use crate::domain::{ABSENT, PRESENT};
use crate::scan::check_standard_folders;
use anyhow::{Context, Result};
use clap::Args;
use console::style;
use std::path::PathBuf;

#[derive(Args)]
pub struct InfoArgs {
    /// Archive root (defaults to the persisted default folder)
    #[arg(short, long, value_name = "PATH")]
    pub path: Option<PathBuf>,
}

pub fn run(args: InfoArgs) -> Result<()> {
    let config = load_config()?;
    let root = resolve_root(args.path, &config)?;
    let report = check_standard_folders(&root)
        .with_context(|| format!("checking standard folders under {}", root.display()))?;

    println!("{}", style(format!("Archive root: {}", report.root.display())).bold());
    println!("Scan time: {}", report.scan_time);
    println!();
    for (name, exists) in &report.standard {
        let marker = if *exists {
            style(PRESENT).green()
        } else {
            style(ABSENT).red()
        };
        println!("  {marker:>9}  {name}");
    }
    if !report.other_folders.is_empty() {
        println!();
        println!("{}", style("Other folders:").bold());
        for (name, kind) in &report.other_folders {
            let note = match kind {
                FolderKind::Center => " (nama center)",
                FolderKind::Member => " (nama anggota)",
                FolderKind::Month => " (nama bulan)",
                _ => "",
            };
            println!("  {name}{note}");
        }
    }
    Ok(())
}
