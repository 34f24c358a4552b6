//! Shared CLI plumbing: the indicatif-backed progress sink and root
//! resolution against the persisted default folder.

use crate::config::ConfigStore;
use crate::paths;
use crate::progress::ProgressSink;
use anyhow::{bail, Result};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::sync::Mutex;
use std::time::Duration;

/// Progress sink rendering an indicatif bar (or spinner when the item
/// count is unknown).
pub struct CliProgress {
    bar: Mutex<Option<ProgressBar>>,
}

impl CliProgress {
    pub fn new() -> Self {
        Self {
            bar: Mutex::new(None),
        }
    }
}

impl ProgressSink for CliProgress {
    fn begin(&self, label: &str, total: Option<u64>) {
        let bar = match total {
            Some(total) => {
                let bar = ProgressBar::new(total);
                bar.set_style(
                    ProgressStyle::with_template("{msg} [{bar:30}] {pos}/{len}")
                        .unwrap_or_else(|_| ProgressStyle::default_bar()),
                );
                bar
            }
            None => {
                let bar = ProgressBar::new_spinner();
                bar.enable_steady_tick(Duration::from_millis(120));
                bar
            }
        };
        bar.set_message(label.to_string());
        *self.bar.lock().unwrap() = Some(bar);
    }

    fn advance(&self, detail: &str) {
        if let Some(bar) = self.bar.lock().unwrap().as_ref() {
            bar.inc(1);
            if bar.length().is_none() {
                bar.set_message(detail.to_string());
            }
        }
    }

    fn finish(&self) {
        if let Some(bar) = self.bar.lock().unwrap().take() {
            bar.finish_and_clear();
        }
    }
}

/// Load the persisted configuration from its well-known location.
pub fn load_config() -> Result<ConfigStore> {
    Ok(ConfigStore::load(&paths::config_path()?))
}

/// Resolve the scan root: an explicit `--path` wins, otherwise the
/// persisted default folder.
pub fn resolve_root(path: Option<PathBuf>, config: &ConfigStore) -> Result<PathBuf> {
    if let Some(path) = path {
        return Ok(path);
    }
    match config.config.default_folder() {
        Some(folder) => Ok(folder),
        None => bail!(
            "no folder given; pass --path or set one with `arsip-audit config set-default-folder`"
        ),
    }
}
