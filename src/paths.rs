//! Per-user application data locations.
//!
//! Emitted artifacts live under one directory: `%LOCALAPPDATA%` on
//! Windows, `$XDG_DATA_HOME` or `~/.local/share` elsewhere, each with
//! an `ArsipDigitalOwnCloud` folder inside.

use std::path::PathBuf;

const APP_DIR_NAME: &str = "ArsipDigitalOwnCloud";

/// The application data directory; created on first use.
pub fn app_data_dir() -> std::io::Result<PathBuf> {
    let base = std::env::var_os("LOCALAPPDATA")
        .map(PathBuf::from)
        .or_else(|| std::env::var_os("XDG_DATA_HOME").map(PathBuf::from))
        .or_else(|| {
            std::env::var_os("HOME").map(|home| PathBuf::from(home).join(".local/share"))
        })
        .unwrap_or_else(|| PathBuf::from("."));
    let dir = base.join(APP_DIR_NAME);
    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}

/// Structural report workbook.
pub fn database_path() -> std::io::Result<PathBuf> {
    Ok(app_data_dir()?.join("database.xlsx"))
}

/// Reconciliation export workbook.
pub fn export_path() -> std::io::Result<PathBuf> {
    Ok(app_data_dir()?.join("file_export.xlsx"))
}

/// Universal index store.
pub fn universal_index_path() -> std::io::Result<PathBuf> {
    Ok(app_data_dir()?.join("universal_scan.xlsx"))
}

/// Configuration document.
pub fn config_path() -> std::io::Result<PathBuf> {
    Ok(app_data_dir()?.join("app_config.json"))
}
