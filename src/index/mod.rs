//! Universal index: a persistent registry of every folder and file
//! ever observed, with a synchronize pass that re-stats each path and
//! flags vanished entries.
//!
//! The store is itself a workbook. Records are keyed by `file_path`;
//! the dense 1-based `ID` column is assigned at emit time only. Saves
//! go through a temp file and rename, so the store is never truncated
//! by an interrupted write.

use crate::domain::{is_sync_artifact, CellValue, IndexRecord, TIMESTAMP_FORMAT};
use crate::error::{AuditError, Result};
use crate::progress::ProgressSink;
use crate::render::{write_index_export, write_index_store};
use calamine::{open_workbook_auto, Reader};
use chrono::{DateTime, Local};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Counters reported by a scan-and-update pass.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ScanCounters {
    pub new: usize,
    pub updated: usize,
}

/// Counters reported by a synchronize pass.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SyncCounters {
    pub updated: usize,
    pub missing: usize,
}

/// In-memory universal index bound to its store path.
#[derive(Debug)]
pub struct UniversalIndex {
    store_path: PathBuf,
    pub records: Vec<IndexRecord>,
}

impl UniversalIndex {
    /// Load the index, or start empty when no store exists yet.
    pub fn load(store_path: &Path) -> Result<Self> {
        if !store_path.exists() {
            return Ok(Self {
                store_path: store_path.to_path_buf(),
                records: Vec::new(),
            });
        }

        let mut workbook =
            open_workbook_auto(store_path).map_err(|source| AuditError::WorkbookRead {
                path: store_path.to_path_buf(),
                source,
            })?;
        let sheet_name = workbook
            .sheet_names()
            .first()
            .cloned()
            .ok_or_else(|| AuditError::SheetMissing {
                path: store_path.to_path_buf(),
                sheet: "Universal_Scan_DB".to_string(),
            })?;
        let range = workbook
            .worksheet_range(&sheet_name)
            .map_err(|source| AuditError::WorkbookRead {
                path: store_path.to_path_buf(),
                source,
            })?;

        let header: Vec<String> = (0..range.width() as u32)
            .map(|col| {
                range
                    .get_value((0, col))
                    .map(|c| CellValue::from(c).display())
                    .unwrap_or_default()
            })
            .collect();
        let col = |name: &str| header.iter().position(|h| h == name);
        let (Some(path_col), Some(status_col)) = (col("File_Path"), col("Status")) else {
            return Err(AuditError::SheetMissing {
                path: store_path.to_path_buf(),
                sheet: sheet_name,
            });
        };
        let size_col = col("Ukuran_MB");
        let modified_col = col("Last_Modified");
        let scan_col = col("Scan_Time");
        let rel_col = col("Relative_Path");
        let sync_col = col("Status_Sync");

        let text_at = |row: u32, col: Option<usize>| -> String {
            col.and_then(|c| range.get_value((row, c as u32)))
                .map(|c| CellValue::from(c).display())
                .unwrap_or_default()
        };

        let mut records = Vec::new();
        let last_row = range.end().map_or(0, |(row, _)| row);
        for row in 1..=last_row {
            let file_path = text_at(row, Some(path_col));
            if file_path.is_empty() {
                continue;
            }
            let size_mb = size_col
                .and_then(|c| range.get_value((row, c as u32)))
                .and_then(|c| match CellValue::from(c) {
                    CellValue::Number(n) => Some(n),
                    CellValue::Text(t) => t.parse().ok(),
                    _ => None,
                })
                .unwrap_or(0.0);
            let status_sync = {
                let value = text_at(row, sync_col);
                if value.is_empty() {
                    "EXISTS".to_string()
                } else {
                    value
                }
            };
            records.push(IndexRecord {
                file_path: PathBuf::from(file_path),
                status: text_at(row, Some(status_col)),
                size_mb,
                last_modified: text_at(row, modified_col),
                scan_time: text_at(row, scan_col),
                relative_path: text_at(row, rel_col),
                status_sync,
            });
        }

        Ok(Self {
            store_path: store_path.to_path_buf(),
            records,
        })
    }

    /// Walk `root`, appending unseen paths and updating records whose
    /// size or modification time changed.
    pub fn scan_and_update(&mut self, root: &Path, progress: &dyn ProgressSink) -> Result<ScanCounters> {
        if !root.is_dir() {
            return Err(AuditError::InvalidRoot(root.to_path_buf()));
        }

        let scan_time = Local::now().format(TIMESTAMP_FORMAT).to_string();
        let mut by_path: HashMap<PathBuf, usize> = self
            .records
            .iter()
            .enumerate()
            .map(|(idx, r)| (r.file_path.clone(), idx))
            .collect();
        let mut counters = ScanCounters::default();

        progress.begin("Scanning into universal index", None);
        for entry in WalkDir::new(root)
            .min_depth(1)
            .into_iter()
            .filter_entry(|e| !is_sync_artifact(&e.file_name().to_string_lossy()))
            .filter_map(|e| e.ok())
        {
            let path = entry.path().to_path_buf();
            let is_dir = entry.file_type().is_dir();
            let size_bytes = if is_dir {
                folder_size(&path)
            } else {
                match entry.metadata() {
                    Ok(m) => m.len(),
                    Err(e) => {
                        tracing::warn!("cannot stat {}: {e}", path.display());
                        continue;
                    }
                }
            };
            let last_modified = entry
                .metadata()
                .ok()
                .and_then(|m| m.modified().ok())
                .map(format_system_time)
                .unwrap_or_default();
            let size_mb = to_mb(size_bytes);
            let relative_path = path
                .strip_prefix(root)
                .map(|p| p.to_string_lossy().into_owned())
                .unwrap_or_default();

            progress.advance(&relative_path);
            match by_path.get(&path) {
                Some(&idx) => {
                    let record = &mut self.records[idx];
                    if record.last_modified != last_modified || record.size_mb != size_mb {
                        record.size_mb = size_mb;
                        record.last_modified = last_modified;
                        record.scan_time = scan_time.clone();
                        record.relative_path = relative_path;
                        counters.updated += 1;
                    }
                }
                None => {
                    let record = IndexRecord {
                        file_path: path.clone(),
                        status: if is_dir { "folder" } else { "file" }.to_string(),
                        size_mb,
                        last_modified,
                        scan_time: scan_time.clone(),
                        relative_path,
                        status_sync: "EXISTS".to_string(),
                    };
                    by_path.insert(path, self.records.len());
                    self.records.push(record);
                    counters.new += 1;
                }
            }
        }
        progress.finish();

        self.save()?;
        Ok(counters)
    }

    /// Re-stat every record. Present entries refresh their size and
    /// mtime and return to `EXISTS`; vanished entries flip to
    /// `MISSING` with a fresh scan time. No record is ever removed.
    pub fn synchronize(&mut self, progress: &dyn ProgressSink) -> Result<SyncCounters> {
        let sync_time = Local::now().format(TIMESTAMP_FORMAT).to_string();
        let mut counters = SyncCounters::default();

        progress.begin("Synchronizing universal index", Some(self.records.len() as u64));
        for record in &mut self.records {
            progress.advance(&record.file_path.to_string_lossy());
            if record.file_path.exists() {
                let size_bytes = if record.status == "folder" {
                    folder_size(&record.file_path)
                } else {
                    match std::fs::metadata(&record.file_path) {
                        Ok(m) => m.len(),
                        Err(e) => {
                            tracing::warn!(
                                "cannot stat {}: {e}",
                                record.file_path.display()
                            );
                            continue;
                        }
                    }
                };
                let size_mb = to_mb(size_bytes);
                let last_modified = std::fs::metadata(&record.file_path)
                    .ok()
                    .and_then(|m| m.modified().ok())
                    .map(format_system_time)
                    .unwrap_or_default();

                if record.size_mb != size_mb || record.last_modified != last_modified {
                    record.size_mb = size_mb;
                    record.last_modified = last_modified;
                    record.scan_time = sync_time.clone();
                    counters.updated += 1;
                }
                if record.status_sync == "MISSING" {
                    record.status_sync = "EXISTS".to_string();
                    counters.updated += 1;
                }
            } else if record.status_sync != "MISSING" {
                record.status_sync = "MISSING".to_string();
                record.scan_time = sync_time.clone();
                counters.missing += 1;
            }
        }
        progress.finish();

        self.save()?;
        Ok(counters)
    }

    /// Rewrite the store atomically.
    pub fn save(&self) -> Result<()> {
        if let Some(parent) = self.store_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        write_index_store(&self.store_path, &self.records)
    }

    /// Export with derived columns and summary to an arbitrary path.
    pub fn export(&self, path: &Path) -> Result<()> {
        write_index_export(path, &self.records)
    }
}

fn to_mb(bytes: u64) -> f64 {
    (bytes as f64 / (1024.0 * 1024.0) * 100.0).round() / 100.0
}

fn format_system_time(time: std::time::SystemTime) -> String {
    DateTime::<Local>::from(time)
        .format(TIMESTAMP_FORMAT)
        .to_string()
}

/// Total bytes of files beneath a folder.
fn folder_size(path: &Path) -> u64 {
    WalkDir::new(path)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter_map(|e| e.metadata().ok())
        .map(|m| m.len())
        .sum()
}
