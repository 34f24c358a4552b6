//! Anomaly scans: oversize files and non-document formats.
//!
//! Both modes share the traversal and the sync-artifact skip list but
//! apply disjoint predicates. Results come back sorted by size,
//! largest first, the order operators review them in.

use crate::domain::{is_sync_artifact, DOCUMENT_EXTENSIONS};
use crate::error::{AuditError, Result};
use crate::progress::ProgressSink;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Which predicate the scan applies.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AnomalyMode {
    /// Files at or above the threshold, in megabytes. Must be
    /// strictly positive.
    LargeFiles { min_size_mb: f64 },
    /// Files whose lowercased extension is outside the document
    /// allow-list.
    NonDocument,
}

/// One flagged file.
#[derive(Debug, Clone)]
pub struct AnomalousFile {
    pub name: String,
    pub path: PathBuf,
    pub size_bytes: u64,
    /// Lowercased extension with leading dot, or `(no ext)`.
    pub extension: String,
}

impl AnomalousFile {
    pub fn size_mb(&self) -> f64 {
        self.size_bytes as f64 / (1024.0 * 1024.0)
    }
}

/// Run one anomaly scan over `root`.
pub fn scan_anomalies(
    root: &Path,
    mode: AnomalyMode,
    progress: &dyn ProgressSink,
) -> Result<Vec<AnomalousFile>> {
    if !root.is_dir() {
        return Err(AuditError::InvalidRoot(root.to_path_buf()));
    }
    let min_size_bytes = match mode {
        AnomalyMode::LargeFiles { min_size_mb } => {
            if min_size_mb <= 0.0 {
                return Err(AuditError::InvalidThreshold(min_size_mb));
            }
            (min_size_mb * 1024.0 * 1024.0) as u64
        }
        AnomalyMode::NonDocument => 0,
    };

    progress.begin("Scanning for anomalies", None);
    let mut results = Vec::new();
    for entry in WalkDir::new(root).into_iter().filter_map(|e| match e {
        Ok(entry) => Some(entry),
        Err(err) => {
            tracing::warn!("walk error under {}: {err}", root.display());
            None
        }
    }) {
        if !entry.file_type().is_file() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().into_owned();
        if is_sync_artifact(&name) {
            continue;
        }
        let size_bytes = match entry.metadata() {
            Ok(m) => m.len(),
            Err(e) => {
                tracing::warn!("cannot stat {}: {e}", entry.path().display());
                continue;
            }
        };
        let extension = extension_of(&name);

        let flagged = match mode {
            AnomalyMode::LargeFiles { .. } => size_bytes >= min_size_bytes,
            AnomalyMode::NonDocument => !DOCUMENT_EXTENSIONS.contains(&extension.as_str()),
        };
        if flagged {
            progress.advance(&name);
            results.push(AnomalousFile {
                name,
                path: entry.path().to_path_buf(),
                size_bytes,
                extension,
            });
        }
    }
    progress.finish();

    results.sort_by(|a, b| b.size_bytes.cmp(&a.size_bytes));
    Ok(results)
}

fn extension_of(name: &str) -> String {
    match name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => format!(".{}", ext.to_lowercase()),
        _ => "(no ext)".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::NoProgress;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn large_file_mode_applies_threshold() {
        let tmp = TempDir::new().expect("tmp");
        fs::write(tmp.path().join("besar.pdf"), vec![0u8; 12 * 1024 * 1024]).expect("write");
        fs::write(tmp.path().join("kecil.pdf"), vec![0u8; 8 * 1024 * 1024]).expect("write");

        let results = scan_anomalies(
            tmp.path(),
            AnomalyMode::LargeFiles { min_size_mb: 10.0 },
            &NoProgress,
        )
        .expect("scan");
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].name, "besar.pdf");
    }

    #[test]
    fn threshold_must_be_positive() {
        let tmp = TempDir::new().expect("tmp");
        let err = scan_anomalies(
            tmp.path(),
            AnomalyMode::LargeFiles { min_size_mb: 0.0 },
            &NoProgress,
        )
        .unwrap_err();
        assert!(matches!(err, AuditError::InvalidThreshold(_)));
    }

    #[test]
    fn non_document_mode_flags_outside_allow_list() {
        let tmp = TempDir::new().expect("tmp");
        for name in ["a.pdf", "b.xlsx", "c.exe", "d.iso"] {
            fs::write(tmp.path().join(name), b"x").expect("write");
        }

        let results =
            scan_anomalies(tmp.path(), AnomalyMode::NonDocument, &NoProgress).expect("scan");
        let mut names: Vec<&str> = results.iter().map(|r| r.name.as_str()).collect();
        names.sort();
        assert_eq!(names, vec!["c.exe", "d.iso"]);
    }

    #[test]
    fn sync_artifacts_never_surface() {
        let tmp = TempDir::new().expect("tmp");
        fs::write(tmp.path().join(".sync_journal.db"), vec![0u8; 20 * 1024 * 1024])
            .expect("write");
        fs::write(tmp.path().join("~$besar.xlsx"), vec![0u8; 20 * 1024 * 1024]).expect("write");

        let large = scan_anomalies(
            tmp.path(),
            AnomalyMode::LargeFiles { min_size_mb: 1.0 },
            &NoProgress,
        )
        .expect("scan");
        assert!(large.is_empty());
        let non_doc =
            scan_anomalies(tmp.path(), AnomalyMode::NonDocument, &NoProgress).expect("scan");
        assert!(non_doc.is_empty());
    }

    #[test]
    fn results_sorted_by_size_descending() {
        let tmp = TempDir::new().expect("tmp");
        fs::write(tmp.path().join("a.exe"), vec![0u8; 100]).expect("write");
        fs::write(tmp.path().join("b.exe"), vec![0u8; 300]).expect("write");
        fs::write(tmp.path().join("c.exe"), vec![0u8; 200]).expect("write");

        let results =
            scan_anomalies(tmp.path(), AnomalyMode::NonDocument, &NoProgress).expect("scan");
        let sizes: Vec<u64> = results.iter().map(|r| r.size_bytes).collect();
        assert_eq!(sizes, vec![300, 200, 100]);
    }

    #[test]
    fn extension_normalization() {
        assert_eq!(extension_of("X.PDF"), ".pdf");
        assert_eq!(extension_of("archive.tar.gz"), ".gz");
        assert_eq!(extension_of("README"), "(no ext)");
        assert_eq!(extension_of(".hidden"), "(no ext)");
    }
}
