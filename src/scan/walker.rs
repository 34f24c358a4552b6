//! Recursive archive walker.
//!
//! Builds one typed [`Node`] tree per standard category, in directory
//! order, skipping sync artifacts. Per-node stat failures drop the node
//! and leave the parent intact; permission failures on a subtree are
//! logged and the walk continues.

use crate::classify::{classify_folder, FolderKind};
use crate::domain::{is_sync_artifact, FolderRecord, Node, STANDARD_CATEGORIES, TIMESTAMP_FORMAT};
use crate::error::{AuditError, Result};
use crate::progress::ProgressSink;
use chrono::{DateTime, Local};
use std::fs;
use std::path::{Path, PathBuf};

/// One standard category as found (or not found) on disk.
#[derive(Debug, Clone)]
pub struct CategoryTree {
    pub name: &'static str,
    pub exists: bool,
    /// Direct children of the category folder, pre-order beneath.
    pub items: Vec<Node>,
}

impl CategoryTree {
    /// Count of (files, folders) beneath the category.
    pub fn counts(&self) -> (usize, usize) {
        fn walk(nodes: &[Node], files: &mut usize, folders: &mut usize) {
            for node in nodes {
                match node {
                    Node::File { .. } => *files += 1,
                    Node::Folder { children, .. } => {
                        *folders += 1;
                        walk(children, files, folders);
                    }
                }
            }
        }
        let (mut files, mut folders) = (0, 0);
        walk(&self.items, &mut files, &mut folders);
        (files, folders)
    }
}

/// Result of a full structure scan over the eight standard categories.
#[derive(Debug, Clone)]
pub struct CategoryScan {
    pub root: PathBuf,
    pub root_name: String,
    pub scan_time: String,
    pub categories: Vec<CategoryTree>,
}

/// Presence check over the root: which standard folders exist, and
/// which unrecognized folders sit beside them.
#[derive(Debug, Clone)]
pub struct StandardFolderReport {
    pub root: PathBuf,
    pub scan_time: String,
    /// `(category name, exists)` in declared order.
    pub standard: Vec<(&'static str, bool)>,
    /// Folders at the root that are not standard categories, each with
    /// whatever grammar its name does match.
    pub other_folders: Vec<(String, FolderKind)>,
}

fn ensure_root(root: &Path) -> Result<()> {
    if !root.is_dir() {
        return Err(AuditError::InvalidRoot(root.to_path_buf()));
    }
    Ok(())
}

/// Scan the eight standard categories beneath `root` into typed trees.
/// A missing category is reported with `exists: false` rather than
/// being omitted.
pub fn scan_categories(root: &Path, progress: &dyn ProgressSink) -> Result<CategoryScan> {
    ensure_root(root)?;
    progress.begin("Scanning archive structure", Some(STANDARD_CATEGORIES.len() as u64));

    let mut categories = Vec::with_capacity(STANDARD_CATEGORIES.len());
    for name in STANDARD_CATEGORIES {
        let path = root.join(name);
        let tree = if path.is_dir() {
            CategoryTree {
                name,
                exists: true,
                items: walk_children(&path, progress),
            }
        } else {
            CategoryTree {
                name,
                exists: false,
                items: Vec::new(),
            }
        };
        progress.advance(name);
        categories.push(tree);
    }
    progress.finish();

    Ok(CategoryScan {
        root: root.to_path_buf(),
        root_name: root
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default(),
        scan_time: Local::now().format(TIMESTAMP_FORMAT).to_string(),
        categories,
    })
}

/// Check which standard folders exist directly under `root`.
pub fn check_standard_folders(root: &Path) -> Result<StandardFolderReport> {
    ensure_root(root)?;

    let mut existing = Vec::new();
    match fs::read_dir(root) {
        Ok(entries) => {
            for entry in entries.flatten() {
                let name = entry.file_name().to_string_lossy().into_owned();
                if entry.path().is_dir() && !is_sync_artifact(&name) {
                    existing.push(name);
                }
            }
        }
        Err(e) => return Err(AuditError::Io(e)),
    }
    existing.sort();

    let standard: Vec<(&'static str, bool)> = STANDARD_CATEGORIES
        .iter()
        .map(|name| (*name, existing.iter().any(|f| f == name)))
        .collect();
    let other_folders: Vec<(String, FolderKind)> = existing
        .into_iter()
        .filter(|f| !STANDARD_CATEGORIES.contains(&f.as_str()))
        .map(|f| {
            let kind = classify_folder(&f);
            (f, kind)
        })
        .collect();

    Ok(StandardFolderReport {
        root: root.to_path_buf(),
        scan_time: Local::now().format(TIMESTAMP_FORMAT).to_string(),
        standard,
        other_folders,
    })
}

/// Per-folder census over a whole tree, pre-order. One record per
/// directory (the root included), counting direct files and
/// subfolders. `max_depth` bounds the descent; the root is depth 0.
#[derive(Debug, Clone)]
pub struct FolderCensus {
    pub root: PathBuf,
    pub scan_time: String,
    pub records: Vec<FolderRecord>,
    pub total_files: usize,
    pub total_size_bytes: u64,
    pub max_depth_seen: usize,
}

/// Walk `root` counting files per folder.
pub fn folder_census(
    root: &Path,
    max_depth: Option<usize>,
    progress: &dyn ProgressSink,
) -> Result<FolderCensus> {
    ensure_root(root)?;
    progress.begin("Counting files per folder", None);

    let mut census = FolderCensus {
        root: root.to_path_buf(),
        scan_time: Local::now().format(TIMESTAMP_FORMAT).to_string(),
        records: Vec::new(),
        total_files: 0,
        total_size_bytes: 0,
        max_depth_seen: 0,
    };
    census_folder(root, root, 0, max_depth, &mut census, progress);
    progress.finish();
    Ok(census)
}

fn census_folder(
    root: &Path,
    dir: &Path,
    depth: usize,
    max_depth: Option<usize>,
    census: &mut FolderCensus,
    progress: &dyn ProgressSink,
) {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            tracing::warn!("cannot read {}: {e}", dir.display());
            return;
        }
    };

    let mut file_count = 0usize;
    let mut size_bytes = 0u64;
    let mut subfolders: Vec<PathBuf> = Vec::new();
    for entry in entries.flatten() {
        let name = entry.file_name().to_string_lossy().into_owned();
        if is_sync_artifact(&name) {
            continue;
        }
        match entry.file_type() {
            Ok(t) if t.is_dir() => subfolders.push(entry.path()),
            Ok(_) => {
                file_count += 1;
                if let Ok(meta) = entry.metadata() {
                    size_bytes += meta.len();
                }
                progress.advance(&name);
            }
            Err(e) => tracing::warn!("cannot stat {}: {e}", entry.path().display()),
        }
    }
    subfolders.sort();

    let relative_path = if dir == root {
        root.file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    } else {
        dir.strip_prefix(root)
            .map(|p| p.to_string_lossy().into_owned())
            .unwrap_or_default()
    };
    let path_parts: Vec<String> = relative_path
        .split(std::path::MAIN_SEPARATOR)
        .map(str::to_string)
        .collect();
    let modified = fs::metadata(dir)
        .ok()
        .and_then(|m| m.modified().ok())
        .map(|t| DateTime::<Local>::from(t).format(TIMESTAMP_FORMAT).to_string())
        .unwrap_or_default();

    census.records.push(FolderRecord {
        path: dir.to_path_buf(),
        name: dir
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default(),
        depth,
        file_count,
        subfolder_count: subfolders.len(),
        size_bytes,
        modified,
        status: if file_count > 0 { "TERISI" } else { "KOSONG" }.to_string(),
        relative_path,
        path_parts,
    });
    census.total_files += file_count;
    census.total_size_bytes += size_bytes;
    census.max_depth_seen = census.max_depth_seen.max(depth);

    if max_depth.is_some_and(|limit| depth >= limit) {
        return;
    }
    for sub in subfolders {
        census_folder(root, &sub, depth + 1, max_depth, census, progress);
    }
}

/// Recursively read `dir` into nodes, directory order, skipping sync
/// artifacts. Unreadable entries are logged and dropped.
fn walk_children(dir: &Path, progress: &dyn ProgressSink) -> Vec<Node> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            tracing::warn!("cannot read {}: {e}", dir.display());
            return Vec::new();
        }
    };

    let mut children = Vec::new();
    for entry in entries {
        let entry = match entry {
            Ok(e) => e,
            Err(e) => {
                tracing::warn!("unreadable entry under {}: {e}", dir.display());
                continue;
            }
        };
        let name = entry.file_name().to_string_lossy().into_owned();
        if is_sync_artifact(&name) {
            continue;
        }
        let path = entry.path();
        let file_type = match entry.file_type() {
            Ok(t) => t,
            Err(e) => {
                tracing::warn!("cannot stat {}: {e}", path.display());
                continue;
            }
        };

        if file_type.is_dir() {
            children.push(Node::Folder {
                name,
                path: path.clone(),
                children: walk_children(&path, progress),
            });
        } else {
            let size_bytes = match entry.metadata() {
                Ok(m) => m.len(),
                Err(e) => {
                    tracing::warn!("cannot stat {}: {e}", path.display());
                    continue;
                }
            };
            progress.advance(&name);
            children.push(Node::File {
                name,
                path,
                size_bytes,
            });
        }
    }
    // Directory iteration order is OS-dependent; sort for stable rows.
    children.sort_by(|a, b| a.name().cmp(b.name()));
    children
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::NoProgress;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn missing_root_is_fatal() {
        let err = scan_categories(Path::new("/no/such/root"), &NoProgress).unwrap_err();
        assert!(matches!(err, AuditError::InvalidRoot(_)));
    }

    #[test]
    fn missing_categories_are_reported_not_omitted() {
        let tmp = TempDir::new().expect("tmp");
        fs::create_dir(tmp.path().join("02.DATA_ANGGOTA")).expect("mkdir");

        let scan = scan_categories(tmp.path(), &NoProgress).expect("scan");
        assert_eq!(scan.categories.len(), 8);
        let data_anggota = &scan.categories[1];
        assert!(data_anggota.exists);
        let surat = &scan.categories[0];
        assert!(!surat.exists);
    }

    #[test]
    fn walk_skips_sync_artifacts_and_lock_files() {
        let tmp = TempDir::new().expect("tmp");
        let cat = tmp.path().join("05.DATA_HARI_RAYA_ANGGOTA/2024");
        fs::create_dir_all(&cat).expect("mkdir");
        fs::write(cat.join("01.JANUARI.xlsx"), b"x").expect("write");
        fs::write(cat.join(".owncloudsync.log"), b"x").expect("write");
        fs::write(cat.join("~$01.JANUARI.xlsx"), b"x").expect("write");

        let scan = scan_categories(tmp.path(), &NoProgress).expect("scan");
        let hari_raya = &scan.categories[4];
        let (files, folders) = hari_raya.counts();
        assert_eq!(files, 1);
        assert_eq!(folders, 1);
    }

    #[test]
    fn folder_sizes_sum_descendant_files() {
        let tmp = TempDir::new().expect("tmp");
        let year = tmp.path().join("07.BUKU_BANK/2024");
        fs::create_dir_all(&year).expect("mkdir");
        fs::write(year.join("01.JANUARI_BUKUBANK.xlsx"), vec![0u8; 300]).expect("write");
        fs::write(year.join("02.FEBRUARI_BUKUBANK.xlsx"), vec![0u8; 200]).expect("write");

        let scan = scan_categories(tmp.path(), &NoProgress).expect("scan");
        let buku_bank = &scan.categories[6];
        assert_eq!(buku_bank.items.len(), 1);
        assert_eq!(buku_bank.items[0].total_bytes(), 500);
    }

    #[test]
    fn census_counts_direct_files_and_tracks_depth() {
        let tmp = TempDir::new().expect("tmp");
        let month = tmp.path().join("06.LAPORAN_BULANAN/2024/01.JANUARI");
        fs::create_dir_all(&month).expect("mkdir");
        fs::write(month.join("01.NERACA.pdf"), vec![0u8; 100]).expect("write");
        fs::write(month.join(".owncloudsync.log"), b"x").expect("write");

        let census = folder_census(tmp.path(), None, &NoProgress).expect("census");
        // Root, category, year, month.
        assert_eq!(census.records.len(), 4);
        assert_eq!(census.total_files, 1);
        assert_eq!(census.total_size_bytes, 100);
        assert_eq!(census.max_depth_seen, 3);

        let month_record = census
            .records
            .iter()
            .find(|r| r.name == "01.JANUARI")
            .expect("month record");
        assert_eq!(month_record.file_count, 1);
        assert_eq!(month_record.status, "TERISI");
        assert_eq!(month_record.depth, 3);

        let year_record = census
            .records
            .iter()
            .find(|r| r.name == "2024")
            .expect("year record");
        assert_eq!(year_record.file_count, 0);
        assert_eq!(year_record.status, "KOSONG");
        assert_eq!(year_record.subfolder_count, 1);
    }

    #[test]
    fn census_honors_depth_bound() {
        let tmp = TempDir::new().expect("tmp");
        fs::create_dir_all(tmp.path().join("a/b/c")).expect("mkdir");

        let census = folder_census(tmp.path(), Some(1), &NoProgress).expect("census");
        // Root (0) and `a` (1); the bound stops before `b`.
        assert_eq!(census.records.len(), 2);
    }

    #[test]
    fn standard_folder_report_splits_known_and_other() {
        let tmp = TempDir::new().expect("tmp");
        fs::create_dir(tmp.path().join("01.SURAT_MENYURAT")).expect("mkdir");
        fs::create_dir(tmp.path().join("BACKUP_LAMA")).expect("mkdir");

        let report = check_standard_folders(tmp.path()).expect("report");
        assert!(report.standard[0].1);
        assert!(!report.standard[1].1);
        assert_eq!(report.other_folders.len(), 1);
        assert_eq!(report.other_folders[0].0, "BACKUP_LAMA");
        assert_eq!(report.other_folders[0].1, FolderKind::Other);
    }

    #[test]
    fn stray_center_folder_at_root_is_recognized() {
        let tmp = TempDir::new().expect("tmp");
        fs::create_dir(tmp.path().join("0007")).expect("mkdir");

        let report = check_standard_folders(tmp.path()).expect("report");
        assert_eq!(report.other_folders[0].1, FolderKind::Center);
    }
}
