//! Member-granularity scan of `02.DATA_ANGGOTA`.
//!
//! Walks center folders (4 digits) and the member folders inside them
//! (`<id6>_<name>`), grouping each member's files by their two-digit
//! slot prefix into the presence vector consumed by reconciliation.
//! Folders matching neither grammar are preserved as diagnostics.

use crate::classify::{is_center_folder, split_member_folder};
use crate::domain::{is_sync_artifact, InvalidFolder, MemberScanRow, SlotVector};
use crate::error::{AuditError, Result};
use crate::progress::ProgressSink;
use std::fs;
use std::path::{Path, PathBuf};

/// Outcome of a member-level scan: one row per valid member folder, in
/// walk order, plus everything that failed a grammar.
#[derive(Debug, Default)]
pub struct MemberScan {
    pub members: Vec<MemberScanRow>,
    pub invalid_folders: Vec<InvalidFolder>,
    /// Centers visited, in walk order.
    pub centers: Vec<String>,
}

impl MemberScan {
    /// Members with all twelve slots filled.
    pub fn complete_members(&self) -> usize {
        self.members.iter().filter(|m| m.is_complete()).count()
    }

    pub fn total_files(&self) -> usize {
        self.members.iter().map(|m| m.files_found).sum()
    }
}

/// Scan `<root>/02.DATA_ANGGOTA`. `root` may also point directly at a
/// center folder or a single member folder; the level is detected from
/// the folder name, mirroring how operators pick scan targets.
pub fn scan_members(root: &Path, progress: &dyn ProgressSink) -> Result<MemberScan> {
    if !root.is_dir() {
        return Err(AuditError::InvalidRoot(root.to_path_buf()));
    }

    let root_name = root
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    let mut scan = MemberScan::default();
    progress.begin("Scanning member folders", None);

    if split_member_folder(&root_name).is_some() {
        // Single member folder: the center comes from the parent.
        let center = root
            .parent()
            .and_then(|p| p.file_name())
            .map(|n| n.to_string_lossy().into_owned())
            .filter(|n| is_center_folder(n))
            .unwrap_or_default();
        scan_member_folder(root, &center, &root_name, &mut scan, progress);
    } else if is_center_folder(&root_name) {
        scan_center_folder(root, &root_name, &mut scan, progress);
    } else {
        // Treat as the category root holding center folders.
        let data_root = if root_name == "02.DATA_ANGGOTA" {
            root.to_path_buf()
        } else {
            let nested = root.join("02.DATA_ANGGOTA");
            if nested.is_dir() {
                nested
            } else {
                root.to_path_buf()
            }
        };
        scan_data_root(&data_root, &mut scan, progress);
    }

    progress.finish();
    Ok(scan)
}

fn scan_data_root(root: &Path, scan: &mut MemberScan, progress: &dyn ProgressSink) {
    for (name, path) in read_subfolders(root) {
        if is_center_folder(&name) {
            scan_center_folder(&path, &name, scan, progress);
        } else {
            scan.invalid_folders.push(InvalidFolder {
                name: name.clone(),
                path,
                error: format!("nama folder tidak sesuai pola 4 digit: {name}"),
            });
        }
    }
}

fn scan_center_folder(path: &Path, center: &str, scan: &mut MemberScan, progress: &dyn ProgressSink) {
    scan.centers.push(center.to_string());
    for (name, member_path) in read_subfolders(path) {
        if split_member_folder(&name).is_some() {
            scan_member_folder(&member_path, center, &name, scan, progress);
        } else {
            scan.invalid_folders.push(InvalidFolder {
                name: name.clone(),
                path: member_path,
                error: format!("nama folder tidak sesuai pola 6digit_nama: {name}"),
            });
        }
    }
}

fn scan_member_folder(
    path: &Path,
    center: &str,
    folder_name: &str,
    scan: &mut MemberScan,
    progress: &dyn ProgressSink,
) {
    let Some((member_id, member_name)) = split_member_folder(folder_name) else {
        scan.invalid_folders.push(InvalidFolder {
            name: folder_name.to_string(),
            path: path.to_path_buf(),
            error: format!("nama folder tidak sesuai pola 6digit_nama: {folder_name}"),
        });
        return;
    };

    let mut slots: SlotVector = [false; 12];
    let mut files_found = 0usize;

    let entries = match fs::read_dir(path) {
        Ok(entries) => entries,
        Err(e) => {
            tracing::warn!("cannot read member folder {}: {e}", path.display());
            scan.invalid_folders.push(InvalidFolder {
                name: folder_name.to_string(),
                path: path.to_path_buf(),
                error: format!("folder tidak dapat diakses: {e}"),
            });
            return;
        }
    };

    for entry in entries.flatten() {
        let name = entry.file_name().to_string_lossy().into_owned();
        if is_sync_artifact(&name) {
            continue;
        }
        let is_file = entry.file_type().map(|t| t.is_file()).unwrap_or(false);
        if !is_file {
            continue;
        }
        files_found += 1;
        if let Some(slot) = slot_index(&name) {
            slots[slot] = true;
        }
        progress.advance(&name);
    }

    scan.members.push(MemberScanRow {
        center: center.to_string(),
        folder_name: folder_name.to_string(),
        member_id: member_id.to_string(),
        member_name: member_name.to_string(),
        path: path.to_path_buf(),
        files_found,
        slots,
    });
}

/// Slot index (0-based) from the two-digit filename prefix `01`..`12`.
fn slot_index(filename: &str) -> Option<usize> {
    let prefix = filename.get(..2)?;
    if !prefix.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    match prefix.parse::<usize>() {
        Ok(n) if (1..=12).contains(&n) => Some(n - 1),
        _ => None,
    }
}

fn read_subfolders(dir: &Path) -> Vec<(String, PathBuf)> {
    let mut folders = Vec::new();
    match fs::read_dir(dir) {
        Ok(entries) => {
            for entry in entries.flatten() {
                let name = entry.file_name().to_string_lossy().into_owned();
                if is_sync_artifact(&name) {
                    continue;
                }
                if entry.file_type().map(|t| t.is_dir()).unwrap_or(false) {
                    folders.push((name, entry.path()));
                }
            }
        }
        Err(e) => tracing::warn!("cannot read {}: {e}", dir.display()),
    }
    folders.sort_by(|a, b| a.0.cmp(&b.0));
    folders
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::NoProgress;
    use std::fs;
    use tempfile::TempDir;

    fn make_member(root: &Path, center: &str, member: &str, slots: &[u32]) {
        let dir = root.join("02.DATA_ANGGOTA").join(center).join(member);
        fs::create_dir_all(&dir).expect("mkdir");
        for slot in slots {
            fs::write(dir.join(format!("{slot:02}_DOK.pdf")), b"pdf").expect("write");
        }
    }

    #[test]
    fn full_presence_vector() {
        let tmp = TempDir::new().expect("tmp");
        make_member(tmp.path(), "0007", "000042_ANI", &(1..=12).collect::<Vec<_>>());

        let scan = scan_members(tmp.path(), &NoProgress).expect("scan");
        assert_eq!(scan.members.len(), 1);
        let row = &scan.members[0];
        assert_eq!(row.center, "0007");
        assert_eq!(row.member_id, "000042");
        assert_eq!(row.member_name, "ANI");
        assert!(row.slots.iter().all(|s| *s));
        assert!(row.is_complete());
    }

    #[test]
    fn missing_slot_is_absent_not_dropped() {
        let tmp = TempDir::new().expect("tmp");
        let slots: Vec<u32> = (1..=12).filter(|s| *s != 5).collect();
        make_member(tmp.path(), "0007", "000042_ANI", &slots);

        let scan = scan_members(tmp.path(), &NoProgress).expect("scan");
        let row = &scan.members[0];
        assert!(!row.slots[4]);
        assert_eq!(row.slots.iter().filter(|s| **s).count(), 11);
        assert_eq!(row.files_found, 11);
    }

    #[test]
    fn invalid_folders_are_collected_with_reasons() {
        let tmp = TempDir::new().expect("tmp");
        make_member(tmp.path(), "0007", "000042_ANI", &[1]);
        fs::create_dir_all(tmp.path().join("02.DATA_ANGGOTA/BUKAN_CENTER")).expect("mkdir");
        fs::create_dir_all(tmp.path().join("02.DATA_ANGGOTA/0007/42_ANI")).expect("mkdir");

        let scan = scan_members(tmp.path(), &NoProgress).expect("scan");
        assert_eq!(scan.members.len(), 1);
        assert_eq!(scan.invalid_folders.len(), 2);
        assert!(scan.invalid_folders.iter().any(|f| f.name == "BUKAN_CENTER"));
        assert!(scan.invalid_folders.iter().any(|f| f.name == "42_ANI"));
    }

    #[test]
    fn scan_accepts_center_folder_directly() {
        let tmp = TempDir::new().expect("tmp");
        make_member(tmp.path(), "0007", "000042_ANI", &[1, 2]);

        let center_path = tmp.path().join("02.DATA_ANGGOTA/0007");
        let scan = scan_members(&center_path, &NoProgress).expect("scan");
        assert_eq!(scan.members.len(), 1);
        assert_eq!(scan.centers, vec!["0007".to_string()]);
    }

    #[test]
    fn slot_prefixes_outside_range_are_uncategorized() {
        let tmp = TempDir::new().expect("tmp");
        let dir = tmp.path().join("02.DATA_ANGGOTA/0007/000042_ANI");
        fs::create_dir_all(&dir).expect("mkdir");
        fs::write(dir.join("13_EXTRA.pdf"), b"x").expect("write");
        fs::write(dir.join("00_EXTRA.pdf"), b"x").expect("write");
        fs::write(dir.join("catatan.txt"), b"x").expect("write");

        let scan = scan_members(tmp.path(), &NoProgress).expect("scan");
        let row = &scan.members[0];
        assert_eq!(row.files_found, 3);
        assert!(row.slots.iter().all(|s| !*s));
    }
}
