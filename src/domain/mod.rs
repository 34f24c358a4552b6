//! Shared data model: archive tree nodes, flat report tables, and the
//! fixed naming conventions of the OwnCloud archive layout.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// The eight standard top-level archive folders, in declared order.
pub const STANDARD_CATEGORIES: [&str; 8] = [
    "01.SURAT_MENYURAT",
    "02.DATA_ANGGOTA",
    "03.DATA_ANGGOTA_KELUAR",
    "04.DATA_DANA_RESIKO",
    "05.DATA_HARI_RAYA_ANGGOTA",
    "06.LAPORAN_BULANAN",
    "07.BUKU_BANK",
    "08.DATA_LWK",
];

/// Indonesian month names keyed by their two-digit folder prefix.
pub const MONTHS: [(&str, &str); 12] = [
    ("01", "JANUARI"),
    ("02", "FEBRUARI"),
    ("03", "MARET"),
    ("04", "APRIL"),
    ("05", "MEI"),
    ("06", "JUNI"),
    ("07", "JULI"),
    ("08", "AGUSTUS"),
    ("09", "SEPTEMBER"),
    ("10", "OKTOBER"),
    ("11", "NOVEMBER"),
    ("12", "DESEMBER"),
];

/// Monthly-report document prefixes for `06.LAPORAN_BULANAN`, matched
/// against filenames in this order; first match wins.
pub const REPORT_DOC_PREFIXES: [&str; 12] = [
    "01.NERACA",
    "02.PERHITUNGAN_HASIL_USAHA",
    "03.TRIAL_BALANCE",
    "04.FIXED_ASSET",
    "05.JOURNAL_VOUCHER",
    "06.INFORMASI_PORTOFOLIO",
    "07.DELIQUENCY",
    "08.MONTHLY_PROJECT_STATEMENT",
    "09.STATISTIK",
    "10.STATISTIK_PETUGAS_LAPANG",
    "11.STATISTIK_WILAYAH",
    "12.LOAN_PURPOSE",
];

/// The twelve member-document slots: code, document class, expected
/// file-name pattern.
pub const MEMBER_DOC_SLOTS: [(&str, &str, &str); 12] = [
    ("01", "KTP", "01_NAMA_ANGGOTA.pdf"),
    ("02", "Kartu Keluarga", "02_NAMA_ANGGOTA.pdf"),
    ("03", "Form PPI", "03_KODEPINJAMANKE_NAMA_ANGGOTA.pdf"),
    ("04", "Form UK", "04_NAMA_ANGGOTA.pdf"),
    ("05", "Form Keanggotaan", "05_NAMA_ANGGOTA.pdf"),
    ("06", "Form Pengajuan", "06_KODEPENGAJUANKE_NAMA_ANGGOTA.pdf"),
    ("07", "Akad Pencairan", "07_KODEPINJAMANKE_NAMA_ANGGOTA.pdf"),
    ("08", "Form Monitoring", "08_KODEPINJAMANKE_NAMA_ANGGOTA.pdf"),
    ("09", "Form Simpanan Hari Raya", "09_NAMA_ANGGOTA.pdf"),
    ("10", "Form Lainnya", "10_JENISFILE_NAMA_ANGGOTA.pdf"),
    ("11", "Form Cuti", "11_NAMA_ANGGOTA.pdf"),
    ("12", "Form Anggota Keluar", "12_NAMA_ANGGOTA.pdf"),
];

/// OwnCloud sync artifacts that are never reported by any scan.
pub const SYNC_ARTIFACTS: [&str; 4] = [
    ".owncloudsync.log",
    ".owncloudsync.log.1",
    ".sync_journal.db",
    ".sync_journal.db-wal",
];

/// Extensions considered ordinary archive documents by the anomaly scan.
pub const DOCUMENT_EXTENSIONS: [&str; 19] = [
    ".doc", ".docx", ".xls", ".xlsx", ".xlsm", ".ppt", ".pptx", ".odt", ".ods", ".odp", ".pdf",
    ".txt", ".rtf", ".csv", ".jpg", ".jpeg", ".png", ".gif", ".bmp",
];

/// Presence markers used throughout the emitted workbooks.
pub const PRESENT: &str = "ADA";
pub const ABSENT: &str = "TIDAK ADA";

/// Placeholder status for a standard category folder that does not exist.
pub const FOLDER_MISSING: &str = "FOLDER TIDAK ADA";

/// Timestamp format used in every emitted record.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Returns true when `name` is a sync artifact or an editor lock file
/// (leading `~`). Matching rows must never appear in any output.
pub fn is_sync_artifact(name: &str) -> bool {
    name.starts_with('~') || SYNC_ARTIFACTS.contains(&name)
}

/// One node of a scanned category sub-tree, in the shape the flatteners
/// consume. Folders carry their children; sizes are byte counts (for
/// folders: the sum of descendant file bytes).
#[derive(Debug, Clone)]
pub enum Node {
    File {
        name: String,
        path: PathBuf,
        size_bytes: u64,
    },
    Folder {
        name: String,
        path: PathBuf,
        children: Vec<Node>,
    },
}

impl Node {
    pub fn name(&self) -> &str {
        match self {
            Node::File { name, .. } | Node::Folder { name, .. } => name,
        }
    }

    pub fn path(&self) -> &Path {
        match self {
            Node::File { path, .. } | Node::Folder { path, .. } => path,
        }
    }

    pub fn is_folder(&self) -> bool {
        matches!(self, Node::Folder { .. })
    }

    /// Sum of file bytes beneath (and including) this node.
    pub fn total_bytes(&self) -> u64 {
        match self {
            Node::File { size_bytes, .. } => *size_bytes,
            Node::Folder { children, .. } => children.iter().map(Node::total_bytes).sum(),
        }
    }
}

/// A typed spreadsheet cell. Keeps numeric identity for sizes and IDs
/// while everything textual stays a string, so no float ever leaks into
/// a join key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CellValue {
    Empty,
    Text(String),
    Number(f64),
    Bool(bool),
}

impl CellValue {
    pub fn is_empty(&self) -> bool {
        matches!(self, CellValue::Empty)
    }

    /// Render the cell the way it would appear in a workbook cell.
    /// Integral floats drop their fractional part (`7.0` → `"7"`).
    pub fn display(&self) -> String {
        match self {
            CellValue::Empty => String::new(),
            CellValue::Text(s) => s.clone(),
            CellValue::Number(n) => {
                if n.fract() == 0.0 && n.abs() < 1e15 {
                    format!("{}", *n as i64)
                } else {
                    format!("{n}")
                }
            }
            CellValue::Bool(b) => format!("{b}"),
        }
    }

    pub fn text(s: impl Into<String>) -> Self {
        CellValue::Text(s.into())
    }
}

impl From<&calamine::Data> for CellValue {
    fn from(data: &calamine::Data) -> Self {
        use calamine::Data;
        match data {
            Data::Empty => CellValue::Empty,
            Data::String(s) => {
                if s.trim().is_empty() {
                    CellValue::Empty
                } else {
                    CellValue::Text(s.clone())
                }
            }
            Data::Float(f) => CellValue::Number(*f),
            Data::Int(i) => CellValue::Number(*i as f64),
            Data::Bool(b) => CellValue::Bool(*b),
            Data::DateTime(dt) => match dt.as_datetime() {
                Some(naive) => CellValue::Text(naive.format(TIMESTAMP_FORMAT).to_string()),
                None => CellValue::Number(dt.as_f64()),
            },
            Data::DateTimeIso(s) | Data::DurationIso(s) => CellValue::Text(s.clone()),
            Data::Error(e) => CellValue::Text(format!("{e:?}")),
        }
    }
}

/// A flat relational projection: ordered headers plus rows of cells.
/// Every emitted sheet is one of these.
#[derive(Debug, Clone, Default)]
pub struct FlatTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<CellValue>>,
}

impl FlatTable {
    pub fn new<S: Into<String>>(headers: impl IntoIterator<Item = S>) -> Self {
        Self {
            headers: headers.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    pub fn push(&mut self, row: Vec<CellValue>) {
        debug_assert_eq!(row.len(), self.headers.len());
        self.rows.push(row);
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Index of a header, if present.
    pub fn column(&self, header: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == header)
    }
}

/// Presence vector over the twelve member-document slots.
pub type SlotVector = [bool; 12];

/// One member folder observed under `02.DATA_ANGGOTA`, aggregated to
/// member granularity for reconciliation.
#[derive(Debug, Clone)]
pub struct MemberScanRow {
    /// 4-digit center code taken from the parent folder name.
    pub center: String,
    /// Full member folder name (`<id6>_<name>`).
    pub folder_name: String,
    /// 6-digit member id from the folder-name prefix.
    pub member_id: String,
    /// Derived display name (the segment after the first underscore).
    pub member_name: String,
    pub path: PathBuf,
    /// Total files directly inside the member folder.
    pub files_found: usize,
    pub slots: SlotVector,
}

impl MemberScanRow {
    /// Percentage of the twelve slots with at least one file.
    pub fn completeness_pct(&self) -> f64 {
        let filled = self.slots.iter().filter(|s| **s).count();
        filled as f64 / 12.0 * 100.0
    }

    pub fn is_complete(&self) -> bool {
        self.slots.iter().all(|s| *s)
    }
}

/// A folder that matched no grammar, kept for diagnostics.
#[derive(Debug, Clone)]
pub struct InvalidFolder {
    pub name: String,
    pub path: PathBuf,
    pub error: String,
}

/// One directory-tree node of a folder census: immutable within a
/// scan, superseded wholesale by the next scan.
#[derive(Debug, Clone)]
pub struct FolderRecord {
    pub path: PathBuf,
    pub relative_path: String,
    pub path_parts: Vec<String>,
    pub name: String,
    pub depth: usize,
    /// Files directly inside this folder.
    pub file_count: usize,
    pub subfolder_count: usize,
    /// Bytes of the files directly inside this folder.
    pub size_bytes: u64,
    pub modified: String,
    /// `TERISI` when the folder holds files, `KOSONG` otherwise.
    pub status: String,
}

/// Persistent universal-index record. `id` is assigned densely at emit
/// time and is not authoritative across saves.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IndexRecord {
    pub file_path: PathBuf,
    /// `"file"` or `"folder"`.
    pub status: String,
    pub size_mb: f64,
    pub last_modified: String,
    pub scan_time: String,
    pub relative_path: String,
    /// `"EXISTS"` or `"MISSING"`, maintained by the synchronize pass.
    pub status_sync: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sync_artifacts_and_lock_files_are_skipped() {
        assert!(is_sync_artifact(".owncloudsync.log"));
        assert!(is_sync_artifact(".sync_journal.db-wal"));
        assert!(is_sync_artifact("~$laporan.xlsx"));
        assert!(!is_sync_artifact("01_KTP.pdf"));
    }

    #[test]
    fn cell_display_drops_integral_fraction() {
        assert_eq!(CellValue::Number(7.0).display(), "7");
        assert_eq!(CellValue::Number(7.5).display(), "7.5");
        assert_eq!(CellValue::text("0007").display(), "0007");
        assert_eq!(CellValue::Empty.display(), "");
    }

    #[test]
    fn node_total_bytes_sums_descendants() {
        let tree = Node::Folder {
            name: "2024".into(),
            path: PathBuf::from("/a/2024"),
            children: vec![
                Node::File {
                    name: "x.pdf".into(),
                    path: PathBuf::from("/a/2024/x.pdf"),
                    size_bytes: 100,
                },
                Node::Folder {
                    name: "01.JANUARI".into(),
                    path: PathBuf::from("/a/2024/01.JANUARI"),
                    children: vec![Node::File {
                        name: "y.pdf".into(),
                        path: PathBuf::from("/a/2024/01.JANUARI/y.pdf"),
                        size_bytes: 50,
                    }],
                },
            ],
        };
        assert_eq!(tree.total_bytes(), 150);
    }

    #[test]
    fn member_completeness() {
        let mut row = MemberScanRow {
            center: "0007".into(),
            folder_name: "000042_ANI".into(),
            member_id: "000042".into(),
            member_name: "ANI".into(),
            path: PathBuf::from("/x"),
            files_found: 12,
            slots: [true; 12],
        };
        assert!(row.is_complete());
        assert_eq!(row.completeness_pct(), 100.0);
        row.slots[4] = false;
        assert!(!row.is_complete());
        assert!((row.completeness_pct() - 11.0 / 12.0 * 100.0).abs() < 1e-9);
    }
}
