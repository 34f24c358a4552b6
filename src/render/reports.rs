//! Concrete report workbooks.

use crate::anomaly::{AnomalousFile, AnomalyMode};
use crate::domain::{CellValue, FlatTable, IndexRecord, MEMBER_DOC_SLOTS, TIMESTAMP_FORMAT};
use crate::error::Result;
use crate::extract::{FamilyCardCheck, FundingRequest};
use crate::flatten::flatten_category;
use crate::reconcile::Reconciliation;
use crate::render::workbook::{add_summary_sheet, add_table_sheet, save_workbook};
use crate::scan::{CategoryScan, FolderCensus, MemberScan};
use chrono::Local;
use rust_xlsxwriter::Workbook;
use std::path::Path;

fn now_cell() -> CellValue {
    CellValue::text(Local::now().format(TIMESTAMP_FORMAT).to_string())
}

fn count_cell(n: usize) -> CellValue {
    CellValue::Number(n as f64)
}

/// Structural report: one sheet per standard category plus `Summary`.
pub fn write_structure_report(path: &Path, scan: &CategoryScan) -> Result<()> {
    let mut workbook = Workbook::new();

    let mut total_files = 0usize;
    let mut total_folders = 0usize;
    for tree in &scan.categories {
        let table = flatten_category(tree);
        add_table_sheet(&mut workbook, tree.name, &table)?;
        let (files, folders) = tree.counts();
        total_files += files;
        total_folders += folders;
    }

    add_summary_sheet(
        &mut workbook,
        &[
            ("Root".to_string(), CellValue::text(scan.root.to_string_lossy())),
            ("Scan Time".to_string(), CellValue::text(&scan.scan_time)),
            ("Total Files".to_string(), count_cell(total_files)),
            ("Total Folders".to_string(), count_cell(total_folders)),
            (
                "Kategori Ada".to_string(),
                count_cell(scan.categories.iter().filter(|c| c.exists).count()),
            ),
            (
                "Kategori Tidak Ada".to_string(),
                count_cell(scan.categories.iter().filter(|c| !c.exists).count()),
            ),
        ],
    )?;

    save_workbook(&mut workbook, path)
}

/// Reconciliation workbook: the four logical tables, the slot
/// reference sheet, and a summary carrying the diagnostics.
pub fn write_reconciliation_workbook(
    path: &Path,
    recon: &Reconciliation,
    scan: &MemberScan,
) -> Result<()> {
    let mut workbook = Workbook::new();
    add_table_sheet(&mut workbook, "databaseanggota", &recon.membership)?;
    add_table_sheet(&mut workbook, "hasilscan", &recon.scan)?;
    add_table_sheet(&mut workbook, "datamatching", &recon.matched)?;
    add_table_sheet(&mut workbook, "belumdiarsip", &recon.not_archived)?;
    add_table_sheet(&mut workbook, "Mapping_Dokumen", &slot_reference_table())?;

    let mut summary = vec![
        ("Export Time".to_string(), now_cell()),
        (
            "Total Database".to_string(),
            count_cell(recon.stats.membership_rows),
        ),
        (
            "Database Key Valid".to_string(),
            count_cell(recon.stats.membership_rows_with_key),
        ),
        (
            "Database Key Tidak Valid".to_string(),
            count_cell(recon.stats.membership_rows_without_key),
        ),
        ("Total Scan".to_string(), count_cell(recon.stats.scan_rows)),
        ("Data Matching".to_string(), count_cell(recon.stats.matched_rows)),
        (
            "Belum Diarsip".to_string(),
            count_cell(recon.stats.not_archived_rows),
        ),
        (
            "Duplikat Scan".to_string(),
            count_cell(recon.stats.duplicate_scan.len()),
        ),
        (
            "Anggota Lengkap".to_string(),
            count_cell(scan.complete_members()),
        ),
        (
            "Folder Tidak Valid".to_string(),
            count_cell(scan.invalid_folders.len()),
        ),
    ];
    if !scan.members.is_empty() {
        let rate = scan.complete_members() as f64 / scan.members.len() as f64 * 100.0;
        summary.push((
            "Persentase Lengkap".to_string(),
            CellValue::text(format!("{rate:.1}%")),
        ));
    }
    for (key, folder) in &recon.stats.duplicate_scan {
        summary.push((
            format!("Duplikat {key}"),
            CellValue::text(folder),
        ));
    }
    for invalid in &scan.invalid_folders {
        summary.push((
            format!("Folder Invalid {}", invalid.name),
            CellValue::text(&invalid.error),
        ));
    }
    add_summary_sheet(&mut workbook, &summary)?;

    save_workbook(&mut workbook, path)
}

fn slot_reference_table() -> FlatTable {
    let mut table = FlatTable::new(["Kode", "Jenis_Dokumen", "Format_Penamaan"]);
    for (code, doc_type, pattern) in MEMBER_DOC_SLOTS {
        table.push(vec![
            CellValue::text(code),
            CellValue::text(doc_type),
            CellValue::text(pattern),
        ]);
    }
    table
}

/// Folder census report: one row per directory with hierarchy columns
/// up to the deepest level seen.
pub fn write_census_report(path: &Path, census: &FolderCensus) -> Result<()> {
    let mut headers: Vec<String> =
        (1..=census.max_depth_seen + 1).map(|l| format!("LEVEL_{l}")).collect();
    headers.extend(
        [
            "FOLDER_NAME",
            "LEVEL",
            "JUMLAH_FILE",
            "JUMLAH_SUBFOLDER",
            "UKURAN_KB",
            "STATUS",
            "PATH",
        ]
        .map(String::from),
    );

    let levels = census.max_depth_seen + 1;
    let mut table = FlatTable::new(headers);
    for record in &census.records {
        let mut row: Vec<CellValue> = (0..levels)
            .map(|i| match record.path_parts.get(i) {
                Some(part) => CellValue::text(part),
                None => CellValue::Empty,
            })
            .collect();
        row.extend([
            CellValue::text(&record.name),
            CellValue::Number(record.depth as f64),
            count_cell(record.file_count),
            count_cell(record.subfolder_count),
            CellValue::Number((record.size_bytes as f64 / 1024.0 * 100.0).round() / 100.0),
            CellValue::text(&record.status),
            CellValue::text(record.path.to_string_lossy()),
        ]);
        table.push(row);
    }

    let mut workbook = Workbook::new();
    add_table_sheet(&mut workbook, "Jumlah_File", &table)?;
    add_summary_sheet(
        &mut workbook,
        &[
            ("Root".to_string(), CellValue::text(census.root.to_string_lossy())),
            ("Scan Time".to_string(), CellValue::text(&census.scan_time)),
            ("Total Folders".to_string(), count_cell(census.records.len())),
            ("Total Files".to_string(), count_cell(census.total_files)),
            (
                "Total Size (MB)".to_string(),
                CellValue::Number(
                    (census.total_size_bytes as f64 / (1024.0 * 1024.0) * 100.0).round() / 100.0,
                ),
            ),
            (
                "Max Depth".to_string(),
                CellValue::Number(census.max_depth_seen as f64),
            ),
        ],
    )?;
    save_workbook(&mut workbook, path)
}

/// Anomaly report: one sheet named after the mode.
pub fn write_anomaly_report(
    path: &Path,
    mode: AnomalyMode,
    results: &[AnomalousFile],
) -> Result<()> {
    let mut table = FlatTable::new([
        "No",
        "Nama File",
        "Ekstensi",
        "Ukuran (MB)",
        "Ukuran (Bytes)",
        "PATH",
    ]);
    for (idx, file) in results.iter().enumerate() {
        table.push(vec![
            count_cell(idx + 1),
            CellValue::text(&file.name),
            CellValue::text(&file.extension),
            CellValue::Number((file.size_mb() * 100.0).round() / 100.0),
            CellValue::Number(file.size_bytes as f64),
            CellValue::text(file.path.to_string_lossy()),
        ]);
    }

    let sheet = match mode {
        AnomalyMode::LargeFiles { .. } => "File_Besar",
        AnomalyMode::NonDocument => "Non_Dokumen",
    };
    let mut workbook = Workbook::new();
    add_table_sheet(&mut workbook, sheet, &table)?;
    save_workbook(&mut workbook, path)
}

/// Funding-request report with the extracted workbook fields.
pub fn write_funding_report(path: &Path, requests: &[FundingRequest]) -> Result<()> {
    let mut table = FlatTable::new([
        "No",
        "Tahun",
        "Bulan",
        "No Surat (Nama)",
        "No Surat (F8)",
        "Nominal Input",
        "Nominal Kebutuhan",
        "Status Balance",
        "Tgl Disburse Awal",
        "Tgl Disburse Akhir",
        "Nama BM",
        "Status Analisa",
        "Nama File",
        "PATH",
    ]);
    for (idx, request) in requests.iter().enumerate() {
        let fields = request.fields.clone().unwrap_or_default();
        let opt = |value: Option<CellValue>| value.unwrap_or(CellValue::Empty);
        table.push(vec![
            count_cell(idx + 1),
            CellValue::Number(request.year as f64),
            CellValue::text(&request.month_name),
            CellValue::text(&request.document_no),
            opt(fields.document_no),
            opt(fields.requested_amount),
            opt(fields.required_amount),
            fields
                .balance_status
                .map_or(CellValue::Empty, CellValue::Text),
            opt(fields.first_disbursement),
            opt(fields.last_disbursement),
            opt(fields.branch_manager),
            CellValue::text(&request.analysis_status),
            CellValue::text(&request.file_name),
            CellValue::text(request.path.to_string_lossy()),
        ]);
    }

    let mut workbook = Workbook::new();
    add_table_sheet(&mut workbook, "Pengajuan_Dana", &table)?;
    add_summary_sheet(
        &mut workbook,
        &[
            ("Export Time".to_string(), now_cell()),
            ("Total File".to_string(), count_cell(requests.len())),
            (
                "Analisa Sukses".to_string(),
                count_cell(
                    requests
                        .iter()
                        .filter(|r| r.analysis_status == "SUCCESS")
                        .count(),
                ),
            ),
        ],
    )?;
    save_workbook(&mut workbook, path)
}

/// Family-card check report.
pub fn write_family_card_report(path: &Path, checks: &[FamilyCardCheck]) -> Result<()> {
    let mut table = FlatTable::new([
        "No",
        "Center",
        "Folder Anggota",
        "Nama File",
        "NO KK",
        "Valid",
        "Keterangan",
        "Error",
        "PATH",
    ]);
    for (idx, check) in checks.iter().enumerate() {
        table.push(vec![
            count_cell(idx + 1),
            CellValue::text(&check.center),
            CellValue::text(&check.member_folder),
            CellValue::text(&check.file_name),
            check
                .number
                .clone()
                .map_or(CellValue::Empty, CellValue::Text),
            CellValue::text(if check.validation.valid { "YA" } else { "TIDAK" }),
            CellValue::text(&check.validation.reason),
            CellValue::text(&check.error),
            CellValue::text(check.path.to_string_lossy()),
        ]);
    }

    let mut workbook = Workbook::new();
    add_table_sheet(&mut workbook, "Cek_NO_KK", &table)?;
    add_summary_sheet(
        &mut workbook,
        &[
            ("Export Time".to_string(), now_cell()),
            ("Total File".to_string(), count_cell(checks.len())),
            (
                "Valid".to_string(),
                count_cell(checks.iter().filter(|c| c.validation.valid).count()),
            ),
        ],
    )?;
    save_workbook(&mut workbook, path)
}

fn index_row(idx: usize, record: &IndexRecord) -> Vec<CellValue> {
    vec![
        count_cell(idx + 1),
        CellValue::text(record.file_path.to_string_lossy()),
        CellValue::text(&record.status),
        CellValue::Number(record.size_mb),
        CellValue::text(&record.last_modified),
        CellValue::text(&record.scan_time),
        CellValue::text(&record.relative_path),
        CellValue::text(&record.status_sync),
    ]
}

const INDEX_HEADERS: [&str; 8] = [
    "ID",
    "File_Path",
    "Status",
    "Ukuran_MB",
    "Last_Modified",
    "Scan_Time",
    "Relative_Path",
    "Status_Sync",
];

/// Persist the universal index. The workbook is written beside the
/// target and renamed into place so a crash never truncates the store.
pub fn write_index_store(path: &Path, records: &[IndexRecord]) -> Result<()> {
    let mut table = FlatTable::new(INDEX_HEADERS);
    for (idx, record) in records.iter().enumerate() {
        table.push(index_row(idx, record));
    }

    let mut workbook = Workbook::new();
    add_table_sheet(&mut workbook, "Universal_Scan_DB", &table)?;

    let tmp_path = path.with_extension("xlsx.tmp");
    save_workbook(&mut workbook, &tmp_path)?;
    std::fs::rename(&tmp_path, path)?;
    Ok(())
}

/// Export the universal index with the derived columns and a summary.
pub fn write_index_export(path: &Path, records: &[IndexRecord]) -> Result<()> {
    let mut headers: Vec<String> = INDEX_HEADERS.iter().map(|h| h.to_string()).collect();
    headers.extend(["File_Name".to_string(), "Directory".to_string(), "Extension".to_string()]);

    let mut table = FlatTable::new(headers);
    for (idx, record) in records.iter().enumerate() {
        let mut row = index_row(idx, record);
        row.push(CellValue::text(
            record
                .file_path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default(),
        ));
        row.push(CellValue::text(
            record
                .file_path
                .parent()
                .map(|p| p.to_string_lossy().into_owned())
                .unwrap_or_default(),
        ));
        row.push(if record.status == "file" {
            CellValue::text(
                record
                    .file_path
                    .extension()
                    .map(|e| format!(".{}", e.to_string_lossy()))
                    .unwrap_or_default(),
            )
        } else {
            CellValue::Empty
        });
        table.push(row);
    }

    let files = records.iter().filter(|r| r.status == "file").count();
    let folders = records.iter().filter(|r| r.status == "folder").count();
    let missing = records.iter().filter(|r| r.status_sync == "MISSING").count();
    let total_mb: f64 = records.iter().map(|r| r.size_mb).sum();

    let mut workbook = Workbook::new();
    add_table_sheet(&mut workbook, "Database", &table)?;
    add_summary_sheet(
        &mut workbook,
        &[
            ("Export Time".to_string(), now_cell()),
            ("Total Records".to_string(), count_cell(records.len())),
            ("Total Files".to_string(), count_cell(files)),
            ("Total Folders".to_string(), count_cell(folders)),
            ("Missing Items".to_string(), count_cell(missing)),
            (
                "Total Size (MB)".to_string(),
                CellValue::Number((total_mb * 100.0).round() / 100.0),
            ),
        ],
    )?;
    save_workbook(&mut workbook, path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::NoProgress;
    use crate::scan::scan_categories;
    use calamine::{open_workbook_auto, Reader};
    use std::fs;
    use std::path::PathBuf;
    use tempfile::TempDir;

    #[test]
    fn structure_report_has_all_category_sheets_plus_summary() {
        let tmp = TempDir::new().expect("tmp");
        let root = tmp.path().join("arsip");
        fs::create_dir_all(root.join("02.DATA_ANGGOTA/0007/000042_ANI")).expect("mkdir");
        fs::write(
            root.join("02.DATA_ANGGOTA/0007/000042_ANI/01_KTP.pdf"),
            b"pdf",
        )
        .expect("write");

        let scan = scan_categories(&root, &NoProgress).expect("scan");
        let out = tmp.path().join("database.xlsx");
        write_structure_report(&out, &scan).expect("report");

        let workbook = open_workbook_auto(&out).expect("open");
        let names = workbook.sheet_names();
        assert_eq!(names.len(), 9);
        assert!(names.contains(&"02.DATA_ANGGOTA".to_string()));
        assert!(names.contains(&"Summary".to_string()));
    }

    #[test]
    fn index_store_is_replaced_atomically() {
        let tmp = TempDir::new().expect("tmp");
        let path = tmp.path().join("universal_scan.xlsx");
        let record = IndexRecord {
            file_path: PathBuf::from("/a/b/x.pdf"),
            status: "file".to_string(),
            size_mb: 1.5,
            last_modified: "2024-01-01 10:00:00".to_string(),
            scan_time: "2024-01-02 10:00:00".to_string(),
            relative_path: "b/x.pdf".to_string(),
            status_sync: "EXISTS".to_string(),
        };

        write_index_store(&path, &[record.clone()]).expect("store");
        write_index_store(&path, &[record]).expect("store again");
        assert!(path.exists());
        assert!(!path.with_extension("xlsx.tmp").exists());

        let mut workbook = open_workbook_auto(&path).expect("open");
        let range = workbook.worksheet_range("Universal_Scan_DB").expect("range");
        assert_eq!(range.get((1, 1)).unwrap().to_string(), "/a/b/x.pdf");
        assert_eq!(range.get((1, 7)).unwrap().to_string(), "EXISTS");
    }

    #[test]
    fn index_export_derives_name_directory_extension() {
        let tmp = TempDir::new().expect("tmp");
        let path = tmp.path().join("export.xlsx");
        let records = vec![
            IndexRecord {
                file_path: PathBuf::from("/a/b/x.pdf"),
                status: "file".to_string(),
                size_mb: 1.0,
                last_modified: String::new(),
                scan_time: String::new(),
                relative_path: "b/x.pdf".to_string(),
                status_sync: "EXISTS".to_string(),
            },
            IndexRecord {
                file_path: PathBuf::from("/a/b"),
                status: "folder".to_string(),
                size_mb: 1.0,
                last_modified: String::new(),
                scan_time: String::new(),
                relative_path: "b".to_string(),
                status_sync: "MISSING".to_string(),
            },
        ];
        write_index_export(&path, &records).expect("export");

        let mut workbook = open_workbook_auto(&path).expect("open");
        let range = workbook.worksheet_range("Database").expect("range");
        assert_eq!(range.get((0, 8)).unwrap().to_string(), "File_Name");
        assert_eq!(range.get((1, 8)).unwrap().to_string(), "x.pdf");
        assert_eq!(range.get((1, 10)).unwrap().to_string(), ".pdf");
        // Folder rows leave the extension empty.
        assert!(range
            .get((2, 10))
            .map(|c| c.to_string().is_empty())
            .unwrap_or(true));
    }
}
