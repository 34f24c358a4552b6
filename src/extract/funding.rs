//! Funding-request workbook extraction.
//!
//! Request workbooks live under
//! `01.SURAT_MENYURAT/02.SURAT_KELUAR/<year>/<MM.MONTH>/` and are named
//! `<NNN>..._PENGAJUAN_DANA.xlsm`. Seven fixed cells across the three
//! sheets `Surat`, `Laporan`, `Lampiran` carry the fields operators
//! audit. A missing sheet nulls its fields without failing the others;
//! a cell beyond the sheet extent is null.

use crate::domain::{is_sync_artifact, CellValue, MONTHS};
use crate::error::{AuditError, Result};
use crate::progress::ProgressSink;
use calamine::{open_workbook_auto, Data, Range, Reader};
use chrono::{Datelike, Local};
use std::fs;
use std::path::{Path, PathBuf};

/// First year the cooperative archived funding requests.
const FIRST_ARCHIVE_YEAR: i32 = 2020;

/// One discovered request workbook.
#[derive(Debug, Clone)]
pub struct FundingRequest {
    pub year: i32,
    pub month_code: String,
    pub month_name: String,
    /// Three-digit document number taken from the filename prefix.
    pub document_no: String,
    pub file_name: String,
    pub path: PathBuf,
    /// Extracted cells; `None` until the analysis pass ran, `Some` with
    /// per-field nulls afterwards.
    pub fields: Option<FundingFields>,
    /// `"SUCCESS"` or an error description from the analysis pass.
    pub analysis_status: String,
}

/// The seven audited cells. Each is null when its sheet is missing or
/// the position lies outside the sheet extent.
#[derive(Debug, Clone, Default)]
pub struct FundingFields {
    /// `Surat` F8: document number as written inside the workbook.
    pub document_no: Option<CellValue>,
    /// `Surat` I8: requested amount.
    pub requested_amount: Option<CellValue>,
    /// `Laporan` A4: balance status, the substring after `:`.
    pub balance_status: Option<String>,
    /// `Laporan` F68: required amount.
    pub required_amount: Option<CellValue>,
    /// `Laporan` A83: branch manager name.
    pub branch_manager: Option<CellValue>,
    /// `Lampiran` C3: first disbursement date.
    pub first_disbursement: Option<CellValue>,
    /// `Lampiran` E3: last disbursement date.
    pub last_disbursement: Option<CellValue>,
}

/// Walk the outgoing-letter tree for request workbooks, years
/// `2020..=current+1`, skipping `~` lock files.
pub fn scan_funding_requests(root: &Path, progress: &dyn ProgressSink) -> Result<Vec<FundingRequest>> {
    let base = root.join("01.SURAT_MENYURAT").join("02.SURAT_KELUAR");
    if !base.is_dir() {
        return Err(AuditError::InvalidRoot(base));
    }

    progress.begin("Scanning funding requests", None);
    let mut requests = Vec::new();
    let current_year = Local::now().year();

    for year in FIRST_ARCHIVE_YEAR..=current_year + 1 {
        let year_dir = base.join(year.to_string());
        if !year_dir.is_dir() {
            continue;
        }
        for (month_code, month_name) in MONTHS {
            let month_dir = year_dir.join(format!("{month_code}.{month_name}"));
            if !month_dir.is_dir() {
                continue;
            }
            let entries = match fs::read_dir(&month_dir) {
                Ok(entries) => entries,
                Err(e) => {
                    tracing::warn!("cannot read {}: {e}", month_dir.display());
                    continue;
                }
            };
            let mut names: Vec<String> = entries
                .flatten()
                .filter(|e| e.file_type().map(|t| t.is_file()).unwrap_or(false))
                .map(|e| e.file_name().to_string_lossy().into_owned())
                .collect();
            names.sort();
            for name in names {
                if is_sync_artifact(&name) {
                    continue;
                }
                if !name.to_uppercase().ends_with("PENGAJUAN_DANA.XLSM") {
                    continue;
                }
                let document_no = name.get(..3).unwrap_or("???").to_string();
                progress.advance(&name);
                requests.push(FundingRequest {
                    year,
                    month_code: month_code.to_string(),
                    month_name: month_name.to_string(),
                    document_no,
                    path: month_dir.join(&name),
                    file_name: name,
                    fields: None,
                    analysis_status: String::new(),
                });
            }
        }
    }

    progress.finish();
    Ok(requests)
}

/// Read the seven audited cells from one request workbook.
pub fn extract_funding_fields(path: &Path) -> Result<FundingFields> {
    let mut workbook = open_workbook_auto(path).map_err(|source| AuditError::WorkbookRead {
        path: path.to_path_buf(),
        source,
    })?;

    let mut fields = FundingFields::default();

    match workbook.worksheet_range("Surat") {
        Ok(surat) => {
            fields.document_no = cell_at(&surat, 7, 5);
            fields.requested_amount = cell_at(&surat, 7, 8);
        }
        Err(e) => tracing::warn!("{}: sheet Surat unreadable: {e}", path.display()),
    }

    match workbook.worksheet_range("Laporan") {
        Ok(laporan) => {
            fields.balance_status = cell_at(&laporan, 3, 0)
                .map(|v| v.display())
                .and_then(|text| {
                    text.split_once(':')
                        .map(|(_, status)| status.trim().to_string())
                });
            fields.required_amount = cell_at(&laporan, 67, 5);
            fields.branch_manager = cell_at(&laporan, 82, 0);
        }
        Err(e) => tracing::warn!("{}: sheet Laporan unreadable: {e}", path.display()),
    }

    match workbook.worksheet_range("Lampiran") {
        Ok(lampiran) => {
            fields.first_disbursement = cell_at(&lampiran, 2, 2);
            fields.last_disbursement = cell_at(&lampiran, 2, 4);
        }
        Err(e) => tracing::warn!("{}: sheet Lampiran unreadable: {e}", path.display()),
    }

    Ok(fields)
}

/// Analyze every discovered request in place, recording per-file
/// success or failure without aborting the batch.
pub fn analyze_requests(requests: &mut [FundingRequest], progress: &dyn ProgressSink) {
    progress.begin("Extracting workbook fields", Some(requests.len() as u64));
    for request in requests.iter_mut() {
        match extract_funding_fields(&request.path) {
            Ok(fields) => {
                request.fields = Some(fields);
                request.analysis_status = "SUCCESS".to_string();
            }
            Err(e) => {
                request.fields = Some(FundingFields::default());
                request.analysis_status = format!("ERROR: {e}");
            }
        }
        progress.advance(&request.file_name);
    }
    progress.finish();
}

/// Fetch a cell at a fixed 0-based absolute position; out-of-bounds
/// and empty cells are both null.
fn cell_at(range: &Range<Data>, row: u32, col: u32) -> Option<CellValue> {
    let value = range.get_value((row, col)).map(CellValue::from)?;
    if value.is_empty() {
        None
    } else {
        Some(value)
    }
}
