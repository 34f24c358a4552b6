//! Membership workbook reader.
//!
//! The authoritative spreadsheet has a fixed window: the header sits on
//! the third row (0-based row 2), data occupies columns B through Y,
//! and the two decoration rows below the header (0-based rows 3 and 4)
//! are skipped. All-empty rows are dropped and row numbering restarts
//! from zero. Loading an empty window is fatal.

use crate::domain::{CellValue, FlatTable};
use crate::error::{AuditError, Result};
use calamine::{open_workbook_auto, Reader};
use std::path::Path;

/// 0-based row carrying the column headers.
const HEADER_ROW: usize = 2;
/// 0-based first data row (two decoration rows follow the header).
const FIRST_DATA_ROW: usize = 5;
/// 0-based column window: B through Y inclusive.
const FIRST_COL: usize = 1;
const LAST_COL: usize = 24;

/// Cleaned membership table plus the indexes reconciliation joins on.
#[derive(Debug, Clone)]
pub struct Membership {
    pub table: FlatTable,
    /// Column index of `Center`, when present.
    pub center_col: Option<usize>,
    /// Column index of the member identifier: `Sort_ID`, else `No`,
    /// else the first column of the window.
    pub id_col: usize,
}

/// Load the first worksheet of the membership workbook through the
/// fixed window.
pub fn load_membership(path: &Path) -> Result<Membership> {
    let mut workbook = open_workbook_auto(path).map_err(|source| AuditError::WorkbookRead {
        path: path.to_path_buf(),
        source,
    })?;

    let sheet_name = workbook
        .sheet_names()
        .first()
        .cloned()
        .ok_or_else(|| AuditError::SheetMissing {
            path: path.to_path_buf(),
            sheet: "(first sheet)".to_string(),
        })?;
    let range = workbook
        .worksheet_range(&sheet_name)
        .map_err(|source| AuditError::WorkbookRead {
            path: path.to_path_buf(),
            source: source.into(),
        })?;

    // Positions here are absolute sheet coordinates; the used range
    // rarely starts at A1.
    let cell = |row: usize, col: usize| -> CellValue {
        range
            .get_value((row as u32, col as u32))
            .map(CellValue::from)
            .unwrap_or(CellValue::Empty)
    };

    // Header names for the window; blank headers keep a positional name
    // so column counts stay stable.
    let mut headers = Vec::with_capacity(LAST_COL - FIRST_COL + 1);
    for col in FIRST_COL..=LAST_COL {
        let name = cell(HEADER_ROW, col).display();
        if name.is_empty() {
            headers.push(format!("Kolom_{}", col + 1));
        } else {
            headers.push(name);
        }
    }

    let mut table = FlatTable::new(headers);
    let last_row = range.end().map_or(0, |(row, _)| row as usize);
    for row in FIRST_DATA_ROW..=last_row {
        let values: Vec<CellValue> = (FIRST_COL..=LAST_COL).map(|col| cell(row, col)).collect();
        if values.iter().all(CellValue::is_empty) {
            continue;
        }
        table.push(values);
    }

    if table.is_empty() {
        return Err(AuditError::EmptyMembership(path.to_path_buf()));
    }

    let center_col = table.column("Center");
    let id_col = table
        .column("Sort_ID")
        .or_else(|| table.column("No"))
        .unwrap_or(0);

    Ok(Membership {
        table,
        center_col,
        id_col,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_xlsxwriter::Workbook;
    use tempfile::TempDir;

    /// Write a workbook matching the fixed membership window: headers
    /// on row index 2 from column B, data from row index 5.
    fn write_membership(path: &Path, rows: &[(f64, f64, &str)]) {
        let mut workbook = Workbook::new();
        let sheet = workbook.add_worksheet();
        sheet.write_string(2, 1, "Center").unwrap();
        sheet.write_string(2, 2, "Sort_ID").unwrap();
        sheet.write_string(2, 3, "Nama").unwrap();
        for (i, (center, id, name)) in rows.iter().enumerate() {
            let row = 5 + i as u32;
            sheet.write_number(row, 1, *center).unwrap();
            sheet.write_number(row, 2, *id).unwrap();
            sheet.write_string(row, 3, *name).unwrap();
        }
        workbook.save(path).unwrap();
    }

    #[test]
    fn loads_window_and_finds_key_columns() {
        let tmp = TempDir::new().expect("tmp");
        let path = tmp.path().join("anggota.xlsx");
        write_membership(&path, &[(7.0, 42.0, "ANI"), (7.0, 99.0, "BUDI")]);

        let membership = load_membership(&path).expect("load");
        assert_eq!(membership.table.len(), 2);
        assert_eq!(membership.table.headers[0], "Center");
        assert_eq!(membership.center_col, Some(0));
        assert_eq!(membership.id_col, 1);
        assert_eq!(membership.table.rows[0][2], CellValue::text("ANI"));
    }

    #[test]
    fn empty_window_is_fatal() {
        let tmp = TempDir::new().expect("tmp");
        let path = tmp.path().join("kosong.xlsx");
        write_membership(&path, &[]);

        let err = load_membership(&path).unwrap_err();
        assert!(matches!(err, AuditError::EmptyMembership(_)));
    }

    #[test]
    fn all_empty_rows_are_dropped() {
        let tmp = TempDir::new().expect("tmp");
        let path = tmp.path().join("anggota.xlsx");
        let mut workbook = Workbook::new();
        let sheet = workbook.add_worksheet();
        sheet.write_string(2, 1, "Center").unwrap();
        sheet.write_string(2, 2, "Sort_ID").unwrap();
        sheet.write_number(5, 1, 7.0).unwrap();
        sheet.write_number(5, 2, 42.0).unwrap();
        // Row 6 left entirely blank, row 7 carries data again.
        sheet.write_number(7, 1, 7.0).unwrap();
        sheet.write_number(7, 2, 99.0).unwrap();
        workbook.save(&path).unwrap();

        let membership = load_membership(&path).expect("load");
        assert_eq!(membership.table.len(), 2);
    }

    #[test]
    fn id_column_falls_back_to_first_window_column() {
        let tmp = TempDir::new().expect("tmp");
        let path = tmp.path().join("anggota.xlsx");
        let mut workbook = Workbook::new();
        let sheet = workbook.add_worksheet();
        sheet.write_string(2, 1, "Anggota").unwrap();
        sheet.write_number(5, 1, 42.0).unwrap();
        workbook.save(&path).unwrap();

        let membership = load_membership(&path).expect("load");
        assert_eq!(membership.center_col, None);
        assert_eq!(membership.id_col, 0);
    }
}
