//! Low-level worksheet building shared by every report.

use crate::domain::{CellValue, FlatTable};
use crate::error::{AuditError, Result};
use rust_xlsxwriter::{Color, Format, FormatUnderline, Url, Workbook, Worksheet};
use std::path::Path;

/// Hyperlink styling applied to `PATH` columns.
fn hyperlink_format() -> Format {
    Format::new()
        .set_font_color(Color::RGB(0x0563C1))
        .set_underline(FormatUnderline::Single)
}

fn header_format() -> Format {
    Format::new().set_bold()
}

/// Excel caps sheet names at 31 characters.
pub fn sheet_name(name: &str) -> String {
    name.chars().take(31).collect()
}

/// Append a sheet rendering `table`. Cells in a column headed `PATH`
/// become file-URI hyperlinks.
pub fn add_table_sheet(workbook: &mut Workbook, name: &str, table: &FlatTable) -> Result<()> {
    let sheet = workbook.add_worksheet();
    sheet
        .set_name(sheet_name(name))
        .map_err(|source| workbook_error(name, source))?;
    write_table(sheet, table).map_err(|source| workbook_error(name, source))?;
    Ok(())
}

fn write_table(sheet: &mut Worksheet, table: &FlatTable) -> std::result::Result<(), rust_xlsxwriter::XlsxError> {
    let bold = header_format();
    for (col, header) in table.headers.iter().enumerate() {
        sheet.write_string_with_format(0, col as u16, header, &bold)?;
    }

    let path_col = table.column("PATH");
    let link = hyperlink_format();
    for (row_idx, row) in table.rows.iter().enumerate() {
        let row_num = row_idx as u32 + 1;
        for (col_idx, value) in row.iter().enumerate() {
            let col_num = col_idx as u16;
            if Some(col_idx) == path_col {
                if let CellValue::Text(path) = value {
                    if !path.is_empty() {
                        let url = Url::new(file_uri(path)).set_text(path);
                        sheet.write_url_with_format(row_num, col_num, url, &link)?;
                        continue;
                    }
                }
            }
            write_cell(sheet, row_num, col_num, value)?;
        }
    }

    // Widen columns to roughly fit their content, capped like the
    // operators expect.
    for (col, header) in table.headers.iter().enumerate() {
        let mut width = header.len();
        for row in &table.rows {
            width = width.max(row[col].display().len());
        }
        sheet.set_column_width(col as u16, (width.min(48) + 2) as f64)?;
    }
    Ok(())
}

fn write_cell(
    sheet: &mut Worksheet,
    row: u32,
    col: u16,
    value: &CellValue,
) -> std::result::Result<(), rust_xlsxwriter::XlsxError> {
    match value {
        CellValue::Empty => Ok(()),
        CellValue::Text(s) => sheet.write_string(row, col, s).map(|_| ()),
        CellValue::Number(n) => sheet.write_number(row, col, *n).map(|_| ()),
        CellValue::Bool(b) => sheet.write_boolean(row, col, *b).map(|_| ()),
    }
}

/// Build a `file:` URI from a native path string.
pub fn file_uri(path: &str) -> String {
    let forward = path.replace('\\', "/");
    if forward.starts_with('/') {
        format!("file://{forward}")
    } else {
        format!("file:///{forward}")
    }
}

/// Append a two-column `Summary` sheet from label/value pairs.
pub fn add_summary_sheet(
    workbook: &mut Workbook,
    rows: &[(String, CellValue)],
) -> Result<()> {
    let mut table = FlatTable::new(["Informasi", "Value"]);
    for (label, value) in rows {
        table.push(vec![CellValue::text(label), value.clone()]);
    }
    add_table_sheet(workbook, "Summary", &table)
}

/// Save a workbook, mapping the writer error onto the audit error.
pub fn save_workbook(workbook: &mut Workbook, path: &Path) -> Result<()> {
    workbook
        .save(path)
        .map_err(|source| AuditError::WorkbookWrite {
            path: path.to_path_buf(),
            source,
        })
}

fn workbook_error(context: &str, source: rust_xlsxwriter::XlsxError) -> AuditError {
    AuditError::WorkbookWrite {
        path: Path::new(context).to_path_buf(),
        source,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sheet_names_are_capped_at_31_chars() {
        let long = "05.DATA_HARI_RAYA_ANGGOTA_DAN_LAIN_LAIN";
        assert_eq!(sheet_name(long).chars().count(), 31);
        assert_eq!(sheet_name("Summary"), "Summary");
    }

    #[test]
    fn file_uri_handles_both_path_styles() {
        assert_eq!(file_uri("/data/arsip/x.pdf"), "file:///data/arsip/x.pdf");
        assert_eq!(
            file_uri("C:\\Arsip\\x.pdf"),
            "file:///C:/Arsip/x.pdf"
        );
    }

    #[test]
    fn table_sheet_round_trips_through_calamine() {
        use calamine::{open_workbook_auto, Reader};
        let tmp = tempfile::TempDir::new().expect("tmp");
        let path = tmp.path().join("out.xlsx");

        let mut table = FlatTable::new(["NAMA_FILE", "UKURAN_KB", "PATH"]);
        table.push(vec![
            CellValue::text("01_KTP.pdf"),
            CellValue::Number(2.5),
            CellValue::text("/arsip/01_KTP.pdf"),
        ]);

        let mut workbook = rust_xlsxwriter::Workbook::new();
        add_table_sheet(&mut workbook, "data", &table).expect("sheet");
        save_workbook(&mut workbook, &path).expect("save");

        let mut read = open_workbook_auto(&path).expect("open");
        let range = read.worksheet_range("data").expect("range");
        assert_eq!(range.get((0, 0)).unwrap().to_string(), "NAMA_FILE");
        assert_eq!(range.get((1, 1)).unwrap().to_string(), "2.5");
        // The hyperlink cell keeps the raw path as its display text.
        assert_eq!(range.get((1, 2)).unwrap().to_string(), "/arsip/01_KTP.pdf");
    }
}
