//! Category flatteners.
//!
//! Each of the eight standard categories has a fixed sub-tree contract
//! and a fixed column schema; the flatteners project the typed tree
//! into one [`FlatTable`] per category, one row per folder or file, in
//! walk order. A missing category becomes a single placeholder row so
//! the emitted workbook always carries all eight sheets.

use crate::domain::{
    CellValue, FlatTable, Node, FOLDER_MISSING, REPORT_DOC_PREFIXES,
};
use crate::scan::CategoryTree;

/// Flatten one category tree according to its schema.
pub fn flatten_category(tree: &CategoryTree) -> FlatTable {
    if !tree.exists {
        return placeholder(tree.name, FOLDER_MISSING, "Folder ini tidak ditemukan");
    }
    let table = match tree.name {
        "01.SURAT_MENYURAT" => flatten_surat_menyurat(&tree.items),
        "02.DATA_ANGGOTA" => flatten_data_anggota(&tree.items),
        "03.DATA_ANGGOTA_KELUAR" | "04.DATA_DANA_RESIKO" => {
            flatten_year_month_member(&tree.items)
        }
        "05.DATA_HARI_RAYA_ANGGOTA" => flatten_hari_raya(&tree.items),
        "06.LAPORAN_BULANAN" => flatten_laporan_bulanan(&tree.items),
        "07.BUKU_BANK" => flatten_buku_bank(&tree.items),
        "08.DATA_LWK" => flatten_data_lwk(&tree.items),
        other => {
            tracing::warn!("no flattener for category {other}");
            FlatTable::default()
        }
    };
    if table.is_empty() {
        placeholder(tree.name, "FOLDER KOSONG", "Tidak ada file atau subfolder")
    } else {
        table
    }
}

fn placeholder(name: &str, status: &str, note: &str) -> FlatTable {
    let mut table = FlatTable::new(["Status", "Nama", "Keterangan"]);
    table.push(vec![
        CellValue::text(status),
        CellValue::text(name),
        CellValue::text(note),
    ]);
    table
}

/// `TYPE` marker for a node.
fn type_of(node: &Node) -> CellValue {
    CellValue::text(if node.is_folder() { "FOLDER" } else { "FILE" })
}

/// `UKURAN_KB` for a node: kilobytes to two decimals for files, empty
/// for folder rows.
fn size_kb(node: &Node) -> CellValue {
    match node {
        Node::File { size_bytes, .. } => {
            CellValue::Number((*size_bytes as f64 / 1024.0 * 100.0).round() / 100.0)
        }
        Node::Folder { .. } => CellValue::Empty,
    }
}

fn path_cell(node: &Node) -> CellValue {
    CellValue::text(node.path().to_string_lossy())
}

/// `01.SURAT_MENYURAT`: kind → year → month → file.
fn flatten_surat_menyurat(items: &[Node]) -> FlatTable {
    let mut table = FlatTable::new([
        "JENIS_SURAT", "TAHUN", "BULAN", "NAMA_FILE", "TYPE", "UKURAN_KB", "PATH",
    ]);
    for kind in items {
        let Node::Folder { name: jenis, children, .. } = kind else {
            continue;
        };
        for year in children {
            match year {
                Node::Folder { name: tahun, children: months, .. } => {
                    for month in months {
                        match month {
                            Node::Folder { name: bulan, children: files, .. } => {
                                table.push(vec![
                                    CellValue::text(jenis),
                                    CellValue::text(tahun),
                                    CellValue::text(bulan),
                                    CellValue::Empty,
                                    CellValue::text("FOLDER"),
                                    CellValue::Empty,
                                    path_cell(month),
                                ]);
                                for file in files {
                                    table.push(vec![
                                        CellValue::text(jenis),
                                        CellValue::text(tahun),
                                        CellValue::text(bulan),
                                        CellValue::text(file.name()),
                                        type_of(file),
                                        size_kb(file),
                                        path_cell(file),
                                    ]);
                                }
                            }
                            file => {
                                // File directly inside the year folder.
                                table.push(vec![
                                    CellValue::text(jenis),
                                    CellValue::text(tahun),
                                    CellValue::Empty,
                                    CellValue::text(file.name()),
                                    type_of(file),
                                    size_kb(file),
                                    path_cell(file),
                                ]);
                            }
                        }
                    }
                }
                file => {
                    // File directly inside the kind folder.
                    table.push(vec![
                        CellValue::text(jenis),
                        CellValue::Empty,
                        CellValue::Empty,
                        CellValue::text(file.name()),
                        type_of(file),
                        size_kb(file),
                        path_cell(file),
                    ]);
                }
            }
        }
    }
    table
}

/// `02.DATA_ANGGOTA`: center → member → file. Digit-only center names
/// are zero-padded to four digits in the output.
fn flatten_data_anggota(items: &[Node]) -> FlatTable {
    let mut table = FlatTable::new([
        "NOMOR_CENTER", "ID_NAMA_ANGGOTA", "NAMA_FILE", "TYPE", "UKURAN_KB", "PATH",
    ]);
    for center in items {
        let center_code = {
            let name = center.name();
            if name.bytes().all(|b| b.is_ascii_digit()) {
                format!("{:0>4}", name)
            } else {
                name.to_string()
            }
        };
        match center {
            Node::Folder { children, .. } => {
                for member in children {
                    match member {
                        Node::Folder { name: member_name, children: files, .. } => {
                            table.push(vec![
                                CellValue::text(&center_code),
                                CellValue::text(member_name),
                                CellValue::Empty,
                                CellValue::text("FOLDER"),
                                CellValue::Empty,
                                path_cell(member),
                            ]);
                            for file in files {
                                table.push(vec![
                                    CellValue::text(&center_code),
                                    CellValue::text(member_name),
                                    CellValue::text(file.name()),
                                    type_of(file),
                                    size_kb(file),
                                    path_cell(file),
                                ]);
                            }
                        }
                        file => {
                            // File directly inside the center folder.
                            table.push(vec![
                                CellValue::text(&center_code),
                                CellValue::Empty,
                                CellValue::text(file.name()),
                                type_of(file),
                                size_kb(file),
                                path_cell(file),
                            ]);
                        }
                    }
                }
            }
            file => {
                table.push(vec![
                    CellValue::text(&center_code),
                    CellValue::Empty,
                    CellValue::text(file.name()),
                    type_of(file),
                    size_kb(file),
                    path_cell(file),
                ]);
            }
        }
    }
    table
}

/// `03.DATA_ANGGOTA_KELUAR` and `04.DATA_DANA_RESIKO` share one shape:
/// year → month → member → file.
fn flatten_year_month_member(items: &[Node]) -> FlatTable {
    let mut table = FlatTable::new([
        "TAHUN", "BULAN", "ID_NAMA_ANGGOTA", "NAMA_FILE", "TYPE", "UKURAN_KB", "PATH",
    ]);
    for year in items {
        let Node::Folder { name: tahun, children: months, .. } = year else {
            continue;
        };
        for month in months {
            match month {
                Node::Folder { name: bulan, children: members, .. } => {
                    table.push(vec![
                        CellValue::text(tahun),
                        CellValue::text(bulan),
                        CellValue::Empty,
                        CellValue::Empty,
                        CellValue::text("FOLDER"),
                        CellValue::Empty,
                        path_cell(month),
                    ]);
                    for member in members {
                        match member {
                            Node::Folder { name: member_name, children: files, .. } => {
                                table.push(vec![
                                    CellValue::text(tahun),
                                    CellValue::text(bulan),
                                    CellValue::text(member_name),
                                    CellValue::Empty,
                                    CellValue::text("FOLDER"),
                                    CellValue::Empty,
                                    path_cell(member),
                                ]);
                                for file in files {
                                    table.push(vec![
                                        CellValue::text(tahun),
                                        CellValue::text(bulan),
                                        CellValue::text(member_name),
                                        CellValue::text(file.name()),
                                        type_of(file),
                                        size_kb(file),
                                        path_cell(file),
                                    ]);
                                }
                            }
                            file => {
                                table.push(vec![
                                    CellValue::text(tahun),
                                    CellValue::text(bulan),
                                    CellValue::Empty,
                                    CellValue::text(file.name()),
                                    type_of(file),
                                    size_kb(file),
                                    path_cell(file),
                                ]);
                            }
                        }
                    }
                }
                file => {
                    table.push(vec![
                        CellValue::text(tahun),
                        CellValue::Empty,
                        CellValue::Empty,
                        CellValue::text(file.name()),
                        type_of(file),
                        size_kb(file),
                        path_cell(file),
                    ]);
                }
            }
        }
    }
    table
}

/// `05.DATA_HARI_RAYA_ANGGOTA`: year → monthly workbook files.
fn flatten_hari_raya(items: &[Node]) -> FlatTable {
    let mut table = FlatTable::new(["TAHUN", "NAMA_FILE", "TYPE", "UKURAN_KB", "PATH"]);
    for year in items {
        match year {
            Node::Folder { name: tahun, children, .. } => {
                for file in children {
                    table.push(vec![
                        CellValue::text(tahun),
                        CellValue::text(file.name()),
                        type_of(file),
                        size_kb(file),
                        path_cell(file),
                    ]);
                }
            }
            file => {
                table.push(vec![
                    CellValue::Empty,
                    CellValue::text(file.name()),
                    type_of(file),
                    size_kb(file),
                    path_cell(file),
                ]);
            }
        }
    }
    table
}

/// `06.LAPORAN_BULANAN`: year → month → report file; the document code
/// is recovered by substring match against the twelve known prefixes,
/// first match in declared order.
fn flatten_laporan_bulanan(items: &[Node]) -> FlatTable {
    let mut table = FlatTable::new([
        "TAHUN", "BULAN", "JENIS_DOKUMEN", "NAMA_FILE", "TYPE", "UKURAN_KB", "PATH",
    ]);
    for year in items {
        let Node::Folder { name: tahun, children: months, .. } = year else {
            continue;
        };
        for month in months {
            match month {
                Node::Folder { name: bulan, children: files, .. } => {
                    table.push(vec![
                        CellValue::text(tahun),
                        CellValue::text(bulan),
                        CellValue::Empty,
                        CellValue::Empty,
                        CellValue::text("FOLDER"),
                        CellValue::Empty,
                        path_cell(month),
                    ]);
                    for file in files {
                        table.push(vec![
                            CellValue::text(tahun),
                            CellValue::text(bulan),
                            match report_doc_code(file.name()) {
                                Some(code) => CellValue::text(code),
                                None => CellValue::Empty,
                            },
                            CellValue::text(file.name()),
                            type_of(file),
                            size_kb(file),
                            path_cell(file),
                        ]);
                    }
                }
                file => {
                    table.push(vec![
                        CellValue::text(tahun),
                        CellValue::Empty,
                        CellValue::Empty,
                        CellValue::text(file.name()),
                        type_of(file),
                        size_kb(file),
                        path_cell(file),
                    ]);
                }
            }
        }
    }
    table
}

/// First matching monthly-report prefix contained in `filename`.
pub fn report_doc_code(filename: &str) -> Option<&'static str> {
    let upper = filename.to_uppercase();
    REPORT_DOC_PREFIXES
        .iter()
        .find(|prefix| upper.contains(*prefix))
        .copied()
}

/// `07.BUKU_BANK`: year → monthly workbook; the month is encoded in
/// the filename before `_BUKUBANK`.
fn flatten_buku_bank(items: &[Node]) -> FlatTable {
    let mut table = FlatTable::new(["TAHUN", "BULAN", "NAMA_FILE", "TYPE", "UKURAN_KB", "PATH"]);
    for year in items {
        match year {
            Node::Folder { name: tahun, children, .. } => {
                for file in children {
                    let bulan = file
                        .name()
                        .split_once("_BUKUBANK")
                        .map(|(head, _)| head.to_string())
                        .unwrap_or_default();
                    table.push(vec![
                        CellValue::text(tahun),
                        if bulan.is_empty() {
                            CellValue::Empty
                        } else {
                            CellValue::Text(bulan)
                        },
                        CellValue::text(file.name()),
                        type_of(file),
                        size_kb(file),
                        path_cell(file),
                    ]);
                }
            }
            file => {
                table.push(vec![
                    CellValue::Empty,
                    CellValue::Empty,
                    CellValue::text(file.name()),
                    type_of(file),
                    size_kb(file),
                    path_cell(file),
                ]);
            }
        }
    }
    table
}

/// `08.DATA_LWK`: year → month → daily sheet `DD_CCCC.pdf`; the day is
/// the leading two digits, the center the four digits after `_`.
fn flatten_data_lwk(items: &[Node]) -> FlatTable {
    let mut table = FlatTable::new([
        "TAHUN", "BULAN", "TANGGAL", "NOMOR_CENTER", "NAMA_FILE", "TYPE", "UKURAN_KB", "PATH",
    ]);
    for year in items {
        let Node::Folder { name: tahun, children: months, .. } = year else {
            continue;
        };
        for month in months {
            match month {
                Node::Folder { name: bulan, children: files, .. } => {
                    table.push(vec![
                        CellValue::text(tahun),
                        CellValue::text(bulan),
                        CellValue::Empty,
                        CellValue::Empty,
                        CellValue::Empty,
                        CellValue::text("FOLDER"),
                        CellValue::Empty,
                        path_cell(month),
                    ]);
                    for file in files {
                        let (tanggal, center) = lwk_parts(file.name());
                        table.push(vec![
                            CellValue::text(tahun),
                            CellValue::text(bulan),
                            tanggal.map_or(CellValue::Empty, CellValue::text),
                            center.map_or(CellValue::Empty, CellValue::text),
                            CellValue::text(file.name()),
                            type_of(file),
                            size_kb(file),
                            path_cell(file),
                        ]);
                    }
                }
                file => {
                    table.push(vec![
                        CellValue::text(tahun),
                        CellValue::Empty,
                        CellValue::Empty,
                        CellValue::Empty,
                        CellValue::text(file.name()),
                        type_of(file),
                        size_kb(file),
                        path_cell(file),
                    ]);
                }
            }
        }
    }
    table
}

/// Split an LWK filename `DD_CCCC.<ext>` into its day and center.
fn lwk_parts(filename: &str) -> (Option<&str>, Option<&str>) {
    let mut parts = filename.splitn(2, '_');
    let head = parts.next().unwrap_or_default();
    let tanggal = (head.len() == 2 && head.bytes().all(|b| b.is_ascii_digit())).then_some(head);
    let center = parts
        .next()
        .map(|rest| rest.split('.').next().unwrap_or_default())
        .filter(|c| c.len() == 4 && c.bytes().all(|b| b.is_ascii_digit()));
    (tanggal, center)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::NoProgress;
    use crate::scan::scan_categories;
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    fn category(scan_root: &Path, name: &str) -> FlatTable {
        let scan = scan_categories(scan_root, &NoProgress).expect("scan");
        let tree = scan
            .categories
            .iter()
            .find(|c| c.name == name)
            .expect("category present");
        flatten_category(tree)
    }

    #[test]
    fn missing_category_yields_placeholder_row() {
        let tmp = TempDir::new().expect("tmp");
        let table = category(tmp.path(), "08.DATA_LWK");
        assert_eq!(table.headers, vec!["Status", "Nama", "Keterangan"]);
        assert_eq!(table.len(), 1);
        assert_eq!(table.rows[0][0], CellValue::text(FOLDER_MISSING));
    }

    #[test]
    fn surat_menyurat_schema_and_rows() {
        let tmp = TempDir::new().expect("tmp");
        let month = tmp
            .path()
            .join("01.SURAT_MENYURAT/02.SURAT_KELUAR/2024/01.JANUARI");
        fs::create_dir_all(&month).expect("mkdir");
        fs::write(month.join("001_PENGAJUAN_DANA.xlsm"), vec![0u8; 2048]).expect("write");

        let table = category(tmp.path(), "01.SURAT_MENYURAT");
        assert_eq!(
            table.headers,
            vec!["JENIS_SURAT", "TAHUN", "BULAN", "NAMA_FILE", "TYPE", "UKURAN_KB", "PATH"]
        );
        // Month folder row plus one file row.
        assert_eq!(table.len(), 2);
        let file_row = &table.rows[1];
        assert_eq!(file_row[0], CellValue::text("02.SURAT_KELUAR"));
        assert_eq!(file_row[1], CellValue::text("2024"));
        assert_eq!(file_row[2], CellValue::text("01.JANUARI"));
        assert_eq!(file_row[5], CellValue::Number(2.0));
    }

    #[test]
    fn data_anggota_zero_pads_center_codes() {
        let tmp = TempDir::new().expect("tmp");
        let member = tmp.path().join("02.DATA_ANGGOTA/7/000042_ANI");
        fs::create_dir_all(&member).expect("mkdir");
        fs::write(member.join("01_KTP.pdf"), b"pdf").expect("write");

        let table = category(tmp.path(), "02.DATA_ANGGOTA");
        assert_eq!(table.rows[0][0], CellValue::text("0007"));
        // Folder row then file row for the member.
        assert_eq!(table.rows[0][3], CellValue::text("FOLDER"));
        assert_eq!(table.rows[1][2], CellValue::text("01_KTP.pdf"));
    }

    #[test]
    fn laporan_bulanan_doc_code_first_match_wins() {
        assert_eq!(report_doc_code("01.NERACA_JAN.pdf"), Some("01.NERACA"));
        assert_eq!(
            report_doc_code("laporan 10.statistik_petugas_lapang.pdf"),
            Some("10.STATISTIK_PETUGAS_LAPANG")
        );
        // A name embedding two prefixes resolves to the earlier one.
        assert_eq!(
            report_doc_code("01.NERACA_10.STATISTIK_PETUGAS_LAPANG.pdf"),
            Some("01.NERACA")
        );
        assert_eq!(report_doc_code("lainnya.pdf"), None);
    }

    #[test]
    fn buku_bank_month_from_filename() {
        let tmp = TempDir::new().expect("tmp");
        let year = tmp.path().join("07.BUKU_BANK/2024");
        fs::create_dir_all(&year).expect("mkdir");
        fs::write(year.join("01.JANUARI_BUKUBANK.xlsx"), b"x").expect("write");
        fs::write(year.join("catatan.txt"), b"x").expect("write");

        let table = category(tmp.path(), "07.BUKU_BANK");
        assert_eq!(table.rows[0][1], CellValue::text("01.JANUARI"));
        assert_eq!(table.rows[1][1], CellValue::Empty);
    }

    #[test]
    fn data_lwk_extracts_day_and_center() {
        let tmp = TempDir::new().expect("tmp");
        let month = tmp.path().join("08.DATA_LWK/2024/03.MARET");
        fs::create_dir_all(&month).expect("mkdir");
        fs::write(month.join("15_0007.pdf"), b"x").expect("write");
        fs::write(month.join("catatan.pdf"), b"x").expect("write");

        let table = category(tmp.path(), "08.DATA_LWK");
        // Month folder row, then the two files in directory order.
        let day_row = table
            .rows
            .iter()
            .find(|r| r[4] == CellValue::text("15_0007.pdf"))
            .expect("lwk row");
        assert_eq!(day_row[2], CellValue::text("15"));
        assert_eq!(day_row[3], CellValue::text("0007"));
        let other_row = table
            .rows
            .iter()
            .find(|r| r[4] == CellValue::text("catatan.pdf"))
            .expect("other row");
        assert_eq!(other_row[2], CellValue::Empty);
        assert_eq!(other_row[3], CellValue::Empty);
    }

    #[test]
    fn empty_category_yields_kosong_placeholder() {
        let tmp = TempDir::new().expect("tmp");
        fs::create_dir_all(tmp.path().join("05.DATA_HARI_RAYA_ANGGOTA")).expect("mkdir");
        let table = category(tmp.path(), "05.DATA_HARI_RAYA_ANGGOTA");
        assert_eq!(table.len(), 1);
        assert_eq!(table.rows[0][0], CellValue::text("FOLDER KOSONG"));
    }
}
