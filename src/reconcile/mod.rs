//! Reconciliation: join member-level scan facts against the membership
//! table on the composite key `center4_id6`.
//!
//! The join is an inner join with first-wins resolution of scan-side
//! duplicate keys (losers become diagnostics, never extra rows). Rows
//! whose key has an empty half are excluded from the join and reported
//! separately, so the partition law
//! `|matched| + |not_archived| = |membership rows with a valid key|`
//! holds exactly.

use crate::classify::{composite_key, normalize_cell, normalize_center, normalize_member};
use crate::domain::{CellValue, FlatTable, MemberScanRow, ABSENT, PRESENT};
use crate::membership::Membership;
use crate::scan::MemberScan;
use std::collections::HashMap;

/// The four logical tables plus diagnostics.
#[derive(Debug)]
pub struct Reconciliation {
    /// Cleaned membership table, unchanged (`databaseanggota`).
    pub membership: FlatTable,
    /// Member-level scan facts with presence vectors (`hasilscan`).
    pub scan: FlatTable,
    /// Inner join, scan walk order (`datamatching`).
    pub matched: FlatTable,
    /// Membership rows never seen on disk, membership order
    /// (`belumdiarsip`).
    pub not_archived: FlatTable,
    pub stats: ReconcileStats,
}

#[derive(Debug, Default, Clone)]
pub struct ReconcileStats {
    pub membership_rows: usize,
    pub membership_rows_with_key: usize,
    /// Membership rows dropped for an unparseable key half.
    pub membership_rows_without_key: usize,
    pub scan_rows: usize,
    pub matched_rows: usize,
    pub not_archived_rows: usize,
    /// Scan rows discarded by first-wins duplicate resolution, as
    /// `(composite key, folder name)`.
    pub duplicate_scan: Vec<(String, String)>,
}

/// Build the `hasilscan` table: one row per member folder, the twelve
/// slot columns rendered as `ADA`/`TIDAK ADA`.
pub fn scan_table(members: &[MemberScanRow]) -> FlatTable {
    let mut headers: Vec<String> = vec![
        "center".into(),
        "anggota_folder".into(),
        "id_anggota".into(),
        "nama".into(),
        "file_ditemukan".into(),
    ];
    for slot in 1..=12 {
        headers.push(format!("file_{slot:02}"));
    }

    let mut table = FlatTable::new(headers);
    for member in members {
        let mut row = vec![
            CellValue::text(&member.center),
            CellValue::text(&member.folder_name),
            CellValue::text(&member.member_id),
            CellValue::text(&member.member_name),
            CellValue::Number(member.files_found as f64),
        ];
        for present in member.slots {
            row.push(CellValue::text(if present { PRESENT } else { ABSENT }));
        }
        table.push(row);
    }
    table
}

/// Run the reconciliation.
pub fn reconcile(membership: &Membership, scan: &MemberScan) -> Reconciliation {
    let scan_facts = scan_table(&scan.members);
    let mut stats = ReconcileStats {
        membership_rows: membership.table.len(),
        scan_rows: scan_facts.len(),
        ..Default::default()
    };

    // Scan side: composite key per row, first occurrence wins.
    let mut scan_by_key: HashMap<String, usize> = HashMap::new();
    let mut scan_keys: Vec<Option<String>> = Vec::with_capacity(scan.members.len());
    for (idx, member) in scan.members.iter().enumerate() {
        let key = composite_key(
            &normalize_center(&member.center),
            &normalize_member(&member.member_id),
        );
        if let Some(key) = &key {
            if scan_by_key.contains_key(key) {
                stats
                    .duplicate_scan
                    .push((key.clone(), member.folder_name.clone()));
                scan_keys.push(None);
                continue;
            }
            scan_by_key.insert(key.clone(), idx);
        }
        scan_keys.push(key);
    }

    // Membership side: key per row; rows without a key leave the join.
    let mut db_keys: Vec<Option<String>> = Vec::with_capacity(membership.table.len());
    for row in &membership.table.rows {
        let center = membership
            .center_col
            .map(|col| normalize_cell(&row[col], 4))
            .unwrap_or_default();
        let id = normalize_cell(&row[membership.id_col], 6);
        let key = composite_key(&center, &id);
        if key.is_some() {
            stats.membership_rows_with_key += 1;
        } else {
            stats.membership_rows_without_key += 1;
        }
        db_keys.push(key);
    }

    let mut db_by_key: HashMap<&str, Vec<usize>> = HashMap::new();
    for (idx, key) in db_keys.iter().enumerate() {
        if let Some(key) = key {
            db_by_key.entry(key.as_str()).or_default().push(idx);
        }
    }

    // Matched: scan walk order, each winning scan row joined against
    // every membership row sharing its key.
    let matched_headers = suffixed_headers(&scan_facts.headers, &membership.table.headers);
    let mut matched = FlatTable::new(matched_headers);
    let mut matched_db_rows: Vec<bool> = vec![false; membership.table.len()];
    for (scan_idx, key) in scan_keys.iter().enumerate() {
        let Some(key) = key else { continue };
        let Some(db_rows) = db_by_key.get(key.as_str()) else {
            continue;
        };
        for &db_idx in db_rows {
            matched_db_rows[db_idx] = true;
            let mut row = scan_facts.rows[scan_idx].clone();
            row.extend(membership.table.rows[db_idx].iter().cloned());
            matched.push(row);
        }
    }

    // Not archived: membership order, valid key, never matched.
    let mut not_archived = FlatTable::new(membership.table.headers.clone());
    for (db_idx, key) in db_keys.iter().enumerate() {
        if key.is_some() && !matched_db_rows[db_idx] {
            not_archived.push(membership.table.rows[db_idx].clone());
        }
    }

    stats.matched_rows = matched.len();
    stats.not_archived_rows = not_archived.len();
    debug_assert_eq!(
        stats.matched_rows + stats.not_archived_rows,
        stats.membership_rows_with_key
    );

    Reconciliation {
        membership: membership.table.clone(),
        scan: scan_facts,
        matched,
        not_archived,
        stats,
    }
}

/// Combined header list for the matched table. Only names present on
/// both sides get the `_scan`/`_db` suffix.
fn suffixed_headers(scan: &[String], db: &[String]) -> Vec<String> {
    let mut headers = Vec::with_capacity(scan.len() + db.len());
    for name in scan {
        if db.contains(name) {
            headers.push(format!("{name}_scan"));
        } else {
            headers.push(name.clone());
        }
    }
    for name in db {
        if scan.contains(name) {
            headers.push(format!("{name}_db"));
        } else {
            headers.push(name.clone());
        }
    }
    headers
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::SlotVector;
    use std::path::PathBuf;

    fn member(center: &str, id: &str, name: &str, slots: SlotVector) -> MemberScanRow {
        MemberScanRow {
            center: center.into(),
            folder_name: format!("{id}_{name}"),
            member_id: id.into(),
            member_name: name.into(),
            path: PathBuf::from("/scan"),
            files_found: slots.iter().filter(|s| **s).count(),
            slots,
        }
    }

    fn membership_of(rows: Vec<Vec<CellValue>>) -> Membership {
        let mut table = FlatTable::new(["Center", "Sort_ID", "Nama"]);
        for row in rows {
            table.push(row);
        }
        Membership {
            table,
            center_col: Some(0),
            id_col: 1,
        }
    }

    fn scan_of(members: Vec<MemberScanRow>) -> MemberScan {
        MemberScan {
            members,
            invalid_folders: Vec::new(),
            centers: Vec::new(),
        }
    }

    #[test]
    fn exact_match_with_numeric_coercion() {
        // Center stored as float 7.0, Sort_ID as 42; folders 0007/000042.
        let membership = membership_of(vec![vec![
            CellValue::Number(7.0),
            CellValue::Number(42.0),
            CellValue::text("ANI"),
        ]]);
        let scan = scan_of(vec![member("0007", "000042", "ANI", [true; 12])]);

        let result = reconcile(&membership, &scan);
        assert_eq!(result.matched.len(), 1);
        assert_eq!(result.not_archived.len(), 0);
        // All twelve slots present.
        let row = &result.matched.rows[0];
        for slot in 0..12 {
            assert_eq!(row[5 + slot], CellValue::text(PRESENT));
        }
    }

    #[test]
    fn missing_slot_keeps_row_matched() {
        let membership = membership_of(vec![vec![
            CellValue::Number(7.0),
            CellValue::Number(42.0),
            CellValue::text("ANI"),
        ]]);
        let mut slots = [true; 12];
        slots[4] = false;
        let scan = scan_of(vec![member("0007", "000042", "ANI", slots)]);

        let result = reconcile(&membership, &scan);
        assert_eq!(result.matched.len(), 1);
        let row = &result.matched.rows[0];
        assert_eq!(row[5 + 4], CellValue::text(ABSENT));
        assert_eq!(row[5 + 3], CellValue::text(PRESENT));
    }

    #[test]
    fn unarchived_member_lands_in_not_archived() {
        let membership = membership_of(vec![vec![
            CellValue::Number(7.0),
            CellValue::Number(99.0),
            CellValue::text("CITRA"),
        ]]);
        let scan = scan_of(vec![]);

        let result = reconcile(&membership, &scan);
        assert_eq!(result.matched.len(), 0);
        assert_eq!(result.not_archived.len(), 1);
        assert_eq!(result.not_archived.rows[0][2], CellValue::text("CITRA"));
    }

    #[test]
    fn partition_law_holds_with_invalid_keys() {
        let membership = membership_of(vec![
            vec![
                CellValue::Number(7.0),
                CellValue::Number(42.0),
                CellValue::text("ANI"),
            ],
            vec![
                CellValue::text("pusat"), // unparseable center
                CellValue::Number(50.0),
                CellValue::text("DODI"),
            ],
            vec![
                CellValue::Number(7.0),
                CellValue::Number(99.0),
                CellValue::text("CITRA"),
            ],
        ]);
        let scan = scan_of(vec![member("0007", "000042", "ANI", [true; 12])]);

        let result = reconcile(&membership, &scan);
        assert_eq!(result.stats.membership_rows_with_key, 2);
        assert_eq!(result.stats.membership_rows_without_key, 1);
        assert_eq!(
            result.stats.matched_rows + result.stats.not_archived_rows,
            result.stats.membership_rows_with_key
        );
    }

    #[test]
    fn duplicate_scan_keys_first_wins() {
        let membership = membership_of(vec![vec![
            CellValue::Number(7.0),
            CellValue::Number(42.0),
            CellValue::text("ANI"),
        ]]);
        let scan = scan_of(vec![
            member("0007", "000042", "ANI", [true; 12]),
            member("0007", "000042", "ANI_DUPLIKAT", [false; 12]),
        ]);

        let result = reconcile(&membership, &scan);
        assert_eq!(result.matched.len(), 1);
        // The winning row is the first in walk order.
        assert_eq!(result.matched.rows[0][1], CellValue::text("000042_ANI"));
        assert_eq!(result.stats.duplicate_scan.len(), 1);
        assert_eq!(result.stats.duplicate_scan[0].1, "000042_ANI_DUPLIKAT");
    }

    #[test]
    fn matched_headers_carry_suffixes_only_on_collision() {
        let headers = suffixed_headers(
            &["center".into(), "nama".into()],
            &["Center".into(), "nama".into()],
        );
        assert_eq!(headers, vec!["center", "nama_scan", "Center", "nama_db"]);
    }

    #[test]
    fn scan_table_renders_presence_markers() {
        let mut slots = [false; 12];
        slots[0] = true;
        let table = scan_table(&[member("0007", "000042", "ANI", slots)]);
        assert_eq!(table.headers[5], "file_01");
        assert_eq!(table.rows[0][5], CellValue::text(PRESENT));
        assert_eq!(table.rows[0][6], CellValue::text(ABSENT));
    }
}
