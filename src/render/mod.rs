//! Workbook rendering: flat tables to styled multi-sheet Excel output.

pub mod reports;
pub mod workbook;

pub use reports::{
    write_anomaly_report, write_census_report, write_family_card_report, write_funding_report,
    write_index_export, write_index_store, write_reconciliation_workbook, write_structure_report,
};
pub use workbook::{add_summary_sheet, add_table_sheet};
