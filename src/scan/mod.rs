//! Archive traversal: typed category trees and member-level scans.

pub mod member;
pub mod walker;

pub use member::{scan_members, MemberScan};
pub use walker::{
    check_standard_folders, folder_census, scan_categories, CategoryScan, CategoryTree,
    FolderCensus, StandardFolderReport,
};
