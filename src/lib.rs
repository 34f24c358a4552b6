//! arsip-audit: audit an OwnCloud-synced member archive against the
//! authoritative membership workbook.
//!
//! The library walks the fixed eight-category folder layout, joins
//! scanned member folders with the membership spreadsheet on the
//! `center4_id6` composite key, extracts fields from funding-request
//! workbooks and family-card PDF scans, flags anomalous files, and
//! maintains a persistent universal index — emitting everything as
//! multi-sheet Excel workbooks.

pub mod anomaly;
pub mod classify;
pub mod cli;
pub mod config;
pub mod domain;
pub mod error;
pub mod extract;
pub mod flatten;
pub mod index;
pub mod membership;
pub mod paths;
pub mod progress;
pub mod reconcile;
pub mod render;
pub mod scan;

pub use error::{AuditError, Result};
