//! arsip-audit: audit an OwnCloud-synced member archive against the
//! membership workbook and emit reconciled Excel reports.

use anyhow::Result;

fn main() -> Result<()> {
    arsip_audit::cli::run()
}
