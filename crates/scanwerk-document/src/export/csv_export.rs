// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// CSV export for extracted text and detected tables. Output is UTF-8 with a
// byte-order mark so spreadsheet applications pick the right encoding.

use scanwerk_core::error::{Result, ScanwerkError};
use scanwerk_core::types::Table;
use tracing::{debug, instrument};

/// UTF-8 byte-order mark.
pub const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

fn csv_error(err: impl std::fmt::Display) -> ScanwerkError {
    ScanwerkError::Export(format!("CSV serialization failed: {err}"))
}

/// One row per line of text, single column.
#[instrument(skip(text), fields(text_len = text.len()))]
pub fn export_csv_text(text: &str) -> Result<Vec<u8>> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_writer(UTF8_BOM.to_vec());

    for line in text.lines() {
        writer.write_record([line]).map_err(csv_error)?;
    }
    writer.into_inner().map_err(csv_error)
}

/// Tables one after another, separated by an empty row.
///
/// Rows may have different lengths; each is written as-is.
#[instrument(skip(tables), fields(tables = tables.len()))]
pub fn export_csv_tables(tables: &[Table]) -> Result<Vec<u8>> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_writer(UTF8_BOM.to_vec());

    for (i, table) in tables.iter().enumerate() {
        if i > 0 {
            writer.write_record([""]).map_err(csv_error)?;
        }
        for row in &table.rows {
            writer.write_record(row).map_err(csv_error)?;
        }
        debug!(table = i, rows = table.rows.len(), "table written");
    }
    writer.into_inner().map_err(csv_error)
}
