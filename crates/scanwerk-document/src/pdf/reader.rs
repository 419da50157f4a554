// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF reader: loads PDFs returned by the gateway (or written locally) with
// `lopdf` to confirm they parse and to count their pages.

use lopdf::Document;
use scanwerk_core::error::{Result, ScanwerkError};
use tracing::{debug, instrument};

/// Parsed PDF document.
pub struct PdfReader {
    document: Document,
}

impl PdfReader {
    /// Parse PDF bytes held in memory.
    #[instrument(skip_all, fields(bytes_len = data.len()))]
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        if !data.starts_with(b"%PDF-") {
            return Err(ScanwerkError::PdfError("missing %PDF header".into()));
        }
        let document = Document::load_mem(data).map_err(|err| {
            ScanwerkError::PdfError(format!("failed to load PDF from memory: {}", err))
        })?;

        debug!(pages = document.get_pages().len(), "PDF loaded from bytes");
        Ok(Self { document })
    }

    /// Number of pages in the document.
    pub fn page_count(&self) -> usize {
        self.document.get_pages().len()
    }

    /// PDF version string from the header, e.g. `"1.7"`.
    pub fn version(&self) -> &str {
        &self.document.version
    }
}
