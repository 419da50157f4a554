// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Result export: turns extracted text and tables into downloadable files:
// plain text, Word-compatible HTML, BOM-prefixed CSV, and paginated PDF.

pub mod csv_export;
pub mod text;

use std::path::Path;

use scanwerk_core::error::Result;
use scanwerk_core::types::ExtractedText;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use crate::fonts::FontFile;
use crate::pdf::PdfWriter;

pub use csv_export::{UTF8_BOM, export_csv_tables, export_csv_text};
pub use text::{export_text, export_word_html};

/// Downloadable artifact formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExportFormat {
    Text,
    /// HTML payload saved with a `.doc` extension.
    WordHtml,
    Csv,
    Pdf,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Text => "txt",
            Self::WordHtml => "doc",
            Self::Csv => "csv",
            Self::Pdf => "pdf",
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            Self::Text => "text/plain;charset=utf-8",
            Self::WordHtml => "application/msword",
            Self::Csv => "text/csv;charset=utf-8",
            Self::Pdf => "application/pdf",
        }
    }

    /// `stem.ext`
    pub fn file_name(&self, stem: &str) -> String {
        format!("{stem}.{}", self.extension())
    }
}

/// Render `result` in `format`.
///
/// CSV contains the detected tables when there are any, otherwise the text
/// one line per row. PDFs embed `pdf_font` when given and fall back to
/// Helvetica otherwise.
#[instrument(skip(result, pdf_font), fields(text_len = result.text.len(), tables = result.tables.len()))]
pub fn render_export(
    format: ExportFormat,
    title: &str,
    result: &ExtractedText,
    pdf_font: Option<&FontFile>,
) -> Result<Vec<u8>> {
    match format {
        ExportFormat::Text => Ok(export_text(&result.text)),
        ExportFormat::WordHtml => Ok(export_word_html(title, &result.text)),
        ExportFormat::Csv => {
            let tables: Vec<_> = result.tables.iter().filter(|t| !t.is_empty()).cloned().collect();
            if tables.is_empty() {
                export_csv_text(&result.text)
            } else {
                export_csv_tables(&tables)
            }
        }
        ExportFormat::Pdf => {
            let writer = PdfWriter::a4().with_title(title);
            match pdf_font {
                Some(font) => writer.with_font(font.clone()),
                None => writer,
            }
            .create_from_text(&result.text)
        }
    }
}

/// Write an export to disk.
pub fn write_export(path: &Path, bytes: &[u8]) -> Result<()> {
    std::fs::write(path, bytes)?;
    info!(path = %path.display(), bytes = bytes.len(), "export written");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pdf::PdfReader;
    use scanwerk_core::types::Table;

    fn result() -> ExtractedText {
        ExtractedText {
            text: "Line one\nLine two".into(),
            confidence: 93.5,
            pages: 1,
            tables: Vec::new(),
        }
    }

    #[test]
    fn file_names_use_format_extension() {
        assert_eq!(ExportFormat::WordHtml.file_name("scan"), "scan.doc");
        assert_eq!(ExportFormat::Csv.file_name("scan"), "scan.csv");
    }

    #[test]
    fn csv_prefers_tables() {
        let mut r = result();
        r.tables.push(Table::new(vec![vec!["a".into(), "b".into()]]));
        let out = render_export(ExportFormat::Csv, "scan", &r, None).unwrap();
        assert_eq!(&out[UTF8_BOM.len()..], b"a,b\n");
    }

    #[test]
    fn csv_falls_back_to_text() {
        let out = render_export(ExportFormat::Csv, "scan", &result(), None).unwrap();
        assert_eq!(&out[UTF8_BOM.len()..], b"Line one\nLine two\n");
    }

    #[test]
    fn pdf_export_parses() {
        let out = render_export(ExportFormat::Pdf, "scan", &result(), None).unwrap();
        assert_eq!(PdfReader::from_bytes(&out).unwrap().page_count(), 1);
    }

    #[test]
    fn write_export_to_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(ExportFormat::Text.file_name("scan"));
        let bytes = render_export(ExportFormat::Text, "scan", &result(), None).unwrap();
        write_export(&path, &bytes).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "Line one\nLine two");
    }
}
