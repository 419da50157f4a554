// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// scanwerk-document: Page processing for the Scanwerk scanning client.
//
// Provides capture validation, the page editor (rotation, crop, text and
// highlight annotations, compositing), upload compression, local PDF
// assembly, and result export (txt, doc, csv, pdf).

pub mod capture;
pub mod compress;
pub mod editor;
pub mod export;
pub mod fonts;
pub mod image;
pub mod pdf;

// Re-export the primary structs so callers can use `scanwerk_document::EditSession` etc.
pub use capture::{detect_kind, validate_capture};
pub use compress::{Compressed, CompressionSettings, compress_for_upload};
pub use editor::{EditSession, EditorConfig, SavedEdit};
pub use export::{ExportFormat, render_export, write_export};
pub use fonts::FontFile;
pub use image::processor::ImageProcessor;
pub use pdf::reader::PdfReader;
pub use pdf::writer::PdfWriter;
