// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Scanwerk Gateway: client for the remote processing backend (OCR, tables,
// translation, summarization, PDF assembly). The backend itself is an
// external service; this crate only shapes requests and decodes replies.

pub mod client;
pub mod progress;
pub mod responses;

pub use client::{GeneratedPdf, HttpGateway, ProcessingGateway, decode_pdf};
pub use progress::ProgressFn;
pub use responses::{Extraction, Translation};
