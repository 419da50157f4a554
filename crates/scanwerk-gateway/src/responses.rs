// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Wire shapes of the processing backend's JSON replies, and the envelope check
// that turns `{success: false, ...}` into a gateway error.
//
// Every reply carries a `success` flag. Failures put a human-readable reason
// in `message` or `error`; the first one present is surfaced verbatim.

use reqwest::StatusCode;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};

use scanwerk_core::error::{Result, ScanwerkError};
use scanwerk_core::types::{ExtractedText, Table};

// -- Replies ------------------------------------------------------------------

/// `extractText`: `{success, scan: {ocr: {text, confidence}}}`
#[derive(Debug, Clone, Deserialize)]
pub struct OcrScanReply {
    pub scan: ScanBody,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ScanBody {
    #[serde(default, alias = "_id")]
    pub id: Option<String>,
    pub ocr: OcrBody,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OcrBody {
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub confidence: f32,
}

/// `extractMultiple`: `{success, text, confidence, pages, tables, tableCount}`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MultiExtractReply {
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub confidence: f32,
    #[serde(default)]
    pub pages: usize,
    #[serde(default)]
    pub tables: Vec<Table>,
    #[serde(default)]
    pub table_count: usize,
    #[serde(default)]
    pub scan_id: Option<String>,
}

/// `extractWithTables`: `{success, text, confidence, tables, tableCount}`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableExtractReply {
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub confidence: f32,
    #[serde(default)]
    pub tables: Vec<Table>,
    #[serde(default)]
    pub table_count: usize,
    #[serde(default)]
    pub scan_id: Option<String>,
}

/// `createPDF`: `{success, pdf}` with the document base64-encoded.
#[derive(Debug, Clone, Deserialize)]
pub struct PdfReply {
    pub pdf: String,
}

/// `translate`: `{success, translation: {translatedText, targetLanguage}}`
#[derive(Debug, Clone, Deserialize)]
pub struct TranslateReply {
    pub translation: Translation,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Translation {
    pub translated_text: String,
    pub target_language: String,
}

/// `summarize`: `{success, summary}`
#[derive(Debug, Clone, Deserialize)]
pub struct SummaryReply {
    pub summary: String,
}

// -- Domain conversions -------------------------------------------------------

/// Extraction result plus the backend's scan id, when it assigned one.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Extraction {
    pub result: ExtractedText,
    pub scan_id: Option<String>,
}

impl From<OcrScanReply> for Extraction {
    fn from(reply: OcrScanReply) -> Self {
        Self {
            result: ExtractedText {
                text: reply.scan.ocr.text,
                confidence: reply.scan.ocr.confidence,
                pages: 1,
                tables: Vec::new(),
            },
            scan_id: reply.scan.id,
        }
    }
}

impl From<MultiExtractReply> for Extraction {
    fn from(reply: MultiExtractReply) -> Self {
        if reply.table_count != reply.tables.len() {
            debug!(
                reported = reply.table_count,
                received = reply.tables.len(),
                "tableCount disagrees with tables"
            );
        }
        Self {
            result: ExtractedText {
                text: reply.text,
                confidence: reply.confidence,
                pages: reply.pages,
                tables: reply.tables,
            },
            scan_id: reply.scan_id,
        }
    }
}

impl From<TableExtractReply> for Extraction {
    fn from(reply: TableExtractReply) -> Self {
        Self {
            result: ExtractedText {
                text: reply.text,
                confidence: reply.confidence,
                pages: 1,
                tables: reply.tables,
            },
            scan_id: reply.scan_id,
        }
    }
}

// -- Envelope -----------------------------------------------------------------

/// Decode a reply body, enforcing the `success` flag.
///
/// - body is JSON with `success: true`: deserialized into `T`
/// - body is JSON without it: [`ScanwerkError::Gateway`] with the best message
/// - body is not JSON: `Gateway` for HTTP error statuses, otherwise
///   [`ScanwerkError::InvalidResponse`]
pub fn parse_reply<T: DeserializeOwned>(status: StatusCode, body: &str) -> Result<T> {
    let value: Value = match serde_json::from_str(body) {
        Ok(value) => value,
        Err(err) if status.is_success() => {
            return Err(ScanwerkError::InvalidResponse(format!("reply is not JSON: {err}")));
        }
        Err(_) => {
            warn!(%status, "gateway returned a non-JSON error body");
            return Err(ScanwerkError::Gateway {
                message: status_message(status),
            });
        }
    };

    let success = value.get("success").and_then(Value::as_bool).unwrap_or(false);
    if !success {
        let message = best_message(&value, status);
        warn!(%status, %message, "gateway reported failure");
        return Err(ScanwerkError::Gateway { message });
    }

    serde_json::from_value(value)
        .map_err(|err| ScanwerkError::InvalidResponse(format!("unexpected reply shape: {err}")))
}

/// `message`, then `error`, then the HTTP status line.
fn best_message(value: &Value, status: StatusCode) -> String {
    ["message", "error"]
        .iter()
        .filter_map(|key| value.get(*key).and_then(Value::as_str))
        .map(str::trim)
        .find(|text| !text.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| status_message(status))
}

fn status_message(status: StatusCode) -> String {
    match status.canonical_reason() {
        Some(reason) => format!("HTTP {}: {reason}", status.as_u16()),
        None => format!("HTTP {}", status.as_u16()),
    }
}
