// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for Scanwerk.

use thiserror::Error;

/// Top-level error type for all Scanwerk operations.
#[derive(Debug, Error)]
pub enum ScanwerkError {
    // -- Input validation --
    #[error("image is {size} bytes, limit is {limit} bytes")]
    ImageTooLarge { size: usize, limit: usize },

    #[error("unsupported media type: {0}")]
    UnsupportedMediaType(String),

    #[error("annotation text is empty")]
    EmptyText,

    // -- Device / permission --
    #[error("device error: {0}")]
    Device(String),

    #[error("permission denied: {0}")]
    PermissionDenied(String),

    #[error("feature not available on this platform")]
    PlatformUnavailable,

    // -- Decode / encode --
    #[error("image processing failed: {0}")]
    ImageError(String),

    #[error("PDF operation failed: {0}")]
    PdfError(String),

    // -- Remote gateway --
    #[error("network request failed: {0}")]
    Network(String),

    #[error("{message}")]
    Gateway { message: String },

    #[error("invalid gateway response: {0}")]
    InvalidResponse(String),

    // -- Session / workflow state --
    #[error("index {index} out of range (session has {len} pages)")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("cannot go from {from} to {to}")]
    InvalidTransition { from: String, to: String },

    #[error("an editor is already open")]
    EditorBusy,

    #[error("export failed: {0}")]
    Export(String),

    // -- Storage / persistence --
    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, ScanwerkError>;
