// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Human-readable error messages shown inline in the scanning flow.
//
// Every technical error is mapped to plain English with a clear suggestion.
// Nothing here triggers an automatic retry: `retriable` only tells the UI
// whether offering a "Try again" button makes sense.

use crate::error::ScanwerkError;

/// Error category from the user's perspective (drives icon/colour in the UI).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// The input was rejected before anything changed (too big, wrong type).
    InvalidInput,
    /// Camera, clipboard or file access failed; the UI falls back to the prior mode.
    Device,
    /// An edit could not be decoded or encoded; the page is unchanged.
    Editing,
    /// The remote service or the network failed; the user can resubmit.
    Remote,
    /// Internal problem the user cannot fix.
    Internal,
}

/// A human-readable error with plain English message and actionable suggestion.
#[derive(Debug, Clone)]
pub struct HumanError {
    /// Plain English summary (shown as a heading).
    pub message: String,
    /// What the user should try (shown as body text).
    pub suggestion: String,
    /// Whether re-invoking the same action might succeed.
    pub retriable: bool,
    pub severity: Severity,
}

/// Convert a `ScanwerkError` into a message the user can act on.
pub fn humanize_error(err: &ScanwerkError) -> HumanError {
    match err {
        // -- Input validation --
        ScanwerkError::ImageTooLarge { limit, .. } => HumanError {
            message: "This image is too large.".into(),
            suggestion: format!(
                "Please choose an image smaller than {} MB.",
                limit / (1024 * 1024)
            ),
            retriable: false,
            severity: Severity::InvalidInput,
        },

        ScanwerkError::UnsupportedMediaType(_) => HumanError {
            message: "That file isn't an image.".into(),
            suggestion: "Please choose a JPEG, PNG or WebP picture of your document.".into(),
            retriable: false,
            severity: Severity::InvalidInput,
        },

        ScanwerkError::EmptyText => HumanError {
            message: "Please type some text first.".into(),
            suggestion: "Empty notes can't be added to the page.".into(),
            retriable: false,
            severity: Severity::InvalidInput,
        },

        // -- Device / permission --
        ScanwerkError::Device(detail) => HumanError {
            message: "The camera couldn't be used.".into(),
            suggestion: format!("Make sure no other app is using it, or upload a photo instead. ({detail})"),
            retriable: true,
            severity: Severity::Device,
        },

        ScanwerkError::PermissionDenied(what) => HumanError {
            message: format!("Access to the {what} was denied."),
            suggestion: "Allow access in your device settings, then try again.".into(),
            retriable: true,
            severity: Severity::Device,
        },

        ScanwerkError::PlatformUnavailable => HumanError {
            message: "This feature isn't available on your device.".into(),
            suggestion: "Try uploading a file instead.".into(),
            retriable: false,
            severity: Severity::Device,
        },

        // -- Decode / encode --
        ScanwerkError::ImageError(_) => HumanError {
            message: "Your edits couldn't be saved.".into(),
            suggestion: "The original page is unchanged. Try editing again, or retake the photo.".into(),
            retriable: true,
            severity: Severity::Editing,
        },

        ScanwerkError::PdfError(_) => HumanError {
            message: "The PDF couldn't be created.".into(),
            suggestion: "Try again, or download the extracted text instead.".into(),
            retriable: true,
            severity: Severity::Editing,
        },

        // -- Remote gateway --
        ScanwerkError::Network(_) => HumanError {
            message: "We couldn't reach the scanning service.".into(),
            suggestion: "Check your internet connection, then try again.".into(),
            retriable: true,
            severity: Severity::Remote,
        },

        // Business errors carry the server's own message, shown verbatim.
        ScanwerkError::Gateway { message } => HumanError {
            message: message.clone(),
            suggestion: "Please try again.".into(),
            retriable: true,
            severity: Severity::Remote,
        },

        ScanwerkError::InvalidResponse(_) => HumanError {
            message: "The scanning service sent an unexpected reply.".into(),
            suggestion: "Please try again in a moment.".into(),
            retriable: true,
            severity: Severity::Remote,
        },

        // -- Workflow state --
        ScanwerkError::IndexOutOfRange { .. }
        | ScanwerkError::InvalidTransition { .. }
        | ScanwerkError::EditorBusy => HumanError {
            message: "That action isn't possible right now.".into(),
            suggestion: "Finish or cancel what you're doing first.".into(),
            retriable: false,
            severity: Severity::Internal,
        },

        ScanwerkError::Export(_) => HumanError {
            message: "The download couldn't be prepared.".into(),
            suggestion: "Try a different format.".into(),
            retriable: true,
            severity: Severity::Internal,
        },

        // -- Storage --
        ScanwerkError::Io(io_err) => {
            if io_err.kind() == std::io::ErrorKind::NotFound {
                HumanError {
                    message: "The file couldn't be found.".into(),
                    suggestion: "It may have been moved or deleted. Try choosing the file again.".into(),
                    retriable: false,
                    severity: Severity::InvalidInput,
                }
            } else if io_err.kind() == std::io::ErrorKind::PermissionDenied {
                HumanError {
                    message: "The app doesn't have permission to read that file.".into(),
                    suggestion: "Check the file permissions, or copy the file somewhere else first.".into(),
                    retriable: false,
                    severity: Severity::Device,
                }
            } else {
                HumanError {
                    message: "There was a problem reading or writing a file.".into(),
                    suggestion: "Try again. If this keeps happening, your device's storage may be full.".into(),
                    retriable: true,
                    severity: Severity::Internal,
                }
            }
        }

        ScanwerkError::Serialization(_) => HumanError {
            message: "The app had an internal data problem.".into(),
            suggestion: "Try again. If this keeps happening, please report it.".into(),
            retriable: true,
            severity: Severity::Internal,
        },
    }
}
