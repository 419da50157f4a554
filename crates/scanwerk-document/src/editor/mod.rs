// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Page editor: rotation, percentage-space crop, text annotations, and
// highlights, composited onto the page and re-encoded on save.

pub mod composite;
pub mod config;
pub mod session;

pub use config::EditorConfig;
pub use session::{EditSession, PendingText, SavedEdit};
