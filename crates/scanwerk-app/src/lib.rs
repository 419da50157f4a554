// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// scanwerk-app. The scanning flow: capture coordination, the workflow state
// machine (select, camera, multipreview, editor, processing, result), and the
// headless command-line driver.

pub mod capture;
pub mod cli;
pub mod services;
pub mod workflow;

pub use capture::{CaptureCoordinator, CaptureSource, ImportReport};
pub use workflow::{Artifact, Mode, ProcessingAction, ScanOutcome, TextOutcome, Workflow};
