// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Scanwerk: Core types, errors, configuration, and the page session shared
// across all crates.

pub mod config;
pub mod context;
pub mod error;
pub mod human_errors;
pub mod session;
pub mod types;

pub use config::AppConfig;
pub use context::{AppContext, AuthContext, DeviceContext};
pub use error::ScanwerkError;
pub use session::{PageSession, RemoveOutcome};
pub use types::*;
