// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Platform-aware data directory resolution.

use std::path::PathBuf;

use tracing::warn;

/// Environment override for the data directory.
pub const DATA_DIR_ENV: &str = "SCANWERK_DATA_DIR";

/// Return the application data directory, creating it if needed.
///
/// Holds `config.json` and the stored auth token. On mobile the platform
/// bridge should provide the documents directory instead.
pub fn data_dir() -> PathBuf {
    let dir = match std::env::var_os(DATA_DIR_ENV) {
        Some(dir) => PathBuf::from(dir),
        None => dirs_fallback().join("scanwerk"),
    };
    if let Err(err) = std::fs::create_dir_all(&dir) {
        warn!(path = %dir.display(), %err, "could not create data directory");
    }
    dir
}

fn dirs_fallback() -> PathBuf {
    // XDG data dir, then ~/.local/share
    if let Ok(xdg) = std::env::var("XDG_DATA_HOME") {
        return PathBuf::from(xdg);
    }
    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home).join(".local").join("share");
    }
    std::env::temp_dir()
}
