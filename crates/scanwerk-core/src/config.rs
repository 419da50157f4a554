// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Application configuration.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::Result;
use crate::types::Color;

/// File name of the persisted configuration inside the data directory.
pub const CONFIG_FILE: &str = "config.json";

/// Environment variable that overrides [`AppConfig::gateway_base_url`].
pub const GATEWAY_URL_ENV: &str = "SCANWERK_GATEWAY_URL";

/// Persistent application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Base URL of the remote processing gateway (OCR, translation, PDF).
    pub gateway_base_url: String,
    /// Per-request timeout for gateway calls.
    pub request_timeout_secs: u64,
    /// Captures larger than this are rejected before entering the session.
    pub max_image_bytes: usize,
    /// Images larger than this are downscaled before upload.
    pub compression_threshold_bytes: usize,
    /// Longest edge after upload compression, in pixels.
    pub compression_max_dimension: u32,
    /// JPEG quality (1-100) for upload compression.
    pub compression_quality: u8,
    /// JPEG quality (1-100) for images saved from the editor.
    pub edit_output_quality: u8,
    /// Highlights narrower or shorter than this (percent) are discarded.
    pub highlight_min_percent: f32,
    /// Font used to draw text annotations. Well-known system fonts are tried when unset.
    pub annotation_font_path: Option<PathBuf>,
    pub default_text_color: Color,
    pub default_highlight_color: Color,
    pub default_font_size: f32,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            gateway_base_url: "http://localhost:5000/api".into(),
            request_timeout_secs: 120,
            max_image_bytes: 10 * 1024 * 1024,
            compression_threshold_bytes: 2 * 1024 * 1024,
            compression_max_dimension: 1500,
            compression_quality: 80,
            edit_output_quality: 92,
            highlight_min_percent: 2.0,
            annotation_font_path: None,
            default_text_color: Color::RED,
            default_highlight_color: Color::HIGHLIGHT_YELLOW,
            default_font_size: 24.0,
        }
    }
}

impl AppConfig {
    /// Load `config.json` from `data_dir`, falling back to defaults when the
    /// file is missing or unreadable. The gateway URL env override is applied
    /// last.
    pub fn load(data_dir: &Path) -> Self {
        let path = data_dir.join(CONFIG_FILE);
        let mut config = match std::fs::read_to_string(&path) {
            Ok(data) => match serde_json::from_str::<AppConfig>(&data) {
                Ok(config) => config,
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "invalid config, using defaults");
                    AppConfig::default()
                }
            },
            Err(_) => {
                debug!(path = %path.display(), "no config file, using defaults");
                AppConfig::default()
            }
        };

        if let Ok(url) = std::env::var(GATEWAY_URL_ENV) {
            if !url.trim().is_empty() {
                config.gateway_base_url = url;
            }
        }
        config
    }

    /// Write the configuration to `data_dir/config.json`.
    pub fn persist(&self, data_dir: &Path) -> Result<()> {
        let path = data_dir.join(CONFIG_FILE);
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(&path, json)?;
        Ok(())
    }
}
