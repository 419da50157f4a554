// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Editor settings.

use ab_glyph::FontArc;
use scanwerk_core::AppConfig;
use scanwerk_core::types::Color;
use tracing::warn;

use crate::fonts::FontFile;

/// Viewport width the logical font size refers to. Text is scaled by
/// `canvas_width / DISPLAY_REFERENCE_WIDTH` so it keeps the proportions it
/// had on screen.
pub const DISPLAY_REFERENCE_WIDTH: f32 = 800.0;

/// Settings for one editor instance.
#[derive(Clone)]
pub struct EditorConfig {
    /// JPEG quality for saved edits.
    pub output_quality: u8,
    /// Highlights must be wider and taller than this, in percent.
    pub highlight_min_percent: f32,
    pub reference_width: f32,
    pub text_color: Color,
    pub highlight_color: Color,
    pub font_size: f32,
    /// Outline font for text annotations. Without one, text is drawn with the
    /// built-in 8x8 bitmap font.
    pub font: Option<FontArc>,
}

impl std::fmt::Debug for EditorConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EditorConfig")
            .field("output_quality", &self.output_quality)
            .field("highlight_min_percent", &self.highlight_min_percent)
            .field("reference_width", &self.reference_width)
            .field("outline_font", &self.font.is_some())
            .finish()
    }
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self::without_font(&AppConfig::default())
    }
}

impl EditorConfig {
    /// Settings from the app config, drawing text with the bitmap font.
    pub fn without_font(config: &AppConfig) -> Self {
        Self {
            output_quality: config.edit_output_quality,
            highlight_min_percent: config.highlight_min_percent,
            reference_width: DISPLAY_REFERENCE_WIDTH,
            text_color: config.default_text_color,
            highlight_color: config.default_highlight_color,
            font_size: config.default_font_size,
            font: None,
        }
    }

    /// Settings from the app config with `font` as the outline font, usually
    /// the result of [`FontFile::locate`].
    pub fn from_app_config(config: &AppConfig, font: Option<&FontFile>) -> Self {
        let editor = Self::without_font(config);
        match font.map(FontFile::to_font_arc) {
            Some(Ok(font)) => editor.with_font(font),
            Some(Err(e)) => {
                warn!(error = %e, "outline font unusable; drawing text with the bitmap font");
                editor
            }
            None => editor,
        }
    }

    pub fn with_font(mut self, font: FontArc) -> Self {
        self.font = Some(font);
        self
    }
}
