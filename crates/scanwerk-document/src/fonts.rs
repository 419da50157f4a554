// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Outline font discovery. One TTF/OTF file serves both the editor (drawn via
// ab_glyph) and text PDFs (embedded via printpdf), so non-Latin text renders
// the same in both places.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use ab_glyph::{FontArc, FontRef};
use scanwerk_core::AppConfig;
use scanwerk_core::error::{Result, ScanwerkError};
use tracing::{debug, info, warn};

/// Bold system fonts tried when no font is configured.
const SYSTEM_FONTS: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans-Bold.ttf",
    "/usr/share/fonts/TTF/DejaVuSans-Bold.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans-Bold.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Bold.ttf",
    "/usr/share/fonts/liberation-sans/LiberationSans-Bold.ttf",
    "/System/Library/Fonts/Supplemental/Arial Bold.ttf",
    "/Library/Fonts/Arial Bold.ttf",
    "C:\\Windows\\Fonts\\arialbd.ttf",
];

/// A parsed-once font file. Cloning shares the bytes.
#[derive(Clone)]
pub struct FontFile {
    origin: Option<PathBuf>,
    bytes: Arc<[u8]>,
}

impl fmt::Debug for FontFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FontFile")
            .field("origin", &self.origin)
            .field("len", &self.bytes.len())
            .finish()
    }
}

impl FontFile {
    /// Wrap in-memory font data, rejecting anything ab_glyph cannot parse.
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self> {
        FontRef::try_from_slice(&bytes)
            .map_err(|e| ScanwerkError::ImageError(format!("invalid font data: {e}")))?;
        Ok(Self {
            origin: None,
            bytes: bytes.into(),
        })
    }

    /// Load a TTF/OTF font from disk.
    pub fn read(path: &Path) -> Result<Self> {
        let data = std::fs::read(path)?;
        let mut font = Self::from_bytes(data).map_err(|e| {
            ScanwerkError::ImageError(format!("invalid font {}: {e}", path.display()))
        })?;
        font.origin = Some(path.to_path_buf());
        info!(path = %path.display(), "font loaded");
        Ok(font)
    }

    /// The configured `annotation_font_path`, else the first usable system
    /// font. `None` when neither exists.
    pub fn locate(config: &AppConfig) -> Option<Self> {
        if let Some(ref path) = config.annotation_font_path {
            match Self::read(path) {
                Ok(font) => return Some(font),
                Err(e) => warn!(error = %e, "configured font unusable, trying system fonts"),
            }
        }
        let found = SYSTEM_FONTS
            .iter()
            .map(PathBuf::from)
            .filter(|p| p.exists())
            .find_map(|p| match Self::read(&p) {
                Ok(font) => Some(font),
                Err(e) => {
                    debug!(path = %p.display(), error = %e, "skipping system font");
                    None
                }
            });
        if found.is_none() {
            warn!("no outline font found; using the built-in bitmap font for annotations and Helvetica for PDFs");
        }
        found
    }

    pub fn origin(&self) -> Option<&Path> {
        self.origin.as_deref()
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Rasterisable handle for the editor.
    pub fn to_font_arc(&self) -> Result<FontArc> {
        FontArc::try_from_vec(self.bytes.to_vec())
            .map_err(|e| ScanwerkError::ImageError(format!("invalid font data: {e}")))
    }
}
