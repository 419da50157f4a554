// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types: page images, editor geometry in percentage space,
// annotations, and extracted results.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::error::{Result, ScanwerkError};

/// Unique identifier for a captured page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PageId(pub Uuid);

impl PageId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for PageId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for PageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Raster formats accepted into a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ImageKind {
    Jpeg,
    Png,
    Webp,
    Gif,
    Bmp,
    Tiff,
}

impl ImageKind {
    /// MIME type used for multipart uploads and exports.
    pub fn mime_type(&self) -> &'static str {
        match self {
            Self::Jpeg => "image/jpeg",
            Self::Png => "image/png",
            Self::Webp => "image/webp",
            Self::Gif => "image/gif",
            Self::Bmp => "image/bmp",
            Self::Tiff => "image/tiff",
        }
    }

    /// Conventional file extension (without the dot).
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Jpeg => "jpg",
            Self::Png => "png",
            Self::Webp => "webp",
            Self::Gif => "gif",
            Self::Bmp => "bmp",
            Self::Tiff => "tiff",
        }
    }

    /// Infer the kind from a file extension.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "jpg" | "jpeg" => Some(Self::Jpeg),
            "png" => Some(Self::Png),
            "webp" => Some(Self::Webp),
            "gif" => Some(Self::Gif),
            "bmp" => Some(Self::Bmp),
            "tif" | "tiff" => Some(Self::Tiff),
            _ => None,
        }
    }
}

/// One captured page: immutable encoded bytes plus identity metadata.
///
/// Cloning is cheap (the payload is shared). Edits never mutate a page; they
/// produce a new `PageImage` that replaces the old one in the session.
#[derive(Debug, Clone)]
pub struct PageImage {
    id: PageId,
    kind: ImageKind,
    bytes: Arc<[u8]>,
    /// Hex SHA-256 of `bytes`.
    fingerprint: String,
    captured_at: DateTime<Utc>,
}

impl PageImage {
    pub fn new(bytes: Vec<u8>, kind: ImageKind) -> Self {
        let fingerprint = hex::encode(Sha256::digest(&bytes));
        Self {
            id: PageId::new(),
            kind,
            bytes: bytes.into(),
            fingerprint,
            captured_at: Utc::now(),
        }
    }

    pub fn id(&self) -> PageId {
        self.id
    }

    pub fn kind(&self) -> ImageKind {
        self.kind
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }

    pub fn captured_at(&self) -> DateTime<Utc> {
        self.captured_at
    }

    /// Suggested upload file name, e.g. `page-<uuid>.jpg`.
    pub fn file_name(&self) -> String {
        format!("page-{}.{}", self.id, self.kind.extension())
    }
}

/// Paper sizes for locally assembled PDFs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PaperSize {
    #[default]
    A4,
    A5,
    Letter,
    Legal,
}

impl PaperSize {
    /// Dimensions in millimetres (width, height).
    pub fn dimensions_mm(&self) -> (u32, u32) {
        match self {
            Self::A4 => (210, 297),
            Self::A5 => (148, 210),
            Self::Letter => (216, 279),
            Self::Legal => (216, 356),
        }
    }
}

// -- Editor geometry ----------------------------------------------------------

/// Quarter-turn rotation applied by the editor, clockwise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Rotation {
    #[default]
    Deg0,
    Deg90,
    Deg180,
    Deg270,
}

impl Rotation {
    pub fn degrees(self) -> u16 {
        match self {
            Self::Deg0 => 0,
            Self::Deg90 => 90,
            Self::Deg180 => 180,
            Self::Deg270 => 270,
        }
    }

    /// Build from any multiple of 90 (negative values wrap).
    pub fn from_degrees(degrees: i32) -> Result<Self> {
        match degrees.rem_euclid(360) {
            0 => Ok(Self::Deg0),
            90 => Ok(Self::Deg90),
            180 => Ok(Self::Deg180),
            270 => Ok(Self::Deg270),
            other => Err(ScanwerkError::ImageError(format!(
                "rotation must be a multiple of 90 degrees, got {other}"
            ))),
        }
    }

    pub fn rotate_cw(self) -> Self {
        match self {
            Self::Deg0 => Self::Deg90,
            Self::Deg90 => Self::Deg180,
            Self::Deg180 => Self::Deg270,
            Self::Deg270 => Self::Deg0,
        }
    }

    pub fn rotate_ccw(self) -> Self {
        match self {
            Self::Deg0 => Self::Deg270,
            Self::Deg90 => Self::Deg0,
            Self::Deg180 => Self::Deg90,
            Self::Deg270 => Self::Deg180,
        }
    }

    /// `(360 - r) % 360`.
    pub fn inverse(self) -> Self {
        match self {
            Self::Deg0 => Self::Deg0,
            Self::Deg90 => Self::Deg270,
            Self::Deg180 => Self::Deg180,
            Self::Deg270 => Self::Deg90,
        }
    }

    /// Combine two rotations.
    pub fn then(self, other: Rotation) -> Self {
        let sum = (self.degrees() + other.degrees()) % 360;
        match sum {
            90 => Self::Deg90,
            180 => Self::Deg180,
            270 => Self::Deg270,
            _ => Self::Deg0,
        }
    }

    /// Quarter turns swap width and height.
    pub fn swaps_dimensions(self) -> bool {
        matches!(self, Self::Deg90 | Self::Deg270)
    }
}

/// Output canvas size for an image of `width` x `height` after `rotation`.
pub fn rotated_dimensions(width: u32, height: u32, rotation: Rotation) -> (u32, u32) {
    if rotation.swaps_dimensions() {
        (height, width)
    } else {
        (width, height)
    }
}

/// Absolute pixel rectangle on a concrete canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// Rectangle in percentage-of-bounds coordinates (each field 0..=100).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PercentRect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl PercentRect {
    pub const FULL: PercentRect = PercentRect {
        x: 0.0,
        y: 0.0,
        width: 100.0,
        height: 100.0,
    };

    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Normalised rectangle spanning two corner points, clamped to 0..=100.
    pub fn from_corners(x0: f32, y0: f32, x1: f32, y1: f32) -> Self {
        let (x0, y0, x1, y1) = (
            clamp_percent(x0),
            clamp_percent(y0),
            clamp_percent(x1),
            clamp_percent(y1),
        );
        Self {
            x: x0.min(x1),
            y: y0.min(y1),
            width: (x1 - x0).abs(),
            height: (y1 - y0).abs(),
        }
    }

    /// Clamp so that every field is in 0..=100 and the rectangle stays inside
    /// the bounds (`x + width <= 100`, `y + height <= 100`).
    pub fn clamped(self) -> Self {
        let x = clamp_percent(self.x);
        let y = clamp_percent(self.y);
        Self {
            x,
            y,
            width: clamp_percent(self.width).min(100.0 - x),
            height: clamp_percent(self.height).min(100.0 - y),
        }
    }

    pub fn is_full(&self) -> bool {
        self.x <= 0.0 && self.y <= 0.0 && self.width >= 100.0 && self.height >= 100.0
    }

    /// Convert to pixels on a `canvas_w` x `canvas_h` canvas.
    ///
    /// The result always lies inside the canvas and is at least 1x1 for a
    /// non-empty canvas.
    pub fn to_pixels(&self, canvas_w: u32, canvas_h: u32) -> PixelRect {
        let r = self.clamped();
        let px = |pct: f32, extent: u32| ((pct / 100.0) * extent as f32).round() as u32;

        let x = px(r.x, canvas_w).min(canvas_w.saturating_sub(1));
        let y = px(r.y, canvas_h).min(canvas_h.saturating_sub(1));
        let width = px(r.width, canvas_w).clamp(1, (canvas_w - x).max(1));
        let height = px(r.height, canvas_h).clamp(1, (canvas_h - y).max(1));
        PixelRect {
            x,
            y,
            width,
            height,
        }
    }
}

impl Default for PercentRect {
    fn default() -> Self {
        Self::FULL
    }
}

/// Clamp a percentage coordinate to 0..=100, mapping NaN to 0.
pub fn clamp_percent(value: f32) -> f32 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 100.0)
    }
}

/// RGBA colour with `#rrggbb` / `#rrggbbaa` parsing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const WHITE: Color = Color::rgba(255, 255, 255, 255);
    pub const BLACK: Color = Color::rgba(0, 0, 0, 255);
    pub const RED: Color = Color::rgba(255, 0, 0, 255);
    /// Semi-transparent marker yellow.
    pub const HIGHLIGHT_YELLOW: Color = Color::rgba(255, 255, 0, 102);

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub fn from_hex(hex: &str) -> Result<Self> {
        let digits = hex.strip_prefix('#').unwrap_or(hex);
        let channel = |i: usize| {
            digits
                .get(i..i + 2)
                .and_then(|s| u8::from_str_radix(s, 16).ok())
                .ok_or_else(|| ScanwerkError::ImageError(format!("invalid colour '{hex}'")))
        };
        match digits.len() {
            6 => Ok(Self::rgba(channel(0)?, channel(2)?, channel(4)?, 255)),
            8 => Ok(Self::rgba(channel(0)?, channel(2)?, channel(4)?, channel(6)?)),
            _ => Err(ScanwerkError::ImageError(format!("invalid colour '{hex}'"))),
        }
    }

    pub fn to_hex(&self) -> String {
        if self.a == 255 {
            format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
        } else {
            format!("#{:02x}{:02x}{:02x}{:02x}", self.r, self.g, self.b, self.a)
        }
    }

    pub fn to_array(self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }
}

impl TryFrom<String> for Color {
    type Error = ScanwerkError;

    fn try_from(value: String) -> Result<Self> {
        Self::from_hex(&value)
    }
}

impl From<Color> for String {
    fn from(value: Color) -> Self {
        value.to_hex()
    }
}

// -- Annotations --------------------------------------------------------------

/// Identifier of a text annotation or highlight within one edit session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AnnotationId {
    /// The highlight currently being drawn. Never composited.
    Preview,
    Assigned(u64),
}

impl AnnotationId {
    pub fn is_preview(&self) -> bool {
        matches!(self, Self::Preview)
    }
}

impl std::fmt::Display for AnnotationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Preview => f.write_str("preview"),
            Self::Assigned(id) => write!(f, "{id}"),
        }
    }
}

/// Text placed on the page, anchored at its top-left corner in percentage space.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextAnnotation {
    pub id: AnnotationId,
    pub x: f32,
    pub y: f32,
    pub text: String,
    pub color: Color,
    /// Logical font size, scaled to the output canvas at composition time.
    pub font_size: f32,
}

/// Filled highlight rectangle in percentage space.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Highlight {
    pub id: AnnotationId,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub color: Color,
}

impl Highlight {
    pub fn rect(&self) -> PercentRect {
        PercentRect::new(self.x, self.y, self.width, self.height)
    }
}

/// The editor's single active tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ActiveTool {
    #[default]
    None,
    Crop,
    Text,
    Highlight,
}

// -- Extracted results --------------------------------------------------------

/// A table detected by the OCR backend: rows of cell strings.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(from = "TableRepr")]
pub struct Table {
    pub rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new(rows: Vec<Vec<String>>) -> Self {
        Self { rows }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.iter().all(|row| row.is_empty())
    }
}

/// Accepts both `{"rows": [[..]]}` and a bare `[[..]]`.
#[derive(Deserialize)]
#[serde(untagged)]
enum TableRepr {
    Object { rows: Vec<Vec<String>> },
    Rows(Vec<Vec<String>>),
}

impl From<TableRepr> for Table {
    fn from(repr: TableRepr) -> Self {
        match repr {
            TableRepr::Object { rows } | TableRepr::Rows(rows) => Self { rows },
        }
    }
}

/// Text extracted from one or more pages.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ExtractedText {
    pub text: String,
    /// Recognition confidence in percent, as reported by the backend.
    pub confidence: f32,
    pub pages: usize,
    pub tables: Vec<Table>,
}
