// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Edit session: the transient state behind one "open editor": rotation,
// crop region, text annotations, highlights, and the active-tool state
// machine. All positions are in percentage space of the displayed (rotated,
// uncropped) canvas.

use image::{DynamicImage, RgbaImage};
use scanwerk_core::error::{Result, ScanwerkError};
use scanwerk_core::types::{
    ActiveTool, AnnotationId, Color, Highlight, ImageKind, PageId, PageImage, PercentRect,
    Rotation, TextAnnotation, clamp_percent, rotated_dimensions,
};
use tracing::{debug, info, instrument};

use super::EditorConfig;
use super::composite;
use crate::image::ImageProcessor;

/// Where a pending text annotation will go once its text is confirmed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PendingText {
    pub x: f32,
    pub y: f32,
}

/// Result of a successful save.
#[derive(Debug, Clone)]
pub struct SavedEdit {
    /// Session index the page was opened from.
    pub index: usize,
    /// Page the edit started from.
    pub replaces: PageId,
    pub image: PageImage,
}

/// One open editor. Created from a page snapshot and discarded once the
/// caller cancels or applies a [`SavedEdit`].
#[derive(Debug, Clone)]
pub struct EditSession {
    source: DynamicImage,
    source_id: PageId,
    index: usize,
    rotation: Rotation,
    crop: PercentRect,
    texts: Vec<TextAnnotation>,
    highlights: Vec<Highlight>,
    tool: ActiveTool,
    pending_text: Option<PendingText>,
    selected: Option<AnnotationId>,
    /// Pointer-down position of the highlight being drawn.
    drag_origin: Option<(f32, f32)>,
    next_id: u64,
    text_color: Color,
    highlight_color: Color,
    font_size: f32,
    highlight_min_percent: f32,
}

impl EditSession {
    /// Open an editor on `page`, remembered as coming from session `index`.
    ///
    /// Decodes the page; a decode failure is returned and no session exists.
    #[instrument(skip(page, config), fields(page = %page.id(), bytes = page.len()))]
    pub fn open(page: &PageImage, index: usize, config: &EditorConfig) -> Result<Self> {
        let source = ImageProcessor::from_bytes(page.bytes())?.into_dynamic();
        info!(
            width = source.width(),
            height = source.height(),
            "editor opened"
        );
        Ok(Self {
            source,
            source_id: page.id(),
            index,
            rotation: Rotation::Deg0,
            crop: PercentRect::FULL,
            texts: Vec::new(),
            highlights: Vec::new(),
            tool: ActiveTool::None,
            pending_text: None,
            selected: None,
            drag_origin: None,
            next_id: 1,
            text_color: config.text_color,
            highlight_color: config.highlight_color,
            font_size: config.font_size,
            highlight_min_percent: config.highlight_min_percent,
        })
    }

    // -- Accessors ------------------------------------------------------------

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn source_id(&self) -> PageId {
        self.source_id
    }

    pub fn source(&self) -> &DynamicImage {
        &self.source
    }

    pub fn rotation(&self) -> Rotation {
        self.rotation
    }

    pub fn crop_region(&self) -> PercentRect {
        self.crop
    }

    pub fn active_tool(&self) -> ActiveTool {
        self.tool
    }

    pub fn pending_text(&self) -> Option<PendingText> {
        self.pending_text
    }

    pub fn selected(&self) -> Option<AnnotationId> {
        self.selected
    }

    pub fn text_annotations(&self) -> &[TextAnnotation] {
        &self.texts
    }

    /// All highlights, including an in-progress `Preview`.
    pub fn highlights(&self) -> &[Highlight] {
        &self.highlights
    }

    /// The highlight currently being drawn, if any.
    pub fn preview_highlight(&self) -> Option<&Highlight> {
        self.highlights.iter().find(|h| h.id.is_preview())
    }

    /// Size of the rotated canvas before any crop.
    pub fn output_dimensions(&self) -> (u32, u32) {
        rotated_dimensions(self.source.width(), self.source.height(), self.rotation)
    }

    // -- Style ----------------------------------------------------------------

    pub fn set_text_color(&mut self, color: Color) {
        self.text_color = color;
    }

    pub fn set_font_size(&mut self, font_size: f32) {
        self.font_size = font_size.max(1.0);
    }

    pub fn set_highlight_color(&mut self, color: Color) {
        self.highlight_color = color;
    }

    // -- Tool state machine ---------------------------------------------------

    /// Make `tool` the single active tool.
    ///
    /// Entering any tool clears pending text placement, the annotation
    /// selection, and an unfinished highlight.
    pub fn select_tool(&mut self, tool: ActiveTool) {
        debug!(from = ?self.tool, to = ?tool, "tool selected");
        self.tool = tool;
        self.pending_text = None;
        self.selected = None;
        self.discard_preview();
    }

    // -- Rotation -------------------------------------------------------------

    pub fn rotate_clockwise(&mut self) {
        self.rotation = self.rotation.rotate_cw();
    }

    pub fn rotate_counter_clockwise(&mut self) {
        self.rotation = self.rotation.rotate_ccw();
    }

    pub fn set_rotation(&mut self, rotation: Rotation) {
        self.rotation = rotation;
    }

    // -- Crop -----------------------------------------------------------------

    /// Set the crop rectangle. It is clamped to the canvas bounds and only
    /// applied on save while the crop tool is active.
    pub fn set_crop_region(&mut self, rect: PercentRect) {
        self.crop = rect.clamped();
    }

    // -- Text tool ------------------------------------------------------------

    /// Start placing text at a clicked position. Ignored unless the text tool
    /// is active.
    pub fn place_text(&mut self, x: f32, y: f32) -> bool {
        if self.tool != ActiveTool::Text {
            return false;
        }
        self.pending_text = Some(PendingText {
            x: clamp_percent(x),
            y: clamp_percent(y),
        });
        self.selected = None;
        true
    }

    /// Confirm the pending placement with `text`.
    ///
    /// Empty or whitespace-only text is rejected and the placement is kept so
    /// the user can keep typing. Returns `Ok(None)` when nothing is pending.
    pub fn confirm_text(&mut self, text: &str) -> Result<Option<AnnotationId>> {
        let Some(pending) = self.pending_text else {
            return Ok(None);
        };
        let text = text.trim();
        if text.is_empty() {
            return Err(ScanwerkError::EmptyText);
        }

        let id = self.allocate_id();
        self.texts.push(TextAnnotation {
            id,
            x: pending.x,
            y: pending.y,
            text: text.to_string(),
            color: self.text_color,
            font_size: self.font_size,
        });
        self.pending_text = None;
        debug!(%id, "text annotation added");
        Ok(Some(id))
    }

    /// Discard the pending placement (escape).
    pub fn cancel_text(&mut self) {
        self.pending_text = None;
    }

    // -- Highlight tool -------------------------------------------------------

    /// Begin drawing a highlight. Ignored unless the highlight tool is active.
    pub fn pointer_down(&mut self, x: f32, y: f32) -> bool {
        if self.tool != ActiveTool::Highlight {
            return false;
        }
        let (x, y) = (clamp_percent(x), clamp_percent(y));
        self.discard_preview();
        self.drag_origin = Some((x, y));
        self.highlights.push(Highlight {
            id: AnnotationId::Preview,
            x,
            y,
            width: 0.0,
            height: 0.0,
            color: self.highlight_color,
        });
        true
    }

    /// Stretch the preview highlight to the pointer, normalised so `x`/`y`
    /// is the min corner and the size is non-negative.
    pub fn pointer_move(&mut self, x: f32, y: f32) {
        let Some((ox, oy)) = self.drag_origin else {
            return;
        };
        let rect = PercentRect::from_corners(ox, oy, x, y);
        if let Some(preview) = self.highlights.iter_mut().find(|h| h.id.is_preview()) {
            preview.x = rect.x;
            preview.y = rect.y;
            preview.width = rect.width;
            preview.height = rect.height;
        }
    }

    /// Finish the highlight. It is kept only when both width and height
    /// exceed the minimum (2% by default); a drag of exactly the minimum or
    /// less on either axis is treated as an accidental click and dropped.
    pub fn pointer_up(&mut self) -> Option<AnnotationId> {
        self.drag_origin.take()?;
        let pos = self.highlights.iter().position(|h| h.id.is_preview())?;
        let preview = self.highlights.remove(pos);

        let min = self.highlight_min_percent;
        if preview.width <= min || preview.height <= min {
            debug!(
                width = preview.width,
                height = preview.height,
                "highlight discarded as accidental click"
            );
            return None;
        }

        let id = self.allocate_id();
        self.highlights.push(Highlight { id, ..preview });
        debug!(%id, "highlight added");
        Some(id)
    }

    // -- Annotation management ------------------------------------------------

    /// Select an existing annotation or highlight. Unknown ids clear the selection.
    pub fn select_annotation(&mut self, id: AnnotationId) -> bool {
        let exists = !id.is_preview()
            && (self.texts.iter().any(|t| t.id == id) || self.highlights.iter().any(|h| h.id == id));
        self.selected = exists.then_some(id);
        exists
    }

    pub fn remove_annotation(&mut self, id: AnnotationId) -> bool {
        let before = self.texts.len();
        self.texts.retain(|t| t.id != id);
        self.clear_selection_of(id);
        self.texts.len() != before
    }

    pub fn remove_highlight(&mut self, id: AnnotationId) -> bool {
        let before = self.highlights.len();
        self.highlights.retain(|h| h.id != id);
        self.clear_selection_of(id);
        self.highlights.len() != before
    }

    pub fn clear_annotations(&mut self) {
        self.texts.clear();
        self.highlights.clear();
        self.selected = None;
        self.pending_text = None;
        self.drag_origin = None;
    }

    // -- Composition ----------------------------------------------------------

    /// Render the edit: rotate, blend highlights, draw text, then crop if the
    /// crop tool is active. The order matches how the user composed the edit
    /// on screen.
    #[instrument(skip_all, fields(rotation = self.rotation.degrees(), tool = ?self.tool))]
    pub fn compose(&self, config: &EditorConfig) -> RgbaImage {
        let mut canvas = ImageProcessor::from_dynamic(self.source.clone())
            .rotate(self.rotation)
            .into_rgba8();

        composite::blend_highlights(&mut canvas, &self.highlights);

        composite::draw_text_annotations(
            &mut canvas,
            &self.texts,
            config.font.as_ref(),
            config.reference_width,
        );

        if self.tool == ActiveTool::Crop {
            let rect = self.crop.to_pixels(canvas.width(), canvas.height());
            return ImageProcessor::from_dynamic(DynamicImage::ImageRgba8(canvas))
                .crop(rect)
                .into_rgba8();
        }
        canvas
    }

    /// Compose and re-encode as a new JPEG page.
    ///
    /// Works from the current state without modifying it, so an encode failure
    /// leaves the editor open with every edit intact.
    #[instrument(skip_all, fields(index = self.index))]
    pub fn save(&self, config: &EditorConfig) -> Result<SavedEdit> {
        let composed = self.compose(config);
        let bytes = ImageProcessor::from_dynamic(DynamicImage::ImageRgba8(composed))
            .to_jpeg_bytes(config.output_quality)?;
        info!(bytes = bytes.len(), "edit saved");
        Ok(SavedEdit {
            index: self.index,
            replaces: self.source_id,
            image: PageImage::new(bytes, ImageKind::Jpeg),
        })
    }

    // -- Internals ------------------------------------------------------------

    fn allocate_id(&mut self) -> AnnotationId {
        let id = AnnotationId::Assigned(self.next_id);
        self.next_id += 1;
        id
    }

    fn discard_preview(&mut self) {
        self.highlights.retain(|h| !h.id.is_preview());
        self.drag_origin = None;
    }

    fn clear_selection_of(&mut self, id: AnnotationId) {
        if self.selected == Some(id) {
            self.selected = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage, Rgba};

    fn page(w: u32, h: u32) -> PageImage {
        let img = RgbImage::from_pixel(w, h, Rgb([255, 255, 255]));
        let bytes = ImageProcessor::from_dynamic(DynamicImage::ImageRgb8(img))
            .to_png_bytes()
            .unwrap();
        PageImage::new(bytes, ImageKind::Png)
    }

    fn editor(w: u32, h: u32) -> EditSession {
        EditSession::open(&page(w, h), 0, &EditorConfig::default()).unwrap()
    }

    #[test]
    fn open_starts_clean() {
        let ed = editor(40, 20);
        assert_eq!(ed.rotation(), Rotation::Deg0);
        assert_eq!(ed.crop_region(), PercentRect::FULL);
        assert_eq!(ed.active_tool(), ActiveTool::None);
        assert!(ed.text_annotations().is_empty());
        assert!(ed.highlights().is_empty());
    }

    #[test]
    fn open_rejects_undecodable_page() {
        let bad = PageImage::new(b"\x89PNG garbage".to_vec(), ImageKind::Png);
        assert!(matches!(
            EditSession::open(&bad, 0, &EditorConfig::default()),
            Err(ScanwerkError::ImageError(_))
        ));
    }

    #[test]
    fn rotation_swaps_output_dimensions() {
        let mut ed = editor(40, 20);
        ed.rotate_clockwise();
        assert_eq!(ed.output_dimensions(), (20, 40));
        ed.rotate_clockwise();
        assert_eq!(ed.output_dimensions(), (40, 20));
        ed.rotate_counter_clockwise();
        ed.rotate_counter_clockwise();
        ed.rotate_counter_clockwise();
        assert_eq!(ed.rotation(), Rotation::Deg270);
    }

    #[test]
    fn text_requires_text_tool() {
        let mut ed = editor(40, 20);
        assert!(!ed.place_text(50.0, 50.0));
        assert_eq!(ed.confirm_text("hello").unwrap(), None);
        assert!(ed.text_annotations().is_empty());
    }

    #[test]
    fn empty_text_never_creates_annotation() {
        let mut ed = editor(40, 20);
        ed.select_tool(ActiveTool::Text);
        assert!(ed.place_text(10.0, 10.0));
        assert!(matches!(ed.confirm_text("   \t"), Err(ScanwerkError::EmptyText)));
        assert!(ed.text_annotations().is_empty());
        // Placement survives so the user can keep typing.
        assert!(ed.pending_text().is_some());
    }

    #[test]
    fn confirmed_text_gets_unique_ids() {
        let mut ed = editor(40, 20);
        ed.select_tool(ActiveTool::Text);
        ed.place_text(10.0, 10.0);
        let a = ed.confirm_text("first").unwrap().unwrap();
        assert!(ed.pending_text().is_none());
        ed.place_text(20.0, 20.0);
        let b = ed.confirm_text(" second ").unwrap().unwrap();
        assert_ne!(a, b);
        assert_eq!(ed.text_annotations().len(), 2);
        assert_eq!(ed.text_annotations()[1].text, "second");
    }

    #[test]
    fn cancel_text_discards_placement() {
        let mut ed = editor(40, 20);
        ed.select_tool(ActiveTool::Text);
        ed.place_text(10.0, 10.0);
        ed.cancel_text();
        assert_eq!(ed.confirm_text("late").unwrap(), None);
        assert!(ed.text_annotations().is_empty());
    }

    #[test]
    fn switching_tools_clears_transient_state() {
        let mut ed = editor(40, 20);
        ed.select_tool(ActiveTool::Text);
        ed.place_text(10.0, 10.0);
        ed.select_tool(ActiveTool::Highlight);
        assert!(ed.pending_text().is_none());

        ed.pointer_down(5.0, 5.0);
        ed.pointer_move(30.0, 30.0);
        ed.select_tool(ActiveTool::Crop);
        assert!(ed.preview_highlight().is_none());
        assert!(ed.highlights().is_empty());
    }

    #[test]
    fn highlight_drag_is_normalised_and_finalised() {
        let mut ed = editor(100, 100);
        ed.select_tool(ActiveTool::Highlight);
        ed.pointer_down(40.0, 30.0);
        ed.pointer_move(10.0, 10.0);

        let preview = ed.preview_highlight().unwrap();
        assert_eq!((preview.x, preview.y), (10.0, 10.0));
        assert_eq!((preview.width, preview.height), (30.0, 20.0));

        let id = ed.pointer_up().unwrap();
        assert!(ed.preview_highlight().is_none());
        let h = &ed.highlights()[0];
        assert_eq!(h.id, id);
        assert_eq!(h.rect(), PercentRect::new(10.0, 10.0, 30.0, 20.0));
    }

    #[test]
    fn small_highlight_is_discarded() {
        let mut ed = editor(100, 100);
        ed.select_tool(ActiveTool::Highlight);
        ed.pointer_down(10.0, 10.0);
        ed.pointer_move(11.5, 40.0);
        assert_eq!(ed.pointer_up(), None);
        assert!(ed.highlights().is_empty());

        ed.pointer_down(10.0, 10.0);
        ed.pointer_move(40.0, 11.0);
        assert_eq!(ed.pointer_up(), None);
        assert!(ed.highlights().is_empty());
    }

    #[test]
    fn highlight_must_exceed_the_minimum() {
        let mut ed = editor(100, 100);
        ed.select_tool(ActiveTool::Highlight);
        ed.pointer_down(10.0, 10.0);
        ed.pointer_move(12.0, 12.0);
        assert_eq!(ed.pointer_up(), None);
        assert!(ed.highlights().is_empty());

        ed.pointer_down(10.0, 10.0);
        ed.pointer_move(12.0, 30.0);
        assert_eq!(ed.pointer_up(), None);

        ed.pointer_down(10.0, 10.0);
        ed.pointer_move(12.5, 12.5);
        let id = ed.pointer_up().unwrap();
        assert_eq!(ed.highlights().len(), 1);
        assert_eq!(ed.highlights()[0].id, id);
        assert_eq!(ed.highlights()[0].rect(), PercentRect::new(10.0, 10.0, 2.5, 2.5));
    }

    #[test]
    fn highlight_ignored_outside_highlight_tool() {
        let mut ed = editor(100, 100);
        assert!(!ed.pointer_down(10.0, 10.0));
        ed.pointer_move(50.0, 50.0);
        assert_eq!(ed.pointer_up(), None);
    }

    #[test]
    fn select_and_remove_annotations() {
        let mut ed = editor(100, 100);
        ed.select_tool(ActiveTool::Text);
        ed.place_text(50.0, 50.0);
        let id = ed.confirm_text("note").unwrap().unwrap();

        assert!(ed.select_annotation(id));
        assert_eq!(ed.selected(), Some(id));
        assert!(!ed.select_annotation(AnnotationId::Preview));
        assert_eq!(ed.selected(), None);

        ed.select_annotation(id);
        assert!(ed.remove_annotation(id));
        assert_eq!(ed.selected(), None);
        assert!(!ed.remove_annotation(id));
    }

    #[test]
    fn preview_highlight_is_not_composited() {
        let mut ed = editor(50, 50);
        ed.select_tool(ActiveTool::Highlight);
        ed.pointer_down(0.0, 0.0);
        ed.pointer_move(100.0, 100.0);

        let out = ed.compose(&EditorConfig::default());
        assert_eq!(out.get_pixel(25, 25).0, [255, 255, 255, 255]);
    }

    #[test]
    fn finished_highlight_tints_its_region_only() {
        let mut ed = editor(100, 100);
        ed.select_tool(ActiveTool::Highlight);
        ed.pointer_down(10.0, 10.0);
        ed.pointer_move(40.0, 30.0);
        ed.pointer_up().unwrap();

        let out = ed.compose(&EditorConfig::default());
        let inside = out.get_pixel(25, 20);
        assert_eq!(inside[0], 255);
        assert!(inside[2] < 255, "blue channel should drop under yellow");
        assert_eq!(out.get_pixel(80, 80).0, [255, 255, 255, 255]);
    }

    #[test]
    fn crop_applies_only_with_crop_tool() {
        let mut ed = editor(200, 100);
        ed.set_crop_region(PercentRect::new(25.0, 25.0, 50.0, 50.0));
        assert_eq!(ed.compose(&EditorConfig::default()).dimensions(), (200, 100));

        ed.select_tool(ActiveTool::Crop);
        assert_eq!(ed.compose(&EditorConfig::default()).dimensions(), (100, 50));
    }

    #[test]
    fn full_crop_is_a_no_op() {
        let mut ed = editor(64, 32);
        ed.rotate_clockwise();
        let uncropped = ed.compose(&EditorConfig::default());
        ed.select_tool(ActiveTool::Crop);
        ed.set_crop_region(PercentRect::FULL);
        let cropped = ed.compose(&EditorConfig::default());
        assert_eq!(uncropped, cropped);
    }

    #[test]
    fn crop_follows_rotation() {
        let mut ed = editor(200, 100);
        ed.rotate_clockwise();
        ed.select_tool(ActiveTool::Crop);
        ed.set_crop_region(PercentRect::new(0.0, 0.0, 50.0, 50.0));
        assert_eq!(ed.compose(&EditorConfig::default()).dimensions(), (50, 100));
    }

    #[test]
    fn plain_save_is_visually_equivalent() {
        let mut img = RgbImage::from_pixel(32, 32, Rgb([200, 40, 40]));
        for y in 0..16 {
            for x in 0..32 {
                img.put_pixel(x, y, Rgb([20, 40, 200]));
            }
        }
        let bytes = ImageProcessor::from_dynamic(DynamicImage::ImageRgb8(img.clone()))
            .to_png_bytes()
            .unwrap();
        let original = PageImage::new(bytes, ImageKind::Png);

        let ed = EditSession::open(&original, 3, &EditorConfig::default()).unwrap();
        let saved = ed.save(&EditorConfig::default()).unwrap();
        assert_eq!(saved.index, 3);
        assert_eq!(saved.replaces, original.id());
        assert_ne!(saved.image.bytes(), original.bytes());

        let decoded = ImageProcessor::from_bytes(saved.image.bytes())
            .unwrap()
            .into_dynamic()
            .to_rgb8();
        assert_eq!(decoded.dimensions(), img.dimensions());
        let total: u64 = decoded
            .pixels()
            .zip(img.pixels())
            .map(|(a, b)| {
                (0..3)
                    .map(|c| (a[c] as i32 - b[c] as i32).unsigned_abs() as u64)
                    .sum::<u64>()
            })
            .sum();
        let mean = total as f64 / (32.0 * 32.0 * 3.0);
        assert!(mean < 12.0, "mean channel error {mean}");
    }

    #[test]
    fn half_turn_with_text_keeps_dimensions() {
        let mut ed = editor(120, 80);
        ed.rotate_clockwise();
        ed.rotate_clockwise();
        ed.select_tool(ActiveTool::Text);
        ed.place_text(50.0, 50.0);
        ed.confirm_text("Approved").unwrap();

        let saved = ed.save(&EditorConfig::default()).unwrap();
        let decoded = ImageProcessor::from_bytes(saved.image.bytes()).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (120, 80));
        let dark = decoded.into_rgba8().pixels().filter(|p| p[1] < 100).count();
        assert!(dark > 0, "annotation text missing from saved page");
    }

    #[test]
    fn confirmed_text_is_drawn_without_an_outline_font() {
        let mut ed = editor(400, 200);
        ed.set_text_color(Color::BLACK);
        ed.select_tool(ActiveTool::Text);
        ed.place_text(10.0, 10.0);
        ed.confirm_text("APPROVED").unwrap();

        let config = EditorConfig::default();
        assert!(config.font.is_none());
        let out = ed.compose(&config);
        let ink_near_anchor = (20..36)
            .flat_map(|y| (40..168).map(move |x| (x, y)))
            .filter(|&(x, y)| out.get_pixel(x, y)[0] < 40)
            .count();
        assert!(ink_near_anchor > 100, "only {ink_near_anchor} ink pixels");
        assert_eq!(*out.get_pixel(300, 150), Rgba([255, 255, 255, 255]));

        let saved = ImageProcessor::from_bytes(ed.save(&config).unwrap().image.bytes())
            .unwrap()
            .into_rgba8();
        let dark = saved.pixels().filter(|p| p[0] < 80).count();
        assert!(dark > 100, "only {dark} dark pixels after re-encode");
    }

    #[test]
    fn compose_output_is_rgba() {
        let ed = editor(10, 10);
        let out = ed.compose(&EditorConfig::default());
        assert_eq!(*out.get_pixel(0, 0), Rgba([255, 255, 255, 255]));
    }
}
