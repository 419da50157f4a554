// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Compositing primitives: alpha-blended highlight rectangles and outlined
// text, both positioned in percentage space of the output canvas.

use ab_glyph::{FontArc, PxScale};
use font8x8::{BASIC_FONTS, LATIN_FONTS, UnicodeFonts};
use image::{Pixel, Rgba, RgbaImage};
use imageproc::drawing::draw_text_mut;
use scanwerk_core::types::{Highlight, PercentRect, TextAnnotation};
use tracing::debug;

/// Halo drawn behind text so it stays legible on any background.
const HALO_COLOR: Rgba<u8> = Rgba([255, 255, 255, 220]);

/// Blend every finished highlight onto the canvas. `Preview` entries are skipped.
pub fn blend_highlights(canvas: &mut RgbaImage, highlights: &[Highlight]) {
    let (w, h) = canvas.dimensions();
    if w == 0 || h == 0 {
        return;
    }
    for highlight in highlights.iter().filter(|h| !h.id.is_preview()) {
        let rect = highlight.rect().to_pixels(w, h);
        let color = Rgba(highlight.color.to_array());
        for y in rect.y..rect.y + rect.height {
            for x in rect.x..rect.x + rect.width {
                canvas.get_pixel_mut(x, y).blend(&color);
            }
        }
        debug!(id = %highlight.id, ?rect, "highlight blended");
    }
}

/// Pixel size for a logical font size on a canvas `canvas_width` wide.
pub fn scaled_font_px(font_size: f32, canvas_width: u32, reference_width: f32) -> f32 {
    let reference = if reference_width > 0.0 { reference_width } else { 1.0 };
    (font_size * canvas_width as f32 / reference).max(1.0)
}

/// Draw each annotation with a light halo and a bold double strike.
///
/// `(x, y)` of an annotation is the top-left corner of its text. Without an
/// outline `font` the built-in 8x8 bitmap font is used, so confirmed text is
/// always rendered.
pub fn draw_text_annotations(
    canvas: &mut RgbaImage,
    annotations: &[TextAnnotation],
    font: Option<&FontArc>,
    reference_width: f32,
) {
    let (w, h) = canvas.dimensions();
    if w == 0 || h == 0 {
        return;
    }
    for annotation in annotations {
        let px = scaled_font_px(annotation.font_size, w, reference_width);
        let anchor = PercentRect::new(annotation.x, annotation.y, 0.0, 0.0).to_pixels(w, h);
        let (x, y) = (anchor.x as i32, anchor.y as i32);
        let text = annotation.text.as_str();

        let stamp = |canvas: &mut RgbaImage, color: Rgba<u8>, x: i32, y: i32| match font {
            Some(font) => draw_text_mut(canvas, color, x, y, PxScale::from(px), font, text),
            None => draw_bitmap_text(canvas, color, x, y, bitmap_cell(px), text),
        };

        let halo = (px / 16.0).ceil().max(1.0) as i32;
        for (dx, dy) in [
            (-halo, -halo),
            (0, -halo),
            (halo, -halo),
            (-halo, 0),
            (halo, 0),
            (-halo, halo),
            (0, halo),
            (halo, halo),
        ] {
            stamp(canvas, HALO_COLOR, x + dx, y + dy);
        }

        let color = Rgba(annotation.color.to_array());
        let bold = (px / 32.0).ceil().max(1.0) as i32;
        for offset in 0..=bold {
            stamp(canvas, color, x + offset, y);
        }
        debug!(id = %annotation.id, px, x, y, outline = font.is_some(), "text annotation drawn");
    }
}

/// Pixels per bitmap font dot for a font size of `px`.
pub fn bitmap_cell(px: f32) -> i32 {
    (px / 8.0).round().max(1.0) as i32
}

/// Blend `text` onto the canvas with the 8x8 bitmap font, each dot drawn as a
/// `cell` x `cell` square. Characters outside Basic Latin and Latin-1 are
/// drawn as `?`.
pub fn draw_bitmap_text(canvas: &mut RgbaImage, color: Rgba<u8>, x: i32, y: i32, cell: i32, text: &str) {
    let (w, h) = (canvas.width() as i32, canvas.height() as i32);
    let mut cursor_x = x;
    for ch in text.chars() {
        let glyph = BASIC_FONTS
            .get(ch)
            .or_else(|| LATIN_FONTS.get(ch))
            .or_else(|| BASIC_FONTS.get('?'));
        if let Some(glyph) = glyph {
            for (row, bits) in glyph.iter().enumerate() {
                for col in 0..8 {
                    if (bits >> col) & 1 == 0 {
                        continue;
                    }
                    let px = cursor_x + col * cell;
                    let py = y + row as i32 * cell;
                    for ty in py.max(0)..(py + cell).min(h) {
                        for tx in px.max(0)..(px + cell).min(w) {
                            canvas.get_pixel_mut(tx as u32, ty as u32).blend(&color);
                        }
                    }
                }
            }
        }
        cursor_x += 8 * cell;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scanwerk_core::types::{AnnotationId, Color};

    #[test]
    fn font_scales_with_canvas_width() {
        assert_eq!(scaled_font_px(24.0, 800, 800.0), 24.0);
        assert_eq!(scaled_font_px(24.0, 1600, 800.0), 48.0);
        assert_eq!(scaled_font_px(0.0, 1600, 800.0), 1.0);
    }

    #[test]
    fn opaque_highlight_replaces_pixels() {
        let mut canvas = RgbaImage::from_pixel(10, 10, Rgba([0, 0, 0, 255]));
        let highlight = Highlight {
            id: AnnotationId::Assigned(1),
            x: 0.0,
            y: 0.0,
            width: 50.0,
            height: 100.0,
            color: Color::RED,
        };
        blend_highlights(&mut canvas, &[highlight]);
        assert_eq!(canvas.get_pixel(2, 5).0, [255, 0, 0, 255]);
        assert_eq!(canvas.get_pixel(7, 5).0, [0, 0, 0, 255]);
    }

    #[test]
    fn preview_is_skipped() {
        let mut canvas = RgbaImage::from_pixel(4, 4, Rgba([0, 0, 0, 255]));
        let highlight = Highlight {
            id: AnnotationId::Preview,
            x: 0.0,
            y: 0.0,
            width: 100.0,
            height: 100.0,
            color: Color::RED,
        };
        blend_highlights(&mut canvas, &[highlight]);
        assert_eq!(canvas.get_pixel(1, 1).0, [0, 0, 0, 255]);
    }

    fn luma(p: &Rgba<u8>) -> u32 {
        (p.0[0] as u32 + p.0[1] as u32 + p.0[2] as u32) / 3
    }

    fn approved(color: Color) -> TextAnnotation {
        TextAnnotation {
            id: AnnotationId::Assigned(1),
            x: 10.0,
            y: 10.0,
            text: "APPROVED".into(),
            color,
            font_size: 24.0,
        }
    }

    #[test]
    fn bitmap_text_is_inked_at_its_anchor_with_a_halo() {
        let grey = Rgba([128, 128, 128, 255]);
        let mut canvas = RgbaImage::from_pixel(400, 200, grey);
        draw_text_annotations(&mut canvas, &[approved(Color::BLACK)], None, 800.0);

        // 24pt on a 400px canvas at 800px reference: 12px, 2px dots, so
        // eight glyphs span 128px from the (40, 20) anchor.
        assert_eq!(bitmap_cell(scaled_font_px(24.0, 400, 800.0)), 2);
        let (mut ink, mut halo) = (0, 0);
        for y in 18..40 {
            for x in 38..172 {
                let l = luma(canvas.get_pixel(x, y));
                if l < 40 {
                    ink += 1;
                } else if l > 200 {
                    halo += 1;
                }
            }
        }
        assert!(ink > 100, "only {ink} ink pixels");
        assert!(halo > 50, "only {halo} halo pixels");

        // Nothing outside the text box is touched.
        assert_eq!(*canvas.get_pixel(10, 10), grey);
        assert_eq!(*canvas.get_pixel(300, 150), grey);
        assert_eq!(*canvas.get_pixel(200, 60), grey);
    }

    #[test]
    fn bitmap_text_is_clipped_at_the_canvas_edge() {
        let mut canvas = RgbaImage::from_pixel(20, 10, Rgba([255, 255, 255, 255]));
        let mut note = approved(Color::BLACK);
        note.x = 90.0;
        note.y = 90.0;
        draw_text_annotations(&mut canvas, &[note], None, 20.0);
        assert_eq!(canvas.dimensions(), (20, 10));
    }

    #[test]
    fn unknown_characters_fall_back_to_question_mark() {
        let white = Rgba([255, 255, 255, 255]);
        let mut cjk = RgbaImage::from_pixel(16, 16, white);
        let mut question = RgbaImage::from_pixel(16, 16, white);
        draw_bitmap_text(&mut cjk, Rgba([0, 0, 0, 255]), 0, 0, 1, "\u{6f22}");
        draw_bitmap_text(&mut question, Rgba([0, 0, 0, 255]), 0, 0, 1, "?");
        assert_eq!(cjk, question);
        assert!(cjk.pixels().any(|p| luma(p) == 0));
    }
}
