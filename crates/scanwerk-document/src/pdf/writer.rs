// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF writer: extracted text as a paginated document, and captured pages as
// a one-image-per-page document, using `printpdf` 0.8.
//
// printpdf 0.8 uses a data-oriented API: documents are built by constructing
// `PdfPage` structs containing `Vec<Op>` operation lists, then serialised via
// `PdfDocument::save()`.

use scanwerk_core::error::{Result, ScanwerkError};
use scanwerk_core::types::{PageImage, PaperSize};
use printpdf::{
    BuiltinFont, FontId, Mm, Op, ParsedFont, PdfDocument, PdfPage, PdfSaveOptions, PdfWarnMsg,
    Point, Pt, RawImage, RawImageData, RawImageFormat, TextItem, XObjectTransform,
};
use tracing::{debug, info, instrument, warn};

use crate::fonts::FontFile;

/// Body text size in points.
const FONT_SIZE_PT: f32 = 11.0;
const TITLE_SIZE_PT: f32 = 16.0;
const LINE_HEIGHT_PT: f32 = 14.0;
const TEXT_MARGIN_MM: f32 = 20.0;
const IMAGE_MARGIN_MM: f32 = 10.0;
/// Resolution pages are assumed to be captured at.
const IMAGE_DPI: f32 = 150.0;

/// Builds PDF documents locally from extracted text or captured pages.
pub struct PdfWriter {
    paper_size: PaperSize,
    /// Title metadata, also printed as a heading on text documents.
    title: Option<String>,
    /// Embedded for text documents; the builtin Helvetica only covers
    /// WinAnsi characters.
    font: Option<FontFile>,
}

impl PdfWriter {
    pub fn new(paper_size: PaperSize) -> Self {
        Self {
            paper_size,
            title: None,
            font: None,
        }
    }

    pub fn a4() -> Self {
        Self::new(PaperSize::A4)
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_font(mut self, font: FontFile) -> Self {
        self.font = Some(font);
        self
    }

    /// Paper dimensions in printpdf's Mm units.
    fn page_dimensions(&self) -> (Mm, Mm) {
        let (w_mm, h_mm) = self.paper_size.dimensions_mm();
        (Mm(w_mm as f32), Mm(h_mm as f32))
    }

    // -- Text to PDF ----------------------------------------------------------

    /// Lay out `text` top to bottom, word-wrapped at the page width minus
    /// margins, breaking onto new pages as needed. Uses the embedded font when
    /// one is set and parses, Helvetica otherwise.
    #[instrument(skip(self, text), fields(text_len = text.len()))]
    pub fn create_from_text(&self, text: &str) -> Result<Vec<u8>> {
        let (page_w, page_h) = self.page_dimensions();
        let title = self.title.as_deref().unwrap_or("Extracted Text");
        info!(paper = ?self.paper_size, title, "Creating text PDF");

        let margin_pt = Mm(TEXT_MARGIN_MM).into_pt().0;
        let usable_width_mm = page_w.0 - 2.0 * TEXT_MARGIN_MM;

        // Average Helvetica glyph width is roughly half the font size
        // (1pt = 0.3528mm).
        let avg_char_width_mm = 0.50 * FONT_SIZE_PT * 0.3528;
        let max_chars_per_line = ((usable_width_mm / avg_char_width_mm) as usize).max(1);

        let mut lines: Vec<Line> = Vec::new();
        if self.title.is_some() {
            lines.push(Line::Title(title.to_string()));
            lines.push(Line::Body(String::new()));
        }
        lines.extend(wrap_text(text, max_chars_per_line).into_iter().map(Line::Body));

        let mut doc = PdfDocument::new(title);
        let mut warnings: Vec<PdfWarnMsg> = Vec::new();
        let embedded: Option<FontId> = self.font.as_ref().and_then(|font| {
            match ParsedFont::from_bytes(font.bytes(), 0, &mut warnings) {
                Some(parsed) => Some(doc.add_font(&parsed)),
                None => {
                    warn!(origin = ?font.origin(), "font not embeddable, using Helvetica");
                    None
                }
            }
        });

        let page_h_pt = page_h.into_pt().0;
        let lines_per_page =
            (((page_h_pt - 2.0 * margin_pt) / LINE_HEIGHT_PT) as usize).max(1);

        let mut pages: Vec<PdfPage> = lines
            .chunks(lines_per_page)
            .map(|chunk| {
                let mut ops = Vec::with_capacity(chunk.len() * 5);
                for (row, line) in chunk.iter().enumerate() {
                    let y_pt = page_h_pt - margin_pt - (row as f32 * LINE_HEIGHT_PT);
                    let (font, size, content) = match line {
                        Line::Title(t) => (BuiltinFont::HelveticaBold, TITLE_SIZE_PT, t),
                        Line::Body(t) => (BuiltinFont::Helvetica, FONT_SIZE_PT, t),
                    };
                    ops.push(Op::StartTextSection);
                    ops.push(Op::SetTextCursor {
                        pos: Point {
                            x: Pt(margin_pt),
                            y: Pt(y_pt),
                        },
                    });
                    match &embedded {
                        Some(font_id) => {
                            ops.push(Op::SetFontSize {
                                size: Pt(size),
                                font: font_id.clone(),
                            });
                            ops.push(Op::WriteText {
                                items: vec![TextItem::Text(content.clone())],
                                font: font_id.clone(),
                            });
                        }
                        None => {
                            ops.push(Op::SetFontSizeBuiltinFont {
                                size: Pt(size),
                                font,
                            });
                            ops.push(Op::WriteTextBuiltinFont {
                                items: vec![TextItem::Text(content.clone())],
                                font,
                            });
                        }
                    }
                    ops.push(Op::EndTextSection);
                }
                PdfPage::new(page_w, page_h, ops)
            })
            .collect();

        if pages.is_empty() {
            pages.push(PdfPage::new(page_w, page_h, Vec::new()));
        }

        doc.with_pages(pages);
        debug!(
            lines = lines.len(),
            pages = doc.pages.len(),
            embedded = embedded.is_some(),
            "Text layout complete"
        );
        Ok(doc.save(&PdfSaveOptions::default(), &mut warnings))
    }

    // -- Images to PDF --------------------------------------------------------

    /// One page per captured image, each scaled to fit inside the margins
    /// (aspect preserved, never upscaled) and centred.
    #[instrument(skip(self, images), fields(pages = images.len()))]
    pub fn create_from_images(&self, images: &[PageImage]) -> Result<Vec<u8>> {
        if images.is_empty() {
            return Err(ScanwerkError::PdfError("no pages to assemble".into()));
        }
        let (page_w, page_h) = self.page_dimensions();
        let title = self.title.as_deref().unwrap_or("Scanned Document");
        info!(paper = ?self.paper_size, title, "Assembling image PDF");

        let mut doc = PdfDocument::new(title);
        let mut pages = Vec::with_capacity(images.len());

        let margin_pt = Mm(IMAGE_MARGIN_MM).into_pt().0;
        let usable_w_pt = Mm(page_w.0 - 2.0 * IMAGE_MARGIN_MM).into_pt().0;
        let usable_h_pt = Mm(page_h.0 - 2.0 * IMAGE_MARGIN_MM).into_pt().0;

        for (index, page) in images.iter().enumerate() {
            let decoded = ::image::load_from_memory(page.bytes()).map_err(|err| {
                ScanwerkError::ImageError(format!("failed to decode page {index} for PDF: {err}"))
            })?;
            let (img_w, img_h) = (decoded.width() as usize, decoded.height() as usize);
            let raw = RawImage {
                pixels: RawImageData::U8(decoded.to_rgb8().into_raw()),
                width: img_w,
                height: img_h,
                data_format: RawImageFormat::RGB8,
                tag: Vec::new(),
            };
            let xobject_id = doc.add_image(&raw);

            let img_w_pt = img_w as f32 / IMAGE_DPI * 72.0;
            let img_h_pt = img_h as f32 / IMAGE_DPI * 72.0;
            let scale = (usable_w_pt / img_w_pt).min(usable_h_pt / img_h_pt).min(1.0);

            let x_offset = margin_pt + (usable_w_pt - img_w_pt * scale) / 2.0;
            let y_offset = margin_pt + (usable_h_pt - img_h_pt * scale) / 2.0;

            let ops = vec![Op::UseXobject {
                id: xobject_id,
                transform: XObjectTransform {
                    translate_x: Some(Pt(x_offset)),
                    translate_y: Some(Pt(y_offset)),
                    scale_x: Some(scale),
                    scale_y: Some(scale),
                    dpi: Some(IMAGE_DPI),
                    rotate: None,
                },
            }];
            pages.push(PdfPage::new(page_w, page_h, ops));
            debug!(index, img_w, img_h, scale, "Page placed");
        }

        doc.with_pages(pages);
        let mut warnings: Vec<PdfWarnMsg> = Vec::new();
        Ok(doc.save(&PdfSaveOptions::default(), &mut warnings))
    }
}

enum Line {
    Title(String),
    Body(String),
}

// -- Text wrapping helper -----------------------------------------------------

/// Wrap a multi-line string so that no line exceeds `max_width` characters.
///
/// Splits on existing newlines first, then word-wraps each paragraph. Words
/// longer than `max_width` are force-broken on character boundaries.
fn wrap_text(text: &str, max_width: usize) -> Vec<String> {
    let mut result = Vec::new();

    for paragraph in text.lines() {
        let mut current = String::new();
        let mut current_len = 0usize;

        for word in paragraph.split_whitespace() {
            let word_len = word.chars().count();

            if word_len > max_width {
                if !current.is_empty() {
                    result.push(std::mem::take(&mut current));
                    current_len = 0;
                }
                let chars: Vec<char> = word.chars().collect();
                let mut chunks = chars.chunks(max_width).peekable();
                while let Some(chunk) = chunks.next() {
                    if chunks.peek().is_some() {
                        result.push(chunk.iter().collect());
                    } else {
                        current = chunk.iter().collect();
                        current_len = chunk.len();
                    }
                }
            } else if current.is_empty() {
                current.push_str(word);
                current_len = word_len;
            } else if current_len + 1 + word_len <= max_width {
                current.push(' ');
                current.push_str(word);
                current_len += 1 + word_len;
            } else {
                result.push(std::mem::replace(&mut current, word.to_string()));
                current_len = word_len;
            }
        }

        // Blank paragraphs still occupy a line.
        result.push(current);
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::ImageProcessor;
    use crate::pdf::PdfReader;
    use image::{DynamicImage, Rgb, RgbImage};
    use scanwerk_core::types::ImageKind;

    #[test]
    fn wrap_respects_width() {
        let lines = wrap_text("the quick brown fox jumps over the lazy dog", 10);
        assert!(lines.iter().all(|l| l.chars().count() <= 10));
        assert_eq!(lines.join(" "), "the quick brown fox jumps over the lazy dog");
    }

    #[test]
    fn wrap_breaks_long_words_on_char_boundaries() {
        let lines = wrap_text("ééééééééééé", 4);
        assert_eq!(lines, vec!["éééé", "éééé", "ééé"]);
    }

    #[test]
    fn wrap_keeps_blank_lines() {
        let lines = wrap_text("a\n\nb", 10);
        assert_eq!(lines, vec!["a", "", "b"]);
    }

    #[test]
    fn long_text_overflows_onto_more_pages() {
        let text = (0..200)
            .map(|i| format!("line {i}"))
            .collect::<Vec<_>>()
            .join("\n");
        let pdf = PdfWriter::a4().with_title("Scan").create_from_text(&text).unwrap();
        let reader = PdfReader::from_bytes(&pdf).unwrap();
        assert!(reader.page_count() >= 3, "got {} pages", reader.page_count());
    }

    #[test]
    fn empty_text_gives_single_blank_page() {
        let pdf = PdfWriter::a4().create_from_text("").unwrap();
        assert_eq!(PdfReader::from_bytes(&pdf).unwrap().page_count(), 1);
    }

    #[test]
    fn located_font_is_embedded_for_non_latin_text() {
        // Only meaningful on hosts with an outline font installed.
        let Some(font) = FontFile::locate(&scanwerk_core::AppConfig::default()) else {
            return;
        };
        let text = "Grüße aus Köln\nΚαλημέρα κόσμε\nДобрый день";
        let plain = PdfWriter::a4().create_from_text(text).unwrap();
        let embedded = PdfWriter::a4().with_font(font).create_from_text(text).unwrap();
        assert_eq!(PdfReader::from_bytes(&embedded).unwrap().page_count(), 1);
        assert!(
            embedded.len() > plain.len() + 1024,
            "font data missing: {} vs {} bytes",
            embedded.len(),
            plain.len()
        );
    }

    #[test]
    fn one_page_per_image() {
        let page = |w, h| {
            let bytes = ImageProcessor::from_dynamic(DynamicImage::ImageRgb8(RgbImage::from_pixel(
                w,
                h,
                Rgb([120, 120, 120]),
            )))
            .to_png_bytes()
            .unwrap();
            PageImage::new(bytes, ImageKind::Png)
        };
        let pdf = PdfWriter::new(PaperSize::Letter)
            .create_from_images(&[page(30, 40), page(40, 30)])
            .unwrap();
        assert_eq!(PdfReader::from_bytes(&pdf).unwrap().page_count(), 2);
    }

    #[test]
    fn no_images_is_an_error() {
        assert!(matches!(
            PdfWriter::a4().create_from_images(&[]),
            Err(ScanwerkError::PdfError(_))
        ));
    }
}
