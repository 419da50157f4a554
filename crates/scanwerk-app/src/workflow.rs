// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Scan workflow: one state value for the whole scanning flow:
//
//   select ─▶ camera ─▶ multipreview ─▶ editor
//                            │   ▲
//                            ▼   │ (revert on failure)
//                         processing ─▶ result
//
// The workflow owns the page session, the (at most one) open editor, and the
// gateway. Every mode change goes through `transition`, which rejects edges
// that are not in the table below.

use std::mem::discriminant;

use scanwerk_core::context::AppContext;
use scanwerk_core::error::{Result, ScanwerkError};
use scanwerk_core::session::{PageSession, RemoveOutcome};
use scanwerk_core::types::{ImageKind, PageImage};
use scanwerk_core::AppConfig;
use scanwerk_document::capture::validate_capture;
use scanwerk_document::compress::{CompressionSettings, compress_for_upload};
use scanwerk_document::editor::{EditSession, EditorConfig};
use scanwerk_document::export::{ExportFormat, render_export};
use scanwerk_document::fonts::FontFile;
use scanwerk_gateway::{Extraction, GeneratedPdf, ProcessingGateway, ProgressFn, Translation};
use tracing::{debug, info, instrument, warn};

/// File name stem for exported artifacts.
const EXPORT_STEM: &str = "scan";

/// Remote operation in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessingAction {
    Ocr,
    OcrWithTables,
    Pdf,
    Translate,
    Summarize,
}

impl ProcessingAction {
    /// Whether the action uploads the session's pages (as opposed to working
    /// on an existing text result).
    pub fn uploads_pages(&self) -> bool {
        matches!(self, Self::Ocr | Self::OcrWithTables | Self::Pdf)
    }
}

/// Extracted text plus whatever was derived from it afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct TextOutcome {
    pub extraction: Extraction,
    pub translation: Option<Translation>,
    pub summary: Option<String>,
}

impl From<Extraction> for TextOutcome {
    fn from(extraction: Extraction) -> Self {
        Self {
            extraction,
            translation: None,
            summary: None,
        }
    }
}

/// What the result screen shows.
#[derive(Debug, Clone)]
pub enum ScanOutcome {
    Text(TextOutcome),
    Pdf(GeneratedPdf),
}

/// Workflow mode. Exactly one is active.
#[derive(Debug, Clone)]
pub enum Mode {
    Select,
    Camera,
    MultiPreview,
    Editor { index: usize },
    Processing {
        action: ProcessingAction,
        previous: Box<Mode>,
    },
    Result(ScanOutcome),
}

impl Mode {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Select => "select",
            Self::Camera => "camera",
            Self::MultiPreview => "multipreview",
            Self::Editor { .. } => "editor",
            Self::Processing { .. } => "processing",
            Self::Result(_) => "result",
        }
    }

    fn same_kind(&self, other: &Mode) -> bool {
        discriminant(self) == discriminant(other)
    }

    /// Allowed edges.
    pub fn allows(&self, next: &Mode) -> bool {
        use Mode::*;
        match (self, next) {
            (Select, Camera | MultiPreview) => true,
            (Camera, Select | MultiPreview) => true,
            (MultiPreview, Camera | Editor { .. } | Select) => true,
            (MultiPreview, Processing { action, .. }) => action.uploads_pages(),
            (Editor { .. }, MultiPreview) => true,
            (Processing { .. }, Result(_)) => true,
            (Processing { previous, .. }, other) => previous.same_kind(other),
            (Result(_), Processing { action, .. }) => !action.uploads_pages(),
            (Result(_), Select | MultiPreview) => true,
            _ => false,
        }
    }
}

/// A rendered export, ready to save or share.
#[derive(Debug, Clone)]
pub struct Artifact {
    pub file_name: String,
    pub mime_type: &'static str,
    pub bytes: Vec<u8>,
}

/// The scanning flow.
pub struct Workflow<G> {
    session: PageSession,
    mode: Mode,
    editor: Option<EditSession>,
    editor_config: EditorConfig,
    /// Embedded in text PDF exports; Helvetica when unset.
    pdf_font: Option<FontFile>,
    compression: CompressionSettings,
    max_image_bytes: usize,
    gateway: G,
}

impl<G: ProcessingGateway> Workflow<G> {
    pub fn new(config: &AppConfig, editor_config: EditorConfig, gateway: G) -> Self {
        Self {
            session: PageSession::new(),
            mode: Mode::Select,
            editor: None,
            editor_config,
            pdf_font: None,
            compression: CompressionSettings::from(config),
            max_image_bytes: config.max_image_bytes,
            gateway,
        }
    }

    /// Workflow configured from an initialised context. The located outline
    /// font serves both editor annotations and PDF exports.
    pub fn from_context(ctx: &AppContext, gateway: G) -> Self {
        let font = FontFile::locate(&ctx.config);
        let editor_config = EditorConfig::from_app_config(&ctx.config, font.as_ref());
        let mut workflow = Self::new(&ctx.config, editor_config, gateway);
        workflow.pdf_font = font;
        workflow
    }

    // -- Accessors ------------------------------------------------------------

    pub fn mode(&self) -> &Mode {
        &self.mode
    }

    pub fn session(&self) -> &PageSession {
        &self.session
    }

    pub fn editor(&self) -> Option<&EditSession> {
        self.editor.as_ref()
    }

    pub fn editor_mut(&mut self) -> Option<&mut EditSession> {
        self.editor.as_mut()
    }

    pub fn gateway(&self) -> &G {
        &self.gateway
    }

    pub fn result(&self) -> Option<&ScanOutcome> {
        match &self.mode {
            Mode::Result(outcome) => Some(outcome),
            _ => None,
        }
    }

    fn invalid(&self, to: &str) -> ScanwerkError {
        ScanwerkError::InvalidTransition {
            from: self.mode.name().to_string(),
            to: to.to_string(),
        }
    }

    fn transition(&mut self, next: Mode) -> Result<()> {
        if !self.mode.allows(&next) {
            return Err(self.invalid(next.name()));
        }
        debug!(from = self.mode.name(), to = next.name(), "mode change");
        self.mode = next;
        Ok(())
    }

    /// Where to go when leaving capture or editing.
    fn pages_mode(&self) -> Mode {
        if self.session.is_empty() {
            Mode::Select
        } else {
            Mode::MultiPreview
        }
    }

    // -- Capture --------------------------------------------------------------

    pub fn start_camera(&mut self) -> Result<()> {
        self.transition(Mode::Camera)
    }

    /// Leave camera mode: to the page list, or back to select if nothing was
    /// captured.
    pub fn finish_camera(&mut self) -> Result<()> {
        if !matches!(self.mode, Mode::Camera) {
            return Err(self.invalid(self.pages_mode().name()));
        }
        self.transition(self.pages_mode())
    }

    /// Validate and append a captured image. Rejected captures leave the
    /// session and mode unchanged.
    #[instrument(skip(self, bytes), fields(size = bytes.len(), mode = self.mode.name()))]
    pub fn add_capture(&mut self, bytes: Vec<u8>, declared_mime: Option<&str>) -> Result<usize> {
        if !matches!(self.mode, Mode::Select | Mode::Camera | Mode::MultiPreview) {
            return Err(self.invalid("multipreview"));
        }
        let page = validate_capture(bytes, declared_mime, self.max_image_bytes)?;
        let index = self.session.append(page);
        if matches!(self.mode, Mode::Select) {
            self.transition(Mode::MultiPreview)?;
        }
        info!(index, pages = self.session.len(), "page added");
        Ok(index)
    }

    // -- Page list ------------------------------------------------------------

    /// Bounds-checked; out of range is ignored.
    pub fn set_cursor(&mut self, index: usize) -> bool {
        self.session.set_cursor(index)
    }

    pub fn move_page(&mut self, from: usize, to: usize) -> Result<()> {
        if !matches!(self.mode, Mode::MultiPreview) {
            return Err(self.invalid("multipreview"));
        }
        self.session.move_page(from, to)
    }

    /// Remove a page. Removing the last one returns to select mode.
    pub fn remove_page(&mut self, index: usize) -> Result<()> {
        if !matches!(self.mode, Mode::MultiPreview) {
            return Err(self.invalid("multipreview"));
        }
        if self.session.remove_at(index)? == RemoveOutcome::Emptied {
            self.transition(Mode::Select)?;
        }
        Ok(())
    }

    /// Leave a result and return to the page list.
    pub fn back_to_pages(&mut self) -> Result<()> {
        if !matches!(self.mode, Mode::Result(_)) {
            return Err(self.invalid("multipreview"));
        }
        self.transition(self.pages_mode())
    }

    /// Drop all pages and start over.
    pub fn reset(&mut self) -> Result<()> {
        if !matches!(self.mode, Mode::Select) {
            self.transition(Mode::Select)?;
        }
        self.session.clear();
        info!("workflow reset");
        Ok(())
    }

    // -- Editor ---------------------------------------------------------------

    /// Open the editor on page `index`. Only one editor may be open.
    #[instrument(skip(self))]
    pub fn open_editor(&mut self, index: usize) -> Result<&mut EditSession> {
        if self.editor.is_some() {
            return Err(ScanwerkError::EditorBusy);
        }
        if !self.mode.allows(&Mode::Editor { index }) {
            return Err(self.invalid("editor"));
        }
        let page = self.session.get(index).ok_or(ScanwerkError::IndexOutOfRange {
            index,
            len: self.session.len(),
        })?;
        let editor = EditSession::open(page, index, &self.editor_config)?;
        self.transition(Mode::Editor { index })?;
        self.session.set_cursor(index);
        Ok(self.editor.insert(editor))
    }

    /// Discard the open editor.
    pub fn cancel_editor(&mut self) -> Result<()> {
        if self.editor.is_none() {
            return Err(self.invalid("multipreview"));
        }
        self.transition(Mode::MultiPreview)?;
        self.editor = None;
        info!("editor cancelled");
        Ok(())
    }

    /// Apply the open editor to its page and close it.
    ///
    /// On failure the page session is untouched and the editor stays open.
    #[instrument(skip(self))]
    pub fn save_editor(&mut self) -> Result<usize> {
        let editor = self.editor.as_ref().ok_or_else(|| self.invalid("multipreview"))?;
        let saved = editor.save(&self.editor_config)?;

        let index = saved.index;
        if self.session.get(index).map(PageImage::id) != Some(saved.replaces) {
            return Err(ScanwerkError::IndexOutOfRange {
                index,
                len: self.session.len(),
            });
        }
        self.session.replace_at(index, saved.image)?;
        self.editor = None;
        self.transition(Mode::MultiPreview)?;
        self.session.set_cursor(index);
        info!(index, "edit applied");
        Ok(index)
    }

    // -- Processing -----------------------------------------------------------

    fn begin(&mut self, action: ProcessingAction) -> Result<Mode> {
        let previous = self.mode.clone();
        self.transition(Mode::Processing {
            action,
            previous: Box::new(previous.clone()),
        })?;
        info!(?action, "processing started");
        Ok(previous)
    }

    fn complete(&mut self, previous: Mode, outcome: Result<ScanOutcome>) -> Result<&ScanOutcome> {
        match outcome {
            Ok(outcome) => {
                self.transition(Mode::Result(outcome))?;
                self.result().ok_or_else(|| self.invalid("result"))
            }
            Err(err) => {
                warn!(%err, back_to = previous.name(), "processing failed");
                self.transition(previous)?;
                Err(err)
            }
        }
    }

    /// Compressed copies of every page, in session order.
    fn prepare_uploads(&self) -> Result<Vec<PageImage>> {
        self.session.iter().map(|page| self.upload_copy(page)).collect()
    }

    /// The page as it goes over the wire: recompressed when oversized.
    fn upload_copy(&self, page: &PageImage) -> Result<PageImage> {
        let compressed = compress_for_upload(page.bytes(), &self.compression)?;
        Ok(if compressed.was_compressed {
            PageImage::new(compressed.bytes, ImageKind::Jpeg)
        } else {
            page.clone()
        })
    }

    fn text_outcome(&self) -> Result<TextOutcome> {
        match &self.mode {
            Mode::Result(ScanOutcome::Text(text)) => Ok(text.clone()),
            _ => Err(self.invalid("processing")),
        }
    }

    /// OCR every page: single-image extraction for one page, multi-page
    /// extraction otherwise.
    pub async fn run_ocr(&mut self) -> Result<&ScanOutcome> {
        let previous = self.begin(ProcessingAction::Ocr)?;
        let outcome = match self.prepare_uploads() {
            Ok(uploads) if uploads.len() == 1 => self.gateway.extract_text(&uploads[0]).await,
            Ok(uploads) => self.gateway.extract_multiple(&uploads).await,
            Err(err) => Err(err),
        };
        self.complete(previous, outcome.map(|e| ScanOutcome::Text(e.into())))
    }

    /// OCR with table detection on the current page.
    pub async fn run_ocr_with_tables(&mut self) -> Result<&ScanOutcome> {
        let previous = self.begin(ProcessingAction::OcrWithTables)?;
        let len = self.session.len();
        let cursor = self.session.cursor().min(len.saturating_sub(1));
        let upload = match self.session.get(cursor) {
            Some(page) => self.upload_copy(page),
            None => Err(ScanwerkError::IndexOutOfRange { index: cursor, len }),
        };
        let outcome = match upload {
            Ok(page) => self.gateway.extract_with_tables(&page).await,
            Err(err) => Err(err),
        };
        self.complete(previous, outcome.map(|e| ScanOutcome::Text(e.into())))
    }

    /// Assemble all pages into a PDF on the backend.
    pub async fn run_pdf(&mut self, progress: Option<ProgressFn>) -> Result<&ScanOutcome> {
        let previous = self.begin(ProcessingAction::Pdf)?;
        let outcome = match self.prepare_uploads() {
            Ok(uploads) => self.gateway.create_pdf(&uploads, progress).await,
            Err(err) => Err(err),
        };
        self.complete(previous, outcome.map(ScanOutcome::Pdf))
    }

    /// Translate the extracted text of the current result.
    pub async fn translate(&mut self, target_language: &str) -> Result<&ScanOutcome> {
        let current = self.text_outcome()?;
        if current.extraction.result.text.trim().is_empty() {
            return Err(ScanwerkError::EmptyText);
        }
        let previous = self.begin(ProcessingAction::Translate)?;
        let outcome = self
            .gateway
            .translate(
                &current.extraction.result.text,
                target_language,
                current.extraction.scan_id.as_deref(),
            )
            .await
            .map(|translation| {
                ScanOutcome::Text(TextOutcome {
                    translation: Some(translation),
                    ..current
                })
            });
        self.complete(previous, outcome)
    }

    /// Summarize the extracted text of the current result.
    pub async fn summarize(&mut self) -> Result<&ScanOutcome> {
        let current = self.text_outcome()?;
        if current.extraction.result.text.trim().is_empty() {
            return Err(ScanwerkError::EmptyText);
        }
        let previous = self.begin(ProcessingAction::Summarize)?;
        let outcome = self
            .gateway
            .summarize(&current.extraction.result.text)
            .await
            .map(|summary| {
                ScanOutcome::Text(TextOutcome {
                    summary: Some(summary),
                    ..current
                })
            });
        self.complete(previous, outcome)
    }

    // -- Export ---------------------------------------------------------------

    /// Render the current result. Text results export in any format; a PDF
    /// result only as PDF.
    pub fn export(&self, format: ExportFormat) -> Result<Artifact> {
        let bytes = match self.result() {
            Some(ScanOutcome::Text(text)) => render_export(
                format,
                EXPORT_STEM,
                &text.extraction.result,
                self.pdf_font.as_ref(),
            )?,
            Some(ScanOutcome::Pdf(pdf)) if format == ExportFormat::Pdf => pdf.bytes.clone(),
            Some(ScanOutcome::Pdf(_)) => {
                return Err(ScanwerkError::Export(format!(
                    "a PDF result cannot be exported as .{}",
                    format.extension()
                )));
            }
            None => return Err(ScanwerkError::Export("no result to export".into())),
        };
        Ok(Artifact {
            file_name: format.file_name(EXPORT_STEM),
            mime_type: format.mime_type(),
            bytes,
        })
    }
}
