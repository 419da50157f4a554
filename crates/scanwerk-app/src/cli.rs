// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Headless driver: runs the scanning flow over image files given on the
// command line, using the desktop bridge's file picker as the capture source.
// `edit` drives the page editor the same way the preview screen would.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Parser, Subcommand, ValueEnum};
use scanwerk_bridge::StubBridge;
use scanwerk_core::context::{AppContext, DeviceContext};
use scanwerk_core::error::{Result, ScanwerkError};
use scanwerk_core::human_errors::humanize_error;
use scanwerk_core::types::{ActiveTool, PaperSize, PercentRect, Rotation};
use scanwerk_document::{EditSession, ExportFormat, PdfWriter, write_export};
use scanwerk_gateway::{HttpGateway, ProcessingGateway, ProgressFn};
use tracing::{info, warn};

use crate::capture::{CaptureCoordinator, CaptureSource};
use crate::services::data_dir;
use crate::workflow::{ScanOutcome, Workflow};

#[derive(Debug, Parser)]
#[command(name = "scanwerk", version)]
#[command(about = "Scan document pages and send them for OCR, translation, or PDF assembly")]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Extract text from page images and export it.
    Ocr {
        #[arg(value_name = "IMAGE", required = true)]
        images: Vec<PathBuf>,
        /// Detect tables on the first page.
        #[arg(long)]
        tables: bool,
        #[arg(long, value_enum, default_value_t = FormatArg::Txt)]
        format: FormatArg,
        /// Also translate the text into this language code.
        #[arg(long, value_name = "LANG")]
        translate: Option<String>,
        /// Also summarize the text.
        #[arg(long)]
        summarize: bool,
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Assemble page images into a PDF.
    Pdf {
        #[arg(value_name = "IMAGE", required = true)]
        images: Vec<PathBuf>,
        /// Build the PDF locally instead of on the backend.
        #[arg(long)]
        local: bool,
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Rotate, annotate, highlight, or crop a single page and save it as JPEG.
    Edit {
        #[arg(value_name = "IMAGE")]
        image: PathBuf,
        /// Clockwise rotation, a multiple of 90.
        #[arg(long, value_name = "DEG", default_value_t = 0, allow_hyphen_values = true)]
        rotate: i32,
        /// Text at X,Y percent of the page. Repeatable.
        #[arg(long = "text", value_name = "X,Y,TEXT", value_parser = parse_text)]
        texts: Vec<TextArg>,
        /// Highlight rectangle in percent. Repeatable.
        #[arg(long = "highlight", value_name = "X,Y,W,H", value_parser = parse_rect)]
        highlights: Vec<PercentRect>,
        /// Crop rectangle in percent, applied after rotation.
        #[arg(long, value_name = "X,Y,W,H", value_parser = parse_rect)]
        crop: Option<PercentRect>,
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Print the effective configuration as JSON.
    Config,
    /// Forget the stored auth token.
    Logout,
}

/// A `--text` argument.
#[derive(Debug, Clone, PartialEq)]
struct TextArg {
    x: f32,
    y: f32,
    text: String,
}

fn parse_text(arg: &str) -> std::result::Result<TextArg, String> {
    let mut parts = arg.splitn(3, ',');
    let (Some(x), Some(y), Some(text)) = (parts.next(), parts.next(), parts.next()) else {
        return Err(format!("expected X,Y,TEXT, got {arg:?}"));
    };
    Ok(TextArg {
        x: parse_percent(x)?,
        y: parse_percent(y)?,
        text: text.to_string(),
    })
}

fn parse_rect(arg: &str) -> std::result::Result<PercentRect, String> {
    let values = arg
        .split(',')
        .map(parse_percent)
        .collect::<std::result::Result<Vec<_>, _>>()?;
    match values[..] {
        [x, y, width, height] => Ok(PercentRect::new(x, y, width, height)),
        _ => Err(format!("expected X,Y,W,H, got {arg:?}")),
    }
}

fn parse_percent(value: &str) -> std::result::Result<f32, String> {
    value
        .trim()
        .parse::<f32>()
        .map_err(|e| format!("{value:?} is not a number: {e}"))
}

/// Everything the `edit` command applies to its page.
#[derive(Debug, Clone, Default)]
struct EditPlan {
    rotation: Rotation,
    texts: Vec<TextArg>,
    highlights: Vec<PercentRect>,
    crop: Option<PercentRect>,
}

/// Feed the plan to the editor as tool interactions. The crop tool goes
/// last since compose only crops while it is active.
fn apply_edits(editor: &mut EditSession, plan: &EditPlan) -> Result<()> {
    editor.set_rotation(plan.rotation);

    if !plan.texts.is_empty() {
        editor.select_tool(ActiveTool::Text);
        for text in &plan.texts {
            editor.place_text(text.x, text.y);
            editor.confirm_text(&text.text)?;
        }
    }

    editor.select_tool(ActiveTool::Highlight);
    for rect in &plan.highlights {
        editor.pointer_down(rect.x, rect.y);
        editor.pointer_move(rect.x + rect.width, rect.y + rect.height);
        if editor.pointer_up().is_none() {
            warn!(?rect, "highlight below the minimum size, skipped");
        }
    }

    match plan.crop {
        Some(rect) => {
            editor.set_crop_region(rect);
            editor.select_tool(ActiveTool::Crop);
        }
        None => editor.select_tool(ActiveTool::None),
    }
    Ok(())
}

/// Edit the first page of the workflow and return the saved JPEG.
fn edit_first_page<G: ProcessingGateway>(workflow: &mut Workflow<G>, plan: &EditPlan) -> Result<Vec<u8>> {
    let editor = workflow.open_editor(0)?;
    if let Err(err) = apply_edits(editor, plan) {
        workflow.cancel_editor()?;
        return Err(err);
    }
    let index = workflow.save_editor()?;
    workflow
        .session()
        .get(index)
        .map(|page| page.bytes().to_vec())
        .ok_or(ScanwerkError::IndexOutOfRange {
            index,
            len: workflow.session().len(),
        })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum FormatArg {
    Txt,
    Doc,
    Csv,
    Pdf,
}

impl From<FormatArg> for ExportFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Txt => ExportFormat::Text,
            FormatArg::Doc => ExportFormat::WordHtml,
            FormatArg::Csv => ExportFormat::Csv,
            FormatArg::Pdf => ExportFormat::Pdf,
        }
    }
}

pub async fn run<I, T>(args: I) -> Result<()>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let cli = Cli::parse_from(args);
    let mut ctx = AppContext::init(&data_dir::data_dir(), DeviceContext::desktop());
    let outcome = dispatch(cli.command, &mut ctx).await;
    ctx.teardown();
    outcome
}

async fn dispatch(command: Commands, ctx: &mut AppContext) -> Result<()> {
    match command {
        Commands::Ocr {
            images,
            tables,
            format,
            translate,
            summarize,
            output,
        } => {
            let mut workflow = Workflow::from_context(ctx, HttpGateway::new(&ctx.config, &ctx.auth)?);
            load_pages(&mut workflow, &images)?;

            if tables {
                workflow.set_cursor(0);
                workflow.run_ocr_with_tables().await?;
            } else {
                workflow.run_ocr().await?;
            }
            if let Some(lang) = translate.as_deref() {
                workflow.translate(lang).await?;
            }
            if summarize {
                workflow.summarize().await?;
            }
            print_derived(workflow.result());

            let format = ExportFormat::from(format);
            let artifact = workflow.export(format)?;
            let path = output.unwrap_or_else(|| default_output(&images, format));
            write_export(&path, &artifact.bytes)?;
            println!("{}", path.display());
            Ok(())
        }
        Commands::Pdf {
            images,
            local,
            output,
        } => {
            let mut workflow = Workflow::from_context(ctx, HttpGateway::new(&ctx.config, &ctx.auth)?);
            load_pages(&mut workflow, &images)?;

            let bytes = if local {
                PdfWriter::new(PaperSize::A4)
                    .with_title("scan")
                    .create_from_images(workflow.session().images())?
            } else {
                let progress: ProgressFn = Arc::new(|percent: u8| eprint!("\ruploading {percent:>3}%"));
                workflow.run_pdf(Some(progress)).await?;
                eprintln!();
                workflow.export(ExportFormat::Pdf)?.bytes
            };
            let path = output.unwrap_or_else(|| default_output(&images, ExportFormat::Pdf));
            write_export(&path, &bytes)?;
            println!("{}", path.display());
            Ok(())
        }
        Commands::Edit {
            image,
            rotate,
            texts,
            highlights,
            crop,
            output,
        } => {
            let plan = EditPlan {
                rotation: Rotation::from_degrees(rotate)?,
                texts,
                highlights,
                crop,
            };
            let mut workflow = Workflow::from_context(ctx, HttpGateway::new(&ctx.config, &ctx.auth)?);
            load_pages(&mut workflow, std::slice::from_ref(&image))?;
            let bytes = edit_first_page(&mut workflow, &plan)?;
            let path = output.unwrap_or_else(|| edited_output(&image));
            write_export(&path, &bytes)?;
            println!("{}", path.display());
            Ok(())
        }
        Commands::Config => {
            println!("{}", serde_json::to_string_pretty(&ctx.config)?);
            Ok(())
        }
        Commands::Logout => {
            ctx.logout()?;
            println!("signed out");
            Ok(())
        }
    }
}

/// Import `images` through the desktop file picker. Unreadable or invalid
/// files are reported and skipped; it is an error if none are usable.
fn load_pages<G: ProcessingGateway>(workflow: &mut Workflow<G>, images: &[PathBuf]) -> Result<()> {
    let coordinator = CaptureCoordinator::new(Box::new(StubBridge::with_files(images.iter().cloned())));
    let report = coordinator.import(CaptureSource::FilePicker, workflow)?;

    for rejection in &report.rejected {
        warn!(name = %rejection.name, error = %rejection.error, "page skipped");
        eprintln!("skipped {}: {}", rejection.name, humanize_error(&rejection.error).message);
    }
    if report.added.is_empty() {
        return Err(report
            .rejected
            .into_iter()
            .next()
            .map(|r| r.error)
            .unwrap_or_else(|| ScanwerkError::UnsupportedMediaType("no images given".into())));
    }
    info!(pages = report.added.len(), "pages loaded");
    Ok(())
}

fn print_derived(outcome: Option<&ScanOutcome>) {
    let Some(ScanOutcome::Text(text)) = outcome else {
        return;
    };
    if let Some(translation) = &text.translation {
        println!("--- translation ({}) ---\n{}", translation.target_language, translation.translated_text);
    }
    if let Some(summary) = &text.summary {
        println!("--- summary ---\n{summary}");
    }
}

/// `scan.<ext>` next to the first input.
fn default_output(images: &[PathBuf], format: ExportFormat) -> PathBuf {
    let name = format.file_name("scan");
    images
        .first()
        .and_then(|p| p.parent())
        .map(|dir| dir.join(&name))
        .unwrap_or_else(|| Path::new(&name).to_path_buf())
}

/// `<stem>-edited.jpg` next to the input.
fn edited_output(image: &Path) -> PathBuf {
    let stem = image.file_stem().and_then(|s| s.to_str()).unwrap_or("page");
    image.with_file_name(format!("{stem}-edited.jpg"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflow::tests::{FakeGateway, png};
    use scanwerk_core::AppConfig;
    use scanwerk_core::types::ImageKind;
    use scanwerk_document::{EditorConfig, ImageProcessor};

    #[test]
    fn parses_ocr_with_options() {
        let cli = Cli::try_parse_from([
            "scanwerk", "ocr", "a.jpg", "b.jpg", "--format", "csv", "--translate", "de", "--tables",
        ])
        .unwrap();
        match cli.command {
            Commands::Ocr {
                images,
                tables,
                format,
                translate,
                summarize,
                output,
            } => {
                assert_eq!(images.len(), 2);
                assert!(tables);
                assert_eq!(format, FormatArg::Csv);
                assert_eq!(translate.as_deref(), Some("de"));
                assert!(!summarize);
                assert!(output.is_none());
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn ocr_requires_an_image() {
        assert!(Cli::try_parse_from(["scanwerk", "ocr"]).is_err());
    }

    #[test]
    fn unknown_format_rejected() {
        assert!(Cli::try_parse_from(["scanwerk", "ocr", "a.jpg", "--format", "xlsx"]).is_err());
    }

    #[test]
    fn doc_maps_to_word_html() {
        assert_eq!(ExportFormat::from(FormatArg::Doc), ExportFormat::WordHtml);
    }

    #[test]
    fn output_defaults_next_to_first_image() {
        let images = vec![PathBuf::from("/tmp/scans/p1.jpg"), PathBuf::from("/other/p2.jpg")];
        assert_eq!(
            default_output(&images, ExportFormat::Text),
            PathBuf::from("/tmp/scans/scan.txt")
        );
        assert_eq!(
            default_output(&[PathBuf::from("p1.jpg")], ExportFormat::Pdf),
            PathBuf::from("scan.pdf")
        );
    }

    #[test]
    fn parses_edit_arguments() {
        let cli = Cli::try_parse_from([
            "scanwerk", "edit", "page.png", "--rotate", "-90", "--text", "10,20,Paid, thanks",
            "--text", "50,50,OK", "--highlight", "5,5,30,10", "--crop", "0,0,50,100",
        ])
        .unwrap();
        match cli.command {
            Commands::Edit {
                image,
                rotate,
                texts,
                highlights,
                crop,
                output,
            } => {
                assert_eq!(image, PathBuf::from("page.png"));
                assert_eq!(Rotation::from_degrees(rotate).unwrap(), Rotation::Deg270);
                assert_eq!(texts.len(), 2);
                assert_eq!(
                    texts[0],
                    TextArg {
                        x: 10.0,
                        y: 20.0,
                        text: "Paid, thanks".into()
                    }
                );
                assert_eq!(highlights, vec![PercentRect::new(5.0, 5.0, 30.0, 10.0)]);
                assert_eq!(crop, Some(PercentRect::new(0.0, 0.0, 50.0, 100.0)));
                assert!(output.is_none());
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn malformed_edit_arguments_rejected() {
        assert!(parse_text("10,OK").is_err());
        assert!(parse_text("x,20,OK").is_err());
        assert!(parse_rect("1,2,3").is_err());
        assert!(parse_rect("1,2,3,4,5").is_err());
        assert!(Cli::try_parse_from(["scanwerk", "edit", "p.png", "--crop", "a,b,c,d"]).is_err());
    }

    #[test]
    fn edited_output_sits_next_to_input() {
        assert_eq!(
            edited_output(Path::new("/tmp/scans/receipt.png")),
            PathBuf::from("/tmp/scans/receipt-edited.jpg")
        );
    }

    #[test]
    fn edit_plan_is_applied_and_saved() {
        let config = AppConfig::default();
        let mut workflow = Workflow::new(&config, EditorConfig::from_app_config(&config, None), FakeGateway::default());
        workflow.add_capture(png(40, 30), Some("image/png")).unwrap();

        let plan = EditPlan {
            rotation: Rotation::Deg90,
            texts: vec![TextArg {
                x: 10.0,
                y: 10.0,
                text: "OK".into(),
            }],
            highlights: vec![PercentRect::new(0.0, 0.0, 50.0, 50.0), PercentRect::new(60.0, 60.0, 1.0, 1.0)],
            crop: Some(PercentRect::new(0.0, 0.0, 50.0, 100.0)),
        };
        let bytes = edit_first_page(&mut workflow, &plan).unwrap();

        let page = workflow.session().get(0).unwrap();
        assert_eq!(page.kind(), ImageKind::Jpeg);
        assert_eq!(page.bytes(), bytes.as_slice());
        let decoded = ImageProcessor::from_bytes(&bytes).unwrap();
        // 40x30 turned a quarter is 30x40; the crop keeps the left half.
        assert_eq!((decoded.width(), decoded.height()), (15, 40));
        assert!(workflow.editor().is_none());
    }

    #[test]
    fn blank_text_cancels_the_edit() {
        let config = AppConfig::default();
        let mut workflow = Workflow::new(&config, EditorConfig::without_font(&config), FakeGateway::default());
        workflow.add_capture(png(40, 30), Some("image/png")).unwrap();
        let before = workflow.session().get(0).unwrap().id();

        let plan = EditPlan {
            texts: vec![TextArg {
                x: 10.0,
                y: 10.0,
                text: "   ".into(),
            }],
            ..EditPlan::default()
        };
        assert!(matches!(edit_first_page(&mut workflow, &plan), Err(ScanwerkError::EmptyText)));
        assert!(workflow.editor().is_none());
        assert_eq!(workflow.session().get(0).unwrap().id(), before);
    }
}
