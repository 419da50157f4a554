// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Capture coordinator: pulls images from the camera, the file picker, or the
// clipboard through the platform bridge and feeds them into the workflow.
// Every image goes through the same validation; a rejected image never
// reaches the session.

use scanwerk_bridge::{CameraFacing, CameraSession, PlatformBridge};
use scanwerk_core::error::{Result, ScanwerkError};
use scanwerk_gateway::ProcessingGateway;
use tracing::{info, instrument, warn};

use crate::workflow::Workflow;

/// MIME filter passed to the file picker.
const ACCEPTED_MIME: &[&str] = &["image/*"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureSource {
    Camera(CameraFacing),
    FilePicker,
    Clipboard,
}

/// A capture that failed validation.
#[derive(Debug)]
pub struct Rejection {
    pub name: String,
    pub error: ScanwerkError,
}

/// Outcome of one import.
#[derive(Debug, Default)]
pub struct ImportReport {
    /// Session indices of the accepted pages.
    pub added: Vec<usize>,
    pub rejected: Vec<Rejection>,
}

pub struct CaptureCoordinator {
    bridge: Box<dyn PlatformBridge>,
}

impl CaptureCoordinator {
    pub fn new(bridge: Box<dyn PlatformBridge>) -> Self {
        info!(platform = bridge.platform_name(), "capture coordinator ready");
        Self { bridge }
    }

    pub fn bridge(&self) -> &dyn PlatformBridge {
        self.bridge.as_ref()
    }

    /// Import from `source`. A failing source (no camera, no permission) is
    /// an error; individual images that fail validation are reported in
    /// [`ImportReport::rejected`].
    #[instrument(skip(self, workflow))]
    pub fn import<G: ProcessingGateway>(
        &self,
        source: CaptureSource,
        workflow: &mut Workflow<G>,
    ) -> Result<ImportReport> {
        match source {
            CaptureSource::Camera(facing) => self.from_camera(facing, workflow),
            CaptureSource::FilePicker => self.from_picker(workflow),
            CaptureSource::Clipboard => self.from_clipboard(workflow),
        }
    }

    /// One frame from the camera. Camera mode is entered for the capture and
    /// left afterwards on every path; the stream is released before the
    /// frame is validated.
    fn from_camera<G: ProcessingGateway>(
        &self,
        facing: CameraFacing,
        workflow: &mut Workflow<G>,
    ) -> Result<ImportReport> {
        workflow.start_camera()?;

        let frame = CameraSession::open(self.bridge.as_ref(), facing).and_then(|mut camera| camera.capture());
        let added = frame.and_then(|bytes| workflow.add_capture(bytes, Some("image/jpeg")));

        workflow.finish_camera()?;
        let mut report = ImportReport::default();
        match added {
            Ok(index) => report.added.push(index),
            Err(err @ (ScanwerkError::ImageTooLarge { .. } | ScanwerkError::UnsupportedMediaType(_))) => {
                report.rejected.push(Rejection {
                    name: "camera frame".into(),
                    error: err,
                });
            }
            Err(err) => return Err(err),
        }
        Ok(report)
    }

    fn from_picker<G: ProcessingGateway>(&self, workflow: &mut Workflow<G>) -> Result<ImportReport> {
        let files = self.bridge.pick_files(ACCEPTED_MIME)?;
        let mut report = ImportReport::default();
        for file in files {
            match workflow.add_capture(file.bytes, file.mime_type.as_deref()) {
                Ok(index) => report.added.push(index),
                Err(error) => {
                    warn!(name = %file.name, %error, "picked file rejected");
                    report.rejected.push(Rejection {
                        name: file.name,
                        error,
                    });
                }
            }
        }
        info!(
            added = report.added.len(),
            rejected = report.rejected.len(),
            "files imported"
        );
        Ok(report)
    }

    fn from_clipboard<G: ProcessingGateway>(&self, workflow: &mut Workflow<G>) -> Result<ImportReport> {
        let mut report = ImportReport::default();
        let Some(image) = self.bridge.read_image()? else {
            info!("clipboard holds no image");
            return Ok(report);
        };
        match workflow.add_capture(image.bytes, Some(&image.mime_type)) {
            Ok(index) => report.added.push(index),
            Err(error) => report.rejected.push(Rejection {
                name: "clipboard".into(),
                error,
            }),
        }
        Ok(report)
    }
}
