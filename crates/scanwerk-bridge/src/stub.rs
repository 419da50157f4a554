// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Desktop/CI bridge. There is no camera or clipboard access; the "file picker"
// hands back a preselected list of paths (the headless driver fills it from
// the command line).

use std::path::{Path, PathBuf};

use scanwerk_core::error::{Result, ScanwerkError};
use scanwerk_core::types::ImageKind;
use tracing::{debug, warn};

use crate::traits::*;

#[derive(Debug, Default)]
pub struct StubBridge {
    preselected: Vec<PathBuf>,
}

impl StubBridge {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bridge whose picker returns `paths`.
    pub fn with_files(paths: impl IntoIterator<Item = PathBuf>) -> Self {
        Self {
            preselected: paths.into_iter().collect(),
        }
    }
}

impl PlatformBridge for StubBridge {
    fn platform_name(&self) -> &str {
        "Desktop (stub)"
    }
}

impl NativeCamera for StubBridge {
    fn open_stream(&self, _facing: CameraFacing) -> Result<Box<dyn CameraStream>> {
        warn!("NativeCamera::open_stream called on stub bridge");
        Err(ScanwerkError::PlatformUnavailable)
    }
}

impl NativeFilePicker for StubBridge {
    fn pick_files(&self, _mime_types: &[&str]) -> Result<Vec<PickedFile>> {
        if self.preselected.is_empty() {
            warn!("NativeFilePicker::pick_files called on stub bridge with no files");
            return Err(ScanwerkError::PlatformUnavailable);
        }
        self.preselected.iter().map(|p| self.read_picked_file(p)).collect()
    }

    fn read_picked_file(&self, path: &Path) -> Result<PickedFile> {
        let bytes = std::fs::read(path)?;
        let mime_type = path
            .extension()
            .and_then(|ext| ext.to_str())
            .and_then(ImageKind::from_extension)
            .map(|kind| kind.mime_type().to_string());
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        debug!(%name, bytes = bytes.len(), "file read");
        Ok(PickedFile {
            name,
            mime_type,
            bytes,
        })
    }
}

impl NativeClipboard for StubBridge {
    fn read_image(&self) -> Result<Option<ClipboardImage>> {
        warn!("NativeClipboard::read_image called on stub bridge");
        Err(ScanwerkError::PlatformUnavailable)
    }
}
