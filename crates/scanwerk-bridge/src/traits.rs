// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Platform-agnostic trait definitions for native capture capabilities.
//
// Each way of getting a page into a session (camera, file picker, clipboard)
// is a trait bound on `PlatformBridge`. Platforms that lack a capability
// return `ScanwerkError::PlatformUnavailable`.

use std::path::Path;

use scanwerk_core::error::Result;

/// Unified bridge that groups all native capture capabilities.
pub trait PlatformBridge: NativeCamera + NativeFilePicker + NativeClipboard + Send + Sync {
    /// Human-readable platform name (e.g. "iOS 17", "Android 14").
    fn platform_name(&self) -> &str;
}

/// Which camera to open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CameraFacing {
    /// Rear camera, preferred for documents.
    #[default]
    Environment,
    User,
}

/// Live camera access.
pub trait NativeCamera {
    /// Acquire a video stream. Callers wrap it in
    /// [`CameraSession`](crate::camera::CameraSession) so it is released on
    /// every exit path.
    fn open_stream(&self, facing: CameraFacing) -> Result<Box<dyn CameraStream>>;
}

/// An acquired camera stream.
pub trait CameraStream: Send {
    /// Grab the current frame as encoded image bytes (JPEG on all platforms).
    fn capture_frame(&mut self) -> Result<Vec<u8>>;

    /// Request focus at a point given in percent of the preview.
    ///
    /// Returns `Ok(false)` when the device has no focus control.
    fn focus_at(&mut self, x: f32, y: f32) -> Result<bool>;

    /// Stop all tracks. Must be idempotent.
    fn stop(&mut self);

    fn is_active(&self) -> bool;
}

/// A file chosen by the user.
#[derive(Debug, Clone)]
pub struct PickedFile {
    pub name: String,
    /// MIME type reported by the platform, if any.
    pub mime_type: Option<String>,
    pub bytes: Vec<u8>,
}

/// Pick files from the device storage.
pub trait NativeFilePicker {
    /// Show a picker filtered to the given MIME types. An empty result means
    /// the user cancelled.
    fn pick_files(&self, mime_types: &[&str]) -> Result<Vec<PickedFile>>;

    /// Read a file by path.
    fn read_picked_file(&self, path: &Path) -> Result<PickedFile>;
}

/// Image content on the system clipboard.
#[derive(Debug, Clone)]
pub struct ClipboardImage {
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

pub trait NativeClipboard {
    /// Returns `Ok(None)` when the clipboard holds no image.
    fn read_image(&self) -> Result<Option<ClipboardImage>>;
}
