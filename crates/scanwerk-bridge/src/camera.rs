// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Scoped camera acquisition. The stream is stopped when the session is
// dropped, whether capture finished, was cancelled, or unwound on error.

use scanwerk_core::error::{Result, ScanwerkError};
use tracing::{debug, info, warn};

use crate::traits::{CameraFacing, CameraStream, NativeCamera};

pub struct CameraSession {
    stream: Box<dyn CameraStream>,
    facing: CameraFacing,
}

impl CameraSession {
    pub fn open<C: NativeCamera + ?Sized>(camera: &C, facing: CameraFacing) -> Result<Self> {
        let stream = camera.open_stream(facing)?;
        info!(?facing, "camera stream acquired");
        Ok(Self { stream, facing })
    }

    pub fn facing(&self) -> CameraFacing {
        self.facing
    }

    pub fn capture(&mut self) -> Result<Vec<u8>> {
        if !self.stream.is_active() {
            return Err(ScanwerkError::Device("camera stream is no longer active".into()));
        }
        let frame = self.stream.capture_frame()?;
        debug!(bytes = frame.len(), "frame captured");
        Ok(frame)
    }

    /// Best effort: failures are logged and reported as `false`.
    pub fn focus_at(&mut self, x: f32, y: f32) -> bool {
        match self.stream.focus_at(x.clamp(0.0, 100.0), y.clamp(0.0, 100.0)) {
            Ok(applied) => applied,
            Err(err) => {
                warn!(%err, "focus request failed");
                false
            }
        }
    }
}

impl Drop for CameraSession {
    fn drop(&mut self) {
        self.stream.stop();
        debug!("camera stream released");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    /// In-memory camera that records how often it was stopped.
    struct FakeCamera {
        stops: Arc<AtomicUsize>,
        focus_supported: bool,
    }

    struct FakeStream {
        active: Arc<AtomicBool>,
        stops: Arc<AtomicUsize>,
        focus_supported: bool,
    }

    impl NativeCamera for FakeCamera {
        fn open_stream(&self, _facing: CameraFacing) -> Result<Box<dyn CameraStream>> {
            Ok(Box::new(FakeStream {
                active: Arc::new(AtomicBool::new(true)),
                stops: Arc::clone(&self.stops),
                focus_supported: self.focus_supported,
            }))
        }
    }

    impl CameraStream for FakeStream {
        fn capture_frame(&mut self) -> Result<Vec<u8>> {
            Ok(vec![0xFF, 0xD8, 0xFF, 0xE0])
        }

        fn focus_at(&mut self, _x: f32, _y: f32) -> Result<bool> {
            if self.focus_supported {
                Ok(true)
            } else {
                Err(ScanwerkError::Device("focusMode not supported".into()))
            }
        }

        fn stop(&mut self) {
            if self.active.swap(false, Ordering::SeqCst) {
                self.stops.fetch_add(1, Ordering::SeqCst);
            }
        }

        fn is_active(&self) -> bool {
            self.active.load(Ordering::SeqCst)
        }
    }

    fn camera(focus_supported: bool) -> FakeCamera {
        FakeCamera {
            stops: Arc::new(AtomicUsize::new(0)),
            focus_supported,
        }
    }

    #[test]
    fn drop_stops_stream() {
        let cam = camera(true);
        {
            let mut session = CameraSession::open(&cam, CameraFacing::Environment).unwrap();
            assert_eq!(session.capture().unwrap()[..2], [0xFF, 0xD8]);
        }
        assert_eq!(cam.stops.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn early_return_still_stops_stream() {
        fn capture_then_fail(cam: &FakeCamera) -> Result<()> {
            let mut session = CameraSession::open(cam, CameraFacing::User)?;
            session.capture()?;
            Err(ScanwerkError::Device("user cancelled".into()))
        }
        let cam = camera(true);
        assert!(capture_then_fail(&cam).is_err());
        assert_eq!(cam.stops.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn unsupported_focus_is_not_an_error() {
        let cam = camera(false);
        let mut session = CameraSession::open(&cam, CameraFacing::Environment).unwrap();
        assert!(!session.focus_at(50.0, 50.0));
        assert!(session.capture().is_ok());
    }
}
