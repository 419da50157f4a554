// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Scanwerk Bridge: native capture abstractions (camera stream, file picker,
// clipboard). The app talks to `dyn PlatformBridge`; each target supplies an
// implementation. Desktop and CI builds use `StubBridge`.

pub mod camera;
pub mod stub;
pub mod traits;

pub use camera::CameraSession;
pub use stub::StubBridge;
pub use traits::{
    CameraFacing, CameraStream, ClipboardImage, NativeCamera, NativeClipboard, NativeFilePicker,
    PickedFile, PlatformBridge,
};

