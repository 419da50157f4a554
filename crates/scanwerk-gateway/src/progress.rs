// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Upload progress. Request bodies are fed to reqwest as a chunked stream so
// that the percentage can advance as bytes are handed to the transport. This
// measures upload only; server-side processing time is not reflected.

use std::sync::Arc;
use std::sync::atomic::{AtomicU8, AtomicUsize, Ordering};

use futures::Stream;

/// Called with a percentage in 0..=100. Values never decrease.
pub type ProgressFn = Arc<dyn Fn(u8) + Send + Sync>;

/// Bytes handed to the transport per chunk.
pub const CHUNK_SIZE: usize = 64 * 1024;

/// Shared byte counter for one request.
pub struct UploadProgress {
    total: usize,
    sent: AtomicUsize,
    last: AtomicU8,
    callback: Option<ProgressFn>,
}

impl UploadProgress {
    /// Tracker for `total` bytes. Reports 0 immediately.
    pub fn new(total: usize, callback: Option<ProgressFn>) -> Arc<Self> {
        if let Some(cb) = &callback {
            cb(0);
        }
        Arc::new(Self {
            total,
            sent: AtomicUsize::new(0),
            last: AtomicU8::new(0),
            callback,
        })
    }

    pub fn advance(&self, bytes: usize) {
        let sent = self.sent.fetch_add(bytes, Ordering::Relaxed) + bytes;
        let percent = if self.total == 0 {
            100
        } else {
            (sent.min(self.total) * 100 / self.total) as u8
        };
        self.report(percent);
    }

    /// Report 100 once the reply has arrived, if not already reported.
    pub fn finish(&self) {
        self.report(100);
    }

    pub fn percent(&self) -> u8 {
        self.last.load(Ordering::Relaxed)
    }

    fn report(&self, percent: u8) {
        let previous = self.last.fetch_max(percent, Ordering::Relaxed);
        if percent > previous {
            if let Some(cb) = &self.callback {
                cb(percent);
            }
        }
    }
}

/// Split `bytes` into chunks that advance `progress` as they are polled.
pub fn progress_stream(
    bytes: Vec<u8>,
    progress: Arc<UploadProgress>,
) -> impl Stream<Item = std::io::Result<Vec<u8>>> + Send + Sync + 'static {
    let chunks: Vec<Vec<u8>> = bytes.chunks(CHUNK_SIZE).map(<[u8]>::to_vec).collect();
    futures::stream::iter(chunks.into_iter().map(move |chunk| {
        progress.advance(chunk.len());
        Ok(chunk)
    }))
}
