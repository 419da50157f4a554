// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Page session: the ordered list of pending page images and the preview
// cursor. This is the single source of truth for page order.

use tracing::{debug, info, instrument};

use crate::error::{Result, ScanwerkError};
use crate::types::PageImage;

/// What a removal left behind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoveOutcome {
    /// Pages remain; the cursor points at a valid index.
    Remaining,
    /// The last page was removed; the caller should return to the select state.
    Emptied,
}

/// Ordered collection of page images with a "current preview" cursor.
///
/// The cursor is always a valid index while the session is non-empty, and
/// zero when it is empty.
#[derive(Debug, Clone, Default)]
pub struct PageSession {
    pages: Vec<PageImage>,
    cursor: usize,
}

impl PageSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn get(&self, index: usize) -> Option<&PageImage> {
        self.pages.get(index)
    }

    /// Page under the cursor.
    pub fn current(&self) -> Option<&PageImage> {
        self.pages.get(self.cursor)
    }

    pub fn iter(&self) -> impl Iterator<Item = &PageImage> {
        self.pages.iter()
    }

    pub fn images(&self) -> &[PageImage] {
        &self.pages
    }

    /// Add a page at the end and move the cursor to it.
    #[instrument(skip_all, fields(page = %image.id(), bytes = image.len()))]
    pub fn append(&mut self, image: PageImage) -> usize {
        self.pages.push(image);
        self.cursor = self.pages.len() - 1;
        info!(count = self.pages.len(), "page appended");
        self.cursor
    }

    /// Remove the page at `index`, clamping the cursor to `max(0, len - 1)`.
    #[instrument(skip(self))]
    pub fn remove_at(&mut self, index: usize) -> Result<RemoveOutcome> {
        self.check_index(index)?;
        let removed = self.pages.remove(index);
        self.cursor = self.cursor.min(self.pages.len().saturating_sub(1));
        debug!(page = %removed.id(), remaining = self.pages.len(), "page removed");

        if self.pages.is_empty() {
            info!("last page removed");
            Ok(RemoveOutcome::Emptied)
        } else {
            Ok(RemoveOutcome::Remaining)
        }
    }

    /// Replace the page at `index` in place, returning the old page.
    #[instrument(skip(self, image), fields(new_page = %image.id()))]
    pub fn replace_at(&mut self, index: usize, image: PageImage) -> Result<PageImage> {
        self.check_index(index)?;
        let old = std::mem::replace(&mut self.pages[index], image);
        debug!(old_page = %old.id(), "page replaced");
        Ok(old)
    }

    /// Move the cursor. Out-of-range indices are ignored and return `false`.
    pub fn set_cursor(&mut self, index: usize) -> bool {
        if index < self.pages.len() {
            self.cursor = index;
            true
        } else {
            debug!(index, len = self.pages.len(), "cursor move ignored");
            false
        }
    }

    /// Move a page from `from` to `to`; the cursor follows the moved page.
    #[instrument(skip(self))]
    pub fn move_page(&mut self, from: usize, to: usize) -> Result<()> {
        self.check_index(from)?;
        self.check_index(to)?;
        let page = self.pages.remove(from);
        self.pages.insert(to, page);
        self.cursor = to;
        Ok(())
    }

    /// Drop every page.
    pub fn clear(&mut self) {
        self.pages.clear();
        self.cursor = 0;
    }

    fn check_index(&self, index: usize) -> Result<()> {
        if index < self.pages.len() {
            Ok(())
        } else {
            Err(ScanwerkError::IndexOutOfRange {
                index,
                len: self.pages.len(),
            })
        }
    }
}
