//! The editable document: authoritative text plus derived session state.
//!
//! Owns the buffer exclusively; every mutation flows through here so the
//! dirty flag and revision counter stay truthful. The document never
//! touches a filesystem - file content crosses the boundary as UTF-8
//! strings and `file_path` is bookkeeping for the shell.

use std::ops::Range;
use std::path::{Path, PathBuf};

use crate::text::{EditInfo, TextBuffer};

/// Text selection with anchor and head positions (char offsets).
///
/// The anchor is where the selection started, the head is where the cursor
/// is now. They may be in any order - use `start()` and `end()` for ordered
/// bounds.
#[derive(Clone, Debug, Copy, PartialEq, Eq)]
pub struct Selection {
    /// Where selection started
    pub anchor: usize,
    /// Where cursor is now
    pub head: usize,
}

impl Selection {
    pub fn new(anchor: usize, head: usize) -> Self {
        Self { anchor, head }
    }

    /// Get the start (lower bound) of the selection.
    pub fn start(&self) -> usize {
        self.anchor.min(self.head)
    }

    /// Get the end (upper bound) of the selection.
    pub fn end(&self) -> usize {
        self.anchor.max(self.head)
    }

    /// Check if the selection is collapsed (cursor only).
    pub fn is_collapsed(&self) -> bool {
        self.anchor == self.head
    }

    pub fn to_range(&self) -> Range<usize> {
        self.start()..self.end()
    }
}

/// An editable markdown document.
///
/// `revision` is a monotonic counter bumped on every mutation; derived
/// artifacts (previews, match sets) record the revision they were computed
/// from and are stale whenever it no longer matches.
pub struct Document<T: TextBuffer> {
    buffer: T,
    file_path: Option<PathBuf>,
    dirty: bool,
    revision: u64,
    selection: Option<Selection>,
}

impl<T: TextBuffer + Default> Default for Document<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T: TextBuffer> Document<T> {
    /// Create an untitled document over the given buffer.
    pub fn new(buffer: T) -> Self {
        Self {
            buffer,
            file_path: None,
            dirty: false,
            revision: 0,
            selection: None,
        }
    }

    /// Create a document from loaded file content.
    ///
    /// The content is the persisted snapshot, so the document starts clean.
    pub fn open(buffer: T, path: PathBuf) -> Self {
        Self {
            buffer,
            file_path: Some(path),
            dirty: false,
            revision: 0,
            selection: None,
        }
    }

    // === Accessors ===

    pub fn buffer(&self) -> &T {
        &self.buffer
    }

    pub fn text(&self) -> String {
        self.buffer.to_string()
    }

    pub fn file_path(&self) -> Option<&Path> {
        self.file_path.as_deref()
    }

    /// True iff the text differs from the last persisted snapshot.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn selection(&self) -> Option<Selection> {
        self.selection
    }

    pub fn set_selection(&mut self, selection: Option<Selection>) {
        self.selection = selection;
    }

    /// Select the half-open byte range `start..end`, e.g. a search match.
    pub fn select_byte_range(&mut self, start: usize, end: usize) {
        let anchor = self.buffer.byte_to_char(start);
        let head = self.buffer.byte_to_char(end);
        self.selection = Some(Selection::new(anchor, head));
    }

    // === Mutations ===

    /// Insert text at char offset.
    pub fn insert(&mut self, char_offset: usize, text: &str) -> Option<EditInfo> {
        self.buffer.insert(char_offset, text);
        self.touch();
        self.buffer.last_edit()
    }

    /// Delete a char range.
    pub fn delete(&mut self, char_range: Range<usize>) -> Option<EditInfo> {
        self.buffer.delete(char_range);
        self.touch();
        self.buffer.last_edit()
    }

    /// Replace a char range with text.
    pub fn replace(&mut self, char_range: Range<usize>, text: &str) -> Option<EditInfo> {
        self.buffer.replace(char_range, text);
        self.touch();
        self.buffer.last_edit()
    }

    /// Replace the entire content (e.g. after a bulk replace-all).
    pub fn set_text(&mut self, text: &str) {
        let len = self.buffer.len_chars();
        self.buffer.replace(0..len, text);
        self.selection = None;
        self.touch();
    }

    fn touch(&mut self) {
        self.dirty = true;
        self.revision += 1;
    }

    // === Persistence bookkeeping ===

    /// Record a confirmed successful save.
    ///
    /// This is the only path that clears the dirty flag; a failed save must
    /// leave it set so the user can retry.
    pub fn mark_saved(&mut self, path: PathBuf) {
        self.file_path = Some(path);
        self.dirty = false;
    }
}
