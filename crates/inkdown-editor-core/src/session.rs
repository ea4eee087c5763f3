//! The editing session: document + pipeline + scheduler + search overlay.
//!
//! This is the surface the shell drives. Menu triggers arrive as
//! `Command`s; edits and ticks carry the event loop's clock so the whole
//! session stays single-threaded and deterministic. The session owns its
//! `RenderPipeline` instance - there is no ambient global processor, so
//! independent documents (and tests) cannot contaminate each other.

use std::ops::Range;
use std::path::PathBuf;

use web_time::Instant;

use inkdown_renderer::{RenderPipeline, ThemeId};

use crate::config::EditorConfig;
use crate::debounce::DebounceScheduler;
use crate::document::Document;
use crate::search::{MatchSet, MatchSpan, SearchQuery};
use crate::text::{EditInfo, EditorRope, TextBuffer};

/// A menu-triggered command from the shell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    NewFile,
    OpenFile,
    Save,
    SaveAs,
    Find,
    Replace,
    Export(ThemeId),
    TogglePreview,
    ResetLayout,
}

/// What the shell must do to finish a command the core cannot complete.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShellRequest {
    /// Handled entirely inside the session.
    Handled,
    /// The buffer has unsaved changes; ask the user, then call
    /// [`EditorSession::resume_gated`] with their decision.
    ConfirmUnsaved(Command),
    /// Run the open-file flow and call [`EditorSession::load`].
    OpenFile,
    /// Persist the text; `path` is the known location, `None` means the
    /// shell must pick one. Call [`Document::mark_saved`] on success only.
    Save { path: Option<PathBuf> },
    /// Persist under a new location.
    SaveAs,
    /// Run the export flow with this theme.
    Export(ThemeId),
    /// Restore default pane layout (pure shell concern).
    ResetLayout,
}

/// The user's answer to the unsaved-changes dialog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnsavedDecision {
    /// Save first, then continue.
    Save,
    /// Continue without saving.
    Discard,
    /// Abort the pending command.
    Cancel,
}

/// Which overlay variant is open.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchMode {
    Find,
    Replace,
}

/// Match readout for the shell's status line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchStatus {
    /// 1-based index of the current match; 0 when there is none.
    pub current: usize,
    pub total: usize,
    /// The pattern itself was invalid - distinct from "no matches found".
    pub invalid_pattern: bool,
}

/// A rendered preview, pinned to the text revision that produced it.
#[derive(Debug, Clone)]
pub struct RenderedDocument {
    pub markup: String,
    pub source_revision: u64,
}

struct SearchOverlay {
    mode: SearchMode,
    query: SearchQuery,
    matches: Option<MatchSet>,
    invalid_pattern: bool,
}

/// One editing session over one document.
pub struct EditorSession<T: TextBuffer> {
    document: Document<T>,
    pipeline: RenderPipeline,
    scheduler: DebounceScheduler,
    preview: Option<RenderedDocument>,
    preview_visible: bool,
    overlay: Option<SearchOverlay>,
}

impl Default for EditorSession<EditorRope> {
    fn default() -> Self {
        Self::new()
    }
}

impl EditorSession<EditorRope> {
    pub fn new() -> Self {
        Self::with_config(&EditorConfig::default())
    }

    pub fn with_config(config: &EditorConfig) -> Self {
        Self::from_document(Document::default(), config)
    }
}

impl<T: TextBuffer> EditorSession<T> {
    pub fn from_document(document: Document<T>, config: &EditorConfig) -> Self {
        Self {
            document,
            pipeline: RenderPipeline::new(),
            scheduler: DebounceScheduler::new(config.quiet_interval()),
            preview: None,
            preview_visible: config.show_preview,
            overlay: None,
        }
    }

    pub fn document(&self) -> &Document<T> {
        &self.document
    }

    pub fn pipeline(&self) -> &RenderPipeline {
        &self.pipeline
    }

    pub fn preview(&self) -> Option<&RenderedDocument> {
        self.preview.as_ref()
    }

    pub fn preview_visible(&self) -> bool {
        self.preview_visible
    }

    // === Commands ===

    /// Dispatch a menu trigger.
    pub fn apply(&mut self, command: Command) -> ShellRequest
    where
        T: Default,
    {
        match command {
            Command::NewFile => {
                if self.document.is_dirty() {
                    return ShellRequest::ConfirmUnsaved(command);
                }
                self.reset_document(Document::default());
                ShellRequest::Handled
            }
            Command::OpenFile => {
                if self.document.is_dirty() {
                    return ShellRequest::ConfirmUnsaved(command);
                }
                ShellRequest::OpenFile
            }
            Command::Save => ShellRequest::Save {
                path: self.document.file_path().map(PathBuf::from),
            },
            Command::SaveAs => ShellRequest::SaveAs,
            Command::Find => {
                self.open_search(SearchMode::Find);
                ShellRequest::Handled
            }
            Command::Replace => {
                self.open_search(SearchMode::Replace);
                ShellRequest::Handled
            }
            Command::Export(theme) => ShellRequest::Export(theme),
            Command::TogglePreview => {
                self.preview_visible = !self.preview_visible;
                ShellRequest::Handled
            }
            Command::ResetLayout => ShellRequest::ResetLayout,
        }
    }

    /// Resume a command that was gated on unsaved changes.
    pub fn resume_gated(&mut self, command: Command, decision: UnsavedDecision) -> ShellRequest
    where
        T: Default,
    {
        match decision {
            UnsavedDecision::Cancel => ShellRequest::Handled,
            // The shell saves, then re-applies the command on a clean buffer.
            UnsavedDecision::Save => ShellRequest::Save {
                path: self.document.file_path().map(PathBuf::from),
            },
            UnsavedDecision::Discard => match command {
                Command::NewFile => {
                    self.reset_document(Document::default());
                    ShellRequest::Handled
                }
                Command::OpenFile => ShellRequest::OpenFile,
                other => self.apply(other),
            },
        }
    }

    /// Swap in freshly loaded file content.
    pub fn load(&mut self, text: String, path: Option<PathBuf>)
    where
        T: From<String>,
    {
        let buffer = T::from(text);
        let document = match path {
            Some(path) => Document::open(buffer, path),
            None => Document::new(buffer),
        };
        self.reset_document(document);
    }

    fn reset_document(&mut self, document: Document<T>) {
        self.document = document;
        self.preview = None;
        self.overlay = None;
        self.scheduler.cancel();
    }

    // === Edits ===

    pub fn insert(&mut self, char_offset: usize, text: &str, now: Instant) -> Option<EditInfo> {
        let edit = self.document.insert(char_offset, text);
        self.after_edit(now);
        edit
    }

    pub fn delete(&mut self, char_range: Range<usize>, now: Instant) -> Option<EditInfo> {
        let edit = self.document.delete(char_range);
        self.after_edit(now);
        edit
    }

    pub fn replace(
        &mut self,
        char_range: Range<usize>,
        text: &str,
        now: Instant,
    ) -> Option<EditInfo> {
        let edit = self.document.replace(char_range, text);
        self.after_edit(now);
        edit
    }

    /// Record a confirmed successful save.
    pub fn mark_saved(&mut self, path: PathBuf) {
        self.document.mark_saved(path);
    }

    fn after_edit(&mut self, now: Instant) {
        self.scheduler.note_change(self.document.revision(), now);
        // Every mutation invalidates the match set; keep the overlay honest.
        let previous = self.current_match_index();
        self.refresh_matches(previous);
    }

    // === Preview ===

    /// Drive the debounce scheduler from the shell's event loop.
    ///
    /// When the quiet period has elapsed this renders the settled text and
    /// installs it; at most one render per armed window.
    pub fn tick(&mut self, now: Instant) -> Option<&RenderedDocument> {
        let fired = self.scheduler.poll(now)?;
        tracing::debug!(
            target: "inkdown::session",
            fired_revision = fired,
            current_revision = self.document.revision(),
            "debounce fired"
        );
        let rendered = self.render_current();
        self.install_preview(rendered);
        self.preview.as_ref()
    }

    /// Render the current text synchronously, bypassing the debounce.
    ///
    /// Used for the initial preview and the export path.
    pub fn render_now(&mut self) -> RenderedDocument {
        let rendered = self.render_current();
        self.install_preview(rendered.clone());
        rendered
    }

    fn render_current(&self) -> RenderedDocument {
        let text = self.document.text();
        RenderedDocument {
            markup: self.pipeline.render(&text),
            source_revision: self.document.revision(),
        }
    }

    /// Install a render as the current preview.
    ///
    /// Rejects stale artifacts: a render is only shown if its source
    /// revision still matches the document, and never replaces a newer
    /// preview. Returns whether it was installed.
    pub fn install_preview(&mut self, rendered: RenderedDocument) -> bool {
        if rendered.source_revision != self.document.revision() {
            tracing::debug!(
                target: "inkdown::session",
                stale = rendered.source_revision,
                current = self.document.revision(),
                "discarding stale render"
            );
            return false;
        }
        if let Some(current) = &self.preview {
            if current.source_revision > rendered.source_revision {
                return false;
            }
        }
        self.preview = Some(rendered);
        true
    }

    // === Search overlay ===

    pub fn open_search(&mut self, mode: SearchMode) {
        self.overlay = Some(SearchOverlay {
            mode,
            query: SearchQuery::default(),
            matches: None,
            invalid_pattern: false,
        });
    }

    /// Close the overlay, discarding the match set. It is never persisted
    /// across sessions.
    pub fn close_search(&mut self) {
        self.overlay = None;
    }

    pub fn search_mode(&self) -> Option<SearchMode> {
        self.overlay.as_ref().map(|overlay| overlay.mode)
    }

    /// Update the query; recomputes matches and jumps to the first one.
    pub fn set_query(&mut self, query: SearchQuery) {
        let Some(overlay) = self.overlay.as_mut() else {
            return;
        };
        overlay.query = query;
        self.refresh_matches(None);
        self.select_current();
    }

    /// Jump to the next match, wrapping. Mirrors it into the selection.
    pub fn next_match(&mut self) -> Option<MatchSpan> {
        self.ensure_fresh_matches();
        let overlay = self.overlay.as_mut()?;
        let span = overlay.matches.as_mut()?.next()?;
        self.document.select_byte_range(span.start, span.end);
        Some(span)
    }

    /// Jump to the previous match, wrapping. Mirrors it into the selection.
    pub fn prev_match(&mut self) -> Option<MatchSpan> {
        self.ensure_fresh_matches();
        let overlay = self.overlay.as_mut()?;
        let span = overlay.matches.as_mut()?.prev()?;
        self.document.select_byte_range(span.start, span.end);
        Some(span)
    }

    /// Replace the current match in place.
    ///
    /// Recomputes the match set synchronously afterwards - the splice moved
    /// every following offset - and keeps the position on the nearest
    /// remaining match.
    pub fn replace_current(&mut self, replacement: &str, now: Instant) -> bool {
        self.ensure_fresh_matches();
        let Some(overlay) = self.overlay.as_ref() else {
            return false;
        };
        if overlay.mode != SearchMode::Replace {
            return false;
        }
        let Some(set) = overlay.matches.as_ref() else {
            return false;
        };
        let Some(span) = set.current_span() else {
            return false;
        };

        let char_range = self.document.buffer().byte_to_char(span.start)
            ..self.document.buffer().byte_to_char(span.end);
        self.document.replace(char_range, replacement);
        // after_edit refreshes matches with the index preserved.
        self.after_edit(now);
        self.select_current();
        true
    }

    /// Replace every match in one pass.
    ///
    /// Returns the number of replacements made.
    pub fn replace_all(&mut self, replacement: &str, now: Instant) -> usize {
        self.ensure_fresh_matches();
        let Some(overlay) = self.overlay.as_ref() else {
            return 0;
        };
        if overlay.mode != SearchMode::Replace {
            return 0;
        }
        let Some(set) = overlay.matches.as_ref() else {
            return 0;
        };
        if set.is_empty() {
            return 0;
        }

        let count = set.len();
        let text = self.document.text();
        let replaced = crate::search::replace_all(&text, set, replacement);
        self.document.set_text(&replaced);
        self.after_edit(now);
        tracing::debug!(target: "inkdown::session", count, "replace all");
        count
    }

    /// Current match readout, while the overlay is open.
    pub fn match_status(&self) -> Option<MatchStatus> {
        let overlay = self.overlay.as_ref()?;
        Some(match &overlay.matches {
            Some(set) => MatchStatus {
                current: set.display_index(),
                total: set.len(),
                invalid_pattern: overlay.invalid_pattern,
            },
            None => MatchStatus {
                current: 0,
                total: 0,
                invalid_pattern: overlay.invalid_pattern,
            },
        })
    }

    fn current_match_index(&self) -> Option<usize> {
        let set = self.overlay.as_ref()?.matches.as_ref()?;
        (!set.is_empty()).then(|| set.display_index() - 1)
    }

    /// Recompute the match set if the buffer moved underneath it.
    fn ensure_fresh_matches(&mut self) {
        let stale = self
            .overlay
            .as_ref()
            .and_then(|overlay| overlay.matches.as_ref())
            .is_some_and(|set| set.revision() != self.document.revision());
        if stale {
            let previous = self.current_match_index();
            self.refresh_matches(previous);
        }
    }

    fn refresh_matches(&mut self, preserve_index: Option<usize>) {
        let text = self.document.text();
        let revision = self.document.revision();
        let Some(overlay) = self.overlay.as_mut() else {
            return;
        };
        if overlay.query.is_empty() {
            overlay.matches = None;
            overlay.invalid_pattern = false;
            return;
        }
        match MatchSet::compute(&text, &overlay.query, revision) {
            Ok(mut set) => {
                if let Some(index) = preserve_index {
                    set.clamp_current(index);
                }
                overlay.invalid_pattern = false;
                overlay.matches = Some(set);
            }
            Err(err) => {
                tracing::debug!(target: "inkdown::session", error = %err, "query failed");
                overlay.invalid_pattern = true;
                overlay.matches = None;
            }
        }
    }

    fn select_current(&mut self) {
        let span = self
            .overlay
            .as_ref()
            .and_then(|overlay| overlay.matches.as_ref())
            .and_then(|set| set.current_span());
        if let Some(span) = span {
            self.document.select_byte_range(span.start, span.end);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::debounce::DEFAULT_QUIET_INTERVAL;
    use std::time::Duration;

    fn session_with(text: &str) -> EditorSession<EditorRope> {
        let mut session = EditorSession::new();
        session.load(text.to_string(), None);
        session
    }

    #[test]
    fn burst_of_edits_renders_once_with_final_text() {
        let mut session = session_with("");
        let start = Instant::now();

        session.insert(0, "# T", start);
        session.insert(3, "i", start + Duration::from_millis(20));
        session.insert(4, "tle", start + Duration::from_millis(40));

        // Inside the quiet window: nothing fires.
        assert!(session.tick(start + Duration::from_millis(100)).is_none());

        // After it: exactly one render, of the settled text.
        let rendered = session
            .tick(start + Duration::from_millis(40) + DEFAULT_QUIET_INTERVAL)
            .expect("render fired")
            .clone();
        assert!(rendered.markup.contains("<h1>Title</h1>"));
        assert_eq!(rendered.source_revision, session.document().revision());

        assert!(session.tick(start + Duration::from_secs(5)).is_none());
    }

    #[test]
    fn stale_render_is_not_installed() {
        let mut session = session_with("one");
        let stale = RenderedDocument {
            markup: "<p>old</p>".into(),
            source_revision: session.document().revision(),
        };
        session.insert(0, "x", Instant::now());
        assert!(!session.install_preview(stale));
        assert!(session.preview().is_none());
    }

    #[test]
    fn render_now_bypasses_debounce() {
        let mut session = session_with("**bold**");
        let rendered = session.render_now();
        assert!(rendered.markup.contains("<strong>bold</strong>"));
    }

    #[test]
    fn search_flow_counts_and_wraps() {
        let mut session = session_with("foo bar foo baz foo");
        session.apply(Command::Find);
        session.set_query(SearchQuery::literal("foo"));

        let status = session.match_status().expect("overlay open");
        assert_eq!(status.total, 3);
        assert_eq!(status.current, 1);
        assert!(!status.invalid_pattern);

        // The first match is mirrored into the selection.
        let selection = session.document().selection().expect("jumped to first");
        assert_eq!(selection.to_range(), 0..3);

        session.next_match();
        session.next_match();
        let wrapped = session.next_match().expect("wraps");
        assert_eq!(wrapped.start, 0);
        assert_eq!(session.match_status().unwrap().current, 1);
    }

    #[test]
    fn invalid_regex_surfaces_distinct_status() {
        let mut session = session_with("text");
        session.open_search(SearchMode::Find);
        session.set_query(SearchQuery {
            use_regex: true,
            ..SearchQuery::literal("(unclosed")
        });

        let status = session.match_status().expect("overlay open");
        assert_eq!(status.total, 0);
        assert!(status.invalid_pattern);
    }

    #[test]
    fn replace_current_recomputes_and_advances() {
        let mut session = session_with("foo bar foo");
        session.apply(Command::Replace);
        session.set_query(SearchQuery::literal("foo"));
        let now = Instant::now();

        assert!(session.replace_current("qux", now));
        assert_eq!(session.document().text(), "qux bar foo");

        // One match left; position clamped onto it.
        let status = session.match_status().expect("overlay open");
        assert_eq!(status.total, 1);
        assert_eq!(status.current, 1);

        assert!(session.replace_current("qux", now));
        assert_eq!(session.document().text(), "qux bar qux");
        assert_eq!(session.match_status().unwrap().total, 0);

        // Nothing remains to replace.
        assert!(!session.replace_current("qux", now));
    }

    #[test]
    fn replace_all_eliminates_all_matches() {
        let mut session = session_with("foo bar foo baz foo");
        session.apply(Command::Replace);
        session.set_query(SearchQuery::literal("foo"));

        let count = session.replace_all("qux", Instant::now());
        assert_eq!(count, 3);
        assert_eq!(session.document().text(), "qux bar qux baz qux");
        assert_eq!(session.match_status().unwrap().total, 0);
    }

    #[test]
    fn replace_refused_in_find_mode() {
        let mut session = session_with("foo");
        session.apply(Command::Find);
        session.set_query(SearchQuery::literal("foo"));
        assert!(!session.replace_current("x", Instant::now()));
        assert_eq!(session.replace_all("x", Instant::now()), 0);
        assert_eq!(session.document().text(), "foo");
    }

    #[test]
    fn mutation_invalidates_match_set() {
        let mut session = session_with("foo foo");
        session.open_search(SearchMode::Find);
        session.set_query(SearchQuery::literal("foo"));
        assert_eq!(session.match_status().unwrap().total, 2);

        // An edit that introduces a third occurrence.
        let len = session.document().buffer().len_chars();
        session.insert(len, " foo", Instant::now());
        assert_eq!(session.match_status().unwrap().total, 3);
    }

    #[test]
    fn close_search_discards_the_set() {
        let mut session = session_with("foo");
        session.open_search(SearchMode::Find);
        session.set_query(SearchQuery::literal("foo"));
        session.close_search();
        assert!(session.match_status().is_none());
        assert!(session.search_mode().is_none());
    }

    #[test]
    fn new_file_is_gated_on_dirty_buffer() {
        let mut session = session_with("content");
        session.insert(0, "x", Instant::now());
        assert!(session.document().is_dirty());

        let request = session.apply(Command::NewFile);
        assert_eq!(request, ShellRequest::ConfirmUnsaved(Command::NewFile));
        // Still intact: the gate aborted the reset.
        assert_eq!(session.document().text(), "xcontent");

        // Cancel keeps everything as-is.
        let request = session.resume_gated(Command::NewFile, UnsavedDecision::Cancel);
        assert_eq!(request, ShellRequest::Handled);
        assert_eq!(session.document().text(), "xcontent");

        // Discard proceeds.
        let request = session.resume_gated(Command::NewFile, UnsavedDecision::Discard);
        assert_eq!(request, ShellRequest::Handled);
        assert_eq!(session.document().text(), "");
        assert!(!session.document().is_dirty());
    }

    #[test]
    fn clean_buffer_skips_the_gate() {
        let mut session = session_with("saved content");
        // Loaded content starts clean, so NewFile resets immediately.
        assert_eq!(session.apply(Command::NewFile), ShellRequest::Handled);
        assert_eq!(session.document().text(), "");
    }

    #[test]
    fn save_commands_route_to_shell() {
        let mut session = session_with("content");
        assert_eq!(session.apply(Command::Save), ShellRequest::Save { path: None });

        session.mark_saved(PathBuf::from("/tmp/doc.md"));
        assert_eq!(
            session.apply(Command::Save),
            ShellRequest::Save {
                path: Some(PathBuf::from("/tmp/doc.md"))
            }
        );
        assert_eq!(session.apply(Command::SaveAs), ShellRequest::SaveAs);
        assert_eq!(
            session.apply(Command::Export(ThemeId::Academic)),
            ShellRequest::Export(ThemeId::Academic)
        );
    }

    #[test]
    fn toggle_preview_flips_visibility() {
        let mut session = session_with("");
        assert!(session.preview_visible());
        assert_eq!(session.apply(Command::TogglePreview), ShellRequest::Handled);
        assert!(!session.preview_visible());
    }
}
