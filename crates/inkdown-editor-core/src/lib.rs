//! inkdown-editor-core: editing-session logic without framework dependencies.
//!
//! This crate provides:
//! - `TextBuffer` trait for text storage abstraction, with a ropey-backed
//!   `EditorRope` implementation
//! - `Document<T>` - the authoritative text plus file/dirty/revision state
//! - `DebounceScheduler` - change coalescing for the live preview
//! - the search/replace engine over buffer text
//! - `EditorSession<T>` - ties document, pipeline, scheduler and the search
//!   overlay together for the shell

pub mod config;
pub mod debounce;
pub mod document;
pub mod search;
pub mod session;
pub mod text;

pub use config::EditorConfig;
pub use debounce::{DEFAULT_QUIET_INTERVAL, DebounceScheduler};
pub use document::{Document, Selection};
pub use search::{MatchSet, MatchSpan, QueryError, SearchQuery, replace_all, replace_one};
pub use session::{
    Command, EditorSession, MatchStatus, RenderedDocument, SearchMode, ShellRequest,
    UnsavedDecision,
};
pub use text::{EditInfo, EditorRope, TextBuffer};
