//! inkdown-renderer: markdown → sanitized HTML markup.
//!
//! The pipeline is a pure transformation over the full source text:
//! parse (GitHub-flavored extensions + math), stream the event tree through
//! an HTML writer that highlights fenced code and renders math to MathML,
//! and serialize to a markup string. Raw HTML embedded in the source passes
//! through verbatim.

pub mod highlight;
pub mod html;
pub mod math;
pub mod theme;

use pulldown_cmark::{Options, Parser};
use syntect::parsing::SyntaxSet;

pub use theme::{Theme, ThemeId};

/// Parser options for the preview/export dialect: GFM tables, strikethrough,
/// task lists, footnotes, alert blockquotes, plus `$..$`/`$$..$$` math.
pub fn default_md_options() -> Options {
    Options::ENABLE_TABLES
        | Options::ENABLE_STRIKETHROUGH
        | Options::ENABLE_TASKLISTS
        | Options::ENABLE_FOOTNOTES
        | Options::ENABLE_GFM
        | Options::ENABLE_MATH
}

/// Markup returned for empty or whitespace-only input.
///
/// The preview surface always receives a container element, never an empty
/// string, so its styling hooks stay attached.
pub const EMPTY_MARKUP: &str = "<div></div>";

/// Error raised while serializing the event stream to markup.
///
/// This never reaches callers of [`RenderPipeline::render`], which degrades
/// to an error fragment instead; it exists for the fallible inner layer.
#[derive(thiserror::Error, Debug, miette::Diagnostic)]
pub enum RenderError {
    #[error("markup serialization failed: {0}")]
    #[diagnostic(code(inkdown::render::serialize))]
    Serialize(#[from] std::fmt::Error),
}

/// The markdown-to-markup pipeline.
///
/// Owns the parser options and the loaded syntax-definition set, both of
/// which are expensive to construct. Build one per editing session and
/// reuse it; there is no process-global instance.
pub struct RenderPipeline {
    options: Options,
    syntax_set: SyntaxSet,
}

impl Default for RenderPipeline {
    fn default() -> Self {
        Self::new()
    }
}

impl RenderPipeline {
    pub fn new() -> Self {
        Self {
            options: default_md_options(),
            syntax_set: SyntaxSet::load_defaults_newlines(),
        }
    }

    /// The syntax-definition set used for fenced-code highlighting.
    pub fn syntax_set(&self) -> &SyntaxSet {
        &self.syntax_set
    }

    /// Render markdown to markup, degrading on failure.
    ///
    /// Total: never panics, never returns an error. Whitespace-only input
    /// yields [`EMPTY_MARKUP`]; a serialization failure yields a visible
    /// error fragment embedding the failure text. The preview must never go
    /// blank on bad input.
    pub fn render(&self, source: &str) -> String {
        if source.trim().is_empty() {
            return EMPTY_MARKUP.to_string();
        }

        match self.try_render(source) {
            Ok(markup) => markup,
            Err(err) => {
                tracing::warn!(target: "inkdown::render", error = %err, "render degraded to error fragment");
                error_markup(&err.to_string())
            }
        }
    }

    /// Render markdown to markup, surfacing serialization errors.
    pub fn try_render(&self, source: &str) -> Result<String, RenderError> {
        let parser = Parser::new_ext(source, self.options);
        let mut markup = String::with_capacity(source.len() * 3 / 2);
        html::write_html_fmt(&mut markup, parser, &self.syntax_set)?;
        tracing::trace!(
            target: "inkdown::render",
            source_len = source.len(),
            markup_len = markup.len(),
            "rendered"
        );
        Ok(markup)
    }
}

/// Single-fragment markup shown when rendering fails outright.
fn error_markup(message: &str) -> String {
    use pulldown_cmark_escape::{FmtWriter, escape_html};

    let mut escaped = String::new();
    // Writing to a String cannot fail.
    let _ = escape_html(FmtWriter(&mut escaped), message);
    format!(r#"<p class="render-error" style="color: #ff6666;">Error rendering markdown: {escaped}</p>"#)
}
