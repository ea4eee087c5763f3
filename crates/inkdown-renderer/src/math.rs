//! TeX math rendering via pulldown-latex → MathML.
//!
//! Failures are contained per expression: a broken formula renders as an
//! inline error fragment carrying the source and the parser's message, so
//! the rest of the document is unaffected.

use pulldown_cmark_escape::{FmtWriter, escape_html};
use pulldown_latex::{
    Parser, Storage, config::DisplayMode, config::RenderConfig, mathml::push_mathml,
};

/// Outcome of rendering one math expression.
pub enum MathOutput {
    /// MathML markup for the expression.
    Markup(String),
    /// Rendering failed; `fragment` is display-ready error markup.
    Error { fragment: String, message: String },
}

/// Render a TeX expression (without `$`/`$$` delimiters) to MathML.
pub fn render_math(source: &str, display: bool) -> MathOutput {
    let storage = Storage::new();
    let parser = Parser::new(source, &storage);
    let config = RenderConfig {
        display_mode: if display {
            DisplayMode::Block
        } else {
            DisplayMode::Inline
        },
        ..Default::default()
    };

    // pulldown-latex surfaces parse errors as Err events; collect them all
    // so the fragment can report every problem in the expression at once.
    let events: Vec<_> = parser.collect();
    let errors: Vec<String> = events
        .iter()
        .filter_map(|e| e.as_ref().err().map(|err| err.to_string()))
        .collect();

    if !errors.is_empty() {
        let message = errors.join("; ");
        tracing::debug!(target: "inkdown::math", source, %message, "math parse failed");
        return MathOutput::Error {
            fragment: error_fragment(source, &message, display),
            message,
        };
    }

    let mut mathml = String::new();
    match push_mathml(&mut mathml, events.into_iter(), config) {
        Ok(()) => MathOutput::Markup(mathml),
        Err(err) => {
            let message = err.to_string();
            tracing::debug!(target: "inkdown::math", source, %message, "mathml emission failed");
            MathOutput::Error {
                fragment: error_fragment(source, &message, display),
                message,
            }
        }
    }
}

fn error_fragment(source: &str, error: &str, display: bool) -> String {
    let mode_class = if display { "math-display" } else { "math-inline" };
    let mut escaped_source = String::new();
    let mut escaped_error = String::new();
    // Writing to a String cannot fail.
    let _ = escape_html(FmtWriter(&mut escaped_source), source);
    let _ = escape_html(FmtWriter(&mut escaped_error), error);
    format!(
        r#"<span class="math math-error {mode_class}" style="color: #ff6666;" title="{escaped_error}"><code>{escaped_source}</code></span>"#
    )
}
