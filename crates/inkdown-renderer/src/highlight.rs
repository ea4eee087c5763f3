//! Class-based syntax highlighting for fenced code blocks.
//!
//! Token classification only: the output carries syntect's scope classes,
//! and color comes from the theme stylesheet. An unknown or missing
//! language falls back to the plain-text syntax, never an error.

use syntect::html::{ClassStyle, ClassedHTMLGenerator};
use syntect::parsing::SyntaxSet;
use syntect::util::LinesWithEndings;

/// Highlight one fenced code block body into class-annotated span markup.
///
/// `out` receives only the span content; the caller owns the surrounding
/// `<pre><code>` wrapper. Errors are syntect parse failures, which callers
/// should treat as "emit the block as plain escaped text".
pub fn highlight(
    syntax_set: &SyntaxSet,
    language: Option<&str>,
    code: &str,
    out: &mut String,
) -> Result<(), syntect::Error> {
    let syntax = language
        .and_then(|token| syntax_set.find_syntax_by_token(token))
        .unwrap_or_else(|| syntax_set.find_syntax_plain_text());

    tracing::trace!(
        target: "inkdown::highlight",
        language = language.unwrap_or("<none>"),
        syntax = %syntax.name,
        bytes = code.len(),
        "highlighting code block"
    );

    let mut generator =
        ClassedHTMLGenerator::new_with_class_style(syntax, syntax_set, ClassStyle::Spaced);
    for line in LinesWithEndings::from(code) {
        generator.parse_html_for_line_which_includes_newline(line)?;
    }
    out.push_str(&generator.finalize());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(language: Option<&str>, code: &str) -> String {
        let syntax_set = SyntaxSet::load_defaults_newlines();
        let mut out = String::new();
        highlight(&syntax_set, language, code, &mut out).expect("highlight failed");
        out
    }

    #[test]
    fn known_language_produces_classified_spans() {
        let out = run(Some("rust"), "fn main() {}\n");
        assert!(out.contains("<span"));
        assert!(out.contains("fn"));
    }

    #[test]
    fn unknown_language_falls_back_to_plain_text() {
        let out = run(Some("no-such-language"), "plain content\n");
        assert!(out.contains("plain content"));
    }

    #[test]
    fn no_language_is_plain_text() {
        let out = run(None, "a < b\n");
        // Plain text is still HTML-escaped.
        assert!(out.contains("&lt;"));
    }
}
