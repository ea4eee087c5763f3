//! Print-ready host document assembly.
//!
//! Wraps rendered markup in a self-contained HTML page carrying the
//! theme's style sheet, ready to be loaded off-screen and paginated by the
//! rasterization backend. No external resources: math is MathML and code
//! colors are inlined class styles.

use inkdown_renderer::ThemeId;

/// Build the host page for `markup` under `theme`.
pub fn host_document(markup: &str, theme: ThemeId) -> String {
    let styles = theme.styles().stylesheet();
    format!(
        r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="UTF-8">
    <meta http-equiv="Content-Type" content="text/html; charset=utf-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>Document Export</title>
    <style>
{styles}
    </style>
</head>
<body>
    <div class="markdown-body">{markup}</div>
</body>
</html>
"#
    )
}
