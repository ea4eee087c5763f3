//! Export/preview themes.
//!
//! A closed set of theme identities, each mapping to a style table. Unknown
//! names parse to the default theme rather than failing.

use smol_str::SmolStr;

/// Identity of a document theme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ThemeId {
    /// Screen-oriented reading style.
    #[default]
    Default,
    /// Serif, 12pt, justified; print/paper conventions.
    Academic,
}

impl ThemeId {
    /// Parse a theme name, falling back to `Default` for unknown values.
    pub fn parse(name: &str) -> Self {
        match name {
            "academic" => Self::Academic,
            _ => Self::Default,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Default => "default",
            Self::Academic => "academic",
        }
    }

    /// The style table for this theme.
    pub fn styles(&self) -> Theme {
        match self {
            Self::Default => Theme::default(),
            Self::Academic => Theme::academic(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Theme {
    pub colors: ColorScheme,
    pub fonts: FontScheme,
    pub spacing: SpacingScheme,
    /// Justify body text (paper convention).
    pub justify: bool,
    pub syntect_theme_name: SmolStr,
}

#[derive(Debug, Clone)]
pub struct ColorScheme {
    pub background: SmolStr,
    pub foreground: SmolStr,
    pub heading: SmolStr,
    pub rule: SmolStr,
    pub code_background: SmolStr,
}

#[derive(Debug, Clone)]
pub struct FontScheme {
    pub body: SmolStr,
    pub heading: SmolStr,
    pub monospace: SmolStr,
}

#[derive(Debug, Clone)]
pub struct SpacingScheme {
    pub base_font_size: SmolStr,
    pub line_height: SmolStr,
    pub page_padding: SmolStr,
    pub max_width: SmolStr,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            colors: ColorScheme {
                background: SmolStr::new("#ffffff"),
                foreground: SmolStr::new("#24292f"),
                heading: SmolStr::new("#1f2328"),
                rule: SmolStr::new("#d0d7de"),
                code_background: SmolStr::new("#f6f8fa"),
            },
            fonts: FontScheme {
                body: SmolStr::new(
                    "system-ui, -apple-system, BlinkMacSystemFont, 'Segoe UI', sans-serif",
                ),
                heading: SmolStr::new(
                    "system-ui, -apple-system, BlinkMacSystemFont, 'Segoe UI', sans-serif",
                ),
                monospace: SmolStr::new(
                    "'Cascadia Code', 'Roboto Mono', Consolas, monospace",
                ),
            },
            spacing: SpacingScheme {
                base_font_size: SmolStr::new("16px"),
                line_height: SmolStr::new("1.6"),
                page_padding: SmolStr::new("1.5cm"),
                max_width: SmolStr::new("900px"),
            },
            justify: false,
            syntect_theme_name: SmolStr::new("InspiredGitHub"),
        }
    }
}

impl Theme {
    fn academic() -> Self {
        Self {
            colors: ColorScheme {
                background: SmolStr::new("#ffffff"),
                foreground: SmolStr::new("#000000"),
                heading: SmolStr::new("#000000"),
                rule: SmolStr::new("#000000"),
                code_background: SmolStr::new("#f5f5f5"),
            },
            fonts: FontScheme {
                body: SmolStr::new("'Times New Roman', serif"),
                heading: SmolStr::new("'Times New Roman', serif"),
                monospace: SmolStr::new("'Courier New', monospace"),
            },
            spacing: SpacingScheme {
                base_font_size: SmolStr::new("12pt"),
                line_height: SmolStr::new("1.5"),
                page_padding: SmolStr::new("2.5cm"),
                max_width: SmolStr::new("800px"),
            },
            justify: true,
            syntect_theme_name: SmolStr::new("InspiredGitHub"),
        }
    }

    /// Generate the style sheet for a host document using this theme.
    ///
    /// Includes the syntect class styles so highlighted code blocks carry
    /// color without external resources; if the code theme cannot be
    /// resolved the sheet simply omits those rules.
    pub fn stylesheet(&self) -> String {
        let Theme {
            colors,
            fonts,
            spacing,
            justify,
            syntect_theme_name,
        } = self;
        let text_align = if *justify { "justify" } else { "left" };

        let mut css = format!(
            r#"body {{
    font-family: {body_font};
    font-size: {font_size};
    line-height: {line_height};
    color: {foreground};
    background: {background};
    max-width: {max_width};
    margin: 0 auto;
    padding: {padding};
    text-align: {text_align};
}}
h1, h2, h3, h4, h5, h6 {{
    font-family: {heading_font};
    color: {heading};
    line-height: 1.2;
    text-align: left;
}}
h1 {{ border-bottom: 1px solid {rule}; padding-bottom: 0.3em; }}
pre {{
    font-family: {monospace};
    background: {code_background};
    padding: 12px;
    overflow-x: auto;
    page-break-inside: avoid;
}}
code {{ font-family: {monospace}; }}
blockquote {{
    border-left: 4px solid {rule};
    margin-left: 0;
    padding-left: 1em;
}}
table {{ border-collapse: collapse; }}
th, td {{ border: 1px solid {rule}; padding: 4px 10px; }}
img {{ max-width: 100%; }}
.math-display {{ display: block; text-align: center; }}
.math-error {{ color: #ff6666; }}
"#,
            body_font = fonts.body,
            font_size = spacing.base_font_size,
            line_height = spacing.line_height,
            foreground = colors.foreground,
            background = colors.background,
            max_width = spacing.max_width,
            padding = spacing.page_padding,
            heading_font = fonts.heading,
            heading = colors.heading,
            rule = colors.rule,
            code_background = colors.code_background,
            monospace = fonts.monospace,
        );

        if let Some(code_css) = syntect_class_css(syntect_theme_name) {
            css.push_str(&code_css);
        }
        css
    }
}

/// Class-style CSS for the named syntect theme, if it resolves.
fn syntect_class_css(name: &str) -> Option<String> {
    use syntect::highlighting::ThemeSet;
    use syntect::html::{ClassStyle, css_for_theme_with_class_style};

    let themes = ThemeSet::load_defaults();
    let theme = themes.themes.get(name)?;
    match css_for_theme_with_class_style(theme, ClassStyle::Spaced) {
        Ok(css) => Some(css),
        Err(err) => {
            tracing::warn!(target: "inkdown::theme", theme = name, error = %err, "code style generation failed");
            None
        }
    }
}
