use std::sync::LazyLock;

use ratatui::style::Color;
use ratatui::style::Modifier;
use ratatui::style::Style;
use ratatui::text::Span;
use syntect::easy::HighlightLines;
use syntect::highlighting::FontStyle;
use syntect::highlighting::Theme;
use syntect::highlighting::ThemeSet;
use syntect::parsing::SyntaxReference;
use syntect::parsing::SyntaxSet;
use textbook_core::text::CodeHighlighter;

use crate::DEFAULT_THEME;
use crate::UnknownTheme;

/// Bundled grammars, loaded once per process and shared by every highlighter.
static SYNTAXES: LazyLock<SyntaxSet> = LazyLock::new(SyntaxSet::load_defaults_newlines);

const FONT_MODIFIERS: [(FontStyle, Modifier); 3] = [
    (FontStyle::BOLD, Modifier::BOLD),
    (FontStyle::ITALIC, Modifier::ITALIC),
    (FontStyle::UNDERLINE, Modifier::UNDERLINED),
];

/// Highlights code cells with syntect's bundled grammars and themes.
///
/// Lexer ids are resolved the way notebook users type them: a file extension (`py`, `rs`) or a
/// language name (`Python`, `rust`), both case-insensitive. Anything else renders as plain text.
pub struct SyntectHighlighter {
    theme: Theme,
}

impl SyntectHighlighter {
    /// Uses [`DEFAULT_THEME`].
    pub fn new() -> Self {
        let mut themes = ThemeSet::load_defaults().themes;
        let theme = themes
            .remove(DEFAULT_THEME)
            .or_else(|| themes.into_values().next())
            .unwrap_or_default();
        Self { theme }
    }

    /// Uses the bundled theme called `name` (matched case-insensitively).
    pub fn with_theme(name: &str) -> Result<Self, UnknownTheme> {
        let themes = ThemeSet::load_defaults().themes;
        let Some((key, theme)) = themes
            .into_iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
        else {
            return Err(UnknownTheme {
                name: name.to_string(),
                available: crate::theme_names(),
            });
        };
        tracing::debug!(theme = %key, "loaded syntect theme");
        Ok(Self { theme })
    }

    pub fn theme_names() -> Vec<String> {
        ThemeSet::load_defaults().themes.into_keys().collect()
    }

    fn lexer(&self, id: &str) -> Option<&'static SyntaxReference> {
        let syntaxes: &'static SyntaxSet = &SYNTAXES;
        syntaxes
            .find_syntax_by_extension(id)
            .or_else(|| syntaxes.find_syntax_by_extension(&id.to_ascii_lowercase()))
            .or_else(|| syntaxes.find_syntax_by_token(id))
    }
}

impl Default for SyntectHighlighter {
    fn default() -> Self {
        Self::new()
    }
}

impl CodeHighlighter for SyntectHighlighter {
    fn highlight_lines(&self, language: Option<&str>, lines: &[&str]) -> Vec<Vec<Span<'static>>> {
        let syntax = language
            .and_then(|id| self.lexer(id))
            .unwrap_or_else(|| SYNTAXES.find_syntax_plain_text());
        let mut state = HighlightLines::new(syntax, &self.theme);

        lines
            .iter()
            .map(|line| {
                // Grammars loaded with newlines expect every line to keep its terminator.
                let terminated = format!("{line}\n");
                let regions = match state.highlight_line(&terminated, &SYNTAXES) {
                    Ok(regions) => regions,
                    Err(err) => {
                        tracing::debug!(%err, "syntect failed on a line, leaving it unstyled");
                        Vec::new()
                    }
                };
                let spans = regions
                    .into_iter()
                    .map(|(style, piece)| (style, piece.trim_end_matches('\n')))
                    .filter(|(_, piece)| !piece.is_empty())
                    .map(|(style, piece)| Span::styled(piece.to_string(), to_ratatui(style)))
                    .collect::<Vec<_>>();
                if spans.is_empty() {
                    vec![Span::raw((*line).to_string())]
                } else {
                    spans
                }
            })
            .collect()
    }

    fn supports_language(&self, language: &str) -> bool {
        self.lexer(language).is_some()
    }
}

fn to_ratatui(style: syntect::highlighting::Style) -> Style {
    let fg = style.foreground;
    FONT_MODIFIERS
        .iter()
        .filter(|(font, _)| style.font_style.contains(*font))
        .fold(Style::default().fg(Color::Rgb(fg.r, fg.g, fg.b)), |acc, (_, m)| {
            acc.add_modifier(*m)
        })
}
