use ratatui::style::Style;
use ratatui::text::Line;
use ratatui::text::Span;

/// Produces styled spans for source code.
///
/// `language` is a lexer identifier as users type it: a file extension (`rs`, `py`) or a
/// language name (`Rust`, `python`). Implementations must return exactly one span list per input
/// line and fall back to unstyled spans for languages they do not know.
pub trait CodeHighlighter {
    fn highlight_lines(&self, language: Option<&str>, lines: &[&str]) -> Vec<Vec<Span<'static>>>;

    fn highlight_text(&self, language: Option<&str>, text: &str) -> Vec<Vec<Span<'static>>> {
        let lines: Vec<&str> = text.split('\n').collect();
        self.highlight_lines(language, &lines)
    }

    /// Whether `language` resolves to a real lexer rather than the plain-text fallback.
    fn supports_language(&self, _language: &str) -> bool {
        false
    }
}

/// Highlighter that leaves every line unstyled.
pub struct NoHighlight;

impl CodeHighlighter for NoHighlight {
    fn highlight_lines(&self, _language: Option<&str>, lines: &[&str]) -> Vec<Vec<Span<'static>>> {
        lines
            .iter()
            .map(|l| vec![Span::styled((*l).to_string(), Style::default())])
            .collect()
    }
}

/// Concatenated content of a line's spans, styles dropped.
pub fn line_plain(line: &Line<'_>) -> String {
    let mut out = String::new();
    for s in &line.spans {
        out.push_str(s.content.as_ref());
    }
    out
}

/// Replaces each tab with spaces up to the next multiple of `tab_width` display columns.
pub fn expand_tabs(line: &str, tab_width: usize) -> String {
    if tab_width == 0 || !line.contains('\t') {
        return line.to_string();
    }
    let mut out = String::with_capacity(line.len() + tab_width);
    let mut col = 0usize;
    for ch in line.chars() {
        if ch == '\t' {
            let pad = tab_width - (col % tab_width);
            out.extend(std::iter::repeat_n(' ', pad));
            col += pad;
        } else {
            out.push(ch);
            col += unicode_width::UnicodeWidthChar::width(ch).unwrap_or(0);
        }
    }
    out
}
