//! The code render core shared by code cells and fenced code blocks in prose.
use ratatui::style::Style;
use ratatui::text::Line;
use ratatui::text::Span;

use crate::text::CodeHighlighter;
use crate::text::expand_tabs;

/// Written between the line number gutter and the code.
pub const GUTTER_SEPARATOR: &str = " │ ";

#[derive(Clone, Copy, Debug)]
pub struct CodeRenderOptions {
    pub line_numbers: bool,
    /// Number shown on the first line when `line_numbers` is on.
    pub first_line_number: usize,
    /// Tab stop width; `0` leaves tabs untouched.
    pub tab_width: usize,
    pub trim_trailing_blank_lines: bool,
}

impl Default for CodeRenderOptions {
    fn default() -> Self {
        Self {
            line_numbers: false,
            first_line_number: 1,
            tab_width: 4,
            trim_trailing_blank_lines: true,
        }
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct CodeRenderStyles {
    /// Patched under every highlight style.
    pub base: Style,
    pub gutter: Style,
}

/// Renders source lines into styled lines, one output line per kept input line.
///
/// The highlighter sees the whole tab-expanded input in one call, so constructs spanning lines
/// (block comments, strings) are highlighted correctly. Input that is empty after trimming
/// renders as a single empty line.
pub fn render_code_lines<S: AsRef<str>>(
    lines: &[S],
    language: Option<&str>,
    highlighter: Option<&dyn CodeHighlighter>,
    styles: CodeRenderStyles,
    options: CodeRenderOptions,
) -> Vec<Line<'static>> {
    let mut source = lines
        .iter()
        .map(|l| expand_tabs(l.as_ref(), options.tab_width))
        .collect::<Vec<String>>();
    if options.trim_trailing_blank_lines {
        while source.last().is_some_and(|l| l.trim().is_empty()) {
            source.pop();
        }
    }
    if source.is_empty() {
        return vec![Line::default()];
    }

    let last_number = options.first_line_number + source.len() - 1;
    let gutter_width = last_number.to_string().len();

    let mut highlighted = match highlighter {
        Some(hi) => hi.highlight_text(language, &source.join("\n")),
        None => Vec::new(),
    }
    .into_iter();

    source
        .into_iter()
        .enumerate()
        .map(|(i, raw)| {
            let code = highlighted
                .next()
                .unwrap_or_else(|| vec![Span::raw(raw)])
                .into_iter()
                .map(|span| {
                    let style = styles.base.patch(span.style);
                    span.style(style)
                });
            let mut spans: Vec<Span<'static>> = Vec::new();
            if options.line_numbers {
                let n = options.first_line_number + i;
                spans.push(Span::styled(
                    format!("{n:>gutter_width$}{GUTTER_SEPARATOR}"),
                    styles.gutter,
                ));
            }
            spans.extend(code);
            Line::from(spans)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::text::line_plain;
    use ratatui::style::Color;
    use std::sync::atomic::AtomicUsize;
    use std::sync::atomic::Ordering;

    fn plain(rendered: &[Line<'static>]) -> Vec<String> {
        rendered.iter().map(line_plain).collect()
    }

    #[test]
    fn highlights_all_lines_in_one_call() {
        #[derive(Default)]
        struct CountingHighlighter {
            calls: AtomicUsize,
        }

        impl CodeHighlighter for CountingHighlighter {
            fn highlight_lines(
                &self,
                _language: Option<&str>,
                lines: &[&str],
            ) -> Vec<Vec<Span<'static>>> {
                self.calls.fetch_add(1, Ordering::SeqCst);
                lines
                    .iter()
                    .map(|l| vec![Span::styled((*l).to_string(), Style::default())])
                    .collect()
            }
        }

        let hi = CountingHighlighter::default();
        let rendered = render_code_lines(
            &["a", "b", "c"],
            Some("rs"),
            Some(&hi),
            CodeRenderStyles::default(),
            CodeRenderOptions::default(),
        );

        assert_eq!(hi.calls.load(Ordering::SeqCst), 1);
        assert_eq!(plain(&rendered), ["a", "b", "c"]);
    }

    #[test]
    fn renders_line_numbers_with_separator() {
        let rendered = render_code_lines(
            &["a", "b"],
            None,
            None,
            CodeRenderStyles {
                base: Style::default(),
                gutter: Style::default().fg(Color::Red),
            },
            CodeRenderOptions {
                line_numbers: true,
                first_line_number: 9,
                ..CodeRenderOptions::default()
            },
        );

        assert_eq!(plain(&rendered), [" 9 │ a", "10 │ b"]);
        assert_eq!(rendered[0].spans[0].style.fg, Some(Color::Red));
    }

    #[test]
    fn trims_trailing_blank_lines_and_expands_tabs() {
        let rendered = render_code_lines(
            &["\tx = 1", "", "   "],
            None,
            None,
            CodeRenderStyles::default(),
            CodeRenderOptions::default(),
        );
        assert_eq!(plain(&rendered), ["    x = 1"]);
    }

    #[test]
    fn empty_input_renders_one_blank_line() {
        let empty: [&str; 0] = [];
        for input in [&empty[..], &["", ""][..]] {
            let rendered = render_code_lines(
                input,
                None,
                None,
                CodeRenderStyles::default(),
                CodeRenderOptions::default(),
            );
            assert_eq!(plain(&rendered), [""]);
        }
    }
}
