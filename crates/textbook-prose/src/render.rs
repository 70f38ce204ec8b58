//! The prose cell pipeline.
use ratatui::text::Line;
use std::sync::Arc;
use textbook_core::text::CodeHighlighter;
use textbook_core::theme::Theme;
use tracing::debug;

use crate::blocks::ProseBlock;
use crate::blocks::classify;
use crate::blocks::parse_table;
use crate::comment::CommentPattern;
use crate::equation::substitute_math;
use crate::markdown::MarkdownLayout;
use crate::markdown::layout_markdown;
use crate::panel::PANEL_TITLE;
use crate::panel::frame;
use crate::panel::inner_width;
use crate::table::TableStyle;
use crate::table::layout_table;

#[derive(Clone, Copy, Debug)]
pub struct ProseOptions {
    /// Target width in terminal columns.
    pub width: u16,
    pub table_style: TableStyle,
    /// Number the lines of fenced code blocks inside prose.
    pub code_line_numbers: bool,
    /// Draw a titled frame around the cell; `width` is then the frame's outer width.
    pub panel: bool,
}

impl Default for ProseOptions {
    fn default() -> Self {
        Self {
            width: 80,
            table_style: TableStyle::default(),
            code_line_numbers: false,
            panel: false,
        }
    }
}

pub type SharedHighlighter = Arc<dyn CodeHighlighter + Send + Sync>;

/// Renders prose cell bodies.
///
/// Each body goes through comment stripping, math substitution and block classification. Text
/// blocks are laid out as markdown and table blocks as tables; blocks are separated by one blank
/// line.
#[derive(Clone)]
pub struct ProseRenderer {
    options: ProseOptions,
    theme: Theme,
    highlighter: Option<SharedHighlighter>,
}

impl ProseRenderer {
    pub fn new(options: ProseOptions) -> Self {
        Self {
            options,
            theme: Theme::default(),
            highlighter: None,
        }
    }

    pub fn with_theme(mut self, theme: Theme) -> Self {
        self.theme = theme;
        self
    }

    /// Highlights fenced code blocks that name a language.
    pub fn with_highlighter(mut self, highlighter: SharedHighlighter) -> Self {
        self.highlighter = Some(highlighter);
        self
    }

    pub fn options(&self) -> &ProseOptions {
        &self.options
    }

    pub fn render(&self, body: &str, comments: &CommentPattern) -> Vec<Line<'static>> {
        if self.options.panel {
            let inside = self.render_at(body, comments, inner_width(self.options.width));
            return frame(inside, PANEL_TITLE, self.options.width, &self.theme);
        }
        self.render_at(body, comments, self.options.width)
    }

    fn render_at(&self, body: &str, comments: &CommentPattern, width: u16) -> Vec<Line<'static>> {
        let stripped = comments.strip_lines(body);
        let lines = substitute_math(&stripped);

        let mut out: Vec<Line<'static>> = Vec::new();
        for block in classify(&lines) {
            let rendered = self.render_block(&block, width);
            if rendered.is_empty() {
                continue;
            }
            if !out.is_empty() {
                out.push(Line::default());
            }
            out.extend(rendered);
        }
        out
    }

    fn render_block(&self, block: &ProseBlock, width: u16) -> Vec<Line<'static>> {
        match block {
            ProseBlock::Text(lines) => self.markdown(lines, width),
            ProseBlock::Table(lines) => match parse_table(lines) {
                Ok(table) => layout_table(&table, width, self.options.table_style, &self.theme),
                Err(reason) => {
                    debug!(%reason, lines = lines.len(), "table block rendered as prose");
                    self.markdown(lines, width)
                }
            },
        }
    }

    fn markdown(&self, lines: &[String], width: u16) -> Vec<Line<'static>> {
        layout_markdown(
            &lines.join("\n"),
            MarkdownLayout {
                width,
                theme: &self.theme,
                highlighter: self
                    .highlighter
                    .as_deref()
                    .map(|h| h as &dyn CodeHighlighter),
                code_line_numbers: self.options.code_line_numbers,
            },
        )
    }
}

impl Default for ProseRenderer {
    fn default() -> Self {
        Self::new(ProseOptions::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use textbook_core::text::line_plain;

    fn render(body: &str) -> Vec<String> {
        ProseRenderer::new(ProseOptions {
            width: 40,
            ..ProseOptions::default()
        })
        .with_theme(Theme::plain())
        .render(body, &CommentPattern::default())
        .iter()
        .map(line_plain)
        .collect()
    }

    #[test]
    fn strips_comments_and_converts_math() {
        let out = render("# The value $x^2$ is positive");
        assert_eq!(out, vec!["The value x² is positive"]);
    }

    #[test]
    fn empty_bodies_render_nothing() {
        assert!(render("").is_empty());
        assert!(render("#\n#").is_empty());
    }

    #[test]
    fn tables_are_separated_from_text_by_one_blank_line() {
        let out = render("# Intro\n# | a | b |\n# |---|---|\n# | 1 | 2 |\n# Outro");
        assert_eq!(out.first().map(String::as_str), Some("Intro"));
        assert_eq!(out[1], "");
        assert!(out[2].contains('│'));
        assert_eq!(out[out.len() - 2], "");
        assert_eq!(out.last().map(String::as_str), Some("Outro"));
    }

    #[test]
    fn malformed_tables_fall_back_to_prose() {
        let out = render("# | a | b |\n# | c | d |");
        assert_eq!(out, vec!["| a | b | | c | d |"]);
    }

    #[test]
    fn unpadded_tables_render_and_a_short_row_falls_back_whole() {
        let out = render("# |a|b|\n# |-|-|\n# |1|2|");
        assert_eq!(out, vec![" a │ b ", "───┼───", " 1 │ 2 "]);

        let out = render("# |a|b|\n# |-|-|\n# |-|");
        assert_eq!(out, vec!["|a|b| |-|-| |-|"]);
    }

    #[test]
    fn fenced_code_inside_prose_is_indented() {
        let out = render("# ```\n# x | y | z\n# ```");
        assert_eq!(out, vec!["  x | y | z"]);
    }

    #[test]
    fn panels_frame_the_cell_at_the_outer_width() {
        let out: Vec<String> = ProseRenderer::new(ProseOptions {
            width: 24,
            panel: true,
            ..ProseOptions::default()
        })
        .with_theme(Theme::plain())
        .render("# one two three four five", &CommentPattern::default())
        .iter()
        .map(line_plain)
        .collect();
        assert_eq!(
            out,
            [
                "╭────── markdown ──────╮",
                "│ one two three four   │",
                "│ five                 │",
                "╰──────────────────────╯",
            ]
        );
    }

    #[test]
    fn headings_keep_their_text() {
        let out = render("# # Title\n#\n# body");
        assert_eq!(out, vec!["Title", "", "body"]);
    }
}
