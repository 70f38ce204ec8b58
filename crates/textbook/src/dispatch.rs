//! Render dispatch: turns a parsed document into a rendered one.
//!
//! Each cell goes to the renderer registered for its [`CellType`]. Rendered ranges are derived
//! from the number of lines each cell actually emits, so they stay contiguous by construction.
use ratatui::style::Style;
use ratatui::text::Line;
use ratatui::text::Span;
use std::sync::Arc;
use textbook_core::ansi::ColorMode;
use textbook_core::ansi::encode_lines;
use textbook_core::code_render::CodeRenderOptions;
use textbook_core::code_render::CodeRenderStyles;
use textbook_core::code_render::render_code_lines;
use textbook_core::model::CellRange;
use textbook_core::model::CellType;
use textbook_core::model::ParsedCell;
use textbook_core::model::ParsedDocument;
use textbook_core::model::RenderedCell;
use textbook_core::model::RenderedDocument;
use textbook_core::text::CodeHighlighter;
use textbook_core::theme::Theme;
use textbook_prose::CommentPattern;
use textbook_prose::ProseOptions;
use textbook_prose::ProseRenderer;
use textbook_prose::SharedHighlighter;
use textbook_syntax::NO_THEME;
use thiserror::Error;
use tracing::debug;
use tracing::warn;

use crate::config::CellLabel;
use crate::config::ConfigError;
use crate::config::RenderConfig;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("no renderer registered for {cell_type} cells (cell {index})")]
    UnsupportedCellType { index: usize, cell_type: CellType },
}

/// Per-cell information handed to a [`CellRenderer`].
#[derive(Clone, Debug)]
pub struct CellContext<'a> {
    /// Zero-based position in the document.
    pub index: usize,
    /// Formatted header, e.g. `Cell 3`.
    pub label: String,
    pub theme: &'a Theme,
}

pub trait CellRenderer {
    /// Renders a cell body (the cell text without its separator line).
    fn render_body(
        &self,
        body: &str,
        ctx: &CellContext<'_>,
    ) -> Result<Vec<Line<'static>>, RenderError>;

    /// Header line, body, then exactly one blank line.
    fn render(
        &self,
        cell: &ParsedCell,
        ctx: &CellContext<'_>,
    ) -> Result<Vec<Line<'static>>, RenderError> {
        let mut lines = vec![Line::from(Span::styled(ctx.label.clone(), ctx.theme.header))];
        lines.extend(self.render_body(cell.body(), ctx)?);
        lines.push(Line::default());
        Ok(lines)
    }
}

/// Highlights code cell bodies with one lexer for the whole document.
pub struct CodeCellRenderer {
    lexer: String,
    highlighter: SharedHighlighter,
    line_numbers: bool,
}

impl CodeCellRenderer {
    pub fn new(lexer: impl Into<String>, highlighter: SharedHighlighter) -> Self {
        Self {
            lexer: lexer.into(),
            highlighter,
            line_numbers: false,
        }
    }

    pub fn with_line_numbers(mut self, line_numbers: bool) -> Self {
        self.line_numbers = line_numbers;
        self
    }
}

impl CellRenderer for CodeCellRenderer {
    fn render_body(
        &self,
        body: &str,
        ctx: &CellContext<'_>,
    ) -> Result<Vec<Line<'static>>, RenderError> {
        let lines = body.split('\n').collect::<Vec<_>>();
        let highlighter: &dyn CodeHighlighter = self.highlighter.as_ref();
        let rendered = render_code_lines(
            &lines,
            Some(&self.lexer),
            Some(highlighter),
            CodeRenderStyles {
                base: ctx.theme.text_primary,
                gutter: ctx.theme.gutter,
            },
            CodeRenderOptions {
                line_numbers: self.line_numbers,
                ..CodeRenderOptions::default()
            },
        );
        Ok(rendered)
    }
}

/// Renders prose cells through [`ProseRenderer`].
pub struct ProseCellRenderer {
    renderer: ProseRenderer,
    comments: CommentPattern,
}

impl ProseCellRenderer {
    pub fn new(renderer: ProseRenderer, comments: CommentPattern) -> Self {
        Self { renderer, comments }
    }
}

impl CellRenderer for ProseCellRenderer {
    fn render_body(
        &self,
        body: &str,
        _ctx: &CellContext<'_>,
    ) -> Result<Vec<Line<'static>>, RenderError> {
        Ok(self.renderer.render(body, &self.comments))
    }
}

/// Renders whole documents.
///
/// ```
/// use textbook::Renderer;
/// use textbook::RenderConfig;
/// use textbook_core::segment::Segmenter;
///
/// let parsed = Segmenter::default()
///     .segment_text("# %% [markdown]\n# Hello\n# %% [code]\nx = 1")
///     .unwrap();
/// let config = RenderConfig {
///     color: false,
///     ..RenderConfig::default()
/// };
/// let renderer = Renderer::new(config).unwrap();
/// let rendered = renderer.render(&parsed).unwrap();
/// assert_eq!(rendered.cells[0].text, "Cell 1\nHello\n\n");
/// assert_eq!(rendered.cells[1].text, "Cell 2\nx = 1\n\n");
/// ```
pub struct Renderer {
    config: RenderConfig,
    label: CellLabel,
    theme: Theme,
    color: ColorMode,
    code: Option<Box<dyn CellRenderer>>,
    prose: Option<Box<dyn CellRenderer>>,
}

impl Renderer {
    /// Validates `config` and registers the built-in code and prose renderers.
    pub fn new(config: RenderConfig) -> Result<Self, ConfigError> {
        let validated = config.validate()?;
        let highlighter: SharedHighlighter = Arc::from(validated.highlighter);

        if !config.theme.eq_ignore_ascii_case(NO_THEME)
            && !highlighter.supports_language(&config.lexer)
        {
            warn!(lexer = %config.lexer, "unknown lexer; code cells are rendered as plain text");
        }

        let theme = Theme::default().with_header(Style::default().fg(validated.header_color));
        let code = CodeCellRenderer::new(config.lexer.clone(), highlighter.clone())
            .with_line_numbers(config.code_line_numbers);
        let prose = ProseRenderer::new(ProseOptions {
            width: config.width,
            table_style: config.table_style,
            code_line_numbers: config.code_line_numbers,
            panel: config.prose_panel,
        })
        .with_theme(theme.clone())
        .with_highlighter(highlighter);

        Ok(Self {
            color: if config.color {
                ColorMode::Ansi
            } else {
                ColorMode::Plain
            },
            label: validated.label,
            theme,
            code: Some(Box::new(code)),
            prose: Some(Box::new(ProseCellRenderer::new(prose, validated.comments))),
            config,
        })
    }

    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    /// Replaces the renderer for `cell_type`.
    pub fn with_renderer(mut self, cell_type: CellType, renderer: Box<dyn CellRenderer>) -> Self {
        *self.slot(cell_type) = Some(renderer);
        self
    }

    /// Unregisters the renderer for `cell_type`; rendering such a cell then fails.
    pub fn without(mut self, cell_type: CellType) -> Self {
        *self.slot(cell_type) = None;
        self
    }

    fn slot(&mut self, cell_type: CellType) -> &mut Option<Box<dyn CellRenderer>> {
        match cell_type {
            CellType::Code => &mut self.code,
            CellType::Prose => &mut self.prose,
        }
    }

    /// Styled lines of one cell, header and trailing blank line included.
    ///
    /// Spans holding a line break are split so every returned line is one terminal line.
    pub fn render_cell(
        &self,
        index: usize,
        cell: &ParsedCell,
    ) -> Result<Vec<Line<'static>>, RenderError> {
        let renderer = match cell.cell_type {
            CellType::Code => self.code.as_deref(),
            CellType::Prose => self.prose.as_deref(),
        }
        .ok_or(RenderError::UnsupportedCellType {
            index,
            cell_type: cell.cell_type,
        })?;
        let ctx = CellContext {
            index,
            label: self.label.format(index + 1),
            theme: &self.theme,
        };
        renderer.render(cell, &ctx).map(split_line_breaks)
    }

    pub fn render(&self, parsed: &ParsedDocument) -> Result<RenderedDocument, RenderError> {
        let mut cells = Vec::with_capacity(parsed.len());
        let mut start = 0usize;
        for (index, cell) in parsed.iter().enumerate() {
            let lines = self.render_cell(index, cell)?;
            let text = encode_lines(&lines, self.color);
            let end = start + text.lines().count();
            cells.push(RenderedCell {
                text,
                cell_range: CellRange::new(start, end),
            });
            start = end;
        }
        debug!(cells = cells.len(), lines = start, "rendered document");
        Ok(RenderedDocument {
            source_fingerprint: parsed.source_fingerprint.clone(),
            cells,
        })
    }
}

/// Breaks lines whose spans contain `\n` into one line per segment, keeping span styles.
fn split_line_breaks(lines: Vec<Line<'static>>) -> Vec<Line<'static>> {
    if !lines
        .iter()
        .any(|l| l.spans.iter().any(|s| s.content.contains('\n')))
    {
        return lines;
    }
    let mut out = Vec::with_capacity(lines.len());
    for line in lines {
        let line_style = line.style;
        let mut current: Vec<Span<'static>> = Vec::new();
        for span in line.spans {
            let mut pieces = span.content.split('\n');
            if let Some(first) = pieces.next()
                && !first.is_empty()
            {
                current.push(Span::styled(first.to_string(), span.style));
            }
            for piece in pieces {
                out.push(Line::from(std::mem::take(&mut current)).style(line_style));
                if !piece.is_empty() {
                    current.push(Span::styled(piece.to_string(), span.style));
                }
            }
        }
        out.push(Line::from(current).style(line_style));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use textbook_core::segment::Segmenter;

    fn plain_config() -> RenderConfig {
        RenderConfig {
            color: false,
            theme: NO_THEME.to_string(),
            ..RenderConfig::default()
        }
    }

    fn parse(text: &str) -> ParsedDocument {
        Segmenter::default().segment_text(text).unwrap()
    }

    #[test]
    fn ranges_follow_emitted_line_counts() {
        let parsed = parse("# %% [code]\na = 1\nb = 2\n\n\n# %% [markdown]\n# hi\n# %% [code]");
        let rendered = Renderer::new(plain_config()).unwrap().render(&parsed).unwrap();

        assert_eq!(rendered.len(), parsed.len());
        assert_eq!(rendered.validate(), Ok(()));
        assert_eq!(rendered.cells[0].text, "Cell 1\na = 1\nb = 2\n\n");
        assert_eq!(rendered.cells[0].cell_range, CellRange::new(0, 4));
        assert_eq!(rendered.cells[1].text, "Cell 2\nhi\n\n");
        assert_eq!(rendered.cells[1].cell_range, CellRange::new(4, 7));
        // An empty body still renders as one blank line.
        assert_eq!(rendered.cells[2].text, "Cell 3\n\n\n");
        assert_eq!(rendered.cells[2].cell_range, CellRange::new(7, 10));
        for cell in &rendered {
            assert_eq!(cell.line_count(), cell.cell_range.len());
        }
        assert_eq!(rendered.source_fingerprint, parsed.source_fingerprint);
    }

    #[test]
    fn html_spanning_lines_keeps_ranges_in_step_with_text() {
        let parsed = parse("# %% [markdown]\n# before <!-- a\n# b --> after\n# %% [code]\nx");
        let rendered = Renderer::new(plain_config()).unwrap().render(&parsed).unwrap();

        assert_eq!(rendered.validate(), Ok(()));
        for cell in &rendered {
            assert_eq!(cell.line_count(), cell.cell_range.len());
        }
        assert_eq!(rendered.cells[0].text, "Cell 1\nbefore <!-- a b --> after\n\n");
        assert_eq!(rendered.cells[1].cell_range.start, 3);
    }

    #[test]
    fn line_breaks_inside_spans_become_separate_lines() {
        struct Multiline;

        impl CellRenderer for Multiline {
            fn render_body(
                &self,
                _body: &str,
                _ctx: &CellContext<'_>,
            ) -> Result<Vec<Line<'static>>, RenderError> {
                Ok(vec![Line::from(vec![Span::raw("a\nb"), Span::raw("c\n")])])
            }
        }

        let parsed = parse("# %% [code]\nx\n# %% [code]\ny");
        let renderer = Renderer::new(plain_config())
            .unwrap()
            .with_renderer(CellType::Code, Box::new(Multiline));
        let rendered = renderer.render(&parsed).unwrap();
        assert_eq!(rendered.cells[0].text, "Cell 1\na\nbc\n\n\n");
        assert_eq!(rendered.cells[0].cell_range, CellRange::new(0, 5));
        assert_eq!(rendered.cells[1].cell_range, CellRange::new(5, 10));
    }

    #[test]
    fn prose_panel_frames_prose_cells_only() {
        let parsed = parse("# %% [markdown]\n# hi\n# %% [code]\nx");
        let config = RenderConfig {
            width: 20,
            prose_panel: true,
            ..plain_config()
        };
        let rendered = Renderer::new(config).unwrap().render(&parsed).unwrap();
        let prose = rendered.cells[0].text.lines().collect::<Vec<_>>();
        assert_eq!(prose[0], "Cell 1");
        assert!(prose[1].contains(" markdown "));
        assert!(prose[2].starts_with("│ hi"));
        assert!(prose[3].starts_with('╰'));
        assert_eq!(rendered.cells[0].cell_range, CellRange::new(0, 5));
        assert_eq!(rendered.cells[1].text, "Cell 2\nx\n\n");
    }

    #[test]
    fn unregistered_types_are_an_error() {
        let parsed = parse("# %% [code]\nx\n# %% [markdown]\n# y");
        let renderer = Renderer::new(plain_config()).unwrap().without(CellType::Prose);
        let err = renderer.render(&parsed).unwrap_err();
        assert!(matches!(
            err,
            RenderError::UnsupportedCellType {
                index: 1,
                cell_type: CellType::Prose
            }
        ));
    }

    #[test]
    fn custom_renderers_replace_builtin_ones() {
        struct Shout;

        impl CellRenderer for Shout {
            fn render_body(
                &self,
                body: &str,
                _ctx: &CellContext<'_>,
            ) -> Result<Vec<Line<'static>>, RenderError> {
                Ok(vec![Line::from(body.to_uppercase())])
            }
        }

        let parsed = parse("# %% [code]\nabc");
        let renderer = Renderer::new(plain_config())
            .unwrap()
            .with_renderer(CellType::Code, Box::new(Shout));
        let rendered = renderer.render(&parsed).unwrap();
        assert_eq!(rendered.cells[0].text, "Cell 1\nABC\n\n");
    }

    #[test]
    fn labels_use_one_based_ids() {
        let parsed = parse("# %% [code]\na\n# %% [code]\nb");
        let config = RenderConfig {
            cell_label: "In [{}]:".to_string(),
            ..plain_config()
        };
        let rendered = Renderer::new(config).unwrap().render(&parsed).unwrap();
        assert!(rendered.cells[1].text.starts_with("In [2]:\n"));
    }

    #[test]
    fn color_mode_emits_escapes() {
        let parsed = parse("# %% [code]\nx = 1");
        let config = RenderConfig {
            color: true,
            ..plain_config()
        };
        let rendered = Renderer::new(config).unwrap().render(&parsed).unwrap();
        assert!(rendered.cells[0].text.contains('\u{1b}'));
        assert_eq!(rendered.cells[0].line_count(), 3);
    }

    #[test]
    fn invalid_config_is_rejected_up_front() {
        let config = RenderConfig {
            cell_label: "no slot".to_string(),
            ..plain_config()
        };
        assert!(matches!(
            Renderer::new(config),
            Err(ConfigError::LabelTemplate { .. })
        ));
    }
}
