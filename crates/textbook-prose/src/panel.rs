//! Rounded frame drawn around a whole prose cell.
use ratatui::style::Style;
use ratatui::text::Line;
use ratatui::text::Span;
use textbook_core::theme::Theme;
use unicode_width::UnicodeWidthStr;

use crate::layout::pad_spans;
use crate::layout::truncate_spans_with_ellipsis;

/// Title shown in the top border.
pub const PANEL_TITLE: &str = "markdown";

/// Columns the frame takes from the content width: a border and one space on each side.
pub const FRAME_COLUMNS: u16 = 4;

/// Content width left inside a frame that is `width` columns wide.
pub fn inner_width(width: u16) -> u16 {
    width.saturating_sub(FRAME_COLUMNS).max(1)
}

/// Frames `body` in a box exactly `width` columns wide (at least room for one content column).
///
/// Content lines wider than the inside are cut with `…`. An empty body still gets one row.
pub(crate) fn frame(
    body: Vec<Line<'static>>,
    title: &str,
    width: u16,
    theme: &Theme,
) -> Vec<Line<'static>> {
    let inner = usize::from(inner_width(width));
    let outer = inner + usize::from(FRAME_COLUMNS);
    let rows = if body.is_empty() {
        vec![Line::default()]
    } else {
        body
    };

    let mut out = Vec::with_capacity(rows.len() + 2);
    out.push(top_border(title, outer, theme));
    for row in rows {
        let content = truncate_spans_with_ellipsis(row.spans, inner, theme.text_muted);
        let mut spans = vec![Span::styled("│ ", theme.rule)];
        spans.extend(pad_spans(content, inner, Style::default()));
        spans.push(Span::styled(" │", theme.rule));
        out.push(Line::from(spans));
    }
    out.push(Line::from(Span::styled(
        format!("╰{}╯", "─".repeat(outer - 2)),
        theme.rule,
    )));
    out
}

/// `╭── title ──╮`, or a bare rule when the title does not fit.
fn top_border(title: &str, outer: usize, theme: &Theme) -> Line<'static> {
    let span = outer - 2;
    let label = format!(" {title} ");
    let label_width = UnicodeWidthStr::width(label.as_str());
    if title.is_empty() || label_width > span {
        return Line::from(Span::styled(format!("╭{}╮", "─".repeat(span)), theme.rule));
    }
    let left = (span - label_width) / 2;
    let right = span - label_width - left;
    Line::from(vec![
        Span::styled(format!("╭{}", "─".repeat(left)), theme.rule),
        Span::styled(label, theme.accent),
        Span::styled(format!("{}╮", "─".repeat(right)), theme.rule),
    ])
}
