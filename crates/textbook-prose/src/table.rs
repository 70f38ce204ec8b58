//! Table layout in two border styles.
use ratatui::style::Modifier;
use ratatui::text::Line;
use ratatui::text::Span;
use serde::Deserialize;
use serde::Serialize;
use textbook_core::theme::Theme;

use crate::blocks::Table;
use crate::layout::Segment;
use crate::layout::pad_spans;
use crate::layout::segments_to_spans;
use crate::layout::segments_width;
use crate::layout::truncate_spans_with_ellipsis;
use crate::layout::wrap_segments;
use crate::markdown::inline_segments;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TableStyle {
    /// Column rules only, a `─┼─` line under the header.
    #[default]
    Glow,
    /// Full box-drawing borders.
    Box,
}

impl std::str::FromStr for TableStyle {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "glow" => Ok(TableStyle::Glow),
            "box" => Ok(TableStyle::Box),
            other => Err(format!("unknown table style {other:?} (expected glow or box)")),
        }
    }
}

struct Grid {
    header: Vec<Vec<Segment>>,
    rows: Vec<Vec<Vec<Segment>>>,
}

impl Grid {
    fn new(table: &Table) -> Self {
        let cells = |row: &[String]| -> Vec<Vec<Segment>> {
            row.iter().map(|c| inline_segments(c)).collect()
        };
        Self {
            header: cells(&table.header),
            rows: table.rows.iter().map(|r| cells(r)).collect(),
        }
    }

    /// Natural column widths, shrunk (widest first) until they fit `available`.
    fn column_widths(&self, available: usize, min_col: usize) -> Vec<usize> {
        let cols = self.header.len();
        let mut col_w = vec![min_col; cols];
        for row in std::iter::once(&self.header).chain(&self.rows) {
            for (ci, cell) in row.iter().enumerate() {
                col_w[ci] = col_w[ci].max(segments_width(cell));
            }
        }

        if min_col * cols > available {
            col_w.fill((available / cols.max(1)).max(1));
            return col_w;
        }
        let mut total: usize = col_w.iter().sum();
        while total > available {
            let Some(widest) = col_w
                .iter()
                .enumerate()
                .filter(|(_, w)| **w > min_col)
                .max_by_key(|(_, w)| **w)
                .map(|(i, _)| i)
            else {
                break;
            };
            col_w[widest] -= 1;
            total -= 1;
        }
        col_w
    }
}

/// Lays out `table` to fit `width` columns.
pub fn layout_table(
    table: &Table,
    width: u16,
    style: TableStyle,
    theme: &Theme,
) -> Vec<Line<'static>> {
    let grid = Grid::new(table);
    let cols = grid.header.len();
    if cols == 0 {
        return Vec::new();
    }
    let width = width as usize;

    match style {
        TableStyle::Glow => {
            // `│` between columns, one space of padding inside each cell.
            let chrome = (cols - 1) + 2 * cols;
            let col_w = grid.column_widths(width.saturating_sub(chrome), 1);
            let mut out = vec![glow_header_line(&grid.header, &col_w, theme)];
            out.push(Line::from(Span::styled(rule_glow(&col_w), theme.rule)));
            for row in &grid.rows {
                out.extend(wrapped_row_lines(row, &col_w, theme, false, false));
            }
            out
        }
        TableStyle::Box => {
            let chrome = 3 * cols + 1;
            let col_w = grid.column_widths(width.saturating_sub(chrome), 3);
            let mut out = vec![Line::from(Span::styled(
                rule_box(&col_w, Border::Top),
                theme.rule,
            ))];
            out.extend(wrapped_row_lines(&grid.header, &col_w, theme, true, true));
            out.push(Line::from(Span::styled(
                rule_box(&col_w, Border::Middle),
                theme.rule,
            )));
            for row in &grid.rows {
                out.extend(wrapped_row_lines(row, &col_w, theme, false, true));
            }
            out.push(Line::from(Span::styled(
                rule_box(&col_w, Border::Bottom),
                theme.rule,
            )));
            out
        }
    }
}

/// Glow headers stay on one line; overlong cells are truncated with an ellipsis.
fn glow_header_line(row: &[Vec<Segment>], col_w: &[usize], theme: &Theme) -> Line<'static> {
    let cells = row
        .iter()
        .zip(col_w)
        .map(|(cell, &w)| {
            let spans = segments_to_spans(cell, theme);
            truncate_spans_with_ellipsis(spans, w, theme.text_primary)
        })
        .collect::<Vec<_>>();
    assemble(&cells, col_w, theme, true, false)
}

/// One table row, each cell wrapped inside its column width.
fn wrapped_row_lines(
    row: &[Vec<Segment>],
    col_w: &[usize],
    theme: &Theme,
    bold: bool,
    outer: bool,
) -> Vec<Line<'static>> {
    let wrapped = row
        .iter()
        .zip(col_w)
        .map(|(cell, &w)| {
            wrap_segments(&[], &[], cell, w.min(u16::MAX as usize) as u16, theme)
                .into_iter()
                .map(|line| line.spans)
                .collect::<Vec<_>>()
        })
        .collect::<Vec<_>>();
    let height = wrapped.iter().map(Vec::len).max().unwrap_or(1).max(1);
    (0..height)
        .map(|li| {
            let cells = wrapped
                .iter()
                .map(|lines| lines.get(li).cloned().unwrap_or_default())
                .collect::<Vec<_>>();
            assemble(&cells, col_w, theme, bold, outer)
        })
        .collect()
}

fn assemble(
    cells: &[Vec<Span<'static>>],
    col_w: &[usize],
    theme: &Theme,
    bold: bool,
    outer: bool,
) -> Line<'static> {
    let mut spans: Vec<Span<'static>> = Vec::new();
    if outer {
        spans.push(Span::styled("│", theme.rule));
    }
    for (ci, (cell, &w)) in cells.iter().zip(col_w).enumerate() {
        if ci > 0 && !outer {
            spans.push(Span::styled("│", theme.rule));
        }
        let mut cell = cell.clone();
        if bold {
            for s in &mut cell {
                s.style = s.style.add_modifier(Modifier::BOLD);
            }
        }
        spans.push(Span::styled(" ", theme.text_primary));
        spans.extend(pad_spans(cell, w, theme.text_primary));
        spans.push(Span::styled(" ", theme.text_primary));
        if outer {
            spans.push(Span::styled("│", theme.rule));
        }
    }
    Line::from(spans)
}

fn rule_glow(col_w: &[usize]) -> String {
    col_w
        .iter()
        .map(|w| "─".repeat(w + 2))
        .collect::<Vec<_>>()
        .join("┼")
}

#[derive(Clone, Copy)]
enum Border {
    Top,
    Middle,
    Bottom,
}

fn rule_box(col_w: &[usize], kind: Border) -> String {
    let (left, joint, right) = match kind {
        Border::Top => ('┌', '┬', '┐'),
        Border::Middle => ('├', '┼', '┤'),
        Border::Bottom => ('└', '┴', '┘'),
    };
    let inner = col_w
        .iter()
        .map(|w| "─".repeat(w + 2))
        .collect::<Vec<_>>()
        .join(&joint.to_string());
    format!("{left}{inner}{right}")
}
