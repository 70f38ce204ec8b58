use ansi_to_tui::IntoText;
use ratatui::text::Line;
use ratatui::text::Text;
use textbook_core::model::RenderedCell;
use textbook_core::model::RenderedDocument;

/// Parses an ANSI-encoded string into a [`Text`], falling back to the raw string.
pub fn ansi_text(input: &str) -> Text<'static> {
    input
        .into_text()
        .unwrap_or_else(|_| Text::from(input.to_string()))
}

/// A rendered cell as styled ratatui text, one [`Line`] per rendered line.
///
/// Lines are parsed one at a time; encoded cells close every style within its line.
pub fn rendered_text(cell: &RenderedCell) -> Text<'static> {
    cell.text
        .lines()
        .map(|line| ansi_text(line).lines.into_iter().next().unwrap_or_default())
        .collect::<Vec<Line<'static>>>()
        .into()
}

/// The whole rendered document, in order.
pub fn document_text(doc: &RenderedDocument) -> Text<'static> {
    let mut text = Text::default();
    for cell in doc {
        text.lines.extend(rendered_text(cell).lines);
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::style::Color;
    use textbook_core::model::CellRange;

    fn cell(text: &str, start: usize, end: usize) -> RenderedCell {
        RenderedCell {
            text: text.to_string(),
            cell_range: CellRange::new(start, end),
        }
    }

    #[test]
    fn keeps_one_line_per_rendered_line() {
        let c = cell("\u{1b}[31mCell 1\u{1b}[0m\nx = 1\n\n", 0, 3);
        let text = rendered_text(&c);
        assert_eq!(text.lines.len(), c.cell_range.len());
        assert!(
            text.lines[0]
                .spans
                .iter()
                .any(|s| s.content == "Cell 1" && s.style.fg == Some(Color::Red))
        );
        assert_eq!(text.lines[2].width(), 0);
    }

    #[test]
    fn document_text_concatenates_cells() {
        let doc = RenderedDocument {
            source_fingerprint: String::new(),
            cells: vec![cell("a\n\n", 0, 2), cell("b\nc\n\n", 2, 5)],
        };
        assert_eq!(document_text(&doc).lines.len(), doc.line_count());
    }
}
