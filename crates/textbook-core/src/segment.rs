//! Splits raw document lines into typed cells.
//!
//! A cell starts at a boundary line (a line matching the configured [`BoundaryPattern`]) and runs
//! up to, but not including, the next boundary line or the end of the document.
use regex::Regex;
use thiserror::Error;

use crate::model::CellRange;
use crate::model::CellType;
use crate::model::ParsedCell;
use crate::model::ParsedDocument;
use crate::model::fingerprint_lines;

/// Name of the capture group that yields the cell type label.
pub const CELL_TYPE_GROUP: &str = "cell_type";

/// Matches `# %% [code]`, `# %% [markdown]`, ...
pub const DEFAULT_BOUNDARY_PATTERN: &str = r"^# %% \[(?P<cell_type>\w+)\]";

#[derive(Debug, Error)]
pub enum SegmentError {
    #[error("document has no lines")]
    EmptyDocument,
    #[error("no cell boundary found; expected at least one line matching the boundary pattern")]
    NoBoundaries,
    #[error("line {line} precedes the first cell boundary (line {first_boundary})")]
    ContentBeforeFirstBoundary { line: usize, first_boundary: usize },
    #[error("boundary at line {line} does not capture a cell type")]
    MissingCellType { line: usize },
    #[error("boundary at line {line} names unknown cell type {label:?}")]
    UnknownCellType { line: usize, label: String },
    #[error("invalid boundary pattern {pattern:?}: {reason}")]
    InvalidPattern { pattern: String, reason: String },
}

/// A compiled boundary pattern with exactly one named group, `cell_type`.
#[derive(Clone, Debug)]
pub struct BoundaryPattern {
    regex: Regex,
}

impl BoundaryPattern {
    pub fn new(pattern: &str) -> Result<Self, SegmentError> {
        let invalid = |reason: String| SegmentError::InvalidPattern {
            pattern: pattern.to_string(),
            reason,
        };
        let regex = Regex::new(pattern).map_err(|e| invalid(e.to_string()))?;
        let names = regex.capture_names().flatten().collect::<Vec<_>>();
        match names.as_slice() {
            [name] if *name == CELL_TYPE_GROUP => Ok(Self { regex }),
            [] => Err(invalid(format!(
                "missing named capture group `{CELL_TYPE_GROUP}`"
            ))),
            [other] => Err(invalid(format!(
                "named capture group must be `{CELL_TYPE_GROUP}`, found `{other}`"
            ))),
            _ => Err(invalid(format!(
                "expected exactly one named capture group, found {}",
                names.len()
            ))),
        }
    }

    pub fn as_str(&self) -> &str {
        self.regex.as_str()
    }

    /// Classifies a single line.
    ///
    /// Returns `Ok(None)` for ordinary lines and `Ok(Some(cell_type))` for boundary lines.
    pub fn match_line(&self, line_no: usize, line: &str) -> Result<Option<CellType>, SegmentError> {
        let Some(caps) = self.regex.captures(line) else {
            return Ok(None);
        };
        let Some(label) = caps.name(CELL_TYPE_GROUP) else {
            return Err(SegmentError::MissingCellType { line: line_no });
        };
        label
            .as_str()
            .parse::<CellType>()
            .map(Some)
            .map_err(|_| SegmentError::UnknownCellType {
                line: line_no,
                label: label.as_str().to_string(),
            })
    }
}

impl Default for BoundaryPattern {
    fn default() -> Self {
        Self {
            regex: Regex::new(DEFAULT_BOUNDARY_PATTERN).expect("default boundary pattern"),
        }
    }
}

/// Segments `lines` into cells.
///
/// Every line belongs to exactly one cell, so joining the cell texts in order reproduces the
/// input. A document without any boundary line is rejected rather than treated as one implicit
/// cell.
pub fn segment<S: AsRef<str>>(
    lines: &[S],
    pattern: &BoundaryPattern,
) -> Result<ParsedDocument, SegmentError> {
    if lines.is_empty() {
        return Err(SegmentError::EmptyDocument);
    }

    let mut boundaries: Vec<(usize, CellType)> = Vec::new();
    for (i, line) in lines.iter().enumerate() {
        if let Some(cell_type) = pattern.match_line(i, line.as_ref())? {
            boundaries.push((i, cell_type));
        }
    }

    let Some(&(first, _)) = boundaries.first() else {
        return Err(SegmentError::NoBoundaries);
    };
    if first > 0 {
        return Err(SegmentError::ContentBeforeFirstBoundary {
            line: 0,
            first_boundary: first,
        });
    }

    let mut ends = boundaries.iter().skip(1).map(|(i, _)| *i).collect::<Vec<_>>();
    ends.push(lines.len());

    let cells = boundaries
        .iter()
        .zip(ends)
        .map(|(&(start, cell_type), end)| ParsedCell {
            text: lines[start..end]
                .iter()
                .map(AsRef::as_ref)
                .collect::<Vec<&str>>()
                .join("\n"),
            cell_type,
            cell_range: CellRange::new(start, end),
        })
        .collect::<Vec<_>>();

    tracing::debug!(
        cells = cells.len(),
        lines = lines.len(),
        "segmented document"
    );

    Ok(ParsedDocument {
        source_fingerprint: fingerprint_lines(lines),
        cells,
    })
}

/// Reusable segmentation entry point bound to one boundary pattern.
#[derive(Clone, Debug, Default)]
pub struct Segmenter {
    pattern: BoundaryPattern,
}

impl Segmenter {
    pub fn new(pattern: BoundaryPattern) -> Self {
        Self { pattern }
    }

    pub fn with_pattern(pattern: &str) -> Result<Self, SegmentError> {
        BoundaryPattern::new(pattern).map(Self::new)
    }

    pub fn pattern(&self) -> &BoundaryPattern {
        &self.pattern
    }

    pub fn segment<S: AsRef<str>>(&self, lines: &[S]) -> Result<ParsedDocument, SegmentError> {
        segment(lines, &self.pattern)
    }

    /// Splits `text` on `\n` (a trailing `\r` is kept) and segments the result.
    pub fn segment_text(&self, text: &str) -> Result<ParsedDocument, SegmentError> {
        let lines = text.split('\n').collect::<Vec<_>>();
        self.segment(&lines)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bracket_pattern() -> BoundaryPattern {
        BoundaryPattern::new(r"^# \[(?P<cell_type>\w+)\]").unwrap()
    }

    #[test]
    fn splits_two_cells_with_half_open_ranges() {
        let lines = ["# [code]", "x = 1", "# [prose]", "hello"];
        let doc = segment(&lines, &bracket_pattern()).unwrap();

        assert_eq!(doc.len(), 2);
        assert_eq!(doc.cells[0].cell_range, CellRange::new(0, 2));
        assert_eq!(doc.cells[1].cell_range, CellRange::new(2, 4));
        assert_eq!(doc.cells[0].cell_type, CellType::Code);
        assert_eq!(doc.cells[1].cell_type, CellType::Prose);
        assert_eq!(doc.cells[0].text, "# [code]\nx = 1");
    }

    #[test]
    fn concatenated_cells_reconstruct_the_input() {
        let lines = [
            "# %% [markdown]",
            "# Title",
            "",
            "# %% [code]",
            "fn main() {}",
            "",
            "# %% [code]",
        ];
        let doc = segment(&lines, &BoundaryPattern::default()).unwrap();

        let rebuilt = doc.iter().flat_map(|c| c.lines()).collect::<Vec<_>>();
        assert_eq!(rebuilt, lines);
        assert_eq!(doc.validate(), Ok(()));
        assert_eq!(doc.line_count(), lines.len());
        assert_eq!(doc.cells[2].cell_range, CellRange::new(6, 7));
    }

    #[test]
    fn rejects_documents_without_boundaries() {
        let err = segment(&["x = 1", "y = 2"], &BoundaryPattern::default()).unwrap_err();
        assert!(matches!(err, SegmentError::NoBoundaries));

        let empty: [&str; 0] = [];
        let err = segment(&empty, &BoundaryPattern::default()).unwrap_err();
        assert!(matches!(err, SegmentError::EmptyDocument));
    }

    #[test]
    fn rejects_unknown_labels_at_parse_time() {
        let err = segment(&["# [code]", "x", "# [latex]"], &bracket_pattern()).unwrap_err();
        match err {
            SegmentError::UnknownCellType { line, label } => {
                assert_eq!(line, 2);
                assert_eq!(label, "latex");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn rejects_boundaries_whose_type_group_did_not_participate() {
        let pattern = BoundaryPattern::new(r"^# %%(?: \[(?P<cell_type>\w+)\])?").unwrap();
        let err = segment(&["# %% [code]", "x", "# %%"], &pattern).unwrap_err();
        assert!(matches!(err, SegmentError::MissingCellType { line: 2 }));
    }

    #[test]
    fn rejects_content_before_first_boundary() {
        let err = segment(&["preamble", "# [code]", "x"], &bracket_pattern()).unwrap_err();
        assert!(matches!(
            err,
            SegmentError::ContentBeforeFirstBoundary {
                line: 0,
                first_boundary: 1
            }
        ));
    }

    #[test]
    fn pattern_must_name_exactly_the_cell_type_group() {
        assert!(BoundaryPattern::new(r"^# \[(\w+)\]").is_err());
        assert!(BoundaryPattern::new(r"^# \[(?P<kind>\w+)\]").is_err());
        assert!(BoundaryPattern::new(r"^(?P<cell_type>\w+) (?P<extra>\w+)").is_err());
        assert!(BoundaryPattern::new(r"^# \[(?P<cell_type>\w+").is_err());
        assert!(BoundaryPattern::new(DEFAULT_BOUNDARY_PATTERN).is_ok());
    }

    #[test]
    fn segmenter_splits_text_input() {
        let doc = Segmenter::default()
            .segment_text("# %% [code]\nprint(1)\n")
            .unwrap();
        assert_eq!(doc.len(), 1);
        assert_eq!(doc.cells[0].cell_range, CellRange::new(0, 3));
        assert_eq!(doc.cells[0].body(), "print(1)\n");
    }
}
