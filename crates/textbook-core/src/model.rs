//! Cell data model shared by every stage of the pipeline.
//!
//! A document is an ordered list of cells. Parsed cells carry source-line ranges, rendered cells
//! carry rendered-line ranges, and cell `i` of a parse always corresponds to cell `i` of its
//! render.
use serde::Deserialize;
use serde::Serialize;
use sha2::Digest;
use sha2::Sha256;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// The kind of content a cell holds.
///
/// The set is closed: a boundary label that does not name one of these variants is rejected when
/// the document is segmented.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CellType {
    Code,
    #[serde(alias = "markdown")]
    Prose,
}

impl CellType {
    pub const ALL: [CellType; 2] = [CellType::Code, CellType::Prose];

    pub fn as_str(self) -> &'static str {
        match self {
            CellType::Code => "code",
            CellType::Prose => "prose",
        }
    }
}

impl fmt::Display for CellType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("unknown cell type label: {0:?}")]
pub struct UnknownCellType(pub String);

impl FromStr for CellType {
    type Err = UnknownCellType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "code" => Ok(CellType::Code),
            "prose" | "markdown" | "md" => Ok(CellType::Prose),
            _ => Err(UnknownCellType(s.to_string())),
        }
    }
}

/// A half-open `[start, end)` line interval.
///
/// Serialized as a two-element array so artifacts stay compact and readable by editor plugins.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "(usize, usize)", into = "(usize, usize)")]
pub struct CellRange {
    pub start: usize,
    pub end: usize,
}

impl CellRange {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }

    /// Returns `true` if `line` falls inside `[start, end)`.
    pub fn contains(&self, line: usize) -> bool {
        self.start <= line && line < self.end
    }
}

impl From<(usize, usize)> for CellRange {
    fn from((start, end): (usize, usize)) -> Self {
        Self { start, end }
    }
}

impl From<CellRange> for (usize, usize) {
    fn from(range: CellRange) -> Self {
        (range.start, range.end)
    }
}

impl fmt::Display for CellRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {})", self.start, self.end)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum RangeError {
    #[error("cell {index} starts at line {found}, expected {expected}")]
    Gap {
        index: usize,
        expected: usize,
        found: usize,
    },
    #[error("cell {index} has an inverted range {range}")]
    Inverted { index: usize, range: CellRange },
}

/// Checks that ranges are contiguous, ordered, and start at line 0.
pub fn validate_ranges<I>(ranges: I) -> Result<(), RangeError>
where
    I: IntoIterator<Item = CellRange>,
{
    let mut expected = 0usize;
    for (index, range) in ranges.into_iter().enumerate() {
        if range.start != expected {
            return Err(RangeError::Gap {
                index,
                expected,
                found: range.start,
            });
        }
        if range.end < range.start {
            return Err(RangeError::Inverted { index, range });
        }
        expected = range.end;
    }
    Ok(())
}

/// Hex-encoded SHA-256 over `lines`, each terminated by `\n`.
pub fn fingerprint_lines<S: AsRef<str>>(lines: &[S]) -> String {
    let mut hasher = Sha256::new();
    for line in lines {
        hasher.update(line.as_ref().as_bytes());
        hasher.update(b"\n");
    }
    format!("{:x}", hasher.finalize())
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ParsedCell {
    /// Full cell body, separator line included, lines joined with `\n`.
    pub text: String,
    pub cell_type: CellType,
    /// Source-line coordinates.
    pub cell_range: CellRange,
}

impl ParsedCell {
    /// The separator line that opened this cell.
    pub fn separator(&self) -> &str {
        self.text.split('\n').next().unwrap_or_default()
    }

    /// The cell content without its separator line.
    pub fn body(&self) -> &str {
        self.text.split_once('\n').map(|(_, rest)| rest).unwrap_or("")
    }

    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.text.split('\n')
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ParsedDocument {
    pub source_fingerprint: String,
    pub cells: Vec<ParsedCell>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RenderedCell {
    /// Formatted output; every emitted line ends with `\n`.
    pub text: String,
    /// Rendered-line coordinates.
    pub cell_range: CellRange,
}

impl RenderedCell {
    pub fn line_count(&self) -> usize {
        self.text.lines().count()
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RenderedDocument {
    pub source_fingerprint: String,
    pub cells: Vec<RenderedCell>,
}

macro_rules! document_accessors {
    ($doc:ty, $cell:ty) => {
        impl $doc {
            pub fn len(&self) -> usize {
                self.cells.len()
            }

            pub fn is_empty(&self) -> bool {
                self.cells.is_empty()
            }

            pub fn get(&self, index: usize) -> Option<&$cell> {
                self.cells.get(index)
            }

            pub fn iter(&self) -> std::slice::Iter<'_, $cell> {
                self.cells.iter()
            }

            pub fn ranges(&self) -> Vec<CellRange> {
                self.cells.iter().map(|c| c.cell_range).collect()
            }

            /// Total number of lines spanned by the document.
            pub fn line_count(&self) -> usize {
                self.cells.last().map(|c| c.cell_range.end).unwrap_or(0)
            }

            pub fn validate(&self) -> Result<(), RangeError> {
                validate_ranges(self.cells.iter().map(|c| c.cell_range))
            }
        }

        impl<'a> IntoIterator for &'a $doc {
            type Item = &'a $cell;
            type IntoIter = std::slice::Iter<'a, $cell>;

            fn into_iter(self) -> Self::IntoIter {
                self.cells.iter()
            }
        }
    };
}

document_accessors!(ParsedDocument, ParsedCell);
document_accessors!(RenderedDocument, RenderedCell);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cell_type_labels_are_case_insensitive() {
        assert_eq!("Code".parse::<CellType>(), Ok(CellType::Code));
        assert_eq!("markdown".parse::<CellType>(), Ok(CellType::Prose));
        assert_eq!("PROSE".parse::<CellType>(), Ok(CellType::Prose));
        assert!("latex".parse::<CellType>().is_err());
    }

    #[test]
    fn range_contains_is_half_open() {
        let r = CellRange::new(2, 4);
        assert!(!r.contains(1));
        assert!(r.contains(2));
        assert!(r.contains(3));
        assert!(!r.contains(4));
        assert_eq!(r.len(), 2);
    }

    #[test]
    fn validate_ranges_reports_first_gap() {
        let ok = [CellRange::new(0, 2), CellRange::new(2, 5)];
        assert_eq!(validate_ranges(ok), Ok(()));

        let gap = [CellRange::new(0, 2), CellRange::new(3, 5)];
        assert_eq!(
            validate_ranges(gap),
            Err(RangeError::Gap {
                index: 1,
                expected: 2,
                found: 3
            })
        );

        let offset = [CellRange::new(1, 2)];
        assert!(validate_ranges(offset).is_err());
    }

    #[test]
    fn body_skips_separator_line() {
        let cell = ParsedCell {
            text: "# %% [code]\nx = 1\ny = 2".to_string(),
            cell_type: CellType::Code,
            cell_range: CellRange::new(0, 3),
        };
        assert_eq!(cell.separator(), "# %% [code]");
        assert_eq!(cell.body(), "x = 1\ny = 2");

        let bare = ParsedCell {
            text: "# %% [code]".to_string(),
            cell_type: CellType::Code,
            cell_range: CellRange::new(0, 1),
        };
        assert_eq!(bare.body(), "");
    }

    #[test]
    fn fingerprint_depends_on_line_boundaries() {
        assert_ne!(fingerprint_lines(&["ab"]), fingerprint_lines(&["a", "b"]));
        assert_eq!(fingerprint_lines(&["a", "b"]), fingerprint_lines(&["a", "b"]));
        assert_eq!(fingerprint_lines::<&str>(&[]).len(), 64);
    }
}
