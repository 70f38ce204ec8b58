//! Splits prose lines into text and table blocks, and validates table blocks.
use regex::Regex;
use std::sync::LazyLock;
use thiserror::Error;

/// A line is table-like when it has a column separator on each side of some content.
pub const TABLE_LINE_PATTERN: &str = r"\|.+\|";

static TABLE_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(TABLE_LINE_PATTERN).expect("table line pattern"));

pub fn is_table_line(line: &str) -> bool {
    TABLE_LINE.is_match(line)
}

/// A maximal run of lines of one class, in document order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ProseBlock {
    Text(Vec<String>),
    Table(Vec<String>),
}

impl ProseBlock {
    pub fn lines(&self) -> &[String] {
        match self {
            ProseBlock::Text(lines) | ProseBlock::Table(lines) => lines,
        }
    }
}

/// Groups `lines` into alternating text and table blocks.
///
/// Lines inside fenced code (```` ``` ```` or `~~~`) always count as text, so a shell pipeline in
/// a code sample is never mistaken for a table.
pub fn classify<S: AsRef<str>>(lines: &[S]) -> Vec<ProseBlock> {
    let mut blocks: Vec<ProseBlock> = Vec::new();
    let mut fence: Option<char> = None;
    for line in lines {
        let line = line.as_ref();
        let table = fence.is_none() && is_table_line(line);
        if let Some(marker) = fence_marker(line) {
            match fence {
                None => fence = Some(marker),
                Some(open) if open == marker => fence = None,
                Some(_) => {}
            }
        }

        match (blocks.last_mut(), table) {
            (Some(ProseBlock::Table(run)), true) | (Some(ProseBlock::Text(run)), false) => {
                run.push(line.to_string());
            }
            (_, true) => blocks.push(ProseBlock::Table(vec![line.to_string()])),
            (_, false) => blocks.push(ProseBlock::Text(vec![line.to_string()])),
        }
    }
    blocks
}

/// Returns the fence character when `line` opens or closes a fenced code block.
pub(crate) fn fence_marker(line: &str) -> Option<char> {
    let trimmed = line.trim_start();
    if trimmed.starts_with("```") {
        Some('`')
    } else if trimmed.starts_with("~~~") {
        Some('~')
    } else {
        None
    }
}

/// A validated table: one header row and zero or more data rows of the same arity.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Table {
    pub header: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    pub fn columns(&self) -> usize {
        self.header.len()
    }
}

/// Why a table-like block was rendered as prose instead.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum TableFallback {
    #[error("table needs a header, a separator and at least one more line; found {lines} lines")]
    TooShort { lines: usize },
    #[error("separator row {line:?} must consist of `-`, `|` and whitespace")]
    BadSeparator { line: String },
    #[error("row {row} has {found} cells, header has {expected}")]
    ArityMismatch {
        row: usize,
        expected: usize,
        found: usize,
    },
}

/// Splits a table row into trimmed cell texts.
///
/// One leading and one trailing `|` are dropped, so `| a | b |` and `a | b` both give two cells.
pub fn split_row(line: &str) -> Vec<String> {
    let row = line.trim();
    let row = row.strip_prefix('|').unwrap_or(row);
    let row = row.strip_suffix('|').unwrap_or(row);
    row.split('|').map(|cell| cell.trim().to_string()).collect()
}

fn is_separator_row(line: &str) -> bool {
    line.contains('-')
        && line
            .chars()
            .all(|c| c == '-' || c == '|' || c.is_whitespace())
}

/// Validates a table-like block. The separator row's own column count is not checked.
pub fn parse_table<S: AsRef<str>>(lines: &[S]) -> Result<Table, TableFallback> {
    let [header, separator, rows @ ..] = lines else {
        return Err(TableFallback::TooShort { lines: lines.len() });
    };
    if rows.is_empty() {
        return Err(TableFallback::TooShort { lines: lines.len() });
    }
    if !is_separator_row(separator.as_ref()) {
        return Err(TableFallback::BadSeparator {
            line: separator.as_ref().to_string(),
        });
    }

    let header = split_row(header.as_ref());
    let rows = rows
        .iter()
        .enumerate()
        .map(|(i, line)| {
            let cells = split_row(line.as_ref());
            if cells.len() == header.len() {
                Ok(cells)
            } else {
                Err(TableFallback::ArityMismatch {
                    row: i + 2,
                    expected: header.len(),
                    found: cells.len(),
                })
            }
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Table { header, rows })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_maximal_runs() {
        let lines = [
            "Intro",
            "| a | b |",
            "|---|---|",
            "| 1 | 2 |",
            "after",
            "more",
        ];
        let blocks = classify(&lines);
        assert_eq!(blocks.len(), 3);
        assert!(matches!(&blocks[0], ProseBlock::Text(l) if l.len() == 1));
        assert!(matches!(&blocks[1], ProseBlock::Table(l) if l.len() == 3));
        assert_eq!(blocks[2].lines(), ["after", "more"]);
    }

    #[test]
    fn a_lone_bar_is_not_a_table_line() {
        assert!(!is_table_line("a | b"));
        assert!(!is_table_line("||"));
        assert!(is_table_line("|x|"));
        assert!(is_table_line("a | b | c"));
    }

    #[test]
    fn fenced_code_is_never_a_table() {
        let lines = ["```sh", "cat x | grep y | wc", "```", "| a | b |"];
        let blocks = classify(&lines);
        assert_eq!(blocks.len(), 2);
        assert!(matches!(&blocks[0], ProseBlock::Text(l) if l.len() == 3));
        assert!(matches!(&blocks[1], ProseBlock::Table(_)));
    }

    #[test]
    fn parses_a_well_formed_table() {
        let table = parse_table(&["| a | b |", "|---|---|", "| 1 | 2 |", "|3|4|"]).unwrap();
        assert_eq!(table.header, ["a", "b"]);
        assert_eq!(table.rows, [["1", "2"], ["3", "4"]]);
        assert_eq!(table.columns(), 2);
    }

    #[test]
    fn falls_back_on_arity_mismatch() {
        let err = parse_table(&["| a | b |", "|---|---|", "| 1 | 2 | 3 |"]).unwrap_err();
        assert_eq!(
            err,
            TableFallback::ArityMismatch {
                row: 2,
                expected: 2,
                found: 3
            }
        );
    }

    #[test]
    fn falls_back_on_bad_separator_or_short_block() {
        assert!(matches!(
            parse_table(&["| a | b |", "| x | y |", "| 1 | 2 |"]),
            Err(TableFallback::BadSeparator { .. })
        ));
        assert!(matches!(
            parse_table(&["| a |", "|   |", "| 1 |"]),
            Err(TableFallback::BadSeparator { .. })
        ));
        assert_eq!(
            parse_table(&["| a | b |", "|---|---|"]),
            Err(TableFallback::TooShort { lines: 2 })
        );
    }

    #[test]
    fn unpadded_rows_form_a_table_unless_a_row_loses_a_cell() {
        let lines = ["|a|b|", "|-|-|", "|1|2|"];
        let blocks = classify(&lines);
        assert!(matches!(&blocks[..], [ProseBlock::Table(l)] if l.len() == 3));
        let table = parse_table(&lines).unwrap();
        assert_eq!(table.header, ["a", "b"]);
        assert_eq!(table.rows, [["1", "2"]]);

        let short = ["|a|b|", "|-|-|", "|-|"];
        assert!(matches!(&classify(&short)[..], [ProseBlock::Table(_)]));
        assert_eq!(
            parse_table(&short),
            Err(TableFallback::ArityMismatch {
                row: 2,
                expected: 2,
                found: 1
            })
        );
    }

    #[test]
    fn separator_arity_is_not_checked() {
        let table = parse_table(&["| a | b |", "|-----|", "| 1 | 2 |"]).unwrap();
        assert_eq!(table.rows.len(), 1);
    }
}
