//! Cell navigation over a persisted render.
//!
//! A [`Navigator`] never keeps the rendered document between calls: each operation reloads it
//! from its [`RenderedSource`], so it always sees the most recently persisted render. Nothing
//! prevents another process from rewriting the artifact after the source changed; pass the
//! source fingerprint to [`Navigator::with_expected_fingerprint`] to turn that into an error.
use std::path::Path;
use std::path::PathBuf;
use thiserror::Error;

use crate::exchange;
use crate::exchange::ExchangeError;
use crate::model::CellRange;
use crate::model::ParsedDocument;
use crate::model::RenderedCell;
use crate::model::RenderedDocument;

#[derive(Debug, Error)]
pub enum NavError {
    #[error(transparent)]
    Exchange(#[from] ExchangeError),
    #[error("line {line} is outside the document (0..{line_count})")]
    LineOutOfRange { line: usize, line_count: usize },
    #[error("cell index {index} is out of range ({len} cells)")]
    IndexOutOfRange { index: usize, len: usize },
    #[error("render has {rendered} cells but the parse has {parsed}")]
    LengthMismatch { parsed: usize, rendered: usize },
    #[error("render was produced from a different source (expected {expected}, found {found})")]
    Stale { expected: String, found: String },
}

/// Where a navigator reloads its rendered document from.
pub trait RenderedSource {
    fn load(&self) -> Result<RenderedDocument, ExchangeError>;
}

/// A rendered exchange artifact on disk.
#[derive(Clone, Debug)]
pub struct ArtifactPath(pub PathBuf);

impl ArtifactPath {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self(path.into())
    }

    pub fn path(&self) -> &Path {
        &self.0
    }
}

impl RenderedSource for ArtifactPath {
    fn load(&self) -> Result<RenderedDocument, ExchangeError> {
        exchange::load_file(&self.0)
    }
}

impl RenderedSource for RenderedDocument {
    fn load(&self) -> Result<RenderedDocument, ExchangeError> {
        Ok(self.clone())
    }
}

impl<S: RenderedSource + ?Sized> RenderedSource for &S {
    fn load(&self) -> Result<RenderedDocument, ExchangeError> {
        (**self).load()
    }
}

/// Index of the range containing `line`.
///
/// Ranges must be sorted and contiguous. A line equal to a range's end belongs to the next range.
pub fn locate(ranges: &[CellRange], line: usize) -> Option<usize> {
    let idx = ranges.partition_point(|r| r.end <= line);
    ranges
        .get(idx)
        .filter(|r| r.contains(line))
        .map(|_| idx)
}

#[derive(Debug)]
pub struct Navigator<S> {
    source: S,
    active: usize,
    expected_fingerprint: Option<String>,
}

impl<S: RenderedSource> Navigator<S> {
    /// Opens a navigator on the cell that contains `source_line` in the parsed document.
    pub fn open(source: S, parsed: &ParsedDocument, source_line: usize) -> Result<Self, NavError> {
        let active = locate(&parsed.ranges(), source_line).ok_or(NavError::LineOutOfRange {
            line: source_line,
            line_count: parsed.line_count(),
        })?;
        let nav = Self {
            source,
            active,
            expected_fingerprint: None,
        };
        let rendered = nav.reload()?;
        if rendered.len() != parsed.len() {
            return Err(NavError::LengthMismatch {
                parsed: parsed.len(),
                rendered: rendered.len(),
            });
        }
        Ok(nav)
    }

    /// Opens a navigator at an explicit cell index.
    pub fn at_index(source: S, index: usize) -> Result<Self, NavError> {
        let mut nav = Self {
            source,
            active: 0,
            expected_fingerprint: None,
        };
        nav.select_by_index(index)?;
        Ok(nav)
    }

    /// Requires every reload to carry `fingerprint`.
    pub fn with_expected_fingerprint(mut self, fingerprint: impl Into<String>) -> Self {
        self.expected_fingerprint = Some(fingerprint.into());
        self
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn active_index(&self) -> usize {
        self.active
    }

    /// Selects cell `index`. Out-of-range indices are rejected, not clamped.
    pub fn select_by_index(&mut self, index: usize) -> Result<usize, NavError> {
        let doc = self.reload()?;
        if index >= doc.len() {
            return Err(NavError::IndexOutOfRange {
                index,
                len: doc.len(),
            });
        }
        self.active = index;
        Ok(self.active)
    }

    /// Selects the cell whose rendered range contains `line`.
    pub fn select_by_line(&mut self, line: usize) -> Result<usize, NavError> {
        let doc = self.reload()?;
        self.active = locate(&doc.ranges(), line).ok_or(NavError::LineOutOfRange {
            line,
            line_count: doc.line_count(),
        })?;
        Ok(self.active)
    }

    /// Moves to the following cell; a no-op on the last one.
    pub fn next(&mut self) -> Result<usize, NavError> {
        let last = self.reload_clamped()?;
        if self.active < last {
            self.active += 1;
        }
        Ok(self.active)
    }

    /// Moves to the preceding cell; a no-op on the first one.
    pub fn prev(&mut self) -> Result<usize, NavError> {
        self.reload_clamped()?;
        self.active = self.active.saturating_sub(1);
        Ok(self.active)
    }

    /// Rendered range of the active cell, from a fresh reload.
    pub fn active_range(&self) -> Result<CellRange, NavError> {
        self.active_cell().map(|cell| cell.cell_range)
    }

    pub fn active_cell(&self) -> Result<RenderedCell, NavError> {
        let doc = self.reload()?;
        let len = doc.len();
        doc.cells
            .into_iter()
            .nth(self.active)
            .ok_or(NavError::IndexOutOfRange {
                index: self.active,
                len,
            })
    }

    /// Reloads and pulls the active index back onto the last cell if the render shrank.
    /// Returns the last valid index.
    fn reload_clamped(&mut self) -> Result<usize, NavError> {
        let len = self.reload()?.len();
        let Some(last) = len.checked_sub(1) else {
            return Err(NavError::IndexOutOfRange {
                index: self.active,
                len,
            });
        };
        if self.active > last {
            tracing::debug!(active = self.active, len, "render shrank; clamping active cell");
            self.active = last;
        }
        Ok(last)
    }

    fn reload(&self) -> Result<RenderedDocument, NavError> {
        let doc = self.source.load()?;
        if let Some(expected) = &self.expected_fingerprint
            && *expected != doc.source_fingerprint
        {
            return Err(NavError::Stale {
                expected: expected.clone(),
                found: doc.source_fingerprint,
            });
        }
        Ok(doc)
    }
}
