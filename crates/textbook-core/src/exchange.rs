//! Exchange artifacts: the persisted form of parsed and rendered documents.
//!
//! Each stage of the pipeline may run in its own process, so documents travel between them as
//! JSON files. An artifact is wrapped in a small envelope:
//!
//! ```json
//! { "kind": "parsed", "version": 1, "document": { "source_fingerprint": "…", "cells": [] } }
//! ```
//!
//! Loading checks the envelope header first, so an artifact of the wrong kind or an unsupported
//! schema version is reported as such instead of as an opaque field error. The body is then
//! decoded strictly (unknown or missing fields are errors) and its ranges are validated. A load
//! either returns a complete document or fails.
use serde::Deserialize;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fmt;
use std::io::Write;
use std::path::Path;
use std::path::PathBuf;
use thiserror::Error;

use crate::model::ParsedDocument;
use crate::model::RangeError;
use crate::model::RenderedDocument;

pub const SCHEMA_VERSION: u32 = 1;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArtifactKind {
    Parsed,
    Rendered,
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArtifactKind::Parsed => f.write_str("parsed"),
            ArtifactKind::Rendered => f.write_str("rendered"),
        }
    }
}

#[derive(Debug, Error)]
pub enum ExchangeError {
    #[error("failed to access artifact {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed {kind} artifact: {source}")]
    Malformed {
        kind: ArtifactKind,
        #[source]
        source: serde_json::Error,
    },
    #[error("expected a {expected} artifact, found a {found} artifact")]
    KindMismatch {
        expected: ArtifactKind,
        found: ArtifactKind,
    },
    #[error(
        "unsupported {kind} artifact version {found} (supported: {supported})",
        supported = SCHEMA_VERSION
    )]
    UnsupportedVersion { kind: ArtifactKind, found: u32 },
    #[error("{kind} artifact has inconsistent cell ranges: {source}")]
    Ranges {
        kind: ArtifactKind,
        #[source]
        source: RangeError,
    },
}

/// A document type that can be stored as an exchange artifact.
pub trait Artifact: Serialize + DeserializeOwned {
    const KIND: ArtifactKind;

    fn validate_ranges(&self) -> Result<(), RangeError>;
}

impl Artifact for ParsedDocument {
    const KIND: ArtifactKind = ArtifactKind::Parsed;

    fn validate_ranges(&self) -> Result<(), RangeError> {
        self.validate()
    }
}

impl Artifact for RenderedDocument {
    const KIND: ArtifactKind = ArtifactKind::Rendered;

    fn validate_ranges(&self) -> Result<(), RangeError> {
        self.validate()
    }
}

#[derive(Serialize)]
struct EnvelopeRef<'a, D> {
    kind: ArtifactKind,
    version: u32,
    document: &'a D,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct Envelope<D> {
    #[allow(dead_code)]
    kind: ArtifactKind,
    #[allow(dead_code)]
    version: u32,
    document: D,
}

/// Lenient view of the envelope used to check compatibility before the strict decode.
#[derive(Deserialize)]
struct Header {
    kind: ArtifactKind,
    version: u32,
}

pub fn save<D: Artifact>(doc: &D) -> Result<String, ExchangeError> {
    let envelope = EnvelopeRef {
        kind: D::KIND,
        version: SCHEMA_VERSION,
        document: doc,
    };
    serde_json::to_string(&envelope).map_err(|source| ExchangeError::Malformed {
        kind: D::KIND,
        source,
    })
}

pub fn load<D: Artifact>(input: &str) -> Result<D, ExchangeError> {
    let malformed = |source| ExchangeError::Malformed {
        kind: D::KIND,
        source,
    };

    let header: Header = serde_json::from_str(input).map_err(malformed)?;
    if header.kind != D::KIND {
        return Err(ExchangeError::KindMismatch {
            expected: D::KIND,
            found: header.kind,
        });
    }
    if header.version != SCHEMA_VERSION {
        return Err(ExchangeError::UnsupportedVersion {
            kind: D::KIND,
            found: header.version,
        });
    }

    let envelope: Envelope<D> = serde_json::from_str(input).map_err(malformed)?;
    envelope
        .document
        .validate_ranges()
        .map_err(|source| ExchangeError::Ranges {
            kind: D::KIND,
            source,
        })?;
    Ok(envelope.document)
}

/// Writes `doc` to `path` atomically: the artifact either appears complete or not at all.
pub fn save_file<D: Artifact>(doc: &D, path: &Path) -> Result<(), ExchangeError> {
    let json = save(doc)?;
    let io_err = |source| ExchangeError::Io {
        path: path.to_path_buf(),
        source,
    };

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(io_err)?;
    tmp.write_all(json.as_bytes()).map_err(io_err)?;
    tmp.flush().map_err(io_err)?;
    tmp.persist(path).map_err(|e| io_err(e.error))?;

    tracing::debug!(kind = %D::KIND, path = %path.display(), "saved artifact");
    Ok(())
}

pub fn load_file<D: Artifact>(path: &Path) -> Result<D, ExchangeError> {
    let input = std::fs::read_to_string(path).map_err(|source| ExchangeError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    load(&input)
}

pub fn save_parsed(doc: &ParsedDocument) -> Result<String, ExchangeError> {
    save(doc)
}

pub fn load_parsed(input: &str) -> Result<ParsedDocument, ExchangeError> {
    load(input)
}

pub fn save_rendered(doc: &RenderedDocument) -> Result<String, ExchangeError> {
    save(doc)
}

pub fn load_rendered(input: &str) -> Result<RenderedDocument, ExchangeError> {
    load(input)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::CellRange;
    use crate::model::CellType;
    use crate::model::ParsedCell;
    use crate::model::RenderedCell;

    fn parsed() -> ParsedDocument {
        ParsedDocument {
            source_fingerprint: "abc".to_string(),
            cells: vec![
                ParsedCell {
                    text: "# %% [code]\nx = 1".to_string(),
                    cell_type: CellType::Code,
                    cell_range: CellRange::new(0, 2),
                },
                ParsedCell {
                    text: "# %% [markdown]\n# hi".to_string(),
                    cell_type: CellType::Prose,
                    cell_range: CellRange::new(2, 4),
                },
            ],
        }
    }

    fn rendered() -> RenderedDocument {
        RenderedDocument {
            source_fingerprint: "abc".to_string(),
            cells: vec![
                RenderedCell {
                    text: "Cell 1\nx = 1\n\n".to_string(),
                    cell_range: CellRange::new(0, 3),
                },
                RenderedCell {
                    text: "Cell 2\nhi\n\n".to_string(),
                    cell_range: CellRange::new(3, 6),
                },
            ],
        }
    }

    #[test]
    fn parsed_documents_survive_a_round_trip() {
        let doc = parsed();
        let json = save_parsed(&doc).unwrap();
        assert_eq!(load_parsed(&json).unwrap(), doc);
    }

    #[test]
    fn rendered_documents_survive_a_round_trip() {
        let doc = rendered();
        let json = save_rendered(&doc).unwrap();
        assert_eq!(load_rendered(&json).unwrap(), doc);
    }

    #[test]
    fn ranges_are_encoded_as_pairs() {
        let json = save_parsed(&parsed()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["kind"], "parsed");
        assert_eq!(value["version"], SCHEMA_VERSION);
        assert_eq!(
            value["document"]["cells"][1]["cell_range"],
            serde_json::json!([2, 4])
        );
        assert_eq!(value["document"]["cells"][1]["cell_type"], "prose");
    }

    #[test]
    fn rejects_the_wrong_kind() {
        let json = save_rendered(&rendered()).unwrap();
        let err = load_parsed(&json).unwrap_err();
        assert!(matches!(
            err,
            ExchangeError::KindMismatch {
                expected: ArtifactKind::Parsed,
                found: ArtifactKind::Rendered
            }
        ));
    }

    #[test]
    fn rejects_other_schema_versions() {
        let json = r#"{"kind":"parsed","version":7,"document":{}}"#;
        let err = load_parsed(json).unwrap_err();
        assert!(matches!(
            err,
            ExchangeError::UnsupportedVersion { found: 7, .. }
        ));
    }

    #[test]
    fn rejects_unknown_and_missing_fields() {
        let extra = r#"{"kind":"rendered","version":1,"document":{"source_fingerprint":"","cells":[{"text":"a\n","cell_range":[0,1],"style":"x"}]}}"#;
        assert!(matches!(
            load_rendered(extra).unwrap_err(),
            ExchangeError::Malformed { .. }
        ));

        let missing = r#"{"kind":"parsed","version":1,"document":{"source_fingerprint":"","cells":[{"text":"a","cell_range":[0,1]}]}}"#;
        assert!(matches!(
            load_parsed(missing).unwrap_err(),
            ExchangeError::Malformed { .. }
        ));

        assert!(matches!(
            load_parsed("not json").unwrap_err(),
            ExchangeError::Malformed { .. }
        ));
    }

    #[test]
    fn rejects_unknown_cell_type_labels() {
        let json = r#"{"kind":"parsed","version":1,"document":{"source_fingerprint":"","cells":[{"text":"a","cell_type":"latex","cell_range":[0,1]}]}}"#;
        assert!(matches!(
            load_parsed(json).unwrap_err(),
            ExchangeError::Malformed { .. }
        ));
    }

    #[test]
    fn accepts_markdown_as_a_prose_label() {
        let json = r##"{"kind":"parsed","version":1,"document":{"source_fingerprint":"","cells":[{"text":"# %% [markdown]","cell_type":"markdown","cell_range":[0,1]}]}}"##;
        let doc = load_parsed(json).unwrap();
        assert_eq!(doc.cells[0].cell_type, CellType::Prose);
    }

    #[test]
    fn rejects_non_contiguous_ranges() {
        let mut doc = rendered();
        doc.cells[1].cell_range = CellRange::new(4, 6);
        let json = save_rendered(&doc).unwrap();
        assert!(matches!(
            load_rendered(&json).unwrap_err(),
            ExchangeError::Ranges { .. }
        ));
    }

    #[test]
    fn file_round_trip_and_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rendered.json");
        save_file(&rendered(), &path).unwrap();
        let loaded: RenderedDocument = load_file(&path).unwrap();
        assert_eq!(loaded, rendered());

        let err = load_file::<RenderedDocument>(&dir.path().join("missing.json")).unwrap_err();
        assert!(matches!(err, ExchangeError::Io { .. }));
    }
}
