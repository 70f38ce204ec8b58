//! Prose cell rendering for `textbook`.
//!
//! A prose cell body is turned into styled terminal lines in a few passes:
//!
//! 1. [`comment`] strips the leading comment marker from each line.
//! 2. [`equation`] replaces `$...$` and `$$...$$` math with inline code holding a Unicode
//!    rendition produced by [`math`].
//! 3. [`blocks`] splits the lines into text and table runs.
//! 4. Text runs are laid out by [`markdown`], valid tables by [`table`]. A table run that fails
//!    validation is laid out as ordinary text.
//!
//! [`ProseRenderer`] runs the whole pipeline.
//!
//! ```
//! use textbook_prose::CommentPattern;
//! use textbook_prose::ProseRenderer;
//!
//! let lines = ProseRenderer::default()
//!     .render("# Area is $\\pi r^2$.", &CommentPattern::default());
//! assert_eq!(lines.len(), 1);
//! ```
#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod blocks;
pub mod comment;
pub mod equation;
mod layout;
pub mod markdown;
pub mod math;
pub mod panel;
pub mod render;
pub mod table;

pub use crate::blocks::ProseBlock;
pub use crate::blocks::Table;
pub use crate::blocks::TableFallback;
pub use crate::comment::CommentPattern;
pub use crate::comment::CommentPatternError;
pub use crate::comment::DEFAULT_COMMENT_PATTERN;
pub use crate::math::MathError;
pub use crate::render::ProseOptions;
pub use crate::render::ProseRenderer;
pub use crate::render::SharedHighlighter;
pub use crate::table::TableStyle;
