//! `textbook-core` holds the building blocks of the textbook pipeline.
//!
//! A textbook document is plain text split into typed cells by marker lines:
//!
//! ```text
//! # %% [markdown]
//! # The area of a circle is $\pi r^2$.
//! # %% [code]
//! area = math.pi * r ** 2
//! ```
//!
//! The pipeline runs in three independent stages that only share exchange artifacts:
//!
//! 1. [`segment`] splits raw lines into a [`model::ParsedDocument`].
//! 2. A renderer (see the `textbook` facade crate) turns every parsed cell into terminal text,
//!    producing a [`model::RenderedDocument`] with rendered-line ranges.
//! 3. [`navigate::Navigator`] answers "which cell is this line in" and moves between cells,
//!    reloading the rendered artifact on every call.
//!
//! Artifacts are read and written by [`exchange`]. The code render core
//! ([`code_render::render_code_lines`]), the [`text::CodeHighlighter`] seam, the shared
//! [`theme::Theme`] and the [`ansi`] line encoder live here so both renderers can use them.
pub mod model;

pub mod exchange;
pub mod navigate;
pub mod segment;

pub mod ansi;
pub mod code_render;
pub mod text;
pub mod theme;
