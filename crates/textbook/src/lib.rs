//! Render cell-structured text documents for the terminal and navigate between cells.
//!
//! This is the facade crate. It re-exports the building blocks from `textbook-core`,
//! `textbook-prose` and `textbook-syntax` and adds the pieces that tie them together:
//!
//! - [`RenderConfig`]: one configuration value for a render, loadable from YAML.
//! - [`Renderer`]: routes every cell to its [`CellRenderer`] and assigns rendered ranges.
//! - [`ansi`]: turns rendered cells back into ratatui [`ratatui::text::Text`].
//!
//! The `textbook` binary runs the three pipeline stages (`parse`, `render`, `locate`/`select`)
//! as separate commands that talk through exchange artifacts.
#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod ansi;
pub mod config;
pub mod dispatch;

pub use crate::config::ConfigError;
pub use crate::config::RenderConfig;
pub use crate::dispatch::CellContext;
pub use crate::dispatch::CellRenderer;
pub use crate::dispatch::CodeCellRenderer;
pub use crate::dispatch::ProseCellRenderer;
pub use crate::dispatch::RenderError;
pub use crate::dispatch::Renderer;

pub use textbook_core as core;
pub use textbook_prose as prose;
pub use textbook_syntax as syntax;

pub use textbook_core::exchange;
pub use textbook_core::model;
pub use textbook_core::navigate;
pub use textbook_core::segment;
