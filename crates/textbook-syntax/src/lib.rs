//! Syntax highlighting backends for textbook.
//!
//! Code cells are highlighted through the [`CodeHighlighter`] trait from `textbook-core`. This
//! crate picks the backend by theme name:
//! - `syntect` (feature: `syntect`) for any of its bundled themes
//! - `none` for unstyled output, always available
use textbook_core::text::CodeHighlighter;
use textbook_core::text::NoHighlight;
use thiserror::Error;

#[cfg(feature = "syntect")]
pub mod syntect;

/// Theme used when none is configured.
pub const DEFAULT_THEME: &str = "base16-ocean.dark";

/// Theme name that disables highlighting.
pub const NO_THEME: &str = "none";

#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("unknown highlighting theme {name:?} (available: {})", available.join(", "))]
pub struct UnknownTheme {
    pub name: String,
    pub available: Vec<String>,
}

pub type BoxedHighlighter = Box<dyn CodeHighlighter + Send + Sync>;

/// Names accepted by [`highlighter_for_theme`].
pub fn theme_names() -> Vec<String> {
    #[allow(unused_mut)]
    let mut names = vec![NO_THEME.to_string()];
    #[cfg(feature = "syntect")]
    names.extend(crate::syntect::SyntectHighlighter::theme_names());
    names
}

/// Builds the highlighter for `theme`.
pub fn highlighter_for_theme(theme: &str) -> Result<BoxedHighlighter, UnknownTheme> {
    if theme.eq_ignore_ascii_case(NO_THEME) {
        return Ok(Box::new(NoHighlight));
    }

    #[cfg(feature = "syntect")]
    {
        crate::syntect::SyntectHighlighter::with_theme(theme)
            .map(|h| Box::new(h) as BoxedHighlighter)
    }

    #[cfg(not(feature = "syntect"))]
    {
        Err(UnknownTheme {
            name: theme.to_string(),
            available: theme_names(),
        })
    }
}
