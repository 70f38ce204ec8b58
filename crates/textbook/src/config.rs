//! Render configuration.
//!
//! [`RenderConfig`] is plain data: it can be built in code, deserialized from YAML, or filled in
//! from command-line flags. Nothing is validated until [`RenderConfig::validate`], which
//! [`crate::Renderer::new`] calls once.
use ratatui::style::Color;
use serde::Deserialize;
use serde::Serialize;
use std::path::Path;
use std::path::PathBuf;
use textbook_prose::CommentPattern;
use textbook_prose::CommentPatternError;
use textbook_prose::DEFAULT_COMMENT_PATTERN;
use textbook_prose::TableStyle;
use textbook_syntax::BoxedHighlighter;
use textbook_syntax::DEFAULT_THEME;
use textbook_syntax::UnknownTheme;
use thiserror::Error;

pub const DEFAULT_LEXER: &str = "python";
pub const DEFAULT_CELL_LABEL: &str = "Cell {}";
pub const DEFAULT_HEADER_COLOR: &str = "yellow";
pub const DEFAULT_WIDTH: u16 = 80;

/// Placeholder for the 1-based cell id in a label template.
const LABEL_SLOT: &str = "{}";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cell label {template:?} must contain exactly one `{{}}` slot, found {slots}")]
    LabelTemplate { template: String, slots: usize },
    #[error(transparent)]
    CommentPattern(#[from] CommentPatternError),
    #[error("invalid header color {value:?} (expected a color name, #rrggbb or 0-255)")]
    HeaderColor { value: String },
    #[error(transparent)]
    UnknownTheme(#[from] UnknownTheme),
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config {path}: {source}")]
    Yaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RenderConfig {
    /// Lexer for code cells: a file extension or a syntax name.
    pub lexer: String,
    /// Highlighting theme, or `none`.
    pub theme: String,
    /// Regex whose first match is removed from every prose line.
    pub comment_pattern: String,
    /// Header template; `{}` is replaced by the 1-based cell id.
    pub cell_label: String,
    pub header_color: String,
    pub width: u16,
    pub table_style: TableStyle,
    pub code_line_numbers: bool,
    /// Frame prose cells in a box titled `markdown`.
    pub prose_panel: bool,
    /// Emit ANSI escapes. Off gives plain text.
    pub color: bool,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            lexer: DEFAULT_LEXER.to_string(),
            theme: DEFAULT_THEME.to_string(),
            comment_pattern: DEFAULT_COMMENT_PATTERN.to_string(),
            cell_label: DEFAULT_CELL_LABEL.to_string(),
            header_color: DEFAULT_HEADER_COLOR.to_string(),
            width: DEFAULT_WIDTH,
            table_style: TableStyle::default(),
            code_line_numbers: false,
            prose_panel: false,
            color: true,
        }
    }
}

impl RenderConfig {
    pub fn from_yaml(input: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(input)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let input = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_yaml(&input).map_err(|source| ConfigError::Yaml {
            path: path.to_path_buf(),
            source,
        })?;
        tracing::debug!(path = %path.display(), "loaded render config");
        Ok(config)
    }

    /// Checks every field that can be invalid and builds the runtime pieces they describe.
    pub fn validate(&self) -> Result<ValidatedConfig, ConfigError> {
        Ok(ValidatedConfig {
            label: CellLabel::new(&self.cell_label)?,
            comments: CommentPattern::new(&self.comment_pattern)?,
            header_color: parse_color(&self.header_color)?,
            highlighter: textbook_syntax::highlighter_for_theme(&self.theme)?,
        })
    }
}

/// The parts of a [`RenderConfig`] that need parsing, parsed.
pub struct ValidatedConfig {
    pub label: CellLabel,
    pub comments: CommentPattern,
    pub header_color: Color,
    pub highlighter: BoxedHighlighter,
}

/// A header template with exactly one `{}` slot.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CellLabel {
    template: String,
}

impl CellLabel {
    pub fn new(template: &str) -> Result<Self, ConfigError> {
        let slots = template.matches(LABEL_SLOT).count();
        if slots != 1 {
            return Err(ConfigError::LabelTemplate {
                template: template.to_string(),
                slots,
            });
        }
        Ok(Self {
            template: template.to_string(),
        })
    }

    pub fn format(&self, cell_id: usize) -> String {
        self.template.replacen(LABEL_SLOT, &cell_id.to_string(), 1)
    }
}

/// Parses a color name (`yellow`, `light-blue`), `#rrggbb`, or a 0-255 palette index.
pub fn parse_color(value: &str) -> Result<Color, ConfigError> {
    value
        .trim()
        .parse::<Color>()
        .map_err(|_| ConfigError::HeaderColor {
            value: value.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        let config = RenderConfig::default();
        let validated = config.validate().unwrap();
        assert_eq!(validated.label.format(3), "Cell 3");
        assert_eq!(validated.header_color, Color::Yellow);
    }

    #[test]
    fn label_needs_exactly_one_slot() {
        assert!(matches!(
            CellLabel::new("Cell"),
            Err(ConfigError::LabelTemplate { slots: 0, .. })
        ));
        assert!(matches!(
            CellLabel::new("{} of {}"),
            Err(ConfigError::LabelTemplate { slots: 2, .. })
        ));
        assert_eq!(CellLabel::new("In [{}]:").unwrap().format(12), "In [12]:");
    }

    #[test]
    fn header_colors() {
        assert_eq!(parse_color("#ff8800").unwrap(), Color::Rgb(0xff, 0x88, 0x00));
        assert_eq!(parse_color("208").unwrap(), Color::Indexed(208));
        assert_eq!(parse_color("LightBlue").unwrap(), Color::LightBlue);
        assert!(matches!(
            parse_color("not-a-color"),
            Err(ConfigError::HeaderColor { .. })
        ));
    }

    #[test]
    fn invalid_fields_are_reported() {
        let config = RenderConfig {
            comment_pattern: "(".to_string(),
            ..RenderConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::CommentPattern(_))
        ));

        let config = RenderConfig {
            theme: "no-such-theme".to_string(),
            ..RenderConfig::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::UnknownTheme(_))));
    }

    #[test]
    fn yaml_fills_in_defaults() {
        let config = RenderConfig::from_yaml("lexer: rs\ntable_style: box\nwidth: 60\n").unwrap();
        assert_eq!(config.lexer, "rs");
        assert_eq!(config.table_style, TableStyle::Box);
        assert_eq!(config.width, 60);
        assert_eq!(config.cell_label, DEFAULT_CELL_LABEL);
        assert!(config.color);

        assert!(RenderConfig::from_yaml("colour: false\n").is_err());
        assert!(RenderConfig::from_yaml("prose_panel: true\n").unwrap().prose_panel);
    }

    #[test]
    fn load_reports_the_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("render.yaml");
        std::fs::write(&path, "width: [1]\n").unwrap();
        let err = RenderConfig::load(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Yaml { .. }));
        assert!(err.to_string().contains("render.yaml"));

        let err = RenderConfig::load(&dir.path().join("missing.yaml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
