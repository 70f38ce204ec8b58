use ratatui::style::Modifier;
use ratatui::style::Style;

/// Styles shared by the code and prose renderers.
#[derive(Clone, Debug)]
pub struct Theme {
    pub text_primary: Style,
    pub text_muted: Style,
    pub accent: Style,
    pub code_inline: Style,
    /// Cell header lines (`Cell 3`, ...).
    pub header: Style,
    /// Line number gutter of code cells.
    pub gutter: Style,
    /// Table rules and borders.
    pub rule: Style,
}

impl Theme {
    /// A theme that carries no styling at all, for plain-text output.
    pub fn plain() -> Self {
        Self {
            text_primary: Style::default(),
            text_muted: Style::default(),
            accent: Style::default(),
            code_inline: Style::default(),
            header: Style::default(),
            gutter: Style::default(),
            rule: Style::default(),
        }
    }

    /// Returns a copy whose headers use `header`, bold.
    pub fn with_header(mut self, header: Style) -> Self {
        self.header = header.add_modifier(Modifier::BOLD);
        self
    }
}

impl Default for Theme {
    fn default() -> Self {
        use ratatui::style::Stylize;

        Self {
            text_primary: Style::default(),
            text_muted: Style::default().dark_gray(),
            accent: Style::default().cyan(),
            code_inline: Style::default().cyan(),
            header: Style::default().yellow().bold(),
            gutter: Style::default().dark_gray(),
            rule: Style::default().dark_gray(),
        }
    }
}
