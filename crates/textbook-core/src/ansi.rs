//! Encoding of styled lines as terminal text.
//!
//! Rendered cells are stored as plain strings, so the styles produced by the renderers are baked
//! in as SGR escape sequences. Every span is written self-contained (set, content, reset), which
//! keeps each encoded line independent of its neighbours.
use crossterm::style::Attribute;
use crossterm::style::Color as TermColor;
use crossterm::style::ContentStyle;
use crossterm::style::StyledContent;
use ratatui::style::Color;
use ratatui::style::Modifier;
use ratatui::style::Style;
use ratatui::text::Line;

/// Whether encoded output carries escape sequences.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ColorMode {
    #[default]
    Ansi,
    Plain,
}

/// Encodes one line without a trailing newline.
pub fn encode_line(line: &Line<'_>, mode: ColorMode) -> String {
    let mut out = String::new();
    for span in &line.spans {
        if span.content.is_empty() {
            continue;
        }
        match mode {
            ColorMode::Plain => out.push_str(span.content.as_ref()),
            ColorMode::Ansi => {
                let style = content_style(line.style.patch(span.style));
                out.push_str(&StyledContent::new(style, span.content.as_ref()).to_string());
            }
        }
    }
    out
}

/// Encodes `lines`, terminating every line (the last one included) with `\n`.
pub fn encode_lines(lines: &[Line<'_>], mode: ColorMode) -> String {
    let mut out = String::new();
    for line in lines {
        out.push_str(&encode_line(line, mode));
        out.push('\n');
    }
    out
}

fn content_style(style: Style) -> ContentStyle {
    let mut out = ContentStyle::new();
    out.foreground_color = style.fg.map(term_color);
    out.background_color = style.bg.map(term_color);
    let modifiers = style.add_modifier.difference(style.sub_modifier);
    for (modifier, attribute) in MODIFIER_ATTRIBUTES {
        if modifiers.contains(modifier) {
            out.attributes.set(attribute);
        }
    }
    out
}

const MODIFIER_ATTRIBUTES: [(Modifier, Attribute); 9] = [
    (Modifier::BOLD, Attribute::Bold),
    (Modifier::DIM, Attribute::Dim),
    (Modifier::ITALIC, Attribute::Italic),
    (Modifier::UNDERLINED, Attribute::Underlined),
    (Modifier::SLOW_BLINK, Attribute::SlowBlink),
    (Modifier::RAPID_BLINK, Attribute::RapidBlink),
    (Modifier::REVERSED, Attribute::Reverse),
    (Modifier::HIDDEN, Attribute::Hidden),
    (Modifier::CROSSED_OUT, Attribute::CrossedOut),
];

fn term_color(color: Color) -> TermColor {
    match color {
        Color::Reset => TermColor::Reset,
        Color::Black => TermColor::Black,
        Color::Red => TermColor::DarkRed,
        Color::Green => TermColor::DarkGreen,
        Color::Yellow => TermColor::DarkYellow,
        Color::Blue => TermColor::DarkBlue,
        Color::Magenta => TermColor::DarkMagenta,
        Color::Cyan => TermColor::DarkCyan,
        Color::Gray => TermColor::Grey,
        Color::DarkGray => TermColor::DarkGrey,
        Color::LightRed => TermColor::Red,
        Color::LightGreen => TermColor::Green,
        Color::LightYellow => TermColor::Yellow,
        Color::LightBlue => TermColor::Blue,
        Color::LightMagenta => TermColor::Magenta,
        Color::LightCyan => TermColor::Cyan,
        Color::White => TermColor::White,
        Color::Rgb(r, g, b) => TermColor::Rgb { r, g, b },
        Color::Indexed(i) => TermColor::AnsiValue(i),
    }
}
