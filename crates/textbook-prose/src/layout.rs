//! Styled text runs and the width-aware layout helpers built on them.
use ratatui::style::Modifier;
use ratatui::style::Style;
use ratatui::text::Line;
use ratatui::text::Span;
use textbook_core::theme::Theme;
use unicode_width::UnicodeWidthChar;
use unicode_width::UnicodeWidthStr;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) struct InlineFlags {
    pub emphasis: bool,
    pub strong: bool,
    pub strike: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum ProseStyle {
    Normal,
    Heading(u8),
    BlockQuote,
    List,
}

/// A run of text sharing one style.
#[derive(Clone, Debug)]
pub(crate) struct Segment {
    pub text: String,
    pub style: ProseStyle,
    pub flags: InlineFlags,
    pub inline_code: bool,
    pub link: bool,
    pub muted: bool,
}

impl Segment {
    pub fn new(text: impl Into<String>, style: ProseStyle, flags: InlineFlags) -> Self {
        Self {
            text: text.into(),
            style,
            flags,
            inline_code: false,
            link: false,
            muted: false,
        }
    }

    pub fn muted(text: impl Into<String>) -> Self {
        let mut seg = Self::new(text, ProseStyle::Normal, InlineFlags::default());
        seg.muted = true;
        seg
    }

    pub fn width(&self) -> usize {
        UnicodeWidthStr::width(self.text.as_str())
    }

    fn with_text(&self, text: String) -> Self {
        let mut seg = self.clone();
        seg.text = text;
        seg
    }
}

pub(crate) fn segments_width(segs: &[Segment]) -> usize {
    segs.iter().map(Segment::width).sum()
}

pub(crate) fn spans_width(spans: &[Span<'_>]) -> usize {
    spans
        .iter()
        .map(|s| UnicodeWidthStr::width(s.content.as_ref()))
        .sum()
}

pub(crate) fn style_for_segment(theme: &Theme, seg: &Segment) -> Style {
    let mut style = if seg.muted {
        theme.text_muted
    } else {
        match seg.style {
            ProseStyle::Normal => theme.text_primary,
            ProseStyle::Heading(1) => theme
                .text_primary
                .add_modifier(Modifier::BOLD | Modifier::UNDERLINED),
            ProseStyle::Heading(_) => theme.text_primary.add_modifier(Modifier::BOLD),
            ProseStyle::BlockQuote | ProseStyle::List => theme.text_muted,
        }
    };

    if seg.inline_code {
        style = theme.code_inline;
    }
    if seg.link {
        style = theme.accent.add_modifier(Modifier::UNDERLINED);
    }
    if seg.flags.emphasis {
        style = style.add_modifier(Modifier::ITALIC);
    }
    if seg.flags.strong {
        style = style.add_modifier(Modifier::BOLD);
    }
    if seg.flags.strike {
        style = style.add_modifier(Modifier::CROSSED_OUT);
    }
    style
}

pub(crate) fn segments_to_spans(segs: &[Segment], theme: &Theme) -> Vec<Span<'static>> {
    segs.iter()
        .filter(|s| !s.text.is_empty())
        .map(|s| Span::styled(s.text.clone(), style_for_segment(theme, s)))
        .collect()
}

/// Greedy word wrap of `segments` to `width` columns.
///
/// The first output line starts with `initial_prefix`, later ones with `subsequent_prefix`.
/// Words wider than a whole line are split; URLs prefer to break after punctuation.
pub(crate) fn wrap_segments(
    initial_prefix: &[Segment],
    subsequent_prefix: &[Segment],
    segments: &[Segment],
    width: u16,
    theme: &Theme,
) -> Vec<Line<'static>> {
    if width == 0 {
        return Vec::new();
    }
    let mut wrapper = Wrapper {
        width: width as usize,
        theme,
        subsequent_prefix,
        out: Vec::new(),
        cur: Vec::new(),
        prefix: initial_prefix.to_vec(),
        cols: segments_width(initial_prefix),
    };

    for tok in segments.iter().flat_map(split_words) {
        wrapper.push(tok);
    }
    wrapper.finish()
}

struct Wrapper<'a> {
    width: usize,
    theme: &'a Theme,
    subsequent_prefix: &'a [Segment],
    out: Vec<Line<'static>>,
    cur: Vec<Segment>,
    prefix: Vec<Segment>,
    cols: usize,
}

impl Wrapper<'_> {
    fn push(&mut self, tok: Segment) {
        let blank = is_all_ws(&tok.text);
        if self.cur.is_empty() && blank {
            return;
        }
        if self.cols + tok.width() <= self.width {
            self.cols += tok.width();
            self.cur.push(tok);
            return;
        }
        if !self.cur.is_empty() {
            self.break_line();
            if blank {
                return;
            }
        }

        let mut remaining = tok;
        while !remaining.text.is_empty() {
            if self.cols + remaining.width() <= self.width {
                self.cols += remaining.width();
                self.cur.push(remaining);
                break;
            }
            let max = self.width.saturating_sub(self.cols).max(1);
            let (head, tail) = split_word(&remaining, max);
            self.cur.push(head);
            self.break_line();
            remaining = tail;
        }
    }

    fn break_line(&mut self) {
        while self.cur.last().is_some_and(|s| is_all_ws(&s.text)) {
            self.cur.pop();
        }
        let mut spans = segments_to_spans(&self.prefix, self.theme);
        spans.extend(segments_to_spans(&self.cur, self.theme));
        self.out.push(Line::from(spans));
        self.cur.clear();
        self.prefix = self.subsequent_prefix.to_vec();
        self.cols = segments_width(&self.prefix);
    }

    fn finish(mut self) -> Vec<Line<'static>> {
        if !self.cur.is_empty() || self.out.is_empty() {
            self.break_line();
        }
        self.out
    }
}

fn split_words(seg: &Segment) -> Vec<Segment> {
    let mut out: Vec<Segment> = Vec::new();
    let mut buf = String::new();
    let mut in_ws: Option<bool> = None;
    for ch in seg.text.chars() {
        let ws = ch.is_whitespace();
        if in_ws.is_some_and(|prev| prev != ws) {
            out.push(seg.with_text(std::mem::take(&mut buf)));
        }
        buf.push(ch);
        in_ws = Some(ws);
    }
    if !buf.is_empty() {
        out.push(seg.with_text(buf));
    }
    out
}

fn split_word(seg: &Segment, max_cols: usize) -> (Segment, Segment) {
    let is_url = seg.text.starts_with("https://") || seg.text.starts_with("http://");
    let mut cols = 0usize;
    let mut cut = 0usize;
    let mut url_cut: Option<usize> = None;
    for (idx, ch) in seg.text.char_indices() {
        let w = UnicodeWidthChar::width(ch).unwrap_or(0);
        if cols + w > max_cols && cut > 0 {
            break;
        }
        cols += w;
        cut = idx + ch.len_utf8();
        if is_url && matches!(ch, '.' | '-' | '_' | '~' | '?' | '&' | '#' | '=' | '/') {
            url_cut = Some(cut);
        }
    }
    let cut = url_cut.filter(|&c| c < seg.text.len()).unwrap_or(cut);
    let (a, b) = seg.text.split_at(cut);
    (seg.with_text(a.to_string()), seg.with_text(b.to_string()))
}

fn is_all_ws(s: &str) -> bool {
    s.chars().all(char::is_whitespace)
}

/// Pads `spans` on the right to `width` columns.
pub(crate) fn pad_spans(
    mut spans: Vec<Span<'static>>,
    width: usize,
    pad_style: Style,
) -> Vec<Span<'static>> {
    let pad = width.saturating_sub(spans_width(&spans));
    if pad > 0 {
        spans.push(Span::styled(" ".repeat(pad), pad_style));
    }
    spans
}

/// Cuts `spans` to at most `max_cols` columns, ending with `…` when anything was dropped.
pub(crate) fn truncate_spans_with_ellipsis(
    spans: Vec<Span<'static>>,
    max_cols: usize,
    ellipsis_style: Style,
) -> Vec<Span<'static>> {
    if max_cols == 0 {
        return Vec::new();
    }
    if spans_width(&spans) <= max_cols {
        return spans;
    }

    let limit = max_cols - 1;
    let mut out: Vec<Span<'static>> = Vec::new();
    let mut cols = 0usize;
    'spans: for span in spans {
        let mut buf = String::new();
        for ch in span.content.chars() {
            let w = UnicodeWidthChar::width(ch).unwrap_or(0);
            if cols + w > limit {
                if !buf.is_empty() {
                    out.push(Span::styled(buf, span.style));
                }
                break 'spans;
            }
            cols += w;
            buf.push(ch);
        }
        if !buf.is_empty() {
            out.push(Span::styled(buf, span.style));
        }
    }
    out.push(Span::styled("…", ellipsis_style));
    out
}
