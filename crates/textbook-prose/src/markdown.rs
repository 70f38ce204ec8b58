//! Markdown prose layout.
//!
//! Plain-text prose blocks go through pulldown-cmark and come out as wrapped, styled lines. The
//! table extension is deliberately left off: table-shaped lines are handled by
//! [`crate::table`], and a block that failed table validation must stay literal text here.
use pulldown_cmark::CodeBlockKind;
use pulldown_cmark::Event;
use pulldown_cmark::Options;
use pulldown_cmark::Parser;
use pulldown_cmark::Tag;
use pulldown_cmark::TagEnd;
use ratatui::text::Line;
use ratatui::text::Span;
use textbook_core::code_render::CodeRenderOptions;
use textbook_core::code_render::CodeRenderStyles;
use textbook_core::code_render::render_code_lines;
use textbook_core::text::CodeHighlighter;
use textbook_core::theme::Theme;
use unicode_width::UnicodeWidthStr;

use crate::layout::InlineFlags;
use crate::layout::ProseStyle;
use crate::layout::Segment;
use crate::layout::segments_to_spans;
use crate::layout::segments_width;
use crate::layout::wrap_segments;

const QUOTE_BAR: &str = "│ ";
const BULLET: &str = "• ";
const CODE_BLOCK_INDENT: usize = 2;

/// A laid-out unit of prose, before wrapping.
#[derive(Clone, Debug)]
enum Block {
    Prose {
        lines: Vec<Vec<Segment>>,
        first_prefix: Vec<Segment>,
        rest_prefix: Vec<Segment>,
    },
    Code {
        language: Option<String>,
        lines: Vec<String>,
        prefix: Vec<Segment>,
    },
    Rule(Vec<Segment>),
    Blank(Vec<Segment>),
}

fn parser_options() -> Options {
    Options::ENABLE_STRIKETHROUGH | Options::ENABLE_TASKLISTS
}

/// An open block quote or list item, contributing to the prefix of every nested line.
#[derive(Clone, Debug)]
enum Container {
    Quote,
    /// `opened` is set once the item's first block is out; later blocks only get the hang.
    Item { marker: String, opened: bool },
}

impl Container {
    fn first_prefix(&self) -> Segment {
        match self {
            Container::Quote => quote_bar(),
            Container::Item { marker, opened: false } => {
                Segment::new(marker.clone(), ProseStyle::List, InlineFlags::default())
            }
            Container::Item { .. } => self.rest_prefix(),
        }
    }

    fn rest_prefix(&self) -> Segment {
        match self {
            Container::Quote => quote_bar(),
            Container::Item { marker, .. } => Segment::new(
                " ".repeat(UnicodeWidthStr::width(marker.as_str())),
                ProseStyle::List,
                InlineFlags::default(),
            ),
        }
    }
}

fn quote_bar() -> Segment {
    Segment::new(QUOTE_BAR, ProseStyle::BlockQuote, InlineFlags::default())
}

struct Paragraph {
    style: ProseStyle,
    lines: Vec<Vec<Segment>>,
    current: Vec<Segment>,
    first_prefix: Vec<Segment>,
    rest_prefix: Vec<Segment>,
}

struct Fence {
    language: Option<String>,
    lines: Vec<String>,
    partial: String,
}

enum Anchor {
    Link { url: String, text: String },
    Image { url: String, alt: String },
}

/// Folds pulldown-cmark events into [`Block`]s.
#[derive(Default)]
struct Builder {
    blocks: Vec<Block>,
    containers: Vec<Container>,
    /// Next ordinal per open list; `None` for bullet lists.
    lists: Vec<Option<u64>>,
    /// A blank line is owed before the next top-level block.
    gap: bool,
    flags: InlineFlags,
    para: Option<Paragraph>,
    fence: Option<Fence>,
    anchor: Option<Anchor>,
}

impl Builder {
    fn prefixes(&self) -> (Vec<Segment>, Vec<Segment>) {
        let first = self.containers.iter().map(Container::first_prefix).collect();
        (first, self.rest_prefix())
    }

    fn rest_prefix(&self) -> Vec<Segment> {
        self.containers.iter().map(Container::rest_prefix).collect()
    }

    fn in_quote(&self) -> bool {
        self.containers.iter().any(|c| matches!(c, Container::Quote))
    }

    /// Records that a block was emitted inside every open container.
    fn push_block(&mut self, block: Block) {
        self.blocks.push(block);
        for container in &mut self.containers {
            if let Container::Item { opened, .. } = container {
                *opened = true;
            }
        }
    }

    fn separate(&mut self) {
        if std::mem::take(&mut self.gap)
            && !matches!(self.blocks.last(), None | Some(Block::Blank(_)))
        {
            let prefix = self.rest_prefix();
            self.blocks.push(Block::Blank(prefix));
        }
    }

    /// Top-level blocks are separated by a blank line; list items are not.
    fn settle(&mut self) {
        self.gap = self.lists.is_empty();
    }

    fn begin_paragraph(&mut self, style: ProseStyle) {
        self.close_paragraph();
        self.separate();
        let style = match style {
            ProseStyle::Normal if self.in_quote() => ProseStyle::BlockQuote,
            other => other,
        };
        let (first_prefix, rest_prefix) = self.prefixes();
        self.para = Some(Paragraph {
            style,
            lines: Vec::new(),
            current: Vec::new(),
            first_prefix,
            rest_prefix,
        });
    }

    fn close_paragraph(&mut self) {
        let Some(mut para) = self.para.take() else {
            return;
        };
        if !para.current.is_empty() {
            para.lines.push(para.current);
        }
        if para.lines.is_empty() {
            return;
        }
        self.push_block(Block::Prose {
            lines: para.lines,
            first_prefix: para.first_prefix,
            rest_prefix: para.rest_prefix,
        });
        self.settle();
    }

    fn begin_fence(&mut self, kind: CodeBlockKind<'_>) {
        self.close_paragraph();
        self.separate();
        let language = match kind {
            CodeBlockKind::Fenced(info) => fence_language(&info),
            CodeBlockKind::Indented => None,
        };
        self.fence = Some(Fence {
            language,
            lines: Vec::new(),
            partial: String::new(),
        });
    }

    fn close_fence(&mut self) {
        let Some(mut fence) = self.fence.take() else {
            return;
        };
        if !fence.partial.is_empty() {
            fence.lines.push(fence.partial);
        }
        let prefix = self.rest_prefix();
        self.push_block(Block::Code {
            language: fence.language,
            lines: fence.lines,
            prefix,
        });
        self.settle();
    }

    /// Appends to the open paragraph, opening one for text outside any block (tight list items).
    fn inline(&mut self, seg: Segment) {
        if self.para.is_none() {
            self.begin_paragraph(ProseStyle::Normal);
        }
        if let Some(para) = &mut self.para {
            para.current.push(seg);
        }
    }

    /// Ends the current logical line of the open paragraph.
    fn line_break(&mut self) {
        if let Some(para) = &mut self.para {
            para.lines.push(std::mem::take(&mut para.current));
        }
    }

    fn styled(&self, text: impl Into<String>) -> Segment {
        let style = self
            .para
            .as_ref()
            .map_or(ProseStyle::Normal, |p| p.style);
        let mut seg = Segment::new(text, style, self.flags);
        seg.link = matches!(self.anchor, Some(Anchor::Link { .. }));
        seg
    }

    /// Routes literal text to an image's alt text or records it as link text.
    /// Returns `false` when the text was consumed as alt text.
    fn track_anchor_text(&mut self, text: &str) -> bool {
        match &mut self.anchor {
            Some(Anchor::Image { alt, .. }) => {
                alt.push_str(text);
                false
            }
            Some(Anchor::Link { text: label, .. }) => {
                label.push_str(text);
                true
            }
            None => true,
        }
    }

    fn start(&mut self, tag: Tag<'_>) {
        match tag {
            Tag::Paragraph => self.begin_paragraph(ProseStyle::Normal),
            Tag::Heading { level, .. } => self.begin_paragraph(ProseStyle::Heading(level as u8)),
            Tag::BlockQuote(_) => {
                self.close_paragraph();
                self.separate();
                self.containers.push(Container::Quote);
            }
            Tag::List(first) => {
                self.close_paragraph();
                if self.lists.is_empty() {
                    self.separate();
                }
                self.lists.push(first);
            }
            Tag::Item => {
                self.close_paragraph();
                let Some(&ordinal) = self.lists.last() else {
                    return;
                };
                let marker = ordinal.map_or_else(|| BULLET.to_string(), |n| format!("{n}. "));
                self.containers.push(Container::Item {
                    marker,
                    opened: false,
                });
            }
            Tag::Emphasis => self.flags.emphasis = true,
            Tag::Strong => self.flags.strong = true,
            Tag::Strikethrough => self.flags.strike = true,
            Tag::Link { dest_url, .. } => {
                self.anchor = Some(Anchor::Link {
                    url: dest_url.to_string(),
                    text: String::new(),
                });
            }
            Tag::Image { dest_url, .. } => {
                self.anchor = Some(Anchor::Image {
                    url: dest_url.to_string(),
                    alt: String::new(),
                });
            }
            Tag::CodeBlock(kind) => self.begin_fence(kind),
            _ => {}
        }
    }

    fn end(&mut self, tag: TagEnd) {
        match tag {
            TagEnd::Paragraph | TagEnd::Heading(_) => self.close_paragraph(),
            TagEnd::BlockQuote(_) => {
                self.close_paragraph();
                self.containers.pop();
                self.settle();
            }
            TagEnd::List(_) => {
                self.close_paragraph();
                self.lists.pop();
                self.settle();
            }
            TagEnd::Item => {
                self.close_paragraph();
                if let Some(Some(n)) = self.lists.last_mut() {
                    *n += 1;
                }
                self.containers.pop();
            }
            TagEnd::Emphasis => self.flags.emphasis = false,
            TagEnd::Strong => self.flags.strong = false,
            TagEnd::Strikethrough => self.flags.strike = false,
            TagEnd::Link | TagEnd::Image => self.close_anchor(),
            TagEnd::CodeBlock => self.close_fence(),
            _ => {}
        }
    }

    fn close_anchor(&mut self) {
        match self.anchor.take() {
            Some(Anchor::Link { url, text }) => {
                let text = text.trim();
                if !text.is_empty() && text != url {
                    self.inline(Segment::muted(format!(" ({url})")));
                }
            }
            Some(Anchor::Image { url, alt }) => {
                let alt = match alt.trim() {
                    "" => "image".to_string(),
                    alt => alt.to_string(),
                };
                self.inline(Segment::muted("Image: "));
                let mut seg = Segment::new(alt, ProseStyle::Normal, self.flags);
                seg.link = true;
                self.inline(seg);
                self.inline(Segment::muted(format!(" ({url})")));
            }
            None => {}
        }
    }

    fn event(&mut self, ev: Event<'_>) {
        match ev {
            Event::Start(tag) => self.start(tag),
            Event::End(tag) => self.end(tag),
            Event::Text(text) => {
                if let Some(fence) = &mut self.fence {
                    for ch in text.chars().filter(|&c| c != '\r') {
                        if ch == '\n' {
                            fence.lines.push(std::mem::take(&mut fence.partial));
                        } else {
                            fence.partial.push(ch);
                        }
                    }
                } else if self.track_anchor_text(&text) {
                    let seg = self.styled(text.to_string());
                    self.inline(seg);
                }
            }
            Event::Code(code) => {
                if self.track_anchor_text(&code) {
                    let mut seg = self.styled(code.to_string());
                    seg.inline_code = true;
                    self.inline(seg);
                }
            }
            Event::InlineMath(math) | Event::DisplayMath(math) => {
                let mut seg = self.styled(math.to_string());
                seg.inline_code = true;
                self.inline(seg);
            }
            Event::SoftBreak => {
                if self.para.is_some() {
                    let space = self.styled(" ");
                    self.inline(space);
                }
                self.track_anchor_text(" ");
            }
            Event::HardBreak => self.line_break(),
            Event::Rule => {
                self.close_paragraph();
                self.separate();
                let prefix = self.rest_prefix();
                self.push_block(Block::Rule(prefix));
                self.settle();
            }
            Event::Html(html) => {
                for row in html.lines().map(str::trim).filter(|row| !row.is_empty()) {
                    self.inline(Segment::muted(row.to_string()));
                    self.line_break();
                }
            }
            Event::InlineHtml(html) => {
                let text = html.split_whitespace().collect::<Vec<_>>().join(" ");
                if !text.is_empty() {
                    self.inline(Segment::muted(text));
                }
            }
            Event::TaskListMarker(done) => {
                let mark = if done { "[✓] " } else { "[ ] " };
                self.inline(Segment::new(mark, ProseStyle::List, InlineFlags::default()));
            }
            Event::FootnoteReference(label) => {
                self.inline(Segment::muted(format!("[^{label}]")));
            }
        }
    }

    fn finish(mut self) -> Vec<Block> {
        self.close_paragraph();
        self.close_fence();
        while matches!(self.blocks.last(), Some(Block::Blank(_))) {
            self.blocks.pop();
        }
        self.blocks
    }
}

fn parse_blocks(input: &str) -> Vec<Block> {
    let mut builder = Builder::default();
    Parser::new_ext(input, parser_options()).for_each(|ev| builder.event(ev));
    builder.finish()
}

/// Lexer id from a fence info string such as `python`, `{r, echo=FALSE}` or `language-rust`.
fn fence_language(info: &str) -> Option<String> {
    info.split_whitespace()
        .next()
        .and_then(|word| word.split(',').next())
        .map(|word| word.trim_matches(|c: char| c == '{' || c == '}').trim())
        .map(|word| word.strip_prefix("language-").unwrap_or(word))
        .filter(|word| !word.is_empty())
        .map(str::to_string)
}

/// Settings for [`layout_markdown`].
#[derive(Clone, Copy)]
pub struct MarkdownLayout<'a> {
    pub width: u16,
    pub theme: &'a Theme,
    pub highlighter: Option<&'a dyn CodeHighlighter>,
    pub code_line_numbers: bool,
}

/// Lays out `input` as markdown prose. Blank input yields no lines.
pub fn layout_markdown(input: &str, layout: MarkdownLayout<'_>) -> Vec<Line<'static>> {
    let theme = layout.theme;
    let mut out: Vec<Line<'static>> = Vec::new();
    for block in parse_blocks(input) {
        match block {
            Block::Blank(prefix) => out.push(Line::from(segments_to_spans(&prefix, theme))),
            Block::Rule(prefix) => {
                let mut spans = segments_to_spans(&prefix, theme);
                let remaining = (layout.width as usize).saturating_sub(segments_width(&prefix));
                spans.push(Span::styled("─".repeat(remaining.clamp(1, 8)), theme.rule));
                out.push(Line::from(spans));
            }
            Block::Prose {
                lines,
                first_prefix,
                rest_prefix,
            } => {
                for (i, logical) in lines.iter().enumerate() {
                    let lead = if i == 0 { &first_prefix } else { &rest_prefix };
                    out.extend(wrap_segments(
                        lead,
                        &rest_prefix,
                        logical,
                        layout.width,
                        theme,
                    ));
                }
            }
            Block::Code {
                language,
                lines,
                prefix,
            } => {
                let rendered = render_code_lines(
                    &lines,
                    language.as_deref(),
                    language.as_ref().and(layout.highlighter),
                    CodeRenderStyles {
                        base: theme.code_inline,
                        gutter: theme.gutter,
                    },
                    CodeRenderOptions {
                        line_numbers: layout.code_line_numbers,
                        ..CodeRenderOptions::default()
                    },
                );
                let mut lead = segments_to_spans(&prefix, theme);
                lead.push(Span::raw(" ".repeat(CODE_BLOCK_INDENT)));
                for line in rendered {
                    let mut spans = lead.clone();
                    spans.extend(line.spans);
                    out.push(Line::from(spans));
                }
            }
        }
    }
    out
}

/// Inline markdown of a single table cell, flattened to one run of segments.
pub(crate) fn inline_segments(text: &str) -> Vec<Segment> {
    let mut out: Vec<Segment> = Vec::new();
    for block in parse_blocks(text) {
        match block {
            Block::Prose { lines, .. } => {
                for line in lines {
                    if !out.is_empty() {
                        out.push(Segment::new(" ", ProseStyle::Normal, InlineFlags::default()));
                    }
                    out.extend(line.into_iter().map(|mut seg| {
                        if matches!(seg.style, ProseStyle::Heading(_) | ProseStyle::BlockQuote) {
                            seg.style = ProseStyle::Normal;
                        }
                        seg
                    }));
                }
            }
            Block::Code { lines, .. } => {
                let mut seg =
                    Segment::new(lines.join(" "), ProseStyle::Normal, InlineFlags::default());
                seg.inline_code = true;
                out.push(seg);
            }
            Block::Rule(_) | Block::Blank(_) => {}
        }
    }
    out
}
