//! Markdown (CommonMark + GFM + LaTeX math) to styled terminal lines.
//!
//! Parsing and layout are separate: [`MarkdownDocument::parse`] turns the source into blocks
//! once per edit, [`MarkdownDocument::render`] wraps those blocks to a column width. The column
//! width changes far more often than the text (every resize or column-count change), so the
//! parse is the part worth caching.

use crate::math;
use pulldown_cmark::Alignment;
use pulldown_cmark::CodeBlockKind;
use pulldown_cmark::CowStr;
use pulldown_cmark::Event;
use pulldown_cmark::HeadingLevel;
use pulldown_cmark::Options;
use pulldown_cmark::Parser;
use pulldown_cmark::Tag;
use pulldown_cmark::TagEnd;
use pagemark_core::theme::Theme;
use ratatui::style::Modifier;
use ratatui::style::Style;
use ratatui::text::Line;
use ratatui::text::Span;
use unicode_width::UnicodeWidthChar;
use unicode_width::UnicodeWidthStr;
use url::Url;

/// Optional syntax on top of CommonMark.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Extensions {
    pub tables: bool,
    pub strikethrough: bool,
    /// Bare `http(s)://` URLs in text become links.
    pub autolinks: bool,
    /// `$..$` and `$$..$$`.
    pub math: bool,
}

impl Default for Extensions {
    fn default() -> Self {
        Self {
            tables: true,
            strikethrough: true,
            autolinks: true,
            math: true,
        }
    }
}

impl Extensions {
    pub fn none() -> Self {
        Self {
            tables: false,
            strikethrough: false,
            autolinks: false,
            math: false,
        }
    }

    fn parser_options(self) -> Options {
        let mut options = Options::empty();
        options.insert(Options::ENABLE_TASKLISTS);
        options.insert(Options::ENABLE_FOOTNOTES);
        if self.tables {
            options.insert(Options::ENABLE_TABLES);
        }
        if self.strikethrough {
            options.insert(Options::ENABLE_STRIKETHROUGH);
        }
        if self.math {
            options.insert(Options::ENABLE_MATH);
        }
        options
    }
}

#[derive(Clone, Debug)]
pub struct RenderOptions {
    pub extensions: Extensions,
    /// Append ` (url)` after link text that differs from its destination.
    pub show_link_destinations: bool,
    pub blockquote_prefix: String,
    pub code_block_indent: u16,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            extensions: Extensions::default(),
            show_link_destinations: false,
            blockquote_prefix: "│ ".to_string(),
            code_block_indent: 2,
        }
    }
}

#[derive(Clone, Copy, Debug, Default)]
struct InlineFlags {
    emphasis: bool,
    strong: bool,
    strike: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum ProseStyle {
    Normal,
    Heading(u8),
    BlockQuote,
    List,
}

#[derive(Clone, Debug)]
struct Segment {
    text: String,
    style: ProseStyle,
    flags: InlineFlags,
    inline_code: bool,
    link: bool,
    muted: bool,
    math: bool,
    error: bool,
}

impl Segment {
    fn new(text: String, style: ProseStyle, flags: InlineFlags) -> Self {
        Self {
            text,
            style,
            flags,
            inline_code: false,
            link: false,
            muted: false,
            math: false,
            error: false,
        }
    }
}

#[derive(Clone, Debug)]
struct ProseBlock {
    lines: Vec<Vec<Segment>>,
    initial_prefix: Vec<Segment>,
    subsequent_prefix: Vec<Segment>,
}

#[derive(Clone, Debug)]
struct CodeBlock {
    language: Option<String>,
    lines: Vec<String>,
    prefix: Vec<Segment>,
    indent: u16,
}

#[derive(Clone, Debug)]
struct TableBlock {
    aligns: Vec<Alignment>,
    head: Vec<Vec<Vec<Segment>>>,
    body: Vec<Vec<Vec<Segment>>>,
    prefix: Vec<Segment>,
}

#[derive(Clone, Debug)]
enum Block {
    Prose(ProseBlock),
    Code(CodeBlock),
    Table(TableBlock),
    Rule(Vec<Segment>),
    Blank(Vec<Segment>),
}

/// A parsed document, ready to be laid out at any width.
#[derive(Clone, Debug, Default)]
pub struct MarkdownDocument {
    blocks: Vec<Block>,
    math_errors: usize,
}

impl MarkdownDocument {
    pub fn parse(input: &str, options: &RenderOptions) -> Self {
        let mut b = Builder::new(options);
        for ev in Parser::new_ext(input, options.extensions.parser_options()) {
            b.event(ev);
        }
        b.finish()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Number of math spans that failed to convert and are shown as error markers.
    pub fn math_errors(&self) -> usize {
        self.math_errors
    }

    /// Lays the document out for a column `width` cells wide.
    pub fn render(&self, width: u16, theme: &Theme) -> Vec<Line<'static>> {
        layout_blocks(&self.blocks, width, theme)
    }
}

#[derive(Clone, Debug)]
struct IndentCtx {
    initial: Vec<Segment>,
    subsequent: Vec<Segment>,
    use_subsequent_for_initial: bool,
}

#[derive(Clone, Debug)]
struct ListCtx {
    ordered: bool,
    index: u64,
}

#[derive(Clone, Debug)]
struct ItemCtx {
    has_block: bool,
    indent_idx: usize,
}

struct Builder<'a> {
    options: &'a RenderOptions,
    blocks: Vec<Block>,
    indent_stack: Vec<IndentCtx>,
    list_stack: Vec<ListCtx>,
    item_stack: Vec<ItemCtx>,
    blockquote_depth: usize,
    in_paragraph: bool,
    current_style: ProseStyle,
    inline: InlineFlags,
    in_link: bool,
    link_text: String,
    link_dest: Option<String>,
    image_dest: Option<String>,
    image_alt: String,
    para_lines: Vec<Vec<Segment>>,
    para_current: Vec<Segment>,
    para_prefix_initial: Vec<Segment>,
    para_prefix_subsequent: Vec<Segment>,
    in_code_block: bool,
    code_language: Option<String>,
    code_lines: Vec<String>,
    code_current: String,
    code_prefix: Vec<Segment>,
    wants_blank: bool,

    in_table: bool,
    table_aligns: Vec<Alignment>,
    in_table_head: bool,
    table_row: Vec<Vec<Segment>>,
    table_cell: Vec<Segment>,
    table_head: Vec<Vec<Vec<Segment>>>,
    table_body: Vec<Vec<Vec<Segment>>>,
    in_table_cell: bool,
    table_prefix: Vec<Segment>,

    math_errors: usize,
}

impl<'a> Builder<'a> {
    fn new(options: &'a RenderOptions) -> Self {
        Self {
            options,
            blocks: Vec::new(),
            indent_stack: Vec::new(),
            list_stack: Vec::new(),
            item_stack: Vec::new(),
            blockquote_depth: 0,
            in_paragraph: false,
            current_style: ProseStyle::Normal,
            inline: InlineFlags::default(),
            in_link: false,
            link_text: String::new(),
            link_dest: None,
            image_dest: None,
            image_alt: String::new(),
            para_lines: Vec::new(),
            para_current: Vec::new(),
            para_prefix_initial: Vec::new(),
            para_prefix_subsequent: Vec::new(),
            in_code_block: false,
            code_language: None,
            code_lines: Vec::new(),
            code_current: String::new(),
            code_prefix: Vec::new(),
            wants_blank: false,
            in_table: false,
            table_aligns: Vec::new(),
            in_table_head: false,
            table_row: Vec::new(),
            table_cell: Vec::new(),
            table_head: Vec::new(),
            table_body: Vec::new(),
            in_table_cell: false,
            table_prefix: Vec::new(),
            math_errors: 0,
        }
    }

    fn finish(mut self) -> MarkdownDocument {
        self.flush_para();
        self.flush_code();
        self.flush_table();
        while matches!(self.blocks.last(), Some(Block::Blank(_))) {
            self.blocks.pop();
        }
        MarkdownDocument {
            blocks: self.blocks,
            math_errors: self.math_errors,
        }
    }

    fn maybe_blank(&mut self) {
        let should_push =
            self.wants_blank && !matches!(self.blocks.last(), None | Some(Block::Blank(_)));
        if should_push {
            let (_, subsequent) = self.snapshot_prefixes();
            self.blocks.push(Block::Blank(subsequent));
        }
        self.wants_blank = false;
    }

    fn force_blank_in_item(&mut self) {
        if !self.item_stack.last().is_some_and(|item| item.has_block) {
            return;
        }
        if matches!(self.blocks.last(), None | Some(Block::Blank(_))) {
            return;
        }
        let (_, subsequent) = self.snapshot_prefixes();
        self.blocks.push(Block::Blank(subsequent));
    }

    fn mark_item_has_block(&mut self) {
        if let Some(item) = self.item_stack.last_mut() {
            item.has_block = true;
            if let Some(ctx) = self.indent_stack.get_mut(item.indent_idx) {
                ctx.use_subsequent_for_initial = true;
            }
        }
    }

    fn snapshot_prefixes(&self) -> (Vec<Segment>, Vec<Segment>) {
        let mut initial: Vec<Segment> = Vec::new();
        let mut subsequent: Vec<Segment> = Vec::new();
        for ctx in &self.indent_stack {
            if ctx.use_subsequent_for_initial {
                initial.extend(ctx.subsequent.clone());
            } else {
                initial.extend(ctx.initial.clone());
            }
            subsequent.extend(ctx.subsequent.clone());
        }
        (initial, subsequent)
    }

    fn after_block_wants_blank(&self) -> bool {
        self.list_stack.is_empty() && !self.in_table
    }

    fn flush_para(&mut self) {
        if !self.in_paragraph {
            return;
        }
        if !self.para_current.is_empty() {
            self.para_lines.push(std::mem::take(&mut self.para_current));
        }
        let lines = std::mem::take(&mut self.para_lines);
        if !lines.is_empty() {
            self.maybe_blank();
            self.blocks.push(Block::Prose(ProseBlock {
                lines,
                initial_prefix: std::mem::take(&mut self.para_prefix_initial),
                subsequent_prefix: std::mem::take(&mut self.para_prefix_subsequent),
            }));
            self.mark_item_has_block();
            self.wants_blank = self.after_block_wants_blank();
        }
        self.in_paragraph = false;
    }

    fn flush_code(&mut self) {
        if !self.in_code_block {
            return;
        }
        if !self.code_current.is_empty() {
            self.code_lines.push(std::mem::take(&mut self.code_current));
        }
        if self.code_lines.last().is_some_and(|s| s.is_empty()) {
            self.code_lines.pop();
        }
        self.maybe_blank();
        let indent = self.options.code_block_indent;
        let block = Block::Code(CodeBlock {
            language: self.code_language.take(),
            lines: std::mem::take(&mut self.code_lines),
            prefix: std::mem::take(&mut self.code_prefix),
            indent,
        });
        self.blocks.push(block);
        self.mark_item_has_block();
        self.in_code_block = false;
        self.wants_blank = self.after_block_wants_blank();
    }

    fn flush_table(&mut self) {
        if !self.in_table {
            return;
        }
        self.flush_para();
        self.maybe_blank();
        let block = Block::Table(TableBlock {
            aligns: std::mem::take(&mut self.table_aligns),
            head: std::mem::take(&mut self.table_head),
            body: std::mem::take(&mut self.table_body),
            prefix: std::mem::take(&mut self.table_prefix),
        });
        self.blocks.push(block);
        self.mark_item_has_block();
        self.in_table = false;
        self.in_table_head = false;
        self.table_row.clear();
        self.table_cell.clear();
        self.wants_blank = self.list_stack.is_empty();
    }

    fn start_paragraph(&mut self, style: ProseStyle) {
        self.flush_code();
        self.flush_para();
        self.maybe_blank();
        self.in_paragraph = true;
        self.current_style = match style {
            ProseStyle::Normal if self.blockquote_depth > 0 => ProseStyle::BlockQuote,
            other => other,
        };
        let (initial, subsequent) = self.snapshot_prefixes();
        self.para_prefix_initial = initial;
        self.para_prefix_subsequent = subsequent;
    }

    fn ensure_paragraph(&mut self) {
        if !self.in_paragraph {
            self.start_paragraph(ProseStyle::Normal);
        }
    }

    fn push_inline(&mut self, seg: Segment) {
        if self.in_table && self.in_table_cell {
            self.table_cell.push(seg);
        } else {
            self.ensure_paragraph();
            self.para_current.push(seg);
        }
    }

    fn task_marker(&mut self, checked: bool) {
        let Some(ctx) = self.indent_stack.last_mut() else {
            return;
        };
        if ctx.initial.is_empty() || ctx.subsequent.is_empty() {
            return;
        }
        let marker = if checked { "[✓] " } else { "[ ] " }.to_string();
        let marker_width = UnicodeWidthStr::width(marker.as_str());
        ctx.initial[0].text = marker;
        ctx.subsequent[0].text = " ".repeat(marker_width);
    }

    fn math_segment(&mut self, source: &str) -> Segment {
        match math::to_unicode(source) {
            Ok(text) => {
                let mut seg = Segment::new(text, self.current_style, self.inline);
                seg.math = true;
                seg
            }
            Err(err) => {
                tracing::debug!(%err, source, "math left unrendered");
                self.math_errors += 1;
                let mut seg = Segment::new(
                    format!("⚠ {}", source.trim()),
                    self.current_style,
                    InlineFlags::default(),
                );
                seg.error = true;
                seg
            }
        }
    }

    fn event(&mut self, ev: Event<'_>) {
        match ev {
            Event::Start(tag) => self.start_tag(tag),
            Event::End(tag) => self.end_tag(tag),
            Event::Text(text) => self.text(&text),
            Event::Code(code) => {
                if self.image_dest.is_some() {
                    self.image_alt.push_str(code.as_ref());
                    return;
                }
                if self.in_link {
                    self.link_text.push_str(code.as_ref());
                }
                let mut seg = Segment::new(code.to_string(), self.current_style, self.inline);
                seg.inline_code = true;
                seg.link = self.in_link;
                self.push_inline(seg);
            }
            Event::SoftBreak | Event::HardBreak if self.in_code_block => {
                self.code_lines.push(std::mem::take(&mut self.code_current));
            }
            Event::SoftBreak | Event::HardBreak if self.in_table && self.in_table_cell => {
                let seg = Segment::new(" ".to_string(), self.current_style, self.inline);
                self.table_cell.push(seg);
            }
            Event::SoftBreak => {
                if self.in_paragraph {
                    let seg = Segment::new(" ".to_string(), self.current_style, self.inline);
                    self.para_current.push(seg);
                }
                if self.in_link {
                    self.link_text.push(' ');
                }
            }
            Event::HardBreak => {
                if self.in_paragraph {
                    self.para_lines.push(std::mem::take(&mut self.para_current));
                }
            }
            Event::Rule => {
                self.flush_para();
                self.flush_code();
                self.force_blank_in_item();
                self.maybe_blank();
                let (_, subsequent) = self.snapshot_prefixes();
                self.blocks.push(Block::Rule(subsequent));
                self.mark_item_has_block();
                self.wants_blank = self.list_stack.is_empty();
            }
            Event::Html(html) | Event::InlineHtml(html) => {
                let text = html_to_text(&html);
                if !text.is_empty() {
                    let mut seg = Segment::new(text, self.current_style, self.inline);
                    seg.muted = true;
                    self.push_inline(seg);
                }
            }
            Event::InlineMath(src) => {
                let seg = self.math_segment(&src);
                self.push_inline(seg);
            }
            Event::DisplayMath(src) => {
                if self.in_table && self.in_table_cell {
                    let seg = self.math_segment(&src);
                    self.table_cell.push(seg);
                    return;
                }
                let resume = self.in_paragraph;
                self.start_paragraph(ProseStyle::Normal);
                let indent = Segment::new("  ".to_string(), ProseStyle::Normal, InlineFlags::default());
                self.para_prefix_initial.push(indent.clone());
                self.para_prefix_subsequent.push(indent);
                let seg = self.math_segment(&src);
                self.para_current.push(seg);
                self.flush_para();
                if resume {
                    self.start_paragraph(ProseStyle::Normal);
                }
            }
            Event::FootnoteReference(label) => {
                let mut seg = Segment::new(format!("[^{label}]"), self.current_style, self.inline);
                seg.link = true;
                self.push_inline(seg);
            }
            Event::TaskListMarker(checked) => self.task_marker(checked),
        }
    }

    fn start_tag(&mut self, tag: Tag<'_>) {
        match tag {
            Tag::Paragraph => {
                self.force_blank_in_item();
                self.start_paragraph(ProseStyle::Normal);
            }
            Tag::Heading { level, .. } => {
                self.force_blank_in_item();
                self.start_paragraph(ProseStyle::Heading(heading_level(level)));
            }
            Tag::BlockQuote(_) => {
                self.flush_code();
                self.flush_para();
                self.force_blank_in_item();
                self.maybe_blank();
                self.blockquote_depth += 1;
                let prefix = Segment::new(
                    self.options.blockquote_prefix.clone(),
                    ProseStyle::BlockQuote,
                    InlineFlags::default(),
                );
                self.indent_stack.push(IndentCtx {
                    initial: vec![prefix.clone()],
                    subsequent: vec![prefix],
                    use_subsequent_for_initial: false,
                });
            }
            Tag::FootnoteDefinition(label) => {
                self.flush_table();
                self.flush_code();
                self.flush_para();
                self.maybe_blank();
                let marker = format!("[^{label}]: ");
                let marker_width = UnicodeWidthStr::width(marker.as_str());
                self.indent_stack.push(IndentCtx {
                    initial: vec![Segment::new(marker, ProseStyle::List, InlineFlags::default())],
                    subsequent: vec![Segment::new(
                        " ".repeat(marker_width),
                        ProseStyle::List,
                        InlineFlags::default(),
                    )],
                    use_subsequent_for_initial: false,
                });
            }
            Tag::List(start) => {
                self.flush_para();
                self.list_stack.push(ListCtx {
                    ordered: start.is_some(),
                    index: start.unwrap_or(1),
                });
            }
            Tag::Item => {
                self.flush_code();
                self.flush_para();
                let Some(list) = self.list_stack.last() else {
                    return;
                };
                let marker = if list.ordered {
                    format!("{}. ", list.index)
                } else {
                    "• ".to_string()
                };
                let marker_width = UnicodeWidthStr::width(marker.as_str());
                self.item_stack.push(ItemCtx {
                    has_block: false,
                    indent_idx: self.indent_stack.len(),
                });
                self.indent_stack.push(IndentCtx {
                    initial: vec![Segment::new(marker, ProseStyle::List, InlineFlags::default())],
                    subsequent: vec![Segment::new(
                        " ".repeat(marker_width),
                        ProseStyle::List,
                        InlineFlags::default(),
                    )],
                    use_subsequent_for_initial: false,
                });
            }
            Tag::Emphasis => self.inline.emphasis = true,
            Tag::Strong => self.inline.strong = true,
            Tag::Strikethrough => self.inline.strike = true,
            Tag::Link { dest_url, .. } => {
                self.in_link = true;
                self.link_dest = Some(dest_url.trim().to_string());
                self.link_text.clear();
            }
            Tag::Image { dest_url, .. } => {
                self.image_dest = Some(dest_url.trim().to_string());
                self.image_alt.clear();
            }
            Tag::CodeBlock(kind) => {
                self.flush_para();
                self.flush_code();
                self.force_blank_in_item();
                self.maybe_blank();
                self.in_code_block = true;
                self.code_lines.clear();
                self.code_current.clear();
                let (_, subsequent) = self.snapshot_prefixes();
                self.code_prefix = subsequent;
                self.code_language = match kind {
                    CodeBlockKind::Fenced(lang) => normalize_fenced_lang(&lang),
                    CodeBlockKind::Indented => None,
                };
            }
            Tag::Table(aligns) => {
                self.flush_para();
                self.flush_code();
                self.force_blank_in_item();
                self.maybe_blank();
                self.in_table = true;
                let (_, subsequent) = self.snapshot_prefixes();
                self.table_prefix = subsequent;
                self.table_aligns = aligns;
                self.table_head.clear();
                self.table_body.clear();
                self.table_row.clear();
                self.table_cell.clear();
                self.in_table_head = false;
                self.in_table_cell = false;
            }
            Tag::TableHead => {
                self.in_table_head = true;
                self.table_row.clear();
            }
            Tag::TableRow => self.table_row.clear(),
            Tag::TableCell => {
                self.in_table_cell = true;
                self.table_cell.clear();
            }
            _ => {}
        }
    }

    fn end_tag(&mut self, tag: TagEnd) {
        match tag {
            TagEnd::Paragraph | TagEnd::Heading(_) => self.flush_para(),
            TagEnd::BlockQuote(_) => {
                self.flush_code();
                self.flush_para();
                self.indent_stack.pop();
                self.blockquote_depth = self.blockquote_depth.saturating_sub(1);
            }
            TagEnd::FootnoteDefinition => {
                self.flush_para();
                self.indent_stack.pop();
            }
            TagEnd::List(_) => {
                self.flush_para();
                self.list_stack.pop();
                self.wants_blank = self.after_block_wants_blank();
            }
            TagEnd::Item => {
                self.flush_code();
                self.flush_para();
                if let Some(list) = self.list_stack.last_mut()
                    && list.ordered
                {
                    list.index += 1;
                }
                self.item_stack.pop();
                self.indent_stack.pop();
            }
            TagEnd::Emphasis => self.inline.emphasis = false,
            TagEnd::Strong => self.inline.strong = false,
            TagEnd::Strikethrough => self.inline.strike = false,
            TagEnd::Link => {
                self.in_link = false;
                if self.options.show_link_destinations
                    && let Some(url) = self.link_dest.take()
                {
                    let text = self.link_text.trim();
                    let show = !text.is_empty()
                        && text != url
                        && text != url.strip_prefix("mailto:").unwrap_or(&url);
                    if show {
                        let mut seg = Segment::new(
                            format!(" ({url})"),
                            ProseStyle::Normal,
                            InlineFlags::default(),
                        );
                        seg.muted = true;
                        self.push_inline(seg);
                    }
                }
                self.link_dest = None;
                self.link_text.clear();
            }
            TagEnd::Image => {
                let alt = self.image_alt.trim();
                let alt = if alt.is_empty() { "[image]" } else { alt }.to_string();
                let mut label =
                    Segment::new("Image: ".to_string(), ProseStyle::Normal, InlineFlags::default());
                label.muted = true;
                self.push_inline(label);
                let mut alt_seg = Segment::new(alt, ProseStyle::Normal, self.inline);
                alt_seg.link = true;
                self.push_inline(alt_seg);
                if let Some(url) = self.image_dest.take() {
                    let mut url_seg =
                        Segment::new(format!(" → {url}"), ProseStyle::Normal, InlineFlags::default());
                    url_seg.muted = true;
                    self.push_inline(url_seg);
                }
            }
            TagEnd::CodeBlock => self.flush_code(),
            TagEnd::TableCell => {
                self.in_table_cell = false;
                self.table_row.push(std::mem::take(&mut self.table_cell));
            }
            TagEnd::TableRow => {
                let row = std::mem::take(&mut self.table_row);
                if self.in_table_head {
                    self.table_head.push(row);
                } else {
                    self.table_body.push(row);
                }
            }
            TagEnd::TableHead => {
                self.in_table_head = false;
                if !self.table_row.is_empty() {
                    self.table_head.push(std::mem::take(&mut self.table_row));
                }
            }
            TagEnd::Table => self.flush_table(),
            _ => {}
        }
    }

    fn text(&mut self, text: &CowStr<'_>) {
        if self.in_code_block {
            for ch in text.chars() {
                match ch {
                    '\n' => self.code_lines.push(std::mem::take(&mut self.code_current)),
                    '\r' => {}
                    '\t' => self.code_current.push_str("    "),
                    other => self.code_current.push(other),
                }
            }
            return;
        }
        if self.image_dest.is_some() {
            self.image_alt.push_str(text.as_ref());
            return;
        }
        if self.in_link {
            self.link_text.push_str(text.as_ref());
        }

        let mut segs: Vec<Segment> = Vec::new();
        if self.options.extensions.autolinks && !self.in_link {
            push_autolinked(&mut segs, text, self.current_style, self.inline);
        } else {
            let mut seg = Segment::new(text.to_string(), self.current_style, self.inline);
            seg.link = self.in_link;
            segs.push(seg);
        }
        for seg in segs {
            self.push_inline(seg);
        }
    }
}

fn heading_level(level: HeadingLevel) -> u8 {
    match level {
        HeadingLevel::H1 => 1,
        HeadingLevel::H2 => 2,
        HeadingLevel::H3 => 3,
        HeadingLevel::H4 => 4,
        HeadingLevel::H5 => 5,
        HeadingLevel::H6 => 6,
    }
}

/// Splits `text` into plain runs and link runs at bare `http(s)://` URLs.
fn push_autolinked(out: &mut Vec<Segment>, text: &str, style: ProseStyle, flags: InlineFlags) {
    let mut plain = String::new();
    for chunk in text.split_inclusive(char::is_whitespace) {
        let word = chunk.trim_end();
        let Some((lead, url, tail)) = split_autolink(word) else {
            plain.push_str(chunk);
            continue;
        };
        plain.push_str(lead);
        if !plain.is_empty() {
            out.push(Segment::new(std::mem::take(&mut plain), style, flags));
        }
        let mut link = Segment::new(url.to_string(), style, flags);
        link.link = true;
        out.push(link);
        plain.push_str(tail);
        plain.push_str(&chunk[word.len()..]);
    }
    if !plain.is_empty() {
        out.push(Segment::new(plain, style, flags));
    }
}

fn split_autolink(word: &str) -> Option<(&str, &str, &str)> {
    let start = word.find("https://").or_else(|| word.find("http://"))?;
    let candidate = &word[start..];
    let url = candidate.trim_end_matches(['.', ',', ';', ':', '!', '?', ')', ']', '\'', '"']);
    let parsed = Url::parse(url).ok()?;
    parsed.host_str().filter(|h| !h.is_empty())?;
    let end = start + url.len();
    Some((&word[..start], url, &word[end..]))
}

fn normalize_fenced_lang(lang: &CowStr<'_>) -> Option<String> {
    let first = lang.split_whitespace().next().unwrap_or("");
    let first = first.split(',').next().unwrap_or("").trim();
    let first = first.strip_prefix("language-").unwrap_or(first);
    let first = first.trim_start_matches('{').trim_end_matches('}').trim();
    if first.is_empty() {
        None
    } else {
        Some(first.to_string())
    }
}

fn html_to_text(html: &str) -> String {
    let mut out = String::new();
    let mut in_tag = false;
    for ch in html.chars() {
        match ch {
            '<' => in_tag = true,
            '>' => in_tag = false,
            _ if in_tag => {}
            _ => out.push(ch),
        }
    }
    let decoded = out
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&")
        .replace("&quot;", "\"")
        .replace("&nbsp;", " ");
    decoded.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn layout_blocks(blocks: &[Block], width: u16, theme: &Theme) -> Vec<Line<'static>> {
    let mut out: Vec<Line<'static>> = Vec::new();
    for block in blocks {
        match block {
            Block::Blank(prefix) => out.push(Line::from(segments_to_spans(prefix, theme))),
            Block::Rule(prefix) => {
                let mut spans = segments_to_spans(prefix, theme);
                let prefix_cols = plain_width(prefix);
                let rule_len = width.saturating_sub(prefix_cols as u16).max(1) as usize;
                spans.push(Span::styled("─".repeat(rule_len), theme.text_muted));
                out.push(Line::from(spans));
            }
            Block::Code(code) => {
                let prefix = segments_to_spans(&code.prefix, theme);
                let indent = " ".repeat(code.indent as usize);
                let avail = width
                    .saturating_sub(plain_width(&code.prefix) as u16)
                    .saturating_sub(code.indent) as usize;
                if let Some(lang) = code.language.as_deref() {
                    let mut spans = prefix.clone();
                    spans.push(Span::raw(indent.clone()));
                    spans.push(Span::styled(lang.to_string(), theme.text_muted));
                    out.push(Line::from(spans));
                }
                for line in &code.lines {
                    // code is never wrapped; overlong lines are cut at the column edge
                    let mut spans = prefix.clone();
                    spans.push(Span::raw(indent.clone()));
                    spans.push(Span::styled(
                        truncate_to_width(line, avail.max(1)),
                        theme.code_block,
                    ));
                    out.push(Line::from(spans));
                }
            }
            Block::Table(table) => out.extend(layout_table(table, width, theme)),
            Block::Prose(p) => {
                for (i, logical) in p.lines.iter().enumerate() {
                    let initial = if i == 0 {
                        &p.initial_prefix
                    } else {
                        &p.subsequent_prefix
                    };
                    out.extend(wrap_segments(initial, &p.subsequent_prefix, logical, width, theme));
                }
            }
        }
    }
    out
}

fn layout_table(table: &TableBlock, width: u16, theme: &Theme) -> Vec<Line<'static>> {
    let prefix_spans = segments_to_spans(&table.prefix, theme);
    let width = width.saturating_sub(plain_width(&table.prefix) as u16);

    let cols = table
        .head
        .iter()
        .chain(table.body.iter())
        .map(Vec::len)
        .max()
        .unwrap_or(0);
    if cols == 0 || width == 0 {
        return Vec::new();
    }

    // one separator between cells and one space of padding on each side of every cell
    let chrome_w = (cols as u16).saturating_sub(1).saturating_add(2 * cols as u16);
    if chrome_w >= width {
        return Vec::new();
    }
    let available = width - chrome_w;

    let mut col_w: Vec<u16> = vec![1; cols];
    for row in table.head.iter().chain(table.body.iter()) {
        for (ci, cell) in row.iter().enumerate() {
            col_w[ci] = col_w[ci].max(plain_width(cell) as u16);
        }
    }
    if cols as u16 > available {
        col_w.fill(1);
    } else {
        let mut total: u16 = col_w.iter().sum();
        while total > available {
            let Some((idx, _)) = col_w
                .iter()
                .enumerate()
                .filter(|(_, w)| **w > 1)
                .max_by_key(|(_, w)| **w)
            else {
                break;
            };
            col_w[idx] -= 1;
            total -= 1;
        }
    }

    let mut out: Vec<Line<'static>> = Vec::new();
    for row in &table.head {
        out.extend(layout_table_row(row, &col_w, &table.aligns, theme, true));
    }
    if !table.head.is_empty() {
        let sep = col_w
            .iter()
            .map(|w| "─".repeat(*w as usize + 2))
            .collect::<Vec<_>>()
            .join("┼");
        out.push(Line::from(Span::styled(sep, theme.text_muted)));
    }
    for row in &table.body {
        out.extend(layout_table_row(row, &col_w, &table.aligns, theme, false));
    }

    if prefix_spans.is_empty() {
        return out;
    }
    out.into_iter()
        .map(|line| {
            let mut spans = prefix_spans.clone();
            spans.extend(line.spans);
            Line::from(spans)
        })
        .collect()
}

fn layout_table_row(
    row: &[Vec<Segment>],
    col_w: &[u16],
    aligns: &[Alignment],
    theme: &Theme,
    is_header: bool,
) -> Vec<Line<'static>> {
    let mut cells: Vec<Vec<Vec<Span<'static>>>> = Vec::with_capacity(col_w.len());
    let mut row_h = 1usize;
    for (ci, w) in col_w.iter().copied().enumerate() {
        let cell = row.get(ci).map(Vec::as_slice).unwrap_or(&[]);
        if is_header {
            let mut spans = truncate_spans(segments_to_spans(cell, theme), w as usize);
            for s in &mut spans {
                s.style = s.style.add_modifier(Modifier::BOLD);
            }
            cells.push(vec![spans]);
        } else {
            let lines: Vec<Vec<Span<'static>>> = wrap_segments(&[], &[], cell, w, theme)
                .into_iter()
                .map(|l| l.spans)
                .collect();
            row_h = row_h.max(lines.len());
            cells.push(lines);
        }
    }

    let mut out = Vec::with_capacity(row_h);
    for li in 0..row_h {
        let mut spans: Vec<Span<'static>> = Vec::new();
        for (ci, cell) in cells.iter().enumerate() {
            if ci > 0 {
                spans.push(Span::styled("│", theme.text_muted));
            }
            let content = cell.get(li).cloned().unwrap_or_default();
            let align = aligns.get(ci).copied().unwrap_or(Alignment::None);
            spans.push(Span::raw(" "));
            spans.extend(pad_spans(content, col_w[ci], align));
            spans.push(Span::raw(" "));
        }
        out.push(Line::from(spans));
    }
    out
}

fn pad_spans(mut spans: Vec<Span<'static>>, width: u16, align: Alignment) -> Vec<Span<'static>> {
    let used: usize = spans.iter().map(Span::width).sum();
    let pad = (width as usize).saturating_sub(used);
    let (left, right) = match align {
        Alignment::Right => (pad, 0),
        Alignment::Center => (pad / 2, pad - pad / 2),
        Alignment::Left | Alignment::None => (0, pad),
    };
    if left > 0 {
        spans.insert(0, Span::raw(" ".repeat(left)));
    }
    if right > 0 {
        spans.push(Span::raw(" ".repeat(right)));
    }
    spans
}

/// Cuts spans to `max_cols`, ending in `…` when anything was dropped.
fn truncate_spans(spans: Vec<Span<'static>>, max_cols: usize) -> Vec<Span<'static>> {
    let total: usize = spans.iter().map(Span::width).sum();
    if total <= max_cols {
        return spans;
    }
    if max_cols == 0 {
        return Vec::new();
    }
    let target = max_cols - 1;
    let mut out: Vec<Span<'static>> = Vec::new();
    let mut cols = 0usize;
    let mut last_style = Style::default();
    for span in spans {
        last_style = span.style;
        let mut buf = String::new();
        for ch in span.content.chars() {
            let w = UnicodeWidthChar::width(ch).unwrap_or(0);
            if cols + w > target {
                break;
            }
            cols += w;
            buf.push(ch);
        }
        if !buf.is_empty() {
            out.push(Span::styled(buf, span.style));
        }
        if cols >= target {
            break;
        }
    }
    out.push(Span::styled("…", last_style));
    out
}

fn truncate_to_width(s: &str, max_cols: usize) -> String {
    if UnicodeWidthStr::width(s) <= max_cols {
        return s.to_string();
    }
    let mut cols = 0usize;
    let mut out = String::new();
    for ch in s.chars() {
        let w = UnicodeWidthChar::width(ch).unwrap_or(0);
        if cols + w > max_cols {
            break;
        }
        cols += w;
        out.push(ch);
    }
    out
}

fn wrap_segments(
    initial_prefix: &[Segment],
    subsequent_prefix: &[Segment],
    segments: &[Segment],
    width: u16,
    theme: &Theme,
) -> Vec<Line<'static>> {
    if width == 0 {
        return Vec::new();
    }
    let width = width as usize;

    let tokens: Vec<Segment> = segments.iter().flat_map(split_segment_ws).collect();

    let mut out: Vec<Line<'static>> = Vec::new();
    let mut cur: Vec<Segment> = Vec::new();

    let push_line = |out: &mut Vec<Line<'static>>, cur: &mut Vec<Segment>, prefix: &[Segment]| {
        let mut spans = segments_to_spans(prefix, theme);
        spans.extend(segments_to_spans(cur, theme));
        out.push(Line::from(spans));
        cur.clear();
    };

    let mut prefix: &[Segment] = initial_prefix;
    let mut cur_cols = plain_width(prefix);

    for tok in tokens {
        let tok_cols = UnicodeWidthStr::width(tok.text.as_str());
        if cur.is_empty() && is_all_ws(&tok.text) {
            continue;
        }
        if cur_cols + tok_cols <= width {
            cur.push(tok);
            cur_cols += tok_cols;
            continue;
        }
        if !cur.is_empty() {
            // drop the trailing space that would otherwise end the line
            if cur.last().is_some_and(|s| is_all_ws(&s.text)) {
                cur.pop();
            }
            push_line(&mut out, &mut cur, prefix);
            prefix = subsequent_prefix;
            cur_cols = plain_width(prefix);
            if is_all_ws(&tok.text) {
                continue;
            }
        }

        let mut remaining = tok;
        loop {
            if remaining.text.is_empty() {
                break;
            }
            let remaining_cols = UnicodeWidthStr::width(remaining.text.as_str());
            if cur_cols + remaining_cols <= width {
                cur.push(remaining);
                cur_cols += remaining_cols;
                break;
            }
            let max = width.saturating_sub(cur_cols).max(1);
            let (head, tail) = split_to_width_prefer_url_breaks(&remaining, max);
            if head.text.is_empty() && cur.is_empty() {
                // a single glyph wider than the line; place it anyway
                cur.push(remaining);
                break;
            }
            cur.push(head);
            push_line(&mut out, &mut cur, prefix);
            prefix = subsequent_prefix;
            cur_cols = plain_width(prefix);
            remaining = tail;
        }
    }

    if !cur.is_empty() || !prefix.is_empty() {
        push_line(&mut out, &mut cur, prefix);
    }
    out
}

fn split_to_width_prefer_url_breaks(seg: &Segment, max_cols: usize) -> (Segment, Segment) {
    if seg.link
        && let Some(idx) = last_url_breakpoint_before(&seg.text, max_cols)
    {
        return split_at(seg, idx);
    }
    split_to_width(seg, max_cols)
}

fn last_url_breakpoint_before(s: &str, max_cols: usize) -> Option<usize> {
    let mut cols = 0usize;
    let mut best: Option<usize> = None;
    for (byte_idx, ch) in s.char_indices() {
        let w = UnicodeWidthChar::width(ch).unwrap_or(0);
        if cols + w > max_cols {
            break;
        }
        cols += w;
        if matches!(ch, '/' | '.' | '-' | '_' | '?' | '&' | '#' | '=') {
            best = Some(byte_idx + ch.len_utf8());
        }
    }
    best.filter(|idx| *idx < s.len())
}

fn split_segment_ws(seg: &Segment) -> Vec<Segment> {
    let mut out: Vec<Segment> = Vec::new();
    let mut buf = String::new();
    let mut last_was_ws: Option<bool> = None;
    for ch in seg.text.chars() {
        let is_ws = ch.is_whitespace();
        if last_was_ws.is_some_and(|prev| prev != is_ws) {
            let mut s = seg.clone();
            s.text = std::mem::take(&mut buf);
            out.push(s);
        }
        buf.push(ch);
        last_was_ws = Some(is_ws);
    }
    if !buf.is_empty() {
        let mut s = seg.clone();
        s.text = buf;
        out.push(s);
    }
    out
}

fn split_to_width(seg: &Segment, max_cols: usize) -> (Segment, Segment) {
    let mut cols = 0usize;
    let mut idx = 0usize;
    for (byte_idx, ch) in seg.text.char_indices() {
        let w = UnicodeWidthChar::width(ch).unwrap_or(0);
        if cols + w > max_cols {
            break;
        }
        cols += w;
        idx = byte_idx + ch.len_utf8();
    }
    split_at(seg, idx)
}

fn split_at(seg: &Segment, idx: usize) -> (Segment, Segment) {
    let (a, b) = seg.text.split_at(idx);
    let mut left = seg.clone();
    left.text = a.to_string();
    let mut right = seg.clone();
    right.text = b.to_string();
    (left, right)
}

fn is_all_ws(s: &str) -> bool {
    s.chars().all(char::is_whitespace)
}

fn plain_width(segs: &[Segment]) -> usize {
    segs.iter()
        .map(|s| UnicodeWidthStr::width(s.text.as_str()))
        .sum()
}

fn segments_to_spans(segs: &[Segment], theme: &Theme) -> Vec<Span<'static>> {
    segs.iter()
        .filter(|s| !s.text.is_empty())
        .map(|s| Span::styled(s.text.clone(), style_for_segment(theme, s)))
        .collect()
}

fn style_for_segment(theme: &Theme, seg: &Segment) -> Style {
    if seg.error {
        return theme.danger;
    }
    let mut style = if seg.muted {
        theme.text_muted
    } else {
        match seg.style {
            ProseStyle::Normal => theme.text_primary,
            ProseStyle::Heading(1) => theme.heading.add_modifier(Modifier::UNDERLINED),
            ProseStyle::Heading(_) => theme.heading,
            ProseStyle::BlockQuote => theme.quote,
            ProseStyle::List => theme.text_muted,
        }
    };

    if seg.inline_code {
        style = theme.code_inline;
    }
    if seg.math {
        style = theme.math;
    }
    if seg.link {
        style = theme.link;
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

#[cfg(test)]
mod tests {
    use super::*;

    fn plain(lines: &[Line<'static>]) -> Vec<String> {
        lines
            .iter()
            .map(|l| l.spans.iter().map(|s| s.content.as_ref()).collect())
            .collect()
    }

    fn render(md: &str, width: u16) -> Vec<String> {
        let doc = MarkdownDocument::parse(md, &RenderOptions::default());
        plain(&doc.render(width, &Theme::default()))
    }

    #[test]
    fn wraps_prose_to_width() {
        let lines = render("the quick brown fox jumps", 10);
        assert_eq!(lines, vec!["the quick", "brown fox", "jumps"]);
    }

    #[test]
    fn paragraphs_are_separated_by_a_blank_line() {
        let lines = render("# Title\n\nbody text\n", 40);
        assert_eq!(lines, vec!["Title", "", "body text"]);
    }

    #[test]
    fn nested_list_items_are_indented_under_parent_item() {
        let lines = render("- a\n  - b\n- c\n", 40);
        assert_eq!(lines, vec!["• a", "  • b", "• c"]);
    }

    #[test]
    fn ordered_list_counts_from_start() {
        let lines = render("3. three\n4. four\n", 40);
        assert_eq!(lines, vec!["3. three", "4. four"]);
    }

    #[test]
    fn task_marker_replaces_bullet() {
        let lines = render("- [x] done\n- [ ] todo\n", 40);
        assert_eq!(lines, vec!["[✓] done", "[ ] todo"]);
    }

    #[test]
    fn blockquote_prefix_repeats_on_wrapped_lines() {
        let lines = render("> one two three\n", 9);
        assert_eq!(lines, vec!["│ one two", "│ three"]);
    }

    #[test]
    fn code_blocks_are_indented_and_not_wrapped() {
        let lines = render("```rs\nfn main() {}\n```\n", 8);
        assert_eq!(lines, vec!["  rs", "  fn mai"]);
    }

    #[test]
    fn renders_rule_across_the_width() {
        let lines = render("---\n", 6);
        assert_eq!(lines, vec!["──────"]);
    }

    #[test]
    fn renders_tables_with_header_separator() {
        let lines = render("| a | b |\n|---|--:|\n| x | 10 |\n", 40);
        assert_eq!(lines, vec![" a │  b ", "───┼────", " x │ 10 "]);
    }

    #[test]
    fn tables_can_be_disabled() {
        let options = RenderOptions {
            extensions: Extensions {
                tables: false,
                ..Extensions::default()
            },
            ..RenderOptions::default()
        };
        let doc = MarkdownDocument::parse("| a |\n|---|\n", &options);
        let lines = plain(&doc.render(40, &Theme::default()));
        assert_eq!(lines, vec!["| a | |---|"]);
    }

    #[test]
    fn inline_math_is_converted() {
        let lines = render("energy $E_i$ with $g_i$ states", 80);
        assert_eq!(lines, vec!["energy Eᵢ with gᵢ states"]);
    }

    #[test]
    fn display_math_gets_its_own_indented_line() {
        let lines = render("before\n\n$$W = \\prod_i W_i$$\n\nafter", 80);
        assert_eq!(lines, vec!["before", "", "  W = ∏ᵢWᵢ", "", "after"]);
    }

    #[test]
    fn malformed_math_renders_an_error_marker_and_the_rest_survives() {
        let doc = MarkdownDocument::parse(
            "bad $\\frac{1}$ math\n\nnext paragraph",
            &RenderOptions::default(),
        );
        assert_eq!(doc.math_errors(), 1);
        let theme = Theme::default();
        let lines = doc.render(80, &theme);
        assert_eq!(
            plain(&lines),
            vec!["bad ⚠ \\frac{1} math", "", "next paragraph"]
        );
        let marker = lines[0]
            .spans
            .iter()
            .find(|s| s.content.starts_with('⚠'))
            .expect("error marker span");
        assert_eq!(marker.style, theme.danger);
    }

    #[test]
    fn math_can_be_disabled() {
        let options = RenderOptions {
            extensions: Extensions::none(),
            ..RenderOptions::default()
        };
        let doc = MarkdownDocument::parse("cost $5 and $6", &options);
        assert_eq!(plain(&doc.render(80, &Theme::default())), vec!["cost $5 and $6"]);
    }

    #[test]
    fn bare_urls_become_links() {
        let theme = Theme::default();
        let doc = MarkdownDocument::parse("see https://example.com/a.", &RenderOptions::default());
        let lines = doc.render(80, &theme);
        assert_eq!(plain(&lines), vec!["see https://example.com/a."]);
        let link = lines[0]
            .spans
            .iter()
            .find(|s| s.content.starts_with("https"))
            .expect("link span");
        assert_eq!(link.content.as_ref(), "https://example.com/a");
        assert_eq!(link.style, theme.link);
    }

    #[test]
    fn link_destinations_are_optional() {
        let md = "[docs](https://example.com)";
        assert_eq!(render(md, 80), vec!["docs"]);
        let options = RenderOptions {
            show_link_destinations: true,
            ..RenderOptions::default()
        };
        let doc = MarkdownDocument::parse(md, &options);
        assert_eq!(
            plain(&doc.render(80, &Theme::default())),
            vec!["docs (https://example.com)"]
        );
    }

    #[test]
    fn strips_inline_html_tags() {
        assert_eq!(render("a <b>bold</b> word", 80), vec!["a bold word"]);
    }

    #[test]
    fn long_words_are_split() {
        assert_eq!(render("abcdefghij", 4), vec!["abcd", "efgh", "ij"]);
    }

    #[test]
    fn renders_without_panicking_at_tiny_widths() {
        let md = "# h\n\n> - [x] item with `code` and $x^2$\n\n| a | b |\n|---|---|\n| 1 | 2 |\n";
        for width in 0..12 {
            let _ = render(md, width);
        }
    }
}
