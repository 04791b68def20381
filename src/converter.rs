//! Markdown transformer - renders cleaned HTML as Markdown
//!
//! The transformer parses a fragment and walks the tree depth-first in
//! document order. Every element is looked up in a [`MarkdownMapping`]; the
//! [`TagRule`] found there decides how it renders, and elements without a
//! rule contribute their children only.
//!
//! # Text
//!
//! Runs of whitespace in text collapse to one space. `*` is escaped unless
//! `escape_asterisks` is off, `_` only when `escape_underscores` is on. Code
//! spans and code blocks are emitted verbatim.
//!
//! # Output cleanup
//!
//! Block elements are separated by exactly one blank line. Lines lose
//! trailing whitespace (except hard line breaks), runs of blank lines
//! collapse, and the document is trimmed. Fenced code is left untouched.
//!
//! # Examples
//!
//! ```rust
//! use content_markdown_converter::converter::MarkdownTransformer;
//!
//! let transformer = MarkdownTransformer::default();
//! let markdown = transformer.transform("<h2>Title</h2><p>Hello <b>world</b></p>");
//! assert_eq!(markdown, "### Title\n\nHello **world**");
//! ```

use markup5ever_rcdom::{Handle, NodeData};
use tracing::debug;

use crate::dom::{attr, tag_name, text_content};
use crate::locator::ContentRegion;
use crate::mapping::{MarkdownMapping, TagRule};
use crate::parser::parse_html;

/// Deepest element nesting rendered structurally; anything below is
/// flattened to its text
const MAX_RENDER_DEPTH: usize = 256;

/// Shortest backtick or tilde run that opens a fenced code block
const MIN_FENCE_RUN: usize = 3;

/// Table column alignment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TableAlignment {
    Left,
    Center,
    Right,
}

/// Traversal state handed down the tree
#[derive(Debug, Clone, Copy, Default)]
struct Context {
    /// Element nesting depth
    depth: usize,
    /// Number of enclosing lists
    list_depth: usize,
}

impl Context {
    fn nested(self) -> Self {
        Self {
            depth: self.depth + 1,
            ..self
        }
    }

    fn in_list(self) -> Self {
        Self {
            list_depth: self.list_depth + 1,
            ..self
        }
    }
}

/// Converts HTML fragments to Markdown using a [`MarkdownMapping`].
#[derive(Debug, Clone, Default)]
pub struct MarkdownTransformer {
    mapping: MarkdownMapping,
}

impl MarkdownTransformer {
    pub fn new(mapping: MarkdownMapping) -> Self {
        Self { mapping }
    }

    pub fn mapping(&self) -> &MarkdownMapping {
        &self.mapping
    }

    /// Convert an HTML fragment. Empty input yields an empty string.
    pub fn transform(&self, fragment: &str) -> String {
        if fragment.trim().is_empty() {
            return String::new();
        }

        let dom = parse_html(fragment);
        let markdown = self.render_root(&dom.document);

        debug!(
            input_len = fragment.len(),
            output_len = markdown.len(),
            "Transformed fragment to Markdown"
        );
        markdown
    }

    /// Convert a located region directly, without re-parsing it.
    pub fn transform_region(&self, region: Option<&ContentRegion>) -> String {
        match region {
            Some(region) => self.render_root(region.handle()),
            None => String::new(),
        }
    }

    fn render_root(&self, root: &Handle) -> String {
        let mut output = String::new();
        self.render_node(root, &mut output, Context::default());
        finish(&output)
    }

    fn render_node(&self, node: &Handle, output: &mut String, ctx: Context) {
        match node.data {
            NodeData::Document => self.render_children(node, output, ctx),
            NodeData::Text { ref contents } => self.push_text(output, &contents.borrow()),
            NodeData::Element { .. } => self.render_element(node, output, ctx),
            _ => {}
        }
    }

    fn render_children(&self, node: &Handle, output: &mut String, ctx: Context) {
        for child in node.children.borrow().iter() {
            self.render_node(child, output, ctx);
        }
    }

    fn render_element(&self, node: &Handle, output: &mut String, ctx: Context) {
        if ctx.depth >= MAX_RENDER_DEPTH {
            self.push_text(output, &text_content(node));
            return;
        }
        let ctx = ctx.nested();

        let Some(rule) = tag_name(node).and_then(|tag| self.mapping.rule_for(tag)) else {
            self.render_children(node, output, ctx);
            return;
        };

        match rule {
            TagRule::Heading { marker } => self.render_heading(node, marker, output, ctx),
            TagRule::Emphasis { delimiter } => self.render_emphasis(node, delimiter, output, ctx),
            TagRule::InlineCode => render_inline_code(node, output),
            TagRule::Paragraph | TagRule::Block => {
                open_block(output);
                self.render_children(node, output, ctx);
                open_block(output);
            }
            TagRule::Link => self.render_link(node, output, ctx),
            TagRule::Image => render_image(node, output),
            TagRule::List { ordered } => self.render_list(node, *ordered, output, ctx),
            TagRule::ListItem => {
                // An item outside any list renders as a one-item list
                let marker = self.mapping.bullet(ctx.list_depth).to_string();
                open_block(output);
                self.render_list_item(node, &marker, output, ctx.in_list());
                open_block(output);
            }
            TagRule::Blockquote => self.render_blockquote(node, output, ctx),
            TagRule::CodeBlock => render_code_block(node, output),
            TagRule::LineBreak => output.push_str("  \n"),
            TagRule::ThematicBreak => {
                open_block(output);
                output.push_str("---");
                open_block(output);
            }
            TagRule::Table => self.render_table(node, output, ctx),
            TagRule::Skip => {}
        }
    }

    /// Append text with whitespace collapsed and Markdown characters escaped
    fn push_text(&self, output: &mut String, text: &str) {
        let mut words = text.split_whitespace().peekable();

        if words.peek().is_none() {
            if !text.is_empty() && needs_space(output) {
                output.push(' ');
            }
            return;
        }

        if text.starts_with(char::is_whitespace) && needs_space(output) {
            output.push(' ');
        }
        let mut first = true;
        for word in words {
            if !first {
                output.push(' ');
            }
            first = false;
            self.push_escaped(output, word);
        }
        if text.ends_with(char::is_whitespace) {
            output.push(' ');
        }
    }

    fn push_escaped(&self, output: &mut String, word: &str) {
        let mut chars = word.chars().peekable();
        while let Some(ch) = chars.next() {
            if matches!(ch, '`' | '~') {
                let mut run = 1;
                while chars.next_if_eq(&ch).is_some() {
                    run += 1;
                }
                // A run this long would open a code fence
                let escape = run >= MIN_FENCE_RUN;
                for _ in 0..run {
                    if escape {
                        output.push('\\');
                    }
                    output.push(ch);
                }
                continue;
            }

            let escape = match ch {
                '*' => self.mapping.escape_asterisks,
                '_' => self.mapping.escape_underscores,
                _ => false,
            };
            if escape {
                output.push('\\');
            }
            output.push(ch);
        }
    }

    fn render_heading(&self, node: &Handle, marker: &str, output: &mut String, ctx: Context) {
        let mut inner = String::new();
        self.render_children(node, &mut inner, ctx);
        let text = inner.split_whitespace().collect::<Vec<_>>().join(" ");
        if text.is_empty() {
            return;
        }

        open_block(output);
        if !marker.is_empty() {
            output.push_str(marker);
            output.push(' ');
        }
        output.push_str(&text);
        open_block(output);
    }

    /// Wrap rendered children in `delimiter`, moving surrounding whitespace
    /// outside the delimiters
    fn render_emphasis(&self, node: &Handle, delimiter: &str, output: &mut String, ctx: Context) {
        let mut inner = String::new();
        self.render_children(node, &mut inner, ctx);
        let raw = text_content(node);

        wrap_inline(output, &inner, &raw, |content, output| {
            output.push_str(delimiter);
            output.push_str(content);
            output.push_str(delimiter);
        });
    }

    fn render_link(&self, node: &Handle, output: &mut String, ctx: Context) {
        let Some(href) = attr(node, "href") else {
            self.render_children(node, output, ctx);
            return;
        };

        let mut inner = String::new();
        self.render_children(node, &mut inner, ctx);
        let raw = text_content(node);
        let title = attr(node, "title").filter(|title| !title.trim().is_empty());
        let href = href.trim().replace(' ', "%20");

        let visible = raw.split_whitespace().collect::<Vec<_>>().join(" ");
        if self.mapping.autolinks && title.is_none() && !href.is_empty() && visible == href {
            wrap_inline(output, &inner, &raw, |_, output| {
                output.push('<');
                output.push_str(&href);
                output.push('>');
            });
            return;
        }

        wrap_inline(output, &inner, &raw, |content, output| {
            output.push('[');
            output.push_str(content);
            output.push_str("](");
            output.push_str(&href);
            if let Some(ref title) = title {
                output.push_str(" \"");
                output.push_str(&title.replace('"', "\\\""));
                output.push('"');
            }
            output.push(')');
        });
    }

    fn render_list(&self, node: &Handle, ordered: bool, output: &mut String, ctx: Context) {
        let mut number = if ordered {
            attr(node, "start")
                .and_then(|start| start.trim().parse::<u64>().ok())
                .unwrap_or(1)
        } else {
            1
        };
        let bullet = self.mapping.bullet(ctx.list_depth).to_string();
        let item_ctx = ctx.in_list();

        let mut items = String::new();
        let mut last_indent = 0;

        for child in node.children.borrow().iter() {
            let is_item = tag_name(child)
                .and_then(|tag| self.mapping.rule_for(tag))
                .is_some_and(|rule| *rule == TagRule::ListItem);

            if is_item {
                let marker = if ordered {
                    let marker = format!("{number}.");
                    number += 1;
                    marker
                } else {
                    bullet.clone()
                };
                last_indent = marker.chars().count() + 1;
                self.render_list_item(child, &marker, &mut items, item_ctx);
                continue;
            }

            // Stray content between items continues the previous item
            let mut stray = String::new();
            self.render_node(child, &mut stray, item_ctx);
            let stray = finish(&stray);
            if !stray.is_empty() {
                let indent = " ".repeat(last_indent);
                push_indented(&mut items, &stray, &indent, &indent);
            }
        }

        if items.is_empty() {
            return;
        }
        open_block(output);
        output.push_str(&items);
        open_block(output);
    }

    fn render_list_item(&self, node: &Handle, marker: &str, output: &mut String, ctx: Context) {
        let mut body = String::new();
        self.render_children(node, &mut body, ctx);
        let body = finish(&body);

        if body.is_empty() {
            output.push_str(marker);
            output.push('\n');
            return;
        }

        let first = format!("{marker} ");
        let rest = " ".repeat(first.chars().count());
        push_indented(output, &body, &first, &rest);
    }

    fn render_blockquote(&self, node: &Handle, output: &mut String, ctx: Context) {
        let mut inner = String::new();
        self.render_children(node, &mut inner, ctx);
        let inner = finish(&inner);
        if inner.is_empty() {
            return;
        }

        open_block(output);
        for (i, line) in inner.lines().enumerate() {
            if i > 0 {
                output.push('\n');
            }
            if line.is_empty() {
                output.push('>');
            } else {
                output.push_str("> ");
                output.push_str(line);
            }
        }
        open_block(output);
    }

    fn render_table(&self, node: &Handle, output: &mut String, ctx: Context) {
        let mut rows: Vec<Vec<String>> = Vec::new();
        let mut alignments: Vec<TableAlignment> = Vec::new();

        for row in table_rows(node) {
            let mut cells = Vec::new();
            for cell in row.children.borrow().iter() {
                if !matches!(tag_name(cell), Some("td" | "th")) {
                    continue;
                }
                if rows.is_empty() {
                    alignments.push(extract_alignment(cell));
                }
                let mut content = String::new();
                self.render_children(cell, &mut content, ctx);
                let content = content
                    .split_whitespace()
                    .collect::<Vec<_>>()
                    .join(" ")
                    .replace('|', "\\|");
                cells.push(content);
            }
            rows.push(cells);
        }

        let columns = rows.iter().map(Vec::len).max().unwrap_or(0);
        if columns == 0 {
            return;
        }
        alignments.resize(columns, TableAlignment::Left);

        open_block(output);
        let mut rows = rows.into_iter();
        if let Some(header) = rows.next() {
            write_table_row(output, &header, columns);
        }
        output.push('|');
        for alignment in &alignments {
            output.push_str(match alignment {
                TableAlignment::Left => " --- |",
                TableAlignment::Center => " :---: |",
                TableAlignment::Right => " ---: |",
            });
        }
        output.push('\n');
        for row in rows {
            write_table_row(output, &row, columns);
        }
        open_block(output);
    }
}

/// Convert `fragment` to Markdown with the given mapping.
pub fn transform(fragment: &str, mapping: &MarkdownMapping) -> String {
    MarkdownTransformer::new(mapping.clone()).transform(fragment)
}

fn needs_space(output: &str) -> bool {
    !output.is_empty() && !output.ends_with(char::is_whitespace)
}

/// Trim trailing spaces and make sure the buffer ends with a blank line,
/// unless it is empty
fn open_block(output: &mut String) {
    let trimmed = output.trim_end_matches([' ', '\t']).len();
    output.truncate(trimmed);
    if output.is_empty() {
        return;
    }
    while !output.ends_with("\n\n") {
        output.push('\n');
    }
}

/// Emit an inline construct around `inner`, keeping the whitespace that
/// surrounded its text (`raw`) outside of it. Nothing is emitted for
/// whitespace-only content.
fn wrap_inline(output: &mut String, inner: &str, raw: &str, write: impl FnOnce(&str, &mut String)) {
    let content = inner.trim();
    if content.is_empty() {
        if !raw.is_empty() && needs_space(output) {
            output.push(' ');
        }
        return;
    }

    if raw.starts_with(char::is_whitespace) && needs_space(output) {
        output.push(' ');
    }
    write(content, output);
    if raw.ends_with(char::is_whitespace) {
        output.push(' ');
    }
}

fn render_inline_code(node: &Handle, output: &mut String) {
    let code = text_content(node);
    if code.is_empty() {
        return;
    }

    let fence = "`".repeat(longest_backtick_run(&code) + 1);
    let pad = code.starts_with('`') || code.ends_with('`');
    output.push_str(&fence);
    if pad {
        output.push(' ');
    }
    output.push_str(&code);
    if pad {
        output.push(' ');
    }
    output.push_str(&fence);
}

fn render_image(node: &Handle, output: &mut String) {
    let Some(src) = attr(node, "src").filter(|src| !src.trim().is_empty()) else {
        return;
    };
    let alt = attr(node, "alt")
        .map(|alt| alt.split_whitespace().collect::<Vec<_>>().join(" "))
        .unwrap_or_default();

    output.push_str("![");
    output.push_str(&alt);
    output.push_str("](");
    output.push_str(&src.trim().replace(' ', "%20"));
    if let Some(title) = attr(node, "title").filter(|title| !title.trim().is_empty()) {
        output.push_str(" \"");
        output.push_str(&title.replace('"', "\\\""));
        output.push('"');
    }
    output.push(')');
}

fn render_code_block(node: &Handle, output: &mut String) {
    let code = text_content(node);
    if code.trim().is_empty() {
        return;
    }

    let language = code_language(node).unwrap_or_default();
    let fence = "`".repeat((longest_backtick_run(&code) + 1).max(MIN_FENCE_RUN));

    open_block(output);
    output.push_str(&fence);
    output.push_str(&language);
    output.push('\n');
    output.push_str(&code);
    if !code.ends_with('\n') {
        output.push('\n');
    }
    output.push_str(&fence);
    open_block(output);
}

/// Language from a `language-*` or `lang-*` class on the `pre` or its
/// `code` children
fn code_language(pre: &Handle) -> Option<String> {
    let code_children = pre
        .children
        .borrow()
        .iter()
        .filter(|child| tag_name(child) == Some("code"))
        .cloned()
        .collect::<Vec<_>>();

    std::iter::once(pre.clone())
        .chain(code_children)
        .filter_map(|node| attr(&node, "class"))
        .find_map(|class| {
            class.split_whitespace().find_map(|class| {
                class
                    .strip_prefix("language-")
                    .or_else(|| class.strip_prefix("lang-"))
                    .filter(|lang| !lang.is_empty())
                    .map(str::to_string)
            })
        })
}

fn longest_backtick_run(text: &str) -> usize {
    let mut longest = 0;
    let mut current = 0;
    for ch in text.chars() {
        if ch == '`' {
            current += 1;
            longest = longest.max(current);
        } else {
            current = 0;
        }
    }
    longest
}

/// `tr` elements of a table in document order, looking through `thead`,
/// `tbody` and `tfoot`
fn table_rows(table: &Handle) -> Vec<Handle> {
    let mut rows = Vec::new();
    for child in table.children.borrow().iter() {
        match tag_name(child) {
            Some("tr") => rows.push(child.clone()),
            Some("thead" | "tbody" | "tfoot") => rows.extend(
                child
                    .children
                    .borrow()
                    .iter()
                    .filter(|row| tag_name(row) == Some("tr"))
                    .cloned(),
            ),
            _ => {}
        }
    }
    rows
}

/// Alignment from the `align` attribute or a `text-align` style
fn extract_alignment(cell: &Handle) -> TableAlignment {
    if let Some(align) = attr(cell, "align") {
        return match align.trim().to_ascii_lowercase().as_str() {
            "center" => TableAlignment::Center,
            "right" => TableAlignment::Right,
            _ => TableAlignment::Left,
        };
    }

    if let Some(style) = attr(cell, "style") {
        let style = style.to_ascii_lowercase();
        if style.contains("text-align") {
            if style.contains("center") {
                return TableAlignment::Center;
            } else if style.contains("right") {
                return TableAlignment::Right;
            }
        }
    }

    TableAlignment::Left
}

fn write_table_row(output: &mut String, cells: &[String], columns: usize) {
    output.push('|');
    for i in 0..columns {
        output.push(' ');
        if let Some(cell) = cells.get(i) {
            output.push_str(cell);
        }
        output.push_str(" |");
    }
    output.push('\n');
}

/// Append `block` line by line: the first line prefixed with `first`, later
/// lines with `rest`. Blank lines are dropped outside fenced code.
fn push_indented(output: &mut String, block: &str, first: &str, rest: &str) {
    let mut fence = FenceState::default();
    for (i, line) in block.lines().enumerate() {
        let in_fence = fence.update(line);
        if line.is_empty() {
            if in_fence {
                output.push('\n');
            }
            continue;
        }
        output.push_str(if i == 0 { first } else { rest });
        output.push_str(line);
        output.push('\n');
    }
}

/// Tracks whether a sequence of lines is inside a fenced code block.
#[derive(Debug, Default)]
struct FenceState {
    open: Option<usize>,
}

impl FenceState {
    /// Feed the next line. Returns true for fence delimiters and the lines
    /// between them.
    fn update(&mut self, line: &str) -> bool {
        // Look through blockquote markers and list indentation
        let stripped = line.trim_start_matches(['>', ' ']);
        let ticks = stripped.chars().take_while(|&c| c == '`').count();

        match self.open {
            Some(len) => {
                if ticks >= len && stripped[ticks..].trim().is_empty() {
                    self.open = None;
                }
                true
            }
            None if ticks >= MIN_FENCE_RUN && !stripped[ticks..].contains('`') => {
                self.open = Some(ticks);
                true
            }
            None => false,
        }
    }
}

/// Final cleanup: one blank line between blocks at most, no trailing
/// whitespace except hard breaks, nothing leading or trailing
fn finish(markdown: &str) -> String {
    let mut lines: Vec<String> = Vec::new();
    let mut fence = FenceState::default();
    let mut source = markdown.lines().peekable();

    while let Some(line) = source.next() {
        if fence.update(line) {
            lines.push(line.to_string());
            continue;
        }

        let trimmed = line.trim_end();
        if trimmed.is_empty() {
            if lines.last().is_some_and(|last| !last.is_empty()) {
                lines.push(String::new());
            }
            continue;
        }

        let next_is_blank = source.peek().is_none_or(|next| next.trim().is_empty());
        if line.ends_with("  ") && !next_is_blank {
            lines.push(format!("{trimmed}  "));
        } else {
            lines.push(trimmed.to_string());
        }
    }

    while lines.last().is_some_and(|last| last.is_empty()) {
        lines.pop();
    }
    lines.join("\n")
}
