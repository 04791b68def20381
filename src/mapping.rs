//! Tag-to-Markdown mapping table
//!
//! The transformer never hardcodes tag names. Every element is looked up in a
//! [`MarkdownMapping`], which pairs a tag name with the [`TagRule`] deciding
//! how it renders, plus a handful of text options. Tags without an entry
//! pass their children through unwrapped.

use std::collections::HashMap;

/// Heading markers for `h1`..`h6`. Each level renders one `#` deeper than
/// its number.
pub const DEFAULT_HEADING_MARKERS: [&str; 6] =
    ["##", "###", "####", "#####", "######", "#######"];

/// Bullet characters, cycled by list nesting depth
pub const DEFAULT_BULLETS: &str = "*+-";

/// How one element renders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TagRule {
    /// ATX heading with the given marker
    Heading { marker: String },
    /// Inline span wrapped in `delimiter` on both sides
    Emphasis { delimiter: String },
    /// Backtick code span
    InlineCode,
    Paragraph,
    /// Blank-line separated container without markup of its own
    Block,
    Link,
    Image,
    List { ordered: bool },
    ListItem,
    Blockquote,
    /// Fenced code block
    CodeBlock,
    /// Hard line break
    LineBreak,
    ThematicBreak,
    /// Pipe table, first row as header
    Table,
    /// Dropped together with its content
    Skip,
}

/// Tag table and text options for the transformer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkdownMapping {
    rules: HashMap<String, TagRule>,
    /// Escape `_` in text
    pub escape_underscores: bool,
    /// Escape `*` in text
    pub escape_asterisks: bool,
    /// Bullet characters, cycled by nesting depth
    pub bullets: Vec<char>,
    /// Render `<a href="x">x</a>` as `<x>`
    pub autolinks: bool,
}

impl Default for MarkdownMapping {
    fn default() -> Self {
        let mut rules = HashMap::new();

        for (level, marker) in DEFAULT_HEADING_MARKERS.iter().enumerate() {
            rules.insert(
                format!("h{}", level + 1),
                TagRule::Heading {
                    marker: marker.to_string(),
                },
            );
        }

        for (tags, delimiter) in [
            (&["b", "strong"][..], "**"),
            (&["em", "i"][..], "*"),
            (&["del", "s", "strike"][..], "~~"),
        ] {
            for tag in tags {
                rules.insert(
                    tag.to_string(),
                    TagRule::Emphasis {
                        delimiter: delimiter.to_string(),
                    },
                );
            }
        }

        for tag in [
            "div", "section", "article", "main", "header", "footer", "aside", "nav", "figure",
            "figcaption", "address", "details", "summary", "dl", "dt", "dd",
        ] {
            rules.insert(tag.to_string(), TagRule::Block);
        }

        for tag in ["script", "style", "noscript", "template"] {
            rules.insert(tag.to_string(), TagRule::Skip);
        }

        for (tag, rule) in [
            ("p", TagRule::Paragraph),
            ("a", TagRule::Link),
            ("img", TagRule::Image),
            ("ul", TagRule::List { ordered: false }),
            ("ol", TagRule::List { ordered: true }),
            ("li", TagRule::ListItem),
            ("blockquote", TagRule::Blockquote),
            ("pre", TagRule::CodeBlock),
            ("code", TagRule::InlineCode),
            ("br", TagRule::LineBreak),
            ("hr", TagRule::ThematicBreak),
            ("table", TagRule::Table),
        ] {
            rules.insert(tag.to_string(), rule);
        }

        Self {
            rules,
            escape_underscores: false,
            escape_asterisks: true,
            bullets: DEFAULT_BULLETS.chars().collect(),
            autolinks: true,
        }
    }
}

impl MarkdownMapping {
    /// Rule for `tag`, compared case-insensitively.
    pub fn rule_for(&self, tag: &str) -> Option<&TagRule> {
        match self.rules.get(tag) {
            Some(rule) => Some(rule),
            None if tag.bytes().any(|b| b.is_ascii_uppercase()) => {
                self.rules.get(&tag.to_ascii_lowercase())
            }
            None => None,
        }
    }

    /// Add or replace the rule for `tag`.
    pub fn insert(&mut self, tag: &str, rule: TagRule) -> Option<TagRule> {
        self.rules.insert(tag.to_ascii_lowercase(), rule)
    }

    /// Remove the rule for `tag`, making it pass its children through.
    pub fn remove(&mut self, tag: &str) -> Option<TagRule> {
        self.rules.remove(&tag.to_ascii_lowercase())
    }

    /// Marker configured for heading `level` (1..=6).
    pub fn heading_marker(&self, level: usize) -> Option<&str> {
        if !(1..=6).contains(&level) {
            return None;
        }
        match self.rules.get(&format!("h{level}")) {
            Some(TagRule::Heading { marker }) => Some(marker.as_str()),
            _ => None,
        }
    }

    /// Replace the markers of `h1`..`h6`.
    pub fn with_heading_markers<S: Into<String>>(mut self, markers: [S; 6]) -> Self {
        for (level, marker) in markers.into_iter().enumerate() {
            self.rules.insert(
                format!("h{}", level + 1),
                TagRule::Heading {
                    marker: marker.into(),
                },
            );
        }
        self
    }

    /// Bullet for a list nested `depth` levels deep (0 = outermost).
    pub fn bullet(&self, depth: usize) -> char {
        if self.bullets.is_empty() {
            return '*';
        }
        self.bullets[depth % self.bullets.len()]
    }
}
