//! Main-content localization
//!
//! A page is searched with an ordered list of [`SelectorRule`]s. The first
//! rule that matches any element decides the region, and within a rule the
//! first element in document order wins. Rules are never scored or
//! reordered. When no rule matches, the document `body` is used, provided it
//! holds anything at all.
//!
//! # Selector grammar
//!
//! A rule is a single compound selector: an optional tag name, an optional
//! `#id`, any number of `.class` parts and any number of `[attr]`,
//! `[attr=value]` or `[attr="value"]` parts.
//!
//! ```rust
//! use content_markdown_converter::locator::SelectorRule;
//!
//! assert!("div.post-body".parse::<SelectorRule>().is_ok());
//! assert!("[role=main]".parse::<SelectorRule>().is_ok());
//! assert!("main article".parse::<SelectorRule>().is_err());
//! ```

use std::fmt;
use std::str::FromStr;

use markup5ever_rcdom::{Handle, Node, NodeData, RcDom};
use tracing::{debug, trace};

use crate::dom::{attr, has_content, outer_html, tag_name};
use crate::error::ConfigError;
use crate::parser::{document_sections, parse_html};

/// Selectors tried when the caller supplies none, most specific first
pub const DEFAULT_SELECTORS: &[&str] =
    &["main", "article", ".main", "#main", ".content", "#content"];

#[derive(Debug, Clone, PartialEq, Eq)]
enum AttrMatch {
    Present(String),
    Equals(String, String),
}

/// One compound selector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectorRule {
    source: String,
    tag: Option<String>,
    id: Option<String>,
    classes: Vec<String>,
    attributes: Vec<AttrMatch>,
}

impl SelectorRule {
    /// The selector text this rule was parsed from.
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Whether `node` is an element satisfying every part of the rule.
    pub fn matches(&self, node: &Node) -> bool {
        let Some(tag) = tag_name(node) else {
            return false;
        };

        if let Some(ref expected) = self.tag
            && !tag.eq_ignore_ascii_case(expected)
        {
            return false;
        }

        if let Some(ref expected) = self.id
            && attr(node, "id").as_deref() != Some(expected.as_str())
        {
            return false;
        }

        if !self.classes.is_empty() {
            let class_attr = attr(node, "class").unwrap_or_default();
            if !self
                .classes
                .iter()
                .all(|class| class_attr.split_whitespace().any(|c| c == class))
            {
                return false;
            }
        }

        self.attributes.iter().all(|condition| match condition {
            AttrMatch::Present(name) => attr(node, name).is_some(),
            AttrMatch::Equals(name, value) => attr(node, name).as_deref() == Some(value.as_str()),
        })
    }
}

impl fmt::Display for SelectorRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '-' || c == '_' || !c.is_ascii()
}

/// Split off the identifier at the start of `input`.
fn take_ident(input: &str) -> (&str, &str) {
    let end = input
        .char_indices()
        .find(|(_, c)| !is_ident_char(*c))
        .map_or(input.len(), |(i, _)| i);
    input.split_at(end)
}

impl FromStr for SelectorRule {
    type Err = ConfigError;

    fn from_str(selector: &str) -> Result<Self, Self::Err> {
        let source = selector.trim();
        let invalid = |reason: &'static str| ConfigError::InvalidSelector {
            selector: selector.to_string(),
            reason,
        };

        if source.is_empty() {
            return Err(invalid("selector is empty"));
        }
        if has_combinator(source) {
            return Err(invalid("combinators are not supported"));
        }

        let mut rule = SelectorRule {
            source: source.to_string(),
            tag: None,
            id: None,
            classes: Vec::new(),
            attributes: Vec::new(),
        };

        let mut rest = source;
        if rest.starts_with('*') {
            rest = &rest[1..];
        } else {
            let (tag, tail) = take_ident(rest);
            if !tag.is_empty() {
                rule.tag = Some(tag.to_ascii_lowercase());
            }
            rest = tail;
        }

        while let Some(c) = rest.chars().next() {
            match c {
                '#' => {
                    let (id, tail) = take_ident(&rest[1..]);
                    if id.is_empty() {
                        return Err(invalid("'#' must be followed by an id"));
                    }
                    if rule.id.is_some() {
                        return Err(invalid("only one id is allowed"));
                    }
                    rule.id = Some(id.to_string());
                    rest = tail;
                }
                '.' => {
                    let (class, tail) = take_ident(&rest[1..]);
                    if class.is_empty() {
                        return Err(invalid("'.' must be followed by a class name"));
                    }
                    rule.classes.push(class.to_string());
                    rest = tail;
                }
                '[' => {
                    let close = rest
                        .find(']')
                        .ok_or_else(|| invalid("unterminated attribute selector"))?;
                    let body = &rest[1..close];
                    rule.attributes.push(parse_attribute(body).ok_or_else(|| {
                        invalid("attribute selector must be [name] or [name=value]")
                    })?);
                    rest = &rest[close + 1..];
                }
                _ => return Err(invalid("unexpected character")),
            }
        }

        if rule.tag.is_none()
            && rule.id.is_none()
            && rule.classes.is_empty()
            && rule.attributes.is_empty()
            && source != "*"
        {
            return Err(invalid("selector matches nothing"));
        }

        Ok(rule)
    }
}

/// Whitespace, `,`, `>`, `+` or `~` outside an attribute condition.
fn has_combinator(source: &str) -> bool {
    let mut in_brackets = false;
    source.chars().any(|c| match c {
        '[' => {
            in_brackets = true;
            false
        }
        ']' => {
            in_brackets = false;
            false
        }
        c => !in_brackets && (c.is_whitespace() || matches!(c, ',' | '>' | '+' | '~')),
    })
}

fn parse_attribute(body: &str) -> Option<AttrMatch> {
    match body.split_once('=') {
        None => {
            let (name, tail) = take_ident(body);
            (!name.is_empty() && tail.is_empty())
                .then(|| AttrMatch::Present(name.to_ascii_lowercase()))
        }
        Some((name, value)) => {
            let (name, tail) = take_ident(name);
            if name.is_empty() || !tail.is_empty() {
                return None;
            }
            let value = value
                .strip_prefix('"')
                .and_then(|v| v.strip_suffix('"'))
                .or_else(|| value.strip_prefix('\'').and_then(|v| v.strip_suffix('\'')))
                .unwrap_or(value);
            Some(AttrMatch::Equals(name.to_ascii_lowercase(), value.to_string()))
        }
    }
}

/// Ordered selector rules. Order is priority.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectorList {
    rules: Vec<SelectorRule>,
}

impl SelectorList {
    pub fn new(rules: Vec<SelectorRule>) -> Self {
        Self { rules }
    }

    /// Parse every selector, failing on the first invalid one.
    pub fn from_strs<S: AsRef<str>>(selectors: &[S]) -> Result<Self, ConfigError> {
        selectors
            .iter()
            .map(|s| s.as_ref().parse())
            .collect::<Result<Vec<_>, _>>()
            .map(Self::new)
    }

    pub fn rules(&self) -> &[SelectorRule] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

impl Default for SelectorList {
    fn default() -> Self {
        let rules = DEFAULT_SELECTORS
            .iter()
            .filter_map(|s| s.parse().ok())
            .collect();
        Self { rules }
    }
}

/// The subtree chosen as the page's main content.
///
/// Holds the document root next to the region. Dropping the last handle to
/// an rcdom document empties every node below it, so the region owns the
/// root for as long as it exists.
#[derive(Debug, Clone)]
pub struct ContentRegion {
    document: Handle,
    node: Handle,
    matched_rule: Option<String>,
}

impl ContentRegion {
    pub fn handle(&self) -> &Handle {
        &self.node
    }

    /// Root of the document the region was found in.
    pub fn document(&self) -> &Handle {
        &self.document
    }

    /// Selector text of the rule that matched, `None` for the body fallback.
    pub fn matched_rule(&self) -> Option<&str> {
        self.matched_rule.as_deref()
    }

    pub fn is_fallback(&self) -> bool {
        self.matched_rule.is_none()
    }

    /// Serialize the region including its own tag.
    pub fn to_html(&self) -> String {
        outer_html(&self.node)
    }
}

/// Finds the main content region of a page.
#[derive(Debug, Clone, Default)]
pub struct ContentLocator {
    selectors: SelectorList,
}

impl ContentLocator {
    pub fn new(selectors: SelectorList) -> Self {
        Self { selectors }
    }

    pub fn selectors(&self) -> &SelectorList {
        &self.selectors
    }

    /// Parse `document` and locate its content region.
    pub fn locate(&self, document: &str) -> Option<ContentRegion> {
        let dom = parse_html(document);
        self.locate_in(&dom)
    }

    /// Locate the content region in an already parsed tree.
    pub fn locate_in(&self, dom: &RcDom) -> Option<ContentRegion> {
        for rule in self.selectors.rules() {
            if let Some(node) = find_first(&dom.document, rule) {
                trace!(selector = rule.as_str(), "Selector matched");
                return Some(ContentRegion {
                    document: dom.document.clone(),
                    node,
                    matched_rule: Some(rule.as_str().to_string()),
                });
            }
        }

        let (_, body) = document_sections(dom);
        match body {
            Some(body) if has_content(&body) => {
                debug!("No selector matched, falling back to body");
                Some(ContentRegion {
                    document: dom.document.clone(),
                    node: body,
                    matched_rule: None,
                })
            }
            _ => {
                debug!("No selector matched and body is empty");
                None
            }
        }
    }
}

/// Locate the content region of `document` with the default selectors.
pub fn locate(document: &str) -> Option<ContentRegion> {
    ContentLocator::default().locate(document)
}

/// First element below `root` in pre-order matching `rule`.
fn find_first(root: &Handle, rule: &SelectorRule) -> Option<Handle> {
    let mut stack: Vec<Handle> = root.children.borrow().iter().rev().cloned().collect();
    while let Some(node) = stack.pop() {
        if let NodeData::Element { .. } = node.data {
            if rule.matches(&node) {
                return Some(node);
            }
            stack.extend(node.children.borrow().iter().rev().cloned());
        }
    }
    None
}
