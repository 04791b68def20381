//! HTML5 parser using html5ever
//!
//! Every stage works on a tree produced here. html5ever implements the
//! WHATWG parsing algorithm, so malformed markup (unclosed tags, misnested
//! formatting, stray end tags) is recovered the way a browser would recover
//! it instead of failing.
//!
//! # Examples
//!
//! ```rust
//! use content_markdown_converter::parser::parse_html;
//!
//! // Well-formed and malformed input both produce a tree
//! let dom = parse_html("<html><body><h1>Hello</h1></body></html>");
//! let dom = parse_html("<html><body><h1>Hello");
//! ```
//!
//! # Configuration
//!
//! The parser uses default html5ever configuration:
//! - **Scripting**: scripts are never executed
//! - **Error Handling**: errors are collected on the tree and parsing continues
//! - **Tree Builder**: `RcDom`, reference-counted nodes that later stages can
//!   hand out as cheap handles
//!
//! The tree is always a full document. A fragment such as `<p>x</p>` is
//! wrapped in the implied `html`, `head` and `body` elements.

use html5ever::parse_document;
use html5ever::tendril::TendrilSink;
use markup5ever_rcdom::{Handle, RcDom};

use crate::dom::{child_element, tag_name};

/// Parse an HTML string into a DOM tree.
///
/// Never fails: empty input yields a document with empty `head` and `body`.
pub fn parse_html(html: &str) -> RcDom {
    parse_document(RcDom::default(), Default::default()).one(html)
}

/// The document's `html` element.
pub fn html_element(dom: &RcDom) -> Option<Handle> {
    dom.document
        .children
        .borrow()
        .iter()
        .find(|child| tag_name(child) == Some("html"))
        .cloned()
}

/// The document's `head` and `body` elements, in that order.
pub fn document_sections(dom: &RcDom) -> (Option<Handle>, Option<Handle>) {
    match html_element(dom) {
        Some(html) => (child_element(&html, "head"), child_element(&html, "body")),
        None => (None, None),
    }
}
