//! Noise removal for HTML fragments
//!
//! The sanitizer parses a fragment, walks the `head` and `body` sections of
//! the resulting tree and applies a [`SanitizationPolicy`] to every node:
//!
//! - Elements the policy removes are dropped together with their content
//! - Elements the policy unwraps are replaced by their children
//! - Kept elements lose the attributes the policy strips; anchors can be
//!   marked `rel="nofollow"`
//! - Comments are dropped when `strip_comments` is set, processing
//!   instructions always
//!
//! The result is the serialized content of `head` followed by that of
//! `body`. Document wrappers are never part of the output, so sanitizing the
//! output again yields the same string.
//!
//! # Examples
//!
//! ```rust
//! use content_markdown_converter::sanitizer::Sanitizer;
//!
//! let sanitizer = Sanitizer::default();
//! let cleaned = sanitizer
//!     .sanitize(r#"<p style="color: red">Hello<script>alert(1)</script></p>"#)
//!     .unwrap();
//! assert_eq!(cleaned, "<p>Hello</p>");
//! ```

use std::collections::VecDeque;

use html5ever::tendril::StrTendril;
use markup5ever_rcdom::{Handle, NodeData};
use tracing::debug;

use crate::dom::{adopt, attr, inner_html, set_attr, tag_name};
use crate::error::SanitizationError;
use crate::parser::{document_sections, parse_html};
use crate::policy::{SanitizationPolicy, SanitizeAction};

/// Counts of what a sanitization pass changed, reported through `tracing`
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
struct SanitizeStats {
    removed_elements: usize,
    unwrapped_elements: usize,
    removed_comments: usize,
    stripped_attributes: usize,
    nofollow_links: usize,
}

/// Applies a [`SanitizationPolicy`] to HTML fragments.
#[derive(Debug, Clone, Default)]
pub struct Sanitizer {
    policy: SanitizationPolicy,
}

impl Sanitizer {
    pub fn new(policy: SanitizationPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &SanitizationPolicy {
        &self.policy
    }

    /// Clean `fragment` according to the policy.
    ///
    /// Blank input, and input whose every node is removed, yields `Ok("")`.
    ///
    /// # Errors
    ///
    /// - [`SanitizationError::Unparseable`] if the fragment is not blank but
    ///   produces no nodes inside the document (a lone comment or doctype)
    /// - [`SanitizationError::TooDeep`] if elements nest deeper than
    ///   `max_depth`
    pub fn sanitize(&self, fragment: &str) -> Result<String, SanitizationError> {
        if fragment.trim().is_empty() {
            return Ok(String::new());
        }

        let dom = parse_html(fragment);
        let (head, body) = document_sections(&dom);
        let sections: Vec<Handle> = [head, body].into_iter().flatten().collect();

        if sections
            .iter()
            .all(|section| section.children.borrow().is_empty())
        {
            return Err(SanitizationError::Unparseable(format!(
                "{} bytes of input produced no document content",
                fragment.len()
            )));
        }

        for section in &sections {
            self.check_depth(section)?;
        }

        let mut stats = SanitizeStats::default();
        for section in &sections {
            self.clean_subtree(section, &mut stats);
        }
        let cleaned = serialize_sections(&sections);

        // Unwrapping can leave nesting the parser never builds (an `li`
        // directly inside an `li`). One reparse settles the markup on the
        // tree any HTML parser rebuilds from it.
        let output = if cleaned.trim().is_empty() {
            String::new()
        } else {
            let reparsed = parse_html(&cleaned);
            let (head, body) = document_sections(&reparsed);
            let sections: Vec<Handle> = [head, body].into_iter().flatten().collect();
            serialize_sections(&sections)
        };

        debug!(
            input_len = fragment.len(),
            output_len = output.len(),
            removed_elements = stats.removed_elements,
            unwrapped_elements = stats.unwrapped_elements,
            removed_comments = stats.removed_comments,
            stripped_attributes = stats.stripped_attributes,
            nofollow_links = stats.nofollow_links,
            "Sanitized fragment"
        );

        Ok(output.trim().to_string())
    }

    /// Reject trees nesting deeper than the policy allows. Children of the
    /// section sit at depth 1.
    fn check_depth(&self, section: &Handle) -> Result<(), SanitizationError> {
        let mut stack: Vec<(Handle, usize)> = section
            .children
            .borrow()
            .iter()
            .map(|child| (child.clone(), 1))
            .collect();

        while let Some((node, depth)) = stack.pop() {
            if let NodeData::Element { .. } = node.data {
                self.policy.validate_depth(depth)?;
                stack.extend(
                    node.children
                        .borrow()
                        .iter()
                        .map(|child| (child.clone(), depth + 1)),
                );
            }
        }
        Ok(())
    }

    /// Rebuild the child list of every kept node below `root`.
    ///
    /// Unwrapped children are spliced into the pending queue of their parent
    /// so they are judged in the same position the wrapper held.
    fn clean_subtree(&self, root: &Handle, stats: &mut SanitizeStats) {
        let mut parents = vec![root.clone()];

        while let Some(parent) = parents.pop() {
            let mut pending: VecDeque<Handle> = parent.children.take().into();
            let mut kept = Vec::with_capacity(pending.len());

            while let Some(child) = pending.pop_front() {
                match child.data {
                    NodeData::Element { .. } => {
                        let tag = tag_name(&child).unwrap_or_default().to_ascii_lowercase();
                        match self.policy.check_element(&tag) {
                            SanitizeAction::Keep => {
                                self.clean_attributes(&child, &tag, stats);
                                parents.push(child.clone());
                                kept.push(child);
                            }
                            SanitizeAction::Remove => stats.removed_elements += 1,
                            SanitizeAction::Unwrap => {
                                stats.unwrapped_elements += 1;
                                let grandchildren = child.children.take();
                                for grandchild in grandchildren.into_iter().rev() {
                                    pending.push_front(grandchild);
                                }
                            }
                        }
                    }
                    NodeData::Comment { .. } if self.policy.strip_comments => {
                        stats.removed_comments += 1;
                    }
                    NodeData::ProcessingInstruction { .. } => {}
                    _ => kept.push(child),
                }
            }

            for child in &kept {
                adopt(&parent, child);
            }
            *parent.children.borrow_mut() = kept;
        }
    }

    fn clean_attributes(&self, node: &Handle, tag: &str, stats: &mut SanitizeStats) {
        if let NodeData::Element { ref attrs, .. } = node.data {
            let mut attrs = attrs.borrow_mut();
            let before = attrs.len();
            attrs.retain(|attribute| {
                !self.policy.should_strip_attribute(
                    tag,
                    &attribute.name.local.to_ascii_lowercase(),
                    &attribute.value,
                )
            });
            stats.stripped_attributes += before - attrs.len();
        }

        if self.policy.mark_links_nofollow && tag == "a" && attr(node, "href").is_some() {
            let rel = attr(node, "rel").unwrap_or_default();
            let has_nofollow = rel
                .split_whitespace()
                .any(|token| token.eq_ignore_ascii_case("nofollow"));
            if !has_nofollow {
                let rel = match rel.trim() {
                    "" => "nofollow".to_string(),
                    existing => format!("{existing} nofollow"),
                };
                set_attr(node, "rel", &rel);
                stats.nofollow_links += 1;
            }
        }
    }
}

/// Serialize the content of each section, in order.
fn serialize_sections(sections: &[Handle]) -> String {
    sections
        .iter()
        .map(|section| {
            restore_leading_newlines(section);
            inner_html(section)
        })
        .collect()
}

/// The parser drops one newline right after `<pre>`, `<textarea>` and
/// `<listing>` and the serializer does not write it back. Prepend it to
/// text that starts with a newline so a reparse yields the same text.
fn restore_leading_newlines(root: &Handle) {
    let mut stack = vec![root.clone()];
    while let Some(node) = stack.pop() {
        let children = node.children.borrow();
        if matches!(tag_name(&node), Some("pre" | "textarea" | "listing"))
            && let Some(first) = children.first()
            && let NodeData::Text { ref contents } = first.data
        {
            let mut text = contents.borrow_mut();
            if text.starts_with('\n') {
                *text = StrTendril::from(format!("\n{}", &**text));
            }
        }
        stack.extend(children.iter().cloned());
    }
}

/// Clean `fragment` with the given policy.
pub fn sanitize(fragment: &str, policy: &SanitizationPolicy) -> Result<String, SanitizationError> {
    Sanitizer::new(policy.clone()).sanitize(fragment)
}
