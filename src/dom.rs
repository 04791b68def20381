//! Small helpers over `markup5ever_rcdom` nodes shared by the stages.

use std::rc::Rc;

use html5ever::serialize::{SerializeOpts, TraversalScope, serialize};
use html5ever::tendril::StrTendril;
use html5ever::{Attribute, LocalName, Namespace, QualName};
use markup5ever_rcdom::{Handle, Node, NodeData, SerializableHandle};

/// Local tag name of an element node, `None` for every other node type.
pub fn tag_name(node: &Node) -> Option<&str> {
    match node.data {
        NodeData::Element { ref name, .. } => Some(name.local.as_ref()),
        _ => None,
    }
}

/// Value of the attribute `name` on an element node.
pub fn attr(node: &Node, name: &str) -> Option<String> {
    match node.data {
        NodeData::Element { ref attrs, .. } => attrs
            .borrow()
            .iter()
            .find(|attr| attr.name.local.as_ref() == name)
            .map(|attr| attr.value.to_string()),
        _ => None,
    }
}

/// Set (or replace) an attribute on an element node.
pub fn set_attr(node: &Node, name: &str, value: &str) {
    if let NodeData::Element { ref attrs, .. } = node.data {
        let mut attrs = attrs.borrow_mut();
        let value = StrTendril::from_slice(value);
        match attrs.iter_mut().find(|attr| attr.name.local.as_ref() == name) {
            Some(existing) => existing.value = value,
            None => attrs.push(Attribute {
                name: QualName::new(None, Namespace::from(""), LocalName::from(name)),
                value,
            }),
        }
    }
}

/// First direct child element named `tag`.
pub fn child_element(node: &Handle, tag: &str) -> Option<Handle> {
    node.children
        .borrow()
        .iter()
        .find(|child| tag_name(child) == Some(tag))
        .cloned()
}

/// Re-parent `child` under `parent` after moving it between child lists.
pub fn adopt(parent: &Handle, child: &Handle) {
    child.parent.set(Some(Rc::downgrade(parent)));
}

/// Whether a node holds anything worth converting: an element child or
/// non-whitespace text anywhere below it.
pub fn has_content(node: &Handle) -> bool {
    let mut stack: Vec<Handle> = node.children.borrow().iter().cloned().collect();
    while let Some(current) = stack.pop() {
        match current.data {
            NodeData::Element { .. } => return true,
            NodeData::Text { ref contents } => {
                if contents.borrow().chars().any(|c| !c.is_whitespace()) {
                    return true;
                }
            }
            _ => {}
        }
        stack.extend(current.children.borrow().iter().cloned());
    }
    false
}

/// Concatenated text of every text node below `node`, without normalization.
pub fn text_content(node: &Handle) -> String {
    let mut output = String::new();
    let mut stack = vec![node.clone()];
    while let Some(current) = stack.pop() {
        if let NodeData::Text { ref contents } = current.data {
            output.push_str(&contents.borrow());
        }
        // Reverse so the leftmost child is popped first
        stack.extend(current.children.borrow().iter().rev().cloned());
    }
    output
}

/// Serialize `node` including its own tag.
pub fn outer_html(node: &Handle) -> String {
    serialize_with_scope(node, TraversalScope::IncludeNode)
}

/// Serialize the children of `node`.
pub fn inner_html(node: &Handle) -> String {
    serialize_with_scope(node, TraversalScope::ChildrenOnly(None))
}

fn serialize_with_scope(node: &Handle, traversal_scope: TraversalScope) -> String {
    let mut buffer = Vec::new();
    let handle = SerializableHandle::from(node.clone());
    let opts = SerializeOpts {
        traversal_scope,
        ..Default::default()
    };

    // Writing into a Vec cannot fail
    match serialize(&mut buffer, &handle, opts) {
        Ok(()) => String::from_utf8_lossy(&buffer).into_owned(),
        Err(_) => String::new(),
    }
}
