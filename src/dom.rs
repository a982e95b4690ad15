//! HTML parsing and tree manipulation using html5ever.
//!
//! One shared set of structural primitives for every pipeline stage:
//! predicate-driven search, attribute access, and node surgery on
//! [`markup5ever_rcdom`] trees. Nothing in here knows about chapters,
//! links, or output formats.

use std::rc::Rc;

use html5ever::parse_document;
use html5ever::serialize::{serialize, SerializeOpts, TraversalScope};
use html5ever::tendril::TendrilSink;
use html5ever::tree_builder::TreeBuilderOpts;
use html5ever::{namespace_url, ns, Attribute, LocalName, ParseOpts, QualName};
use markup5ever_rcdom::{Handle, Node, NodeData, RcDom, SerializableHandle};

use crate::error::Result;

/// Parse HTML content into a DOM tree.
///
/// Fragments are fine: the tree builder supplies the missing `html`/`body`
/// scaffolding, and parse errors are ignored the way browsers ignore them.
pub fn parse_html(html: &str) -> RcDom {
    let opts = ParseOpts {
        tree_builder: TreeBuilderOpts {
            drop_doctype: false,
            ..Default::default()
        },
        ..Default::default()
    };

    parse_document(RcDom::default(), opts)
        .from_utf8()
        .one(html.as_bytes())
}

/// Serialize a node and its children to an HTML string.
pub fn serialize_node(handle: &Handle) -> Result<String> {
    let mut bytes = Vec::new();
    let serializable: SerializableHandle = handle.clone().into();

    // The Document root node cannot be serialized with IncludeNode (the rcdom
    // serializer panics); emit its children instead. Element and other nodes
    // include themselves as before.
    let traversal_scope = match handle.data {
        NodeData::Document => TraversalScope::ChildrenOnly(None),
        _ => TraversalScope::IncludeNode,
    };

    let opts = SerializeOpts {
        traversal_scope,
        ..Default::default()
    };

    serialize(&mut bytes, &serializable, opts)?;
    Ok(String::from_utf8(bytes)?)
}

/// Serialize only the children of a node, concatenated in document order.
pub fn serialize_children(handle: &Handle) -> Result<String> {
    let mut out = String::new();
    for child in handle.children.borrow().iter() {
        out.push_str(&serialize_node(child)?);
    }
    Ok(out)
}

/// Find the first node matching the predicate, depth-first pre-order.
pub fn find_node(handle: &Handle, pred: &dyn Fn(&Handle) -> bool) -> Option<Handle> {
    if pred(handle) {
        return Some(handle.clone());
    }

    for child in handle.children.borrow().iter() {
        if let Some(found) = find_node(child, pred) {
            return Some(found);
        }
    }

    None
}

/// Find all nodes matching the predicate, in document order
/// (parents before children, siblings left to right).
pub fn find_all_nodes(handle: &Handle, pred: &dyn Fn(&Handle) -> bool) -> Vec<Handle> {
    let mut results = Vec::new();
    collect_nodes(handle, pred, &mut results);
    results
}

fn collect_nodes(handle: &Handle, pred: &dyn Fn(&Handle) -> bool, results: &mut Vec<Handle>) {
    if pred(handle) {
        results.push(handle.clone());
    }

    for child in handle.children.borrow().iter() {
        collect_nodes(child, pred, results);
    }
}

/// Check whether a node is an element with the given local name.
pub fn is_element(handle: &Handle, tag: &str) -> bool {
    match &handle.data {
        NodeData::Element { name, .. } => name.local.as_ref() == tag,
        _ => false,
    }
}

/// Check whether an element carries the given class, matching whole
/// whitespace-separated tokens only.
pub fn has_class(handle: &Handle, class: &str) -> bool {
    get_attr(handle, "class")
        .map(|value| value.split_whitespace().any(|c| c == class))
        .unwrap_or(false)
}

/// Get an attribute value from an element.
pub fn get_attr(handle: &Handle, attr_name: &str) -> Option<String> {
    if let NodeData::Element { ref attrs, .. } = handle.data {
        for attr in attrs.borrow().iter() {
            if attr.name.local.as_ref() == attr_name {
                return Some(attr.value.to_string());
            }
        }
    }
    None
}

/// Set an attribute on an element, updating in place if it exists
/// (attribute order is preserved) and appending it otherwise.
pub fn set_attr(handle: &Handle, attr_name: &str, value: &str) {
    if let NodeData::Element { ref attrs, .. } = handle.data {
        let mut attrs_mut = attrs.borrow_mut();

        for attr in attrs_mut.iter_mut() {
            if attr.name.local.as_ref() == attr_name {
                attr.value = value.into();
                return;
            }
        }

        attrs_mut.push(Attribute {
            name: QualName::new(None, ns!(), attr_name.into()),
            value: value.into(),
        });
    }
}

/// Get the text content of a node, ignoring markup.
pub fn get_text(handle: &Handle) -> String {
    let mut text = String::new();
    collect_text(handle, &mut text);
    text
}

fn collect_text(handle: &Handle, text: &mut String) {
    match handle.data {
        NodeData::Text { ref contents } => {
            text.push_str(&contents.borrow());
        }
        NodeData::Element { .. } => {
            for child in handle.children.borrow().iter() {
                collect_text(child, text);
            }
        }
        _ => {}
    }
}

/// Create a detached element node with the given attributes.
pub fn new_element(tag: &str, attrs: &[(&str, &str)]) -> Handle {
    Node::new(NodeData::Element {
        name: QualName::new(None, ns!(html), LocalName::from(tag)),
        attrs: std::cell::RefCell::new(
            attrs
                .iter()
                .map(|(name, value)| Attribute {
                    name: QualName::new(None, ns!(), LocalName::from(*name)),
                    value: (*value).into(),
                })
                .collect(),
        ),
        template_contents: std::cell::RefCell::new(None),
        mathml_annotation_xml_integration_point: false,
    })
}

/// Detach a node from its parent, leaving it free to re-insert elsewhere.
pub fn detach(node: &Handle) {
    if let Some(weak) = node.parent.take() {
        if let Some(parent) = weak.upgrade() {
            parent
                .children
                .borrow_mut()
                .retain(|child| !Rc::ptr_eq(child, node));
        }
    }
}

/// Insert a node as the first child of a parent, detaching it first.
pub fn insert_first(parent: &Handle, node: &Handle) {
    detach(node);
    node.parent.set(Some(Rc::downgrade(parent)));
    parent.children.borrow_mut().insert(0, node.clone());
}

/// Swap a node for a replacement at the same position in its parent.
pub fn replace_node(old: &Handle, new: &Handle) {
    let Some(parent) = old.parent.take().and_then(|weak| weak.upgrade()) else {
        return;
    };

    let mut children = parent.children.borrow_mut();
    if let Some(pos) = children.iter().position(|child| Rc::ptr_eq(child, old)) {
        new.parent.set(Some(Rc::downgrade(&parent)));
        children[pos] = new.clone();
    }
}

/// Move every child of `from` to the end of `to`, preserving order.
pub fn reparent_children(from: &Handle, to: &Handle) {
    let moved: Vec<Handle> = from.children.borrow_mut().drain(..).collect();
    let mut children = to.children.borrow_mut();
    for child in moved {
        child.parent.set(Some(Rc::downgrade(to)));
        children.push(child);
    }
}

/// The `body` element of a parsed document.
pub fn body(dom: &RcDom) -> Option<Handle> {
    find_node(&dom.document, &|n| is_element(n, "body"))
}

/// Escape text for embedding in HTML/XML markup.
pub fn escape_text(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}
