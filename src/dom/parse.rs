//! HTML parsing (html5ever -> owned tree).
//!
//! html5ever builds a reference-counted tree which is then converted into our
//! owned `Document`. Scripting is disabled in the tree builder so that
//! `<noscript>` content (the boilerplate fallback) is parsed as elements
//! rather than raw text. `<template>` contents are moved under the template
//! element itself.

use html5ever::tendril::TendrilSink;
use html5ever::tree_builder::TreeBuilderOpts;
use html5ever::{ParseOpts, parse_document};
use markup5ever_rcdom::{Handle, NodeData, RcDom};

use super::{Attrs, Document, Element, Node};

/// Parse an HTML document.
pub fn parse(html: &str) -> Document {
    let opts = ParseOpts {
        tree_builder: TreeBuilderOpts {
            scripting_enabled: false,
            ..Default::default()
        },
        ..Default::default()
    };
    let dom = parse_document(RcDom::default(), opts).one(html);

    let mut doctype = None;
    let mut root = None;
    for child in dom.document.children.borrow().iter() {
        match &child.data {
            NodeData::Doctype { name, .. } => doctype = Some(name.to_string()),
            NodeData::Element { .. } if root.is_none() => {
                if let Some(Node::Element(elem)) = convert_node(child) {
                    root = Some(*elem);
                }
            }
            _ => {}
        }
    }

    Document {
        doctype,
        // The tree builder always emits <html>; this only guards odd sinks.
        root: root.unwrap_or_else(|| Element::new("html")),
    }
}

/// Convert one rcdom node (and its subtree).
fn convert_node(handle: &Handle) -> Option<Node> {
    match &handle.data {
        NodeData::Text { contents } => Some(Node::Text(contents.borrow().to_string())),
        NodeData::Comment { contents } => Some(Node::Comment(contents.to_string())),
        NodeData::Element {
            name,
            attrs,
            template_contents,
            ..
        } => {
            let mut attr_list = Attrs::new();
            for attr in attrs.borrow().iter() {
                let local: &str = &attr.name.local;
                match &attr.name.prefix {
                    Some(prefix) => {
                        let prefixed = format!("{}:{local}", &**prefix);
                        attr_list.set(&prefixed, attr.value.to_string());
                    }
                    None => attr_list.set(local, attr.value.to_string()),
                }
            }

            let mut elem = Element::with_attrs(&name.local, attr_list);
            convert_children(handle, &mut elem);
            if let Some(contents) = template_contents.borrow().as_ref() {
                convert_children(contents, &mut elem);
            }
            Some(Node::Element(Box::new(elem)))
        }
        _ => None,
    }
}

fn convert_children(handle: &Handle, elem: &mut Element) {
    for child in handle.children.borrow().iter() {
        if let Some(node) = convert_node(child) {
            // Adjacent text nodes can appear after tree-builder fixups.
            if let (Node::Text(text), Some(Node::Text(prev))) = (&node, elem.children.last_mut()) {
                prev.push_str(text);
                continue;
            }
            elem.children.push(node);
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
