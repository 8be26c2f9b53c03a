//! HTML serialization.
//!
//! Attributes are written in stored order. Empty attribute values are written
//! bare (`<style amp-custom>`), everything else double-quoted.

use super::{Document, Element, Node};
use crate::utils::html::{escape_attr, escape_text, is_raw_text_element, is_void_element};

pub(super) fn render_document(doc: &Document) -> String {
    let mut out = String::with_capacity(4096);
    if let Some(name) = &doc.doctype {
        if name.eq_ignore_ascii_case("html") {
            out.push_str("<!doctype html>");
        } else {
            out.push_str("<!DOCTYPE ");
            out.push_str(name);
            out.push('>');
        }
    }
    render_element(&doc.root, &mut out);
    out
}

fn render_element(elem: &Element, out: &mut String) {
    out.push('<');
    out.push_str(&elem.tag);
    for (name, value) in elem.attrs.iter() {
        out.push(' ');
        out.push_str(name);
        if !value.is_empty() {
            out.push_str("=\"");
            out.push_str(&escape_attr(value));
            out.push('"');
        }
    }
    out.push('>');

    if is_void_element(&elem.tag) {
        return;
    }

    let raw = is_raw_text_element(&elem.tag);
    for child in &elem.children {
        match child {
            Node::Element(child) => render_element(child, out),
            Node::Text(text) if raw => out.push_str(text),
            Node::Text(text) => out.push_str(&escape_text(text)),
            Node::Comment(text) => {
                out.push_str("<!--");
                out.push_str(text);
                out.push_str("-->");
            }
        }
    }

    out.push_str("</");
    out.push_str(&elem.tag);
    out.push('>');
}

impl Element {
    /// Serialize this element and its subtree.
    pub fn render(&self) -> String {
        let mut out = String::new();
        render_element(self, &mut out);
        out
    }
}
