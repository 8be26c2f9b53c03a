//! Owned, mutable HTML tree.
//!
//! The optimizer works on a plain tree of owned elements instead of the
//! reference-counted tree produced by the parser. Each transformer receives
//! `&mut Document` for the duration of its pass and keeps nothing afterwards.
//!
//! # Modules
//!
//! - `parse`: html5ever -> `Document`
//! - `render`: `Document` -> HTML string (attribute order preserved)
//!
//! # Traversal
//!
//! `Document::walk` visits elements in document order together with their
//! ancestor chain and child-index path. Paths can be used afterwards to get
//! mutable access to a visited element (`Element::descendant_mut`), which is
//! how transformers split "decide" and "mutate" phases.

mod parse;
mod render;

use smallvec::SmallVec;

pub use parse::parse;

// =============================================================================
// Attributes
// =============================================================================

/// Ordered attribute list. Setting an existing attribute keeps its position.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Attrs(SmallVec<[(String, String); 4]>);

impl Attrs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn has(&self, name: &str) -> bool {
        self.0.iter().any(|(key, _)| key == name)
    }

    /// Set an attribute, replacing the value in place if it already exists.
    pub fn set(&mut self, name: &str, value: impl Into<String>) {
        let value = value.into();
        match self.0.iter_mut().find(|(key, _)| key == name) {
            Some(slot) => slot.1 = value,
            None => self.0.push((name.to_string(), value)),
        }
    }

    pub fn remove(&mut self, name: &str) -> Option<String> {
        let index = self.0.iter().position(|(key, _)| key == name)?;
        Some(self.0.remove(index).1)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl<const N: usize> From<[(&str, &str); N]> for Attrs {
    fn from(pairs: [(&str, &str); N]) -> Self {
        pairs.into_iter().collect()
    }
}

impl<'a> FromIterator<(&'a str, &'a str)> for Attrs {
    fn from_iter<I: IntoIterator<Item = (&'a str, &'a str)>>(iter: I) -> Self {
        let mut attrs = Self::new();
        for (name, value) in iter {
            attrs.set(name, value);
        }
        attrs
    }
}

// =============================================================================
// Nodes
// =============================================================================

/// A child of an element.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Element(Box<Element>),
    Text(String),
    Comment(String),
}

impl Node {
    pub fn as_element(&self) -> Option<&Element> {
        match self {
            Node::Element(elem) => Some(&**elem),
            _ => None,
        }
    }

    pub fn as_element_mut(&mut self) -> Option<&mut Element> {
        match self {
            Node::Element(elem) => Some(&mut **elem),
            _ => None,
        }
    }

    /// Whitespace-only text nodes carry no meaning between head children.
    pub fn is_blank_text(&self) -> bool {
        matches!(self, Node::Text(text) if text.trim().is_empty())
    }
}

impl From<Element> for Node {
    fn from(elem: Element) -> Self {
        Node::Element(Box::new(elem))
    }
}

/// An HTML element with ordered attributes and owned children.
#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    /// Lowercase tag name.
    pub tag: String,
    pub attrs: Attrs,
    pub children: Vec<Node>,
}

impl Element {
    pub fn new(tag: &str) -> Self {
        Self::with_attrs(tag, Attrs::new())
    }

    pub fn with_attrs(tag: &str, attrs: Attrs) -> Self {
        Self {
            tag: tag.to_ascii_lowercase(),
            attrs,
            children: Vec::new(),
        }
    }

    // -------------------------------------------------------------------------
    // Attributes
    // -------------------------------------------------------------------------

    pub fn get_attr(&self, name: &str) -> Option<&str> {
        self.attrs.get(name)
    }

    pub fn has_attr(&self, name: &str) -> bool {
        self.attrs.has(name)
    }

    pub fn set_attr(&mut self, name: &str, value: impl Into<String>) {
        self.attrs.set(name, value);
    }

    pub fn remove_attr(&mut self, name: &str) -> Option<String> {
        self.attrs.remove(name)
    }

    /// Attribute value with surrounding whitespace removed, `None` if absent
    /// or blank.
    pub fn trimmed_attr(&self, name: &str) -> Option<&str> {
        self.get_attr(name)
            .map(str::trim)
            .filter(|value| !value.is_empty())
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.get_attr("class")
            .is_some_and(|classes| classes.split_ascii_whitespace().any(|c| c == class))
    }

    /// Append a class unless it is already present.
    pub fn add_class(&mut self, class: &str) {
        match self.get_attr("class").map(str::trim) {
            Some(existing) if !existing.is_empty() => {
                if !self.has_class(class) {
                    let joined = format!("{existing} {class}");
                    self.set_attr("class", joined);
                }
            }
            _ => self.set_attr("class", class),
        }
    }

    // -------------------------------------------------------------------------
    // Children
    // -------------------------------------------------------------------------

    pub fn push_elem(&mut self, elem: Element) {
        self.children.push(elem.into());
    }

    pub fn prepend_elem(&mut self, elem: Element) {
        self.children.insert(0, elem.into());
    }

    pub fn push_text(&mut self, text: impl Into<String>) {
        self.children.push(Node::Text(text.into()));
    }

    /// Direct element children.
    pub fn elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(Node::as_element)
    }

    pub fn elements_mut(&mut self) -> impl Iterator<Item = &mut Element> {
        self.children.iter_mut().filter_map(Node::as_element_mut)
    }

    pub fn child(&self, tag: &str) -> Option<&Element> {
        self.elements().find(|elem| elem.tag == tag)
    }

    pub fn child_mut(&mut self, tag: &str) -> Option<&mut Element> {
        self.elements_mut().find(|elem| elem.tag == tag)
    }

    /// Concatenated text of all descendant text nodes.
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    fn collect_text(&self, out: &mut String) {
        for child in &self.children {
            match child {
                Node::Text(text) => out.push_str(text),
                Node::Element(elem) => elem.collect_text(out),
                Node::Comment(_) => {}
            }
        }
    }

    /// Resolve a child-index path produced by [`Document::walk`].
    pub fn descendant_mut(&mut self, path: &[usize]) -> Option<&mut Element> {
        let mut current = self;
        for &index in path {
            current = current.children.get_mut(index)?.as_element_mut()?;
        }
        Some(current)
    }
}

// =============================================================================
// Traversal
// =============================================================================

/// What a visitor wants to happen after seeing an element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Walk {
    Continue,
    /// Do not descend into this element's children.
    SkipChildren,
    Stop,
}

/// One visited element.
pub struct Visit<'a, 'b> {
    pub element: &'a Element,
    /// Ancestors from the root down to the direct parent.
    pub ancestors: &'b [&'a Element],
    /// Child indices from the root to this element.
    pub path: &'b [usize],
}

fn walk_element<'a, F>(
    elem: &'a Element,
    ancestors: &mut Vec<&'a Element>,
    path: &mut Vec<usize>,
    visitor: &mut F,
) -> bool
where
    F: FnMut(&Visit<'a, '_>) -> Walk,
{
    let action = visitor(&Visit {
        element: elem,
        ancestors: ancestors.as_slice(),
        path: path.as_slice(),
    });
    match action {
        Walk::Stop => return false,
        Walk::SkipChildren => return true,
        Walk::Continue => {}
    }

    ancestors.push(elem);
    for (index, child) in elem.children.iter().enumerate() {
        if let Node::Element(child) = child {
            path.push(index);
            let keep_going = walk_element(child, ancestors, path, visitor);
            path.pop();
            if !keep_going {
                ancestors.pop();
                return false;
            }
        }
    }
    ancestors.pop();
    true
}

// =============================================================================
// Document
// =============================================================================

/// A parsed HTML document: optional doctype plus the `<html>` root.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    /// Doctype name (`html` for `<!doctype html>`).
    pub doctype: Option<String>,
    pub root: Element,
}

impl Document {
    /// Parse an HTML string. Never fails: the HTML tree builder recovers
    /// from any input and always produces `<html>`, `<head>` and `<body>`.
    pub fn parse(html: &str) -> Self {
        parse(html)
    }

    pub fn head(&self) -> Option<&Element> {
        self.root.child("head")
    }

    pub fn head_mut(&mut self) -> Option<&mut Element> {
        self.root.child_mut("head")
    }

    pub fn body(&self) -> Option<&Element> {
        self.root.child("body")
    }

    /// Visit every element in document order, starting with the root.
    pub fn walk<'a, F>(&'a self, mut visitor: F)
    where
        F: FnMut(&Visit<'a, '_>) -> Walk,
    {
        let mut ancestors = Vec::new();
        let mut path = Vec::new();
        walk_element(&self.root, &mut ancestors, &mut path, &mut visitor);
    }

    /// Serialize the document back to HTML.
    pub fn render(&self) -> String {
        render::render_document(self)
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Document {
        Document::parse(
            "<!doctype html><html><head><title>t</title></head>\
             <body><div id=a><p class='x y'>one</p><template><p>two</p></template></div></body></html>",
        )
    }

    #[test]
    fn test_attrs_keep_position_on_update() {
        let mut attrs = Attrs::from([("a", "1"), ("b", "2")]);
        attrs.set("a", "3");
        attrs.set("c", "4");
        let names: Vec<_> = attrs.iter().map(|(k, _)| k).collect();
        assert_eq!(names, ["a", "b", "c"]);
        assert_eq!(attrs.get("a"), Some("3"));
        assert_eq!(attrs.remove("b").as_deref(), Some("2"));
        assert_eq!(attrs.iter().count(), 2);
    }

    #[test]
    fn test_classes() {
        let mut elem = Element::new("div");
        elem.add_class("a");
        elem.add_class("b");
        elem.add_class("a");
        assert_eq!(elem.get_attr("class"), Some("a b"));
        assert!(elem.has_class("b"));
        assert!(!elem.has_class("c"));
    }

    #[test]
    fn test_head_and_body() {
        let doc = sample();
        assert!(doc.head().is_some());
        assert_eq!(doc.body().map(|b| b.text_content()).as_deref(), Some("onetwo"));
    }

    #[test]
    fn test_walk_order_and_paths() {
        let mut doc = sample();
        let mut tags = Vec::new();
        let mut p_path = None;
        doc.walk(|visit| {
            tags.push(visit.element.tag.clone());
            if visit.element.tag == "p" && p_path.is_none() {
                p_path = Some(visit.path.to_vec());
                assert_eq!(visit.ancestors.last().map(|e| e.tag.as_str()), Some("div"));
            }
            Walk::Continue
        });
        assert_eq!(tags[..3], ["html", "head", "title"]);
        let path = p_path.expect("p visited");
        assert_eq!(doc.root.descendant_mut(&path).map(|e| e.tag.as_str()), Some("p"));
    }

    #[test]
    fn test_walk_skip_children() {
        let doc = sample();
        let mut inside_template = 0;
        doc.walk(|visit| {
            if visit.ancestors.iter().any(|elem| elem.tag == "template") {
                inside_template += 1;
            }
            if visit.element.tag == "template" {
                Walk::SkipChildren
            } else {
                Walk::Continue
            }
        });
        assert_eq!(inside_template, 0);
    }
}
