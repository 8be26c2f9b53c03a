//! Server-side layout.
//!
//! Applies the AMP layout algorithm to every AMP element so the page can
//! render before the runtime has loaded, then removes the boilerplate that
//! would otherwise hide the body.
//!
//! # Phases
//!
//! 1. **Scan**: walk the document once, collect a [`Patch`] per element and
//!    the CSS rules for `media`/`sizes`/`heights`, and note the first
//!    condition that requires the boilerplate to stay.
//! 2. **Apply**: patches are applied in reverse document order, so inserting
//!    a sizer never shifts the path of an element that is still pending.
//! 3. **Finish**: append the rules to `<style amp-custom>`, then remove the
//!    boilerplate or record why it stays.
//!
//! `<template>` subtrees are never touched.

use rustc_hash::FxHashSet;

use super::Transformer;
use crate::amp::{
    CUSTOM_STYLE_ATTR, ID_PLACEHOLDER, LAYOUT_ATTR, NO_BOILERPLATE_ATTR, SIZER_TAG,
    extension_name, is_boilerplate_noscript, is_boilerplate_style, is_custom_style,
};
use crate::css::{CssRule, CssRules};
use crate::dom::{Attrs, Document, Element, Node, Walk};
use crate::error::{BoilerplateBlocker, Error, ErrorCollection};
use crate::layout::{Layout, LayoutAttrs, aspect_ratio_padding};

/// Attributes that make an AMP element subject to layout.
const LAYOUT_ATTRS: &[&str] = &["layout", "width", "height", "sizes", "heights", "media"];

pub struct ServerSideRendering;

// =============================================================================
// Patches
// =============================================================================

/// Changes computed for one element during the scan.
#[derive(Debug)]
struct Patch {
    path: Vec<usize>,
    layout: Layout,
    style: Option<String>,
    sizer: Option<Element>,
    id: Option<String>,
    remove_heights: bool,
}

impl Patch {
    fn apply(self, elem: &mut Element) {
        elem.add_class(&format!("i-amphtml-layout-{}", self.layout));
        if self.layout.is_size_defined() {
            elem.add_class("i-amphtml-layout-size-defined");
        }
        if let Some(style) = self.style {
            let merged = match elem.trimmed_attr("style") {
                Some(existing) => format!("{style}{existing}"),
                None => style,
            };
            elem.set_attr("style", merged);
        }
        elem.set_attr(LAYOUT_ATTR, self.layout.as_str());
        if let Some(id) = self.id {
            elem.set_attr("id", id);
        }
        if self.remove_heights {
            elem.remove_attr("heights");
        }
        if let Some(sizer) = self.sizer {
            elem.prepend_elem(sizer);
        }
    }
}

/// Hands out `i-amp-N` ids that do not collide with the document's own.
struct IdAllocator {
    taken: FxHashSet<String>,
    next: usize,
}

impl IdAllocator {
    fn new(doc: &Document) -> Self {
        let mut taken = FxHashSet::default();
        doc.walk(|visit| {
            if let Some(id) = visit.element.trimmed_attr("id") {
                taken.insert(id.to_string());
            }
            Walk::Continue
        });
        Self { taken, next: 0 }
    }

    fn allocate(&mut self) -> String {
        loop {
            let id = format!("i-amp-{}", self.next);
            self.next += 1;
            if self.taken.insert(id.clone()) {
                return id;
            }
        }
    }
}

// =============================================================================
// Scan
// =============================================================================

#[derive(Default)]
struct Scan {
    patches: Vec<Patch>,
    rules: CssRules,
    blocker: Option<BoilerplateBlocker>,
}

impl Scan {
    fn block(&mut self, blocker: BoilerplateBlocker) {
        if self.blocker.is_none() {
            crate::debug!("ssr"; "boilerplate stays: {}", blocker);
            self.blocker = Some(blocker);
        }
    }

    /// Record conditions that need the runtime before first paint.
    fn check_blocker(&mut self, elem: &Element) {
        if let Some(name) = extension_name(elem) {
            match name {
                "amp-audio" => self.block(BoilerplateBlocker::AmpAudio),
                "amp-story" | "amp-dynamic-css-classes" => {
                    self.block(BoilerplateBlocker::RenderDelayingExtension(name.to_string()))
                }
                _ => {}
            }
            return;
        }
        match elem.tag.as_str() {
            "amp-audio" => self.block(BoilerplateBlocker::AmpAudio),
            "amp-story" | "amp-dynamic-css-classes" => {
                self.block(BoilerplateBlocker::RenderDelayingExtension(elem.tag.clone()))
            }
            "amp-experiment" if has_experiment_config(elem) => {
                self.block(BoilerplateBlocker::AmpExperiment)
            }
            _ => {}
        }
    }
}

fn is_layout_candidate(elem: &Element) -> bool {
    elem.tag.starts_with("amp-") && LAYOUT_ATTRS.iter().any(|name| elem.has_attr(name))
}

/// An `amp-experiment` is configured when its JSON child is anything other
/// than an empty object. Unparsable JSON counts as configured.
fn has_experiment_config(elem: &Element) -> bool {
    let Some(script) = elem
        .elements()
        .find(|child| child.tag == "script" && child.get_attr("type") == Some("application/json"))
    else {
        return false;
    };
    let json = script.text_content();
    if json.trim().is_empty() {
        return false;
    }
    match serde_json::from_str::<serde_json::Value>(&json) {
        Ok(serde_json::Value::Object(map)) => !map.is_empty(),
        _ => true,
    }
}

/// Compute the patch and scoped CSS rules for one element.
fn plan(
    elem: &Element,
    path: &[usize],
    ids: &mut IdAllocator,
) -> Result<(Patch, CssRules), String> {
    let attrs = LayoutAttrs::from_element(elem)?;
    let layout = attrs.calculate();
    attrs.validate(layout)?;

    let width = attrs.width.and_then(|w| w.length());
    let height = attrs.height.and_then(|h| h.length());
    let style = match (layout, width, height) {
        (Layout::Fixed, Some(w), Some(h)) => Some(format!("width:{w};height:{h};")),
        (Layout::FixedHeight, _, Some(h)) => Some(format!("height:{h};")),
        (Layout::Nodisplay, _, _) => Some("display:none;".to_string()),
        (Layout::FlexItem, w, h) => {
            let mut style = String::new();
            if let Some(w) = w {
                style.push_str(&format!("width:{w};"));
            }
            if let Some(h) = h {
                style.push_str(&format!("height:{h};"));
            }
            (!style.is_empty()).then_some(style)
        }
        _ => None,
    };

    let mut rules = CssRules::new();
    let selector = format!("#{ID_PLACEHOLDER}");

    if let Some(media) = elem.trimmed_attr("media") {
        rules.add(CssRule::with_media_query(&negate_media(media), &selector, "display:none"));
    }
    if let Some(sizes) = elem.trimmed_attr("sizes") {
        rules.extend(media_rules(sizes, &selector, "width")?);
    }
    let heights = match elem.trimmed_attr("heights") {
        Some(heights) if layout == Layout::Responsive => {
            let sizer_selector = format!("{selector}>{SIZER_TAG}");
            rules.extend(media_rules(heights, &sizer_selector, "padding-top")?);
            true
        }
        _ => false,
    };

    let sizer = match (layout.uses_sizer(), width, height) {
        (true, Some(w), Some(h)) => {
            let style = if heights {
                "display:block".to_string()
            } else {
                format!("display:block;padding-top:{}", aspect_ratio_padding(w, h))
            };
            Some(Element::with_attrs(SIZER_TAG, Attrs::from([("style", style.as_str())])))
        }
        _ => None,
    };

    let (id, rules) = if rules.is_empty() {
        (None, rules)
    } else {
        match elem.trimmed_attr("id") {
            Some(existing) => (None, rules.apply_id(&css_escape(existing))),
            None => {
                let id = ids.allocate();
                let scoped = rules.apply_id(&id);
                (Some(id), scoped)
            }
        }
    };

    let patch = Patch {
        path: path.to_vec(),
        layout,
        style,
        sizer,
        id,
        remove_heights: heights,
    };
    Ok((patch, rules))
}

/// `media` shows the element when the query matches, so the rule hides it
/// when the query does not.
fn negate_media(media: &str) -> String {
    let media = media.trim();
    match media.get(..4) {
        Some(prefix) if prefix.eq_ignore_ascii_case("not ") => media[4..].trim().to_string(),
        _ => format!("not all and {media}"),
    }
}

/// Rules for a `sizes`/`heights` list such as
/// `(min-width: 320px) 320px, 100vw`.
///
/// The final entry is the unconditional default. Conditional rules are
/// emitted after it in reverse, so the first matching entry wins the cascade.
fn media_rules(list: &str, selector: &str, property: &str) -> Result<Vec<CssRule>, String> {
    let mut entries: Vec<(Option<&str>, &str)> = split_top_level(list)
        .into_iter()
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(split_entry)
        .collect();

    let Some((None, default)) = entries.pop() else {
        return Err(format!("`{list}` has no default value"));
    };

    let mut rules = vec![CssRule::new(selector, &format!("{property}:{default}"))];
    for (media, value) in entries.into_iter().rev() {
        let declaration = format!("{property}:{value}");
        match media {
            Some(media) => rules.push(CssRule::with_media_query(media, selector, &declaration)),
            None => return Err(format!("`{list}` has a default value before the last entry")),
        }
    }
    Ok(rules)
}

/// Split on commas outside parentheses, so `min(50vw, 300px)` stays whole.
fn split_top_level(list: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    for (index, ch) in list.char_indices() {
        match ch {
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                parts.push(&list[start..index]);
                start = index + 1;
            }
            _ => {}
        }
    }
    parts.push(&list[start..]);
    parts
}

/// Split one entry into its media condition and value.
///
/// A value ending in `)` is a function such as `calc(100vw - 32px)`; it runs
/// back to its matching `(` and the function name before it. Otherwise the
/// value is the last whitespace-separated token.
fn split_entry(entry: &str) -> (Option<&str>, &str) {
    let value_start = if entry.ends_with(')') {
        let mut depth = 0usize;
        let mut open = 0;
        for (index, ch) in entry.char_indices().rev() {
            match ch {
                ')' => depth += 1,
                '(' => {
                    depth = depth.saturating_sub(1);
                    if depth == 0 {
                        open = index;
                        break;
                    }
                }
                _ => {}
            }
        }
        end_of_last(&entry[..open], |ch| !(ch.is_ascii_alphanumeric() || ch == '-'))
    } else {
        end_of_last(entry, char::is_whitespace)
    };

    let media = entry[..value_start].trim();
    let value = entry[value_start..].trim();
    ((!media.is_empty()).then_some(media), value)
}

/// Byte offset just past the last char matching `pred`, or 0.
fn end_of_last(text: &str, pred: impl Fn(char) -> bool) -> usize {
    text.char_indices()
        .rev()
        .find(|&(_, ch)| pred(ch))
        .map_or(0, |(index, ch)| index + ch.len_utf8())
}

/// Escape an id for use in a CSS selector.
fn css_escape(id: &str) -> String {
    if id == "-" {
        return "\\-".to_string();
    }
    let leading_dash = id.starts_with('-');
    let mut out = String::with_capacity(id.len());
    for (index, ch) in id.chars().enumerate() {
        // an identifier cannot start with a digit, nor with `-` and a digit
        let leading_digit = ch.is_ascii_digit() && (index == 0 || (index == 1 && leading_dash));
        if leading_digit {
            out.push_str(&format!("\\{:x} ", ch as u32));
        } else if ch.is_ascii_alphanumeric() || ch == '-' || ch == '_' || !ch.is_ascii() {
            out.push(ch);
        } else {
            out.push('\\');
            out.push(ch);
        }
    }
    out
}

// =============================================================================
// Transformer
// =============================================================================

impl Transformer for ServerSideRendering {
    fn name(&self) -> &'static str {
        "ServerSideRendering"
    }

    fn transform(&self, doc: &mut Document, errors: &mut ErrorCollection) {
        if doc.root.has_attr(LAYOUT_ATTR) {
            crate::debug!("ssr"; "document already laid out");
            return;
        }

        let mut ids = IdAllocator::new(doc);
        let mut scan = Scan::default();
        doc.walk(|visit| {
            let elem = visit.element;
            if elem.tag == "template" {
                return Walk::SkipChildren;
            }
            scan.check_blocker(elem);
            if !is_layout_candidate(elem) {
                return Walk::Continue;
            }
            match plan(elem, visit.path, &mut ids) {
                Ok((patch, rules)) => {
                    scan.patches.push(patch);
                    scan.rules.extend(rules.iter().cloned());
                }
                Err(reason) => {
                    errors.add(Error::CannotPerformServerSideRendering {
                        tag: elem.tag.clone(),
                        reason,
                    });
                    scan.block(BoilerplateBlocker::UnsupportedLayout(elem.tag.clone()));
                }
            }
            Walk::Continue
        });

        let Scan {
            patches,
            rules,
            blocker,
        } = scan;
        crate::debug!("ssr"; "laid out {} elements", patches.len());
        for patch in patches.into_iter().rev() {
            if let Some(elem) = doc.root.descendant_mut(&patch.path) {
                patch.apply(elem);
            }
        }

        if !rules.is_empty() {
            append_custom_css(doc, &rules.css());
        }

        doc.root.set_attr(LAYOUT_ATTR, "");
        match blocker {
            Some(blocker) => errors.add(Error::CannotRemoveBoilerplate(blocker)),
            None => {
                if let Some(head) = doc.head_mut() {
                    head.children.retain(|node| {
                        !node
                            .as_element()
                            .is_some_and(|e| is_boilerplate_style(e) || is_boilerplate_noscript(e))
                    });
                }
                doc.root.set_attr(NO_BOILERPLATE_ATTR, "");
            }
        }
    }
}

fn append_custom_css(doc: &mut Document, css: &str) {
    let Some(head) = doc.head_mut() else {
        return;
    };
    let existing = head
        .children
        .iter()
        .position(|node| node.as_element().is_some_and(is_custom_style));
    match existing.and_then(|index| head.children[index].as_element_mut()) {
        Some(style) => {
            let merged = style.text_content() + css;
            style.children = vec![Node::Text(merged)];
        }
        None => {
            let mut style = Element::with_attrs("style", Attrs::from([(CUSTOM_STYLE_ATTR, "")]));
            style.push_text(css);
            head.push_elem(style);
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
