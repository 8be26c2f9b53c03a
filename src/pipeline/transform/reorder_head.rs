//! Sorts `<head>` children into the order the AMP runtime expects.
//!
//! | Slot | Content                                               |
//! |------|-------------------------------------------------------|
//! | 0    | `<meta charset>`                                      |
//! | 1    | `<style amp-runtime>`                                 |
//! | 2    | other `<meta>`                                        |
//! | 3    | AMP runtime `<script>`                                |
//! | 4    | viewer integration `<script>`                         |
//! | 5    | render-delaying extensions, sorted by name            |
//! | 6    | other extensions, sorted by name, duplicates dropped  |
//! | 7    | favicon `<link>`                                      |
//! | 8    | resource hint `<link>` (preconnect, preload, ...)     |
//! | 9    | `<link rel=stylesheet>`                               |
//! | 10   | `<style amp-custom>`                                  |
//! | 11   | everything else                                       |
//! | 12   | boilerplate `<style>`, then its `<noscript>`          |
//!
//! Ties keep document order. Whitespace-only text between head children is
//! dropped, so running the pass twice gives the same output.

use rustc_hash::FxHashSet;

use super::Transformer;
use crate::amp::{
    extension_name, is_boilerplate_noscript, is_boilerplate_style, is_custom_style,
    is_render_delaying_extension, is_runtime_script, is_runtime_style, is_viewer_script,
};
use crate::dom::{Document, Element, Node};
use crate::error::ErrorCollection;

const RESOURCE_HINTS: &[&str] = &[
    "dns-prefetch",
    "preconnect",
    "prefetch",
    "preload",
    "prerender",
    "modulepreload",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Slot {
    MetaCharset,
    RuntimeStyle,
    Meta,
    RuntimeScript,
    ViewerScript,
    RenderDelayingScript,
    ExtensionScript,
    Favicon,
    ResourceHint,
    Stylesheet,
    CustomStyle,
    Other,
    BoilerplateStyle,
    BoilerplateNoscript,
}

impl Slot {
    fn of(node: &Node) -> Self {
        match node.as_element() {
            Some(elem) => Self::of_element(elem),
            None => Self::Other,
        }
    }

    fn of_element(elem: &Element) -> Self {
        match elem.tag.as_str() {
            "meta" if elem.has_attr("charset") => Self::MetaCharset,
            "meta" => Self::Meta,
            "style" if is_runtime_style(elem) => Self::RuntimeStyle,
            "style" if is_custom_style(elem) => Self::CustomStyle,
            "style" if is_boilerplate_style(elem) => Self::BoilerplateStyle,
            "noscript" if is_boilerplate_noscript(elem) => Self::BoilerplateNoscript,
            "script" if is_runtime_script(elem) => Self::RuntimeScript,
            "script" if is_viewer_script(elem) => Self::ViewerScript,
            "script" => match extension_name(elem) {
                Some(name) if is_render_delaying_extension(name) => Self::RenderDelayingScript,
                Some(_) => Self::ExtensionScript,
                None => Self::Other,
            },
            "link" => Self::of_link(elem),
            _ => Self::Other,
        }
    }

    fn of_link(elem: &Element) -> Self {
        let rel = elem.get_attr("rel").unwrap_or_default().to_ascii_lowercase();
        let tokens: Vec<&str> = rel.split_ascii_whitespace().collect();
        if tokens.iter().any(|token| token.contains("icon")) {
            Self::Favicon
        } else if tokens.iter().any(|token| RESOURCE_HINTS.contains(token)) {
            Self::ResourceHint
        } else if tokens.contains(&"stylesheet") {
            Self::Stylesheet
        } else {
            Self::Other
        }
    }

    fn sorts_by_extension(self) -> bool {
        matches!(self, Self::RenderDelayingScript | Self::ExtensionScript)
    }
}

/// Reorders `<head>`; never reports findings.
pub struct ReorderHead;

impl Transformer for ReorderHead {
    fn name(&self) -> &'static str {
        "ReorderHead"
    }

    fn transform(&self, doc: &mut Document, _errors: &mut ErrorCollection) {
        let Some(head) = doc.head_mut() else {
            return;
        };

        let mut entries: Vec<(Slot, String, Node)> = std::mem::take(&mut head.children)
            .into_iter()
            .filter(|node| !node.is_blank_text())
            .map(|node| {
                let slot = Slot::of(&node);
                let key = match node.as_element() {
                    Some(elem) if slot.sorts_by_extension() => {
                        extension_name(elem).unwrap_or_default().to_string()
                    }
                    _ => String::new(),
                };
                (slot, key, node)
            })
            .collect();

        // Stable, so equal keys keep document order.
        entries.sort_by(|a, b| (a.0, &a.1).cmp(&(b.0, &b.1)));

        let mut seen_extensions = FxHashSet::default();
        head.children = entries
            .into_iter()
            .filter(|(slot, key, _)| {
                if slot.sorts_by_extension() && !seen_extensions.insert(key.clone()) {
                    crate::debug!("reorder"; "dropping duplicate extension script {}", key);
                    return false;
                }
                true
            })
            .map(|(_, _, node)| node)
            .collect();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reorder(html: &str) -> String {
        let mut doc = Document::parse(html);
        ReorderHead.transform(&mut doc, &mut ErrorCollection::new());
        doc.head().map(Element::render).unwrap_or_default()
    }

    fn head_tags(html: &str) -> Vec<String> {
        let mut doc = Document::parse(html);
        ReorderHead.transform(&mut doc, &mut ErrorCollection::new());
        doc.head()
            .map(|head| {
                head.elements()
                    .map(|elem| {
                        let marker = elem
                            .get_attr("custom-element")
                            .or_else(|| elem.get_attr("rel"))
                            .or_else(|| elem.attrs.iter().next().map(|(k, _)| k))
                            .unwrap_or_default();
                        format!("{}:{}", elem.tag, marker)
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    const MESSY_HEAD: &str = r#"<!doctype html><html ⚡><head>
        <style amp-boilerplate>body{visibility:hidden}</style>
        <noscript><style amp-boilerplate>body{animation:none}</style></noscript>
        <link rel=stylesheet href=a.css>
        <title>Hello</title>
        <script async custom-element="amp-video" src="https://cdn.ampproject.org/v0/amp-video-0.1.js"></script>
        <style amp-custom>h1{color:red}</style>
        <link rel="Shortcut Icon" href=favicon.ico>
        <script async custom-element="amp-story" src="https://cdn.ampproject.org/v0/amp-story-1.0.js"></script>
        <meta name=viewport content="width=device-width">
        <script async custom-element="amp-bind" src="https://cdn.ampproject.org/v0/amp-bind-0.1.js"></script>
        <link rel=preconnect href=https://fonts.gstatic.com>
        <script async src="https://cdn.ampproject.org/v0/amp-viewer-integration-0.1.js"></script>
        <script async src="https://cdn.ampproject.org/v0.js"></script>
        <script async custom-element="amp-dynamic-css-classes" src="https://cdn.ampproject.org/v0/amp-dynamic-css-classes-0.1.js"></script>
        <style amp-runtime i-amphtml-version="012345">html{}</style>
        <script async custom-element="amp-video" src="https://cdn.ampproject.org/v0/amp-video-0.1.js"></script>
        <meta charset=utf-8>
        </head><body></body></html>"#;

    #[test]
    fn test_bucket_order() {
        assert_eq!(
            head_tags(MESSY_HEAD),
            [
                "meta:charset",
                "style:amp-runtime",
                "meta:name",
                "script:async",
                "script:async",
                "script:amp-dynamic-css-classes",
                "script:amp-story",
                "script:amp-bind",
                "script:amp-video",
                "link:Shortcut Icon",
                "link:preconnect",
                "link:stylesheet",
                "style:amp-custom",
                "title:",
                "style:amp-boilerplate",
                "noscript:",
            ]
        );
    }

    #[test]
    fn test_runtime_before_viewer() {
        let html = reorder(MESSY_HEAD);
        let runtime = html.find("v0.js").unwrap();
        let viewer = html.find("amp-viewer-integration").unwrap();
        assert!(runtime < viewer);
    }

    #[test]
    fn test_duplicate_extensions_removed() {
        let html = reorder(MESSY_HEAD);
        assert_eq!(html.matches("custom-element=\"amp-video\"").count(), 1);
    }

    #[test]
    fn test_idempotent() {
        let mut doc = Document::parse(MESSY_HEAD);
        ReorderHead.transform(&mut doc, &mut ErrorCollection::new());
        let once = doc.render();
        ReorderHead.transform(&mut doc, &mut ErrorCollection::new());
        assert_eq!(doc.render(), once);

        let mut reparsed = Document::parse(&once);
        ReorderHead.transform(&mut reparsed, &mut ErrorCollection::new());
        assert_eq!(reparsed.render(), once);
    }

    #[test]
    fn test_others_keep_document_order() {
        let tags = head_tags(
            "<html><head><title>t</title><base href=/><meta charset=utf-8><script>var a</script></head></html>",
        );
        assert_eq!(tags, ["meta:charset", "title:", "base:href", "script:"]);
    }
}
