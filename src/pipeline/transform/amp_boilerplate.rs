//! Ensures the document carries the boilerplate of its own format.

use super::Transformer;
use crate::amp::{DocumentFormat, NO_BOILERPLATE_ATTR, is_boilerplate_noscript, is_boilerplate_style};
use crate::dom::{Document, Element};
use crate::error::ErrorCollection;

pub struct AmpBoilerplate;

impl Transformer for AmpBoilerplate {
    fn name(&self) -> &'static str {
        "AmpBoilerplate"
    }

    fn transform(&self, doc: &mut Document, _errors: &mut ErrorCollection) {
        if doc.root.has_attr(NO_BOILERPLATE_ATTR) {
            return;
        }
        let Some(format) = DocumentFormat::detect(&doc.root) else {
            crate::debug!("boilerplate"; "not an AMP document, skipping");
            return;
        };
        let Some(head) = doc.head_mut() else {
            return;
        };

        let own = format.boilerplate_attr();
        let is_own_style = |elem: &Element| elem.tag == "style" && elem.has_attr(own);
        head.children.retain(|node| match node.as_element() {
            Some(elem) if is_boilerplate_style(elem) => is_own_style(elem),
            Some(elem) if is_boilerplate_noscript(elem) => elem.elements().any(is_own_style),
            _ => true,
        });

        if !head.elements().any(is_own_style) {
            head.push_elem(format.boilerplate_style());
        }
        if !head.elements().any(is_boilerplate_noscript)
            && let Some(noscript) = format.boilerplate_noscript()
        {
            head.push_elem(noscript);
        }
    }
}
