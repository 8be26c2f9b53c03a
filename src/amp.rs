//! AMP vocabulary shared by the transformers.
//!
//! Attribute names, document formats with their boilerplate markup, and the
//! predicates used to classify `<head>` children.

use crate::dom::{Attrs, Element};

// =============================================================================
// Attributes
// =============================================================================

/// Set on the root once layout has been computed on the server.
pub const LAYOUT_ATTR: &str = "i-amphtml-layout";
/// Set on the root once the boilerplate has been removed.
pub const NO_BOILERPLATE_ATTR: &str = "i-amphtml-no-boilerplate";
pub const TRANSFORMED_ATTR: &str = "transformed";
pub const HERO_ATTR: &str = "data-hero";
/// Marks an `amp-img` that already carries a server-rendered `<img>`.
pub const SSR_IMG_ATTR: &str = "i-amphtml-ssr";
pub const RUNTIME_STYLE_ATTR: &str = "amp-runtime";
pub const RUNTIME_VERSION_ATTR: &str = "i-amphtml-version";
pub const CUSTOM_STYLE_ATTR: &str = "amp-custom";

pub const SIZER_TAG: &str = "i-amphtml-sizer";
pub const ID_PLACEHOLDER: &str = "__ID__";

// =============================================================================
// Extensions
// =============================================================================

/// Extensions that delay rendering until they have run.
pub const RENDER_DELAYING_EXTENSIONS: &[&str] =
    &["amp-dynamic-css-classes", "amp-experiment", "amp-story"];

const CDN_PREFIX: &str = "https://cdn.ampproject.org/";
const VIEWER_PREFIX: &str = "https://cdn.ampproject.org/v0/amp-viewer-integration-";

/// Extension name of a `<script custom-element|custom-template>`.
pub fn extension_name(elem: &Element) -> Option<&str> {
    if elem.tag != "script" {
        return None;
    }
    elem.trimmed_attr("custom-element")
        .or_else(|| elem.trimmed_attr("custom-template"))
}

pub fn is_render_delaying_extension(name: &str) -> bool {
    RENDER_DELAYING_EXTENSIONS.contains(&name)
}

/// The main runtime, e.g. `https://cdn.ampproject.org/v0.js`,
/// `.../lts/v0.mjs` or `.../amp4ads-v0.js`.
pub fn is_runtime_script(elem: &Element) -> bool {
    if elem.tag != "script" || extension_name(elem).is_some() {
        return false;
    }
    let Some(src) = elem.get_attr("src") else {
        return false;
    };
    let Some(path) = src.strip_prefix(CDN_PREFIX) else {
        return false;
    };
    let path = path.strip_prefix("lts/").unwrap_or(path);
    matches!(path, "v0.js" | "v0.mjs" | "amp4ads-v0.js" | "amp4ads-v0.mjs")
}

pub fn is_viewer_script(elem: &Element) -> bool {
    elem.tag == "script"
        && extension_name(elem).is_none()
        && elem.get_attr("src").is_some_and(|src| src.starts_with(VIEWER_PREFIX))
}

// =============================================================================
// Document formats
// =============================================================================

const AMP_BOILERPLATE_CSS: &str = "body{-webkit-animation:-amp-start 8s steps(1,end) 0s 1 normal both;-moz-animation:-amp-start 8s steps(1,end) 0s 1 normal both;-ms-animation:-amp-start 8s steps(1,end) 0s 1 normal both;animation:-amp-start 8s steps(1,end) 0s 1 normal both}@-webkit-keyframes -amp-start{from{visibility:hidden}to{visibility:visible}}@-moz-keyframes -amp-start{from{visibility:hidden}to{visibility:visible}}@-ms-keyframes -amp-start{from{visibility:hidden}to{visibility:visible}}@-o-keyframes -amp-start{from{visibility:hidden}to{visibility:visible}}@keyframes -amp-start{from{visibility:hidden}to{visibility:visible}}";
const AMP_NOSCRIPT_BOILERPLATE_CSS: &str =
    "body{-webkit-animation:none;-moz-animation:none;-ms-animation:none;animation:none}";
const HIDDEN_BODY_CSS: &str = "body{visibility:hidden}";

/// AMP document flavor, detected from the root element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Amp,
    Amp4Ads,
    Amp4Email,
}

impl DocumentFormat {
    pub const ALL: [Self; 3] = [Self::Amp, Self::Amp4Ads, Self::Amp4Email];

    /// Detect the format from the `<html>` marker attribute.
    pub fn detect(root: &Element) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|format| format.markers().iter().any(|marker| root.has_attr(marker)))
    }

    /// ASCII and emoji spellings of the root marker.
    pub fn markers(self) -> [&'static str; 2] {
        match self {
            Self::Amp => ["amp", "⚡"],
            Self::Amp4Ads => ["amp4ads", "⚡4ads"],
            Self::Amp4Email => ["amp4email", "⚡4email"],
        }
    }

    /// Attribute carried by this format's boilerplate `<style>`.
    pub fn boilerplate_attr(self) -> &'static str {
        match self {
            Self::Amp => "amp-boilerplate",
            Self::Amp4Ads => "amp4ads-boilerplate",
            Self::Amp4Email => "amp4email-boilerplate",
        }
    }

    /// The boilerplate `<style>` element.
    pub fn boilerplate_style(self) -> Element {
        let css = match self {
            Self::Amp => AMP_BOILERPLATE_CSS,
            Self::Amp4Ads | Self::Amp4Email => HIDDEN_BODY_CSS,
        };
        let mut style = Element::with_attrs("style", Attrs::from([(self.boilerplate_attr(), "")]));
        style.push_text(css);
        style
    }

    /// The `<noscript>` fallback; only plain AMP has one.
    pub fn boilerplate_noscript(self) -> Option<Element> {
        if self != Self::Amp {
            return None;
        }
        let mut style = Element::with_attrs("style", Attrs::from([(self.boilerplate_attr(), "")]));
        style.push_text(AMP_NOSCRIPT_BOILERPLATE_CSS);
        let mut noscript = Element::new("noscript");
        noscript.push_elem(style);
        Some(noscript)
    }
}

/// `<style>` carrying the boilerplate attribute of any format.
pub fn is_boilerplate_style(elem: &Element) -> bool {
    elem.tag == "style"
        && DocumentFormat::ALL
            .iter()
            .any(|format| elem.has_attr(format.boilerplate_attr()))
}

/// `<noscript>` wrapping a boilerplate `<style>`.
pub fn is_boilerplate_noscript(elem: &Element) -> bool {
    elem.tag == "noscript" && elem.elements().any(is_boilerplate_style)
}

pub fn is_runtime_style(elem: &Element) -> bool {
    elem.tag == "style" && elem.has_attr(RUNTIME_STYLE_ATTR)
}

pub fn is_custom_style(elem: &Element) -> bool {
    elem.tag == "style" && elem.has_attr(CUSTOM_STYLE_ATTR)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn script(attrs: &[(&str, &str)]) -> Element {
        Element::with_attrs("script", attrs.iter().copied().collect())
    }

    #[test]
    fn test_detect_format() {
        let html = |attr: &str| Element::with_attrs("html", Attrs::from([(attr, "")]));
        assert_eq!(DocumentFormat::detect(&html("⚡")), Some(DocumentFormat::Amp));
        assert_eq!(DocumentFormat::detect(&html("amp")), Some(DocumentFormat::Amp));
        assert_eq!(DocumentFormat::detect(&html("⚡4ads")), Some(DocumentFormat::Amp4Ads));
        assert_eq!(DocumentFormat::detect(&html("amp4email")), Some(DocumentFormat::Amp4Email));
        assert_eq!(DocumentFormat::detect(&html("lang")), None);
    }

    #[test]
    fn test_script_classification() {
        let runtime = script(&[("async", ""), ("src", "https://cdn.ampproject.org/v0.js")]);
        let lts = script(&[("src", "https://cdn.ampproject.org/lts/v0.mjs"), ("type", "module")]);
        let viewer = script(&[("src", "https://cdn.ampproject.org/v0/amp-viewer-integration-0.1.js")]);
        let ext = script(&[
            ("custom-element", "amp-bind"),
            ("src", "https://cdn.ampproject.org/v0/amp-bind-0.1.js"),
        ]);
        assert!(is_runtime_script(&runtime));
        assert!(is_runtime_script(&lts));
        assert!(!is_runtime_script(&viewer));
        assert!(is_viewer_script(&viewer));
        assert!(!is_runtime_script(&ext));
        assert_eq!(extension_name(&ext), Some("amp-bind"));
        assert!(is_render_delaying_extension("amp-story"));
        assert!(!is_render_delaying_extension("amp-bind"));
    }

    #[test]
    fn test_boilerplate_markup() {
        let style = DocumentFormat::Amp.boilerplate_style();
        assert!(is_boilerplate_style(&style));
        let noscript = DocumentFormat::Amp.boilerplate_noscript().expect("noscript");
        assert!(is_boilerplate_noscript(&noscript));
        assert!(DocumentFormat::Amp4Email.boilerplate_noscript().is_none());
        assert_eq!(
            DocumentFormat::Amp4Ads.boilerplate_style().render(),
            "<style amp4ads-boilerplate>body{visibility:hidden}</style>"
        );
    }
}
