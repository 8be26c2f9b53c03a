//! Size classification for image-like elements.

use super::{Dimension, Layout, LayoutAttrs};
use crate::dom::Element;

/// How many ancestor levels are searched for a sized box.
pub const MAX_PARENT_DEPTH: usize = 3;

/// Returned by [`ImageDimensions::dimensions_from_parent`] when no sized
/// ancestor exists within [`MAX_PARENT_DEPTH`].
pub const NO_PARENT_DIMENSIONS: (f64, f64) = (-1.0, -1.0);

/// A view over one image element and its ancestor chain.
///
/// Attribute values that do not parse are treated as absent, so a malformed
/// `width` never makes an image look sized.
pub struct ImageDimensions<'a> {
    element: &'a Element,
    ancestors: &'a [&'a Element],
    width: Option<Dimension>,
    height: Option<Dimension>,
}

impl<'a> ImageDimensions<'a> {
    /// `ancestors` runs from the root down to the direct parent, as produced
    /// by `Document::walk`.
    pub fn new(element: &'a Element, ancestors: &'a [&'a Element]) -> Self {
        Self {
            element,
            ancestors,
            width: lenient(element, "width"),
            height: lenient(element, "height"),
        }
    }

    pub fn has_width(&self) -> bool {
        self.width.is_some()
    }

    pub fn has_height(&self) -> bool {
        self.height.is_some()
    }

    pub fn has_layout(&self) -> bool {
        self.element.trimmed_attr("layout").is_some()
    }

    pub fn width(&self) -> Option<Dimension> {
        self.width
    }

    pub fn height(&self) -> Option<Dimension> {
        self.height
    }

    /// Explicit layout if valid, otherwise the inferred one.
    pub fn layout(&self) -> Layout {
        let explicit = self
            .element
            .trimmed_attr("layout")
            .and_then(|value| value.parse().ok());
        LayoutAttrs {
            layout: explicit,
            width: self.width,
            height: self.height,
            has_sizes: self.element.trimmed_attr("sizes").is_some(),
            has_heights: self.element.trimmed_attr("heights").is_some(),
        }
        .calculate()
    }

    /// Pixel size of the nearest ancestor (up to [`MAX_PARENT_DEPTH`] levels)
    /// with both width and height, or [`NO_PARENT_DIMENSIONS`].
    pub fn dimensions_from_parent(&self) -> (f64, f64) {
        self.ancestors
            .iter()
            .rev()
            .take(MAX_PARENT_DEPTH)
            .find_map(|ancestor| {
                let width = lenient(ancestor, "width")?.pixels()?;
                let height = lenient(ancestor, "height")?.pixels()?;
                Some((width, height))
            })
            .unwrap_or(NO_PARENT_DIMENSIONS)
    }

    /// Whether the image is too small to be worth a preload.
    pub fn is_tiny(&self, threshold: f64) -> bool {
        let pixels = |dim: Option<Dimension>| dim.and_then(|d| d.pixels()).unwrap_or(0.0);
        match self.layout() {
            Layout::Responsive | Layout::Intrinsic => false,
            Layout::Fill => {
                let (width, height) = self.dimensions_from_parent();
                if (width, height) == NO_PARENT_DIMENSIONS {
                    return false;
                }
                width < threshold || height < threshold
            }
            Layout::FixedHeight => pixels(self.height) < threshold,
            _ => pixels(self.width) < threshold || pixels(self.height) < threshold,
        }
    }
}

fn lenient(elem: &Element, name: &str) -> Option<Dimension> {
    Dimension::parse(elem.get_attr(name)).ok().flatten()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::Attrs;

    fn img(pairs: &[(&str, &str)]) -> Element {
        Element::with_attrs("amp-img", pairs.iter().copied().collect::<Attrs>())
    }

    #[test]
    fn test_raw_values() {
        let elem = img(&[("width", "auto"), ("height", "300")]);
        let dims = ImageDimensions::new(&elem, &[]);
        assert!(dims.has_width() && dims.has_height());
        assert!(!dims.has_layout());
        assert_eq!(dims.width(), Some(Dimension::Auto));
        assert_eq!(dims.height().and_then(|h| h.pixels()), Some(300.0));
        assert_eq!(dims.layout(), Layout::FixedHeight);
    }

    #[test]
    fn test_fixed_size_threshold() {
        let large = img(&[("width", "500"), ("height", "400")]);
        assert!(!ImageDimensions::new(&large, &[]).is_tiny(150.0));
        let narrow = img(&[("width", "100"), ("height", "400")]);
        assert!(ImageDimensions::new(&narrow, &[]).is_tiny(150.0));
        let no_size = img(&[]);
        assert!(ImageDimensions::new(&no_size, &[]).is_tiny(150.0));
    }

    #[test]
    fn test_responsive_never_tiny() {
        let elem = img(&[("layout", "responsive"), ("width", "1"), ("height", "1")]);
        assert!(!ImageDimensions::new(&elem, &[]).is_tiny(150.0));
    }

    #[test]
    fn test_fixed_height_checks_height_only() {
        let elem = img(&[("layout", "fixed-height"), ("height", "200")]);
        assert!(!ImageDimensions::new(&elem, &[]).is_tiny(150.0));
        let low = img(&[("layout", "fixed-height"), ("width", "auto"), ("height", "20")]);
        assert!(ImageDimensions::new(&low, &[]).is_tiny(150.0));
    }

    #[test]
    fn test_fill_uses_parent_box() {
        let big = Element::with_attrs("div", Attrs::from([("width", "800"), ("height", "600")]));
        let plain = Element::new("section");
        let elem = img(&[("layout", "fill")]);

        let ancestors = [&big, &plain];
        let dims = ImageDimensions::new(&elem, &ancestors);
        assert_eq!(dims.dimensions_from_parent(), (800.0, 600.0));
        assert!(!dims.is_tiny(150.0));

        let small = Element::with_attrs("div", Attrs::from([("width", "50"), ("height", "50")]));
        let ancestors = [&small];
        assert!(ImageDimensions::new(&elem, &ancestors).is_tiny(150.0));
    }

    #[test]
    fn test_parent_search_depth() {
        let sized = Element::with_attrs("div", Attrs::from([("width", "800"), ("height", "600")]));
        let a = Element::new("div");
        let b = Element::new("div");
        let c = Element::new("div");
        let elem = img(&[("layout", "fill")]);

        let ancestors = [&sized, &a, &b, &c];
        let dims = ImageDimensions::new(&elem, &ancestors);
        assert_eq!(dims.dimensions_from_parent(), NO_PARENT_DIMENSIONS);
        // unknown box is not classified as tiny
        assert!(!dims.is_tiny(150.0));

        let ancestors = [&sized, &a, &b];
        assert_eq!(
            ImageDimensions::new(&elem, &ancestors).dimensions_from_parent(),
            (800.0, 600.0)
        );
    }
}
