//! AMP layout model.
//!
//! - `Layout`: the layout keywords understood by the AMP runtime
//! - `Dimension` / `CssLength`: parsed `width`/`height` attribute values
//! - `LayoutAttrs`: the runtime's layout inference, so the server can
//!   produce the same classes and sizes the client would
//! - `dimensions`: `ImageDimensions`, the hero-image size classifier

mod dimensions;

pub use dimensions::{ImageDimensions, MAX_PARENT_DEPTH, NO_PARENT_DIMENSIONS};

use regex::Regex;
use std::{fmt, str::FromStr, sync::LazyLock};

use crate::dom::Element;

// =============================================================================
// Layout
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Layout {
    Nodisplay,
    Fixed,
    FixedHeight,
    Responsive,
    Container,
    Fill,
    FlexItem,
    Fluid,
    Intrinsic,
}

impl Layout {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Nodisplay => "nodisplay",
            Self::Fixed => "fixed",
            Self::FixedHeight => "fixed-height",
            Self::Responsive => "responsive",
            Self::Container => "container",
            Self::Fill => "fill",
            Self::FlexItem => "flex-item",
            Self::Fluid => "fluid",
            Self::Intrinsic => "intrinsic",
        }
    }

    /// Layouts whose box size is known before content loads.
    pub fn is_size_defined(self) -> bool {
        matches!(
            self,
            Self::Fixed
                | Self::FixedHeight
                | Self::Responsive
                | Self::Fill
                | Self::FlexItem
                | Self::Fluid
                | Self::Intrinsic
        )
    }

    /// Layouts whose size comes from an aspect ratio and need a sizer.
    pub fn uses_sizer(self) -> bool {
        matches!(self, Self::Responsive | Self::Intrinsic)
    }
}

impl fmt::Display for Layout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Layout {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "nodisplay" => Ok(Self::Nodisplay),
            "fixed" => Ok(Self::Fixed),
            "fixed-height" => Ok(Self::FixedHeight),
            "responsive" => Ok(Self::Responsive),
            "container" => Ok(Self::Container),
            "fill" => Ok(Self::Fill),
            "flex-item" => Ok(Self::FlexItem),
            "fluid" => Ok(Self::Fluid),
            "intrinsic" => Ok(Self::Intrinsic),
            other => Err(format!("unknown layout `{other}`")),
        }
    }
}

// =============================================================================
// Lengths
// =============================================================================

static LENGTH_RE: LazyLock<Regex> = LazyLock::new(|| {
    // ASCII classes only: regex is built without its unicode features.
    Regex::new(r"^([0-9]+(?:\.[0-9]+)?|\.[0-9]+)(px|em|rem|vh|vw|vmin|vmax)?$")
        .expect("valid regex")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Unit {
    Px,
    Em,
    Rem,
    Vh,
    Vw,
    Vmin,
    Vmax,
}

impl Unit {
    fn parse(s: &str) -> Self {
        match s {
            "em" => Self::Em,
            "rem" => Self::Rem,
            "vh" => Self::Vh,
            "vw" => Self::Vw,
            "vmin" => Self::Vmin,
            "vmax" => Self::Vmax,
            _ => Self::Px,
        }
    }

    fn as_str(self) -> &'static str {
        match self {
            Self::Px => "px",
            Self::Em => "em",
            Self::Rem => "rem",
            Self::Vh => "vh",
            Self::Vw => "vw",
            Self::Vmin => "vmin",
            Self::Vmax => "vmax",
        }
    }
}

/// A number with a CSS unit; unit-less values are pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CssLength {
    pub numeral: f64,
    pub unit: Unit,
}

impl fmt::Display for CssLength {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.numeral, self.unit.as_str())
    }
}

/// Value of a `width` or `height` attribute.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Dimension {
    Length(CssLength),
    Auto,
    Fluid,
}

impl Dimension {
    /// Parse an attribute value. `Ok(None)` when absent or blank.
    pub fn parse(value: Option<&str>) -> Result<Option<Self>, String> {
        let Some(value) = value.map(str::trim).filter(|v| !v.is_empty()) else {
            return Ok(None);
        };
        match value {
            "auto" => return Ok(Some(Self::Auto)),
            "fluid" => return Ok(Some(Self::Fluid)),
            _ => {}
        }
        let caps = LENGTH_RE
            .captures(value)
            .ok_or_else(|| format!("invalid length `{value}`"))?;
        let numeral = caps[1]
            .parse::<f64>()
            .map_err(|_| format!("invalid length `{value}`"))?;
        let unit = caps.get(2).map_or(Unit::Px, |m| Unit::parse(m.as_str()));
        Ok(Some(Self::Length(CssLength { numeral, unit })))
    }

    pub fn length(&self) -> Option<CssLength> {
        match self {
            Self::Length(length) => Some(*length),
            _ => None,
        }
    }

    /// Numeric value in pixels; `None` for other units, `auto` and `fluid`.
    pub fn pixels(&self) -> Option<f64> {
        self.length()
            .filter(|length| length.unit == Unit::Px)
            .map(|length| length.numeral)
    }
}

// =============================================================================
// Layout calculation
// =============================================================================

/// Layout-relevant attributes of one element, parsed.
#[derive(Debug, Clone, PartialEq)]
pub struct LayoutAttrs {
    pub layout: Option<Layout>,
    pub width: Option<Dimension>,
    pub height: Option<Dimension>,
    pub has_sizes: bool,
    pub has_heights: bool,
}

impl LayoutAttrs {
    pub fn from_element(elem: &Element) -> Result<Self, String> {
        let layout = elem
            .trimmed_attr("layout")
            .map(Layout::from_str)
            .transpose()?;
        Ok(Self {
            layout,
            width: Dimension::parse(elem.get_attr("width"))?,
            height: Dimension::parse(elem.get_attr("height"))?,
            has_sizes: elem.trimmed_attr("sizes").is_some(),
            has_heights: elem.trimmed_attr("heights").is_some(),
        })
    }

    /// Effective layout, following the runtime's inference rules.
    pub fn calculate(&self) -> Layout {
        if let Some(layout) = self.layout {
            return layout;
        }
        match (self.width, self.height) {
            (None, None) => Layout::Container,
            (_, Some(Dimension::Fluid)) => Layout::Fluid,
            (None | Some(Dimension::Auto), Some(_)) => Layout::FixedHeight,
            (Some(_), Some(_)) if self.has_sizes || self.has_heights => Layout::Responsive,
            _ => Layout::Fixed,
        }
    }

    /// Check that the attributes are sufficient to render `layout` on the
    /// server.
    pub fn validate(&self, layout: Layout) -> Result<(), String> {
        let width = self.width.and_then(|w| w.length());
        let height = self.height.and_then(|h| h.length());
        match layout {
            Layout::Fixed if width.is_none() || height.is_none() => {
                Err("fixed layout requires width and height".into())
            }
            Layout::FixedHeight if height.is_none() => {
                Err("fixed-height layout requires a height".into())
            }
            Layout::FixedHeight if matches!(self.width, Some(Dimension::Length(_))) => {
                Err("fixed-height layout requires width to be absent or auto".into())
            }
            Layout::Responsive | Layout::Intrinsic => match (width, height) {
                (Some(w), Some(h)) if w.unit == h.unit && w.numeral > 0.0 => Ok(()),
                (Some(_), Some(_)) => {
                    Err(format!("{layout} layout requires width and height in the same unit"))
                }
                _ => Err(format!("{layout} layout requires width and height")),
            },
            _ => Ok(()),
        }
    }
}

/// `height / width * 100`, the sizer's `padding-top` percentage.
pub fn aspect_ratio_padding(width: CssLength, height: CssLength) -> String {
    format!("{:.4}%", height.numeral / width.numeral * 100.0)
}

// =============================================================================
// Tests
// =============================================================================
