//! Hero image preloading.
//!
//! Hero images are the few images most likely to be the largest visual above
//! the fold. For each one the pass
//!
//! - marks the element with `data-hero`,
//! - adds a server-rendered `<img>` child so the browser can start decoding
//!   before the runtime loads,
//! - adds `<link rel=preload as=image data-hero>` to `<head>`.
//!
//! Author-marked images win. When fewer than `max` are marked, the first image
//! that is neither tiny nor responsive-by-`srcset` is picked automatically.

use rustc_hash::FxHashSet;

use super::{Transformer, config_count};
use crate::amp::{HERO_ATTR, SSR_IMG_ATTR};
use crate::config::{ConfigError, Configuration, keys};
use crate::dom::{Attrs, Document, Element, Walk};
use crate::error::{Error, ErrorCollection};
use crate::layout::{ImageDimensions, Layout};

/// Attributes copied from `<amp-img>` to the rendered `<img>`.
const MIRRORED_ATTRS: &[&str] = &[
    "alt",
    "attribution",
    "object-fit",
    "object-position",
    "referrerpolicy",
    "sizes",
    "src",
    "srcset",
    "title",
];

const IMG_CLASSES: &str = "i-amphtml-fill-content i-amphtml-replaced-content";

pub struct PreloadHeroImage {
    max: usize,
    tiny_threshold: f64,
}

/// One `<amp-img>` found while scanning.
#[derive(Debug)]
struct Candidate {
    path: Vec<usize>,
    explicit: bool,
    tiny: bool,
    src: Option<String>,
    srcset: Option<String>,
    media: Option<String>,
}

impl PreloadHeroImage {
    pub fn new(max: usize, tiny_threshold: usize) -> Self {
        Self {
            max,
            tiny_threshold: tiny_threshold as f64,
        }
    }

    pub fn from_config(config: &Configuration) -> Result<Self, ConfigError> {
        Ok(Self::new(
            config_count(config, keys::HERO_IMAGE_MAX)?,
            config_count(config, keys::HERO_IMAGE_TINY_THRESHOLD)?,
        ))
    }

    fn scan(&self, doc: &Document) -> Vec<Candidate> {
        let mut candidates = Vec::new();
        doc.walk(|visit| {
            let elem = visit.element;
            match elem.tag.as_str() {
                "template" | "noscript" => return Walk::SkipChildren,
                "amp-img" => {}
                _ => return Walk::Continue,
            }
            let dims = ImageDimensions::new(elem, visit.ancestors);
            if dims.layout() == Layout::Nodisplay {
                return Walk::SkipChildren;
            }
            candidates.push(Candidate {
                path: visit.path.to_vec(),
                explicit: elem.has_attr(HERO_ATTR),
                tiny: dims.is_tiny(self.tiny_threshold),
                src: elem.trimmed_attr("src").map(str::to_string),
                srcset: elem.trimmed_attr("srcset").map(str::to_string),
                media: elem.trimmed_attr("media").map(str::to_string),
            });
            Walk::SkipChildren
        });
        candidates
    }

    /// Pick heroes in document order.
    fn select<'a>(
        &self,
        candidates: &'a [Candidate],
        errors: &mut ErrorCollection,
    ) -> Vec<&'a Candidate> {
        let explicit: Vec<&Candidate> = candidates.iter().filter(|c| c.explicit).collect();
        if explicit.len() > self.max {
            errors.add(Error::TooManyHeroImages {
                limit: self.max,
                found: explicit.len(),
            });
        }

        let mut selected: Vec<&Candidate> = explicit.into_iter().take(self.max).collect();
        if selected.len() < self.max
            && let Some(auto) = candidates
                .iter()
                .find(|c| !c.explicit && !c.tiny && c.srcset.is_none() && c.src.is_some())
        {
            crate::debug!("hero"; "auto-selected {}", auto.src.as_deref().unwrap_or_default());
            selected.push(auto);
        }
        selected.sort_by(|a, b| a.path.cmp(&b.path));
        selected
    }
}

impl Transformer for PreloadHeroImage {
    fn name(&self) -> &'static str {
        "PreloadHeroImage"
    }

    fn transform(&self, doc: &mut Document, errors: &mut ErrorCollection) {
        if self.max == 0 {
            return;
        }
        let candidates = self.scan(doc);
        let heroes = self.select(&candidates, errors);

        let mut preloads = Vec::new();
        for hero in heroes {
            if let Some(elem) = doc.root.descendant_mut(&hero.path) {
                mark_hero(elem);
            }
            match (&hero.src, &hero.srcset) {
                (Some(src), Some(_)) => errors.add(Error::CannotPreloadImage {
                    element: "amp-img".to_string(),
                    src: src.clone(),
                }),
                (Some(src), None) => preloads.push(preload_link(src, hero.media.as_deref())),
                (None, _) => {}
            }
        }

        let Some(head) = doc.head_mut() else {
            return;
        };
        let existing: FxHashSet<String> = head
            .elements()
            .filter(|elem| elem.tag == "link" && elem.get_attr("rel") == Some("preload"))
            .filter_map(|elem| elem.get_attr("href").map(str::to_string))
            .collect();
        let mut position = 0;
        for link in preloads {
            if link.get_attr("href").is_some_and(|href| existing.contains(href)) {
                continue;
            }
            head.children.insert(position, link.into());
            position += 1;
        }
    }
}

/// Mark an `<amp-img>` as hero and give it a rendered `<img>` child.
fn mark_hero(elem: &mut Element) {
    elem.set_attr(HERO_ATTR, "");
    if elem.has_attr(SSR_IMG_ATTR) || elem.child("img").is_some() {
        return;
    }

    let mut img = Element::with_attrs(
        "img",
        Attrs::from([("class", IMG_CLASSES), ("decoding", "async")]),
    );
    for (name, value) in elem.attrs.iter() {
        if MIRRORED_ATTRS.contains(&name) {
            img.set_attr(name, value);
        }
    }
    elem.push_elem(img);
    elem.set_attr(SSR_IMG_ATTR, "");
}

fn preload_link(src: &str, media: Option<&str>) -> Element {
    let mut link = Element::with_attrs(
        "link",
        Attrs::from([("rel", "preload"), ("href", src), ("as", "image"), (HERO_ATTR, "")]),
    );
    if let Some(media) = media {
        link.set_attr("media", media);
    }
    link
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn run(html: &str) -> (Document, ErrorCollection) {
        let mut doc = Document::parse(html);
        let mut errors = ErrorCollection::new();
        PreloadHeroImage::new(2, 150).transform(&mut doc, &mut errors);
        (doc, errors)
    }

    fn page(body: &str) -> String {
        format!("<!doctype html><html ⚡><head><meta charset=utf-8></head><body>{body}</body></html>")
    }

    fn preload_hrefs(doc: &Document) -> Vec<String> {
        doc.head()
            .map(|head| {
                head.elements()
                    .filter(|elem| elem.get_attr("rel") == Some("preload"))
                    .filter_map(|elem| elem.get_attr("href").map(str::to_string))
                    .collect()
            })
            .unwrap_or_default()
    }

    #[test]
    fn test_auto_selects_first_large_image() {
        let (doc, errors) = run(&page(
            "<amp-img width=500 height=400 src=a.png></amp-img>\
             <amp-img width=500 height=400 src=b.png></amp-img>",
        ));
        assert!(errors.is_empty());
        assert_eq!(preload_hrefs(&doc), ["a.png"]);

        let body = doc.body().map(Element::render).unwrap_or_default();
        assert_eq!(
            body,
            "<body><amp-img width=\"500\" height=\"400\" src=\"a.png\" data-hero i-amphtml-ssr>\
             <img class=\"i-amphtml-fill-content i-amphtml-replaced-content\" decoding=\"async\" src=\"a.png\">\
             </amp-img><amp-img width=\"500\" height=\"400\" src=\"b.png\"></amp-img></body>"
        );
        let head = doc.head().map(Element::render).unwrap_or_default();
        assert!(head.starts_with("<head><link rel=\"preload\" href=\"a.png\" as=\"image\" data-hero>"));
    }

    #[test]
    fn test_tiny_and_srcset_images_not_auto_selected() {
        let (doc, _) = run(&page(
            "<amp-img width=32 height=32 src=icon.png></amp-img>\
             <amp-img width=500 height=400 src=r.png srcset=\"r.png 1x, r2.png 2x\"></amp-img>\
             <amp-img layout=responsive width=4 height=3 src=c.png></amp-img>",
        ));
        assert_eq!(preload_hrefs(&doc), ["c.png"]);
    }

    #[test]
    fn test_explicit_heroes_take_priority() {
        let (doc, errors) = run(&page(
            "<amp-img width=500 height=400 src=auto.png></amp-img>\
             <amp-img data-hero width=20 height=20 src=x.png></amp-img>\
             <amp-img data-hero width=20 height=20 src=y.png></amp-img>",
        ));
        assert!(errors.is_empty());
        assert_eq!(preload_hrefs(&doc), ["x.png", "y.png"]);
    }

    #[test]
    fn test_too_many_heroes() {
        let images: String = (1..=6)
            .map(|i| format!("<amp-img data-hero width=500 height=400 src={i}.png></amp-img>"))
            .collect();
        let (doc, errors) = run(&page(&images));
        assert_eq!(errors.count_of(ErrorKind::TooManyHeroImages), 1);
        assert_eq!(preload_hrefs(&doc), ["1.png", "2.png"]);
        let body = doc.body().map(Element::render).unwrap_or_default();
        assert_eq!(body.matches("<img ").count(), 2);
    }

    #[test]
    fn test_explicit_srcset_hero_cannot_be_preloaded() {
        let (doc, errors) = run(&page(
            "<amp-img data-hero width=500 height=400 src=a.png srcset=\"a.png 1x, b.png 2x\"></amp-img>",
        ));
        assert_eq!(errors.count_of(ErrorKind::CannotPreloadImage), 1);
        assert!(preload_hrefs(&doc).is_empty());
        let body = doc.body().map(Element::render).unwrap_or_default();
        assert!(body.starts_with("<body><amp-img data-hero width"));
        assert!(body.contains("srcset=\"a.png 1x, b.png 2x\" i-amphtml-ssr><img"));
    }

    #[test]
    fn test_independent_findings() {
        let mut images = String::from(
            "<amp-img data-hero width=500 height=400 src=s.png srcset=\"s.png 1x\"></amp-img>",
        );
        for i in 0..2 {
            images.push_str(&format!("<amp-img data-hero width=500 height=400 src={i}.png></amp-img>"));
        }
        let (_, errors) = run(&page(&images));
        assert_eq!(errors.count_of(ErrorKind::TooManyHeroImages), 1);
        assert_eq!(errors.count_of(ErrorKind::CannotPreloadImage), 1);
    }

    #[test]
    fn test_template_images_ignored() {
        let (doc, _) = run(&page(
            "<template type=amp-mustache><amp-img width=500 height=400 src=t.png></amp-img></template>",
        ));
        assert!(preload_hrefs(&doc).is_empty());
    }

    #[test]
    fn test_media_copied_and_rerun_is_stable() {
        let html = page("<amp-img width=500 height=400 src=m.png media=\"(min-width: 600px)\"></amp-img>");
        let (mut doc, _) = run(&html);
        let head = doc.head().map(Element::render).unwrap_or_default();
        assert!(head.contains("data-hero media=\"(min-width: 600px)\">"));

        let once = doc.render();
        PreloadHeroImage::new(2, 150).transform(&mut doc, &mut ErrorCollection::new());
        assert_eq!(doc.render(), once);
    }
}
