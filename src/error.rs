//! Transform-time findings.
//!
//! Transformers never fail. When they cannot apply an optimization they leave
//! the document servable and record an [`Error`] in the [`ErrorCollection`]
//! that the engine threads through the whole run. Callers decide which kinds
//! they treat as fatal.

use std::fmt;
use thiserror::Error;

// ============================================================================
// Error
// ============================================================================

/// A non-fatal finding reported by a transformer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    #[error("cannot remove boilerplate: {0}")]
    CannotRemoveBoilerplate(BoilerplateBlocker),

    #[error("too many hero images: {found} marked, at most {limit} are preloaded")]
    TooManyHeroImages { limit: usize, found: usize },

    #[error("cannot preload hero image `{src}` because it has a srcset")]
    CannotPreloadImage { element: String, src: String },

    #[error("cannot perform server-side rendering on <{tag}>: {reason}")]
    CannotPerformServerSideRendering { tag: String, reason: String },
}

/// Discriminant of [`Error`], for counting and filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    CannotRemoveBoilerplate,
    TooManyHeroImages,
    CannotPreloadImage,
    CannotPerformServerSideRendering,
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::CannotRemoveBoilerplate(_) => ErrorKind::CannotRemoveBoilerplate,
            Self::TooManyHeroImages { .. } => ErrorKind::TooManyHeroImages,
            Self::CannotPreloadImage { .. } => ErrorKind::CannotPreloadImage,
            Self::CannotPerformServerSideRendering { .. } => {
                ErrorKind::CannotPerformServerSideRendering
            }
        }
    }
}

/// Why the boilerplate has to stay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BoilerplateBlocker {
    /// `amp-experiment` with a non-empty configuration.
    AmpExperiment,
    /// A render-delaying extension such as `amp-story`.
    RenderDelayingExtension(String),
    AmpAudio,
    /// An element whose layout could not be computed on the server.
    UnsupportedLayout(String),
}

impl fmt::Display for BoilerplateBlocker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AmpExperiment => write!(f, "amp-experiment is configured"),
            Self::RenderDelayingExtension(name) => {
                write!(f, "render-delaying extension `{name}` is used")
            }
            Self::AmpAudio => write!(f, "amp-audio requires the runtime to lay out"),
            Self::UnsupportedLayout(tag) => write!(f, "layout of <{tag}> is not supported"),
        }
    }
}

// ============================================================================
// ErrorCollection
// ============================================================================

/// Append-only list of findings for one optimization run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ErrorCollection {
    errors: Vec<Error>,
}

impl ErrorCollection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, error: Error) {
        self.errors.push(error);
    }

    pub fn count(&self) -> usize {
        self.errors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Whether at least one finding of `kind` was recorded.
    pub fn has(&self, kind: ErrorKind) -> bool {
        self.errors.iter().any(|error| error.kind() == kind)
    }

    pub fn count_of(&self, kind: ErrorKind) -> usize {
        self.errors
            .iter()
            .filter(|error| error.kind() == kind)
            .count()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Error> {
        self.errors.iter()
    }
}

impl<'a> IntoIterator for &'a ErrorCollection {
    type Item = &'a Error;
    type IntoIter = std::slice::Iter<'a, Error>;

    fn into_iter(self) -> Self::IntoIter {
        self.errors.iter()
    }
}

impl IntoIterator for ErrorCollection {
    type Item = Error;
    type IntoIter = std::vec::IntoIter<Error>;

    fn into_iter(self) -> Self::IntoIter {
        self.errors.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collection_counts_by_kind() {
        let mut errors = ErrorCollection::new();
        assert!(errors.is_empty());

        errors.add(Error::TooManyHeroImages { limit: 2, found: 3 });
        errors.add(Error::CannotPreloadImage {
            element: "<amp-img>".into(),
            src: "a.png".into(),
        });
        errors.add(Error::CannotRemoveBoilerplate(BoilerplateBlocker::AmpAudio));

        assert_eq!(errors.count(), 3);
        assert!(errors.has(ErrorKind::TooManyHeroImages));
        assert!(errors.has(ErrorKind::CannotPreloadImage));
        assert!(!errors.has(ErrorKind::CannotPerformServerSideRendering));
        assert_eq!(errors.count_of(ErrorKind::CannotRemoveBoilerplate), 1);

        let kinds: Vec<_> = errors.iter().map(Error::kind).collect();
        assert_eq!(kinds[0], ErrorKind::TooManyHeroImages);
    }

    #[test]
    fn test_error_display() {
        let error = Error::CannotRemoveBoilerplate(BoilerplateBlocker::RenderDelayingExtension(
            "amp-story".into(),
        ));
        assert_eq!(
            error.to_string(),
            "cannot remove boilerplate: render-delaying extension `amp-story` is used"
        );
        let error = Error::TooManyHeroImages { limit: 2, found: 6 };
        assert!(error.to_string().contains("at most 2"));
    }
}
