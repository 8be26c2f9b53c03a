//! A single normalized CSS rule.

use std::collections::BTreeSet;

use crate::amp::ID_PLACEHOLDER;

/// One declaration block with its selectors and optional `@media` context.
///
/// Selectors and properties are trimmed, de-duplicated and sorted on
/// construction, so two rules with the same content compare and serialize
/// identically regardless of input order or whitespace.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CssRule {
    media_query: Option<String>,
    selectors: BTreeSet<String>,
    properties: BTreeSet<String>,
}

impl CssRule {
    pub fn new(selectors: &str, properties: &str) -> Self {
        Self {
            media_query: None,
            selectors: split(selectors, ','),
            properties: split(properties, ';'),
        }
    }

    /// Same as [`CssRule::new`], scoped by `@media {media_query}`.
    pub fn with_media_query(media_query: &str, selectors: &str, properties: &str) -> Self {
        let media_query = media_query.trim();
        Self {
            media_query: (!media_query.is_empty()).then(|| media_query.to_string()),
            ..Self::new(selectors, properties)
        }
    }

    pub fn is_empty(&self) -> bool {
        self.selectors.is_empty() || self.properties.is_empty()
    }

    /// Render the rule. Empty rules render as `""`.
    pub fn css(&self) -> String {
        if self.is_empty() {
            return String::new();
        }
        let block = format!(
            "{}{{{}}}",
            join(&self.selectors, ","),
            join(&self.properties, ";")
        );
        match &self.media_query {
            Some(media) => format!("@media {media}{{{block}}}"),
            None => block,
        }
    }

    /// Substitute the id placeholder in every selector.
    pub fn apply_id(&self, id: &str) -> Self {
        Self {
            media_query: self.media_query.clone(),
            selectors: self
                .selectors
                .iter()
                .map(|selector| selector.replace(ID_PLACEHOLDER, id))
                .collect(),
            properties: self.properties.clone(),
        }
    }

    /// Rules merge when they share the media context and the property set.
    pub fn can_be_merged(&self, other: &Self) -> bool {
        self.media_query == other.media_query && self.properties == other.properties
    }

    /// Union of both selector sets. Only meaningful if
    /// [`can_be_merged`](Self::can_be_merged) holds.
    pub fn merge_with(&self, other: &Self) -> Self {
        let mut merged = self.clone();
        merged.selectors.extend(other.selectors.iter().cloned());
        merged
    }

    pub(super) fn group_key(&self) -> (Option<String>, BTreeSet<String>) {
        (self.media_query.clone(), self.properties.clone())
    }
}

fn split(input: &str, separator: char) -> BTreeSet<String> {
    input
        .split(separator)
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(str::to_string)
        .collect()
}

fn join(set: &BTreeSet<String>, separator: &str) -> String {
    set.iter()
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(separator)
}
