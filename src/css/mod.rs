//! CSS rule model used for server-side layout styles.
//!
//! Declarations are opaque strings; only list normalization is performed.
//!
//! - `CssRule`: one rule, normalized on construction
//! - `CssRules`: ordered collection that merges rules with identical
//!   declarations into a single group

mod rule;

pub use rule::CssRule;

use rustc_hash::FxHashMap;
use std::collections::BTreeSet;

// =============================================================================
// CssRules
// =============================================================================

type GroupKey = (Option<String>, BTreeSet<String>);

/// Insertion-ordered rule groups, at most one per `(media, properties)`.
///
/// Adding a rule whose declarations are already present extends that group's
/// selectors in place; otherwise a new group is appended. Output order is
/// therefore the order in which each declaration set was first seen.
#[derive(Debug, Clone, Default)]
pub struct CssRules {
    groups: Vec<CssRule>,
    index: FxHashMap<GroupKey, usize>,
}

impl CssRules {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, rule: CssRule) {
        let key = rule.group_key();
        match self.index.get(&key) {
            Some(&slot) => self.groups[slot] = self.groups[slot].merge_with(&rule),
            None => {
                self.index.insert(key, self.groups.len());
                self.groups.push(rule);
            }
        }
    }

    /// Number of groups.
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &CssRule> {
        self.groups.iter()
    }

    /// Substitute the id placeholder in every group. Groups that become
    /// mergeable are merged, keeping the earlier position.
    pub fn apply_id(&self, id: &str) -> Self {
        self.groups.iter().map(|rule| rule.apply_id(id)).collect()
    }

    pub fn css(&self) -> String {
        self.groups.iter().map(CssRule::css).collect()
    }
}

impl FromIterator<CssRule> for CssRules {
    fn from_iter<I: IntoIterator<Item = CssRule>>(iter: I) -> Self {
        let mut rules = Self::new();
        for rule in iter {
            rules.add(rule);
        }
        rules
    }
}

impl Extend<CssRule> for CssRules {
    fn extend<I: IntoIterator<Item = CssRule>>(&mut self, iter: I) {
        for rule in iter {
            self.add(rule);
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_seen_group_order() {
        let mut rules = CssRules::new();
        rules.add(CssRule::new("#a", "color:red"));
        rules.add(CssRule::new("#b", "color:blue"));
        rules.add(CssRule::new("#c", "color:red"));
        rules.add(CssRule::new("#d", "color:green"));

        assert_eq!(rules.len(), 3);
        assert_eq!(
            rules.css(),
            "#a,#c{color:red}#b{color:blue}#d{color:green}"
        );
    }

    #[test]
    fn test_media_scoped_rules_are_separate_groups() {
        let rules: CssRules = [
            CssRule::new("#a", "display:none"),
            CssRule::with_media_query("print", "#b", "display:none"),
            CssRule::with_media_query("print", "#c", "display:none"),
        ]
        .into_iter()
        .collect();
        assert_eq!(rules.len(), 2);
        assert_eq!(
            rules.css(),
            "#a{display:none}@media print{#b,#c{display:none}}"
        );
    }

    #[test]
    fn test_apply_id() {
        let mut rules = CssRules::new();
        rules.add(CssRule::new("#__ID__", "width:100vw"));
        rules.add(CssRule::with_media_query("(min-width:320px)", "#__ID__", "width:320px"));
        let scoped = rules.apply_id("i-amp-3");
        assert_eq!(
            scoped.css(),
            "#i-amp-3{width:100vw}@media (min-width:320px){#i-amp-3{width:320px}}"
        );
    }

    #[test]
    fn test_empty() {
        let rules = CssRules::new();
        assert!(rules.is_empty());
        assert_eq!(rules.css(), "");
    }
}
