//! Marks the root element as transformed (`transformed="self;v=1"`).

use super::{Transformer, config_count};
use crate::amp::TRANSFORMED_ATTR;
use crate::config::{ConfigError, Configuration, keys};
use crate::dom::Document;
use crate::error::ErrorCollection;

pub struct TransformedIdentifier {
    version: usize,
}

impl TransformedIdentifier {
    pub fn new(version: usize) -> Self {
        Self { version }
    }

    pub fn from_config(config: &Configuration) -> Result<Self, ConfigError> {
        Ok(Self::new(config_count(config, keys::TRANSFORMED_VERSION)?))
    }

    fn value(&self) -> String {
        match self.version {
            0 => "self".to_string(),
            version => format!("self;v={version}"),
        }
    }
}

impl Transformer for TransformedIdentifier {
    fn name(&self) -> &'static str {
        "TransformedIdentifier"
    }

    fn transform(&self, doc: &mut Document, _errors: &mut ErrorCollection) {
        doc.root.set_attr(TRANSFORMED_ATTR, self.value());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(transformer: &TransformedIdentifier, html: &str) -> Document {
        let mut doc = Document::parse(html);
        transformer.transform(&mut doc, &mut ErrorCollection::new());
        doc
    }

    #[test]
    fn test_versioned() {
        let doc = run(&TransformedIdentifier::new(1), "<html ⚡><head></head></html>");
        assert_eq!(doc.root.get_attr("transformed"), Some("self;v=1"));
        assert!(doc.render().starts_with("<html ⚡ transformed=\"self;v=1\">"));
    }

    #[test]
    fn test_unversioned() {
        let doc = run(&TransformedIdentifier::new(0), "<html amp></html>");
        assert_eq!(doc.root.get_attr("transformed"), Some("self"));
    }

    #[test]
    fn test_rerun_overwrites() {
        let doc = run(
            &TransformedIdentifier::new(2),
            "<html amp transformed=\"self;v=1\" lang=en></html>",
        );
        assert_eq!(doc.root.get_attr("transformed"), Some("self;v=2"));
        let names: Vec<_> = doc.root.attrs.iter().map(|(k, _)| k).collect();
        assert_eq!(names, ["amp", "transformed", "lang"]);
    }

    #[test]
    fn test_from_config_default() {
        let transformer = TransformedIdentifier::from_config(&Configuration::default()).unwrap();
        assert_eq!(transformer.value(), "self;v=1");
    }
}
