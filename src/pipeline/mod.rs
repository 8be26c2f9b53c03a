//! Optimization pipeline.
//!
//! `TransformationEngine` resolves the configured transformer names once and
//! then runs them, in order, against each document it is given.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐   ┌──────────────────────────────────────────┐   ┌────────────┐
//! │ HTML string  │ → │ Document  →  T1 → T2 → ... → Tn (in place) │ → │ HTML string│
//! └──────────────┘   └──────────────────────────────────────────┘   └────────────┘
//!                                   ↓
//!                            ErrorCollection
//! ```
//!
//! - `optimize_html()`: parse, transform, serialize
//! - `optimize_dom()`: transform an already-parsed document
//!
//! Transformers never abort the run; what they cannot do ends up in the
//! `ErrorCollection` and the caller decides what is fatal.

pub mod transform;

use std::sync::Arc;

use crate::config::{ConfigError, Configuration, keys};
use crate::dom::Document;
use crate::error::ErrorCollection;
use crate::fetch::{HttpFetcher, OfflineFetcher, RemoteGetRequest};

pub use transform::{Transformer, TransformerKind};

// =============================================================================
// Engine
// =============================================================================

/// Ordered list of transformers built from a `Configuration`.
///
/// The engine holds no per-document state and can be shared between threads.
pub struct TransformationEngine {
    transformers: Vec<Box<dyn Transformer>>,
}

impl TransformationEngine {
    /// Build with the default HTTP fetcher for runtime CSS.
    pub fn new(config: &Configuration) -> Result<Self, ConfigError> {
        let fetcher: Arc<dyn RemoteGetRequest> = match HttpFetcher::new() {
            Ok(fetcher) => Arc::new(fetcher),
            Err(err) => {
                crate::debug!("optimize"; "http client unavailable, running offline: {}", err);
                Arc::new(OfflineFetcher)
            }
        };
        Self::with_fetcher(config, fetcher)
    }

    /// Build with a caller-supplied fetcher.
    pub fn with_fetcher(
        config: &Configuration,
        fetcher: Arc<dyn RemoteGetRequest>,
    ) -> Result<Self, ConfigError> {
        let transformers = config
            .get_str_list(keys::TRANSFORMERS)?
            .into_iter()
            .map(|name| name.parse::<TransformerKind>()?.build(config, &fetcher))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { transformers })
    }

    /// Names of the configured transformers, in run order.
    pub fn transformer_names(&self) -> Vec<&'static str> {
        self.transformers.iter().map(|t| t.name()).collect()
    }

    /// Run every transformer against `doc`.
    pub fn optimize_dom(&self, doc: &mut Document, errors: &mut ErrorCollection) {
        for transformer in &self.transformers {
            let before = errors.count();
            transformer.transform(doc, errors);
            crate::debug!(
                "optimize";
                "{} done ({} new findings)",
                transformer.name(),
                errors.count() - before
            );
        }
    }

    /// Parse `html`, optimize it and serialize the result.
    pub fn optimize_html(&self, html: &str, errors: &mut ErrorCollection) -> String {
        let mut doc = Document::parse(html);
        self.optimize_dom(&mut doc, errors);
        doc.render()
    }
}

// =============================================================================
// Tests
// =============================================================================
