//! Document transformers.
//!
//! Each transformer is one pass over the whole document. Passes mutate the
//! document in place and report what they could not do to the shared
//! `ErrorCollection`; none of them abort the run.
//!
//! # Modules
//!
//! - `amp_boilerplate`: inserts the format's boilerplate `<style>`/`<noscript>`
//! - `server_side_rendering`: computes layout, removes the boilerplate
//! - `amp_runtime_css`: inlines the runtime stylesheet into `<head>`
//! - `preload_hero_image`: marks hero images, adds preloads and `<img>`
//! - `transformed_identifier`: marks the root as transformed
//! - `reorder_head`: sorts `<head>` into the runtime's expected order

mod amp_boilerplate;
mod amp_runtime_css;
mod preload_hero_image;
mod reorder_head;
mod server_side_rendering;
mod transformed_identifier;

pub use amp_boilerplate::AmpBoilerplate;
pub use amp_runtime_css::AmpRuntimeCss;
pub use preload_hero_image::PreloadHeroImage;
pub use reorder_head::ReorderHead;
pub use server_side_rendering::ServerSideRendering;
pub use transformed_identifier::TransformedIdentifier;

use std::{str::FromStr, sync::Arc};

use crate::config::{ConfigError, Configuration};
use crate::dom::Document;
use crate::error::ErrorCollection;
use crate::fetch::RemoteGetRequest;

/// One optimization pass.
pub trait Transformer: Send + Sync {
    fn name(&self) -> &'static str;

    fn transform(&self, doc: &mut Document, errors: &mut ErrorCollection);
}

// =============================================================================
// Registry
// =============================================================================

/// Transformers that can be named in the `transformers` config key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransformerKind {
    AmpBoilerplate,
    ServerSideRendering,
    AmpRuntimeCss,
    PreloadHeroImage,
    TransformedIdentifier,
    ReorderHead,
}

impl TransformerKind {
    pub const ALL: [Self; 6] = [
        Self::AmpBoilerplate,
        Self::ServerSideRendering,
        Self::AmpRuntimeCss,
        Self::PreloadHeroImage,
        Self::TransformedIdentifier,
        Self::ReorderHead,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::AmpBoilerplate => "AmpBoilerplate",
            Self::ServerSideRendering => "ServerSideRendering",
            Self::AmpRuntimeCss => "AmpRuntimeCss",
            Self::PreloadHeroImage => "PreloadHeroImage",
            Self::TransformedIdentifier => "TransformedIdentifier",
            Self::ReorderHead => "ReorderHead",
        }
    }

    /// Instantiate with options read from `config`.
    pub fn build(
        self,
        config: &Configuration,
        fetcher: &Arc<dyn RemoteGetRequest>,
    ) -> Result<Box<dyn Transformer>, ConfigError> {
        Ok(match self {
            Self::AmpBoilerplate => Box::new(AmpBoilerplate),
            Self::ServerSideRendering => Box::new(ServerSideRendering),
            Self::AmpRuntimeCss => Box::new(AmpRuntimeCss::from_config(config, Arc::clone(fetcher))?),
            Self::PreloadHeroImage => Box::new(PreloadHeroImage::from_config(config)?),
            Self::TransformedIdentifier => Box::new(TransformedIdentifier::from_config(config)?),
            Self::ReorderHead => Box::new(ReorderHead),
        })
    }
}

impl FromStr for TransformerKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.name() == s.trim())
            .ok_or_else(|| ConfigError::UnknownTransformer(s.to_string()))
    }
}

/// Read a non-negative integer option.
fn config_count(config: &Configuration, key: &str) -> Result<usize, ConfigError> {
    Ok(usize::try_from(config.get_int(key)?.max(0)).unwrap_or(usize::MAX))
}
