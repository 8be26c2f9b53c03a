//! Server-side optimizer for AMP documents.
//!
//! Takes a valid AMP page and rewrites it so it renders without waiting for
//! the AMP runtime: layouts are computed up front, the runtime stylesheet is
//! inlined, hero images are preloaded and the boilerplate is removed when
//! nothing on the page needs it.
//!
//! # Module Structure
//!
//! ```text
//! src/
//! ├── amp        # AMP markers, formats and boilerplate
//! ├── config/    # Configuration, keys and defaults
//! ├── css/       # CssRule / CssRules accumulation
//! ├── dom/       # Document tree, html5ever parsing, serialization
//! ├── embed/     # Bundled runtime CSS and CDN URL templates
//! ├── error      # ErrorCollection of non-fatal findings
//! ├── fetch      # RemoteGetRequest and the runtime CSS lookup
//! ├── layout/    # AMP layout algorithm, ImageDimensions
//! ├── pipeline/  # TransformationEngine and the transformers
//! └── utils/     # Escaping and small helpers
//! ```
//!
//! # Example
//!
//! ```ignore
//! use amp_optimizer::{Configuration, ErrorCollection, TransformationEngine};
//!
//! let engine = TransformationEngine::new(&Configuration::default())?;
//! let mut errors = ErrorCollection::new();
//! let optimized = engine.optimize_html(html, &mut errors);
//! ```

pub mod logger;

pub mod amp;
pub mod config;
pub mod css;
pub mod dom;
pub mod embed;
pub mod error;
pub mod fetch;
pub mod layout;
pub mod pipeline;
pub mod utils;

pub use config::{ConfigError, ConfigValue, Configuration};
pub use dom::Document;
pub use error::{Error, ErrorCollection, ErrorKind};
pub use fetch::{FetchError, HttpFetcher, OfflineFetcher, RemoteGetRequest};
pub use pipeline::{TransformationEngine, Transformer, TransformerKind};
