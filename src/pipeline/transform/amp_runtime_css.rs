//! Inlines the AMP runtime stylesheet as `<style amp-runtime>`.
//!
//! The stylesheet is resolved once per transformer and reused for every
//! document it processes:
//!
//! 1. `styles` configured: used as-is
//! 2. otherwise fetched from the CDN for the configured (or current) version
//! 3. on any fetch failure, the bundled copy is used
//!
//! Fetch failures are not findings; the document is still valid with the
//! bundled styles.

use std::sync::{Arc, OnceLock};

use super::Transformer;
use crate::amp::{RUNTIME_STYLE_ATTR, RUNTIME_VERSION_ATTR, is_runtime_style};
use crate::config::{ConfigError, Configuration, keys};
use crate::dom::{Attrs, Document, Element};
use crate::embed::runtime::{AMP_RUNTIME_CSS, AMP_RUNTIME_VERSION};
use crate::error::ErrorCollection;
use crate::fetch::{FetchError, RemoteGetRequest, runtime_css, runtime_version};

/// Resolved stylesheet and its runtime version.
#[derive(Debug, Clone, PartialEq, Eq)]
struct RuntimeStyles {
    css: String,
    version: String,
}

pub struct AmpRuntimeCss {
    fetcher: Arc<dyn RemoteGetRequest>,
    host: String,
    canary: bool,
    version: Option<String>,
    styles: Option<String>,
    resolved: OnceLock<RuntimeStyles>,
}

impl AmpRuntimeCss {
    pub fn new(fetcher: Arc<dyn RemoteGetRequest>, host: impl Into<String>) -> Self {
        Self {
            fetcher,
            host: host.into(),
            canary: false,
            version: None,
            styles: None,
            resolved: OnceLock::new(),
        }
    }

    pub fn from_config(
        config: &Configuration,
        fetcher: Arc<dyn RemoteGetRequest>,
    ) -> Result<Self, ConfigError> {
        let non_empty = |value: &str| (!value.trim().is_empty()).then(|| value.trim().to_string());
        Ok(Self {
            canary: config.get_bool(keys::RUNTIME_CSS_CANARY)?,
            version: non_empty(config.get_str(keys::RUNTIME_CSS_VERSION)?),
            styles: non_empty(config.get_str(keys::RUNTIME_CSS_STYLES)?),
            ..Self::new(fetcher, config.get_str(keys::RUNTIME_CSS_HOST)?)
        })
    }

    fn styles(&self) -> &RuntimeStyles {
        self.resolved.get_or_init(|| {
            if let Some(css) = &self.styles {
                return RuntimeStyles {
                    css: css.clone(),
                    version: self.version.clone().unwrap_or_default(),
                };
            }
            self.fetch().unwrap_or_else(|err| {
                crate::debug!("runtime"; "using bundled runtime css {}: {}", AMP_RUNTIME_VERSION, err);
                RuntimeStyles {
                    css: AMP_RUNTIME_CSS.trim().to_string(),
                    version: AMP_RUNTIME_VERSION.to_string(),
                }
            })
        })
    }

    fn fetch(&self) -> Result<RuntimeStyles, FetchError> {
        let version = match &self.version {
            Some(version) => version.clone(),
            None => runtime_version(self.fetcher.as_ref(), &self.host, self.canary)?,
        };
        let css = runtime_css(self.fetcher.as_ref(), &self.host, &version)?;
        crate::debug!("runtime"; "fetched runtime css {} ({} bytes)", version, css.len());
        Ok(RuntimeStyles { css, version })
    }
}

impl Transformer for AmpRuntimeCss {
    fn name(&self) -> &'static str {
        "AmpRuntimeCss"
    }

    fn transform(&self, doc: &mut Document, _errors: &mut ErrorCollection) {
        let Some(head) = doc.head_mut() else {
            return;
        };
        if head.elements().any(is_runtime_style) {
            crate::debug!("runtime"; "runtime css already inlined");
            return;
        }

        let styles = self.styles();
        let mut style = Element::with_attrs("style", Attrs::from([(RUNTIME_STYLE_ATTR, "")]));
        if !styles.version.is_empty() {
            style.set_attr(RUNTIME_VERSION_ATTR, styles.version.as_str());
        }
        style.push_text(styles.css.as_str());
        head.prepend_elem(style);
    }
}
