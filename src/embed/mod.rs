//! Embedded static resources.
//!
//! # Module Structure
//!
//! - `template` - `__NAME__` placeholder templates
//! - `runtime` - Bundled AMP runtime CSS, used when the CDN is unreachable
//! - `cdn` - URL templates for the AMP CDN
//!
//! # Usage
//!
//! ```ignore
//! use embed::cdn::{RUNTIME_CSS_URL, CdnVars};
//!
//! let vars = CdnVars { host: host.to_string(), version: version.to_string() };
//! let url = RUNTIME_CSS_URL.render(&vars);
//! ```

mod template;

pub use template::{Template, TemplateVars};

pub mod runtime {
    /// Runtime version of the bundled stylesheet.
    pub const AMP_RUNTIME_VERSION: &str = "012410292120000";

    /// `v0.css` of [`AMP_RUNTIME_VERSION`].
    pub const AMP_RUNTIME_CSS: &str = include_str!("amp-runtime.css");
}

pub mod cdn {
    use super::{Template, TemplateVars};

    /// Variables for CDN URL templates.
    pub struct CdnVars {
        pub host: String,
        pub version: String,
    }

    impl TemplateVars for CdnVars {
        fn lookup(&self, name: &str) -> Option<&str> {
            match name {
                "HOST" => Some(self.host.trim_end_matches('/')),
                "VERSION" => Some(&self.version),
                _ => None,
            }
        }
    }

    /// Runtime version metadata (JSON).
    pub const METADATA_URL: Template<CdnVars> = Template::new("__HOST__/rtv/metadata");

    /// Runtime stylesheet of one version.
    pub const RUNTIME_CSS_URL: Template<CdnVars> =
        Template::new("__HOST__/rtv/__VERSION__/v0.css");

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn test_render_urls() {
            let vars = CdnVars {
                host: "https://cdn.example.com/".into(),
                version: "0123".into(),
            };
            assert_eq!(METADATA_URL.render(&vars), "https://cdn.example.com/rtv/metadata");
            assert_eq!(
                RUNTIME_CSS_URL.render(&vars),
                "https://cdn.example.com/rtv/0123/v0.css"
            );
        }
    }
}
