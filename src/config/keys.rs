//! Registry of configuration keys.
//!
//! Every key the optimizer understands is declared here with its type and
//! default. Nested TOML tables map to dotted keys, so
//! `[preload_hero_image] max = 3` sets `preload_hero_image.max`.

use super::types::{ConfigValue, ScalarType, ValueType};

pub const TRANSFORMERS: &str = "transformers";

pub const RUNTIME_CSS_CANARY: &str = "amp_runtime_css.canary";
pub const RUNTIME_CSS_VERSION: &str = "amp_runtime_css.version";
pub const RUNTIME_CSS_STYLES: &str = "amp_runtime_css.styles";
pub const RUNTIME_CSS_HOST: &str = "amp_runtime_css.host";

pub const HERO_IMAGE_MAX: &str = "preload_hero_image.max";
pub const HERO_IMAGE_TINY_THRESHOLD: &str = "preload_hero_image.tiny_threshold";

pub const TRANSFORMED_VERSION: &str = "transformed_identifier.version";

/// Transformers run when the caller does not configure a list.
pub const DEFAULT_TRANSFORMERS: [&str; 6] = [
    "AmpBoilerplate",
    "ServerSideRendering",
    "AmpRuntimeCss",
    "PreloadHeroImage",
    "TransformedIdentifier",
    "ReorderHead",
];

pub const DEFAULT_RUNTIME_HOST: &str = "https://cdn.ampproject.org";
pub const DEFAULT_HERO_IMAGE_MAX: i64 = 2;
pub const DEFAULT_TINY_THRESHOLD: i64 = 150;
pub const DEFAULT_TRANSFORMED_VERSION: i64 = 1;

/// A registered key.
pub struct KeySpec {
    pub key: &'static str,
    pub ty: ValueType,
    pub default: fn() -> ConfigValue,
}

const BOOL: ValueType = ValueType::Scalar(ScalarType::Bool);
const INT: ValueType = ValueType::Scalar(ScalarType::Integer);
const STR: ValueType = ValueType::Scalar(ScalarType::String);
const STR_LIST: ValueType = ValueType::List(ScalarType::String);

pub static KEYS: &[KeySpec] = &[
    KeySpec {
        key: TRANSFORMERS,
        ty: STR_LIST,
        default: || DEFAULT_TRANSFORMERS.to_vec().into(),
    },
    KeySpec {
        key: RUNTIME_CSS_CANARY,
        ty: BOOL,
        default: || false.into(),
    },
    KeySpec {
        key: RUNTIME_CSS_VERSION,
        ty: STR,
        default: || "".into(),
    },
    KeySpec {
        key: RUNTIME_CSS_STYLES,
        ty: STR,
        default: || "".into(),
    },
    KeySpec {
        key: RUNTIME_CSS_HOST,
        ty: STR,
        default: || DEFAULT_RUNTIME_HOST.into(),
    },
    KeySpec {
        key: HERO_IMAGE_MAX,
        ty: INT,
        default: || DEFAULT_HERO_IMAGE_MAX.into(),
    },
    KeySpec {
        key: HERO_IMAGE_TINY_THRESHOLD,
        ty: INT,
        default: || DEFAULT_TINY_THRESHOLD.into(),
    },
    KeySpec {
        key: TRANSFORMED_VERSION,
        ty: INT,
        default: || DEFAULT_TRANSFORMED_VERSION.into(),
    },
];

pub fn lookup(key: &str) -> Option<&'static KeySpec> {
    KEYS.iter().find(|spec| spec.key == key)
}
