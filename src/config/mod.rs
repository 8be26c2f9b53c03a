//! Optimizer configuration.
//!
//! # Module Structure
//!
//! ```text
//! config/
//! ├── keys       # Registered keys, their types and defaults
//! ├── types/     # ConfigError, ConfigValue, ValueType
//! └── mod.rs     # Configuration (this file)
//! ```
//!
//! A `Configuration` is built once per run and is read-only afterwards.
//! Construction fails closed: unknown keys and values of the wrong type are
//! rejected, absent keys take their registered default.
//!
//! # TOML
//!
//! ```toml
//! transformers = ["ServerSideRendering", "ReorderHead"]
//!
//! [amp_runtime_css]
//! canary = true
//!
//! [preload_hero_image]
//! max = 3
//! ```

pub mod keys;
pub mod types;

pub use types::{ConfigError, ConfigValue, ScalarType, ValueType};

use rustc_hash::FxHashMap;
use std::{fs, path::Path};

use keys::KEYS;

// ============================================================================
// Configuration
// ============================================================================

/// Validated key/value store of pipeline options.
#[derive(Debug, Clone)]
pub struct Configuration {
    values: FxHashMap<&'static str, ConfigValue>,
}

impl Default for Configuration {
    fn default() -> Self {
        let values = KEYS
            .iter()
            .map(|spec| (spec.key, (spec.default)()))
            .collect();
        Self { values }
    }
}

impl Configuration {
    /// Build from caller-supplied pairs merged over the defaults.
    pub fn new<I, K>(pairs: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (K, ConfigValue)>,
        K: AsRef<str>,
    {
        let mut config = Self::default();
        for (key, value) in pairs {
            let key = key.as_ref();
            let spec = keys::lookup(key)
                .ok_or_else(|| ConfigError::UnknownConfigurationKey(key.to_string()))?;
            validate(spec.key, spec.ty, &value)?;
            config.values.insert(spec.key, value);
        }
        Ok(config)
    }

    /// Parse configuration from TOML text.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let table: toml::Table = toml::from_str(content)?;
        let mut pairs = Vec::new();
        flatten_table("", &table, &mut pairs)?;
        Self::new(pairs)
    }

    /// Load configuration from a TOML file.
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let content =
            fs::read_to_string(path).map_err(|err| ConfigError::Io(path.to_path_buf(), err))?;
        Self::from_toml_str(&content)
    }

    /// Whether `key` is a registered key.
    pub fn has(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn get(&self, key: &str) -> Result<&ConfigValue, ConfigError> {
        self.values
            .get(key)
            .ok_or_else(|| ConfigError::UnknownConfigurationKey(key.to_string()))
    }

    pub fn get_bool(&self, key: &str) -> Result<bool, ConfigError> {
        let value = self.get(key)?;
        value
            .as_bool()
            .ok_or_else(|| mismatch(key, ValueType::Scalar(ScalarType::Bool), value))
    }

    pub fn get_int(&self, key: &str) -> Result<i64, ConfigError> {
        let value = self.get(key)?;
        value
            .as_int()
            .ok_or_else(|| mismatch(key, ValueType::Scalar(ScalarType::Integer), value))
    }

    pub fn get_str(&self, key: &str) -> Result<&str, ConfigError> {
        let value = self.get(key)?;
        value
            .as_str()
            .ok_or_else(|| mismatch(key, ValueType::Scalar(ScalarType::String), value))
    }

    pub fn get_str_list(&self, key: &str) -> Result<Vec<&str>, ConfigError> {
        let value = self.get(key)?;
        let expected = ValueType::List(ScalarType::String);
        value
            .as_list()
            .ok_or_else(|| mismatch(key, expected, value))?
            .iter()
            .map(|item| item.as_str().ok_or_else(|| mismatch(key, expected, item)))
            .collect()
    }
}

fn mismatch(key: &str, expected: ValueType, value: &ConfigValue) -> ConfigError {
    ConfigError::InvalidConfigurationValue {
        key: key.to_string(),
        value: value.to_string(),
        expected,
        actual: value.type_name(),
    }
}

/// Check a value against its registered type. For lists every element is
/// checked and the first offending element is reported.
fn validate(key: &str, ty: ValueType, value: &ConfigValue) -> Result<(), ConfigError> {
    match ty {
        ValueType::Scalar(scalar) if value.matches_scalar(scalar) => Ok(()),
        ValueType::Scalar(_) => Err(mismatch(key, ty, value)),
        ValueType::List(scalar) => {
            let items = value.as_list().ok_or_else(|| mismatch(key, ty, value))?;
            match items.iter().find(|item| !item.matches_scalar(scalar)) {
                Some(item) => Err(mismatch(key, ty, item)),
                None => Ok(()),
            }
        }
    }
}

/// Flatten nested tables into dotted keys.
fn flatten_table(
    prefix: &str,
    table: &toml::Table,
    out: &mut Vec<(String, ConfigValue)>,
) -> Result<(), ConfigError> {
    for (key, value) in table {
        let path = if prefix.is_empty() {
            key.to_string()
        } else {
            format!("{prefix}.{key}")
        };
        match value {
            toml::Value::Table(child) => flatten_table(&path, child, out)?,
            _ => {
                let spec = keys::lookup(&path)
                    .ok_or_else(|| ConfigError::UnknownConfigurationKey(path.clone()))?;
                let converted = ConfigValue::from_toml(value).map_err(|actual| {
                    ConfigError::InvalidConfigurationValue {
                        key: path.clone(),
                        value: value.to_string(),
                        expected: spec.ty,
                        actual,
                    }
                })?;
                out.push((path, converted));
            }
        }
    }
    Ok(())
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = Configuration::default();
        assert!(config.has(keys::TRANSFORMERS));
        assert_eq!(
            config.get_str_list(keys::TRANSFORMERS).unwrap(),
            keys::DEFAULT_TRANSFORMERS
        );
        assert_eq!(config.get_int(keys::HERO_IMAGE_MAX).unwrap(), 2);
        assert!(!config.get_bool(keys::RUNTIME_CSS_CANARY).unwrap());
    }

    #[test]
    fn test_caller_values_override_defaults() {
        let config = Configuration::new([
            (keys::HERO_IMAGE_MAX, ConfigValue::from(5_i64)),
            (keys::TRANSFORMERS, vec!["ReorderHead"].into()),
        ])
        .unwrap();
        assert_eq!(config.get_int(keys::HERO_IMAGE_MAX).unwrap(), 5);
        assert_eq!(config.get_str_list(keys::TRANSFORMERS).unwrap(), ["ReorderHead"]);
        // untouched keys keep their defaults
        assert_eq!(config.get_int(keys::HERO_IMAGE_TINY_THRESHOLD).unwrap(), 150);
    }

    #[test]
    fn test_unknown_key_is_rejected() {
        let err = Configuration::new([("nope", ConfigValue::from(true))]).unwrap_err();
        assert!(matches!(err, ConfigError::UnknownConfigurationKey(key) if key == "nope"));

        let config = Configuration::default();
        assert!(!config.has("nope"));
        assert!(matches!(
            config.get("nope"),
            Err(ConfigError::UnknownConfigurationKey(_))
        ));
    }

    #[test]
    fn test_scalar_type_mismatch() {
        let err = Configuration::new([(keys::RUNTIME_CSS_CANARY, ConfigValue::from("yes"))])
            .unwrap_err();
        match err {
            ConfigError::InvalidConfigurationValue {
                key,
                expected,
                actual,
                ..
            } => {
                assert_eq!(key, keys::RUNTIME_CSS_CANARY);
                assert_eq!(expected, ValueType::Scalar(ScalarType::Bool));
                assert_eq!(actual, "string");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_list_element_mismatch_names_offending_element() {
        let value = ConfigValue::List(vec!["ReorderHead".into(), ConfigValue::Integer(7)]);
        let err = Configuration::new([(keys::TRANSFORMERS, value)]).unwrap_err();
        match err {
            ConfigError::InvalidConfigurationValue { value, actual, .. } => {
                assert_eq!(value, "7");
                assert_eq!(actual, "integer");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_from_toml_str_flattens_sections() {
        let config = Configuration::from_toml_str(
            r#"
            transformers = ["ServerSideRendering"]

            [amp_runtime_css]
            canary = true

            [preload_hero_image]
            max = 3
            "#,
        )
        .unwrap();
        assert!(config.get_bool(keys::RUNTIME_CSS_CANARY).unwrap());
        assert_eq!(config.get_int(keys::HERO_IMAGE_MAX).unwrap(), 3);
    }

    #[test]
    fn test_from_toml_str_rejects_unknown_section_key() {
        let err = Configuration::from_toml_str("[preload_hero_image]\nmaximum = 3").unwrap_err();
        assert!(
            matches!(err, ConfigError::UnknownConfigurationKey(key) if key == "preload_hero_image.maximum")
        );
    }

    #[test]
    fn test_from_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[transformed_identifier]\nversion = 0").unwrap();
        let config = Configuration::from_path(file.path()).unwrap();
        assert_eq!(config.get_int(keys::TRANSFORMED_VERSION).unwrap(), 0);

        let missing = Configuration::from_path(Path::new("/nonexistent/amp.toml"));
        assert!(matches!(missing, Err(ConfigError::Io(..))));
    }
}
