//! Typed configuration values.

use std::fmt;

/// Type of a scalar configuration value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalarType {
    Bool,
    Integer,
    String,
}

impl fmt::Display for ScalarType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Bool => "bool",
            Self::Integer => "integer",
            Self::String => "string",
        })
    }
}

/// Registered type of a configuration key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueType {
    Scalar(ScalarType),
    List(ScalarType),
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Scalar(scalar) => write!(f, "{scalar}"),
            Self::List(scalar) => write!(f, "list of {scalar}"),
        }
    }
}

/// A configuration value.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigValue {
    Bool(bool),
    Integer(i64),
    Float(f64),
    String(String),
    List(Vec<ConfigValue>),
}

impl ConfigValue {
    /// Name of the value's actual type, used in diagnostics.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Bool(_) => "bool",
            Self::Integer(_) => "integer",
            Self::Float(_) => "float",
            Self::String(_) => "string",
            Self::List(_) => "list",
        }
    }

    pub fn matches_scalar(&self, scalar: ScalarType) -> bool {
        matches!(
            (self, scalar),
            (Self::Bool(_), ScalarType::Bool)
                | (Self::Integer(_), ScalarType::Integer)
                | (Self::String(_), ScalarType::String)
        )
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Integer(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[ConfigValue]> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }

    /// Convert a TOML value. Tables and datetimes have no counterpart and
    /// are reported by their type name.
    pub fn from_toml(value: &toml::Value) -> Result<Self, &'static str> {
        match value {
            toml::Value::Boolean(b) => Ok(Self::Bool(*b)),
            toml::Value::Integer(i) => Ok(Self::Integer(*i)),
            toml::Value::Float(x) => Ok(Self::Float(*x)),
            toml::Value::String(s) => Ok(Self::String(s.clone())),
            toml::Value::Array(items) => items
                .iter()
                .map(Self::from_toml)
                .collect::<Result<Vec<_>, _>>()
                .map(Self::List),
            toml::Value::Table(_) => Err("table"),
            toml::Value::Datetime(_) => Err("datetime"),
        }
    }
}

impl fmt::Display for ConfigValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{b}"),
            Self::Integer(i) => write!(f, "{i}"),
            Self::Float(x) => write!(f, "{x}"),
            Self::String(s) => write!(f, "{s:?}"),
            Self::List(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
        }
    }
}

impl From<bool> for ConfigValue {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<i64> for ConfigValue {
    fn from(i: i64) -> Self {
        Self::Integer(i)
    }
}

impl From<&str> for ConfigValue {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<String> for ConfigValue {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl<T: Into<ConfigValue>> From<Vec<T>> for ConfigValue {
    fn from(items: Vec<T>) -> Self {
        Self::List(items.into_iter().map(Into::into).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_display() {
        assert_eq!(ConfigValue::from(vec!["a", "b"]).to_string(), r#"["a", "b"]"#);
        assert_eq!(ConfigValue::from(3_i64).to_string(), "3");
        assert_eq!(ValueType::List(ScalarType::String).to_string(), "list of string");
    }

    #[test]
    fn test_from_toml() {
        let value: toml::Value = toml::from_str("a = [1, 2]\nb = 1979-05-27").unwrap();
        let table = value.as_table().unwrap();
        assert_eq!(
            ConfigValue::from_toml(&table["a"]),
            Ok(ConfigValue::List(vec![ConfigValue::Integer(1), ConfigValue::Integer(2)]))
        );
        assert_eq!(ConfigValue::from_toml(&table["b"]), Err("datetime"));
    }
}
