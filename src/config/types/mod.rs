//! Configuration utility types.
//!
//! | Module   | Purpose                                      |
//! |----------|----------------------------------------------|
//! | `error`  | Configuration error types                    |
//! | `value`  | Typed values and registered key types        |

mod error;
mod value;

pub use error::ConfigError;
pub use value::{ConfigValue, ScalarType, ValueType};
