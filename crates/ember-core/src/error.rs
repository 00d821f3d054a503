//! Error types for Ember

use thiserror::Error;

/// The main error type for Ember operations
#[derive(Debug, Error)]
pub enum EmberError {
    #[error("Curve capacity exceeded: at most {max_keys} keys per curve")]
    CurveCapacity { max_keys: usize },

    #[error("Gradient capacity exceeded: at most {max_keys} {channel} keys per gradient")]
    GradientCapacity {
        channel: &'static str,
        max_keys: usize,
    },

    #[error("Unsupported curve mode for {attribute}: {mode}")]
    UnsupportedCurveMode {
        attribute: &'static str,
        mode: String,
    },

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("TOML parse error: {0}")]
    TomlParseError(String),

    #[error("Invalid field type: expected {expected}, got {got}")]
    InvalidFieldType { expected: String, got: String },

    #[error("Value out of range: {field} must be between {min} and {max}, got {value}")]
    ValueOutOfRange {
        field: String,
        min: f64,
        max: f64,
        value: f64,
    },

    #[error("Invalid enum value: {value} is not one of {allowed:?}")]
    InvalidEnumValue {
        value: String,
        allowed: Vec<String>,
    },
}

/// Result type alias for Ember operations
pub type Result<T> = std::result::Result<T, EmberError>;

impl From<toml::de::Error> for EmberError {
    fn from(err: toml::de::Error) -> Self {
        EmberError::TomlParseError(err.to_string())
    }
}

impl EmberError {
    /// Build an `InvalidEnumValue` from a string slice list
    pub fn invalid_enum(value: &str, allowed: &[&str]) -> Self {
        EmberError::InvalidEnumValue {
            value: value.to_string(),
            allowed: allowed.iter().map(|s| s.to_string()).collect(),
        }
    }
}
