use std::path::PathBuf;

use thiserror::Error;

/// The target shape itself cannot be bound, whatever the configuration holds.
#[derive(Debug, Error)]
pub enum ShapeError {
    #[error("Type '{0}' does not have a public constructor")]
    NoPublicConstructor(String),

    #[error("Type '{0}' requires itself through non-nullable parameters and can never be bound")]
    RecursiveShape(String),

    #[error("Cannot construct '{type_name}': {reason}")]
    ArgumentMismatch { type_name: String, reason: String },
}

/// The configuration does not fit the shape.
#[derive(Debug, Error)]
pub enum ConfigurationBindError {
    #[error("Missing configuration key '{key}'. Unable to set {param}.")]
    MissingKey { key: String, param: String },

    #[error("Error converting value '{value}' to {target}. Source: '{key}'")]
    ConversionFailed {
        value: String,
        key: String,
        target: String,
        #[source]
        cause: ParseFailure,
    },

    #[error("Unhandled type '{0}'")]
    UnhandledType(String),
}

/// Why a raw string was rejected by a scalar converter.
#[derive(Debug, Error)]
pub enum ParseFailure {
    #[error(transparent)]
    Integer(#[from] std::num::ParseIntError),

    #[error("value is outside the range of {0}")]
    OutOfRange(&'static str),

    #[error("expected 'true' or 'false'")]
    Boolean,

    #[error(transparent)]
    Decimal(#[from] rust_decimal::Error),

    #[error("digit group separators are not accepted")]
    DigitSeparator,

    #[error(transparent)]
    Float(#[from] std::num::ParseFloatError),

    #[error("value is not a finite number")]
    NonFinite,

    #[error("expected exactly one character")]
    Char,

    #[error("not a recognizable date or date-time")]
    DateTime,

    #[error(transparent)]
    Uri(#[from] url::ParseError),
}

/// Failure while gathering configuration from files or other sources.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("Failed to parse {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("Failed to parse {path}: {source}")]
    JsonError {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("Failed to read {path}: {source}")]
    IoError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error(transparent)]
    Flatten(#[from] crate::flatten::FlattenError),

    #[error("Unsupported config file format: {0} (expected .toml or .json)")]
    UnsupportedFormat(PathBuf),

    #[error("App name is required; call .app_name() on the builder")]
    AppNameRequired,
}

/// Every failure a bind can produce. The first error encountered aborts the bind.
#[derive(Debug, Error)]
pub enum BindError {
    #[error(transparent)]
    Shape(#[from] ShapeError),

    #[error(transparent)]
    Configuration(#[from] ConfigurationBindError),

    #[error(transparent)]
    Source(#[from] SourceError),
}

impl BindError {
    pub(crate) fn mismatch(type_name: &str, reason: impl Into<String>) -> Self {
        ShapeError::ArgumentMismatch {
            type_name: type_name.to_string(),
            reason: reason.into(),
        }
        .into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_key_names_key_and_parameter() {
        let err = ConfigurationBindError::MissingKey {
            key: "MultipleTypes:bar".into(),
            param: "bar".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("MultipleTypes:bar"));
        assert!(msg.contains("Unable to set bar"));
    }

    #[test]
    fn conversion_failed_names_value_target_and_key() {
        let cause = "x".parse::<i32>().unwrap_err();
        let err = ConfigurationBindError::ConversionFailed {
            value: "x".into(),
            key: "App:port".into(),
            target: "i32".into(),
            cause: cause.into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("'x'"));
        assert!(msg.contains("i32"));
        assert!(msg.contains("App:port"));
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn bind_error_is_transparent() {
        let err: BindError = ShapeError::NoPublicConstructor("Hidden".into()).into();
        assert_eq!(err.to_string(), "Type 'Hidden' does not have a public constructor");
    }

    #[test]
    fn app_name_required_formats() {
        let err = SourceError::AppNameRequired;
        assert!(err.to_string().contains("app_name"));
    }
}
