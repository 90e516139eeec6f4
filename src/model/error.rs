use crate::model::{ConfigurationKey, Scope, ValueShape};

/// A value was rejected before anything was written
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("unknown configuration key '{0}'")]
    UnknownKey(String),

    #[error("configuration '{key}' expects a {expected} value, got a {actual}")]
    ShapeMismatch {
        key: ConfigurationKey,
        expected: ValueShape,
        actual: ValueShape,
    },

    #[error("configuration '{key}' cannot be stored under {scope}")]
    ScopeNotAllowed { key: ConfigurationKey, scope: Scope },

    #[error("configuration '{key}' names a blank entity")]
    BlankEntity { key: ConfigurationKey },

    #[error("configuration '{key}' cannot turn {base} field '{field}' into {requested}")]
    IncompatibleType {
        key: ConfigurationKey,
        field: String,
        base: String,
        requested: String,
    },

    #[error("configuration '{key}' lists '{entry}' more than once")]
    DuplicateEntry { key: ConfigurationKey, entry: String },

    #[error("configuration '{key}' is malformed: {reason}")]
    Malformed { key: ConfigurationKey, reason: String },
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The persistence layer failed the write; nothing was applied
    #[error("persistence failed: {0:#}")]
    Persistence(anyhow::Error),
}

impl ConfigError {
    pub fn is_validation(&self) -> bool {
        matches!(self, ConfigError::Validation(_))
    }
}
