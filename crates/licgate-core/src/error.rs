use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GateError {
    #[error("malformed license expression '{expression}': {reason}")]
    MalformedExpression { expression: String, reason: String },

    #[error("license query failed for feature '{feature}': {reason}")]
    Query { feature: String, reason: String },

    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("configuration file does not exist: {}", .0.display())]
    ConfigNotFound(PathBuf),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),
}

impl GateError {
    pub(crate) fn malformed(expression: &str, reason: impl Into<String>) -> Self {
        GateError::MalformedExpression {
            expression: expression.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn query(feature: &str, reason: impl Into<String>) -> Self {
        GateError::Query {
            feature: feature.to_string(),
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, GateError>;
