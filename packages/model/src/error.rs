//! Error types for the page model

use thiserror::Error;

/// Errors raised by the node/page model.
///
/// Most "can't do that" conditions never reach callers as errors: the public
/// page operations report them as `false`/`None` and only the `try_*`
/// variants surface them. `Validation` is returned alongside a fallback page
/// when a schema fails to load.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ModelError {
    #[error("Invalid page schema: {0}")]
    Validation(String),

    #[error("Node not found: {0}")]
    NotFound(String),

    #[error("Structural violation: {0}")]
    StructuralViolation(String),

    #[error("Corrupt page model: {0}")]
    Corrupt(String),
}

impl ModelError {
    pub fn validation(message: impl Into<String>) -> Self {
        ModelError::Validation(message.into())
    }

    pub fn structural(message: impl Into<String>) -> Self {
        ModelError::StructuralViolation(message.into())
    }

    /// True for the conditions the public API treats as silent no-ops
    pub fn is_expected(&self) -> bool {
        matches!(
            self,
            ModelError::NotFound(_) | ModelError::StructuralViolation(_)
        )
    }
}

impl From<serde_json::Error> for ModelError {
    fn from(e: serde_json::Error) -> Self {
        ModelError::Validation(e.to_string())
    }
}

/// Result alias for model operations
pub type ModelResult<T> = Result<T, ModelError>;
