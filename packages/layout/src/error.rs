//! Error types for drag and drop

use lowcode_model::ModelError;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum DragError {
    #[error("drag permission for node {node_id} did not resolve within {timeout_ms}ms")]
    PermissionTimeout { node_id: String, timeout_ms: u64 },

    #[error("Model error: {0}")]
    Model(#[from] ModelError),
}

pub type DragResult<T> = Result<T, DragError>;
