//! Error types for the engine

use lowcode_layout::DragError;
use lowcode_model::ModelError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Model error: {0}")]
    Model(#[from] ModelError),

    #[error("Drag error: {0}")]
    Drag(#[from] DragError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Document is not file-backed")]
    NotFileBacked,
}

pub type EngineResult<T> = Result<T, EngineError>;
