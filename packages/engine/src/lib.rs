//! # Lowcode Engine
//!
//! Editing services around the page model.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │ model: Page arena + change events           │
//! └─────────────────────────────────────────────┘
//!                     ↓ page-changed
//! ┌─────────────────────────────────────────────┐
//! │ engine: editor context                      │
//! │  - History (snapshot undo/redo)             │
//! │  - Designer (selection, instances)          │
//! │  - DragAndDrop (from layout)                │
//! │  - PageDocument (load/save)                 │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use lowcode_engine::{Engine, EngineConfig, PageDocument};
//!
//! let config = EngineConfig::load(".")?;
//! let doc = PageDocument::load("page.json")?;
//! let mut engine = Engine::new(config, doc.into_page(), elements);
//!
//! engine.page_mut().delete_node_by_id("n1")?;
//! engine.undo()?;
//! ```

mod config;
mod designer;
mod document;
mod engine;
mod errors;
mod history;

pub use config::{DndConfig, EngineConfig, HistoryConfig, DEFAULT_CONFIG_NAME};
pub use designer::{Designer, DesignerEvent, BREADCRUMB_LEVEL};
pub use document::PageDocument;
pub use engine::Engine;
pub use errors::{EngineError, EngineResult};
pub use history::History;
