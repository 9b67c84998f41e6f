//! # Page Document
//!
//! A page plus where it came from.
//!
//! - **Memory-backed**: built from JSON text, for tests and hosts that
//!   persist pages themselves
//! - **File-backed**: read from and written back to a `.json` file
//!
//! Malformed sources never fail to load: the document opens the empty page
//! and keeps the validation error in [`PageDocument::load_error`] so the
//! caller can report it.
//!
//! ```text
//! Load → Page::load → Edit → export → Save
//! ```

use std::cell::Cell;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use lowcode_model::{topics, ModelError, Page, PageSchema};
use tracing::{info, warn};

use crate::errors::{EngineError, EngineResult};

#[derive(Debug)]
pub struct PageDocument {
    path: Option<PathBuf>,
    page: Page,
    load_error: Option<ModelError>,
    dirty: Rc<Cell<bool>>,
}

impl PageDocument {
    /// Memory-backed document from JSON text
    pub fn from_source(source: &str) -> Self {
        let (page, load_error) = Page::from_json_str(source);
        Self::wrap(None, page, load_error)
    }

    /// Memory-backed document from an existing page
    pub fn from_page(page: Page) -> Self {
        Self::wrap(None, page, None)
    }

    /// File-backed document
    pub fn load(path: impl Into<PathBuf>) -> EngineResult<Self> {
        let path = path.into();
        let source = std::fs::read_to_string(&path)?;
        let (page, load_error) = Page::from_json_str(&source);
        if let Some(err) = &load_error {
            warn!("{} is not a valid page: {}", path.display(), err);
        }
        Ok(Self::wrap(Some(path), page, load_error))
    }

    fn wrap(path: Option<PathBuf>, page: Page, load_error: Option<ModelError>) -> Self {
        let dirty = Rc::new(Cell::new(false));
        let flag = Rc::clone(&dirty);
        page.on(topics::PAGE_CHANGED, move |_, _| flag.set(true));

        Self {
            path,
            page,
            load_error,
            dirty,
        }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn page(&self) -> &Page {
        &self.page
    }

    pub fn page_mut(&mut self) -> &mut Page {
        &mut self.page
    }

    pub fn into_page(self) -> Page {
        self.page
    }

    /// Validation error hit while loading, if the empty page was used
    pub fn load_error(&self) -> Option<&ModelError> {
        self.load_error.as_ref()
    }

    /// Check if the page changed since load or the last save
    pub fn is_dirty(&self) -> bool {
        self.dirty.get()
    }

    pub fn export(&self) -> PageSchema {
        self.page.export()
    }

    /// Pretty JSON of the current page
    pub fn to_json(&self) -> EngineResult<String> {
        Ok(serde_json::to_string_pretty(&self.page.export())?)
    }

    /// Write back to the file the document was loaded from
    pub fn save(&mut self) -> EngineResult<()> {
        let path = self.path.clone().ok_or(EngineError::NotFileBacked)?;
        self.write_to(&path)
    }

    /// Write to `path` and make it the document's file
    pub fn save_as(&mut self, path: impl Into<PathBuf>) -> EngineResult<()> {
        let path = path.into();
        self.write_to(&path)?;
        self.path = Some(path);
        Ok(())
    }

    fn write_to(&mut self, path: &Path) -> EngineResult<()> {
        let json = self.to_json()?;
        std::fs::write(path, json + "\n")?;
        self.dirty.set(false);
        info!("saved page {} to {}", self.page.name(), path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const SOURCE: &str = r#"{
        "version": "1.0.0",
        "name": "Doc",
        "componentsMeta": [],
        "componentsTree": {
            "id": "root",
            "componentName": "RootContainer",
            "children": [{ "id": "n1", "componentName": "Text" }]
        }
    }"#;

    #[test]
    fn test_document_from_source() {
        let doc = PageDocument::from_source(SOURCE);
        assert!(doc.load_error().is_none());
        assert_eq!(doc.page().name(), "Doc");
        assert!(!doc.is_dirty());
        assert!(doc.path().is_none());
    }

    #[test]
    fn test_invalid_source_opens_empty_page() {
        let doc = PageDocument::from_source(r#"{ "name": "broken" }"#);
        assert!(doc.load_error().is_some());
        assert_eq!(doc.page().node_count(), 1);
    }

    #[test]
    fn test_edits_mark_dirty() {
        let mut doc = PageDocument::from_source(SOURCE);
        doc.page_mut().delete_node_by_id("missing").unwrap();
        assert!(!doc.is_dirty());
        doc.page_mut().delete_node_by_id("n1").unwrap();
        assert!(doc.is_dirty());
    }

    #[test]
    fn test_memory_document_cannot_save() {
        let mut doc = PageDocument::from_source(SOURCE);
        assert!(matches!(doc.save(), Err(EngineError::NotFileBacked)));
    }

    #[test]
    fn test_save_and_reload() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("page.json");
        let mut doc = PageDocument::from_source(SOURCE);
        doc.page_mut().delete_node_by_id("n1").unwrap();
        doc.save_as(&path).unwrap();
        assert!(!doc.is_dirty());

        let reopened = PageDocument::load(&path).unwrap();
        assert_eq!(reopened.export(), doc.export());
        assert_eq!(reopened.page().root().children().len(), 0);
        assert_eq!(reopened.path(), Some(path.as_path()));
    }
}
