//! # Engine
//!
//! Explicit editor context handed to every panel and plugin at construction.
//! It owns the page and the services built around it:
//!
//! ```text
//!                 ┌──────────────┐
//!   panels ──────→│    Engine    │←────── renderer (instances, elements)
//!                 └──────┬───────┘
//!        ┌────────────┬──┴─────────┬─────────────┐
//!        ↓            ↓            ↓             ↓
//!      Page        History    DragAndDrop     Designer
//!   (edits +      (snapshots) (targeting)   (selection,
//!    events)                                 instances)
//! ```
//!
//! All structural writes go through `Page` methods, so history and
//! subscribers see every change.

use std::rc::Rc;

use lowcode_layout::{
    DragAndDrop, DragPermission, DropOutcome, ElementId, ElementTree, SensorEvent,
};
use lowcode_model::{Page, PageSchema};
use serde_json::Value;
use tracing::info;

use crate::config::EngineConfig;
use crate::designer::Designer;
use crate::errors::EngineResult;
use crate::history::History;

pub struct Engine {
    config: EngineConfig,
    page: Page,
    history: History,
    dnd: DragAndDrop,
    designer: Designer,
}

impl Engine {
    pub fn new(config: EngineConfig, page: Page, elements: Rc<dyn ElementTree>) -> Self {
        let history = History::attach(&page, config.history.max_levels);
        let dnd = DragAndDrop::new(elements, config.dnd_options());
        info!("engine started on page {}", page.name());

        Self {
            config,
            page,
            history,
            dnd,
            designer: Designer::new(),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn page(&self) -> &Page {
        &self.page
    }

    pub fn page_mut(&mut self) -> &mut Page {
        &mut self.page
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn dnd(&self) -> &DragAndDrop {
        &self.dnd
    }

    pub fn designer(&self) -> &Designer {
        &self.designer
    }

    // ------------------------------------------------------------------
    // Host façade
    // ------------------------------------------------------------------

    /// Select a node; unknown ids clear the selection
    pub fn select_node(&mut self, id: Option<&str>) -> Option<String> {
        self.designer.select_node(&self.page, id)
    }

    pub fn selected_node_id(&self) -> Option<String> {
        self.designer.selected_node_id(&self.page)
    }

    /// Replace the page with `schema` as a recorded edit
    pub fn update_page(&mut self, schema: PageSchema) -> EngineResult<()> {
        self.page.replace(schema)?;
        self.designer.prune(&self.page);
        Ok(())
    }

    /// Swap the asset list and re-render without recording a step
    pub fn reload(&mut self, assets: Vec<Value>) -> EngineResult<()> {
        let mut schema = self.page.export();
        schema.assets = Some(assets);
        self.page.reload(schema)?;
        Ok(())
    }

    pub fn get_component_instances(&self, id: &str) -> &[ElementId] {
        self.designer.get_component_instances(id)
    }

    pub fn register_instance(&mut self, id: impl Into<String>, element: ElementId) {
        self.designer.register_instance(id, element);
    }

    pub fn unregister_instance(&mut self, id: &str, element: ElementId) -> bool {
        self.designer.unregister_instance(id, element)
    }

    // ------------------------------------------------------------------
    // History
    // ------------------------------------------------------------------

    pub fn undo(&mut self) -> EngineResult<bool> {
        let moved = self.history.pre_step(&mut self.page)?;
        self.designer.prune(&self.page);
        Ok(moved)
    }

    pub fn redo(&mut self) -> EngineResult<bool> {
        let moved = self.history.next_step(&mut self.page)?;
        self.designer.prune(&self.page);
        Ok(moved)
    }

    pub fn reset_history(&mut self) -> EngineResult<()> {
        self.history.reset(&mut self.page)?;
        self.designer.prune(&self.page);
        Ok(())
    }

    // ------------------------------------------------------------------
    // Drag and drop
    // ------------------------------------------------------------------

    pub async fn can_drag(&self, event: SensorEvent) -> EngineResult<Option<DragPermission>> {
        Ok(self.dnd.can_drag(&self.page, event).await?)
    }

    pub fn can_drop(&self, event: SensorEvent) -> SensorEvent {
        self.dnd.can_drop(&self.page, event)
    }

    /// Finish the gesture; an accepted drop becomes one history step
    pub fn drop_node(&mut self) -> EngineResult<DropOutcome> {
        Ok(self.dnd.drop(&mut self.page)?)
    }

    /// Tear down: end any gesture and stop recording history
    pub fn shutdown(&mut self) {
        self.dnd.detach();
        self.history.detach(&self.page);
        info!("engine on page {} shut down", self.page.name());
    }
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("page", &self.page.name())
            .field("history", &self.history.len())
            .field("dnd", &self.dnd)
            .finish()
    }
}
