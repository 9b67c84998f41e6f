//! # Designer State
//!
//! Selection and the renderer's component-instance registry.
//!
//! The renderer registers every element it renders for a node, so panels
//! can ask for the live instances of a node (to highlight or measure them).
//! Selection is validated against the page on read: a selected node that an
//! edit or undo removed simply reads as "nothing selected".

use std::collections::HashMap;

use lowcode_layout::ElementId;
use lowcode_model::{Emitter, Page, SubscriptionId, Topic};
use tracing::debug;

/// Closest-node list depth used for selection breadcrumbs
pub const BREADCRUMB_LEVEL: usize = 5;

#[derive(Debug, Clone, PartialEq)]
pub enum DesignerEvent {
    SelectionChanged { id: Option<String> },
}

impl Topic for DesignerEvent {
    fn topic(&self) -> &'static str {
        match self {
            DesignerEvent::SelectionChanged { .. } => "selection-changed",
        }
    }
}

#[derive(Debug, Default)]
pub struct Designer {
    selected: Option<String>,
    instances: HashMap<String, Vec<ElementId>>,
    emitter: Emitter<DesignerEvent>,
}

impl Designer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Select a node. Unknown ids (and `None`) clear the selection.
    pub fn select_node(&mut self, page: &Page, id: Option<&str>) -> Option<String> {
        let next = id.filter(|id| page.has_node(id)).map(str::to_string);
        if id.is_some() && next.is_none() {
            debug!("selecting unknown node {:?}, selection cleared", id);
        }
        if next != self.selected {
            self.selected = next.clone();
            self.emitter.emit(
                DesignerEvent::SelectionChanged { id: next.clone() },
                &(),
            );
        }
        next
    }

    /// Selected node, if it still exists in `page`
    pub fn selected_node_id(&self, page: &Page) -> Option<String> {
        self.selected.clone().filter(|id| page.has_node(id))
    }

    /// Selected node followed by its closest ancestors
    pub fn selection_path(&self, page: &Page) -> Vec<String> {
        self.selected_node_id(page)
            .map(|id| {
                page.ancestors(&id, BREADCRUMB_LEVEL)
                    .into_iter()
                    .map(|node| node.id().to_string())
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn on_selection_change(
        &self,
        handler: impl Fn(&DesignerEvent, &()) + 'static,
    ) -> SubscriptionId {
        self.emitter.on_any(handler)
    }

    pub fn off(&self, id: SubscriptionId) -> bool {
        self.emitter.off(id)
    }

    // ------------------------------------------------------------------
    // Component instances
    // ------------------------------------------------------------------

    pub fn register_instance(&mut self, node_id: impl Into<String>, element: ElementId) {
        let list = self.instances.entry(node_id.into()).or_default();
        if !list.contains(&element) {
            list.push(element);
        }
    }

    pub fn unregister_instance(&mut self, node_id: &str, element: ElementId) -> bool {
        let Some(list) = self.instances.get_mut(node_id) else {
            return false;
        };
        let before = list.len();
        list.retain(|el| *el != element);
        let removed = list.len() != before;
        if list.is_empty() {
            self.instances.remove(node_id);
        }
        removed
    }

    /// Rendered instances of a node, in registration order
    pub fn get_component_instances(&self, node_id: &str) -> &[ElementId] {
        self.instances
            .get(node_id)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Forget instances of nodes no longer in `page`
    pub fn prune(&mut self, page: &Page) {
        self.instances.retain(|id, _| page.has_node(id));
    }

    pub fn instance_count(&self) -> usize {
        self.instances.values().map(Vec::len).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn page() -> Page {
        let (page, _) = Page::load(json!({
            "version": "1.0.0",
            "name": "Designer",
            "componentsMeta": [],
            "componentsTree": {
                "id": "root",
                "componentName": "RootContainer",
                "children": [
                    { "id": "row", "componentName": "Row", "children": [
                        { "id": "btn", "componentName": "Button" }
                    ]}
                ]
            }
        }));
        page
    }

    #[test]
    fn test_select_and_clear() {
        let page = page();
        let mut designer = Designer::new();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let s = seen.clone();
        designer.on_selection_change(move |event, _| s.borrow_mut().push(event.clone()));

        assert_eq!(designer.select_node(&page, Some("btn")), Some("btn".into()));
        assert_eq!(designer.selected_node_id(&page), Some("btn".into()));
        assert_eq!(designer.selection_path(&page), vec!["btn", "row", "root"]);

        // same selection again is not an event
        designer.select_node(&page, Some("btn"));
        assert_eq!(designer.select_node(&page, Some("ghost")), None);
        assert_eq!(designer.selected_node_id(&page), None);

        assert_eq!(
            *seen.borrow(),
            vec![
                DesignerEvent::SelectionChanged { id: Some("btn".into()) },
                DesignerEvent::SelectionChanged { id: None },
            ]
        );
    }

    #[test]
    fn test_selection_of_deleted_node_reads_empty() {
        let mut page = page();
        let mut designer = Designer::new();
        designer.select_node(&page, Some("btn"));

        page.delete_node_by_id("row").unwrap();
        assert_eq!(designer.selected_node_id(&page), None);
        assert!(designer.selection_path(&page).is_empty());
    }

    #[test]
    fn test_instances() {
        let mut page = page();
        let mut designer = Designer::new();

        designer.register_instance("btn", ElementId(1));
        designer.register_instance("btn", ElementId(2));
        designer.register_instance("btn", ElementId(1));
        assert_eq!(designer.get_component_instances("btn"), &[ElementId(1), ElementId(2)]);
        assert!(designer.get_component_instances("row").is_empty());

        assert!(designer.unregister_instance("btn", ElementId(1)));
        assert!(!designer.unregister_instance("btn", ElementId(1)));

        page.delete_node_by_id("btn").unwrap();
        designer.prune(&page);
        assert_eq!(designer.instance_count(), 0);
    }
}
