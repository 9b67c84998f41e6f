//! # Element Tree
//!
//! The rendered UI the pointer moves over. The renderer tags each element
//! that renders a model node with the node id attribute; everything else in
//! between (wrappers, text runs, icons) is untagged.
//!
//! The engine only needs three queries from the host: parent, attribute and
//! live bounding rect. [`StaticElementTree`] answers them from memory for
//! headless hosts and tests.

use std::collections::HashMap;

use crate::geometry::Rect;
use crate::position::Orientation;

/// Default attribute carrying the model node id on rendered elements
pub const NODE_ID_ATTRIBUTE: &str = "data-node-id";

/// Opaque handle to a rendered element
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ElementId(pub u64);

/// Read-only view over the rendered element hierarchy
pub trait ElementTree {
    fn parent(&self, element: ElementId) -> Option<ElementId>;

    fn attribute(&self, element: ElementId, name: &str) -> Option<String>;

    /// Current bounding box. Queried on every pointer move since targets
    /// may scroll or animate.
    fn bounding_rect(&self, element: ElementId) -> Option<Rect>;

    /// Layout direction of the element's siblings, if the host knows it
    fn layout_axis(&self, _element: ElementId) -> Option<Orientation> {
        None
    }
}

/// True if `element` is `container` or nested inside it
pub fn encloses(tree: &dyn ElementTree, container: ElementId, element: ElementId) -> bool {
    ancestry(tree, element).any(|el| el == container)
}

/// The element itself, then each parent up to the document root
pub fn ancestry(tree: &dyn ElementTree, element: ElementId) -> impl Iterator<Item = ElementId> + '_ {
    std::iter::successors(Some(element), move |el| tree.parent(*el))
}

/// Node id rendered at `element`, together with the element that carries it.
///
/// Walks up from the event target to the closest tagged element, never past
/// `container`.
pub fn resolve_node_id(
    tree: &dyn ElementTree,
    element: ElementId,
    container: ElementId,
    attribute: &str,
) -> Option<(String, ElementId)> {
    for el in ancestry(tree, element) {
        if let Some(id) = tree.attribute(el, attribute) {
            return Some((id, el));
        }
        if el == container {
            break;
        }
    }
    None
}

#[derive(Debug, Clone, Default)]
struct ElementRecord {
    parent: Option<ElementId>,
    attributes: HashMap<String, String>,
    rect: Rect,
    axis: Option<Orientation>,
}

/// In-memory element tree
#[derive(Debug, Clone, Default)]
pub struct StaticElementTree {
    elements: HashMap<ElementId, ElementRecord>,
}

impl StaticElementTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, element: ElementId, parent: Option<ElementId>, rect: Rect) -> &mut Self {
        self.elements.insert(
            element,
            ElementRecord {
                parent,
                rect,
                ..ElementRecord::default()
            },
        );
        self
    }

    /// Tag `element` as rendering `node_id` under the default attribute
    pub fn tag_node(&mut self, element: ElementId, node_id: impl Into<String>) -> &mut Self {
        self.set_attribute(element, NODE_ID_ATTRIBUTE, node_id)
    }

    pub fn set_attribute(
        &mut self,
        element: ElementId,
        name: impl Into<String>,
        value: impl Into<String>,
    ) -> &mut Self {
        if let Some(record) = self.elements.get_mut(&element) {
            record.attributes.insert(name.into(), value.into());
        }
        self
    }

    pub fn set_rect(&mut self, element: ElementId, rect: Rect) -> &mut Self {
        if let Some(record) = self.elements.get_mut(&element) {
            record.rect = rect;
        }
        self
    }

    pub fn set_axis(&mut self, element: ElementId, axis: Orientation) -> &mut Self {
        if let Some(record) = self.elements.get_mut(&element) {
            record.axis = Some(axis);
        }
        self
    }

    /// Remove an element and everything below it
    pub fn remove(&mut self, element: ElementId) {
        let tree: &StaticElementTree = self;
        let doomed: Vec<ElementId> = tree
            .elements
            .keys()
            .copied()
            .filter(|el| encloses(tree, element, *el))
            .collect();
        for el in doomed {
            self.elements.remove(&el);
        }
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }
}

impl ElementTree for StaticElementTree {
    fn parent(&self, element: ElementId) -> Option<ElementId> {
        self.elements.get(&element)?.parent
    }

    fn attribute(&self, element: ElementId, name: &str) -> Option<String> {
        self.elements.get(&element)?.attributes.get(name).cloned()
    }

    fn bounding_rect(&self, element: ElementId) -> Option<Rect> {
        self.elements.get(&element).map(|r| r.rect)
    }

    fn layout_axis(&self, element: ElementId) -> Option<Orientation> {
        self.elements.get(&element)?.axis
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // 1 (container) > 2 [root] > 3 [a] > 4 (icon)
    fn tree() -> StaticElementTree {
        let mut tree = StaticElementTree::new();
        tree.insert(ElementId(1), None, Rect::new(0.0, 0.0, 500.0, 500.0))
            .insert(ElementId(2), Some(ElementId(1)), Rect::new(0.0, 0.0, 500.0, 500.0))
            .insert(ElementId(3), Some(ElementId(2)), Rect::new(0.0, 0.0, 100.0, 40.0))
            .insert(ElementId(4), Some(ElementId(3)), Rect::new(2.0, 2.0, 16.0, 16.0))
            .tag_node(ElementId(2), "root")
            .tag_node(ElementId(3), "a");
        tree
    }

    #[test]
    fn test_resolve_walks_to_closest_tagged_ancestor() {
        let tree = tree();
        let resolved = resolve_node_id(&tree, ElementId(4), ElementId(1), NODE_ID_ATTRIBUTE);
        assert_eq!(resolved, Some(("a".to_string(), ElementId(3))));
    }

    #[test]
    fn test_resolve_stops_at_container() {
        let tree = tree();
        // container is the "a" element: untagged parents above are never seen
        assert_eq!(
            resolve_node_id(&tree, ElementId(4), ElementId(3), NODE_ID_ATTRIBUTE),
            Some(("a".to_string(), ElementId(3)))
        );
        assert_eq!(
            resolve_node_id(&tree, ElementId(4), ElementId(4), NODE_ID_ATTRIBUTE),
            None
        );
    }

    #[test]
    fn test_encloses() {
        let tree = tree();
        assert!(encloses(&tree, ElementId(1), ElementId(4)));
        assert!(encloses(&tree, ElementId(3), ElementId(3)));
        assert!(!encloses(&tree, ElementId(3), ElementId(2)));
    }

    #[test]
    fn test_remove_drops_subtree() {
        let mut tree = tree();
        tree.remove(ElementId(3));
        assert_eq!(tree.len(), 2);
        assert!(tree.bounding_rect(ElementId(4)).is_none());
    }
}
