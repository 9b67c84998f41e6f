//! # Materials
//!
//! Per-component drag and drop behaviour registered by the host: whether a
//! component accepts children, an optional async predicate deciding if an
//! instance may be dragged, and an optional veto on drops into it.

use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::rc::Rc;

use futures::future::{FutureExt, LocalBoxFuture};
use lowcode_model::{InsertPosition, NodeRef, NodeSchema, ROOT_CONTAINER};

/// Async drag permission. Receives the exported subtree of the node.
pub type DragPredicate = Rc<dyn Fn(&NodeSchema) -> LocalBoxFuture<'static, bool>>;

/// Synchronous drop veto; `false` rejects the drop
pub type DropVeto = Rc<dyn Fn(&DropCandidate<'_>) -> bool>;

/// A drop about to be offered to the target's material
#[derive(Debug, Clone, Copy)]
pub struct DropCandidate<'a> {
    pub source: NodeRef<'a>,
    pub target: NodeRef<'a>,
    pub position: InsertPosition,
}

#[derive(Clone, Default)]
pub struct Material {
    pub component_name: String,
    pub is_container: bool,
    on_drag: Option<DragPredicate>,
    on_drop: Option<DropVeto>,
}

impl Material {
    pub fn new(component_name: impl Into<String>) -> Self {
        Self {
            component_name: component_name.into(),
            ..Self::default()
        }
    }

    pub fn container(mut self, is_container: bool) -> Self {
        self.is_container = is_container;
        self
    }

    pub fn with_drag_predicate<F, Fut>(mut self, predicate: F) -> Self
    where
        F: Fn(&NodeSchema) -> Fut + 'static,
        Fut: Future<Output = bool> + 'static,
    {
        self.on_drag = Some(Rc::new(
            move |schema: &NodeSchema| -> LocalBoxFuture<'static, bool> {
                predicate(schema).boxed_local()
            },
        ));
        self
    }

    pub fn with_drop_veto(mut self, veto: impl Fn(&DropCandidate<'_>) -> bool + 'static) -> Self {
        self.on_drop = Some(Rc::new(veto));
        self
    }

    pub fn drag_predicate(&self) -> Option<DragPredicate> {
        self.on_drag.clone()
    }

    pub fn accepts_drop(&self, candidate: &DropCandidate<'_>) -> bool {
        self.on_drop.as_ref().map_or(true, |veto| veto(candidate))
    }
}

impl fmt::Debug for Material {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Material")
            .field("component_name", &self.component_name)
            .field("is_container", &self.is_container)
            .field("on_drag", &self.on_drag.is_some())
            .field("on_drop", &self.on_drop.is_some())
            .finish()
    }
}

/// Materials keyed by component name
#[derive(Debug, Clone, Default)]
pub struct MaterialRegistry {
    materials: HashMap<String, Material>,
}

impl MaterialRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a material, replacing any previous one for the component
    pub fn register(&mut self, material: Material) -> Option<Material> {
        self.materials
            .insert(material.component_name.clone(), material)
    }

    pub fn unregister(&mut self, component_name: &str) -> Option<Material> {
        self.materials.remove(component_name)
    }

    pub fn get(&self, component_name: &str) -> Option<&Material> {
        self.materials.get(component_name)
    }

    /// The root container always accepts children; unknown components never do
    pub fn is_container(&self, component_name: &str) -> bool {
        component_name == ROOT_CONTAINER
            || self
                .materials
                .get(component_name)
                .is_some_and(|m| m.is_container)
    }

    pub fn len(&self) -> usize {
        self.materials.len()
    }

    pub fn is_empty(&self) -> bool {
        self.materials.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_container_lookup() {
        let mut registry = MaterialRegistry::new();
        registry.register(Material::new("Row").container(true));
        registry.register(Material::new("Button"));

        assert!(registry.is_container("Row"));
        assert!(!registry.is_container("Button"));
        assert!(!registry.is_container("Unknown"));
        assert!(registry.is_container(ROOT_CONTAINER));
    }

    #[test]
    fn test_register_replaces() {
        let mut registry = MaterialRegistry::new();
        assert!(registry.register(Material::new("Row")).is_none());
        let previous = registry.register(Material::new("Row").container(true));
        assert!(previous.is_some_and(|m| !m.is_container));
        assert_eq!(registry.len(), 1);
    }

    #[tokio::test]
    async fn test_drag_predicate_is_boxed() {
        let material = Material::new("Locked").with_drag_predicate(|schema| {
            let allowed = schema.props.get("locked").is_none();
            async move { allowed }
        });

        let predicate = material.drag_predicate().unwrap();
        assert!(predicate(&NodeSchema::new("Locked")).await);
        let locked = NodeSchema::new("Locked").with_prop("locked", serde_json::json!(true));
        assert!(!predicate(&locked).await);
    }
}
