//! # Persisted Page Schema
//!
//! Plain serializable shapes consumed by [`Page::load`](crate::Page::load)
//! and produced by [`Page::export`](crate::Page::export).
//!
//! ```json
//! {
//!   "version": "1.0.0",
//!   "name": "Home",
//!   "componentsTree": { "componentName": "RootContainer", "children": [] },
//!   "componentsMeta": [],
//!   "assets": []
//! }
//! ```
//!
//! Fields the model does not understand are collected in `extra` and written
//! back verbatim on export.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Component name reserved for the page root
pub const ROOT_CONTAINER: &str = "RootContainer";

/// Persisted page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageSchema {
    pub version: String,

    pub name: String,

    pub components_tree: NodeSchema,

    pub components_meta: Vec<ComponentMeta>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assets: Option<Vec<Value>>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl PageSchema {
    /// Minimal page: a root container without children
    pub fn empty(name: impl Into<String>) -> Self {
        Self {
            version: "1.0.0".to_string(),
            name: name.into(),
            components_tree: NodeSchema::new(ROOT_CONTAINER),
            components_meta: Vec::new(),
            assets: Some(Vec::new()),
            extra: Map::new(),
        }
    }
}

/// Material metadata entry (`componentsMeta[]`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentMeta {
    pub component_name: String,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Persisted node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeSchema {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    pub component_name: String,

    #[serde(default)]
    pub props: Map<String, Value>,

    #[serde(default)]
    pub state: Map<String, Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub configure: Option<Value>,

    #[serde(default)]
    pub children: Vec<NodeSchema>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl NodeSchema {
    pub fn new(component_name: impl Into<String>) -> Self {
        Self {
            id: None,
            component_name: component_name.into(),
            props: Map::new(),
            state: Map::new(),
            configure: None,
            children: Vec::new(),
            extra: Map::new(),
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_prop(mut self, name: impl Into<String>, value: Value) -> Self {
        self.props.insert(name.into(), value);
        self
    }

    pub fn with_child(mut self, child: NodeSchema) -> Self {
        self.children.push(child);
        self
    }

    /// Drop every id in this subtree, including nodes nested in slot props
    pub fn strip_ids(&mut self) {
        self.id = None;
        for value in self.props.values_mut() {
            strip_slot_ids(value);
        }
        for child in &mut self.children {
            child.strip_ids();
        }
    }

    /// Visit this node and every descendant, slot content included
    pub fn visit(&self, f: &mut impl FnMut(&NodeSchema)) {
        f(self);
        for value in self.props.values() {
            visit_slot_nodes(value, f);
        }
        for child in &self.children {
            child.visit(f);
        }
    }
}

fn strip_slot_ids(value: &mut Value) {
    match value {
        Value::Array(items) => items.iter_mut().for_each(strip_slot_ids),
        Value::Object(map) => {
            if is_slot_object(map) {
                if let Some(Value::Array(nodes)) = map.get_mut("value") {
                    for node in nodes.iter_mut() {
                        if let Ok(mut schema) = serde_json::from_value::<NodeSchema>(node.clone()) {
                            schema.strip_ids();
                            if let Ok(stripped) = serde_json::to_value(schema) {
                                *node = stripped;
                            }
                        }
                    }
                }
            } else {
                map.values_mut().for_each(strip_slot_ids);
            }
        }
        _ => {}
    }
}

fn visit_slot_nodes(value: &Value, f: &mut impl FnMut(&NodeSchema)) {
    match value {
        Value::Array(items) => items.iter().for_each(|v| visit_slot_nodes(v, f)),
        Value::Object(map) => {
            if is_slot_object(map) {
                if let Some(Value::Array(nodes)) = map.get("value") {
                    for node in nodes {
                        if let Ok(schema) = serde_json::from_value::<NodeSchema>(node.clone()) {
                            schema.visit(f);
                        }
                    }
                }
            } else {
                map.values().for_each(|v| visit_slot_nodes(v, f));
            }
        }
        _ => {}
    }
}

/// Typed prop markers (`{ "type": "...", "value": ... }`)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropKind {
    Plain,
    Function,
    Expression,
    Slot,
}

impl PropKind {
    pub fn of(value: &Value) -> Self {
        let tag = value
            .as_object()
            .and_then(|map| map.get("type"))
            .and_then(Value::as_str);
        match tag {
            Some("SLOT") => PropKind::Slot,
            Some("FUNCTION") => PropKind::Function,
            Some("EXPRESSION") => PropKind::Expression,
            _ => PropKind::Plain,
        }
    }
}

pub(crate) fn is_slot_object(map: &Map<String, Value>) -> bool {
    matches!(map.get("type").and_then(Value::as_str), Some("SLOT"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_unknown_fields_survive() {
        let raw = json!({
            "version": "1.0.0",
            "name": "Home",
            "renderType": "PAGE",
            "componentsMeta": [{ "componentName": "Button", "package": "@lib/ui" }],
            "componentsTree": {
                "id": "root",
                "componentName": "RootContainer",
                "props": {},
                "state": {},
                "children": [],
                "loop": { "data": [] }
            }
        });

        let schema: PageSchema = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(schema.extra.get("renderType"), Some(&json!("PAGE")));
        assert_eq!(
            schema.components_meta[0].extra.get("package"),
            Some(&json!("@lib/ui"))
        );

        let back = serde_json::to_value(&schema).unwrap();
        assert_eq!(back, raw);
    }

    #[test]
    fn test_missing_required_field_fails() {
        let raw = json!({ "version": "1.0.0", "componentsMeta": [] });
        assert!(serde_json::from_value::<PageSchema>(raw).is_err());
    }

    #[test]
    fn test_prop_kind() {
        assert_eq!(PropKind::of(&json!(1)), PropKind::Plain);
        assert_eq!(
            PropKind::of(&json!({ "type": "SLOT", "value": [] })),
            PropKind::Slot
        );
        assert_eq!(
            PropKind::of(&json!({ "type": "FUNCTION", "value": "() => 1" })),
            PropKind::Function
        );
        assert_eq!(
            PropKind::of(&json!({ "type": "EXPRESSION", "value": "$$context.a" })),
            PropKind::Expression
        );
    }

    #[test]
    fn test_strip_ids_reaches_slots() {
        let mut node = NodeSchema::new("Table")
            .with_id("t1")
            .with_prop(
                "header",
                json!({ "type": "SLOT", "value": [{ "id": "s1", "componentName": "Text" }] }),
            )
            .with_child(NodeSchema::new("Row").with_id("r1"));

        node.strip_ids();

        let mut ids = Vec::new();
        node.visit(&mut |n| ids.push(n.id.clone()));
        assert_eq!(ids, vec![None, None, None]);
    }
}
