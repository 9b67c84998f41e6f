//! # Page Model
//!
//! The aggregate root of an editing session. A page owns the node arena,
//! answers id lookups against the live tree and exports back to the
//! persisted [`PageSchema`] shape.
//!
//! ## Mutation rules
//!
//! - Every mutation finishes before any listener runs
//! - Each mutation emits exactly one `page-changed`, after any node- or
//!   prop-scoped events
//! - `reload` swaps the whole tree and emits `page-reloaded` instead, so
//!   history replays are not recorded as edits
//! - Unknown ids, root deletion/moves and cycle-creating moves are no-ops
//!   (`Ok(false)` / `Ok(None)`); only a corrupt arena is an `Err`
//!
//! ## Example
//!
//! ```rust,ignore
//! let (mut page, err) = Page::load(json);
//! if let Some(err) = err {
//!     tracing::warn!("falling back to empty page: {}", err);
//! }
//! page.delete_node_by_id("n1")?;
//! let schema = page.export();
//! ```

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, error, warn};

use crate::emitter::{Emitter, SubscriptionId};
use crate::error::{ModelError, ModelResult};
use crate::events::{ChangeCause, ModelEvent, NodeValue};
use crate::id_generator::IdGenerator;
use crate::node::{Node, NodePatch, NodeRef, ParentRef};
use crate::prop::{escape_segment, join_path, split_path, PropValue, Props, Slot};
use crate::schema::{is_slot_object, ComponentMeta, NodeSchema, PageSchema, ROOT_CONTAINER};

/// Where a node lands relative to a target node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InsertPosition {
    Before,
    After,
    Inside,
}

/// Name given to the fallback page
pub const EMPTY_PAGE_NAME: &str = "EmptyPage";

/// Editable page
#[derive(Debug)]
pub struct Page {
    version: String,
    name: String,
    root: String,
    nodes: HashMap<String, Node>,
    components_meta: Vec<ComponentMeta>,
    assets: Option<Vec<Value>>,
    extra: Map<String, Value>,
    ids: IdGenerator,
    emitter: Emitter<ModelEvent, Page>,
}

impl Page {
    /// Build a page from a typed schema
    pub fn from_schema(schema: PageSchema) -> ModelResult<Self> {
        let ids = IdGenerator::new(&schema.name);
        Self::build(schema, ids)
    }

    fn build(schema: PageSchema, ids: IdGenerator) -> ModelResult<Self> {
        let root_name = &schema.components_tree.component_name;
        if root_name != ROOT_CONTAINER {
            return Err(ModelError::validation(format!(
                "componentsTree.componentName must be {}, got {}",
                ROOT_CONTAINER, root_name
            )));
        }

        let mut page = Self {
            version: schema.version,
            ids,
            name: schema.name,
            root: String::new(),
            nodes: HashMap::new(),
            components_meta: schema.components_meta,
            assets: schema.assets,
            extra: schema.extra,
            emitter: Emitter::new(),
        };
        page.root = page.import_node(schema.components_tree, None);
        Ok(page)
    }

    /// Load from untyped JSON. Malformed input never fails: the empty page
    /// is returned together with the validation error for the caller to log.
    pub fn load(value: Value) -> (Self, Option<ModelError>) {
        let result = serde_json::from_value::<PageSchema>(value)
            .map_err(ModelError::from)
            .and_then(Self::from_schema);

        match result {
            Ok(page) => (page, None),
            Err(e) => {
                warn!("page schema rejected, using empty page: {}", e);
                (Self::empty(), Some(e))
            }
        }
    }

    /// Load from JSON text, with the same fallback as [`Page::load`]
    pub fn from_json_str(source: &str) -> (Self, Option<ModelError>) {
        match serde_json::from_str::<Value>(source) {
            Ok(value) => Self::load(value),
            Err(e) => {
                warn!("page source is not JSON, using empty page: {}", e);
                (Self::empty(), Some(ModelError::from(e)))
            }
        }
    }

    /// Minimal page with a childless root
    pub fn empty() -> Self {
        Self::from_schema(PageSchema::empty(EMPTY_PAGE_NAME))
            .unwrap_or_else(|_| unreachable!("the empty schema always has a root container"))
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn components_meta(&self) -> &[ComponentMeta] {
        &self.components_meta
    }

    pub fn assets(&self) -> &[Value] {
        self.assets.as_deref().unwrap_or(&[])
    }

    /// Replace the runtime asset list. Not an edit: no event is emitted.
    pub fn set_assets(&mut self, assets: Vec<Value>) {
        self.assets = Some(assets);
    }

    pub fn root_id(&self) -> &str {
        &self.root
    }

    pub fn root(&self) -> NodeRef<'_> {
        match self.get_node(&self.root) {
            Some(root) => root,
            None => unreachable!("page root is never removed from the arena"),
        }
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Look up a node in the live tree
    pub fn get_node(&self, id: &str) -> Option<NodeRef<'_>> {
        self.nodes.get(id).map(|node| NodeRef::new(self, node))
    }

    pub fn has_node(&self, id: &str) -> bool {
        self.nodes.contains_key(id)
    }

    // ------------------------------------------------------------------
    // Navigation
    // ------------------------------------------------------------------

    /// True if `id` is `ancestor` itself or one of its transitive
    /// descendants (slot content included)
    pub fn contains(&self, ancestor: &str, id: &str) -> bool {
        if !self.nodes.contains_key(ancestor) {
            return false;
        }

        let mut current = self.nodes.get(id);
        let mut steps = 0;
        while let Some(node) = current {
            if node.id == ancestor {
                return true;
            }
            steps += 1;
            if steps > self.nodes.len() {
                error!("parent links form a cycle at node {}", node.id);
                return false;
            }
            current = node.parent.as_ref().and_then(|p| self.nodes.get(p.owner()));
        }
        false
    }

    pub fn parent_of(&self, id: &str) -> Option<NodeRef<'_>> {
        self.get_node(id)?.parent_node()
    }

    pub fn children_of(&self, id: &str) -> Vec<NodeRef<'_>> {
        self.get_node(id)
            .map(|node| node.child_nodes().collect())
            .unwrap_or_default()
    }

    /// Position of a node in the list holding it
    pub fn index_in_parent(&self, id: &str) -> Option<usize> {
        let parent = self.nodes.get(id)?.parent.as_ref()?;
        self.holding_list(parent)?.iter().position(|c| c == id)
    }

    /// The node itself followed by its closest ancestors, at most `level`
    /// entries
    pub fn ancestors(&self, id: &str, level: usize) -> Vec<NodeRef<'_>> {
        let mut out = Vec::new();
        let mut current = self.get_node(id);
        while let Some(node) = current {
            if out.len() >= level {
                break;
            }
            current = node.parent_node();
            out.push(node);
        }
        out
    }

    /// Pre-order ids of a subtree, slot content included
    pub fn descendants(&self, id: &str) -> Vec<String> {
        let mut out = Vec::new();
        let mut stack = vec![id.to_string()];
        while let Some(current) = stack.pop() {
            if let Some(node) = self.nodes.get(&current) {
                stack.extend(node.owned_ids().into_iter().rev());
                out.push(current);
            }
        }
        out
    }

    /// Visit every node of the page in pre-order
    pub fn walk<'a>(&'a self, mut f: impl FnMut(NodeRef<'a>)) {
        for id in self.descendants(&self.root) {
            if let Some(node) = self.get_node(&id) {
                f(node);
            }
        }
    }

    pub fn nodes_by_component(&self, component_name: &str) -> Vec<NodeRef<'_>> {
        let mut out = Vec::new();
        self.walk(|node| {
            if node.component_name() == component_name {
                out.push(node);
            }
        });
        out
    }

    // ------------------------------------------------------------------
    // Events
    // ------------------------------------------------------------------

    pub fn emitter(&self) -> &Emitter<ModelEvent, Page> {
        &self.emitter
    }

    pub fn on(
        &self,
        topic: &'static str,
        handler: impl Fn(&ModelEvent, &Page) + 'static,
    ) -> SubscriptionId {
        self.emitter.on(topic, handler)
    }

    pub fn on_any(&self, handler: impl Fn(&ModelEvent, &Page) + 'static) -> SubscriptionId {
        self.emitter.on_any(handler)
    }

    /// Subscribe to node-changed events of a single node
    pub fn on_node_change(
        &self,
        id: impl Into<String>,
        handler: impl Fn(&ModelEvent, &Page) + 'static,
    ) -> SubscriptionId {
        let id = id.into();
        self.emitter
            .on(crate::events::topics::NODE_CHANGED, move |event, page| {
                if event.node_id() == Some(id.as_str()) {
                    handler(event, page);
                }
            })
    }

    pub fn off(&self, id: SubscriptionId) -> bool {
        self.emitter.off(id)
    }

    fn emit(&self, event: ModelEvent) {
        self.emitter.emit(event, self);
    }

    // ------------------------------------------------------------------
    // Export
    // ------------------------------------------------------------------

    pub fn export(&self) -> PageSchema {
        PageSchema {
            version: self.version.clone(),
            name: self.name.clone(),
            components_tree: self
                .export_node(&self.root)
                .unwrap_or_else(|| NodeSchema::new(ROOT_CONTAINER)),
            components_meta: self.components_meta.clone(),
            assets: self.assets.clone(),
            extra: self.extra.clone(),
        }
    }

    pub fn export_node(&self, id: &str) -> Option<NodeSchema> {
        let node = self.nodes.get(id)?;
        let props = node
            .props
            .iter()
            .map(|prop| (prop.name.clone(), self.export_prop_value(&prop.value)))
            .collect();

        Some(NodeSchema {
            id: Some(node.id.clone()),
            component_name: node.component_name.clone(),
            props,
            state: node.state.clone(),
            configure: node.configure.clone(),
            children: node
                .children
                .iter()
                .filter_map(|child| self.export_node(child))
                .collect(),
            extra: node.extra.clone(),
        })
    }

    /// Full JSON value of one prop, slot content rendered as node schemas
    pub fn export_prop(&self, id: &str, name: &str) -> Option<Value> {
        let prop = self.nodes.get(id)?.props.get(name)?;
        Some(self.export_prop_value(&prop.value))
    }

    fn export_prop_value(&self, value: &PropValue) -> Value {
        match value {
            PropValue::Json(v) => v.clone(),
            PropValue::Array(items) => {
                Value::Array(items.iter().map(|v| self.export_prop_value(v)).collect())
            }
            PropValue::Object(fields) => Value::Object(
                fields
                    .iter()
                    .map(|(k, v)| (k.clone(), self.export_prop_value(v)))
                    .collect(),
            ),
            PropValue::Slot(slot) => {
                let nodes = slot
                    .children
                    .iter()
                    .filter_map(|id| self.export_node(id))
                    .map(|schema| serde_json::to_value(schema).unwrap_or_default())
                    .collect();
                let mut map = slot.meta.clone();
                map.insert("value".to_string(), Value::Array(nodes));
                Value::Object(map)
            }
        }
    }

    fn node_value(&self, id: &str) -> Option<NodeValue> {
        let node = self.nodes.get(id)?;
        Some(NodeValue {
            props: node
                .props
                .iter()
                .map(|prop| (prop.name.clone(), self.export_prop_value(&prop.value)))
                .collect(),
            state: node.state.clone(),
            configure: node.configure.clone(),
        })
    }

    // ------------------------------------------------------------------
    // Whole-page replacement
    // ------------------------------------------------------------------

    /// Atomically swap the tree without recording an edit
    pub fn reload(&mut self, schema: PageSchema) -> ModelResult<()> {
        self.rebuild(schema)?;
        debug!("page {} reloaded with {} nodes", self.name, self.nodes.len());
        self.emit(ModelEvent::PageReloaded);
        Ok(())
    }

    /// Swap the tree as a user edit (recorded by history)
    pub fn replace(&mut self, schema: PageSchema) -> ModelResult<()> {
        self.rebuild(schema)?;
        self.emit(ModelEvent::PageChanged {
            cause: ChangeCause::PageReplaced,
        });
        Ok(())
    }

    /// The id generator carries over, so ids issued before the swap (and
    /// since dropped by it) are never handed out again
    fn rebuild(&mut self, schema: PageSchema) -> ModelResult<()> {
        let mut fresh = Self::build(schema, self.ids.clone())?;
        std::mem::swap(&mut fresh.emitter, &mut self.emitter);
        *self = fresh;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Structural edits
    // ------------------------------------------------------------------

    /// Detach and discard a subtree. No-op for the root or unknown ids.
    pub fn delete_node_by_id(&mut self, id: &str) -> ModelResult<bool> {
        Ok(settle(self.try_delete_node(id))?.is_some())
    }

    pub fn try_delete_node(&mut self, id: &str) -> ModelResult<()> {
        let node = self
            .nodes
            .get(id)
            .ok_or_else(|| ModelError::NotFound(id.to_string()))?;
        if node.parent.is_none() {
            return Err(ModelError::structural("cannot delete the root node"));
        }

        self.detach(id)?;
        self.remove_subtree(id);

        self.emit(ModelEvent::PageChanged {
            cause: ChangeCause::NodeDeleted(id.to_string()),
        });
        Ok(())
    }

    /// Clone a subtree with fresh ids and insert it right after the
    /// original. Returns the id of the copy.
    pub fn copy_node_by_id(&mut self, id: &str) -> ModelResult<Option<String>> {
        settle(self.try_copy_node(id))
    }

    pub fn try_copy_node(&mut self, id: &str) -> ModelResult<String> {
        let node = self
            .nodes
            .get(id)
            .ok_or_else(|| ModelError::NotFound(id.to_string()))?;
        let parent = node
            .parent
            .clone()
            .ok_or_else(|| ModelError::structural("cannot copy the root node"))?;

        let index = self
            .holding_list(&parent)
            .and_then(|list| list.iter().position(|c| c == id))
            .ok_or_else(|| ModelError::Corrupt(format!("{} missing from its parent", id)))?;

        let mut schema = self
            .export_node(id)
            .ok_or_else(|| ModelError::NotFound(id.to_string()))?;
        schema.strip_ids();

        let copy = self.import_node(schema, Some(parent.clone()));
        self.holding_list_mut(&parent)
            .ok_or_else(|| ModelError::Corrupt(format!("parent of {} vanished", id)))?
            .insert(index + 1, copy.clone());

        self.emit(ModelEvent::PageChanged {
            cause: ChangeCause::NodeCopied {
                source: id.to_string(),
                copy: copy.clone(),
            },
        });
        Ok(copy)
    }

    /// Relocate a node next to or into `target`
    pub fn move_node(
        &mut self,
        id: &str,
        target: &str,
        position: InsertPosition,
    ) -> ModelResult<bool> {
        Ok(settle(self.try_move_node(id, target, position))?.is_some())
    }

    pub fn try_move_node(
        &mut self,
        id: &str,
        target: &str,
        position: InsertPosition,
    ) -> ModelResult<()> {
        let node = self
            .nodes
            .get(id)
            .ok_or_else(|| ModelError::NotFound(id.to_string()))?;
        if node.parent.is_none() {
            return Err(ModelError::structural("cannot move the root node"));
        }
        if !self.nodes.contains_key(target) {
            return Err(ModelError::NotFound(target.to_string()));
        }
        if id == target {
            return Err(ModelError::structural("cannot move a node onto itself"));
        }
        if self.contains(id, target) {
            return Err(ModelError::structural(format!(
                "moving {} into its descendant {} would create a cycle",
                id, target
            )));
        }

        let destination = self.destination(target, position)?;
        self.detach(id)?;
        self.attach(id, &destination, target, position)?;

        self.emit(ModelEvent::PageChanged {
            cause: ChangeCause::NodeMoved(id.to_string()),
        });
        Ok(())
    }

    /// Import a new subtree next to or into `target`. Ids present in the
    /// schema are kept when free. Returns the id of the inserted node.
    pub fn insert_node(
        &mut self,
        schema: NodeSchema,
        target: &str,
        position: InsertPosition,
    ) -> ModelResult<Option<String>> {
        settle(self.try_insert_node(schema, target, position))
    }

    pub fn try_insert_node(
        &mut self,
        schema: NodeSchema,
        target: &str,
        position: InsertPosition,
    ) -> ModelResult<String> {
        if schema.component_name == ROOT_CONTAINER {
            return Err(ModelError::structural("a page has exactly one root container"));
        }
        if !self.nodes.contains_key(target) {
            return Err(ModelError::NotFound(target.to_string()));
        }

        let destination = self.destination(target, position)?;
        let id = self.import_node(schema, Some(destination.clone()));
        self.attach(&id, &destination, target, position)?;

        self.emit(ModelEvent::PageChanged {
            cause: ChangeCause::NodeInserted(id.clone()),
        });
        Ok(id)
    }

    // ------------------------------------------------------------------
    // Value edits
    // ------------------------------------------------------------------

    /// Shallow-merge props, state and configure into a node
    pub fn update_value(&mut self, id: &str, patch: NodePatch) -> ModelResult<bool> {
        Ok(settle(self.try_update_value(id, patch))?.is_some())
    }

    pub fn try_update_value(&mut self, id: &str, patch: NodePatch) -> ModelResult<()> {
        let pre_value = self
            .node_value(id)
            .ok_or_else(|| ModelError::NotFound(id.to_string()))?;

        if let Some(props) = patch.props {
            for (name, value) in props {
                self.set_prop(id, name, value)?;
            }
        }

        let node = self.node_mut(id)?;
        if let Some(state) = patch.state {
            for (key, value) in state {
                node.state.insert(key, value);
            }
        }
        if let Some(configure) = patch.configure {
            node.configure = Some(configure);
        }

        let value = self
            .node_value(id)
            .ok_or_else(|| ModelError::Corrupt(format!("{} vanished during update", id)))?;

        self.emit(ModelEvent::NodeChanged {
            id: id.to_string(),
            value,
            pre_value,
        });
        self.emit(ModelEvent::PageChanged {
            cause: ChangeCause::NodeUpdated(id.to_string()),
        });
        Ok(())
    }

    /// Set one prop value by path (`style.color`, `columns.0.title`)
    pub fn update_prop(&mut self, id: &str, path: &str, value: Value) -> ModelResult<bool> {
        Ok(settle(self.try_update_prop(id, path, value))?.is_some())
    }

    pub fn try_update_prop(&mut self, id: &str, path: &str, value: Value) -> ModelResult<()> {
        let node_pre = self
            .node_value(id)
            .ok_or_else(|| ModelError::NotFound(id.to_string()))?;

        let owned = split_path(path);
        let segments: Vec<&str> = owned.iter().map(String::as_str).collect();
        let (name, rest) = match segments.split_first() {
            Some((name, rest)) if !name.is_empty() => (*name, rest),
            _ => return Err(ModelError::structural("empty prop path")),
        };

        let current = self.export_prop(id, name);
        let pre_value = match &current {
            Some(v) => value_at_path(v, rest).cloned(),
            None => None,
        };

        let next = if rest.is_empty() {
            value.clone()
        } else {
            let mut base = current.unwrap_or_else(|| Value::Object(Map::new()));
            if !set_value_at_path(&mut base, rest, value.clone()) {
                return Err(ModelError::structural(format!(
                    "prop path {} does not resolve",
                    path
                )));
            }
            base
        };

        self.set_prop(id, name.to_string(), next)?;
        let node_value = self
            .node_value(id)
            .ok_or_else(|| ModelError::Corrupt(format!("{} vanished during update", id)))?;

        self.emit(ModelEvent::PropChanged {
            id: id.to_string(),
            path: path.to_string(),
            value,
            pre_value,
        });
        self.emit(ModelEvent::NodeChanged {
            id: id.to_string(),
            value: node_value,
            pre_value: node_pre,
        });
        self.emit(ModelEvent::PageChanged {
            cause: ChangeCause::PropUpdated {
                id: id.to_string(),
                path: path.to_string(),
            },
        });
        Ok(())
    }

    // ------------------------------------------------------------------
    // Arena internals
    // ------------------------------------------------------------------

    fn node_mut(&mut self, id: &str) -> ModelResult<&mut Node> {
        self.nodes
            .get_mut(id)
            .ok_or_else(|| ModelError::NotFound(id.to_string()))
    }

    fn fresh_id(&mut self) -> String {
        let nodes = &self.nodes;
        self.ids.new_id_where(|id| nodes.contains_key(id))
    }

    /// Insert a node subtree into the arena. The caller links the returned
    /// id into the holding list.
    fn import_node(&mut self, mut schema: NodeSchema, parent: Option<ParentRef>) -> String {
        let id = match schema.id.take() {
            Some(id) if !id.is_empty() && !self.nodes.contains_key(&id) => id,
            Some(id) if !id.is_empty() => {
                let fresh = self.fresh_id();
                warn!("duplicate node id {} re-issued as {}", id, fresh);
                fresh
            }
            _ => self.fresh_id(),
        };

        // Reserve the id before descending so nested imports cannot take it
        self.nodes.insert(
            id.clone(),
            Node {
                id: id.clone(),
                component_name: schema.component_name,
                children: Vec::new(),
                parent,
                props: Props::new(),
                state: schema.state,
                configure: schema.configure,
                extra: schema.extra,
            },
        );

        let mut props = Props::new();
        for (name, value) in schema.props {
            let imported = self.import_prop(&id, &escape_segment(&name), value);
            props.insert(name, imported);
        }

        let children: Vec<String> = schema
            .children
            .into_iter()
            .map(|child| self.import_node(child, Some(ParentRef::Node(id.clone()))))
            .collect();

        if let Some(node) = self.nodes.get_mut(&id) {
            node.props = props;
            node.children = children;
        }
        id
    }

    fn import_prop(&mut self, owner: &str, path: &str, value: Value) -> PropValue {
        if !PropValue::contains_slot(&value) {
            return PropValue::Json(value);
        }

        match value {
            Value::Object(mut map) if is_slot_object(&map) => {
                let nodes = match map.remove("value") {
                    Some(Value::Array(items)) => items,
                    None => Vec::new(),
                    Some(other) => {
                        warn!("slot {} on {} has a non-array value, kept as plain prop", path, owner);
                        map.insert("value".to_string(), other);
                        return PropValue::Json(Value::Object(map));
                    }
                };

                let parent = ParentRef::Slot {
                    owner: owner.to_string(),
                    path: path.to_string(),
                };
                let mut children = Vec::with_capacity(nodes.len());
                for raw in nodes {
                    match serde_json::from_value::<NodeSchema>(raw) {
                        Ok(schema) => children.push(self.import_node(schema, Some(parent.clone()))),
                        Err(e) => warn!("dropping malformed node in slot {} on {}: {}", path, owner, e),
                    }
                }

                PropValue::Slot(Slot {
                    owner: owner.to_string(),
                    path: path.to_string(),
                    children,
                    meta: map,
                })
            }
            Value::Object(map) => PropValue::Object(
                map.into_iter()
                    .map(|(key, v)| {
                        let child_path = join_path(path, &key);
                        let imported = self.import_prop(owner, &child_path, v);
                        (key, imported)
                    })
                    .collect(),
            ),
            Value::Array(items) => PropValue::Array(
                items
                    .into_iter()
                    .enumerate()
                    .map(|(i, v)| self.import_prop(owner, &join_path(path, &i.to_string()), v))
                    .collect(),
            ),
            other => PropValue::Json(other),
        }
    }

    /// Replace one top-level prop, discarding slot nodes of the old value
    fn set_prop(&mut self, id: &str, name: String, value: Value) -> ModelResult<()> {
        let stale: Vec<String> = match self.node_mut(id)?.props.get(&name) {
            Some(prop) => {
                let mut slots = Vec::new();
                prop.value.collect_slots(&mut slots);
                slots.iter().flat_map(|s| s.children.iter().cloned()).collect()
            }
            None => Vec::new(),
        };
        for child in stale {
            self.remove_subtree(&child);
        }

        let imported = self.import_prop(id, &escape_segment(&name), value);
        self.node_mut(id)?.props.insert(name, imported);
        Ok(())
    }

    fn holding_list(&self, parent: &ParentRef) -> Option<&Vec<String>> {
        match parent {
            ParentRef::Node(pid) => self.nodes.get(pid).map(|n| &n.children),
            ParentRef::Slot { owner, path } => self
                .nodes
                .get(owner)
                .and_then(|n| n.props.slot(path))
                .map(|s| &s.children),
        }
    }

    fn holding_list_mut(&mut self, parent: &ParentRef) -> Option<&mut Vec<String>> {
        match parent {
            ParentRef::Node(pid) => self.nodes.get_mut(pid).map(|n| &mut n.children),
            ParentRef::Slot { owner, path } => self
                .nodes
                .get_mut(owner)
                .and_then(|n| n.props.slot_mut(path))
                .map(|s| &mut s.children),
        }
    }

    /// Holding list a node placed at `position` of `target` ends up in
    fn destination(&self, target: &str, position: InsertPosition) -> ModelResult<ParentRef> {
        match position {
            InsertPosition::Inside => Ok(ParentRef::Node(target.to_string())),
            InsertPosition::Before | InsertPosition::After => self
                .nodes
                .get(target)
                .and_then(|n| n.parent.clone())
                .ok_or_else(|| ModelError::structural("the root node has no siblings")),
        }
    }

    /// Remove a node from the list holding it
    fn detach(&mut self, id: &str) -> ModelResult<ParentRef> {
        let parent = self
            .nodes
            .get(id)
            .and_then(|n| n.parent.clone())
            .ok_or_else(|| ModelError::structural(format!("{} has no parent", id)))?;

        let list = self
            .holding_list_mut(&parent)
            .ok_or_else(|| ModelError::Corrupt(format!("parent of {} is missing", id)))?;
        let pos = list
            .iter()
            .position(|c| c == id)
            .ok_or_else(|| ModelError::Corrupt(format!("{} missing from its parent", id)))?;
        list.remove(pos);
        Ok(parent)
    }

    /// Link an already imported/detached node into `destination`
    fn attach(
        &mut self,
        id: &str,
        destination: &ParentRef,
        target: &str,
        position: InsertPosition,
    ) -> ModelResult<()> {
        let list = self
            .holding_list_mut(destination)
            .ok_or_else(|| ModelError::Corrupt(format!("destination of {} vanished", id)))?;
        let index = match position {
            InsertPosition::Inside => list.len(),
            InsertPosition::Before | InsertPosition::After => {
                let at = list.iter().position(|c| c == target).ok_or_else(|| {
                    ModelError::Corrupt(format!("{} missing from its parent", target))
                })?;
                if position == InsertPosition::After {
                    at + 1
                } else {
                    at
                }
            }
        };
        list.insert(index, id.to_string());
        self.node_mut(id)?.parent = Some(destination.clone());
        Ok(())
    }

    /// Drop a subtree from the arena by walking child edges only
    fn remove_subtree(&mut self, id: &str) {
        let mut stack = vec![id.to_string()];
        while let Some(current) = stack.pop() {
            if let Some(node) = self.nodes.remove(&current) {
                stack.extend(node.owned_ids());
            }
        }
    }
}

/// Turn the expected "can't do that" errors into `None`
fn settle<T>(result: ModelResult<T>) -> ModelResult<Option<T>> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(e) if e.is_expected() => {
            debug!("edit ignored: {}", e);
            Ok(None)
        }
        Err(e) => {
            error!("page model invariant broken: {}", e);
            Err(e)
        }
    }
}

fn value_at_path<'a>(value: &'a Value, path: &[&str]) -> Option<&'a Value> {
    path.iter().try_fold(value, |current, segment| match current {
        Value::Object(map) => map.get(*segment),
        Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => None,
    })
}

fn set_value_at_path(target: &mut Value, path: &[&str], value: Value) -> bool {
    let Some((last, parents)) = path.split_last() else {
        *target = value;
        return true;
    };

    let mut current = target;
    for segment in parents {
        if current.is_null() {
            *current = Value::Object(Map::new());
        }
        current = match current {
            Value::Object(map) => map
                .entry(segment.to_string())
                .or_insert_with(|| Value::Object(Map::new())),
            Value::Array(items) => match segment.parse::<usize>().ok().and_then(|i| items.get_mut(i)) {
                Some(item) => item,
                None => return false,
            },
            _ => return false,
        };
    }

    if current.is_null() {
        *current = Value::Object(Map::new());
    }
    match current {
        Value::Object(map) => {
            map.insert(last.to_string(), value);
            true
        }
        Value::Array(items) => match last.parse::<usize>() {
            Ok(i) if i < items.len() => {
                items[i] = value;
                true
            }
            Ok(i) if i == items.len() => {
                items.push(value);
                true
            }
            _ => false,
        },
        _ => false,
    }
}
