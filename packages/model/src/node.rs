//! # Nodes
//!
//! Nodes are stored flat in the page arena, keyed by id. Each record lists its
//! child ids and holds one navigational parent link. Ownership only flows
//! along child edges (node children and slot children), so deleting or
//! cloning a subtree never needs the parent link.

use serde_json::{Map, Value};

use crate::page::Page;
use crate::prop::Props;
use crate::schema::{NodeSchema, ROOT_CONTAINER};

/// Navigational link from a node to the list that holds it
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ParentRef {
    /// Regular child of another node
    Node(String),

    /// Top-level node of a slot prop
    Slot { owner: String, path: String },
}

impl ParentRef {
    /// Node owning the holding list
    pub fn owner(&self) -> &str {
        match self {
            ParentRef::Node(id) => id,
            ParentRef::Slot { owner, .. } => owner,
        }
    }
}

/// One component instance in the tree
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub(crate) id: String,
    pub(crate) component_name: String,
    pub(crate) children: Vec<String>,
    pub(crate) parent: Option<ParentRef>,
    pub(crate) props: Props,
    pub(crate) state: Map<String, Value>,
    pub(crate) configure: Option<Value>,
    pub(crate) extra: Map<String, Value>,
}

impl Node {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn component_name(&self) -> &str {
        &self.component_name
    }

    pub fn children(&self) -> &[String] {
        &self.children
    }

    pub fn parent(&self) -> Option<&ParentRef> {
        self.parent.as_ref()
    }

    pub fn props(&self) -> &Props {
        &self.props
    }

    pub fn state(&self) -> &Map<String, Value> {
        &self.state
    }

    pub fn configure(&self) -> Option<&Value> {
        self.configure.as_ref()
    }

    pub fn is_root(&self) -> bool {
        self.parent.is_none() && self.component_name == ROOT_CONTAINER
    }

    /// Child ids followed by the ids held in slot props
    pub(crate) fn owned_ids(&self) -> Vec<String> {
        let mut ids = self.children.clone();
        for slot in self.props.slots() {
            ids.extend(slot.children.iter().cloned());
        }
        ids
    }
}

/// Shallow merge applied by [`Page::update_value`]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NodePatch {
    pub props: Option<Map<String, Value>>,
    pub state: Option<Map<String, Value>>,
    pub configure: Option<Value>,
}

impl NodePatch {
    pub fn props(props: Map<String, Value>) -> Self {
        Self {
            props: Some(props),
            ..Self::default()
        }
    }

    pub fn state(state: Map<String, Value>) -> Self {
        Self {
            state: Some(state),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.props.is_none() && self.state.is_none() && self.configure.is_none()
    }
}

/// Borrowed view of a live node with access to its page
#[derive(Clone, Copy)]
pub struct NodeRef<'a> {
    page: &'a Page,
    node: &'a Node,
}

impl<'a> NodeRef<'a> {
    pub(crate) fn new(page: &'a Page, node: &'a Node) -> Self {
        Self { page, node }
    }

    pub fn id(&self) -> &'a str {
        &self.node.id
    }

    pub fn component_name(&self) -> &'a str {
        &self.node.component_name
    }

    pub fn record(&self) -> &'a Node {
        self.node
    }

    pub fn parent_node(&self) -> Option<NodeRef<'a>> {
        let parent = self.node.parent.as_ref()?;
        self.page.get_node(parent.owner())
    }

    pub fn child_nodes(&self) -> impl Iterator<Item = NodeRef<'a>> + 'a {
        let page = self.page;
        self.node
            .children
            .iter()
            .filter_map(move |id| page.get_node(id))
    }

    /// True if `id` is this node or any transitive descendant
    pub fn contains(&self, id: &str) -> bool {
        self.page.contains(&self.node.id, id)
    }

    pub fn export(&self) -> NodeSchema {
        self.page.export_node(&self.node.id).unwrap_or_else(|| {
            NodeSchema::new(self.node.component_name.clone()).with_id(self.node.id.clone())
        })
    }
}

impl std::ops::Deref for NodeRef<'_> {
    type Target = Node;

    fn deref(&self) -> &Node {
        self.node
    }
}

impl std::fmt::Debug for NodeRef<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NodeRef")
            .field("id", &self.node.id)
            .field("component_name", &self.node.component_name)
            .finish()
    }
}
