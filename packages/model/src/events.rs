//! Events published by the page model

use serde_json::{Map, Value};

use crate::emitter::Topic;

pub mod topics {
    pub const PAGE_CHANGED: &str = "page-changed";
    pub const PAGE_RELOADED: &str = "page-reloaded";
    pub const NODE_CHANGED: &str = "node-changed";
    pub const PROP_CHANGED: &str = "prop-changed";
}

/// Shallow value of a node as seen by node-changed listeners
#[derive(Debug, Clone, PartialEq)]
pub struct NodeValue {
    pub props: Map<String, Value>,
    pub state: Map<String, Value>,
    pub configure: Option<Value>,
}

/// What triggered a page-changed event
#[derive(Debug, Clone, PartialEq)]
pub enum ChangeCause {
    NodeUpdated(String),
    PropUpdated { id: String, path: String },
    NodeDeleted(String),
    NodeCopied { source: String, copy: String },
    NodeInserted(String),
    NodeMoved(String),
    PageReplaced,
}

impl ChangeCause {
    /// Causes that alter the tree shape rather than values
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            ChangeCause::NodeDeleted(_)
                | ChangeCause::NodeCopied { .. }
                | ChangeCause::NodeInserted(_)
                | ChangeCause::NodeMoved(_)
                | ChangeCause::PageReplaced
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ModelEvent {
    /// Emitted exactly once per mutation, after any scoped events
    PageChanged { cause: ChangeCause },

    /// The whole tree was swapped by `reload`; not an edit
    PageReloaded,

    NodeChanged {
        id: String,
        value: NodeValue,
        pre_value: NodeValue,
    },

    PropChanged {
        id: String,
        path: String,
        value: Value,
        pre_value: Option<Value>,
    },
}

impl ModelEvent {
    /// Node the event is scoped to, if any
    pub fn node_id(&self) -> Option<&str> {
        match self {
            ModelEvent::NodeChanged { id, .. } | ModelEvent::PropChanged { id, .. } => Some(id),
            _ => None,
        }
    }
}

impl Topic for ModelEvent {
    fn topic(&self) -> &'static str {
        match self {
            ModelEvent::PageChanged { .. } => topics::PAGE_CHANGED,
            ModelEvent::PageReloaded => topics::PAGE_RELOADED,
            ModelEvent::NodeChanged { .. } => topics::NODE_CHANGED,
            ModelEvent::PropChanged { .. } => topics::PROP_CHANGED,
        }
    }
}
