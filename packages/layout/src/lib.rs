//! # Lowcode Layout
//!
//! Drag-and-drop targeting for the page editor.
//!
//! ## Architecture
//!
//! ```text
//! host pointer events
//!         ↓
//! ┌─────────────────────────────────────────────┐
//! │ sensor: which container region owns it      │
//! └─────────────────────────────────────────────┘
//!         ↓
//! ┌─────────────────────────────────────────────┐
//! │ element: element → node id (closest tag)    │
//! └─────────────────────────────────────────────┘
//!         ↓
//! ┌─────────────────────────────────────────────┐
//! │ dnd: gesture state machine                  │
//! │  - can_drag (async material predicate)      │
//! │  - can_drop (rules, cycles, edge bands)     │
//! │  - drop → Page::move_node                   │
//! └─────────────────────────────────────────────┘
//!         ↓
//!   dragging / drag-end events
//! ```
//!
//! The engine never touches the page outside `drop`, which goes through the
//! page's own `move_node` so events and history stay consistent.

pub mod dnd;
pub mod element;
pub mod error;
pub mod events;
pub mod geometry;
pub mod material;
pub mod position;
pub mod sensor;

pub use dnd::{DndOptions, DragAndDrop, DropOutcome, GesturePhase};
pub use element::{ElementId, ElementTree, StaticElementTree, NODE_ID_ATTRIBUTE};
pub use error::{DragError, DragResult};
pub use events::{topics, DragEvent};
pub use geometry::{Point, Rect};
pub use material::{DragPredicate, DropCandidate, DropVeto, Material, MaterialRegistry};
pub use position::{
    calculate_drop_descriptor, drop_indicator, DropDescriptor, DropIndicator, DropRule,
    Orientation, TreePosition, DEFAULT_EDGE_BAND,
};
pub use sensor::{DragPermission, ExtraData, Sensor, SensorEvent, SensorRegistry};
