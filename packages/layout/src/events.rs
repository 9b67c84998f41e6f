//! Gesture stream published by [`DragAndDrop`](crate::DragAndDrop)

use lowcode_model::Topic;

use crate::geometry::Point;
use crate::position::DropDescriptor;

pub mod topics {
    pub const DRAGGING: &str = "dragging";
    pub const DRAG_END: &str = "drag-end";
}

#[derive(Debug, Clone, PartialEq)]
pub enum DragEvent {
    /// Fired on every pointer move of an active gesture. `descriptor` is
    /// `None` while the pointer is over no valid drop target.
    Dragging {
        source: String,
        pointer: Point,
        target: Option<String>,
        descriptor: Option<DropDescriptor>,
    },

    /// Fired once per gesture, accepted or not
    DragEnd { source: String, accepted: bool },
}

impl Topic for DragEvent {
    fn topic(&self) -> &'static str {
        match self {
            DragEvent::Dragging { .. } => topics::DRAGGING,
            DragEvent::DragEnd { .. } => topics::DRAG_END,
        }
    }
}
