//! # Drop Position
//!
//! Turns a pointer over a target's bounding box into a drop descriptor, and a
//! descriptor back into the indicator line drawn by the host.
//!
//! ```text
//!            vertical                      horizontal
//!   ┌──────────────────────┐        ┌────┬──────────┬────┐
//!   │ before  (edge band)  │        │    │          │    │
//!   ├──────────────────────┤        │ b  │  inside  │ a  │
//!   │ inside               │        │ e  │          │ f  │
//!   ├──────────────────────┤        │ f  │          │ t  │
//!   │ after   (edge band)  │        │    │          │    │
//!   └──────────────────────┘        └────┴──────────┴────┘
//! ```
//!
//! Outside both bands the pointer resolves to `inside` only for targets that
//! accept children. Leaf targets fall back to the nearest band, so every
//! hover over a leaf yields a position.

use lowcode_model::InsertPosition;
use serde::{Deserialize, Serialize};

use crate::geometry::{Point, Rect};

/// Default fraction of the target extent covered by each edge band
pub const DEFAULT_EDGE_BAND: f64 = 0.25;

/// Horizontal inset of the `inside` indicator
pub const INSIDE_INDENT: f64 = 20.0;

/// Direction in which a target's siblings are laid out
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    #[default]
    Vertical,
    Horizontal,
}

/// Where a dragged node would land relative to the hovered target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DropDescriptor {
    pub position: InsertPosition,
    pub orientation: Orientation,
}

/// Which drop positions a target node accepts
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum DropRule {
    #[default]
    Any,
    Never,
    Only(Vec<InsertPosition>),
}

impl DropRule {
    pub fn allows(&self, position: InsertPosition) -> bool {
        match self {
            DropRule::Any => true,
            DropRule::Never => false,
            DropRule::Only(positions) => positions.contains(&position),
        }
    }
}

/// Per-node drag and drop permissions set by the host (e.g. an outline tree)
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TreePosition {
    /// `Some(false)` forbids dragging the node; `None` leaves it to materials
    pub can_drag: Option<bool>,
    pub can_drop: DropRule,
}

impl TreePosition {
    pub fn locked() -> Self {
        Self {
            can_drag: Some(false),
            can_drop: DropRule::Never,
        }
    }
}

/// Resolve the drop descriptor for `pointer` over `rect`
pub fn calculate_drop_descriptor(
    rect: &Rect,
    pointer: Point,
    orientation: Orientation,
    accepts_children: bool,
    edge_band: f64,
) -> DropDescriptor {
    let (start, extent, at) = match orientation {
        Orientation::Vertical => (rect.y, rect.height, pointer.y),
        Orientation::Horizontal => (rect.x, rect.width, pointer.x),
    };

    let position = if extent.is_nan() || extent <= 0.0 {
        if accepts_children {
            InsertPosition::Inside
        } else {
            InsertPosition::After
        }
    } else {
        let ratio = ((at - start) / extent).clamp(0.0, 1.0);
        let band = edge_band.clamp(0.0, 0.5);

        if ratio < band {
            InsertPosition::Before
        } else if ratio > 1.0 - band {
            InsertPosition::After
        } else if accepts_children {
            InsertPosition::Inside
        } else if ratio < 0.5 {
            InsertPosition::Before
        } else {
            InsertPosition::After
        }
    };

    DropDescriptor {
        position,
        orientation,
    }
}

/// Line segment the host draws to show where a drop would land
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DropIndicator {
    pub from: Point,
    pub to: Point,
}

impl DropIndicator {
    pub fn length(&self) -> f64 {
        (self.to.x - self.from.x).hypot(self.to.y - self.from.y)
    }
}

/// Indicator for `descriptor` against the target's current rect
pub fn drop_indicator(rect: &Rect, descriptor: &DropDescriptor) -> DropIndicator {
    let horizontal_line = |y: f64, indent: f64| DropIndicator {
        from: Point::new(rect.left() + indent.min(rect.width), y),
        to: Point::new(rect.right(), y),
    };
    let vertical_line = |x: f64| DropIndicator {
        from: Point::new(x, rect.top()),
        to: Point::new(x, rect.bottom()),
    };

    match (descriptor.position, descriptor.orientation) {
        (InsertPosition::Inside, _) => horizontal_line(rect.bottom(), INSIDE_INDENT),
        (InsertPosition::Before, Orientation::Vertical) => horizontal_line(rect.top(), 0.0),
        (InsertPosition::After, Orientation::Vertical) => horizontal_line(rect.bottom(), 0.0),
        (InsertPosition::Before, Orientation::Horizontal) => vertical_line(rect.left()),
        (InsertPosition::After, Orientation::Horizontal) => vertical_line(rect.right()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn target() -> Rect {
        Rect::new(0.0, 100.0, 200.0, 100.0)
    }

    fn at_y(y: f64, container: bool) -> InsertPosition {
        calculate_drop_descriptor(
            &target(),
            Point::new(50.0, y),
            Orientation::Vertical,
            container,
            DEFAULT_EDGE_BAND,
        )
        .position
    }

    #[test]
    fn test_top_band_resolves_before() {
        assert_eq!(at_y(110.0, true), InsertPosition::Before);
        assert_eq!(at_y(110.0, false), InsertPosition::Before);
    }

    #[test]
    fn test_center_of_container_resolves_inside() {
        assert_eq!(at_y(150.0, true), InsertPosition::Inside);
    }

    #[test]
    fn test_bottom_band_resolves_after() {
        assert_eq!(at_y(190.0, true), InsertPosition::After);
    }

    #[test]
    fn test_leaf_falls_back_to_nearest_edge() {
        assert_eq!(at_y(140.0, false), InsertPosition::Before);
        assert_eq!(at_y(160.0, false), InsertPosition::After);
        assert_eq!(at_y(150.0, false), InsertPosition::After);
    }

    #[test]
    fn test_pointer_outside_rect_is_clamped() {
        assert_eq!(at_y(20.0, true), InsertPosition::Before);
        assert_eq!(at_y(400.0, true), InsertPosition::After);
    }

    #[test]
    fn test_horizontal_uses_x_axis() {
        let descriptor = calculate_drop_descriptor(
            &target(),
            Point::new(190.0, 110.0),
            Orientation::Horizontal,
            true,
            DEFAULT_EDGE_BAND,
        );
        assert_eq!(descriptor.position, InsertPosition::After);
        assert_eq!(descriptor.orientation, Orientation::Horizontal);
    }

    #[test]
    fn test_degenerate_rect() {
        let flat = Rect::new(0.0, 0.0, 100.0, 0.0);
        let inside = calculate_drop_descriptor(
            &flat,
            Point::new(5.0, 0.0),
            Orientation::Vertical,
            true,
            DEFAULT_EDGE_BAND,
        );
        let leaf = calculate_drop_descriptor(
            &flat,
            Point::new(5.0, 0.0),
            Orientation::Vertical,
            false,
            DEFAULT_EDGE_BAND,
        );
        assert_eq!(inside.position, InsertPosition::Inside);
        assert_eq!(leaf.position, InsertPosition::After);
    }

    #[test]
    fn test_drop_rule() {
        assert!(DropRule::Any.allows(InsertPosition::Inside));
        assert!(!DropRule::Never.allows(InsertPosition::Before));
        let only = DropRule::Only(vec![InsertPosition::Before, InsertPosition::After]);
        assert!(only.allows(InsertPosition::After));
        assert!(!only.allows(InsertPosition::Inside));
    }

    #[test]
    fn test_indicator_lines() {
        let rect = target();
        let vertical = |position| DropDescriptor {
            position,
            orientation: Orientation::Vertical,
        };

        let before = drop_indicator(&rect, &vertical(InsertPosition::Before));
        assert_eq!(before.from, Point::new(0.0, 100.0));
        assert_eq!(before.to, Point::new(200.0, 100.0));

        let after = drop_indicator(&rect, &vertical(InsertPosition::After));
        assert_eq!(after.from.y, 200.0);

        let inside = drop_indicator(&rect, &vertical(InsertPosition::Inside));
        assert_eq!(inside.from, Point::new(20.0, 200.0));
        assert_eq!(inside.length(), 180.0);

        let left = drop_indicator(
            &rect,
            &DropDescriptor {
                position: InsertPosition::Before,
                orientation: Orientation::Horizontal,
            },
        );
        assert_eq!(left.from, Point::new(0.0, 100.0));
        assert_eq!(left.to, Point::new(0.0, 200.0));
    }
}
