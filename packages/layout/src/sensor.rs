//! # Sensors
//!
//! A sensor is a container region of the rendered UI that can start drag
//! gestures (the canvas, an outline tree). When regions nest, the sensor
//! with the highest priority whose container encloses the event target
//! wins; equal priorities go to the earliest registration.

use serde::{Deserialize, Serialize};

use crate::element::{encloses, ElementId, ElementTree};
use crate::geometry::Point;
use crate::position::DropDescriptor;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sensor {
    pub name: String,
    pub container: ElementId,
    pub priority: i32,
}

impl Sensor {
    pub fn new(name: impl Into<String>, container: ElementId) -> Self {
        Self {
            name: name.into(),
            container,
            priority: 0,
        }
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }
}

/// Gesture data accumulated while the pointer moves
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtraData {
    pub start_node: Option<String>,
    pub drop_node: Option<String>,
    pub drop_descriptor: Option<DropDescriptor>,
}

/// One pointer event delivered by the host
#[derive(Debug, Clone, PartialEq)]
pub struct SensorEvent {
    pub target: ElementId,
    pub pointer: Point,
    pub extra: ExtraData,
}

impl SensorEvent {
    pub fn new(target: ElementId, pointer: Point) -> Self {
        Self {
            target,
            pointer,
            extra: ExtraData::default(),
        }
    }

    /// Whether a drop target was attached to this event
    pub fn is_droppable(&self) -> bool {
        self.extra.drop_node.is_some() && self.extra.drop_descriptor.is_some()
    }
}

/// Granted drag: the sensor that owns the gesture and the source node
#[derive(Debug, Clone, PartialEq)]
pub struct DragPermission {
    pub sensor: String,
    pub node_id: String,
    pub event: SensorEvent,
}

#[derive(Debug, Clone, Default)]
pub struct SensorRegistry {
    sensors: Vec<Sensor>,
}

impl SensorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a sensor by name
    pub fn register(&mut self, sensor: Sensor) {
        match self.sensors.iter_mut().find(|s| s.name == sensor.name) {
            Some(existing) => *existing = sensor,
            None => self.sensors.push(sensor),
        }
    }

    pub fn remove(&mut self, name: &str) -> Option<Sensor> {
        let pos = self.sensors.iter().position(|s| s.name == name)?;
        Some(self.sensors.remove(pos))
    }

    pub fn get(&self, name: &str) -> Option<&Sensor> {
        self.sensors.iter().find(|s| s.name == name)
    }

    /// Sensor owning events on `target`
    pub fn pick(&self, tree: &dyn ElementTree, target: ElementId) -> Option<&Sensor> {
        self.sensors
            .iter()
            .filter(|s| encloses(tree, s.container, target))
            .fold(None, |best: Option<&Sensor>, s| match best {
                Some(b) if b.priority >= s.priority => Some(b),
                _ => Some(s),
            })
    }

    pub fn clear(&mut self) {
        self.sensors.clear();
    }

    pub fn len(&self) -> usize {
        self.sensors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sensors.is_empty()
    }
}
