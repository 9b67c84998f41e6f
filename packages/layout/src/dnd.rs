//! # Drag and Drop
//!
//! One gesture at a time, driven by the host's pointer events:
//!
//! ```text
//!             can_drag                 predicate ok
//!   Idle ───────────────→ Checking ───────────────→ Active ──┐ can_drop
//!    ↑                      │  │                     ↑  │  ←─┘ (dragging)
//!    │   veto / timeout     │  │ can_drag again      │  │
//!    ├──────────────────────┘  └─→ Checking (new     │  │ drop / cancel
//!    │                             token, old check  │  ↓
//!    │                             resolves to None) │ Settling ── drag-end
//!    └───────────────────────────────────────────────┴──────────┘
//!
//!   detach: any state → Detached (terminal)
//! ```
//!
//! While a permission check is pending, pointer moves are coalesced (the
//! event is returned untouched) rather than starting a competing check. A
//! new `can_drag` invalidates the pending check's token, so a late verdict
//! can never activate a stale gesture.

use std::cell::{Cell, Ref, RefCell};
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;
use std::time::Duration;

use lowcode_model::{Emitter, InsertPosition, Page, SubscriptionId};
use thiserror::Error;
use tracing::{debug, warn};

use crate::element::{encloses, resolve_node_id, ElementId, ElementTree, NODE_ID_ATTRIBUTE};
use crate::error::{DragError, DragResult};
use crate::events::DragEvent;
use crate::material::{DropCandidate, Material, MaterialRegistry};
use crate::position::{
    calculate_drop_descriptor, drop_indicator, DropDescriptor, DropIndicator, DropRule,
    TreePosition, DEFAULT_EDGE_BAND,
};
use crate::sensor::{DragPermission, ExtraData, Sensor, SensorEvent, SensorRegistry};

/// Tunables of the targeting engine
#[derive(Debug, Clone, PartialEq)]
pub struct DndOptions {
    /// Fraction of the target extent covered by each edge band
    pub edge_band: f64,

    /// Upper bound on async drag predicates
    pub permission_timeout: Duration,

    /// Element attribute holding the rendered node id
    pub node_id_attribute: String,
}

impl Default for DndOptions {
    fn default() -> Self {
        Self {
            edge_band: DEFAULT_EDGE_BAND,
            permission_timeout: Duration::from_millis(3000),
            node_id_attribute: NODE_ID_ATTRIBUTE.to_string(),
        }
    }
}

/// Observable gesture state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GesturePhase {
    Idle,
    Checking,
    Active,
    Settling,
    Detached,
}

/// Result of [`DragAndDrop::drop`]
#[derive(Debug, Clone, PartialEq)]
pub enum DropOutcome {
    Moved {
        node_id: String,
        target: String,
        position: InsertPosition,
    },
    /// The gesture ended without an accepted drop target
    Cancelled,
    /// No gesture was active
    NoGesture,
}

#[derive(Debug, Clone)]
struct DragContext {
    sensor: String,
    container: ElementId,
    source: String,
    target: Option<DropTarget>,
}

#[derive(Debug, Clone)]
struct DropTarget {
    node_id: String,
    element: ElementId,
    descriptor: DropDescriptor,
}

#[derive(Debug)]
enum Gesture {
    Idle,
    Checking {
        token: u64,
        sensor: String,
        node_id: String,
    },
    Active(DragContext),
    Settling,
    Detached,
}

impl Gesture {
    fn phase(&self) -> GesturePhase {
        match self {
            Gesture::Idle => GesturePhase::Idle,
            Gesture::Checking { .. } => GesturePhase::Checking,
            Gesture::Active(_) => GesturePhase::Active,
            Gesture::Settling => GesturePhase::Settling,
            Gesture::Detached => GesturePhase::Detached,
        }
    }
}

#[derive(Debug, Error)]
enum Rejection {
    #[error("no node under the pointer")]
    NoTarget,

    #[error("dragged node {0} no longer exists")]
    SourceGone(String),

    #[error("{0} does not accept drops")]
    DropForbidden(String),

    #[error("{0} cannot be dropped onto itself")]
    SelfDrop(String),

    #[error("{0} contains {1}, dropping would create a cycle")]
    Cycle(String, String),

    #[error("{0:?} is not an allowed position on {1}")]
    PositionNotAllowed(InsertPosition, String),

    #[error("material of {0} vetoed the drop")]
    Vetoed(String),
}

/// Targeting engine shared by every sensor of an editor
pub struct DragAndDrop {
    tree: Rc<dyn ElementTree>,
    options: DndOptions,
    sensors: RefCell<SensorRegistry>,
    materials: RefCell<MaterialRegistry>,
    positions: RefCell<HashMap<String, TreePosition>>,
    gesture: RefCell<Gesture>,
    next_token: Cell<u64>,
    emitter: Emitter<DragEvent>,
}

impl DragAndDrop {
    pub fn new(tree: Rc<dyn ElementTree>, options: DndOptions) -> Self {
        Self {
            tree,
            options,
            sensors: RefCell::new(SensorRegistry::new()),
            materials: RefCell::new(MaterialRegistry::new()),
            positions: RefCell::new(HashMap::new()),
            gesture: RefCell::new(Gesture::Idle),
            next_token: Cell::new(0),
            emitter: Emitter::new(),
        }
    }

    pub fn options(&self) -> &DndOptions {
        &self.options
    }

    pub fn element_tree(&self) -> &dyn ElementTree {
        self.tree.as_ref()
    }

    pub fn phase(&self) -> GesturePhase {
        self.gesture.borrow().phase()
    }

    /// Source node of the active gesture
    pub fn source_node(&self) -> Option<String> {
        match &*self.gesture.borrow() {
            Gesture::Active(ctx) => Some(ctx.source.clone()),
            Gesture::Checking { node_id, .. } => Some(node_id.clone()),
            _ => None,
        }
    }

    /// Currently resolved drop target and descriptor
    pub fn drop_target(&self) -> Option<(String, DropDescriptor)> {
        match &*self.gesture.borrow() {
            Gesture::Active(DragContext {
                target: Some(target),
                ..
            }) => Some((target.node_id.clone(), target.descriptor)),
            _ => None,
        }
    }

    /// Indicator line for the current drop target, from its live rect
    pub fn indicator(&self) -> Option<DropIndicator> {
        let (element, descriptor) = match &*self.gesture.borrow() {
            Gesture::Active(DragContext {
                target: Some(target),
                ..
            }) => (target.element, target.descriptor),
            _ => return None,
        };
        let rect = self.tree.bounding_rect(element)?;
        Some(drop_indicator(&rect, &descriptor))
    }

    // ------------------------------------------------------------------
    // Registration
    // ------------------------------------------------------------------

    pub fn register_sensor(&self, sensor: Sensor) {
        if self.phase() == GesturePhase::Detached {
            warn!("sensor {} registered on a detached engine, ignored", sensor.name);
            return;
        }
        self.sensors.borrow_mut().register(sensor);
    }

    /// Remove a sensor, ending any gesture it owns
    pub fn remove_sensor(&self, name: &str) -> Option<Sensor> {
        let owns_gesture = match &*self.gesture.borrow() {
            Gesture::Active(ctx) => ctx.sensor == name,
            Gesture::Checking { sensor, .. } => sensor == name,
            _ => false,
        };
        if owns_gesture {
            self.cancel();
        }
        self.sensors.borrow_mut().remove(name)
    }

    pub fn sensors(&self) -> Ref<'_, SensorRegistry> {
        self.sensors.borrow()
    }

    pub fn register_material(&self, material: Material) {
        self.materials.borrow_mut().register(material);
    }

    pub fn materials(&self) -> Ref<'_, MaterialRegistry> {
        self.materials.borrow()
    }

    pub fn set_tree_position(&self, node_id: impl Into<String>, position: TreePosition) {
        self.positions.borrow_mut().insert(node_id.into(), position);
    }

    pub fn clear_tree_position(&self, node_id: &str) {
        self.positions.borrow_mut().remove(node_id);
    }

    pub fn tree_position(&self, node_id: &str) -> TreePosition {
        self.positions
            .borrow()
            .get(node_id)
            .cloned()
            .unwrap_or_default()
    }

    // ------------------------------------------------------------------
    // Events
    // ------------------------------------------------------------------

    pub fn on(&self, topic: &'static str, handler: impl Fn(&DragEvent, &()) + 'static) -> SubscriptionId {
        self.emitter.on(topic, handler)
    }

    pub fn on_any(&self, handler: impl Fn(&DragEvent, &()) + 'static) -> SubscriptionId {
        self.emitter.on_any(handler)
    }

    pub fn off(&self, id: SubscriptionId) -> bool {
        self.emitter.off(id)
    }

    fn emit(&self, event: DragEvent) {
        self.emitter.emit(event, &());
    }

    // ------------------------------------------------------------------
    // Gesture
    // ------------------------------------------------------------------

    /// Decide whether a pointer-down starts a drag.
    ///
    /// Returns `Ok(None)` when nothing draggable is under the pointer, the
    /// node's tree position or material forbids it, or a later `can_drag`
    /// superseded this check. A predicate that outlives the configured
    /// timeout cancels the gesture with [`DragError::PermissionTimeout`].
    ///
    /// # Runtime
    ///
    /// When the source material has a drag predicate, the returned future
    /// must be polled inside a Tokio runtime with the time driver enabled
    /// (`#[tokio::main]`, `#[tokio::test]`, or a builder with
    /// `enable_time()`). The timeout panics under other executors such as
    /// `futures::executor::block_on`.
    pub async fn can_drag(&self, page: &Page, event: SensorEvent) -> DragResult<Option<DragPermission>> {
        if self.phase() == GesturePhase::Detached {
            return Ok(None);
        }

        let tree = self.tree.as_ref();
        let Some(sensor) = self.sensors.borrow().pick(tree, event.target).cloned() else {
            debug!("pointer down outside every sensor");
            return Ok(None);
        };
        let Some((node_id, _)) = resolve_node_id(
            tree,
            event.target,
            sensor.container,
            &self.options.node_id_attribute,
        ) else {
            debug!("no node under pointer in sensor {}", sensor.name);
            return Ok(None);
        };
        let Some(node) = page.get_node(&node_id) else {
            debug!("element tagged with unknown node {}", node_id);
            return Ok(None);
        };
        if node.parent().is_none() {
            debug!("root node {} cannot be dragged", node_id);
            return Ok(None);
        }
        if self.tree_position(&node_id).can_drag == Some(false) {
            debug!("dragging {} is disabled by its tree position", node_id);
            return Ok(None);
        }

        self.cancel();
        let token = self.next_token.get() + 1;
        self.next_token.set(token);
        *self.gesture.borrow_mut() = Gesture::Checking {
            token,
            sensor: sensor.name.clone(),
            node_id: node_id.clone(),
        };

        let predicate = self
            .materials
            .borrow()
            .get(node.component_name())
            .and_then(Material::drag_predicate);

        if let Some(predicate) = predicate {
            let schema = node.export();
            match tokio::time::timeout(self.options.permission_timeout, predicate(&schema)).await {
                Ok(true) => {}
                Ok(false) => {
                    debug!("drag of {} vetoed by its material", node_id);
                    self.end_check(token);
                    return Ok(None);
                }
                Err(_) => {
                    if !self.end_check(token) {
                        return Ok(None);
                    }
                    let timeout_ms = self.options.permission_timeout.as_millis() as u64;
                    warn!("drag permission for {} timed out after {}ms", node_id, timeout_ms);
                    return Err(DragError::PermissionTimeout {
                        node_id,
                        timeout_ms,
                    });
                }
            }
        }

        {
            let mut gesture = self.gesture.borrow_mut();
            if !matches!(&*gesture, Gesture::Checking { token: current, .. } if *current == token) {
                debug!("drag check for {} was superseded", node_id);
                return Ok(None);
            }
            *gesture = Gesture::Active(DragContext {
                sensor: sensor.name.clone(),
                container: sensor.container,
                source: node_id.clone(),
                target: None,
            });
        }
        debug!("drag of {} started in sensor {}", node_id, sensor.name);

        let mut event = event;
        event.extra = ExtraData {
            start_node: Some(node_id.clone()),
            ..ExtraData::default()
        };
        Ok(Some(DragPermission {
            sensor: sensor.name,
            node_id,
            event,
        }))
    }

    /// Resolve the drop target under the pointer.
    ///
    /// Returns the event with the target node and drop descriptor attached
    /// when the drop is valid, or the event unchanged otherwise. Every call
    /// during an active gesture publishes a `dragging` event.
    pub fn can_drop(&self, page: &Page, event: SensorEvent) -> SensorEvent {
        let ctx = match &*self.gesture.borrow() {
            Gesture::Active(ctx) => ctx.clone(),
            Gesture::Checking { .. } => {
                debug!("pointer move coalesced while drag permission is pending");
                return event;
            }
            _ => return event,
        };

        let resolved = self.resolve_drop(page, &ctx, &event);
        if let Gesture::Active(active) = &mut *self.gesture.borrow_mut() {
            active.target = resolved.as_ref().ok().cloned();
        }

        match resolved {
            Ok(target) => {
                self.emit(DragEvent::Dragging {
                    source: ctx.source.clone(),
                    pointer: event.pointer,
                    target: Some(target.node_id.clone()),
                    descriptor: Some(target.descriptor),
                });

                let mut event = event;
                event.extra = ExtraData {
                    start_node: Some(ctx.source),
                    drop_node: Some(target.node_id),
                    drop_descriptor: Some(target.descriptor),
                };
                event
            }
            Err(reason) => {
                debug!("drop rejected: {}", reason);
                self.emit(DragEvent::Dragging {
                    source: ctx.source,
                    pointer: event.pointer,
                    target: None,
                    descriptor: None,
                });
                event
            }
        }
    }

    fn resolve_drop(
        &self,
        page: &Page,
        ctx: &DragContext,
        event: &SensorEvent,
    ) -> Result<DropTarget, Rejection> {
        let tree = self.tree.as_ref();
        if !encloses(tree, ctx.container, event.target) {
            return Err(Rejection::NoTarget);
        }
        let (target_id, element) = resolve_node_id(
            tree,
            event.target,
            ctx.container,
            &self.options.node_id_attribute,
        )
        .ok_or(Rejection::NoTarget)?;

        let source = page
            .get_node(&ctx.source)
            .ok_or_else(|| Rejection::SourceGone(ctx.source.clone()))?;
        let target = page.get_node(&target_id).ok_or(Rejection::NoTarget)?;

        let rule = self.tree_position(&target_id).can_drop;
        if rule == DropRule::Never {
            return Err(Rejection::DropForbidden(target_id));
        }
        if target_id == ctx.source {
            return Err(Rejection::SelfDrop(target_id));
        }
        if source.contains(&target_id) {
            return Err(Rejection::Cycle(ctx.source.clone(), target_id));
        }

        let rect = tree.bounding_rect(element).ok_or(Rejection::NoTarget)?;
        let orientation = tree.layout_axis(element).unwrap_or_default();
        let materials = self.materials.borrow();
        let mut descriptor = calculate_drop_descriptor(
            &rect,
            event.pointer,
            orientation,
            materials.is_container(target.component_name()),
            self.options.edge_band,
        );
        // the root has no siblings
        if target.parent().is_none() {
            descriptor.position = InsertPosition::Inside;
        }

        if !rule.allows(descriptor.position) {
            return Err(Rejection::PositionNotAllowed(descriptor.position, target_id));
        }

        let candidate = DropCandidate {
            source,
            target,
            position: descriptor.position,
        };
        if let Some(material) = materials.get(target.component_name()) {
            if !material.accepts_drop(&candidate) {
                return Err(Rejection::Vetoed(target_id));
            }
        }

        Ok(DropTarget {
            node_id: target_id,
            element,
            descriptor,
        })
    }

    /// Release the pointer: apply the resolved move through the page and
    /// end the gesture.
    pub fn drop(&self, page: &mut Page) -> DragResult<DropOutcome> {
        let previous = std::mem::replace(&mut *self.gesture.borrow_mut(), Gesture::Settling);
        let ctx = match previous {
            Gesture::Active(ctx) => ctx,
            Gesture::Detached => {
                *self.gesture.borrow_mut() = Gesture::Detached;
                return Ok(DropOutcome::NoGesture);
            }
            Gesture::Checking { node_id, .. } => {
                debug!("pointer released before drag permission for {} resolved", node_id);
                *self.gesture.borrow_mut() = Gesture::Idle;
                return Ok(DropOutcome::NoGesture);
            }
            Gesture::Idle | Gesture::Settling => {
                *self.gesture.borrow_mut() = Gesture::Idle;
                return Ok(DropOutcome::NoGesture);
            }
        };

        let result = match &ctx.target {
            Some(target) => page
                .move_node(&ctx.source, &target.node_id, target.descriptor.position)
                .map(|moved| {
                    if moved {
                        DropOutcome::Moved {
                            node_id: ctx.source.clone(),
                            target: target.node_id.clone(),
                            position: target.descriptor.position,
                        }
                    } else {
                        DropOutcome::Cancelled
                    }
                }),
            None => Ok(DropOutcome::Cancelled),
        };

        let accepted = matches!(result, Ok(DropOutcome::Moved { .. }));
        self.emit(DragEvent::DragEnd {
            source: ctx.source,
            accepted,
        });
        self.settle();

        result.map_err(DragError::from)
    }

    /// Abandon the current gesture. Returns false if there was none.
    pub fn cancel(&self) -> bool {
        let previous = {
            let mut gesture = self.gesture.borrow_mut();
            match &*gesture {
                Gesture::Active(_) | Gesture::Checking { .. } => {
                    std::mem::replace(&mut *gesture, Gesture::Settling)
                }
                _ => return false,
            }
        };

        if let Gesture::Active(ctx) = previous {
            debug!("drag of {} cancelled", ctx.source);
            self.emit(DragEvent::DragEnd {
                source: ctx.source,
                accepted: false,
            });
        }
        self.settle();
        true
    }

    /// Tear down when the host removes the editor: ends any gesture and
    /// drops every sensor, material, rule and subscriber.
    pub fn detach(&self) {
        self.cancel();
        *self.gesture.borrow_mut() = Gesture::Detached;
        self.sensors.borrow_mut().clear();
        *self.materials.borrow_mut() = MaterialRegistry::new();
        self.positions.borrow_mut().clear();
        self.emitter.clear();
    }

    fn settle(&self) {
        let mut gesture = self.gesture.borrow_mut();
        if matches!(&*gesture, Gesture::Settling) {
            *gesture = Gesture::Idle;
        }
    }

    /// Back to idle if the check identified by `token` is still current
    fn end_check(&self, token: u64) -> bool {
        let mut gesture = self.gesture.borrow_mut();
        match &*gesture {
            Gesture::Checking { token: current, .. } if *current == token => {
                *gesture = Gesture::Idle;
                true
            }
            _ => false,
        }
    }
}

impl fmt::Debug for DragAndDrop {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DragAndDrop")
            .field("options", &self.options)
            .field("phase", &self.phase())
            .field("sensors", &self.sensors.borrow().len())
            .field("materials", &self.materials.borrow().len())
            .finish()
    }
}
