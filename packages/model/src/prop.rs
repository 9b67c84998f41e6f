//! # Props and Slots
//!
//! A node's props are kept in insertion order. Plain JSON values are stored
//! untouched; any value containing a `SLOT` marker is unfolded so that the
//! slot's nodes live in the page arena like every other node. A [`Slot`] only
//! records the ids of its top-level nodes plus a navigational back-reference
//! (owner node id + prop path) to the prop that holds it.

use std::borrow::Cow;

use serde_json::{Map, Value};

use crate::schema::is_slot_object;

/// Separator between prop path segments (`columns.0.render`)
pub const PATH_SEPARATOR: char = '.';

/// Escapes a literal separator (or itself) inside a segment: `a\.b` is the
/// single key `a.b`
pub const PATH_ESCAPE: char = '\\';

/// A prop value in arena form
#[derive(Debug, Clone, PartialEq)]
pub enum PropValue {
    /// Any value that contains no slot
    Json(Value),

    /// Array with at least one slot somewhere below it
    Array(Vec<PropValue>),

    /// Object with at least one slot somewhere below it
    Object(Vec<(String, PropValue)>),

    Slot(Slot),
}

/// A named rendering region owning its own node sub-tree
#[derive(Debug, Clone, PartialEq)]
pub struct Slot {
    /// Node owning the prop this slot lives in
    pub owner: String,

    /// Path of the slot inside the owner's props
    pub path: String,

    /// Top-level nodes of the slot, in order
    pub children: Vec<String>,

    /// Everything from the persisted object except `value`
    /// (`type`, `renderType`, `params`, ...)
    pub meta: Map<String, Value>,
}

impl Slot {
    pub fn render_type(&self) -> Option<&str> {
        self.meta.get("renderType").and_then(Value::as_str)
    }
}

/// A named prop attached to a node
#[derive(Debug, Clone, PartialEq)]
pub struct Prop {
    pub name: String,
    pub value: PropValue,
}

/// Ordered prop list
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Props {
    entries: Vec<Prop>,
}

impl Props {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&Prop> {
        self.entries.iter().find(|p| p.name == name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Prop> {
        self.entries.iter_mut().find(|p| p.name == name)
    }

    /// Insert or replace, keeping the original position on replace.
    /// Returns the previous value.
    pub fn insert(&mut self, name: String, value: PropValue) -> Option<PropValue> {
        match self.get_mut(&name) {
            Some(prop) => Some(std::mem::replace(&mut prop.value, value)),
            None => {
                self.entries.push(Prop { name, value });
                None
            }
        }
    }

    pub fn remove(&mut self, name: &str) -> Option<Prop> {
        let pos = self.entries.iter().position(|p| p.name == name)?;
        Some(self.entries.remove(pos))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Prop> {
        self.entries.iter()
    }

    /// Find the slot stored at `path`
    pub fn slot(&self, path: &str) -> Option<&Slot> {
        let segments = split_path(path);
        let (name, rest) = segments.split_first()?;
        self.get(name)?.value.find_slot(rest.iter().map(String::as_str))
    }

    pub fn slot_mut(&mut self, path: &str) -> Option<&mut Slot> {
        let segments = split_path(path);
        let (name, rest) = segments.split_first()?;
        self.get_mut(name)?
            .value
            .find_slot_mut(rest.iter().map(String::as_str))
    }

    /// Every slot in every prop, depth first
    pub fn slots(&self) -> Vec<&Slot> {
        let mut out = Vec::new();
        for prop in &self.entries {
            prop.value.collect_slots(&mut out);
        }
        out
    }
}

impl PropValue {
    /// True when `value` holds a slot marker at any depth
    pub fn contains_slot(value: &Value) -> bool {
        match value {
            Value::Array(items) => items.iter().any(Self::contains_slot),
            Value::Object(map) => is_slot_object(map) || map.values().any(Self::contains_slot),
            _ => false,
        }
    }

    /// Read-only JSON view; slot contents are rendered as empty arrays.
    /// Use [`Page::export_prop`](crate::Page::export_prop) for the full value.
    pub fn shallow_json(&self) -> Value {
        match self {
            PropValue::Json(v) => v.clone(),
            PropValue::Array(items) => Value::Array(items.iter().map(Self::shallow_json).collect()),
            PropValue::Object(fields) => Value::Object(
                fields
                    .iter()
                    .map(|(k, v)| (k.clone(), v.shallow_json()))
                    .collect(),
            ),
            PropValue::Slot(slot) => {
                let mut map = slot.meta.clone();
                map.insert("value".to_string(), Value::Array(Vec::new()));
                Value::Object(map)
            }
        }
    }

    fn find_slot<'a>(&self, mut segments: impl Iterator<Item = &'a str>) -> Option<&Slot> {
        match (self, segments.next()) {
            (PropValue::Slot(slot), None) => Some(slot),
            (PropValue::Array(items), Some(seg)) => {
                let index: usize = seg.parse().ok()?;
                items.get(index)?.find_slot(segments)
            }
            (PropValue::Object(fields), Some(seg)) => fields
                .iter()
                .find(|(k, _)| k == seg)
                .and_then(|(_, v)| v.find_slot(segments)),
            _ => None,
        }
    }

    fn find_slot_mut<'a>(
        &mut self,
        mut segments: impl Iterator<Item = &'a str>,
    ) -> Option<&mut Slot> {
        match (self, segments.next()) {
            (PropValue::Slot(slot), None) => Some(slot),
            (PropValue::Array(items), Some(seg)) => {
                let index: usize = seg.parse().ok()?;
                items.get_mut(index)?.find_slot_mut(segments)
            }
            (PropValue::Object(fields), Some(seg)) => fields
                .iter_mut()
                .find(|(k, _)| k == seg)
                .and_then(|(_, v)| v.find_slot_mut(segments)),
            _ => None,
        }
    }

    pub(crate) fn collect_slots<'a>(&'a self, out: &mut Vec<&'a Slot>) {
        match self {
            PropValue::Json(_) => {}
            PropValue::Array(items) => items.iter().for_each(|v| v.collect_slots(out)),
            PropValue::Object(fields) => fields.iter().for_each(|(_, v)| v.collect_slots(out)),
            PropValue::Slot(slot) => out.push(slot),
        }
    }
}

/// Escape a raw key so it reads back as one segment
pub fn escape_segment(segment: &str) -> Cow<'_, str> {
    if !segment.contains([PATH_SEPARATOR, PATH_ESCAPE]) {
        return Cow::Borrowed(segment);
    }
    let mut out = String::with_capacity(segment.len() + 2);
    for c in segment.chars() {
        if c == PATH_SEPARATOR || c == PATH_ESCAPE {
            out.push(PATH_ESCAPE);
        }
        out.push(c);
    }
    Cow::Owned(out)
}

/// Split a path into raw keys, honouring escapes
pub fn split_path(path: &str) -> Vec<String> {
    let mut segments = Vec::new();
    let mut current = String::new();
    let mut chars = path.chars();
    while let Some(c) = chars.next() {
        match c {
            PATH_ESCAPE => current.extend(chars.next()),
            PATH_SEPARATOR => segments.push(std::mem::take(&mut current)),
            c => current.push(c),
        }
    }
    segments.push(current);
    segments
}

/// Append a raw key to an escaped path
pub(crate) fn join_path(base: &str, segment: &str) -> String {
    let segment = escape_segment(segment);
    if base.is_empty() {
        segment.into_owned()
    } else {
        format!("{}{}{}", base, PATH_SEPARATOR, segment)
    }
}
