//! Undo/redo sequences through the engine context
//!
//! This tests:
//! - Head invariant after every recorded step
//! - Undo/redo round-trips
//! - Forward branch discarded by a new edit
//! - Reset, reload and drag-and-drop interplay with history

use std::rc::Rc;

use lowcode_engine::{Engine, EngineConfig, History};
use lowcode_layout::{ElementId, Material, Point, Rect, Sensor, SensorEvent, StaticElementTree};
use lowcode_model::{InsertPosition, NodePatch, NodeSchema, Page, PageSchema};
use serde_json::{json, Map};

fn page() -> Page {
    let (page, err) = Page::load(json!({
        "version": "1.0.0",
        "name": "Sequences",
        "componentsMeta": [],
        "componentsTree": {
            "id": "root",
            "componentName": "RootContainer",
            "children": [
                { "id": "row", "componentName": "Row", "children": [
                    { "id": "title", "componentName": "Text", "props": { "content": "v0" } }
                ]},
                { "id": "footer", "componentName": "Text" }
            ]
        }
    }));
    assert!(err.is_none());
    page
}

fn elements() -> StaticElementTree {
    let mut tree = StaticElementTree::new();
    tree.insert(ElementId(1), None, Rect::new(0.0, 0.0, 600.0, 600.0))
        .insert(ElementId(2), Some(ElementId(1)), Rect::new(0.0, 0.0, 600.0, 600.0))
        .insert(ElementId(3), Some(ElementId(2)), Rect::new(0.0, 0.0, 600.0, 200.0))
        .insert(ElementId(4), Some(ElementId(3)), Rect::new(0.0, 0.0, 300.0, 40.0))
        .insert(ElementId(5), Some(ElementId(2)), Rect::new(0.0, 300.0, 600.0, 40.0))
        .tag_node(ElementId(2), "root")
        .tag_node(ElementId(3), "row")
        .tag_node(ElementId(4), "title")
        .tag_node(ElementId(5), "footer");
    tree
}

fn engine() -> Engine {
    Engine::new(EngineConfig::default(), page(), Rc::new(elements()))
}

fn set_content(page: &mut Page, id: &str, content: &str) {
    let mut props = Map::new();
    props.insert("content".into(), json!(content));
    assert!(page.update_value(id, NodePatch::props(props)).unwrap());
}

fn assert_at_head(history: &History) {
    assert_eq!(history.records().len() - 1, history.current_index());
    assert!(!history.can_go_next_step());
}

#[test]
fn test_head_invariant_after_every_step() {
    let mut engine = engine();
    assert_at_head(engine.history());

    set_content(engine.page_mut(), "title", "v1");
    assert_at_head(engine.history());

    engine.page_mut().copy_node_by_id("title").unwrap().unwrap();
    assert_at_head(engine.history());

    engine.undo().unwrap();
    engine.page_mut().update_prop("footer", "style.color", json!("red")).unwrap();
    assert_at_head(engine.history());

    engine
        .page_mut()
        .move_node("footer", "row", InsertPosition::Inside)
        .unwrap();
    assert_at_head(engine.history());

    engine.history().add_step(engine.page());
    assert_at_head(engine.history());
}

#[test]
fn test_one_edit_is_one_step() {
    let mut engine = engine();

    set_content(engine.page_mut(), "title", "v1");
    engine.page_mut().update_prop("title", "content", json!("v2")).unwrap();
    engine.page_mut().delete_node_by_id("footer").unwrap();

    assert_eq!(engine.history().len(), 4);
}

#[test]
fn test_pre_then_next_round_trip() {
    let mut engine = engine();
    set_content(engine.page_mut(), "title", "v1");
    engine.page_mut().delete_node_by_id("footer").unwrap();

    let before = engine.page().export();
    assert!(engine.undo().unwrap());
    assert_ne!(engine.page().export(), before);
    assert!(engine.redo().unwrap());

    assert_eq!(engine.page().export(), before);
    assert_at_head(engine.history());
}

#[test]
fn test_undo_restores_previous_values() {
    let mut engine = engine();
    set_content(engine.page_mut(), "title", "v1");
    set_content(engine.page_mut(), "title", "v2");

    engine.undo().unwrap();
    assert_eq!(engine.page().export_prop("title", "content"), Some(json!("v1")));
    engine.undo().unwrap();
    assert_eq!(engine.page().export_prop("title", "content"), Some(json!("v0")));

    // at the origin
    assert!(!engine.history().can_go_pre_step());
    assert!(!engine.undo().unwrap());
    assert_eq!(engine.history().current_index(), 0);
}

#[test]
fn test_new_edit_discards_forward_branch() {
    let mut engine = engine();
    for i in 1..=3 {
        set_content(engine.page_mut(), "title", &format!("v{}", i));
    }
    let edits = 3;

    engine.undo().unwrap();
    engine.undo().unwrap();
    set_content(engine.page_mut(), "title", "branch");

    // the origin snapshot is the first record
    assert_eq!(engine.history().len() - 1, edits - 2 + 1);
    assert!(!engine.history().can_go_next_step());

    let contents: Vec<_> = engine
        .history()
        .records()
        .iter()
        .map(|r| r.components_tree.children[0].children[0].props["content"].clone())
        .collect();
    assert_eq!(contents, vec![json!("v0"), json!("v1"), json!("branch")]);
}

#[test]
fn test_snapshots_are_not_aliased() {
    let mut engine = engine();
    set_content(engine.page_mut(), "title", "v1");
    engine.undo().unwrap();

    // editing the replayed page must not reach back into the snapshot
    set_content(engine.page_mut(), "title", "changed");
    let first = engine.history().records()[0].clone();
    assert_eq!(
        first.components_tree.children[0].children[0].props["content"],
        json!("v0")
    );
}

#[test]
fn test_reset_returns_to_origin() {
    let mut engine = engine();
    let origin = engine.page().export();

    set_content(engine.page_mut(), "title", "v1");
    engine.page_mut().delete_node_by_id("row").unwrap();
    engine.undo().unwrap();

    engine.reset_history().unwrap();

    assert_eq!(engine.page().export(), origin);
    assert_eq!(engine.history().len(), 1);
    assert_eq!(engine.history().current_index(), 0);
    assert!(!engine.history().can_go_pre_step());
    assert!(!engine.history().can_go_next_step());

    // recording continues after a reset
    engine.page_mut().delete_node_by_id("footer").unwrap();
    assert_eq!(engine.history().len(), 2);
}

#[test]
fn test_origin_survives_trimming() {
    let config: EngineConfig = serde_json::from_value(json!({ "history": { "maxLevels": 2 } })).unwrap();
    let mut engine = Engine::new(config, page(), Rc::new(elements()));
    let origin = engine.page().export();

    for i in 1..=4 {
        set_content(engine.page_mut(), "title", &format!("v{}", i));
    }
    assert_eq!(engine.history().len(), 2);

    engine.reset_history().unwrap();
    assert_eq!(engine.page().export(), origin);
}

#[test]
fn test_reload_and_replays_are_not_recorded() {
    let mut engine = engine();
    set_content(engine.page_mut(), "title", "v1");

    engine
        .reload(vec![json!({ "package": "@ui/base", "version": "2.0.0" })])
        .unwrap();
    assert_eq!(engine.history().len(), 2);
    assert_eq!(engine.page().assets().len(), 1);

    engine.undo().unwrap();
    engine.redo().unwrap();
    assert_eq!(engine.history().len(), 2);
}

#[test]
fn test_assets_survive_replays() {
    let mut engine = engine();
    engine.page_mut().copy_node_by_id("footer").unwrap();
    engine.reload(vec![json!({ "package": "ui" })]).unwrap();

    engine.undo().unwrap();
    assert_eq!(engine.page().assets(), &[json!({ "package": "ui" })]);
    engine.redo().unwrap();
    assert_eq!(engine.page().assets(), &[json!({ "package": "ui" })]);

    engine.reset_history().unwrap();
    assert_eq!(engine.page().assets().len(), 1);
}

#[test]
fn test_ids_are_not_reissued_after_undo() {
    let mut engine = engine();
    let first = engine.page_mut().copy_node_by_id("footer").unwrap().unwrap();
    let second = engine.page_mut().copy_node_by_id("footer").unwrap().unwrap();

    engine.undo().unwrap();
    assert!(!engine.page().has_node(&second));

    engine.select_node(Some(first.as_str()));
    engine.page_mut().delete_node_by_id(&first).unwrap();
    let third = engine.page_mut().copy_node_by_id("footer").unwrap().unwrap();

    assert_ne!(third, first);
    assert_ne!(third, second);
    // a stale reference to a deleted node must not resolve to the new copy
    assert_eq!(engine.selected_node_id(), None);
}

#[test]
fn test_update_page_is_recorded() {
    let mut engine = engine();
    let mut schema = PageSchema::empty("Replaced");
    schema
        .components_tree
        .children
        .push(NodeSchema::new("Text").with_id("only"));

    engine.update_page(schema).unwrap();
    assert_eq!(engine.page().name(), "Replaced");
    assert_eq!(engine.history().len(), 2);

    engine.undo().unwrap();
    assert_eq!(engine.page().name(), "Sequences");
}

#[test]
fn test_selection_follows_undo() {
    let mut engine = engine();
    engine.page_mut().copy_node_by_id("footer").unwrap();
    let copy = engine.page().root().children()[2].clone();

    assert_eq!(engine.select_node(Some(copy.as_str())), Some(copy.clone()));
    engine.register_instance(copy.clone(), ElementId(42));

    engine.undo().unwrap();
    assert_eq!(engine.selected_node_id(), None);
    assert!(engine.get_component_instances(&copy).is_empty());
}

#[tokio::test]
async fn test_drop_is_one_undoable_step() {
    let mut engine = engine();
    engine.dnd().register_sensor(Sensor::new("canvas", ElementId(1)));
    engine.dnd().register_material(Material::new("Row").container(true));

    engine
        .can_drag(SensorEvent::new(ElementId(5), Point::new(10.0, 310.0)))
        .await
        .unwrap()
        .unwrap();
    let hover = engine.can_drop(SensorEvent::new(ElementId(3), Point::new(300.0, 100.0)));
    assert!(hover.is_droppable());
    engine.drop_node().unwrap();

    assert_eq!(engine.page().parent_of("footer").unwrap().id(), "row");
    assert_eq!(engine.history().len(), 2);

    engine.undo().unwrap();
    assert_eq!(engine.page().parent_of("footer").unwrap().id(), "root");
}

#[test]
fn test_shutdown_detaches() {
    let mut engine = engine();
    engine.shutdown();
    engine.page_mut().delete_node_by_id("footer").unwrap();
    assert_eq!(engine.history().len(), 1);
    assert!(!engine.history().is_attached());
}
