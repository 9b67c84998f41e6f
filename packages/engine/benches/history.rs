use criterion::{black_box, criterion_group, criterion_main, Criterion};
use lowcode_engine::History;
use lowcode_model::{NodeSchema, Page, PageSchema};
use serde_json::json;

fn large_page(rows: usize, cells: usize) -> Page {
    let mut schema = PageSchema::empty("Bench");
    for r in 0..rows {
        let mut row = NodeSchema::new("Row").with_id(format!("row{}", r));
        for c in 0..cells {
            row = row.with_child(
                NodeSchema::new("Text")
                    .with_id(format!("cell{}_{}", r, c))
                    .with_prop("content", json!(format!("Cell {} {}", r, c)))
                    .with_prop("style", json!({ "padding": 8, "color": "#333" })),
            );
        }
        schema.components_tree.children.push(row);
    }
    Page::from_schema(schema).expect("bench page is valid")
}

fn export_large_page(c: &mut Criterion) {
    let page = large_page(50, 20);

    c.bench_function("export_1000_nodes", |b| b.iter(|| black_box(page.export())));
}

fn record_step(c: &mut Criterion) {
    let page = large_page(50, 20);
    let history = History::attach(&page, 100);

    c.bench_function("history_add_step_1000_nodes", |b| {
        b.iter(|| history.add_step(black_box(&page)))
    });
}

fn undo_redo(c: &mut Criterion) {
    let mut page = large_page(50, 20);
    let history = History::attach(&page, 100);
    page.update_prop("cell0_0", "content", json!("edited"))
        .expect("edit applies");

    c.bench_function("history_undo_redo_1000_nodes", |b| {
        b.iter(|| {
            history.pre_step(&mut page).expect("undo");
            history.next_step(&mut page).expect("redo");
        })
    });
}

fn copy_subtree(c: &mut Criterion) {
    c.bench_function("copy_row_of_20", |b| {
        b.iter_with_setup(
            || large_page(10, 20),
            |mut page| page.copy_node_by_id(black_box("row0")),
        )
    });
}

criterion_group!(benches, export_large_page, record_step, undo_redo, copy_subtree);
criterion_main!(benches);
