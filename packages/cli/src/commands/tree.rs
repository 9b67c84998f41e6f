use anyhow::Result;
use clap::Args;
use colored::Colorize;
use lowcode_engine::PageDocument;
use lowcode_model::{NodeRef, Page};
use std::fmt::Write;
use std::path::PathBuf;

#[derive(Debug, Args)]
pub struct TreeArgs {
    /// Page document to print
    pub input: PathBuf,

    /// Print the exported JSON instead of the outline
    #[arg(long)]
    pub json: bool,
}

pub fn tree(args: TreeArgs) -> Result<()> {
    let doc = PageDocument::load(&args.input)?;
    if let Some(err) = doc.load_error() {
        eprintln!("{} {}: {}", "⚠️".yellow(), args.input.display(), err);
    }

    if args.json {
        println!("{}", doc.to_json()?);
    } else {
        println!(
            "{} {} ({} nodes)",
            "Page".bold(),
            doc.page().name().bright_white(),
            doc.page().node_count()
        );
        print!("{}", render_tree(doc.page()));
    }

    Ok(())
}

/// Indented outline of the page, slot content under `#path` headings
pub fn render_tree(page: &Page) -> String {
    let mut out = String::new();
    render_node(page, page.root(), 0, &mut out);
    out
}

fn render_node(page: &Page, node: NodeRef<'_>, depth: usize, out: &mut String) {
    let indent = "  ".repeat(depth);
    let _ = writeln!(out, "{}{} [{}]", indent, node.component_name(), node.id());

    for slot in node.props().slots() {
        let _ = writeln!(out, "{}  #{}", indent, slot.path);
        for id in &slot.children {
            if let Some(child) = page.get_node(id) {
                render_node(page, child, depth + 2, out);
            }
        }
    }

    for child in node.child_nodes() {
        render_node(page, child, depth + 1, out);
    }
}
