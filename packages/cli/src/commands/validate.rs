use anyhow::{anyhow, Result};
use clap::Args;
use colored::Colorize;
use lowcode_engine::PageDocument;
use lowcode_model::{Page, ROOT_CONTAINER};
use std::collections::BTreeSet;
use std::path::PathBuf;

#[derive(Debug, Args)]
pub struct ValidateArgs {
    /// Page document to check
    pub input: PathBuf,

    /// Treat components missing from componentsMeta as errors
    #[arg(long)]
    pub strict: bool,
}

pub fn validate(args: ValidateArgs) -> Result<()> {
    println!("🔍 {} {}", "Checking".green().bold(), args.input.display());

    let doc = PageDocument::load(&args.input)?;
    if let Some(err) = doc.load_error() {
        return Err(anyhow!("{}: {}", args.input.display(), err));
    }

    let page = doc.page();
    let unknown = undeclared_components(page);

    println!("   Page: {}", page.name());
    println!("   Nodes: {}", page.node_count());
    for name in &unknown {
        println!("   {} {} is not declared in componentsMeta", "warning".yellow().bold(), name);
    }

    if args.strict && !unknown.is_empty() {
        return Err(anyhow!("{} undeclared component(s)", unknown.len()));
    }

    println!("   {} Page is valid", "✓".green());
    Ok(())
}

/// Component names used in the tree but missing from `componentsMeta`.
/// Pages that declare no metadata at all are not checked.
pub fn undeclared_components(page: &Page) -> BTreeSet<String> {
    let declared: BTreeSet<&str> = page
        .components_meta()
        .iter()
        .map(|meta| meta.component_name.as_str())
        .collect();
    let mut unknown = BTreeSet::new();
    if declared.is_empty() {
        return unknown;
    }

    page.walk(|node| {
        let name = node.component_name();
        if name != ROOT_CONTAINER && !declared.contains(name) {
            unknown.insert(name.to_string());
        }
    });
    unknown
}
