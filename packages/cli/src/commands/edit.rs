//! One-shot edits: load a page document, apply a single change, write it
//! back (or to `--output`).

use anyhow::Result;
use clap::{Args, ValueEnum};
use colored::Colorize;
use lowcode_engine::PageDocument;
use lowcode_model::{InsertPosition, Page};
use serde_json::Value;
use std::path::{Path, PathBuf};

#[derive(Debug, Args)]
pub struct OutputArgs {
    /// Write the result here instead of overwriting the input
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct DeleteArgs {
    /// Page document to edit
    pub input: PathBuf,

    /// Id of the node to delete
    pub id: String,

    #[command(flatten)]
    pub out: OutputArgs,
}

#[derive(Debug, Args)]
pub struct CopyArgs {
    /// Page document to edit
    pub input: PathBuf,

    /// Id of the node to duplicate
    pub id: String,

    #[command(flatten)]
    pub out: OutputArgs,
}

#[derive(Debug, Args)]
pub struct MoveArgs {
    /// Page document to edit
    pub input: PathBuf,

    /// Id of the node to move
    pub id: String,

    /// Id of the node to move next to or into
    pub target: String,

    #[arg(short, long, value_enum, default_value = "inside")]
    pub position: Position,

    #[command(flatten)]
    pub out: OutputArgs,
}

#[derive(Debug, Args)]
pub struct SetArgs {
    /// Page document to edit
    pub input: PathBuf,

    /// Id of the node to update
    pub id: String,

    /// Dotted prop path (`style.color`, `\.` for a literal dot in a key)
    pub path: String,

    /// JSON value; anything that is not valid JSON is stored as a string
    pub value: String,

    #[command(flatten)]
    pub out: OutputArgs,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Position {
    Before,
    After,
    Inside,
}

impl From<Position> for InsertPosition {
    fn from(position: Position) -> Self {
        match position {
            Position::Before => InsertPosition::Before,
            Position::After => InsertPosition::After,
            Position::Inside => InsertPosition::Inside,
        }
    }
}

pub fn delete(args: DeleteArgs) -> Result<()> {
    edit(&args.input, &args.out, |page| {
        page.try_delete_node(&args.id)?;
        Ok(format!("deleted {}", args.id))
    })
}

pub fn copy(args: CopyArgs) -> Result<()> {
    edit(&args.input, &args.out, |page| {
        let copy = page.try_copy_node(&args.id)?;
        Ok(format!("copied {} as {}", args.id, copy))
    })
}

pub fn move_node(args: MoveArgs) -> Result<()> {
    edit(&args.input, &args.out, |page| {
        page.try_move_node(&args.id, &args.target, args.position.into())?;
        Ok(format!(
            "moved {} {:?} {}",
            args.id,
            args.position,
            args.target
        ))
    })
}

pub fn set(args: SetArgs) -> Result<()> {
    let value = parse_value(&args.value);
    edit(&args.input, &args.out, |page| {
        page.try_update_prop(&args.id, &args.path, value)?;
        Ok(format!("set {}.{}", args.id, args.path))
    })
}

/// JSON if it parses, otherwise the raw text
pub fn parse_value(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}

fn edit(
    input: &Path,
    out: &OutputArgs,
    apply: impl FnOnce(&mut Page) -> Result<String>,
) -> Result<()> {
    let mut doc = PageDocument::load(input)?;
    if let Some(err) = doc.load_error() {
        return Err(anyhow::anyhow!("{}: {}", input.display(), err));
    }

    let summary = apply(doc.page_mut())?;

    match &out.output {
        Some(path) => doc.save_as(path)?,
        None => doc.save()?,
    }

    let written = doc.path().unwrap_or(input);
    println!("{} {} → {}", "✓".green(), summary, written.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::fs;
    use tempfile::TempDir;

    const SOURCE: &str = r#"{
        "version": "1.0.0",
        "name": "Cli",
        "componentsMeta": [],
        "componentsTree": {
            "id": "root",
            "componentName": "RootContainer",
            "children": [
                { "id": "row", "componentName": "Row" },
                { "id": "btn", "componentName": "Button", "props": { "text": "Go" } }
            ]
        }
    }"#;

    fn scratch() -> (TempDir, PathBuf) {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("page.json");
        fs::write(&path, SOURCE).unwrap();
        (dir, path)
    }

    #[test]
    fn test_parse_value() {
        assert_eq!(parse_value("12"), json!(12));
        assert_eq!(parse_value("{\"a\":true}"), json!({ "a": true }));
        assert_eq!(parse_value("red"), json!("red"));
    }

    #[test]
    fn test_move_writes_in_place() {
        let (_dir, path) = scratch();
        move_node(MoveArgs {
            input: path.clone(),
            id: "btn".into(),
            target: "row".into(),
            position: Position::Inside,
            out: OutputArgs { output: None },
        })
        .unwrap();

        let doc = PageDocument::load(&path).unwrap();
        assert_eq!(doc.page().parent_of("btn").unwrap().id(), "row");
    }

    #[test]
    fn test_set_to_output_leaves_input() {
        let (dir, path) = scratch();
        let output = dir.path().join("edited.json");
        set(SetArgs {
            input: path.clone(),
            id: "btn".into(),
            path: "style.color".into(),
            value: "red".into(),
            out: OutputArgs { output: Some(output.clone()) },
        })
        .unwrap();

        let edited = PageDocument::load(&output).unwrap();
        assert_eq!(edited.page().export_prop("btn", "style"), Some(json!({ "color": "red" })));
        let original = PageDocument::load(&path).unwrap();
        assert_eq!(original.page().export_prop("btn", "style"), None);
    }

    #[test]
    fn test_failed_edit_reports_and_keeps_file() {
        let (_dir, path) = scratch();
        let err = delete(DeleteArgs {
            input: path.clone(),
            id: "ghost".into(),
            out: OutputArgs { output: None },
        })
        .unwrap_err();
        assert!(err.to_string().contains("ghost"));

        assert_eq!(fs::read_to_string(&path).unwrap(), SOURCE);
    }

    #[test]
    fn test_root_cannot_be_copied() {
        let (_dir, path) = scratch();
        assert!(copy(CopyArgs {
            input: path,
            id: "root".into(),
            out: OutputArgs { output: None },
        })
        .is_err());
    }
}
