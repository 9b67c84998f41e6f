use anyhow::Result;
use clap::Args;
use colored::Colorize;
use lowcode_engine::{EngineConfig, PageDocument, DEFAULT_CONFIG_NAME};
use lowcode_model::{Page, PageSchema};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Args)]
pub struct InitArgs {
    /// Name of the starter page
    #[arg(short, long, default_value = "Home")]
    pub name: String,

    /// Page file to create
    #[arg(short, long, default_value = "page.json")]
    pub page: PathBuf,

    /// Force overwrite existing files
    #[arg(short, long)]
    pub force: bool,
}

pub fn init(args: InitArgs, cwd: &Path) -> Result<()> {
    let config_path = cwd.join(DEFAULT_CONFIG_NAME);
    let page_path = cwd.join(&args.page);

    if (config_path.exists() || page_path.exists()) && !args.force {
        println!(
            "{} {} or {} already exists",
            "⚠️".yellow(),
            DEFAULT_CONFIG_NAME.bright_white(),
            args.page.display().to_string().bright_white()
        );
        println!("Use --force to overwrite");
        return Ok(());
    }

    println!("{}", "📝 Initializing lowcode project...".bright_blue().bold());

    let config_json = serde_json::to_string_pretty(&EngineConfig::default())?;
    fs::write(&config_path, config_json + "\n")?;
    println!("  {} Created {}", "✓".green(), DEFAULT_CONFIG_NAME);

    let page = Page::from_schema(PageSchema::empty(args.name.as_str()))?;
    let mut doc = PageDocument::from_page(page);
    doc.save_as(&page_path)?;
    println!("  {} Created {}", "✓".green(), args.page.display());

    println!();
    println!("{}", "✅ Project initialized!".green().bold());
    println!();
    println!("Next steps:");
    println!("  1. Run: lowcode tree {}", args.page.display());
    println!("  2. Edit nodes with lowcode copy / move / set / delete");

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_init_writes_config_and_page() {
        let dir = TempDir::new().unwrap();
        let args = InitArgs {
            name: "Landing".into(),
            page: PathBuf::from("landing.json"),
            force: false,
        };
        init(args, dir.path()).unwrap();

        let config = EngineConfig::load(dir.path()).unwrap();
        assert_eq!(config, EngineConfig::default());

        let doc = PageDocument::load(dir.path().join("landing.json")).unwrap();
        assert!(doc.load_error().is_none());
        assert_eq!(doc.page().name(), "Landing");
        assert!(doc.page().root().children().is_empty());
    }

    #[test]
    fn test_init_keeps_existing_files() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join(DEFAULT_CONFIG_NAME),
            "{ \"history\": { \"maxLevels\": 7 } }",
        )
        .unwrap();

        let args = InitArgs {
            name: "Home".into(),
            page: PathBuf::from("page.json"),
            force: false,
        };
        init(args, dir.path()).unwrap();

        assert_eq!(EngineConfig::load(dir.path()).unwrap().history.max_levels, 7);
        assert!(!dir.path().join("page.json").exists());
    }

    #[test]
    fn test_init_force_overwrites() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("page.json"), "not json").unwrap();

        let args = InitArgs {
            name: "Fresh".into(),
            page: PathBuf::from("page.json"),
            force: true,
        };
        init(args, dir.path()).unwrap();

        let doc = PageDocument::load(dir.path().join("page.json")).unwrap();
        assert_eq!(doc.page().name(), "Fresh");
    }
}
