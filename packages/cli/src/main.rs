mod commands;

use clap::{Parser, Subcommand};
use colored::Colorize;
use commands::{
    copy, delete, init, move_node, set, tree, validate, CopyArgs, DeleteArgs, InitArgs, MoveArgs,
    SetArgs, TreeArgs, ValidateArgs,
};
use tracing_subscriber::EnvFilter;

/// Lowcode CLI - inspect and edit low-code page documents
#[derive(Parser, Debug)]
#[command(name = "lowcode")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create a config file and an empty page
    Init(InitArgs),

    /// Print the node tree of a page
    Tree(TreeArgs),

    /// Check that a page document loads
    Validate(ValidateArgs),

    /// Delete a node and its subtree
    Delete(DeleteArgs),

    /// Duplicate a node next to itself
    Copy(CopyArgs),

    /// Move a node relative to another node
    Move(MoveArgs),

    /// Set a prop value by dotted path
    Set(SetArgs),
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let cwd = match std::env::current_dir() {
        Ok(dir) => dir,
        Err(err) => {
            eprintln!("{} cannot read current directory: {}", "Error:".red().bold(), err);
            std::process::exit(1);
        }
    };

    let result = match cli.command {
        Command::Init(args) => init(args, &cwd),
        Command::Tree(args) => tree(args),
        Command::Validate(args) => validate(args),
        Command::Delete(args) => delete(args),
        Command::Copy(args) => copy(args),
        Command::Move(args) => move_node(args),
        Command::Set(args) => set(args),
    };

    if let Err(err) = result {
        eprintln!();
        eprintln!("{} {}", "Error:".red().bold(), err);
        eprintln!();
        std::process::exit(1);
    }
}
