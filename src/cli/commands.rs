use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "lew", about = concat!("lewtwo v", env!("CARGO_PKG_VERSION"), " - tasks as a tree"), version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Run against a different workspace directory
    #[arg(short = 'C', long = "workspace-dir", global = true)]
    pub workspace_dir: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a lewtwo workspace in the current directory
    Init(InitArgs),
    /// Add a task, at the top level or under a parent
    Add(AddArgs),
    /// Show the task tree
    List(ListArgs),
    /// Show task details
    Show(ShowArgs),
    /// Toggle a task's done flag
    Done(DoneArgs),
    /// Edit a task's title, description or due date
    Edit(EditArgs),
    /// Delete a task and all its subtasks
    Rm(RmArgs),
    /// Move a task (with its subtasks) under another task or to the top level
    Mv(MvArgs),
    /// Show tasks due today
    Today,
    /// Show undone tasks with due dates, grouped by urgency
    Agenda,
    /// Search tasks by regex
    Search(SearchArgs),
    /// Show or set how due dates are displayed
    Display(DisplayArgs),
    /// Export the task tree to a JSON file
    Export(ExportArgs),
    /// Replace the task tree with one from an exported JSON file
    Import(ImportArgs),
    /// Show or edit workspace configuration
    Config(ConfigCmd),
}

// ---------------------------------------------------------------------------
// Init args
// ---------------------------------------------------------------------------

#[derive(Args)]
pub struct InitArgs {
    /// Due display for the new task tree (none, dates, badges, colours)
    #[arg(long)]
    pub due_display: Option<String>,
    /// Store file name inside .lewtwo/
    #[arg(long)]
    pub store: Option<String>,
}

// ---------------------------------------------------------------------------
// Read command args
// ---------------------------------------------------------------------------

#[derive(Args)]
pub struct ListArgs {
    /// Hide the subtasks of this task (repeatable)
    #[arg(long, value_name = "ID")]
    pub collapse: Vec<String>,
    /// Show top-level tasks only
    #[arg(long)]
    pub collapse_all: bool,
    /// Highlight this task
    #[arg(long, value_name = "ID")]
    pub focus: Option<String>,
}

#[derive(Args)]
pub struct ShowArgs {
    /// Task ID (or unique prefix) to show
    pub id: String,
}

#[derive(Args)]
pub struct SearchArgs {
    /// Regex pattern to search for (case-insensitive)
    pub pattern: String,
}

// ---------------------------------------------------------------------------
// Write command args
// ---------------------------------------------------------------------------

#[derive(Args)]
pub struct AddArgs {
    /// Task title
    pub title: String,
    /// Task description
    #[arg(short, long)]
    pub description: Option<String>,
    /// Due date (YYYY-MM-DD)
    #[arg(long)]
    pub due: Option<String>,
    /// Parent task ID
    #[arg(short, long, value_name = "ID")]
    pub parent: Option<String>,
}

#[derive(Args)]
pub struct DoneArgs {
    /// Task ID
    pub id: String,
}

#[derive(Args)]
pub struct EditArgs {
    /// Task ID
    pub id: String,
    /// New title
    #[arg(long)]
    pub title: Option<String>,
    /// New description (empty string clears it)
    #[arg(short, long)]
    pub description: Option<String>,
    /// New due date (YYYY-MM-DD)
    #[arg(long, conflicts_with = "clear_due")]
    pub due: Option<String>,
    /// Remove the due date
    #[arg(long)]
    pub clear_due: bool,
}

#[derive(Args)]
pub struct RmArgs {
    /// Task ID
    pub id: String,
}

#[derive(Args)]
pub struct MvArgs {
    /// Task ID to move
    pub id: String,
    /// New parent task ID
    #[arg(long, value_name = "ID", conflicts_with = "root")]
    pub parent: Option<String>,
    /// Move to the top level
    #[arg(long)]
    pub root: bool,
}

#[derive(Args)]
pub struct DisplayArgs {
    /// New mode: none, dates, badges or colours (omit to show the current one)
    pub mode: Option<String>,
}

#[derive(Args)]
pub struct ExportArgs {
    /// Output file (default: lewtwo_tasks.json in the current directory)
    pub path: Option<PathBuf>,
}

#[derive(Args)]
pub struct ImportArgs {
    /// Exported JSON file to read
    pub path: PathBuf,
}

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

#[derive(Args)]
pub struct ConfigCmd {
    #[command(subcommand)]
    pub action: Option<ConfigAction>,
}

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Print one config value
    Get(ConfigGetArgs),
    /// Set a config value, keeping the file's comments and layout
    Set(ConfigSetArgs),
}

#[derive(Args)]
pub struct ConfigGetArgs {
    /// Dotted key, e.g. display.default_due_display
    pub key: String,
}

#[derive(Args)]
pub struct ConfigSetArgs {
    /// Dotted key, e.g. display.default_due_display
    pub key: String,
    /// New value
    pub value: String,
}
