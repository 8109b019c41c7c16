mod init;
pub use init::cmd_init;

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::cli::commands::*;
use crate::cli::output::*;
use crate::io::config_io;
use crate::io::lock::StoreLock;
use crate::io::store::{self, FileStore, StoreError};
use crate::io::transfer::{self, EXPORT_FILE_NAME};
use crate::io::workspace::Workspace;
use crate::logging;
use crate::model::settings::DueDisplay;
use crate::model::task::TaskId;
use crate::model::tree::{TaskTree, TreeError};
use crate::ops::{search, task_ops};
use crate::util::date::{self, parse_date_input};
use crate::view::{DetailView, MainPanel, MainView, ViewState};

type CmdResult = Result<(), Box<dyn std::error::Error>>;

// ---------------------------------------------------------------------------
// Dispatch
// ---------------------------------------------------------------------------

pub fn dispatch(cli: Cli) -> CmdResult {
    let json = cli.json;
    let start = resolve_start(cli.workspace_dir.as_deref())?;

    match cli.command {
        // Init runs before workspace discovery
        Commands::Init(args) => cmd_init(args, &start),
        command => dispatch_in_workspace(command, &start, json),
    }
}

fn dispatch_in_workspace(command: Commands, start: &Path, json: bool) -> CmdResult {
    let workspace = Workspace::discover(start)?;
    logging::init(&workspace.config.log.level);
    debug!(root = %workspace.root.display(), "workspace loaded");

    match command {
        Commands::Init(args) => cmd_init(args, start),

        // Read commands
        Commands::List(args) => cmd_list(&workspace, args, json),
        Commands::Show(args) => cmd_show(&workspace, args, json),
        Commands::Today => cmd_today(&workspace, json),
        Commands::Agenda => cmd_agenda(&workspace, json),
        Commands::Search(args) => cmd_search(&workspace, args, json),
        Commands::Export(args) => cmd_export(&workspace, args),

        // Write commands
        Commands::Add(args) => cmd_add(&workspace, args, json),
        Commands::Done(args) => cmd_done(&workspace, args, json),
        Commands::Edit(args) => cmd_edit(&workspace, args, json),
        Commands::Rm(args) => cmd_rm(&workspace, args),
        Commands::Mv(args) => cmd_mv(&workspace, args),
        Commands::Display(args) => cmd_display(&workspace, args, json),
        Commands::Import(args) => cmd_import(&workspace, args),

        Commands::Config(args) => cmd_config(&workspace, args, json),
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Directory to start workspace discovery from (-C, or the current directory)
fn resolve_start(dir: Option<&str>) -> Result<PathBuf, Box<dyn std::error::Error>> {
    match dir {
        Some(dir) => Ok(std::fs::canonicalize(dir)
            .map_err(|e| format!("cannot resolve -C path '{}': {}", dir, e))?),
        None => Ok(std::env::current_dir()?),
    }
}

/// The loaded tree together with the store it came from.
///
/// A session opened for writing holds the store lock from before the load
/// until it is dropped, after the save.
struct Session {
    store: FileStore,
    tree: TaskTree,
    _lock: Option<StoreLock>,
}

impl Session {
    fn open(workspace: &Workspace) -> Result<Session, StoreError> {
        Self::load(workspace, None)
    }

    fn open_for_write(workspace: &Workspace) -> Result<Session, StoreError> {
        let lock = workspace.store().lock()?;
        Self::load(workspace, Some(lock))
    }

    fn load(workspace: &Workspace, lock: Option<StoreLock>) -> Result<Session, StoreError> {
        let store = workspace.store();
        let default_display = workspace.config.display.default_due_display;
        let tree = store::load_tree_or_else(&store, || {
            let mut tree = TaskTree::new();
            tree.settings_mut().set_due_display(default_display);
            tree
        })?;
        Ok(Session {
            store,
            tree,
            _lock: lock,
        })
    }

    fn save(&mut self) -> Result<(), StoreError> {
        store::save_tree(&mut self.store, &self.tree)
    }
}

fn resolve(tree: &TaskTree, id: &str) -> Result<TaskId, TreeError> {
    tree.resolve_id(id.trim())
}

fn parse_due(input: Option<&str>) -> Result<Option<DateTime<Utc>>, date::DateError> {
    input.map(parse_date_input).transpose()
}

fn print_json<T: serde::Serialize>(value: &T) -> CmdResult {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

// ---------------------------------------------------------------------------
// Read commands
// ---------------------------------------------------------------------------

fn cmd_list(workspace: &Workspace, args: ListArgs, json: bool) -> CmdResult {
    let mut session = Session::open(workspace)?;
    let tree = &mut session.tree;
    let today = date::today();

    if let Some(ref focus) = args.focus {
        let id = resolve(tree, focus)?;
        tree.set_focus(&id)?;
    }

    let mut view = ViewState::new();
    for collapse in &args.collapse {
        let id = resolve(tree, collapse)?;
        if let Some(node) = tree.find_by_id(&id) {
            view.fold.set_collapsed(node, true);
        }
    }
    if args.collapse_all {
        // Render once so every task with children is known to the fold map
        view.render(tree, today);
        view.fold.collapse_all();
    }

    let MainPanel::List(rows) = view.render(tree, today) else {
        return Err("list view did not render rows".into());
    };

    if json {
        let rows: Vec<RowJson> = rows.iter().map(row_to_json).collect();
        return print_json(&rows);
    }
    if rows.is_empty() {
        println!("no tasks");
    }
    for row in &rows {
        println!("{}", format_row(row));
    }
    Ok(())
}

fn cmd_show(workspace: &Workspace, args: ShowArgs, json: bool) -> CmdResult {
    let mut session = Session::open(workspace)?;
    let id = resolve(&session.tree, &args.id)?;
    session.tree.set_focus(&id)?;

    let view = ViewState::new();
    let DetailView::Task(detail) = view.detail(&session.tree, date::today()) else {
        return Err(TreeError::NotFound(args.id).into());
    };
    if json {
        return print_json(&detail_to_json(&detail));
    }
    for line in format_task_detail(&detail) {
        println!("{}", line);
    }
    Ok(())
}

fn cmd_today(workspace: &Workspace, json: bool) -> CmdResult {
    let session = Session::open(workspace)?;
    let mut view = ViewState::with_main(MainView::Calendar);
    let MainPanel::Calendar { day, tasks } = view.render(&session.tree, date::today()) else {
        return Err("calendar view did not render".into());
    };

    if json {
        let tasks: Vec<TaskJson> = tasks.iter().map(|t| task_summary_json(t)).collect();
        return print_json(&tasks);
    }
    println!("== due {} ==", day.format("%d.%m.%Y"));
    if tasks.is_empty() {
        println!("nothing due today");
    }
    for task in tasks {
        println!("{}", format_task_line(task));
    }
    Ok(())
}

fn cmd_agenda(workspace: &Workspace, json: bool) -> CmdResult {
    let session = Session::open(workspace)?;
    let groups = crate::view::calendar::agenda(&session.tree, date::today());

    if json {
        return print_json(&agenda_to_json(&groups));
    }
    if groups.is_empty() {
        println!("no open tasks with due dates");
    }
    for line in format_agenda(&groups) {
        println!("{}", line);
    }
    Ok(())
}

fn cmd_search(workspace: &Workspace, args: SearchArgs, json: bool) -> CmdResult {
    let session = Session::open(workspace)?;
    let re = search::build_regex(&args.pattern)?;
    let hits = search::search_tasks(&session.tree, &re);

    if json {
        let hits: Vec<SearchHitJson> = hits
            .iter()
            .filter_map(|hit| {
                let task = session.tree.find_by_id(&hit.task_id)?;
                Some(hit_to_json(hit, &task.title))
            })
            .collect();
        return print_json(&hits);
    }

    // One line per task, listing every field that matched
    let mut order: Vec<&TaskId> = Vec::new();
    let mut fields: HashMap<&TaskId, Vec<&'static str>> = HashMap::new();
    for hit in &hits {
        let entry = fields.entry(&hit.task_id).or_insert_with(|| {
            order.push(&hit.task_id);
            Vec::new()
        });
        entry.push(hit.field.as_str());
    }
    for id in order {
        if let Some(task) = session.tree.find_by_id(id) {
            println!("{} (in {})", format_task_line(task), fields[id].join(", "));
        }
    }
    Ok(())
}

fn cmd_export(workspace: &Workspace, args: ExportArgs) -> CmdResult {
    let session = Session::open(workspace)?;
    let path = args.path.unwrap_or_else(|| PathBuf::from(EXPORT_FILE_NAME));
    let count = transfer::export_tree(&session.tree, &path)?;
    println!("exported {} tasks to {}", count, path.display());
    Ok(())
}

// ---------------------------------------------------------------------------
// Write commands
// ---------------------------------------------------------------------------

fn cmd_add(workspace: &Workspace, args: AddArgs, json: bool) -> CmdResult {
    let mut session = Session::open_for_write(workspace)?;
    let parent = args
        .parent
        .as_deref()
        .map(|p| resolve(&session.tree, p))
        .transpose()?;
    let due = parse_due(args.due.as_deref())?;

    let id = task_ops::add_task(
        &mut session.tree,
        &args.title,
        args.description,
        due,
        parent.as_ref(),
    )?;
    session.save()?;

    if json && let Some(task) = session.tree.find_by_id(&id) {
        return print_json(&task_to_json(task));
    }
    println!("{}", id);
    Ok(())
}

fn cmd_done(workspace: &Workspace, args: DoneArgs, json: bool) -> CmdResult {
    let mut session = Session::open_for_write(workspace)?;
    let id = resolve(&session.tree, &args.id)?;
    task_ops::toggle_done(&mut session.tree, &id)?;
    session.save()?;

    let task = session
        .tree
        .find_by_id(&id)
        .ok_or_else(|| TreeError::NotFound(id.to_string()))?;
    if json {
        return print_json(&task_summary_json(task));
    }
    println!("{}", format_task_line(task));
    Ok(())
}

fn cmd_edit(workspace: &Workspace, args: EditArgs, json: bool) -> CmdResult {
    if args.title.is_none() && args.description.is_none() && args.due.is_none() && !args.clear_due
    {
        return Err("nothing to edit (use --title, --description, --due or --clear-due)".into());
    }
    let mut session = Session::open_for_write(workspace)?;
    let id = resolve(&session.tree, &args.id)?;
    let due = parse_due(args.due.as_deref())?;
    session.tree.set_focus(&id)?;

    let mut edit = task_ops::EditSession::begin(&mut session.tree)
        .ok_or_else(|| TreeError::NotFound(id.to_string()))?;
    if let Some(title) = args.title {
        edit.title = title;
    }
    if let Some(description) = args.description {
        edit.description = description;
    }
    if due.is_some() {
        edit.due_date = due;
    }
    if args.clear_due {
        edit.due_date = None;
    }
    if let Err(e) = edit.commit(&mut session.tree) {
        edit.cancel(&mut session.tree);
        return Err(e.into());
    }
    session.save()?;

    let task = session
        .tree
        .find_by_id(&id)
        .ok_or_else(|| TreeError::NotFound(id.to_string()))?;
    if json {
        return print_json(&task_summary_json(task));
    }
    println!("{}", format_task_line(task));
    Ok(())
}

fn cmd_rm(workspace: &Workspace, args: RmArgs) -> CmdResult {
    let mut session = Session::open_for_write(workspace)?;
    let id = resolve(&session.tree, &args.id)?;
    let removed = session
        .tree
        .remove_node(&id)
        .ok_or_else(|| TreeError::NotFound(id.to_string()))?;
    session.save()?;

    let count = removed.subtree_len();
    if count == 1 {
        println!("removed {}", removed.title);
    } else {
        println!("removed {} and {} subtasks", removed.title, count - 1);
    }
    Ok(())
}

fn cmd_mv(workspace: &Workspace, args: MvArgs) -> CmdResult {
    let mut session = Session::open_for_write(workspace)?;
    let id = resolve(&session.tree, &args.id)?;
    let parent = match (&args.parent, args.root) {
        (Some(parent), _) => Some(resolve(&session.tree, parent)?),
        (None, true) => None,
        (None, false) => return Err("specify --parent <ID> or --root".into()),
    };
    session.tree.move_node(&id, parent.as_ref())?;
    session.save()?;

    match parent {
        Some(parent) => println!("moved {} under {}", id.short(), parent.short()),
        None => println!("moved {} to the top level", id.short()),
    }
    Ok(())
}

fn cmd_display(workspace: &Workspace, args: DisplayArgs, json: bool) -> CmdResult {
    let mut session = if args.mode.is_some() {
        Session::open_for_write(workspace)?
    } else {
        Session::open(workspace)?
    };
    if let Some(mode) = args.mode {
        let mode: DueDisplay = mode.parse()?;
        session.tree.settings_mut().set_due_display(mode);
        session.save()?;
    }

    let current = session.tree.settings().due_display();
    if json {
        return print_json(&DisplayJson {
            due_display: current.to_string(),
        });
    }
    println!("{}", current);
    Ok(())
}

fn cmd_import(workspace: &Workspace, args: ImportArgs) -> CmdResult {
    // Parse and validate before touching the store
    let tree = transfer::import_tree(&args.path)?;
    let mut store = workspace.store();
    let _lock = store.lock()?;
    store::save_tree(&mut store, &tree)?;
    println!("imported {} tasks from {}", tree.len(), args.path.display());
    Ok(())
}

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

fn cmd_config(workspace: &Workspace, args: ConfigCmd, json: bool) -> CmdResult {
    let (config, mut doc) = config_io::read_config(&workspace.dir)?;
    match args.action {
        None => {
            if json {
                return print_json(&config);
            }
            print!("{}", doc);
        }
        Some(ConfigAction::Get(a)) => {
            let value = config_io::get_config_value(&doc, &a.key)?
                .ok_or_else(|| format!("{} is not set", a.key))?;
            println!("{}", value);
        }
        Some(ConfigAction::Set(a)) => {
            config_io::set_config_value(&mut doc, &a.key, &a.value)?;
            config_io::write_config(&workspace.dir, &doc)?;
            println!("{} = {}", a.key, a.value);
        }
    }
    Ok(())
}
