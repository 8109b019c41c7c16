use std::path::Path;

use crate::cli::commands::InitArgs;
use crate::io::config_io::validate_store_file;
use crate::io::store;
use crate::io::workspace::Workspace;
use crate::logging;
use crate::model::config::AppConfig;
use crate::model::settings::DueDisplay;
use crate::model::tree::TaskTree;

pub fn cmd_init(args: InitArgs, start: &Path) -> Result<(), Box<dyn std::error::Error>> {
    logging::init(logging::DEFAULT_LEVEL);

    let mut config = AppConfig::default();
    if let Some(mode) = args.due_display {
        config.display.default_due_display = mode.parse::<DueDisplay>()?;
    }
    if let Some(file) = args.store {
        validate_store_file(&file)?;
        config.store.file = file;
    }

    let workspace = Workspace::init(start, &config)?;

    // Seed the store so the chosen display mode is persisted with the tree
    let mut tree = TaskTree::new();
    tree.settings_mut()
        .set_due_display(config.display.default_due_display);
    let mut file_store = workspace.store();
    let _lock = file_store.lock()?;
    if file_store.path().exists() {
        println!(
            "keeping existing task store {}",
            file_store.path().display()
        );
    } else {
        store::save_tree(&mut file_store, &tree)?;
    }

    println!("initialized lewtwo workspace in {}", workspace.dir.display());
    Ok(())
}
