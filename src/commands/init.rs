use std::path::Path;

use anyhow::Context as _;
use inquire::Confirm;
use tracing::{debug, info};

use crate::store::Store;

use super::Context;

pub(crate) fn cmd_init(
    ctx: &Context,
    db_path: &Path,
    dry_run: bool,
    assume_yes: bool,
) -> anyhow::Result<()> {
    if dry_run {
        report_dry_run(ctx, db_path);
        return Ok(());
    }

    if db_path.exists() && !assume_yes && !confirm_reinit(db_path) {
        ctx.console.error("Initialization cancelled.");
        return Ok(());
    }

    initialize(ctx, db_path)
}

/// Create the data directory and the database with its registry table.
pub(crate) fn initialize(ctx: &Context, db_path: &Path) -> anyhow::Result<()> {
    ctx.console.plain(&format!("Database path: {}", db_path.display()));
    Store::open(db_path)
        .with_context(|| format!("failed to initialize database at {}", db_path.display()))?;
    info!(path = %db_path.display(), "database initialized");
    ctx.console.success("Database initialized successfully.");
    Ok(())
}

/// Without a terminal to ask on, the answer is no.
fn confirm_reinit(db_path: &Path) -> bool {
    Confirm::new(&format!(
        "Database already exists at {}. Re-initialize it?",
        db_path.display()
    ))
    .with_default(false)
    .with_help_message("existing feeds and entries are kept")
    .prompt()
    .unwrap_or_else(|e| {
        debug!(error = %e, "confirmation prompt unavailable");
        false
    })
}

fn report_dry_run(ctx: &Context, db_path: &Path) {
    let app_dir = db_path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("."));
    ctx.console.progress("-- Dry Run Mode --");

    if app_dir.exists() {
        ctx.console
            .success(&format!("Directory exists: {}", app_dir.display()));
    } else {
        ctx.console
            .warn(&format!("Directory would be created: {}", app_dir.display()));
    }

    if db_path.exists() {
        ctx.console
            .success(&format!("Database exists: {}", db_path.display()));
    } else {
        ctx.console
            .warn(&format!("Database would be created: {}", db_path.display()));
    }
}
