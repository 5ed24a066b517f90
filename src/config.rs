use std::path::PathBuf;

use anyhow::Context;

pub const APP_ID: &str = "dev.pirateninja.prompthound";
pub const DB_FILE_NAME: &str = "prompthound.db";

/// Database location: the explicit path if given, otherwise
/// `<user data dir>/dev.pirateninja.prompthound/prompthound.db`.
pub fn resolve_db_path(explicit: Option<PathBuf>) -> anyhow::Result<PathBuf> {
    match explicit {
        Some(path) => Ok(path),
        None => default_db_path(),
    }
}

fn default_db_path() -> anyhow::Result<PathBuf> {
    let data_dir = dirs::data_dir().context("could not determine the user data directory")?;
    Ok(data_dir.join(APP_ID).join(DB_FILE_NAME))
}
