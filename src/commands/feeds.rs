use std::path::Path;

use anyhow::{Context as _, ensure};

use crate::store::Store;

pub(crate) fn cmd_feeds(db_path: &Path) -> anyhow::Result<()> {
    ensure!(
        db_path.exists(),
        "Database not found at {}; run `prompthound init` first",
        db_path.display()
    );
    let store = Store::open(db_path)
        .with_context(|| format!("failed to open database at {}", db_path.display()))?;

    for feed in store.feeds()? {
        let count = if store.table_exists(&feed.table_name)? {
            store.count_rows(&feed.table_name)?.to_string()
        } else {
            "-".to_string()
        };
        println!(
            "{}\t{}\t{}\t{}\t{}\t{}",
            feed.table_name,
            count,
            feed.title.as_deref().unwrap_or("(untitled)"),
            feed.link.as_deref().unwrap_or("-"),
            feed.first_ingested_at,
            feed.last_ingested_at
        );
    }
    Ok(())
}
