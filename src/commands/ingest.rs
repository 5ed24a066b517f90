use std::fmt;
use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::Context as _;
use tracing::error;

use crate::ingest::{IngestOptions, IngestionResult, ingest};
use crate::store::Store;

use super::Context;
use super::init::initialize;

enum Source<'a> {
    Stdin,
    File(&'a Path),
}

impl fmt::Display for Source<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Source::Stdin => f.write_str("<stdin>"),
            Source::File(path) => write!(f, "{}", path.display()),
        }
    }
}

impl Source<'_> {
    fn read(&self) -> anyhow::Result<Vec<u8>> {
        match self {
            Source::Stdin => {
                let mut buf = Vec::new();
                std::io::stdin()
                    .read_to_end(&mut buf)
                    .context("failed to read standard input")?;
                Ok(buf)
            }
            Source::File(path) => {
                fs::read(path).with_context(|| format!("failed to read {}", path.display()))
            }
        }
    }
}

fn sources(files: &[PathBuf]) -> Vec<Source<'_>> {
    if files.is_empty() {
        return vec![Source::Stdin];
    }
    files
        .iter()
        .map(|f| {
            if f.as_os_str() == "-" {
                Source::Stdin
            } else {
                Source::File(f)
            }
        })
        .collect()
}

fn ingest_source(
    store: &mut Store,
    source: &Source<'_>,
    options: &IngestOptions,
) -> anyhow::Result<IngestionResult> {
    let raw = source.read()?;
    Ok(ingest(store, &raw, options)?)
}

fn summary(result: &IngestionResult) -> String {
    let mut line = format!(
        "{}: stored {} new of {} entries in table '{}'",
        result.feed_title.as_deref().unwrap_or("(untitled feed)"),
        result.entries_inserted,
        result.entries_seen,
        result.table_name
    );
    if result.entries_skipped > 0 {
        line.push_str(&format!(" ({} skipped)", result.entries_skipped));
    }
    line
}

/// Ingest each document in turn. A failing document is reported and does
/// not stop the remaining ones.
pub(crate) fn cmd_ingest(
    ctx: &Context,
    db_path: &Path,
    files: &[PathBuf],
    options: &IngestOptions,
) -> anyhow::Result<()> {
    if !db_path.exists() {
        ctx.console.warn(&format!(
            "Database not found at {}. Initializing...",
            db_path.display()
        ));
        initialize(ctx, db_path)?;
    }

    let mut store = Store::open(db_path)
        .with_context(|| format!("failed to open database at {}", db_path.display()))?;

    for source in sources(files) {
        ctx.console.progress(&format!("Ingesting from {source}..."));
        match ingest_source(&mut store, &source, options) {
            Ok(result) => ctx.console.plain(&summary(&result)),
            Err(e) => {
                let reason = format!("{e:#}");
                error!(source = %source, error = %reason, "failed to ingest document");
                ctx.console.error(&format!(
                    "An unexpected error occurred while processing {source}."
                ));
            }
        }
    }

    ctx.console.success("Ingestion complete.");
    Ok(())
}
