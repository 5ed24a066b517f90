use std::fs;
use std::path::Path;
use std::time::Duration;

use chrono::{SecondsFormat, Utc};
use rusqlite::{Connection, ErrorCode, OptionalExtension, params};
use tracing::{debug, warn};

use crate::error::{IngestError, Result};
use crate::feed::{Entry, Feed};
use crate::identity::IdentityKey;

pub const REGISTRY_TABLE: &str = "feeds";

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, PartialEq)]
pub struct RegisteredFeed {
    pub table_name: String,
    pub title: Option<String>,
    pub link: Option<String>,
    pub first_ingested_at: String,
    pub last_ingested_at: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InsertStats {
    pub inserted: usize,
    pub skipped: usize,
}

fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

fn now() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
}

fn ensure_registry(conn: &Connection) -> Result<()> {
    conn.execute(
        &format!(
            r#"
            CREATE TABLE IF NOT EXISTS {} (
                table_name TEXT PRIMARY KEY,
                title TEXT,
                link TEXT,
                description TEXT,
                first_ingested_at TEXT NOT NULL,
                last_ingested_at TEXT NOT NULL
            )
            "#,
            quote_ident(REGISTRY_TABLE)
        ),
        [],
    )?;
    Ok(())
}

/// SQLite database holding the feeds registry and one table per feed.
pub struct Store {
    conn: Connection,
}

impl Store {
    /// Open (creating if needed) the database file at `path`.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        Self::from_connection(conn)
    }

    #[cfg(test)]
    pub fn open_in_memory() -> Result<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        conn.busy_timeout(BUSY_TIMEOUT)?;
        ensure_registry(&conn)?;
        Ok(Self { conn })
    }

    /// Run `f` inside one transaction, committed only if `f` succeeds.
    pub fn transaction<T, F>(&mut self, f: F) -> Result<T>
    where
        F: FnOnce(&Transaction<'_>) -> Result<T>,
    {
        let tx = Transaction {
            tx: self.conn.transaction()?,
        };
        let out = f(&tx)?;
        tx.tx.commit()?;
        Ok(out)
    }

    pub fn feeds(&self) -> Result<Vec<RegisteredFeed>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT table_name, title, link, first_ingested_at, last_ingested_at \
             FROM {} ORDER BY table_name",
            quote_ident(REGISTRY_TABLE)
        ))?;
        let rows = stmt.query_map([], |row| {
            Ok(RegisteredFeed {
                table_name: row.get(0)?,
                title: row.get(1)?,
                link: row.get(2)?,
                first_ingested_at: row.get(3)?,
                last_ingested_at: row.get(4)?,
            })
        })?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    pub fn count_rows(&self, table_name: &str) -> Result<u64> {
        let count: i64 = self.conn.query_row(
            &format!("SELECT COUNT(*) FROM {}", quote_ident(table_name)),
            [],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }

    pub fn table_exists(&self, table_name: &str) -> Result<bool> {
        let found = self
            .conn
            .query_row(
                "SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1",
                params![table_name],
                |_| Ok(()),
            )
            .optional()?;
        Ok(found.is_some())
    }
}

pub struct Transaction<'conn> {
    tx: rusqlite::Transaction<'conn>,
}

impl Transaction<'_> {
    pub fn ensure_registry(&self) -> Result<()> {
        ensure_registry(&self.tx)
    }

    /// Upsert the registry row for the feed stored in `table_name`.
    pub fn register_feed(&self, table_name: &str, feed: &Feed) -> Result<()> {
        let ts = now();
        self.tx.execute(
            &format!(
                r#"
                INSERT INTO {} (table_name, title, link, description, first_ingested_at, last_ingested_at)
                VALUES (?1, ?2, ?3, ?4, ?5, ?5)
                ON CONFLICT(table_name) DO UPDATE SET
                    title = excluded.title,
                    link = excluded.link,
                    description = excluded.description,
                    last_ingested_at = excluded.last_ingested_at
                "#,
                quote_ident(REGISTRY_TABLE)
            ),
            params![table_name, feed.title, feed.link, feed.description, ts],
        )?;
        Ok(())
    }

    /// Create the entry table if absent and make `identity` its only unique
    /// index. Indexes left by a different identity are replaced.
    pub fn ensure_entry_table(&self, table_name: &str, identity: &IdentityKey) -> Result<()> {
        let table = quote_ident(table_name);
        self.tx.execute(
            &format!(
                r#"
                CREATE TABLE IF NOT EXISTS {table} (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    title TEXT NOT NULL DEFAULT '',
                    link TEXT NOT NULL DEFAULT '',
                    description TEXT NOT NULL DEFAULT '',
                    published TEXT NOT NULL DEFAULT '',
                    guid TEXT NOT NULL DEFAULT '',
                    author TEXT,
                    ingested_at TEXT NOT NULL
                )
                "#
            ),
            [],
        )?;

        let wanted = identity.columns();
        let mut current = false;
        for (name, columns) in self.unique_indexes(table_name)? {
            if columns == wanted {
                current = true;
                continue;
            }
            self.tx
                .execute(&format!("DROP INDEX {}", quote_ident(&name)), [])?;
            debug!(table = table_name, index = %name, "dropped stale identity index");
        }

        if !current {
            let index = quote_ident(&format!("{table_name}_identity"));
            self.tx
                .execute(
                    &format!(
                        "CREATE UNIQUE INDEX {index} ON {table} ({})",
                        wanted.join(", ")
                    ),
                    [],
                )
                .map_err(|e| match e.sqlite_error_code() {
                    Some(ErrorCode::ConstraintViolation) => IngestError::IdentityConflict {
                        table: table_name.to_string(),
                        identity: identity.to_string(),
                    },
                    _ => e.into(),
                })?;
        }
        debug!(table = table_name, %identity, "entry table ready");
        Ok(())
    }

    /// Unique indexes created on `table_name` with their columns in order.
    fn unique_indexes(&self, table_name: &str) -> Result<Vec<(String, Vec<String>)>> {
        let mut list = self.tx.prepare(
            r#"SELECT name FROM pragma_index_list(?1) WHERE "unique" = 1 AND origin = 'c'"#,
        )?;
        let names = list
            .query_map(params![table_name], |row| row.get::<_, String>(0))?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        let mut info = self
            .tx
            .prepare("SELECT name FROM pragma_index_info(?1) ORDER BY seqno")?;
        let mut indexes = Vec::with_capacity(names.len());
        for name in names {
            let columns = info
                .query_map(params![name], |row| row.get::<_, String>(0))?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            indexes.push((name, columns));
        }
        Ok(indexes)
    }

    /// Insert entries, silently ignoring ones whose identity already exists.
    ///
    /// Entries with no value for any identity field are skipped with a
    /// warning instead of failing the batch.
    pub fn insert_entries(
        &self,
        table_name: &str,
        entries: &[Entry],
        identity: &IdentityKey,
    ) -> Result<InsertStats> {
        let mut stmt = self.tx.prepare(&format!(
            "INSERT OR IGNORE INTO {} \
             (title, link, description, published, guid, author, ingested_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            quote_ident(table_name)
        ))?;

        let ts = now();
        let mut stats = InsertStats::default();
        for (index, entry) in entries.iter().enumerate() {
            if !identity.is_decodable(entry) {
                let err = IngestError::EntryDecode {
                    index,
                    fields: identity.to_string(),
                };
                warn!(table = table_name, error = %err, "skipping entry");
                stats.skipped += 1;
                continue;
            }
            stats.inserted += stmt.execute(params![
                entry.title.as_deref().unwrap_or_default(),
                entry.link.as_deref().unwrap_or_default(),
                entry.description.as_deref().unwrap_or_default(),
                entry.published.map(|d| d.to_rfc3339()).unwrap_or_default(),
                entry.guid.as_deref().unwrap_or_default(),
                entry.author,
                ts,
            ])?;
        }
        Ok(stats)
    }
}
