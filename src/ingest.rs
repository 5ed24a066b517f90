use std::borrow::Cow;
use std::io::Read;

use flate2::read::MultiGzDecoder;
use tracing::{debug, info};

use crate::error::{IngestError, Result};
use crate::feed;
use crate::identity::IdentityKey;
use crate::slug::slug;
use crate::store::{REGISTRY_TABLE, Store};

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];
const RESERVED_SUFFIX: &str = "-entries";

#[derive(Debug, Clone, Default)]
pub struct IngestOptions {
    pub identity: IdentityKey,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestionResult {
    pub feed_title: Option<String>,
    pub table_name: String,
    pub entries_seen: usize,
    pub entries_inserted: usize,
    pub entries_skipped: usize,
}

/// Undo gzip compression if `raw` carries the gzip magic bytes.
pub fn decompress(raw: &[u8]) -> Result<Cow<'_, [u8]>> {
    if !raw.starts_with(&GZIP_MAGIC) {
        return Ok(Cow::Borrowed(raw));
    }
    let mut out = Vec::new();
    MultiGzDecoder::new(raw)
        .read_to_end(&mut out)
        .map_err(|e| IngestError::FeedParse(format!("invalid gzip stream: {e}")))?;
    debug!(compressed = raw.len(), decompressed = out.len(), "gunzipped input");
    Ok(Cow::Owned(out))
}

/// Entry table for a feed title. Never collides with the registry or with
/// SQLite's internal tables.
pub fn table_key(title: Option<&str>) -> String {
    let key = slug(title.unwrap_or_default());
    if key == REGISTRY_TABLE || key.starts_with("sqlite") {
        format!("{key}{RESERVED_SUFFIX}")
    } else {
        key
    }
}

/// Parse one feed document and store its entries.
///
/// Everything is written in a single transaction: a failure leaves the
/// store exactly as it was.
pub fn ingest(store: &mut Store, raw: &[u8], options: &IngestOptions) -> Result<IngestionResult> {
    let content = decompress(raw)?;
    let feed = feed::parse(&content)?;
    if feed.is_unrecognizable() {
        return Err(IngestError::FeedParse(
            "document has neither a title nor entries".to_string(),
        ));
    }

    let table_name = table_key(feed.title.as_deref());
    let identity = &options.identity;

    let stats = store.transaction(|tx| {
        tx.ensure_registry()?;
        tx.register_feed(&table_name, &feed)?;
        tx.ensure_entry_table(&table_name, identity)?;
        tx.insert_entries(&table_name, &feed.entries, identity)
    })?;

    info!(
        table = %table_name,
        seen = feed.entries.len(),
        inserted = stats.inserted,
        skipped = stats.skipped,
        "feed ingested"
    );

    Ok(IngestionResult {
        feed_title: feed.title,
        table_name,
        entries_seen: feed.entries.len(),
        entries_inserted: stats.inserted,
        entries_skipped: stats.skipped,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::Compression;
    use flate2::write::GzEncoder;
    use std::io::Write;

    fn rss(title: &str, items: &[(&str, &str, &str)]) -> String {
        let items_xml: String = items
            .iter()
            .map(|(t, link, desc)| {
                format!(
                    "<item><title>{t}</title><link>{link}</link><description>{desc}</description></item>"
                )
            })
            .collect();
        format!(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0">
  <channel>
    <title>{title}</title>
    <link>https://example.com/</link>
    {items_xml}
  </channel>
</rss>"#
        )
    }

    fn gzip(bytes: &[u8]) -> Vec<u8> {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(bytes).unwrap();
        encoder.finish().unwrap()
    }

    fn ingest_default(store: &mut Store, doc: &[u8]) -> Result<IngestionResult> {
        ingest(store, doc, &IngestOptions::default())
    }

    #[test]
    fn test_single_entry_feed() {
        let mut store = Store::open_in_memory().unwrap();
        let doc = rss("Test Feed", &[("Hello", "https://example.com/1", "First")]);

        let result = ingest_default(&mut store, doc.as_bytes()).unwrap();

        assert_eq!(
            result,
            IngestionResult {
                feed_title: Some("Test Feed".to_string()),
                table_name: "test-feed".to_string(),
                entries_seen: 1,
                entries_inserted: 1,
                entries_skipped: 0,
            }
        );
        assert_eq!(store.count_rows("test-feed").unwrap(), 1);
        let feeds = store.feeds().unwrap();
        assert_eq!(feeds.len(), 1);
        assert_eq!(feeds[0].table_name, "test-feed");
        assert_eq!(feeds[0].link.as_deref(), Some("https://example.com/"));
    }

    #[test]
    fn test_two_feeds_get_two_tables() {
        let mut store = Store::open_in_memory().unwrap();
        let one = rss("Test Feed 1", &[("Hello", "https://example.com/1", "First")]);
        let two = rss("Test Feed 2", &[("Hello", "https://example.com/1", "First")]);

        ingest_default(&mut store, one.as_bytes()).unwrap();
        ingest_default(&mut store, two.as_bytes()).unwrap();

        assert_eq!(store.feeds().unwrap().len(), 2);
        assert_eq!(store.count_rows("test-feed-1").unwrap(), 1);
        assert_eq!(store.count_rows("test-feed-2").unwrap(), 1);
    }

    #[test]
    fn test_ingesting_twice_is_idempotent() {
        let mut store = Store::open_in_memory().unwrap();
        let doc = rss(
            "Blog",
            &[
                ("A", "https://example.com/a", "a"),
                ("B", "https://example.com/b", "b"),
            ],
        );

        ingest_default(&mut store, doc.as_bytes()).unwrap();
        let second = ingest_default(&mut store, doc.as_bytes()).unwrap();

        assert_eq!(second.entries_seen, 2);
        assert_eq!(second.entries_inserted, 0);
        assert_eq!(store.count_rows("blog").unwrap(), 2);
        assert_eq!(store.feeds().unwrap().len(), 1);
    }

    #[test]
    fn test_duplicate_entries_within_document() {
        let mut store = Store::open_in_memory().unwrap();
        let doc = rss(
            "Blog",
            &[
                ("A", "https://example.com/a", "a"),
                ("B", "https://example.com/b", "b"),
                ("A", "https://example.com/a", "a"),
            ],
        );

        let result = ingest_default(&mut store, doc.as_bytes()).unwrap();

        assert_eq!(result.entries_seen, 3);
        assert_eq!(result.entries_inserted, 2);
        assert_eq!(store.count_rows("blog").unwrap(), 2);
    }

    #[test]
    fn test_empty_feed_creates_empty_table() {
        let mut store = Store::open_in_memory().unwrap();
        let doc = rss("Quiet Blog", &[]);

        let result = ingest_default(&mut store, doc.as_bytes()).unwrap();

        assert_eq!(result.entries_seen, 0);
        assert!(store.table_exists("quiet-blog").unwrap());
        assert_eq!(store.count_rows("quiet-blog").unwrap(), 0);
        assert_eq!(store.feeds().unwrap().len(), 1);
    }

    #[test]
    fn test_malformed_content_leaves_store_untouched() {
        let mut store = Store::open_in_memory().unwrap();

        let err = ingest_default(&mut store, b"definitely not xml").unwrap_err();

        assert!(matches!(err, IngestError::FeedParse(_)));
        assert!(store.feeds().unwrap().is_empty());
    }

    #[test]
    fn test_feed_without_title_or_entries_is_rejected() {
        let mut store = Store::open_in_memory().unwrap();
        let doc = r#"<rss version="2.0"><channel></channel></rss>"#;

        let err = ingest_default(&mut store, doc.as_bytes()).unwrap_err();

        assert!(matches!(err, IngestError::FeedParse(_)));
        assert!(store.feeds().unwrap().is_empty());
    }

    #[test]
    fn test_untitled_feed_with_entries_is_stored() {
        let mut store = Store::open_in_memory().unwrap();
        let doc = r#"<rss version="2.0"><channel>
            <item><title>Orphan</title></item>
        </channel></rss>"#;

        let result = ingest_default(&mut store, doc.as_bytes()).unwrap();

        assert_eq!(result.feed_title, None);
        assert_eq!(result.table_name, slug(""));
        assert_eq!(store.count_rows(&result.table_name).unwrap(), 1);
    }

    #[test]
    fn test_gzip_input() {
        let mut store = Store::open_in_memory().unwrap();
        let doc = rss("Zipped", &[("A", "https://example.com/a", "a")]);

        let result = ingest_default(&mut store, &gzip(doc.as_bytes())).unwrap();

        assert_eq!(result.table_name, "zipped");
        assert_eq!(result.entries_inserted, 1);
    }

    #[test]
    fn test_corrupt_gzip_is_a_parse_error() {
        let mut store = Store::open_in_memory().unwrap();
        let mut broken = gzip(b"<rss></rss>");
        broken.truncate(10);
        broken.extend_from_slice(&[0xff; 16]);

        let err = ingest_default(&mut store, &broken).unwrap_err();

        assert!(matches!(err, IngestError::FeedParse(_)));
    }

    #[test]
    fn test_decompress_passes_plain_input_through() {
        let plain = b"<rss/>";
        assert!(matches!(decompress(plain).unwrap(), Cow::Borrowed(_)));
    }

    #[test]
    fn test_table_key_avoids_reserved_names() {
        assert_eq!(table_key(Some("Feeds")), "feeds-entries");
        assert_eq!(table_key(Some("SQLite Weekly")), "sqlite-weekly-entries");
        assert_eq!(table_key(Some("Feeds of Rust")), "feeds-of-rust");
    }

    #[test]
    fn test_identity_option_is_honored() {
        let mut store = Store::open_in_memory().unwrap();
        let doc = rss(
            "Blog",
            &[
                ("A", "https://example.com/a", "a"),
                ("A", "https://example.com/a2", "a2"),
            ],
        );
        let options = IngestOptions {
            identity: "title".parse().unwrap(),
        };

        let result = ingest(&mut store, doc.as_bytes(), &options).unwrap();

        assert_eq!(result.entries_inserted, 1);
    }

    #[test]
    fn test_default_identity_after_title_identity() {
        let mut store = Store::open_in_memory().unwrap();
        let by_title = IngestOptions {
            identity: "title".parse().unwrap(),
        };
        let first = rss("Blog", &[("A", "https://example.com/1", "a")]);
        let second = rss("Blog", &[("A", "https://example.com/2", "a")]);

        ingest(&mut store, first.as_bytes(), &by_title).unwrap();
        let result = ingest_default(&mut store, second.as_bytes()).unwrap();

        assert_eq!(result.entries_inserted, 1);
        assert_eq!(store.count_rows("blog").unwrap(), 2);
    }

    #[test]
    fn test_narrower_identity_over_colliding_rows_is_rejected() {
        let mut store = Store::open_in_memory().unwrap();
        let doc = rss(
            "Blog",
            &[
                ("A", "https://example.com/1", "a"),
                ("A", "https://example.com/2", "a"),
            ],
        );
        ingest_default(&mut store, doc.as_bytes()).unwrap();

        let by_title = IngestOptions {
            identity: "title".parse().unwrap(),
        };
        let err = ingest(&mut store, doc.as_bytes(), &by_title).unwrap_err();

        assert!(matches!(err, IngestError::IdentityConflict { .. }));
        assert_eq!(store.count_rows("blog").unwrap(), 2);
    }
}
