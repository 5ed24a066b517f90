use std::io::{BufReader, Read};

use atom_syndication::{FixedDateTime, Link};

use super::{Entry, Feed, non_empty};
use crate::error::{IngestError, Result};

/// The `alternate` link if present, otherwise the first one.
fn primary_link(links: &[Link]) -> Option<String> {
    links
        .iter()
        .find(|l| l.rel() == "alternate")
        .or_else(|| links.first())
        .and_then(|l| non_empty(Some(l.href())))
}

/// atom_syndication fills a missing `<updated>` with the Unix epoch.
fn stated(date: &FixedDateTime) -> Option<&FixedDateTime> {
    (date.timestamp() != 0).then_some(date)
}

pub fn parse<R: Read>(reader: R) -> Result<Feed> {
    let feed = atom_syndication::Feed::read_from(BufReader::new(reader))
        .map_err(|e| IngestError::FeedParse(format!("invalid Atom document: {e}")))?;

    let entries = feed
        .entries()
        .iter()
        .map(|entry| Entry {
            title: non_empty(Some(entry.title().as_str())),
            link: primary_link(entry.links()),
            description: non_empty(entry.summary().map(|s| s.as_str()))
                .or_else(|| non_empty(entry.content().and_then(|c| c.value()))),
            published: entry
                .published()
                .or_else(|| stated(entry.updated()))
                .map(|d| d.to_utc()),
            guid: non_empty(Some(entry.id())),
            author: entry
                .authors()
                .first()
                .and_then(|p| non_empty(Some(p.name()))),
        })
        .collect();

    Ok(Feed {
        title: non_empty(Some(feed.title().as_str())),
        link: primary_link(feed.links()),
        description: non_empty(feed.subtitle().map(|s| s.as_str())),
        entries,
    })
}
