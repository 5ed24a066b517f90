use std::io::{BufReader, Read};

use chrono::DateTime;
use rss::Channel;

use super::{Entry, Feed, non_empty};
use crate::error::{IngestError, Result};

pub fn parse<R: Read>(reader: R) -> Result<Feed> {
    let channel = Channel::read_from(BufReader::new(reader))
        .map_err(|e| IngestError::FeedParse(format!("invalid RSS document: {e}")))?;

    let entries = channel
        .items()
        .iter()
        .map(|item| Entry {
            title: non_empty(item.title()),
            link: non_empty(item.link()),
            description: non_empty(item.description()),
            published: item
                .pub_date()
                .and_then(|d| DateTime::parse_from_rfc2822(d.trim()).ok())
                .map(|d| d.to_utc()),
            guid: non_empty(item.guid().map(|g| g.value())),
            author: non_empty(item.author()).or_else(|| {
                item.dublin_core_ext()
                    .and_then(|dc| non_empty(dc.creators().first().map(String::as_str)))
            }),
        })
        .collect();

    Ok(Feed {
        title: non_empty(Some(channel.title())),
        link: non_empty(Some(channel.link())),
        description: non_empty(Some(channel.description())),
        entries,
    })
}
