pub mod atom;
pub mod rss;

use chrono::{DateTime, Utc};

use crate::error::{IngestError, Result};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Feed {
    pub title: Option<String>,
    pub link: Option<String>,
    pub description: Option<String>,
    pub entries: Vec<Entry>,
}

impl Feed {
    /// A document that parsed but carries neither a title nor entries.
    pub fn is_unrecognizable(&self) -> bool {
        self.title.is_none() && self.entries.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Entry {
    pub title: Option<String>,
    pub link: Option<String>,
    pub description: Option<String>,
    pub published: Option<DateTime<Utc>>,
    /// RSS `guid` or Atom `id`.
    pub guid: Option<String>,
    pub author: Option<String>,
}

/// Blank strings count as absent.
pub(crate) fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn first_match(text: &str, needles: &[&str]) -> Option<usize> {
    needles.iter().filter_map(|n| text.find(n)).min()
}

fn reason(err: IngestError) -> String {
    match err {
        IngestError::FeedParse(msg) => msg,
        other => other.to_string(),
    }
}

/// Parse an RSS or Atom document.
///
/// The format whose root tag shows up first is tried first; if that parser
/// rejects the document the other one gets a go.
pub fn parse(bytes: &[u8]) -> Result<Feed> {
    let text = String::from_utf8_lossy(bytes);
    let rss_at = first_match(&text, &["<rss", "<rdf:RDF"]);
    let atom_at = first_match(&text, &["<feed"]);

    let atom_first = match (rss_at, atom_at) {
        (Some(r), Some(a)) => a < r,
        (None, Some(_)) => true,
        _ => false,
    };
    let [first, second]: [fn(&[u8]) -> Result<Feed>; 2] = if atom_first {
        [|b| atom::parse(b), |b| rss::parse(b)]
    } else {
        [|b| rss::parse(b), |b| atom::parse(b)]
    };

    first(bytes).or_else(|first_err| {
        second(bytes).map_err(|second_err| {
            IngestError::FeedParse(format!("{}; {}", reason(first_err), reason(second_err)))
        })
    })
}
