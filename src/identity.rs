use std::fmt;
use std::str::FromStr;

use crate::feed::Entry;

/// An entry attribute that can take part in the identity composite.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryField {
    Title,
    Link,
    Description,
    Published,
    Guid,
}

impl EntryField {
    pub fn column(self) -> &'static str {
        match self {
            EntryField::Title => "title",
            EntryField::Link => "link",
            EntryField::Description => "description",
            EntryField::Published => "published",
            EntryField::Guid => "guid",
        }
    }

    /// Stored value; absent fields become the empty string.
    pub fn value(self, entry: &Entry) -> String {
        match self {
            EntryField::Title => entry.title.clone().unwrap_or_default(),
            EntryField::Link => entry.link.clone().unwrap_or_default(),
            EntryField::Description => entry.description.clone().unwrap_or_default(),
            EntryField::Published => entry
                .published
                .map(|d| d.to_rfc3339())
                .unwrap_or_default(),
            EntryField::Guid => entry.guid.clone().unwrap_or_default(),
        }
    }
}

impl FromStr for EntryField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "title" => Ok(EntryField::Title),
            "link" => Ok(EntryField::Link),
            "description" | "summary" => Ok(EntryField::Description),
            "published" => Ok(EntryField::Published),
            "guid" | "id" => Ok(EntryField::Guid),
            other => Err(format!(
                "unknown entry field '{other}' (expected title, link, description, published or guid)"
            )),
        }
    }
}

/// Fields whose combined values decide whether two entries are the same.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityKey {
    fields: Vec<EntryField>,
}

impl Default for IdentityKey {
    fn default() -> Self {
        Self {
            fields: vec![EntryField::Title, EntryField::Link, EntryField::Description],
        }
    }
}

impl IdentityKey {
    pub fn new(fields: impl IntoIterator<Item = EntryField>) -> Result<Self, String> {
        let mut unique = Vec::new();
        for field in fields {
            if !unique.contains(&field) {
                unique.push(field);
            }
        }
        if unique.is_empty() {
            return Err("identity needs at least one entry field".to_string());
        }
        Ok(Self { fields: unique })
    }

    pub fn fields(&self) -> &[EntryField] {
        &self.fields
    }

    pub fn columns(&self) -> Vec<&'static str> {
        self.fields().iter().map(|f| f.column()).collect()
    }

    /// An entry with every identity field empty cannot be told apart from
    /// any other such entry.
    pub fn is_decodable(&self, entry: &Entry) -> bool {
        self.fields().iter().any(|f| !f.value(entry).is_empty())
    }
}

impl fmt::Display for IdentityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.columns().join(","))
    }
}

impl FromStr for IdentityKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let fields = s
            .split(',')
            .filter(|part| !part.trim().is_empty())
            .map(EntryField::from_str)
            .collect::<Result<Vec<_>, _>>()?;
        IdentityKey::new(fields)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    #[test]
    fn test_default_is_title_link_description() {
        assert_eq!(IdentityKey::default().to_string(), "title,link,description");
    }

    #[test]
    fn test_parse_dedups_and_keeps_order() {
        let key: IdentityKey = "Link, title ,link".parse().unwrap();
        assert_eq!(key.fields(), &[EntryField::Link, EntryField::Title]);
    }

    #[test]
    fn test_parse_aliases() {
        let key: IdentityKey = "id,summary".parse().unwrap();
        assert_eq!(key.fields(), &[EntryField::Guid, EntryField::Description]);
    }

    #[test]
    fn test_parse_rejects_unknown_and_empty() {
        assert!("title,colour".parse::<IdentityKey>().is_err());
        assert!("".parse::<IdentityKey>().is_err());
        assert!(" , ".parse::<IdentityKey>().is_err());
    }

    #[test]
    fn test_values_of_absent_fields_are_empty() {
        let entry = Entry::default();
        for field in IdentityKey::new([
            EntryField::Title,
            EntryField::Link,
            EntryField::Description,
            EntryField::Published,
            EntryField::Guid,
        ])
        .unwrap()
        .fields()
        {
            assert_eq!(field.value(&entry), "");
        }
    }

    #[test]
    fn test_published_value_is_rfc3339() {
        let entry = Entry {
            published: Some(Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap()),
            ..Entry::default()
        };
        assert_eq!(
            EntryField::Published.value(&entry),
            "2024-01-02T03:04:05+00:00"
        );
    }

    #[test]
    fn test_is_decodable() {
        let key = IdentityKey::default();
        assert!(!key.is_decodable(&Entry::default()));
        let only_guid = Entry {
            guid: Some("urn:1".to_string()),
            ..Entry::default()
        };
        assert!(!key.is_decodable(&only_guid));
        let linked = Entry {
            link: Some("https://example.com/".to_string()),
            ..Entry::default()
        };
        assert!(key.is_decodable(&linked));
    }
}
