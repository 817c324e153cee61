use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeMap;

use crate::folio::dates::{self, RecencyKey};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Tag {
    pub slug: String,
    pub display_name: String,
    pub description: Option<String>,
}

/// Display names by tag slug. A slug without a known tag shows as itself.
#[derive(Debug, Clone, Default)]
pub struct TagNames(BTreeMap<String, String>);

impl TagNames {
    pub fn name<'a>(&'a self, slug: &'a str) -> &'a str {
        self.0.get(slug).map_or(slug, String::as_str)
    }
}

impl<'a> FromIterator<&'a Tag> for TagNames {
    fn from_iter<I: IntoIterator<Item = &'a Tag>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|tag| (tag.slug.clone(), tag.display_name.clone()))
                .collect(),
        )
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MachineInfo {
    pub difficulty: Option<String>,
    pub os: Option<String>,
    pub ip: Option<String>,
}

impl MachineInfo {
    pub fn is_empty(&self) -> bool {
        self.difficulty.is_none() && self.os.is_none() && self.ip.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Writeup {
    pub slug: String,
    pub title: String,
    /// Tag slugs, in the order the author listed them.
    pub tags: Vec<String>,
    pub created_date: String,
    pub updated_date: String,
    pub machine_photo_url: Option<String>,
    pub machine: MachineInfo,
    #[serde(skip)]
    pub content_body: String,
}

impl Writeup {
    pub fn created_on(&self) -> Option<NaiveDate> {
        dates::parse_display_date(&self.created_date)
    }

    pub fn recency(&self) -> RecencyKey<'_> {
        RecencyKey {
            date: self.created_on(),
            slug: &self.slug,
        }
    }

    pub fn has_tag(&self, slug: &str) -> bool {
        self.tags.iter().any(|t| t == slug)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Project {
    pub slug: String,
    pub title: String,
    pub description: String,
    pub url: String,
    pub date: String,
}

/// Sort writeups newest first, the order every writeup listing uses.
pub fn sort_newest_first(writeups: &mut [Writeup]) {
    writeups.sort_by(|a, b| a.recency().cmp(&b.recency()));
}
