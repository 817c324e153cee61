//! Keyed edits of the fragment list inside a page's insertion container.
//!
//! A page is split once into `head`, the container's child nodes and
//! `tail`. Edits only ever touch the node list, and only the nodes keyed by
//! the entity being changed, so everything else serializes back to the same
//! bytes.

use chrono::NaiveDate;
use std::path::{Path, PathBuf};

use crate::error::{FolioError, FolioResult};
use crate::folio::changeset::Changeset;
use crate::folio::config::FolioSiteConfig;
use crate::folio::dates::{self, RecencyKey};
use crate::folio::markup::{element_end, parse_start_tag};
use crate::folio::model::{Project, Tag, TagNames, Writeup};
use crate::folio::render::{self, CardStyle};

const SEPARATOR: &str = "\n";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Container {
    Recent,
    Writeups,
    Projects,
    Tags,
}

impl Container {
    pub fn name(self) -> &'static str {
        match self {
            Self::Recent => "recent",
            Self::Writeups => "writeups",
            Self::Projects => "projects",
            Self::Tags => "tags",
        }
    }

    pub fn begin_marker(self) -> String {
        format!("<!-- folio:begin {} -->", self.name())
    }

    pub fn end_marker(self) -> String {
        format!("<!-- folio:end {} -->", self.name())
    }
}

/// Where a new fragment goes when its key is not on the page yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    NewestFirst(Option<NaiveDate>),
    BySlug,
    Append,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub key: String,
    pub fragment: String,
    pub placement: Placement,
}

impl Entry {
    pub fn writeup(
        writeup: &Writeup,
        style: CardStyle,
        site: &FolioSiteConfig,
        names: &TagNames,
    ) -> Self {
        Self {
            key: writeup.slug.clone(),
            fragment: render::writeup_card(writeup, style, site, names),
            placement: Placement::NewestFirst(writeup.created_on()),
        }
    }

    pub fn project(project: &Project) -> Self {
        Self {
            key: project.slug.clone(),
            fragment: render::project_card(project),
            placement: Placement::Append,
        }
    }

    pub fn tag(tag: &Tag) -> Self {
        Self {
            key: tag.slug.clone(),
            fragment: render::tag_card(tag),
            placement: Placement::BySlug,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fragment {
    pub key: Option<String>,
    pub date: Option<NaiveDate>,
    pub raw: String,
}

impl Fragment {
    fn from_raw(raw: &str) -> Self {
        let root = parse_start_tag(raw, 0);
        Self {
            key: root
                .as_ref()
                .and_then(|t| t.attr("data-slug"))
                .map(ToOwned::to_owned),
            date: root
                .as_ref()
                .and_then(|t| t.attr("data-date"))
                .and_then(dates::parse_iso),
            raw: raw.to_string(),
        }
    }

    fn is_keyed(&self, key: &str) -> bool {
        self.key.as_deref() == Some(key)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Node {
    Text(String),
    Fragment(Fragment),
}

impl Node {
    fn is_blank(&self) -> bool {
        matches!(self, Node::Text(t) if t.trim().is_empty())
    }

    fn fragment(&self) -> Option<&Fragment> {
        match self {
            Node::Fragment(f) => Some(f),
            Node::Text(_) => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct PageDocument {
    path: PathBuf,
    head: String,
    nodes: Vec<Node>,
    tail: String,
}

impl PageDocument {
    pub fn parse(path: &Path, raw: &str, container: Container) -> FolioResult<Self> {
        let begin = container.begin_marker();
        let end = container.end_marker();
        let missing = |reason: String| FolioError::missing_container(path, container.name(), reason);

        let Some(begin_at) = raw.find(&begin) else {
            return Err(missing(format!("marker `{begin}` not found")));
        };
        let inner_start = begin_at + begin.len();
        if raw[inner_start..].contains(&begin) {
            return Err(missing(format!("marker `{begin}` appears more than once")));
        }
        let Some(end_offset) = raw[inner_start..].find(&end) else {
            return Err(missing(format!("marker `{end}` not found after `{begin}`")));
        };
        let inner_end = inner_start + end_offset;
        let inner = &raw[inner_start..inner_end];

        let mut nodes = Vec::new();
        let mut text_start = 0usize;
        let mut i = 0usize;
        while let Some(offset) = inner[i..].find('<') {
            let at = i + offset;
            if inner[at..].starts_with("<!--") {
                let Some(close) = inner[at..].find("-->") else {
                    return Err(missing("unterminated comment inside container".to_string()));
                };
                i = at + close + 3;
                continue;
            }
            let Some(tag) = parse_start_tag(inner, at) else {
                i = at + 1;
                continue;
            };
            let Some(end_at) = element_end(inner, &tag) else {
                return Err(missing(format!(
                    "unbalanced <{}> element inside container",
                    tag.name
                )));
            };
            if text_start < at {
                nodes.push(Node::Text(inner[text_start..at].to_string()));
            }
            nodes.push(Node::Fragment(Fragment::from_raw(&inner[at..end_at])));
            i = end_at;
            text_start = end_at;
        }
        if text_start < inner.len() {
            nodes.push(Node::Text(inner[text_start..].to_string()));
        }

        Ok(Self {
            path: path.to_path_buf(),
            head: raw[..inner_start].to_string(),
            nodes,
            tail: raw[inner_end..].to_string(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn fragments(&self) -> impl Iterator<Item = &Fragment> {
        self.nodes.iter().filter_map(Node::fragment)
    }

    /// Keys of keyed fragments in page order, duplicates included.
    pub fn keys(&self) -> Vec<&str> {
        self.fragments().filter_map(|f| f.key.as_deref()).collect()
    }

    pub fn render(&self) -> String {
        let mut out = String::with_capacity(
            self.head.len() + self.tail.len() + self.nodes.len() * 256,
        );
        out.push_str(&self.head);
        for node in &self.nodes {
            match node {
                Node::Text(t) => out.push_str(t),
                Node::Fragment(f) => out.push_str(&f.raw),
            }
        }
        out.push_str(&self.tail);
        out
    }

    fn positions(&self, key: &str) -> Vec<usize> {
        self.nodes
            .iter()
            .enumerate()
            .filter(|(_, n)| n.fragment().is_some_and(|f| f.is_keyed(key)))
            .map(|(i, _)| i)
            .collect()
    }

    /// Insert or replace the fragment keyed by `entry.key`. Returns whether
    /// the page changed.
    pub fn upsert(&mut self, entry: &Entry) -> bool {
        let fragment = Fragment::from_raw(&entry.fragment);
        debug_assert_eq!(fragment.key.as_deref(), Some(entry.key.as_str()));

        let positions = self.positions(&entry.key);
        if let Some((&first, extra)) = positions.split_first() {
            let mut changed = false;
            for &idx in extra.iter().rev() {
                self.remove_at(idx);
                changed = true;
            }
            if self.nodes[first].fragment().map(|f| f.raw.as_str()) != Some(entry.fragment.as_str())
            {
                self.nodes[first] = Node::Fragment(fragment);
                changed = true;
            }
            if changed {
                self.coalesce();
            }
            return changed;
        }

        let at = match self.anchor(&entry.key, entry.placement) {
            Some(anchor) => anchor,
            None => self.end_slot(),
        };
        self.nodes.insert(at, Node::Fragment(fragment));
        self.nodes.insert(at + 1, Node::Text(SEPARATOR.to_string()));
        self.coalesce();
        true
    }

    /// Drop every fragment keyed by `key` along with the blank text that
    /// follows it. Returns whether the page changed.
    pub fn remove(&mut self, key: &str) -> bool {
        let positions = self.positions(key);
        for &idx in positions.iter().rev() {
            self.remove_at(idx);
        }
        if positions.is_empty() {
            return false;
        }
        self.coalesce();
        true
    }

    /// Make the keyed fragments the keys of `entries`: keys not listed are
    /// removed and listed keys missing from the page are inserted. Fragments
    /// already on the page keep their bytes, as does unkeyed content.
    pub fn reconcile(&mut self, entries: &[Entry]) -> bool {
        let stale: Vec<String> = self
            .keys()
            .into_iter()
            .filter(|key| !entries.iter().any(|e| e.key == *key))
            .map(ToOwned::to_owned)
            .collect();
        let mut changed = false;
        for key in stale {
            changed |= self.remove(&key);
        }
        for entry in entries {
            if self.positions(&entry.key).is_empty() {
                changed |= self.upsert(entry);
            }
        }
        changed
    }

    /// Re-lay all keyed fragments from scratch in `entries` order.
    pub fn rebuild(&mut self, entries: &[Entry]) -> bool {
        let before = self.render();
        let keys: Vec<String> = self.keys().into_iter().map(ToOwned::to_owned).collect();
        for key in keys {
            self.remove(&key);
        }
        for entry in entries {
            self.upsert(entry);
        }
        self.render() != before
    }

    fn remove_at(&mut self, idx: usize) {
        self.nodes.remove(idx);
        if self.nodes.get(idx).is_some_and(Node::is_blank) {
            self.nodes.remove(idx);
        }
    }

    fn coalesce(&mut self) {
        let mut merged: Vec<Node> = Vec::with_capacity(self.nodes.len());
        for node in self.nodes.drain(..) {
            match (merged.last_mut(), node) {
                (Some(Node::Text(prev)), Node::Text(next)) => prev.push_str(&next),
                (_, node) => merged.push(node),
            }
        }
        self.nodes = merged;
    }

    fn anchor(&self, key: &str, placement: Placement) -> Option<usize> {
        self.nodes.iter().position(|node| {
            let Some(Fragment { key: Some(other), date, .. }) = node.fragment() else {
                return false;
            };
            match placement {
                Placement::NewestFirst(new_date) => {
                    let incoming = RecencyKey { date: new_date, slug: key };
                    let existing = RecencyKey { date: *date, slug: other };
                    existing > incoming
                }
                Placement::BySlug => other.as_str() > key,
                Placement::Append => false,
            }
        })
    }

    /// Slot after the last fragment and the blank text following it, or
    /// after the leading blank text when the container holds no fragment.
    fn end_slot(&self) -> usize {
        let after_last = self
            .nodes
            .iter()
            .rposition(|n| n.fragment().is_some())
            .map_or(0, |i| i + 1);
        let starts_blank = self.nodes.get(after_last).is_some_and(Node::is_blank);
        if starts_blank { after_last + 1 } else { after_last }
    }
}

/// Applies keyed edits to pages through a [`Changeset`], so nothing reaches
/// disk until the whole command has been staged.
pub struct PageSynchronizer<'a> {
    changes: &'a mut Changeset,
}

impl<'a> PageSynchronizer<'a> {
    pub fn new(changes: &'a mut Changeset) -> Self {
        Self { changes }
    }

    pub fn load(&self, page: &Path, container: Container) -> FolioResult<PageDocument> {
        let Some(raw) = self.changes.read(page)? else {
            return Err(FolioError::missing_container(
                page,
                container.name(),
                "page does not exist",
            ));
        };
        PageDocument::parse(page, &raw, container)
    }

    pub fn exists(&self, page: &Path) -> FolioResult<bool> {
        self.changes.exists(page)
    }

    fn stage(&mut self, doc: &PageDocument) {
        self.changes.stage_write(doc.path(), doc.render());
    }

    fn apply(
        &mut self,
        page: &Path,
        container: Container,
        edit: impl FnOnce(&mut PageDocument) -> bool,
    ) -> FolioResult<bool> {
        let mut doc = self.load(page, container)?;
        let changed = edit(&mut doc);
        if changed {
            self.stage(&doc);
        }
        Ok(changed)
    }

    pub fn upsert_entry(
        &mut self,
        page: &Path,
        container: Container,
        entry: &Entry,
    ) -> FolioResult<bool> {
        self.apply(page, container, |doc| doc.upsert(entry))
    }

    pub fn remove_entry(
        &mut self,
        page: &Path,
        container: Container,
        key: &str,
    ) -> FolioResult<bool> {
        self.apply(page, container, |doc| doc.remove(key))
    }

    pub fn reconcile(
        &mut self,
        page: &Path,
        container: Container,
        entries: &[Entry],
    ) -> FolioResult<bool> {
        self.apply(page, container, |doc| doc.reconcile(entries))
    }

    pub fn rebuild(
        &mut self,
        page: &Path,
        container: Container,
        entries: &[Entry],
    ) -> FolioResult<bool> {
        self.apply(page, container, |doc| doc.rebuild(entries))
    }
}

/// Home page entries: the newest `limit` writeups of an already sorted list.
pub fn recent_entries(
    sorted: &[Writeup],
    limit: usize,
    site: &FolioSiteConfig,
    names: &TagNames,
) -> Vec<Entry> {
    sorted
        .iter()
        .take(limit)
        .map(|w| Entry::writeup(w, CardStyle::Recent, site, names))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = "<html><body>\n<div class=\"row\" id=\"c\">\n<!-- folio:begin writeups -->\n<!-- folio:end writeups -->\n</div>\n</body></html>\n";

    fn entry(key: &str, date: Option<(i32, u32, u32)>) -> Entry {
        let date = date.and_then(|(y, m, d)| NaiveDate::from_ymd_opt(y, m, d));
        Entry {
            key: key.to_string(),
            fragment: format!(
                "<div class=\"writeup-card\" data-slug=\"{key}\" data-date=\"{}\">\n    <div><a href=\"#\">{key}</a></div>\n</div>",
                dates::iso(date)
            ),
            placement: Placement::NewestFirst(date),
        }
    }

    fn doc(raw: &str) -> PageDocument {
        PageDocument::parse(Path::new("page.html"), raw, Container::Writeups).expect("parse")
    }

    #[test]
    fn parse_then_render_is_identity() {
        let mut d = doc(PAGE);
        d.upsert(&entry("a", Some((2025, 1, 1))));
        let raw = d.render();
        assert_eq!(doc(&raw).render(), raw);
    }

    #[test]
    fn upsert_twice_leaves_one_fragment() {
        let mut d = doc(PAGE);
        let e = entry("haze", Some((2025, 1, 1)));
        assert!(d.upsert(&e));
        let once = d.render();
        assert!(!d.upsert(&e));
        assert_eq!(d.render(), once);
        assert_eq!(d.keys(), vec!["haze"]);
    }

    #[test]
    fn upsert_then_remove_restores_bytes() {
        let mut d = doc(PAGE);
        d.upsert(&entry("old", Some((2024, 1, 1))));
        d.upsert(&entry("new", Some((2025, 1, 1))));
        let before = d.render();

        for e in [
            entry("middle", Some((2024, 6, 1))),
            entry("newest", Some((2026, 1, 1))),
            entry("oldest", Some((2020, 1, 1))),
            entry("undated", None),
        ] {
            let mut reparsed = doc(&before);
            reparsed.upsert(&e);
            let mut again = doc(&reparsed.render());
            assert!(again.remove(&e.key));
            assert_eq!(again.render(), before, "round trip for {}", e.key);
        }
    }

    #[test]
    fn new_fragments_are_ordered_newest_first() {
        let mut d = doc(PAGE);
        d.upsert(&entry("b", Some((2024, 1, 1))));
        d.upsert(&entry("d", None));
        d.upsert(&entry("a", Some((2025, 1, 1))));
        d.upsert(&entry("c", Some((2024, 1, 1))));
        assert_eq!(d.keys(), vec!["a", "b", "c", "d"]);
    }

    #[test]
    fn replace_keeps_position() {
        let mut d = doc(PAGE);
        d.upsert(&entry("a", Some((2025, 1, 1))));
        d.upsert(&entry("b", Some((2024, 1, 1))));
        let mut moved = entry("a", Some((2020, 1, 1)));
        moved.fragment = moved.fragment.replace("<a href", "<a class=\"x\" href");
        assert!(d.upsert(&moved));
        assert_eq!(d.keys(), vec!["a", "b"]);
        assert!(d.render().contains("class=\"x\""));
    }

    #[test]
    fn unrelated_content_is_untouched() {
        let raw = PAGE.replace(
            "<!-- folio:end writeups -->",
            "<div class=\"note\">hand written</div>\n<!-- folio:end writeups -->",
        );
        let mut d = doc(&raw);
        d.upsert(&entry("a", Some((2025, 1, 1))));
        assert!(d.remove("a"));
        assert_eq!(d.render(), raw);
    }

    #[test]
    fn duplicate_fragments_collapse_on_upsert() {
        let e = entry("dup", Some((2025, 1, 1)));
        let raw = PAGE.replace(
            "<!-- folio:end writeups -->",
            &format!("{0}\n{0}\n<!-- folio:end writeups -->", e.fragment),
        );
        let mut d = doc(&raw);
        assert_eq!(d.keys(), vec!["dup", "dup"]);
        assert!(d.upsert(&e));
        assert_eq!(d.keys(), vec!["dup"]);
    }

    #[test]
    fn slug_placement_sorts_alphabetically() {
        let mut d = doc(PAGE);
        for key in ["web", "htb", "linux"] {
            let mut e = entry(key, None);
            e.placement = Placement::BySlug;
            d.upsert(&e);
        }
        assert_eq!(d.keys(), vec!["htb", "linux", "web"]);
    }

    #[test]
    fn append_placement_keeps_insertion_order() {
        let mut d = doc(PAGE);
        for key in ["zeta", "alpha"] {
            let mut e = entry(key, Some((2025, 1, 1)));
            e.placement = Placement::Append;
            d.upsert(&e);
        }
        assert_eq!(d.keys(), vec!["zeta", "alpha"]);
    }

    #[test]
    fn reconcile_drops_keys_not_listed() {
        let mut d = doc(PAGE);
        d.upsert(&entry("a", Some((2025, 1, 1))));
        d.upsert(&entry("b", Some((2024, 1, 1))));
        assert!(d.reconcile(&[entry("b", Some((2024, 1, 1)))]));
        assert_eq!(d.keys(), vec!["b"]);
    }

    #[test]
    fn reconcile_keeps_fragments_already_present() {
        let mut d = doc(PAGE);
        let mut edited = entry("a", Some((2025, 1, 1)));
        edited.fragment = edited.fragment.replace("writeup-card", "writeup-card featured");
        d.upsert(&edited);
        d.upsert(&entry("b", Some((2024, 1, 1))));

        let window = [entry("new", Some((2026, 1, 1))), entry("a", Some((2025, 1, 1)))];
        assert!(d.reconcile(&window));
        assert_eq!(d.keys(), vec!["new", "a"]);
        assert!(d.render().contains("writeup-card featured"));
        assert!(!d.reconcile(&window));
    }

    #[test]
    fn rebuild_of_a_clean_page_is_a_noop() {
        let mut d = doc(PAGE);
        let entries = vec![entry("a", Some((2025, 1, 1))), entry("b", Some((2024, 1, 1)))];
        for e in &entries {
            d.upsert(e);
        }
        assert!(!d.rebuild(&entries));
    }

    #[test]
    fn missing_container_is_reported() {
        let err = PageDocument::parse(Path::new("p.html"), "<html></html>", Container::Recent)
            .unwrap_err();
        assert!(matches!(err, FolioError::MissingInsertionPoint { .. }));
    }

    #[test]
    fn unbalanced_container_is_reported() {
        let raw = PAGE.replace(
            "<!-- folio:end writeups -->",
            "<div data-slug=\"x\">\n<!-- folio:end writeups -->",
        );
        let err = PageDocument::parse(Path::new("p.html"), &raw, Container::Writeups).unwrap_err();
        assert!(matches!(err, FolioError::MissingInsertionPoint { .. }));
    }

    #[test]
    fn synchronizer_stages_nothing_for_broken_pages() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let page = tmp.path().join("index.html");
        std::fs::write(&page, "<html>no markers</html>").expect("write");

        let mut changes = Changeset::default();
        let mut sync = PageSynchronizer::new(&mut changes);
        let err = sync
            .upsert_entry(&page, Container::Recent, &entry("a", None))
            .unwrap_err();
        assert!(matches!(err, FolioError::MissingInsertionPoint { .. }));
        assert!(changes.commit().expect("commit").is_empty());
    }
}
