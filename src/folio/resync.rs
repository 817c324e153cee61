//! Whole-site passes: `update` re-lays every denormalized page from the
//! artifacts, `verify` reports where pages and artifacts disagree.

use std::collections::BTreeSet;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::error::{FolioError, FolioResult};
use crate::folio::Site;
use crate::folio::changeset::Changeset;
use crate::folio::model::{Project, Tag, TagNames, Writeup};
use crate::folio::render::CardStyle;
use crate::folio::store::ContentStore;
use crate::folio::sync::{Container, Entry, PageDocument, PageSynchronizer, recent_entries};
use crate::folio::tags::TagManager;
use crate::folio::warn::{self, WarnEvent};

#[derive(Debug, Clone, Default)]
pub struct ResyncOutcome {
    pub writeups: usize,
    pub tags: usize,
    pub projects: usize,
    pub recreated_tags: Vec<String>,
    pub changed_pages: Vec<PathBuf>,
}

/// Every page the site should have, with the entries it should list in
/// order.
struct Expectation {
    page: PathBuf,
    container: Container,
    entries: Vec<Entry>,
}

fn expectations(
    site: &Site,
    writeups: &[Writeup],
    tags: &[Tag],
    projects: &[Project],
) -> Vec<Expectation> {
    let site_cfg = &site.config.site;
    let paths = &site.paths;
    let names: TagNames = tags.iter().collect();
    let mut out = vec![
        Expectation {
            page: paths.listing_page.clone(),
            container: Container::Writeups,
            entries: writeups
                .iter()
                .map(|w| Entry::writeup(w, CardStyle::Listing, site_cfg, &names))
                .collect(),
        },
        Expectation {
            page: paths.home_page.clone(),
            container: Container::Recent,
            entries: recent_entries(writeups, site.config.sync.recent_limit, site_cfg, &names),
        },
    ];
    for tag in tags {
        out.push(Expectation {
            page: paths.tag_file(&tag.slug),
            container: Container::Writeups,
            entries: writeups
                .iter()
                .filter(|w| w.has_tag(&tag.slug))
                .map(|w| Entry::writeup(w, CardStyle::TagPage, site_cfg, &names))
                .collect(),
        });
    }
    out.push(Expectation {
        page: paths.tags_page.clone(),
        container: Container::Tags,
        entries: tags.iter().map(Entry::tag).collect(),
    });
    out.push(Expectation {
        page: paths.projects_page.clone(),
        container: Container::Projects,
        entries: projects.iter().map(Entry::project).collect(),
    });
    out
}

/// Stage a rebuild of every denormalized page from the current artifacts.
/// Tag pages referenced by a writeup but missing on disk are recreated.
pub fn update(site: &Site, changes: &mut Changeset) -> FolioResult<ResyncOutcome> {
    let store = ContentStore::new(&site.paths);
    let writeups = store.load_writeups()?;
    let projects = store.load_projects()?;

    let mut manager = TagManager::load(site, &store)?;
    let mut recreated_tags = Vec::new();
    for writeup in &writeups {
        for slug in &writeup.tags {
            let ensured = manager.ensure_tag(changes, slug, None)?;
            if ensured.created {
                warn::emit(WarnEvent {
                    code: "TAG_PAGE_RECREATED",
                    stage: "update",
                    action: "ensure-tag",
                    subject: slug,
                    reason: &format!("referenced-by-{}", writeup.slug),
                });
                recreated_tags.push(ensured.tag.slug);
            }
        }
    }
    let tags: Vec<Tag> = manager.tags().cloned().collect();

    let mut changed_pages = Vec::new();
    let mut sync = PageSynchronizer::new(changes);
    for expected in expectations(site, &writeups, &tags, &projects) {
        if sync.rebuild(&expected.page, expected.container, &expected.entries)? {
            changed_pages.push(expected.page);
        }
    }

    Ok(ResyncOutcome {
        writeups: writeups.len(),
        tags: tags.len(),
        projects: projects.len(),
        recreated_tags,
        changed_pages,
    })
}

fn read_page(page: &Path) -> FolioResult<Option<String>> {
    match fs::read_to_string(page) {
        Ok(raw) => Ok(Some(raw)),
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
        Err(err) => Err(FolioError::io(page, err)),
    }
}

fn rel<'a>(site: &Site, page: &'a Path) -> std::path::Display<'a> {
    page.strip_prefix(&site.paths.base_dir)
        .unwrap_or(page)
        .display()
}

/// Read-only invariant check. Returns one human readable issue per problem;
/// an empty list means the site is in sync.
pub fn verify(site: &Site) -> FolioResult<Vec<String>> {
    let store = ContentStore::new(&site.paths);
    let writeups = store.load_writeups()?;
    let tags = store.load_tags()?;
    let projects = store.load_projects()?;
    let mut issues = Vec::new();

    let known: BTreeSet<&str> = tags.iter().map(|t| t.slug.as_str()).collect();
    for writeup in &writeups {
        for slug in writeup.tags.iter().filter(|s| !known.contains(s.as_str())) {
            issues.push(format!(
                "writeup `{}` references tag `{slug}` which has no tag page",
                writeup.slug
            ));
        }
    }

    for expected in expectations(site, &writeups, &tags, &projects) {
        let shown = rel(site, &expected.page);
        let Some(raw) = read_page(&expected.page)? else {
            issues.push(format!("{shown}: page is missing"));
            continue;
        };
        let doc = match PageDocument::parse(&expected.page, &raw, expected.container) {
            Ok(doc) => doc,
            Err(err) => {
                issues.push(format!("{shown}: {err}"));
                continue;
            }
        };

        let found = doc.keys();
        let mut seen = BTreeSet::new();
        for key in &found {
            if !seen.insert(*key) {
                issues.push(format!("{shown}: fragment `{key}` appears more than once"));
            }
        }
        let want: Vec<&str> = expected.entries.iter().map(|e| e.key.as_str()).collect();
        if found != want && seen.len() == found.len() {
            issues.push(format!(
                "{shown}: lists [{}] but should list [{}]",
                found.join(", "),
                want.join(", ")
            ));
        }
    }
    Ok(issues)
}
